//! Response types for the data.go.kr XML APIs.
//!
//! Every endpoint answers with the same envelope:
//! `<response><header><resultCode/><resultMsg/></header><body><items><item/>...
//! </items><totalCount/></body></response>`. Item fields are kept as the
//! feed's raw strings; [`crate::normalize`] interprets them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub header: Header,
    #[serde(default = "Option::default")]
    pub body: Option<Body<T>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Header {
    #[serde(rename = "resultCode")]
    pub result_code: String,
    #[serde(rename = "resultMsg", default)]
    pub result_msg: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Body<T> {
    #[serde(default = "Option::default")]
    pub items: Option<Items<T>>,
    #[serde(rename = "totalCount", default)]
    pub total_count: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Items<T> {
    #[serde(default = "Vec::new")]
    pub item: Vec<T>,
}

/// One page of items plus the API's total count.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

/// `getParmacyFullDown` item.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PharmacyItem {
    pub hpid: Option<String>,
    #[serde(rename = "dutyName")]
    pub duty_name: Option<String>,
    #[serde(rename = "dutyAddr")]
    pub duty_addr: Option<String>,
    #[serde(rename = "dutyTel1")]
    pub duty_tel1: Option<String>,
    #[serde(rename = "dutyFax")]
    pub duty_fax: Option<String>,
    #[serde(rename = "wgs84Lat")]
    pub wgs84_lat: Option<String>,
    #[serde(rename = "wgs84Lon")]
    pub wgs84_lon: Option<String>,
    #[serde(rename = "dutyMapimg")]
    pub duty_mapimg: Option<String>,
    #[serde(rename = "dutyEtc")]
    pub duty_etc: Option<String>,
    #[serde(rename = "dutyTime1s")]
    pub duty_time1s: Option<String>,
    #[serde(rename = "dutyTime1c")]
    pub duty_time1c: Option<String>,
    #[serde(rename = "dutyTime2s")]
    pub duty_time2s: Option<String>,
    #[serde(rename = "dutyTime2c")]
    pub duty_time2c: Option<String>,
    #[serde(rename = "dutyTime3s")]
    pub duty_time3s: Option<String>,
    #[serde(rename = "dutyTime3c")]
    pub duty_time3c: Option<String>,
    #[serde(rename = "dutyTime4s")]
    pub duty_time4s: Option<String>,
    #[serde(rename = "dutyTime4c")]
    pub duty_time4c: Option<String>,
    #[serde(rename = "dutyTime5s")]
    pub duty_time5s: Option<String>,
    #[serde(rename = "dutyTime5c")]
    pub duty_time5c: Option<String>,
    #[serde(rename = "dutyTime6s")]
    pub duty_time6s: Option<String>,
    #[serde(rename = "dutyTime6c")]
    pub duty_time6c: Option<String>,
    #[serde(rename = "dutyTime7s")]
    pub duty_time7s: Option<String>,
    #[serde(rename = "dutyTime7c")]
    pub duty_time7c: Option<String>,
}

/// `getHospBasisList` item.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HospitalBasisItem {
    pub ykiho: Option<String>,
    #[serde(rename = "yadmNm")]
    pub yadm_nm: Option<String>,
    pub addr: Option<String>,
    pub telno: Option<String>,
    /// Latitude.
    #[serde(rename = "YPos")]
    pub y_pos: Option<String>,
    /// Longitude.
    #[serde(rename = "XPos")]
    pub x_pos: Option<String>,
}

/// `getDtlInfo2.7` item: treatment, lunch and reception hours plus holiday
/// notes, all free text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HospitalDetailItem {
    pub trmt_mon_start: Option<String>,
    pub trmt_mon_end: Option<String>,
    pub trmt_tue_start: Option<String>,
    pub trmt_tue_end: Option<String>,
    pub trmt_wed_start: Option<String>,
    pub trmt_wed_end: Option<String>,
    pub trmt_thu_start: Option<String>,
    pub trmt_thu_end: Option<String>,
    pub trmt_fri_start: Option<String>,
    pub trmt_fri_end: Option<String>,
    pub trmt_sat_start: Option<String>,
    pub trmt_sat_end: Option<String>,
    pub trmt_sun_start: Option<String>,
    pub trmt_sun_end: Option<String>,
    pub lunch_week: Option<String>,
    pub lunch_sat: Option<String>,
    pub rcv_week: Option<String>,
    pub rcv_sat: Option<String>,
    pub no_trmt_sun: Option<String>,
    pub no_trmt_holi: Option<String>,
}

/// `getDgsbjtInfo2.7` item.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DepartmentItem {
    #[serde(rename = "dgsbjtCd")]
    pub code: Option<String>,
    #[serde(rename = "dgsbjtCdNm")]
    pub name: Option<String>,
    #[serde(rename = "dgsbjtPrSdrCnt")]
    pub doctor_count: Option<String>,
}

impl DepartmentItem {
    #[must_use]
    pub fn doctors(&self) -> u32 {
        self.doctor_count
            .as_deref()
            .and_then(|c| c.trim().parse().ok())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct DrugItem {
    pub item_name: Option<String>,
    pub efcy_qesitm: Option<String>,
    pub atpn_qesitm: Option<String>,
    pub deposit_method_qesitm: Option<String>,
    pub entp_name: Option<String>,
}

/// Drug summary returned to clients; absent fields read `"N/A"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrugInfo {
    #[serde(rename = "itemName")]
    pub item_name: String,
    #[serde(rename = "efcyQesitm")]
    pub efficacy: String,
    #[serde(rename = "atpnQesitm")]
    pub precautions: String,
    #[serde(rename = "depositMethodQesitm")]
    pub storage: String,
    #[serde(rename = "entpName")]
    pub manufacturer: String,
}

impl From<DrugItem> for DrugInfo {
    fn from(item: DrugItem) -> Self {
        let or_na = |v: Option<String>| v.unwrap_or_else(|| "N/A".to_string());
        Self {
            item_name: or_na(item.item_name),
            efficacy: or_na(item.efcy_qesitm),
            precautions: or_na(item.atpn_qesitm),
            storage: or_na(item.deposit_method_qesitm),
            manufacturer: or_na(item.entp_name),
        }
    }
}
