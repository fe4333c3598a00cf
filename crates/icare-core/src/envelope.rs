//! The `{type, start_message, end_message, data}` envelope handed to the
//! conversational agent, and the serialized form of a resolved facility.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::facility::{Facility, FacilityKind};
use crate::hours::{HolidayPolicy, LunchBreak, OperatingState, WeeklySchedule};
use crate::proximity::{ResolvedFacility, SortOrder};
use crate::search::{self, SearchError, SearchOutcome, SearchRequest, SearchResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeType {
    HospitalList,
    PharmacyList,
    NoResults,
    Error,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolEnvelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeType,
    pub start_message: String,
    pub end_message: String,
    pub data: Vec<serde_json::Value>,
}

impl ToolEnvelope {
    fn new(
        kind: EnvelopeType,
        start_message: impl Into<String>,
        end_message: impl Into<String>,
        data: Vec<serde_json::Value>,
    ) -> Self {
        Self {
            kind,
            start_message: start_message.into(),
            end_message: end_message.into(),
            data,
        }
    }

    #[must_use]
    pub fn missing_location() -> Self {
        Self::new(
            EnvelopeType::Error,
            "위치 정보가 필요합니다.",
            "위치 정보를 설정해주세요.",
            Vec::new(),
        )
    }

    /// Generic failure for a search that could not run.
    #[must_use]
    pub fn search_failed(kind: FacilityKind) -> Self {
        Self::new(
            EnvelopeType::Error,
            format!("{} 검색 중 오류가 발생했습니다.", kind.noun()),
            "다시 시도해주세요.",
            Vec::new(),
        )
    }

    #[must_use]
    pub fn off_topic() -> Self {
        Self::new(
            EnvelopeType::NoResults,
            "죄송합니다. 병원/약국 검색 관련 질문만 답변 가능합니다.",
            "근처 병원이나 약국을 찾아보시겠습니까?",
            Vec::new(),
        )
    }

    #[must_use]
    pub fn chat(start_message: impl Into<String>, end_message: impl Into<String>) -> Self {
        Self::new(EnvelopeType::Chat, start_message, end_message, Vec::new())
    }

    /// Greeting with the two quick-search buttons.
    #[must_use]
    pub fn welcome() -> Self {
        Self::new(
            EnvelopeType::Chat,
            "안녕하세요! 저는 아이케어봇이에요. 😊\n아래 버튼을 눌러서 근처 병원이나 약국을 찾아보세요.",
            "또는 직접 '근처 소아과 알려줘'와 같이 물어보셔도 됩니다.",
            vec![serde_json::json!({
                "type": "button",
                "buttons": [
                    { "text": "약국 찾기", "message": PHARMACY_BUTTON_MESSAGE },
                    { "text": "병원 찾기", "message": HOSPITAL_BUTTON_MESSAGE },
                ],
            })],
        )
    }

    /// Builds the framed envelope for a finished search.
    #[must_use]
    pub fn from_search(response: &SearchResponse, query: Option<&str>) -> Self {
        let when = if response.explicit_time {
            format!("{} 기준", response.instant.format("%Y-%m-%d %H:%M"))
        } else {
            "현재".to_string()
        };
        let what = describe_order(response.sort_by);
        let subject = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => format!("{q} {}", response.kind.noun()),
            None => response.kind.noun().to_string(),
        };

        match &response.outcome {
            SearchOutcome::NoResultsInRadius { .. } => Self::new(
                EnvelopeType::NoResults,
                format!("죄송합니다. {when} {what} {subject}을 찾을 수 없습니다."),
                "다른 시간대를 확인해보시거나, 직접 전화로 문의해보세요.",
                Vec::new(),
            ),
            SearchOutcome::Found(results) => {
                let (kind, closing) = match response.kind {
                    FacilityKind::Hospital => (
                        EnvelopeType::HospitalList,
                        "방문 전 전화로 확인하시는 것이 좋습니다.",
                    ),
                    FacilityKind::Pharmacy => (
                        EnvelopeType::PharmacyList,
                        "방문하시기 전에 전화로 확인하시는 것이 좋습니다.",
                    ),
                };
                let data = results
                    .iter()
                    .map(FacilityView::from)
                    .filter_map(|view| serde_json::to_value(view).ok())
                    .collect();
                Self::new(kind, format!("{when} {what} {subject}들입니다:"), closing, data)
            }
        }
    }
}

pub const PHARMACY_BUTTON_MESSAGE: &str = "근처 약국 찾아줘";
pub const HOSPITAL_BUTTON_MESSAGE: &str = "근처 병원 찾아줘";

fn describe_order(order: Option<SortOrder>) -> &'static str {
    match order {
        Some(SortOrder::EarliestOpen) => "가장 빨리 여는",
        Some(SortOrder::LatestClose) => "가장 늦게 닫는",
        Some(SortOrder::Nearest) => "가까운",
        None => "영업 중인",
    }
}

/// Arguments the agent passes to the search tools. `sort_by` stays a
/// string so unknown values fall back to the default view.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ToolRequest {
    #[serde(default)]
    pub query: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub target_time: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
}

impl ToolRequest {
    fn to_search_request(&self, kind: FacilityKind) -> SearchRequest {
        SearchRequest {
            latitude: self.latitude,
            longitude: self.longitude,
            radius_km: None,
            query: match kind {
                FacilityKind::Hospital => self.query.clone(),
                FacilityKind::Pharmacy => None,
            },
            target_time: self.target_time.clone(),
            sort_by: self.sort_by.as_deref().and_then(|s| s.parse().ok()),
            limit: None,
        }
    }
}

/// Runs a search tool end to end and frames the result.
#[must_use]
pub fn run_tool(
    kind: FacilityKind,
    request: &ToolRequest,
    candidates: Vec<Facility>,
    now: NaiveDateTime,
) -> ToolEnvelope {
    let search_request = request.to_search_request(kind);
    match search::search(kind, &search_request, candidates, now) {
        Ok(response) => ToolEnvelope::from_search(&response, search_request.query.as_deref()),
        Err(SearchError::MissingLocation) => ToolEnvelope::missing_location(),
    }
}

/// Serialized form of a [`ResolvedFacility`].
#[derive(Debug, Clone, Serialize)]
pub struct FacilityView {
    pub id: i64,
    pub kind: FacilityKind,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub category: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance_km: f64,
    pub state: OperatingState,
    pub state_label: &'static str,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
    pub schedule: WeeklySchedule,
    pub lunch: Option<LunchBreak>,
    pub holiday: HolidayPolicy,
}

impl From<&ResolvedFacility> for FacilityView {
    fn from(resolved: &ResolvedFacility) -> Self {
        let facility = &resolved.facility;
        Self {
            id: facility.id,
            kind: facility.kind,
            name: facility.name.clone(),
            address: facility.address.clone(),
            phone: facility.phone.clone(),
            category: facility.category.clone(),
            latitude: facility.location.map(|l| l.latitude),
            longitude: facility.location.map(|l| l.longitude),
            distance_km: resolved.rounded_distance_km(),
            state: resolved.state,
            state_label: resolved.state.label(),
            opening_time: resolved.opening_time.map(|t| t.format("%H:%M").to_string()),
            closing_time: resolved.closing_time.map(|t| t.format("%H:%M").to_string()),
            schedule: facility.hours.schedule.clone(),
            lunch: facility.hours.lunch.clone(),
            holiday: facility.hours.holiday.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Weekday};

    use super::*;
    use crate::facility::FacilityLocation;
    use crate::hours::{FacilityHours, TimeWindow};

    fn tuesday(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn place(kind: FacilityKind, category: Option<&str>) -> Facility {
        let mut schedule = WeeklySchedule::default();
        schedule.set(Weekday::Tue, Some(TimeWindow::new("09:00", "18:00")));
        Facility {
            id: 7,
            kind,
            name: "해님".to_string(),
            address: Some("서울 중구".to_string()),
            phone: Some("02-000-0000".to_string()),
            category: category.map(str::to_string),
            location: Some(FacilityLocation::new(37.5005, 127.0)),
            hours: FacilityHours {
                schedule,
                ..FacilityHours::default()
            },
        }
    }

    fn tool_request() -> ToolRequest {
        ToolRequest {
            latitude: Some(37.5),
            longitude: Some(127.0),
            ..ToolRequest::default()
        }
    }

    #[test]
    fn hospital_list_is_framed_with_query() {
        let request = ToolRequest {
            query: Some("소아청소년과".to_string()),
            ..tool_request()
        };
        let envelope = run_tool(
            FacilityKind::Hospital,
            &request,
            vec![place(FacilityKind::Hospital, Some("소아청소년과"))],
            tuesday(10),
        );
        assert_eq!(envelope.kind, EnvelopeType::HospitalList);
        assert_eq!(envelope.start_message, "현재 영업 중인 소아청소년과 병원들입니다:");
        assert_eq!(envelope.end_message, "방문 전 전화로 확인하시는 것이 좋습니다.");
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.data[0]["state_label"], "영업중");
        assert_eq!(envelope.data[0]["opening_time"], "09:00");
        assert_eq!(envelope.data[0]["distance_km"], 0.1);
    }

    #[test]
    fn pharmacy_no_results_mentions_target_time() {
        let request = ToolRequest {
            target_time: Some("새벽".to_string()),
            ..tool_request()
        };
        let envelope = run_tool(
            FacilityKind::Pharmacy,
            &request,
            vec![place(FacilityKind::Pharmacy, None)],
            tuesday(10),
        );
        assert_eq!(envelope.kind, EnvelopeType::NoResults);
        assert_eq!(
            envelope.start_message,
            "죄송합니다. 2024-01-02 06:00 기준 영업 중인 약국을 찾을 수 없습니다."
        );
        assert!(envelope.data.is_empty());
    }

    #[test]
    fn sort_order_changes_description() {
        let request = ToolRequest {
            sort_by: Some("latest_close".to_string()),
            ..tool_request()
        };
        let envelope = run_tool(
            FacilityKind::Pharmacy,
            &request,
            vec![place(FacilityKind::Pharmacy, None)],
            tuesday(20),
        );
        assert_eq!(envelope.kind, EnvelopeType::PharmacyList);
        assert_eq!(envelope.start_message, "현재 가장 늦게 닫는 약국들입니다:");
        assert_eq!(envelope.data[0]["state"], "closed");
    }

    #[test]
    fn unknown_sort_value_uses_default_view() {
        let request = ToolRequest {
            sort_by: Some("cheapest".to_string()),
            ..tool_request()
        };
        let envelope = run_tool(
            FacilityKind::Pharmacy,
            &request,
            vec![place(FacilityKind::Pharmacy, None)],
            tuesday(10),
        );
        assert_eq!(envelope.start_message, "현재 영업 중인 약국들입니다:");
    }

    #[test]
    fn missing_coordinates_yield_error_envelope() {
        let envelope = run_tool(
            FacilityKind::Hospital,
            &ToolRequest::default(),
            vec![],
            tuesday(10),
        );
        assert_eq!(envelope.kind, EnvelopeType::Error);
        assert_eq!(envelope.start_message, "위치 정보가 필요합니다.");
    }

    #[test]
    fn envelope_serializes_type_field() {
        let json = serde_json::to_value(ToolEnvelope::off_topic()).unwrap();
        assert_eq!(json["type"], "no_results");
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[test]
    fn welcome_carries_buttons() {
        let welcome = ToolEnvelope::welcome();
        assert_eq!(welcome.data[0]["buttons"][0]["message"], PHARMACY_BUTTON_MESSAGE);
        assert_eq!(welcome.data[0]["buttons"][1]["message"], HOSPITAL_BUTTON_MESSAGE);
    }
}
