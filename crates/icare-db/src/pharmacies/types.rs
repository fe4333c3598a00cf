use chrono::{DateTime, Utc};
use icare_core::{
    Facility, FacilityHours, FacilityKind, FacilityLocation, HolidayPolicy, WeeklySchedule,
};

/// A row from the `pharmacies` table. Opening hours are the feed's compact
/// `HHMM` strings, one pair per day.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PharmacyRow {
    pub id: i64,
    pub hpid: String,
    pub name: String,
    pub address: Option<String>,
    pub tel: Option<String>,
    pub fax: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub map_info: Option<String>,
    pub etc: Option<String>,
    pub mon_start: Option<String>,
    pub mon_end: Option<String>,
    pub tue_start: Option<String>,
    pub tue_end: Option<String>,
    pub wed_start: Option<String>,
    pub wed_end: Option<String>,
    pub thu_start: Option<String>,
    pub thu_end: Option<String>,
    pub fri_start: Option<String>,
    pub fri_end: Option<String>,
    pub sat_start: Option<String>,
    pub sat_end: Option<String>,
    pub sun_start: Option<String>,
    pub sun_end: Option<String>,
    pub is_active: bool,
    pub last_seen_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PharmacyRow {
    #[must_use]
    pub fn to_facility(&self) -> Facility {
        let schedule = WeeklySchedule::from_compact_pairs([
            (self.mon_start.as_deref(), self.mon_end.as_deref()),
            (self.tue_start.as_deref(), self.tue_end.as_deref()),
            (self.wed_start.as_deref(), self.wed_end.as_deref()),
            (self.thu_start.as_deref(), self.thu_end.as_deref()),
            (self.fri_start.as_deref(), self.fri_end.as_deref()),
            (self.sat_start.as_deref(), self.sat_end.as_deref()),
            (self.sun_start.as_deref(), self.sun_end.as_deref()),
        ]);

        Facility {
            id: self.id,
            kind: FacilityKind::Pharmacy,
            name: self.name.clone(),
            address: self.address.clone(),
            phone: self.tel.clone(),
            category: None,
            location: FacilityLocation::from_parts(self.latitude, self.longitude),
            hours: FacilityHours {
                schedule,
                lunch: None,
                holiday: HolidayPolicy::default(),
            },
        }
    }
}
