//! Normalized facility records produced by ingestion and consumed by the
//! database layer.

use crate::hours::{HolidayPolicy, LunchBreak, ReceptionHours, WeeklySchedule};

/// Compact `HHMM` open/close strings, one pair per day, Monday first.
pub type CompactWeek = [(Option<String>, Option<String>); 7];

/// A pharmacy ready for upsert, keyed by `hpid`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPharmacy {
    pub hpid: String,
    pub name: String,
    pub address: Option<String>,
    pub tel: Option<String>,
    pub fax: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub map_info: Option<String>,
    pub etc: Option<String>,
    pub hours: CompactWeek,
}

/// A hospital ready for upsert, keyed by `ykiho`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewHospital {
    pub ykiho: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Human-readable summary, e.g. `"소아청소년과(2명), 내과(1명)"`.
    pub department: Option<String>,
    pub hospital_type: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub schedule: WeeklySchedule,
    pub reception: ReceptionHours,
    pub lunch: LunchBreak,
    pub holiday: HolidayPolicy,
}
