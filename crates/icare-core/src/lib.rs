//! Domain types and the business-hours engine shared by every iCare crate.

pub mod app_config;
pub mod config;
pub mod department;
pub mod envelope;
pub mod facility;
pub mod hours;
pub mod proximity;
pub mod records;
pub mod search;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use department::normalize_hospital_type;
pub use facility::{Facility, FacilityKind, FacilityLocation};
pub use hours::{
    DayClass, FacilityHours, HolidayPolicy, LunchBreak, OperatingState, ReceptionHours,
    TimeWindow, WeeklySchedule,
};
pub use proximity::{RankQuery, ResolvedFacility, SortOrder};
pub use records::{CompactWeek, NewHospital, NewPharmacy};
pub use search::{SearchError, SearchOutcome};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
