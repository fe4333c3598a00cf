//! Client for the Korean public-data portal (data.go.kr) APIs iCare ingests
//! from: the NEMC pharmacy full download, HIRA hospital basis/detail/
//! department lists, and the MFDS easy-drug-info lookup.

pub mod client;
pub mod error;
pub mod normalize;
pub(crate) mod retry;
pub mod types;

pub use client::PublicDataClient;
pub use error::PublicDataError;
pub use normalize::{
    classify_hospital_type, department_summary, normalize_hospital, normalize_pharmacies,
    normalize_pharmacy, parse_holiday_text, parse_time_range, parse_treatment_hours,
};
pub use types::{
    DepartmentItem, DrugInfo, HospitalBasisItem, HospitalDetailItem, Page, PharmacyItem,
};
