//! Database operations for the `hospitals` table.

mod read;
mod types;
mod write;

pub use read::{count_hospitals, list_hospitals_in_bounds};
pub use types::HospitalRow;
pub use write::upsert_hospitals;
