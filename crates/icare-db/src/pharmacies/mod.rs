//! Database operations for the `pharmacies` table.

mod read;
mod types;
mod write;

pub use read::list_pharmacies_in_bounds;
pub use types::PharmacyRow;
pub use write::{deactivate_missing_pharmacies, upsert_pharmacies};
