use serde::{Deserialize, Serialize};

use crate::hours::FacilityHours;

/// Decimal-degree coordinate pair. Only exists when both halves are known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FacilityLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl FacilityLocation {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds a location from nullable columns. Returns `None` unless both
    /// coordinates are present and finite.
    #[must_use]
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
                Some(Self::new(lat, lng))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityKind {
    Hospital,
    Pharmacy,
}

impl FacilityKind {
    /// Search radius used when the caller does not supply one.
    #[must_use]
    pub fn default_radius_km(self) -> f64 {
        match self {
            FacilityKind::Hospital => 3.0,
            FacilityKind::Pharmacy => 10.0,
        }
    }

    /// Korean noun used in user-facing framing text.
    #[must_use]
    pub fn noun(self) -> &'static str {
        match self {
            FacilityKind::Hospital => "병원",
            FacilityKind::Pharmacy => "약국",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FacilityKind::Hospital => "hospital",
            FacilityKind::Pharmacy => "pharmacy",
        }
    }
}

impl std::fmt::Display for FacilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hospital or pharmacy as seen by the hours engine: identity, contact
/// details, an optional location and its published hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    pub id: i64,
    pub kind: FacilityKind,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Canonical department for hospitals; `None` for pharmacies.
    pub category: Option<String>,
    pub location: Option<FacilityLocation>,
    pub hours: FacilityHours,
}
