//! Distance filtering and ordering of facilities around a reference point.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::facility::{Facility, FacilityLocation};
use crate::hours::{closing_time, opening_time, resolve, OperatingState};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_LIMIT: usize = 5;

/// Great-circle distance in kilometres.
#[must_use]
pub fn haversine_km(a: FacilityLocation, b: FacilityLocation) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Distance to `location`, or infinity when the facility has no coordinates.
#[must_use]
pub fn distance_km(reference: FacilityLocation, location: Option<FacilityLocation>) -> f64 {
    location.map_or(f64::INFINITY, |loc| haversine_km(reference, loc))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Nearest,
    EarliestOpen,
    LatestClose,
}

impl SortOrder {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Nearest => "nearest",
            SortOrder::EarliestOpen => "earliest_open",
            SortOrder::LatestClose => "latest_close",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "nearest" | "distance" => Ok(SortOrder::Nearest),
            "earliest_open" => Ok(SortOrder::EarliestOpen),
            "latest_close" => Ok(SortOrder::LatestClose),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RankQuery {
    pub radius_km: f64,
    /// `None` means "usable now": nearest first, only open or on lunch.
    pub order: Option<SortOrder>,
    pub instant: NaiveDateTime,
    pub limit: usize,
}

impl RankQuery {
    #[must_use]
    pub fn new(radius_km: f64, instant: NaiveDateTime) -> Self {
        Self {
            radius_km,
            order: None,
            instant,
            limit: DEFAULT_LIMIT,
        }
    }

    #[must_use]
    pub fn with_order(mut self, order: Option<SortOrder>) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// A facility evaluated at one instant from one reference point.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedFacility {
    pub facility: Facility,
    pub distance_km: f64,
    pub state: OperatingState,
    pub opening_time: Option<NaiveTime>,
    pub closing_time: Option<NaiveTime>,
}

impl ResolvedFacility {
    #[must_use]
    pub fn evaluate(
        facility: Facility,
        reference: FacilityLocation,
        instant: NaiveDateTime,
    ) -> Self {
        let distance_km = distance_km(reference, facility.location);
        let date = instant.date();
        Self {
            state: resolve(&facility.hours, instant),
            opening_time: opening_time(&facility.hours, date),
            closing_time: closing_time(&facility.hours, date),
            distance_km,
            facility,
        }
    }

    /// Distance rounded to one decimal place for display.
    #[must_use]
    pub fn rounded_distance_km(&self) -> f64 {
        (self.distance_km * 10.0).round() / 10.0
    }
}

/// Ranks `candidates` around `reference`.
///
/// Facilities outside the radius or without an opening time on the resolved
/// day are dropped. The rest are ordered per `query.order` (distance breaks
/// ties) and truncated to `query.limit`.
#[must_use]
pub fn rank<I>(
    reference: FacilityLocation,
    candidates: I,
    query: &RankQuery,
) -> Vec<ResolvedFacility>
where
    I: IntoIterator<Item = Facility>,
{
    let mut ranked: Vec<ResolvedFacility> =
        evaluate_within(reference, candidates, query.radius_km, query.instant)
            .filter(|r| r.opening_time.is_some())
            .collect();

    match query.order {
        None => {
            ranked.retain(|r| r.state.is_usable());
            ranked.sort_by(by_distance);
        }
        Some(SortOrder::Nearest) => ranked.sort_by(by_distance),
        Some(SortOrder::EarliestOpen) => {
            ranked.sort_by(|a, b| {
                a.opening_time
                    .cmp(&b.opening_time)
                    .then_with(|| by_distance(a, b))
            });
        }
        Some(SortOrder::LatestClose) => {
            // Descending on Option puts a missing closing time last.
            ranked.sort_by(|a, b| {
                b.closing_time
                    .cmp(&a.closing_time)
                    .then_with(|| by_distance(a, b))
            });
        }
    }

    ranked.truncate(query.limit);
    ranked
}

/// Every facility within the radius tagged with its state, nearest first.
/// Unlike [`rank`], nothing is dropped for lacking hours.
#[must_use]
pub fn nearby<I>(
    reference: FacilityLocation,
    candidates: I,
    radius_km: f64,
    instant: NaiveDateTime,
) -> Vec<ResolvedFacility>
where
    I: IntoIterator<Item = Facility>,
{
    let mut listed: Vec<ResolvedFacility> =
        evaluate_within(reference, candidates, radius_km, instant).collect();
    listed.sort_by(by_distance);
    listed
}

fn evaluate_within<I>(
    reference: FacilityLocation,
    candidates: I,
    radius_km: f64,
    instant: NaiveDateTime,
) -> impl Iterator<Item = ResolvedFacility>
where
    I: IntoIterator<Item = Facility>,
{
    candidates
        .into_iter()
        .filter(move |f| distance_km(reference, f.location) <= radius_km)
        .map(move |f| ResolvedFacility::evaluate(f, reference, instant))
}

fn by_distance(a: &ResolvedFacility, b: &ResolvedFacility) -> Ordering {
    a.distance_km.total_cmp(&b.distance_km)
}

#[cfg(test)]
#[path = "proximity_test.rs"]
mod tests;
