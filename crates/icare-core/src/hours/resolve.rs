use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};

use super::schedule::{DayClass, FacilityHours, TimeWindow};

/// Operating state of a facility at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingState {
    Open,
    Closed,
    LunchBreak,
    /// No schedule information exists at all.
    Unknown,
}

impl OperatingState {
    /// User-facing Korean label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            OperatingState::Open => "영업중",
            OperatingState::Closed => "영업종료",
            OperatingState::LunchBreak => "점심시간",
            OperatingState::Unknown => "확인요망",
        }
    }

    /// Open or on lunch break: the facility can be visited today.
    #[must_use]
    pub fn is_usable(self) -> bool {
        matches!(self, OperatingState::Open | OperatingState::LunchBreak)
    }
}

/// Resolves the operating state of `hours` at the local wall-clock `instant`.
///
/// Comparison happens at minute precision with inclusive bounds. Malformed
/// main windows resolve to `Closed`; a malformed lunch window is ignored.
#[must_use]
pub fn resolve(hours: &FacilityHours, instant: NaiveDateTime) -> OperatingState {
    if !hours.has_any_data() {
        return OperatingState::Unknown;
    }

    let day = instant.weekday();
    let class = DayClass::of(day);

    if class == DayClass::Sunday && hours.holiday.sunday_closed {
        return OperatingState::Closed;
    }

    let Some((start, end)) = hours.schedule.window_for(day).and_then(TimeWindow::bounds) else {
        return OperatingState::Closed;
    };

    let now = truncate_to_minute(instant.time());
    if now < start || now > end {
        return OperatingState::Closed;
    }

    let lunch = hours
        .lunch
        .as_ref()
        .and_then(|l| l.window_for(class))
        .and_then(lunch_bounds);
    if let Some((lunch_start, lunch_end)) = lunch {
        if lunch_start <= now && now <= lunch_end {
            return OperatingState::LunchBreak;
        }
    }

    OperatingState::Open
}

/// Start of the window that applies on `date`, if one can be derived.
#[must_use]
pub fn opening_time(hours: &FacilityHours, date: NaiveDate) -> Option<NaiveTime> {
    effective_window(hours, date).map(|(start, _)| start)
}

/// End of the window that applies on `date`, if one can be derived.
#[must_use]
pub fn closing_time(hours: &FacilityHours, date: NaiveDate) -> Option<NaiveTime> {
    effective_window(hours, date).map(|(_, end)| end)
}

fn effective_window(hours: &FacilityHours, date: NaiveDate) -> Option<(NaiveTime, NaiveTime)> {
    let day = date.weekday();
    if DayClass::of(day) == DayClass::Sunday && hours.holiday.sunday_closed {
        return None;
    }
    hours.schedule.window_for(day).and_then(TimeWindow::bounds)
}

/// Parses a lunch window, applying the PM correction: the hospital feed
/// records afternoon lunch breaks on a 12-hour clock, so a start hour below
/// 12 shifts both ends by twelve hours. A shift that runs past 23:59 makes
/// the window unusable.
fn lunch_bounds(window: &TimeWindow) -> Option<(NaiveTime, NaiveTime)> {
    let (start, end) = window.bounds()?;
    if start.hour() >= 12 {
        return Some((start, end));
    }
    Some((shift_twelve_hours(start)?, shift_twelve_hours(end)?))
}

fn shift_twelve_hours(t: NaiveTime) -> Option<NaiveTime> {
    let (shifted, wrapped) = t.overflowing_add_signed(TimeDelta::hours(12));
    (wrapped == 0).then_some(shifted)
}

fn truncate_to_minute(t: NaiveTime) -> NaiveTime {
    t.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

#[cfg(test)]
#[path = "resolve_test.rs"]
mod tests;
