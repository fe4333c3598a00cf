use std::collections::BTreeSet;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::normalize::{canonical_hhmm, parse_clock};

/// Grouping used to pick lunch and reception windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayClass {
    Weekday,
    Saturday,
    Sunday,
}

impl DayClass {
    #[must_use]
    pub fn of(day: Weekday) -> Self {
        match day {
            Weekday::Sat => DayClass::Saturday,
            Weekday::Sun => DayClass::Sunday,
            _ => DayClass::Weekday,
        }
    }
}

/// Opening window for one day, stored as the raw strings the feed provided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
}

impl TimeWindow {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Builds a window from compact `HHMM` values. Both ends must be present.
    #[must_use]
    pub fn from_compact(start: Option<&str>, end: Option<&str>) -> Option<Self> {
        let start = canonical_hhmm(start?)?;
        let end = canonical_hhmm(end?)?;
        Some(Self { start, end })
    }

    /// Parsed `(start, end)`; `None` when either side is malformed.
    #[must_use]
    pub fn bounds(&self) -> Option<(NaiveTime, NaiveTime)> {
        Some((parse_clock(&self.start)?, parse_clock(&self.end)?))
    }

    fn is_blank(&self) -> bool {
        self.start.trim().is_empty() && self.end.trim().is_empty()
    }
}

/// Seven independent optional windows. A missing day means the facility
/// published nothing for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklySchedule {
    pub mon: Option<TimeWindow>,
    pub tue: Option<TimeWindow>,
    pub wed: Option<TimeWindow>,
    pub thu: Option<TimeWindow>,
    pub fri: Option<TimeWindow>,
    pub sat: Option<TimeWindow>,
    pub sun: Option<TimeWindow>,
}

impl WeeklySchedule {
    /// Builds a schedule from compact `HHMM` open/close pairs, Monday first.
    #[must_use]
    pub fn from_compact_pairs(pairs: [(Option<&str>, Option<&str>); 7]) -> Self {
        let mut schedule = Self::default();
        for (day, (start, end)) in WEEK.into_iter().zip(pairs) {
            *schedule.slot_mut(day) = TimeWindow::from_compact(start, end);
        }
        schedule
    }

    /// The window for `day`, ignoring entries where both ends are blank.
    #[must_use]
    pub fn window_for(&self, day: Weekday) -> Option<&TimeWindow> {
        self.slot(day).as_ref().filter(|w| !w.is_blank())
    }

    pub fn set(&mut self, day: Weekday, window: Option<TimeWindow>) {
        *self.slot_mut(day) = window;
    }

    #[must_use]
    pub fn has_any_window(&self) -> bool {
        WEEK.iter().any(|day| self.window_for(*day).is_some())
    }

    /// Fills gaps from reception hours: weekday reception covers Mon–Fri
    /// only when no weekday window exists at all, and Saturday reception
    /// covers a missing Saturday window.
    #[must_use]
    pub fn with_reception_fallback(mut self, reception: &ReceptionHours) -> Self {
        let weekdays = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ];
        let no_weekday_hours = weekdays.iter().all(|d| self.window_for(*d).is_none());
        if no_weekday_hours {
            if let Some(window) = &reception.weekday {
                for day in weekdays {
                    self.set(day, Some(window.clone()));
                }
            }
        }
        if self.window_for(Weekday::Sat).is_none() {
            if let Some(window) = &reception.saturday {
                self.set(Weekday::Sat, Some(window.clone()));
            }
        }
        self
    }

    fn slot(&self, day: Weekday) -> &Option<TimeWindow> {
        match day {
            Weekday::Mon => &self.mon,
            Weekday::Tue => &self.tue,
            Weekday::Wed => &self.wed,
            Weekday::Thu => &self.thu,
            Weekday::Fri => &self.fri,
            Weekday::Sat => &self.sat,
            Weekday::Sun => &self.sun,
        }
    }

    fn slot_mut(&mut self, day: Weekday) -> &mut Option<TimeWindow> {
        match day {
            Weekday::Mon => &mut self.mon,
            Weekday::Tue => &mut self.tue,
            Weekday::Wed => &mut self.wed,
            Weekday::Thu => &mut self.thu,
            Weekday::Fri => &mut self.fri,
            Weekday::Sat => &mut self.sat,
            Weekday::Sun => &mut self.sun,
        }
    }
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LunchBreak {
    pub weekday: Option<TimeWindow>,
    pub saturday: Option<TimeWindow>,
}

impl LunchBreak {
    /// Lunch window for a class of day. Sundays never have one.
    #[must_use]
    pub fn window_for(&self, class: DayClass) -> Option<&TimeWindow> {
        let window = match class {
            DayClass::Weekday => self.weekday.as_ref(),
            DayClass::Saturday => self.saturday.as_ref(),
            DayClass::Sunday => None,
        };
        window.filter(|w| !w.is_blank())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window_for(DayClass::Weekday).is_none() && self.window_for(DayClass::Saturday).is_none()
    }
}

/// Reception (접수) hours, used only to fill missing treatment windows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceptionHours {
    pub weekday: Option<TimeWindow>,
    pub saturday: Option<TimeWindow>,
}

/// Holiday flags parsed from vendor text. Only `sunday_closed` affects
/// resolution; the rest is carried for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HolidayPolicy {
    pub sunday_closed: bool,
    pub fully_closed_on_holidays: bool,
    pub partially_closed_from: Option<String>,
    pub special_holiday_tags: BTreeSet<String>,
}

impl HolidayPolicy {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.sunday_closed
            && !self.fully_closed_on_holidays
            && self.partially_closed_from.is_none()
            && self.special_holiday_tags.is_empty()
    }
}

/// Everything the resolver needs to know about one facility's hours.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilityHours {
    pub schedule: WeeklySchedule,
    pub lunch: Option<LunchBreak>,
    pub holiday: HolidayPolicy,
}

impl FacilityHours {
    /// False only when there are no windows, no lunch data and no holiday
    /// flags at all.
    #[must_use]
    pub fn has_any_data(&self) -> bool {
        self.schedule.has_any_window()
            || self.lunch.as_ref().is_some_and(|l| !l.is_empty())
            || !self.holiday.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(start: &str, end: &str) -> Option<TimeWindow> {
        Some(TimeWindow::new(start, end))
    }

    #[test]
    fn day_class_groups_days() {
        assert_eq!(DayClass::of(Weekday::Mon), DayClass::Weekday);
        assert_eq!(DayClass::of(Weekday::Fri), DayClass::Weekday);
        assert_eq!(DayClass::of(Weekday::Sat), DayClass::Saturday);
        assert_eq!(DayClass::of(Weekday::Sun), DayClass::Sunday);
    }

    #[test]
    fn from_compact_pairs_requires_both_ends() {
        let schedule = WeeklySchedule::from_compact_pairs([
            (Some("0900"), Some("1800")),
            (Some("0900"), None),
            (None, None),
            (Some("0900"), Some("1800")),
            (Some("0900"), Some("2100")),
            (Some("0900"), Some("1300")),
            (None, Some("1300")),
        ]);
        assert_eq!(schedule.mon, window("09:00", "18:00"));
        assert!(schedule.tue.is_none());
        assert!(schedule.wed.is_none());
        assert_eq!(schedule.fri, window("09:00", "21:00"));
        assert_eq!(schedule.sat, window("09:00", "13:00"));
        assert!(schedule.sun.is_none());
    }

    #[test]
    fn blank_windows_count_as_absent() {
        let schedule = WeeklySchedule {
            mon: window("", " "),
            ..WeeklySchedule::default()
        };
        assert!(schedule.window_for(Weekday::Mon).is_none());
        assert!(!schedule.has_any_window());
    }

    #[test]
    fn reception_fills_weekdays_only_when_all_missing() {
        let reception = ReceptionHours {
            weekday: window("08:30", "17:30"),
            saturday: window("08:30", "12:30"),
        };
        let filled = WeeklySchedule::default().with_reception_fallback(&reception);
        assert_eq!(filled.mon, window("08:30", "17:30"));
        assert_eq!(filled.fri, window("08:30", "17:30"));
        assert_eq!(filled.sat, window("08:30", "12:30"));
        assert!(filled.sun.is_none());

        let partial = WeeklySchedule {
            mon: window("09:00", "18:00"),
            ..WeeklySchedule::default()
        }
        .with_reception_fallback(&reception);
        assert_eq!(partial.mon, window("09:00", "18:00"));
        assert!(partial.tue.is_none());
    }

    #[test]
    fn schedule_json_uses_day_keys() {
        let schedule = WeeklySchedule {
            mon: window("09:00", "18:00"),
            ..WeeklySchedule::default()
        };
        let json = serde_json::to_value(&schedule).unwrap();
        assert_eq!(json["mon"]["start"], "09:00");
        assert!(json["sun"].is_null());

        let parsed: WeeklySchedule =
            serde_json::from_str(r#"{"tue": {"start": "10:00", "end": "19:00"}}"#).unwrap();
        assert_eq!(parsed.tue, window("10:00", "19:00"));
        assert!(parsed.mon.is_none());
    }

    #[test]
    fn holiday_policy_emptiness() {
        assert!(HolidayPolicy::default().is_empty());
        let policy = HolidayPolicy {
            special_holiday_tags: BTreeSet::from(["명절".to_string()]),
            ..HolidayPolicy::default()
        };
        assert!(!policy.is_empty());
    }

    #[test]
    fn lunch_has_no_sunday_window() {
        let lunch = LunchBreak {
            weekday: window("13:00", "14:00"),
            saturday: None,
        };
        assert!(lunch.window_for(DayClass::Weekday).is_some());
        assert!(lunch.window_for(DayClass::Saturday).is_none());
        assert!(lunch.window_for(DayClass::Sunday).is_none());
    }
}
