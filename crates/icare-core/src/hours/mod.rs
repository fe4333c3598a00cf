//! Business-hours engine.
//!
//! [`normalize`] cleans raw vendor time strings, [`schedule`] holds the
//! per-facility weekly model, [`resolve`] turns a model plus an instant into
//! an [`OperatingState`], and [`target_time`] maps relative phrases such as
//! "내일 오전 10시" onto the instant to evaluate.

pub mod normalize;
pub mod resolve;
pub mod schedule;
pub mod target_time;

pub use normalize::{canonical_hhmm, normalize, parse_clock};
pub use resolve::{closing_time, opening_time, resolve, OperatingState};
pub use schedule::{
    DayClass, FacilityHours, HolidayPolicy, LunchBreak, ReceptionHours, TimeWindow,
    WeeklySchedule,
};
