//! Relative time phrases ("내일 오전 10시", "tomorrow morning", "오후") to
//! concrete local instants.

use std::sync::LazyLock;

use chrono::{Days, NaiveDateTime, NaiveTime};
use regex::Regex;

static TOMORROW: LazyLock<Regex> = LazyLock::new(|| marker(&["내일"], &["tomorrow"]));
static DAWN: LazyLock<Regex> = LazyLock::new(|| marker(&["새벽"], &["dawn"]));
static EARLY: LazyLock<Regex> =
    LazyLock::new(|| marker(&["일찍", "아침"], &["early", "morning"]));
static AM: LazyLock<Regex> = LazyLock::new(|| marker(&["오전"], &["am", r"a\.m\."]));
static PM: LazyLock<Regex> = LazyLock::new(|| marker(&["오후"], &["pm", r"p\.m\."]));

/// A written clock time: `10시`, `3시 30분`, `10:30`, `3pm`, `7 o'clock`.
/// `시간` ("hours", as in "1시간 내") is matched only so it can be skipped.
static WRITTEN_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)(?::(\d{2}))?\s*(시간|시(?:\s*(\d+)\s*분)?|a\.?m\.?|p\.?m\.?|o'?clock)?")
        .expect("valid written time regex")
});

/// Builds a case-insensitive matcher: Korean words match anywhere, English
/// words must not be glued to other ASCII letters ("am" must not match "game").
fn marker(korean: &[&str], english: &[&str]) -> Regex {
    let english = english.join("|");
    let korean = korean.join("|");
    Regex::new(&format!(
        r"(?i)(?:{korean})|(?:^|[^a-z])(?:{english})(?:$|[^a-z])"
    ))
    .expect("valid marker regex")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

#[derive(Debug, Clone, Copy)]
struct WrittenTime {
    hour: u32,
    minute: u32,
    /// Set when the meridiem is glued to the number ("3pm").
    meridiem: Option<Meridiem>,
}

/// Resolves `expression` against `now`.
///
/// A "tomorrow" marker moves the date forward one day. The time of day is
/// then chosen in order: dawn 06:00, early/morning 08:00, a written clock
/// time, a bare AM (09:00) or PM (14:00) keyword. A written time takes its
/// meridiem from a suffix attached to the number first, then from a free
/// AM/PM keyword, and is read as 24-hour time otherwise; PM shifts hours
/// below 12. Without any of these the time of day of `now` is kept.
/// Anything unparseable yields `now` unchanged.
#[must_use]
pub fn parse(expression: &str, now: NaiveDateTime) -> NaiveDateTime {
    try_parse(expression, now).unwrap_or(now)
}

/// True when the phrase carries any marker [`parse`] acts on.
#[must_use]
pub fn has_time_marker(expression: &str) -> bool {
    [&TOMORROW, &DAWN, &EARLY, &AM, &PM]
        .iter()
        .any(|re| re.is_match(expression))
        || written_time(expression).is_some()
}

fn try_parse(expression: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let date = if TOMORROW.is_match(expression) {
        now.date().checked_add_days(Days::new(1))?
    } else {
        now.date()
    };

    let time = if DAWN.is_match(expression) {
        clock(6, 0)?
    } else if EARLY.is_match(expression) {
        clock(8, 0)?
    } else if let Some(written) = written_time(expression) {
        let written = written?;
        let meridiem = written.meridiem.or_else(|| keyword_meridiem(expression));
        let hour = match meridiem {
            Some(Meridiem::Pm) if written.hour < 12 => written.hour + 12,
            _ => written.hour,
        };
        clock(hour, written.minute)?
    } else if AM.is_match(expression) {
        clock(9, 0)?
    } else if PM.is_match(expression) {
        clock(14, 0)?
    } else {
        now.time()
    };

    Some(date.and_time(time))
}

fn keyword_meridiem(expression: &str) -> Option<Meridiem> {
    if AM.is_match(expression) {
        Some(Meridiem::Am)
    } else if PM.is_match(expression) {
        Some(Meridiem::Pm)
    } else {
        None
    }
}

/// First written clock time. `None` when there is none, `Some(None)` when
/// one is written but its numbers do not fit.
fn written_time(expression: &str) -> Option<Option<WrittenTime>> {
    WRITTEN_TIME.captures_iter(expression).find_map(|caps| {
        let suffix = caps.get(3).map(|m| m.as_str());
        let colon_minute = caps.get(2);
        if suffix == Some("시간") || (suffix.is_none() && colon_minute.is_none()) {
            return None;
        }

        let number = |m: Option<regex::Match<'_>>| -> Option<Option<u32>> {
            m.map(|m| m.as_str().parse().ok())
        };
        let hour = caps.get(1).and_then(|m| m.as_str().parse().ok());
        let minute = number(colon_minute)
            .or_else(|| number(caps.get(4)))
            .unwrap_or(Some(0));
        let meridiem = suffix.and_then(|s| {
            match s.chars().next().map(|c| c.to_ascii_lowercase()) {
                Some('a') => Some(Meridiem::Am),
                Some('p') => Some(Meridiem::Pm),
                _ => None,
            }
        });

        Some(hour.zip(minute).map(|(hour, minute)| WrittenTime {
            hour,
            minute,
            meridiem,
        }))
    })
}

fn clock(hour: u32, minute: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, 0)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Timelike};

    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(16, 42, 17)
            .unwrap()
    }

    fn ymd_hm(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn tomorrow_morning_with_explicit_hour() {
        assert_eq!(parse("내일 오전 10시", now()), ymd_hm(15, 10, 0));
    }

    #[test]
    fn dawn_keeps_date() {
        assert_eq!(parse("새벽", now()), ymd_hm(14, 6, 0));
    }

    #[test]
    fn early_and_morning_mean_eight() {
        assert_eq!(parse("일찍 여는 곳", now()), ymd_hm(14, 8, 0));
        assert_eq!(parse("tomorrow morning", now()), ymd_hm(15, 8, 0));
    }

    #[test]
    fn dawn_wins_over_morning() {
        assert_eq!(parse("새벽 아침", now()), ymd_hm(14, 6, 0));
    }

    #[test]
    fn am_without_hour_defaults_to_nine() {
        assert_eq!(parse("오전", now()), ymd_hm(14, 9, 0));
    }

    #[test]
    fn pm_shifts_small_hours() {
        assert_eq!(parse("오후 3시", now()), ymd_hm(14, 15, 0));
        assert_eq!(parse("오후 13시", now()), ymd_hm(14, 13, 0));
        assert_eq!(parse("at 2pm", now()), ymd_hm(14, 14, 0));
        assert_eq!(parse("오후", now()), ymd_hm(14, 14, 0));
    }

    #[test]
    fn english_am_needs_word_boundary() {
        // "game" contains "am" but is not a marker.
        assert_eq!(parse("game night", now()), now());
        assert_eq!(parse("10 am", now()), ymd_hm(14, 10, 0));
    }

    #[test]
    fn tomorrow_alone_keeps_time_of_day() {
        let parsed = parse("내일", now());
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(parsed.time(), now().time());
        assert_eq!(parsed.second(), 17);
    }

    #[test]
    fn no_marker_passes_through() {
        assert_eq!(parse("근처 병원", now()), now());
    }

    #[test]
    fn invalid_hour_returns_now_unchanged() {
        assert_eq!(parse("내일 오전 25시", now()), now());
        assert_eq!(parse("오후 99999999999시", now()), now());
    }

    #[test]
    fn marker_detection() {
        assert!(has_time_marker("내일 문 여는 약국"));
        assert!(has_time_marker("3시에 여는 병원"));
        assert!(!has_time_marker("근처 약국 찾아줘"));
        assert!(!has_time_marker("1시간 안에 갈 수 있는 약국"));
    }

    #[test]
    fn meridiem_attached_to_hour_wins_over_free_keyword() {
        // "am" here is the verb, "pm" belongs to the hour.
        assert_eq!(
            parse("I am looking for a pharmacy open at 3pm", now()),
            ymd_hm(14, 15, 0)
        );
        assert_eq!(parse("오후 9am", now()), ymd_hm(14, 9, 0));
    }

    #[test]
    fn minutes_are_kept() {
        assert_eq!(parse("오전 10:30", now()), ymd_hm(14, 10, 30));
        assert_eq!(parse("내일 오후 3시 30분", now()), ymd_hm(15, 15, 30));
        assert_eq!(parse("at 7:45 pm", now()), ymd_hm(14, 19, 45));
        assert_eq!(parse("오전 10:75", now()), now());
    }

    #[test]
    fn bare_written_hour_is_applied_as_written() {
        assert_eq!(parse("3시에 여는 병원", now()), ymd_hm(14, 3, 0));
        assert_eq!(parse("21:15 약국", now()), ymd_hm(14, 21, 15));
        assert_eq!(parse("내일 19시", now()), ymd_hm(15, 19, 0));
    }

    #[test]
    fn duration_in_hours_is_not_a_clock_time() {
        assert_eq!(parse("1시간 안에", now()), now());
        assert_eq!(parse("오후 2시간 뒤 3시", now()), ymd_hm(14, 15, 0));
    }
}
