//! Normalization of public-data items into the records the database layer
//! upserts, including the parsers for the hospital feed's free-text fields.

use std::collections::HashSet;
use std::sync::LazyLock;

use icare_core::department::GENERAL_CLINIC;
use icare_core::{
    normalize_hospital_type, HolidayPolicy, LunchBreak, NewHospital, NewPharmacy,
    ReceptionHours, TimeWindow, WeeklySchedule,
};
use regex::Regex;

use crate::types::{DepartmentItem, HospitalBasisItem, HospitalDetailItem, PharmacyItem};

/// Marker the feed uses for "no data".
const NO_INFO: &str = "정보없음";
const FULL_CLOSURE_MARKERS: [&str; 3] = ["전부휴진", "전체휴무", "종일휴진"];

/// `9시30분~18시`, `13:00~14:00`, `1230~1330`.
static TIME_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})[시:]?(\d{1,2})?분?~(\d{1,2})[시:]?(\d{1,2})?분?")
        .expect("valid time range regex")
});

/// `13시 이후 휴진`, `12시부터 휴무`.
static PARTIAL_CLOSURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})시\s*(?:이?후|부터)?\s*휴[진무]").expect("valid partial closure regex")
});

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != NO_INFO)
        .map(str::to_owned)
}

/// Coordinates of `0` are the feed's placeholder for "unknown".
fn coordinate(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v != 0.0)
}

/// Parses the first `start~end` range in vendor text into a window.
/// Text containing `정보없음` yields `None`.
#[must_use]
pub fn parse_time_range(text: &str) -> Option<TimeWindow> {
    if text.contains(NO_INFO) {
        return None;
    }
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let caps = TIME_RANGE.captures(&compact)?;
    let num = |i: usize| -> u32 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    Some(TimeWindow::new(
        format!("{:02}:{:02}", num(1), num(2)),
        format!("{:02}:{:02}", num(3), num(4)),
    ))
}

/// Seven-day treatment schedule from the detail item's `HHMM` fields.
#[must_use]
pub fn parse_treatment_hours(detail: &HospitalDetailItem) -> WeeklySchedule {
    let d = detail;
    WeeklySchedule::from_compact_pairs([
        (d.trmt_mon_start.as_deref(), d.trmt_mon_end.as_deref()),
        (d.trmt_tue_start.as_deref(), d.trmt_tue_end.as_deref()),
        (d.trmt_wed_start.as_deref(), d.trmt_wed_end.as_deref()),
        (d.trmt_thu_start.as_deref(), d.trmt_thu_end.as_deref()),
        (d.trmt_fri_start.as_deref(), d.trmt_fri_end.as_deref()),
        (d.trmt_sat_start.as_deref(), d.trmt_sat_end.as_deref()),
        (d.trmt_sun_start.as_deref(), d.trmt_sun_end.as_deref()),
    ])
}

/// Interprets the Sunday and public-holiday notes.
#[must_use]
pub fn parse_holiday_text(sunday: Option<&str>, holidays: Option<&str>) -> HolidayPolicy {
    let mut policy = HolidayPolicy {
        sunday_closed: sunday.is_some_and(|s| s.contains("휴진") || s.contains("휴무")),
        ..HolidayPolicy::default()
    };

    let Some(text) = holidays.map(str::trim).filter(|t| !t.is_empty()) else {
        return policy;
    };

    policy.fully_closed_on_holidays = FULL_CLOSURE_MARKERS.iter().any(|m| text.contains(m));
    policy.partially_closed_from = PARTIAL_CLOSURE
        .captures(text)
        .and_then(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .map(|hour| format!("{hour:02}:00"));

    for (needle, tag) in [
        ("명절", "명절"),
        ("어린이날", "어린이날"),
        ("크리스마스", "크리스마스"),
        ("신정", "신정"),
        ("신년", "신정"),
    ] {
        if text.contains(needle) {
            policy.special_holiday_tags.insert(tag.to_owned());
        }
    }
    policy
}

/// `"소아청소년과(2명), 내과(1명)"`; `None` without departments.
#[must_use]
pub fn department_summary(departments: &[DepartmentItem]) -> Option<String> {
    let parts: Vec<String> = departments
        .iter()
        .filter_map(|d| {
            let name = clean(d.name.as_deref())?;
            Some(format!("{name}({}명)", d.doctors()))
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

/// Canonical type of the department with the most doctors; the first listed
/// wins ties.
#[must_use]
pub fn classify_hospital_type(departments: &[DepartmentItem]) -> &'static str {
    let mut best: Option<(&str, u32)> = None;
    for dept in departments {
        let Some(name) = dept.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
            continue;
        };
        let doctors = dept.doctors();
        if best.is_none_or(|(_, most)| doctors > most) {
            best = Some((name, doctors));
        }
    }
    best.map_or(GENERAL_CLINIC, |(name, _)| normalize_hospital_type(name))
}

/// Items without an `hpid` cannot be upserted and are skipped.
#[must_use]
pub fn normalize_pharmacy(item: &PharmacyItem) -> Option<NewPharmacy> {
    let hpid = clean(item.hpid.as_deref())?;
    let pair = |s: &Option<String>, e: &Option<String>| (clean(s.as_deref()), clean(e.as_deref()));

    Some(NewPharmacy {
        hpid,
        name: clean(item.duty_name.as_deref()).unwrap_or_else(|| NO_INFO.to_owned()),
        address: clean(item.duty_addr.as_deref()),
        tel: clean(item.duty_tel1.as_deref()),
        fax: clean(item.duty_fax.as_deref()),
        latitude: coordinate(item.wgs84_lat.as_deref()),
        longitude: coordinate(item.wgs84_lon.as_deref()),
        map_info: clean(item.duty_mapimg.as_deref()),
        etc: clean(item.duty_etc.as_deref()),
        hours: [
            pair(&item.duty_time1s, &item.duty_time1c),
            pair(&item.duty_time2s, &item.duty_time2c),
            pair(&item.duty_time3s, &item.duty_time3c),
            pair(&item.duty_time4s, &item.duty_time4c),
            pair(&item.duty_time5s, &item.duty_time5c),
            pair(&item.duty_time6s, &item.duty_time6c),
            pair(&item.duty_time7s, &item.duty_time7c),
        ],
    })
}

/// Normalizes a full download, dropping items without an `hpid` and
/// repeated `hpid`s (the first occurrence wins).
#[must_use]
pub fn normalize_pharmacies(items: &[PharmacyItem]) -> Vec<NewPharmacy> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(normalize_pharmacy)
        .filter(|p| seen.insert(p.hpid.clone()))
        .collect()
}

/// Combines the three hospital endpoints into one record. Items without a
/// `ykiho` are skipped.
#[must_use]
pub fn normalize_hospital(
    basis: &HospitalBasisItem,
    detail: Option<&HospitalDetailItem>,
    departments: &[DepartmentItem],
) -> Option<NewHospital> {
    let ykiho = clean(basis.ykiho.as_deref())?;
    let empty = HospitalDetailItem::default();
    let detail = detail.unwrap_or(&empty);
    let range = |text: &Option<String>| text.as_deref().and_then(parse_time_range);

    Some(NewHospital {
        ykiho,
        name: clean(basis.yadm_nm.as_deref()).unwrap_or_else(|| NO_INFO.to_owned()),
        address: clean(basis.addr.as_deref()),
        phone: clean(basis.telno.as_deref()),
        department: department_summary(departments),
        hospital_type: classify_hospital_type(departments).to_owned(),
        latitude: coordinate(basis.y_pos.as_deref()),
        longitude: coordinate(basis.x_pos.as_deref()),
        schedule: parse_treatment_hours(detail),
        reception: ReceptionHours {
            weekday: range(&detail.rcv_week),
            saturday: range(&detail.rcv_sat),
        },
        lunch: LunchBreak {
            weekday: range(&detail.lunch_week),
            saturday: range(&detail.lunch_sat),
        },
        holiday: parse_holiday_text(detail.no_trmt_sun.as_deref(), detail.no_trmt_holi.as_deref()),
    })
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
