//! Offline tests for icare-db pool configuration and row conversion.
//! These tests do not require a live database connection.

use chrono::{NaiveDate, Utc, Weekday};
use icare_core::{AppConfig, Environment, FacilityKind, TimeWindow};
use icare_db::{HospitalRow, PharmacyRow, PoolConfig};
use serde_json::json;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        timezone: chrono_tz::Asia::Seoul,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        pharmacy_api_key: None,
        hospital_api_key: None,
        drug_api_key: None,
        publicdata_timeout_secs: 30,
        publicdata_max_retries: 3,
        publicdata_retry_backoff_base_ms: 500,
        chat_session_ttl_secs: 1800,
        chat_max_sessions: 1000,
        chat_history_limit: 50,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

fn hospital_row() -> HospitalRow {
    HospitalRow {
        id: 7,
        ykiho: "JDQ4MTYyMiM1MSMkMSMkMCMkODkkMzgxMzUxIzExIyQxIyQzIyQ4OSQyNjE4MzIjNDEjJDEjJDgjJDgz"
            .to_string(),
        name: "튼튼소아청소년과의원".to_string(),
        address: Some("서울특별시 중구 세종대로 110".to_string()),
        phone: Some("02-123-4567".to_string()),
        department: Some("소아청소년과(2명)".to_string()),
        hospital_type: "소아청소년과".to_string(),
        latitude: Some(37.5665),
        longitude: Some(126.9780),
        weekday_hours: json!({
            "mon": {"start": "09:00", "end": "18:00"},
            "tue": {"start": "09:00", "end": "18:00"},
        }),
        saturday_hours: None,
        sunday_hours: Some(serde_json::Value::Null),
        reception_hours: json!({"saturday": {"start": "09:00", "end": "13:00"}}),
        lunch_time: json!({"weekday": {"start": "13:00", "end": "14:00"}}),
        sunday_closed: true,
        holiday_info: json!({"fully_closed_on_holidays": true}),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn hospital_row_converts_to_facility() {
    let facility = hospital_row().to_facility();

    assert_eq!(facility.kind, FacilityKind::Hospital);
    assert_eq!(facility.category.as_deref(), Some("소아청소년과"));
    assert!(facility.location.is_some());

    let schedule = &facility.hours.schedule;
    assert_eq!(
        schedule.window_for(Weekday::Mon),
        Some(&TimeWindow::new("09:00", "18:00"))
    );
    // Saturday was empty and gets the reception window.
    assert_eq!(
        schedule.window_for(Weekday::Sat),
        Some(&TimeWindow::new("09:00", "13:00"))
    );
    assert!(schedule.window_for(Weekday::Sun).is_none());

    let lunch = facility.hours.lunch.expect("lunch should be kept");
    assert_eq!(lunch.weekday, Some(TimeWindow::new("13:00", "14:00")));
    assert!(facility.hours.holiday.sunday_closed);
    assert!(facility.hours.holiday.fully_closed_on_holidays);
}

#[test]
fn blank_hospital_type_is_labelled_general_clinic() {
    let mut row = hospital_row();
    row.hospital_type = "  ".to_string();
    assert_eq!(row.to_facility().category.as_deref(), Some("일반의원"));
}

#[test]
fn malformed_hospital_hours_column_degrades_to_empty() {
    let mut row = hospital_row();
    row.weekday_hours = json!("not an object");
    row.lunch_time = json!({});

    let facility = row.to_facility();
    assert!(facility.hours.schedule.window_for(Weekday::Mon).is_none());
    assert!(facility.hours.lunch.is_none());
}

#[test]
fn pharmacy_row_reads_compact_hours() {
    let now = Utc::now();
    let text = |s: &str| Some(s.to_string());
    let row = PharmacyRow {
        id: 3,
        hpid: "C1100001".to_string(),
        name: "온누리약국".to_string(),
        address: None,
        tel: text("02-555-0000"),
        fax: None,
        latitude: Some(37.5),
        longitude: None,
        map_info: None,
        etc: None,
        mon_start: text("0900"),
        mon_end: text("1900"),
        tue_start: text("0900"),
        tue_end: text("1900"),
        wed_start: None,
        wed_end: None,
        thu_start: text("0900"),
        thu_end: None,
        fri_start: text("0900"),
        fri_end: text("2130"),
        sat_start: text("1000"),
        sat_end: text("1500"),
        sun_start: None,
        sun_end: None,
        is_active: true,
        last_seen_at: now,
        created_at: now,
        updated_at: now,
    };

    let facility = row.to_facility();
    assert_eq!(facility.kind, FacilityKind::Pharmacy);
    assert_eq!(facility.phone.as_deref(), Some("02-555-0000"));
    assert!(facility.location.is_none(), "half a coordinate is no location");

    let schedule = &facility.hours.schedule;
    assert_eq!(
        schedule.window_for(Weekday::Fri),
        Some(&TimeWindow::new("09:00", "21:30"))
    );
    assert!(schedule.window_for(Weekday::Wed).is_none());
    assert!(schedule.window_for(Weekday::Thu).is_none());

    let friday_evening = NaiveDate::from_ymd_opt(2024, 1, 5)
        .unwrap()
        .and_hms_opt(21, 0, 0)
        .unwrap();
    assert_eq!(
        icare_core::hours::resolve(&facility.hours, friday_evening),
        icare_core::OperatingState::Open
    );
}
