//! Live integration tests for icare-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database. The
//! `migrations` path is relative to `crates/icare-db/`.

use chrono::NaiveDate;
use icare_core::{
    FacilityLocation, HolidayPolicy, LunchBreak, NewHospital, NewPharmacy, ReceptionHours,
    TimeWindow, WeeklySchedule,
};
use icare_db::{
    complete_ingestion_run, create_child, create_ingestion_run, create_prescription,
    create_user, deactivate_missing_pharmacies, delete_prescription, fail_ingestion_run,
    get_ingestion_run, get_prescription, get_user_location, list_children_for_user,
    list_hospitals_in_bounds, list_ingestion_runs, list_pharmacies_in_bounds,
    list_prescriptions_for_child, start_ingestion_run, update_user_location, upsert_hospitals,
    upsert_pharmacies, BoundingBox, DbError, NewMedicine, NewPrescription,
};

fn seoul() -> FacilityLocation {
    FacilityLocation::new(37.5665, 126.9780)
}

fn pharmacy(hpid: &str, lat_offset: f64) -> NewPharmacy {
    let hhmm = |s: &str| Some(s.to_string());
    NewPharmacy {
        hpid: hpid.to_string(),
        name: format!("{hpid} 약국"),
        latitude: Some(seoul().latitude + lat_offset),
        longitude: Some(seoul().longitude),
        hours: [
            (hhmm("0900"), hhmm("1800")),
            (hhmm("0900"), hhmm("1800")),
            (hhmm("0900"), hhmm("1800")),
            (hhmm("0900"), hhmm("1800")),
            (hhmm("0900"), hhmm("1800")),
            (None, None),
            (None, None),
        ],
        ..NewPharmacy::default()
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn ingestion_run_lifecycle_queued_to_succeeded(pool: sqlx::PgPool) {
    let run = create_ingestion_run(&pool, "pharmacies", "cli")
        .await
        .expect("create_ingestion_run failed");
    assert_eq!(run.status, "queued");
    assert!(run.started_at.is_none());

    start_ingestion_run(&pool, run.id)
        .await
        .expect("start_ingestion_run failed");
    complete_ingestion_run(&pool, run.id, 12)
        .await
        .expect("complete_ingestion_run failed");

    let fetched = get_ingestion_run(&pool, run.id)
        .await
        .expect("get_ingestion_run failed");
    assert_eq!(fetched.status, "succeeded");
    assert_eq!(fetched.records_processed, 12);
    assert!(fetched.completed_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn ingestion_run_rejects_out_of_order_transitions(pool: sqlx::PgPool) {
    let run = create_ingestion_run(&pool, "hospitals", "scheduler")
        .await
        .expect("create_ingestion_run failed");

    let err = complete_ingestion_run(&pool, run.id, 1)
        .await
        .expect_err("completing a queued run must fail");
    assert!(matches!(
        err,
        DbError::InvalidRunTransition {
            expected_status: "running",
            ..
        }
    ));

    start_ingestion_run(&pool, run.id).await.expect("start failed");
    fail_ingestion_run(&pool, run.id, "upstream timeout")
        .await
        .expect("fail failed");

    let runs = list_ingestion_runs(&pool, 10).await.expect("list failed");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, "failed");
    assert_eq!(runs[0].error_message.as_deref(), Some("upstream timeout"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn user_location_round_trips(pool: sqlx::PgPool) {
    let user = create_user(&pool, "parent@example.com", true)
        .await
        .expect("create_user failed");
    assert!(get_user_location(&pool, user.id)
        .await
        .expect("get location failed")
        .is_none());

    update_user_location(&pool, user.id, seoul())
        .await
        .expect("update location failed");
    let location = get_user_location(&pool, user.id)
        .await
        .expect("get location failed")
        .expect("location should be saved");
    assert!((location.latitude - seoul().latitude).abs() < 1e-9);

    let missing = update_user_location(&pool, user.id + 1000, seoul()).await;
    assert!(matches!(missing, Err(DbError::NotFound)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn prescription_with_medicines_lifecycle(pool: sqlx::PgPool) {
    let user = create_user(&pool, "rx@example.com", true)
        .await
        .expect("create_user failed");
    let child = create_child(&pool, user.id, "하늘")
        .await
        .expect("create_child failed");
    assert_eq!(
        list_children_for_user(&pool, user.id)
            .await
            .expect("list children failed")
            .len(),
        1
    );

    let new = NewPrescription {
        pharmacy_name: "온누리약국".to_string(),
        prescription_date: NaiveDate::from_ymd_opt(2024, 3, 2).expect("valid date"),
        pharmacy_address: None,
        total_amount: Some(4_500),
        duration_days: Some(3),
        medicines: vec![
            NewMedicine {
                name: "타이레놀현탁액".to_string(),
                dosage: "5ml".to_string(),
                frequency: 3,
                duration_days: 3,
            },
            NewMedicine {
                name: "코대원시럽".to_string(),
                dosage: "3ml".to_string(),
                frequency: 2,
                duration_days: 3,
            },
        ],
    };
    let created = create_prescription(&pool, child.id, &new)
        .await
        .expect("create_prescription failed");
    assert!(created.prescription.prescription_number.starts_with("RX-"));
    assert_eq!(created.medicines.len(), 2);

    let fetched = get_prescription(&pool, created.prescription.id)
        .await
        .expect("get_prescription failed");
    assert_eq!(fetched.medicines[0].name, "타이레놀현탁액");
    assert_eq!(
        list_prescriptions_for_child(&pool, child.id)
            .await
            .expect("list failed")
            .len(),
        1
    );

    delete_prescription(&pool, created.prescription.id)
        .await
        .expect("delete failed");
    assert!(matches!(
        get_prescription(&pool, created.prescription.id).await,
        Err(DbError::NotFound)
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn child_requires_existing_user(pool: sqlx::PgPool) {
    let result = create_child(&pool, 999, "없음").await;
    assert!(matches!(result, Err(DbError::NotFound)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn pharmacy_upsert_and_deactivation(pool: sqlx::PgPool) {
    let (new, updated) = upsert_pharmacies(&pool, &[pharmacy("A", 0.001), pharmacy("B", 0.002)])
        .await
        .expect("first upsert failed");
    assert_eq!((new, updated), (2, 0));

    let (new, updated) = upsert_pharmacies(&pool, &[pharmacy("A", 0.001)])
        .await
        .expect("second upsert failed");
    assert_eq!((new, updated), (0, 1));

    let deactivated = deactivate_missing_pharmacies(&pool, &["A".to_string()])
        .await
        .expect("deactivate failed");
    assert_eq!(deactivated, 1);

    let rows = list_pharmacies_in_bounds(&pool, BoundingBox::around(seoul(), 5.0))
        .await
        .expect("list failed");
    let hpids: Vec<&str> = rows.iter().map(|r| r.hpid.as_str()).collect();
    assert_eq!(hpids, vec!["A"]);

    // Seen again: reactivated.
    upsert_pharmacies(&pool, &[pharmacy("B", 0.002)])
        .await
        .expect("reactivation upsert failed");
    let rows = list_pharmacies_in_bounds(&pool, BoundingBox::around(seoul(), 5.0))
        .await
        .expect("list failed");
    assert_eq!(rows.len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn hospital_upsert_round_trips_hours(pool: sqlx::PgPool) {
    let mut schedule = WeeklySchedule::default();
    schedule.mon = Some(TimeWindow::new("09:00", "18:00"));
    schedule.sat = Some(TimeWindow::new("09:00", "13:00"));
    let hospital = NewHospital {
        ykiho: "YK-1".to_string(),
        name: "튼튼의원".to_string(),
        address: None,
        phone: None,
        department: Some("소아청소년과(1명)".to_string()),
        hospital_type: "소아청소년과".to_string(),
        latitude: Some(seoul().latitude),
        longitude: Some(seoul().longitude),
        schedule,
        reception: ReceptionHours::default(),
        lunch: LunchBreak {
            weekday: Some(TimeWindow::new("13:00", "14:00")),
            saturday: None,
        },
        holiday: HolidayPolicy {
            sunday_closed: true,
            ..HolidayPolicy::default()
        },
    };

    let (new, _) = upsert_hospitals(&pool, std::slice::from_ref(&hospital))
        .await
        .expect("upsert failed");
    assert_eq!(new, 1);

    let rows = list_hospitals_in_bounds(&pool, BoundingBox::around(seoul(), 1.0))
        .await
        .expect("list failed");
    assert_eq!(rows.len(), 1);
    let facility = rows[0].to_facility();
    assert_eq!(facility.hours.schedule, hospital.schedule);
    assert!(facility.hours.holiday.sunday_closed);
    assert_eq!(facility.hours.lunch, Some(hospital.lunch));
}
