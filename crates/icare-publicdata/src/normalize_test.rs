use chrono::Weekday;

use super::*;

fn text(s: &str) -> Option<String> {
    Some(s.to_owned())
}

fn dept(name: &str, doctors: &str) -> DepartmentItem {
    DepartmentItem {
        code: None,
        name: text(name),
        doctor_count: text(doctors),
    }
}

#[test]
fn time_range_with_hour_and_minute_markers() {
    assert_eq!(
        parse_time_range("09시30분 ~ 18시"),
        Some(TimeWindow::new("09:30", "18:00"))
    );
    assert_eq!(
        parse_time_range("평일 13시~14시"),
        Some(TimeWindow::new("13:00", "14:00"))
    );
}

#[test]
fn time_range_with_colons_and_compact_digits() {
    assert_eq!(
        parse_time_range("12:30~13:30"),
        Some(TimeWindow::new("12:30", "13:30"))
    );
    assert_eq!(
        parse_time_range("1230~1330"),
        Some(TimeWindow::new("12:30", "13:30"))
    );
}

#[test]
fn time_range_ignores_no_info_and_garbage() {
    assert_eq!(parse_time_range("정보없음"), None);
    assert_eq!(parse_time_range("없음"), None);
    assert_eq!(parse_time_range(""), None);
}

#[test]
fn treatment_hours_need_four_digits_each() {
    let detail = HospitalDetailItem {
        trmt_mon_start: text("0900"),
        trmt_mon_end: text("1800"),
        trmt_tue_start: text("900"),
        trmt_tue_end: text("1800"),
        trmt_sat_start: text("0900"),
        trmt_sat_end: text("1300"),
        ..HospitalDetailItem::default()
    };
    let schedule = parse_treatment_hours(&detail);
    assert_eq!(
        schedule.window_for(Weekday::Mon),
        Some(&TimeWindow::new("09:00", "18:00"))
    );
    assert!(schedule.window_for(Weekday::Tue).is_none());
    assert_eq!(
        schedule.window_for(Weekday::Sat),
        Some(&TimeWindow::new("09:00", "13:00"))
    );
    assert!(schedule.window_for(Weekday::Sun).is_none());
}

#[test]
fn holiday_text_sunday_and_full_closure() {
    let policy = parse_holiday_text(Some("일요일 휴진"), Some("공휴일 전부휴진"));
    assert!(policy.sunday_closed);
    assert!(policy.fully_closed_on_holidays);
    assert!(policy.partially_closed_from.is_none());
}

#[test]
fn holiday_text_partial_closure_and_tags() {
    let policy = parse_holiday_text(None, Some("공휴일 13시 이후 휴진, 명절 및 신년 휴무"));
    assert!(!policy.sunday_closed);
    assert!(!policy.fully_closed_on_holidays);
    assert_eq!(policy.partially_closed_from.as_deref(), Some("13:00"));
    assert!(policy.special_holiday_tags.contains("명절"));
    assert!(policy.special_holiday_tags.contains("신정"));
    assert!(!policy.special_holiday_tags.contains("크리스마스"));
}

#[test]
fn holiday_text_partial_closure_from_hour() {
    let policy = parse_holiday_text(Some("정상진료"), Some("9시부터 휴무"));
    assert!(!policy.sunday_closed);
    assert_eq!(policy.partially_closed_from.as_deref(), Some("09:00"));
}

#[test]
fn hospital_type_follows_most_doctors() {
    let departments = vec![dept("내과", "1"), dept("소아청소년과", "3"), dept("피부과", "3")];
    assert_eq!(classify_hospital_type(&departments), "소아청소년과");
    assert_eq!(classify_hospital_type(&[]), GENERAL_CLINIC);
    assert_eq!(
        classify_hospital_type(&[dept("비뇨의학과", "2")]),
        GENERAL_CLINIC
    );
}

#[test]
fn department_summary_lists_doctor_counts() {
    let departments = vec![dept("소아청소년과", "2"), dept("내과", "x")];
    assert_eq!(
        department_summary(&departments).as_deref(),
        Some("소아청소년과(2명), 내과(0명)")
    );
    assert_eq!(department_summary(&[]), None);
}

#[test]
fn pharmacy_without_hpid_is_skipped() {
    let item = PharmacyItem {
        duty_name: text("이름만약국"),
        ..PharmacyItem::default()
    };
    assert!(normalize_pharmacy(&item).is_none());
}

#[test]
fn pharmacy_item_is_normalized() {
    let item = PharmacyItem {
        hpid: text("C1100001"),
        duty_name: text("온누리약국"),
        duty_tel1: text("02-555-0000"),
        duty_fax: text(" "),
        wgs84_lat: text("37.5665"),
        wgs84_lon: text("0"),
        duty_time1s: text("0900"),
        duty_time1c: text("1900"),
        ..PharmacyItem::default()
    };
    let pharmacy = normalize_pharmacy(&item).unwrap();
    assert_eq!(pharmacy.hpid, "C1100001");
    assert!(pharmacy.fax.is_none());
    assert_eq!(pharmacy.latitude, Some(37.5665));
    assert!(pharmacy.longitude.is_none());
    assert_eq!(pharmacy.hours[0], (text("0900"), text("1900")));
    assert_eq!(pharmacy.hours[6], (None, None));
}

#[test]
fn full_download_drops_missing_and_repeated_hpids() {
    let item = |hpid: Option<&str>, name: &str| PharmacyItem {
        hpid: hpid.map(str::to_string),
        duty_name: text(name),
        ..PharmacyItem::default()
    };
    let items = vec![
        item(Some("C1"), "첫번째"),
        item(None, "번호없음"),
        item(Some("C2"), "두번째"),
        item(Some("C1"), "중복"),
    ];
    let pharmacies = normalize_pharmacies(&items);
    let names: Vec<&str> = pharmacies.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["첫번째", "두번째"]);
}

#[test]
fn hospital_combines_basis_detail_and_departments() {
    let basis = HospitalBasisItem {
        ykiho: text("Y1"),
        yadm_nm: text("튼튼소아청소년과의원"),
        addr: text("서울특별시 중구"),
        telno: None,
        y_pos: text("37.5665"),
        x_pos: text("126.978"),
    };
    let detail = HospitalDetailItem {
        trmt_mon_start: text("0900"),
        trmt_mon_end: text("1800"),
        lunch_week: text("13시~14시"),
        rcv_sat: text("09시~12시30분"),
        no_trmt_sun: text("휴진"),
        ..HospitalDetailItem::default()
    };
    let hospital = normalize_hospital(&basis, Some(&detail), &[dept("소아청소년과", "2")]).unwrap();

    assert_eq!(hospital.hospital_type, "소아청소년과");
    assert_eq!(hospital.department.as_deref(), Some("소아청소년과(2명)"));
    assert_eq!(hospital.longitude, Some(126.978));
    assert_eq!(hospital.lunch.weekday, Some(TimeWindow::new("13:00", "14:00")));
    assert_eq!(
        hospital.reception.saturday,
        Some(TimeWindow::new("09:00", "12:30"))
    );
    assert!(hospital.holiday.sunday_closed);
}

#[test]
fn hospital_without_detail_has_empty_hours() {
    let basis = HospitalBasisItem {
        ykiho: text("Y2"),
        ..HospitalBasisItem::default()
    };
    let hospital = normalize_hospital(&basis, None, &[]).unwrap();
    assert_eq!(hospital.name, NO_INFO);
    assert_eq!(hospital.hospital_type, GENERAL_CLINIC);
    assert!(!hospital.schedule.has_any_window());
}
