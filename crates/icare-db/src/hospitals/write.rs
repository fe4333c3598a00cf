use serde_json::Value;
use sqlx::PgPool;

use icare_core::NewHospital;

use super::types::WeekdayHours;

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Insert new hospitals and refresh existing ones in a single round-trip.
///
/// Returns `(new_count, updated_count)`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn upsert_hospitals(
    pool: &PgPool,
    hospitals: &[NewHospital],
) -> Result<(u64, u64), sqlx::Error> {
    if hospitals.is_empty() {
        return Ok((0, 0));
    }

    let n = hospitals.len();
    let mut ykihos: Vec<String> = Vec::with_capacity(n);
    let mut names: Vec<String> = Vec::with_capacity(n);
    let mut addresses: Vec<Option<String>> = Vec::with_capacity(n);
    let mut phones: Vec<Option<String>> = Vec::with_capacity(n);
    let mut departments: Vec<Option<String>> = Vec::with_capacity(n);
    let mut types: Vec<String> = Vec::with_capacity(n);
    let mut latitudes: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut longitudes: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut weekday_hours: Vec<Value> = Vec::with_capacity(n);
    let mut saturday_hours: Vec<Value> = Vec::with_capacity(n);
    let mut sunday_hours: Vec<Value> = Vec::with_capacity(n);
    let mut reception_hours: Vec<Value> = Vec::with_capacity(n);
    let mut lunch_times: Vec<Value> = Vec::with_capacity(n);
    let mut sunday_closed: Vec<bool> = Vec::with_capacity(n);
    let mut holiday_infos: Vec<Value> = Vec::with_capacity(n);

    for h in hospitals {
        ykihos.push(h.ykiho.clone());
        names.push(h.name.clone());
        addresses.push(h.address.clone());
        phones.push(h.phone.clone());
        departments.push(h.department.clone());
        types.push(h.hospital_type.clone());
        latitudes.push(h.latitude);
        longitudes.push(h.longitude);
        weekday_hours.push(to_json(&WeekdayHours::from_schedule(&h.schedule)));
        saturday_hours.push(to_json(&h.schedule.sat));
        sunday_hours.push(to_json(&h.schedule.sun));
        reception_hours.push(to_json(&h.reception));
        lunch_times.push(to_json(&h.lunch));
        sunday_closed.push(h.holiday.sunday_closed);
        holiday_infos.push(to_json(&h.holiday));
    }

    let rows: Vec<bool> = sqlx::query_scalar::<_, bool>(
        "INSERT INTO hospitals \
             (ykiho, name, address, phone, department, hospital_type, latitude, longitude, \
              weekday_hours, saturday_hours, sunday_hours, reception_hours, lunch_time, \
              sunday_closed, holiday_info) \
         SELECT * FROM UNNEST(\
              $1::text[], $2::text[], $3::text[], $4::text[], $5::text[], $6::text[], \
              $7::float8[], $8::float8[], $9::jsonb[], $10::jsonb[], $11::jsonb[], \
              $12::jsonb[], $13::jsonb[], $14::bool[], $15::jsonb[]) \
         ON CONFLICT (ykiho) DO UPDATE SET \
             name            = EXCLUDED.name, \
             address         = EXCLUDED.address, \
             phone           = EXCLUDED.phone, \
             department      = EXCLUDED.department, \
             hospital_type   = EXCLUDED.hospital_type, \
             latitude        = EXCLUDED.latitude, \
             longitude       = EXCLUDED.longitude, \
             weekday_hours   = EXCLUDED.weekday_hours, \
             saturday_hours  = EXCLUDED.saturday_hours, \
             sunday_hours    = EXCLUDED.sunday_hours, \
             reception_hours = EXCLUDED.reception_hours, \
             lunch_time      = EXCLUDED.lunch_time, \
             sunday_closed   = EXCLUDED.sunday_closed, \
             holiday_info    = EXCLUDED.holiday_info, \
             updated_at      = NOW() \
         RETURNING (xmax = 0) AS is_new",
    )
    .bind(&ykihos)
    .bind(&names)
    .bind(&addresses)
    .bind(&phones)
    .bind(&departments)
    .bind(&types)
    .bind(&latitudes)
    .bind(&longitudes)
    .bind(&weekday_hours)
    .bind(&saturday_hours)
    .bind(&sunday_hours)
    .bind(&reception_hours)
    .bind(&lunch_times)
    .bind(&sunday_closed)
    .bind(&holiday_infos)
    .fetch_all(pool)
    .await?;

    let new_count = rows.iter().filter(|&&is_new| is_new).count() as u64;
    let updated_count = rows.len() as u64 - new_count;

    Ok((new_count, updated_count))
}
