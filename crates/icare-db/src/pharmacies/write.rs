use sqlx::PgPool;

use icare_core::NewPharmacy;

/// Insert new pharmacies and refresh existing ones, reactivating any that had
/// been marked inactive.
///
/// Returns `(new_count, updated_count)`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn upsert_pharmacies(
    pool: &PgPool,
    pharmacies: &[NewPharmacy],
) -> Result<(u64, u64), sqlx::Error> {
    if pharmacies.is_empty() {
        return Ok((0, 0));
    }

    let n = pharmacies.len();
    let mut hpids: Vec<String> = Vec::with_capacity(n);
    let mut names: Vec<String> = Vec::with_capacity(n);
    let mut addresses: Vec<Option<String>> = Vec::with_capacity(n);
    let mut tels: Vec<Option<String>> = Vec::with_capacity(n);
    let mut faxes: Vec<Option<String>> = Vec::with_capacity(n);
    let mut latitudes: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut longitudes: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut map_infos: Vec<Option<String>> = Vec::with_capacity(n);
    let mut etcs: Vec<Option<String>> = Vec::with_capacity(n);
    // starts[d] / ends[d] hold day d's column, Monday first.
    let mut starts: [Vec<Option<String>>; 7] = Default::default();
    let mut ends: [Vec<Option<String>>; 7] = Default::default();

    for p in pharmacies {
        hpids.push(p.hpid.clone());
        names.push(p.name.clone());
        addresses.push(p.address.clone());
        tels.push(p.tel.clone());
        faxes.push(p.fax.clone());
        latitudes.push(p.latitude);
        longitudes.push(p.longitude);
        map_infos.push(p.map_info.clone());
        etcs.push(p.etc.clone());
        for (day, (start, end)) in p.hours.iter().enumerate() {
            starts[day].push(start.clone());
            ends[day].push(end.clone());
        }
    }

    let mut query = sqlx::query_scalar::<_, bool>(
        "INSERT INTO pharmacies \
             (hpid, name, address, tel, fax, latitude, longitude, map_info, etc, \
              mon_start, mon_end, tue_start, tue_end, wed_start, wed_end, \
              thu_start, thu_end, fri_start, fri_end, sat_start, sat_end, \
              sun_start, sun_end) \
         SELECT * FROM UNNEST(\
              $1::text[], $2::text[], $3::text[], $4::text[], $5::text[], \
              $6::float8[], $7::float8[], $8::text[], $9::text[], \
              $10::text[], $11::text[], $12::text[], $13::text[], $14::text[], $15::text[], \
              $16::text[], $17::text[], $18::text[], $19::text[], $20::text[], $21::text[], \
              $22::text[], $23::text[]) \
         ON CONFLICT (hpid) DO UPDATE SET \
             name         = EXCLUDED.name, \
             address      = EXCLUDED.address, \
             tel          = EXCLUDED.tel, \
             fax          = EXCLUDED.fax, \
             latitude     = EXCLUDED.latitude, \
             longitude    = EXCLUDED.longitude, \
             map_info     = EXCLUDED.map_info, \
             etc          = EXCLUDED.etc, \
             mon_start    = EXCLUDED.mon_start, \
             mon_end      = EXCLUDED.mon_end, \
             tue_start    = EXCLUDED.tue_start, \
             tue_end      = EXCLUDED.tue_end, \
             wed_start    = EXCLUDED.wed_start, \
             wed_end      = EXCLUDED.wed_end, \
             thu_start    = EXCLUDED.thu_start, \
             thu_end      = EXCLUDED.thu_end, \
             fri_start    = EXCLUDED.fri_start, \
             fri_end      = EXCLUDED.fri_end, \
             sat_start    = EXCLUDED.sat_start, \
             sat_end      = EXCLUDED.sat_end, \
             sun_start    = EXCLUDED.sun_start, \
             sun_end      = EXCLUDED.sun_end, \
             is_active    = TRUE, \
             last_seen_at = NOW(), \
             updated_at   = NOW() \
         RETURNING (xmax = 0) AS is_new",
    )
    .bind(&hpids)
    .bind(&names)
    .bind(&addresses)
    .bind(&tels)
    .bind(&faxes)
    .bind(&latitudes)
    .bind(&longitudes)
    .bind(&map_infos)
    .bind(&etcs);

    for (day_starts, day_ends) in starts.iter().zip(&ends) {
        query = query.bind(day_starts).bind(day_ends);
    }

    let rows: Vec<bool> = query.fetch_all(pool).await?;

    let new_count = rows.iter().filter(|&&is_new| is_new).count() as u64;
    let updated_count = rows.len() as u64 - new_count;

    Ok((new_count, updated_count))
}

/// Mark active pharmacies whose `hpid` is not in `seen_hpids` as inactive.
///
/// An empty `seen_hpids` deactivates every pharmacy; callers skip this step
/// when a refresh fetched nothing.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn deactivate_missing_pharmacies(
    pool: &PgPool,
    seen_hpids: &[String],
) -> Result<u64, sqlx::Error> {
    let rows_affected = sqlx::query(
        "UPDATE pharmacies \
         SET is_active = FALSE, updated_at = NOW() \
         WHERE is_active = TRUE \
           AND hpid != ALL($1::text[])",
    )
    .bind(seen_hpids)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(rows_affected)
}
