use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

use crate::models::{Booking, BookingStatus, ServiceType};
use crate::services::listing::{BookingFilter, PageRequest, SortOrder};

const BOOKING_COLUMNS: &str = "id, customer_name, car_make, car_model, car_year, car_type, \
     service_type, date, time_slot, duration, price, status, rating, addons, created_at, updated_at";

// Fixed width so that text order matches chronological order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

// ── Writes ──

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    let addons = serde_json::to_string(&booking.addons)?;

    conn.execute(
        "INSERT INTO bookings (id, customer_name, car_make, car_model, car_year, car_type, service_type, date, time_slot, duration, price, status, rating, addons, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            booking.id,
            booking.customer_name,
            booking.car_make,
            booking.car_model,
            booking.car_year,
            booking.car_type,
            booking.service_type.as_str(),
            booking.date.format(DATE_FORMAT).to_string(),
            booking.time_slot,
            booking.duration,
            booking.price,
            booking.status.as_str(),
            booking.rating,
            addons,
            format_timestamp(&booking.created_at),
            format_timestamp(&booking.updated_at),
        ],
    )
    .context("failed to insert booking")?;
    Ok(())
}

/// Overwrite every mutable column of an existing row. `id` and `created_at`
/// are never touched. Returns `false` when no row has that id.
pub fn update_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let addons = serde_json::to_string(&booking.addons)?;

    let count = conn
        .execute(
            "UPDATE bookings SET
               customer_name = ?2, car_make = ?3, car_model = ?4, car_year = ?5, car_type = ?6,
               service_type = ?7, date = ?8, time_slot = ?9, duration = ?10, price = ?11,
               status = ?12, rating = ?13, addons = ?14, updated_at = ?15
             WHERE id = ?1",
            params![
                booking.id,
                booking.customer_name,
                booking.car_make,
                booking.car_model,
                booking.car_year,
                booking.car_type,
                booking.service_type.as_str(),
                booking.date.format(DATE_FORMAT).to_string(),
                booking.time_slot,
                booking.duration,
                booking.price,
                booking.status.as_str(),
                booking.rating,
                addons,
                format_timestamp(&booking.updated_at),
            ],
        )
        .context("failed to update booking")?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Reads ──

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn count_bookings(conn: &Connection, filter: &BookingFilter) -> anyhow::Result<u64> {
    let (where_sql, params) = filter_clause(filter);
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM bookings{where_sql}"),
        params_from_iter(params.iter()),
        |row| row.get(0),
    )?;
    Ok(u64::try_from(count).unwrap_or(0))
}

pub fn find_bookings(
    conn: &Connection,
    filter: &BookingFilter,
    sort: SortOrder,
    page: &PageRequest,
) -> anyhow::Result<Vec<Booking>> {
    let (where_sql, mut params) = filter_clause(filter);
    params.push(Value::Integer(i64::try_from(page.limit).unwrap_or(i64::MAX)));
    params.push(Value::Integer(i64::try_from(page.skip()).unwrap_or(i64::MAX)));

    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings{where_sql} ORDER BY {} LIMIT ? OFFSET ?",
        order_clause(sort)
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Render a filter as a ` WHERE ...` fragment (empty when the filter has no
/// active constraints) plus its positional parameters.
pub fn filter_clause(filter: &BookingFilter) -> (String, Vec<Value>) {
    let mut where_parts: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(service_type) = &filter.service_type {
        where_parts.push("service_type = ?".to_string());
        params.push(Value::Text(service_type.clone()));
    }
    if let Some(car_type) = &filter.car_type {
        where_parts.push("car_type = ?".to_string());
        params.push(Value::Text(car_type.clone()));
    }
    if let Some(status) = &filter.status {
        where_parts.push("status = ?".to_string());
        params.push(Value::Text(status.clone()));
    }
    if let Some(range) = &filter.date_range {
        where_parts.push("date >= ? AND date <= ?".to_string());
        params.push(Value::Text(range.start.format(DATE_FORMAT).to_string()));
        params.push(Value::Text(range.end.format(DATE_FORMAT).to_string()));
    }
    if let Some(search) = &filter.search {
        where_parts.push(
            "(ci_contains(customer_name, ?) OR ci_contains(car_make, ?) OR ci_contains(car_model, ?))"
                .to_string(),
        );
        for _ in 0..3 {
            params.push(Value::Text(search.clone()));
        }
    }

    if where_parts.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", where_parts.join(" AND ")), params)
    }
}

pub fn order_clause(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::PriceAsc => "price ASC, rowid ASC",
        SortOrder::DurationAsc => "duration ASC, rowid ASC",
        SortOrder::StatusAsc => "status ASC, rowid ASC",
        SortOrder::CreatedAtDesc => "created_at DESC, rowid DESC",
    }
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let service_type_str: String = row.get(6)?;
    let date_str: String = row.get(7)?;
    let status_str: String = row.get(11)?;
    let addons_json: String = row.get(13)?;
    let created_at_str: String = row.get(14)?;
    let updated_at_str: String = row.get(15)?;

    let service_type = ServiceType::parse(&service_type_str)
        .with_context(|| format!("unknown service type in store: {service_type_str}"))?;
    let status = BookingStatus::parse(&status_str)
        .with_context(|| format!("unknown status in store: {status_str}"))?;
    let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
        .with_context(|| format!("bad booking date in store: {date_str}"))?;
    let addons: Vec<String> = serde_json::from_str(&addons_json)
        .with_context(|| format!("bad addons in store: {addons_json}"))?;

    Ok(Booking {
        id: row.get(0)?,
        customer_name: row.get(1)?,
        car_make: row.get(2)?,
        car_model: row.get(3)?,
        car_year: row.get(4)?,
        car_type: row.get(5)?,
        service_type,
        date,
        time_slot: row.get(8)?,
        duration: row.get(9)?,
        price: row.get(10)?,
        status,
        rating: row.get(12)?,
        addons,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

fn parse_timestamp(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .with_context(|| format!("bad timestamp in store: {s}"))?;
    Ok(naive.and_utc())
}
