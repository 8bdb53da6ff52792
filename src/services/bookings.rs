use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingPayload};
use crate::services::validation::{validate, BookingDraft, ValidBooking};

// The store keeps millisecond precision; trimming here keeps the value we
// hand back identical to what a later read returns.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn assemble(
    id: String,
    valid: ValidBooking,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Booking {
    Booking {
        id,
        customer_name: valid.customer_name,
        car_make: valid.car_make,
        car_model: valid.car_model,
        car_year: valid.car_year,
        car_type: valid.car_type,
        service_type: valid.service_type,
        date: valid.date,
        time_slot: valid.time_slot,
        duration: valid.duration,
        price: valid.price,
        status: valid.status,
        rating: valid.rating,
        addons: valid.addons,
        created_at,
        updated_at,
    }
}

pub fn create_booking(conn: &Connection, payload: &BookingPayload) -> Result<Booking, AppError> {
    let valid = validate(BookingDraft::default().apply(payload))?;

    let ts = now();
    let booking = assemble(Uuid::new_v4().to_string(), valid, ts, ts);
    queries::insert_booking(conn, &booking)?;

    tracing::info!(
        booking_id = %booking.id,
        service = booking.service_type.as_str(),
        "booking created"
    );
    Ok(booking)
}

pub fn get_booking(conn: &Connection, id: &str) -> Result<Booking, AppError> {
    queries::get_booking_by_id(conn, id)?.ok_or(AppError::NotFound)
}

/// Merge `payload` over the stored record and write it back. The caller
/// holds the connection for the whole read-merge-write.
pub fn update_booking(
    conn: &Connection,
    id: &str,
    payload: &BookingPayload,
) -> Result<Booking, AppError> {
    let existing = get_booking(conn, id)?;
    let valid = validate(BookingDraft::from(&existing).apply(payload))?;

    let booking = assemble(existing.id, valid, existing.created_at, now());
    if !queries::update_booking(conn, &booking)? {
        return Err(AppError::NotFound);
    }

    if booking.status != existing.status {
        tracing::info!(
            booking_id = %booking.id,
            from = existing.status.as_str(),
            to = booking.status.as_str(),
            "booking status changed"
        );
    }
    Ok(booking)
}

pub fn delete_booking(conn: &Connection, id: &str) -> Result<(), AppError> {
    if !queries::delete_booking(conn, id)? {
        return Err(AppError::NotFound);
    }
    tracing::info!(booking_id = %id, "booking deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{BookingStatus, ServiceType};

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn payload(json: &str) -> BookingPayload {
        serde_json::from_str(json).unwrap()
    }

    const VALID: &str = r#"{
        "customerName": "Alice",
        "carMake": "Toyota",
        "carModel": "Corolla",
        "serviceType": "Basic Wash",
        "date": "2025-06-15",
        "timeSlot": "09:00 AM - 10:00 AM"
    }"#;

    #[test]
    fn test_create_then_get_returns_same_record() {
        let conn = setup_db();
        let created = create_booking(&conn, &payload(VALID)).unwrap();
        let fetched = get_booking(&conn, &created.id).unwrap();
        assert_eq!(created, fetched);
        assert_eq!(fetched.service_type, ServiceType::BasicWash);
        assert_eq!(fetched.status, BookingStatus::Pending);
    }

    #[test]
    fn test_invalid_create_writes_nothing() {
        let conn = setup_db();
        let err = create_booking(
            &conn,
            &payload(
                r#"{"customerName":"Bob","serviceType":"Oil Change","date":"2025-06-15","timeSlot":"x"}"#,
            ),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let total = queries::count_bookings(&conn, &Default::default()).unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn test_update_preserves_identity_and_created_at() {
        let conn = setup_db();
        let created = create_booking(&conn, &payload(VALID)).unwrap();

        let updated = update_booking(
            &conn,
            &created.id,
            &payload(r#"{"_id":"hijack","status":"Completed","price":40}"#),
        )
        .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.status, BookingStatus::Completed);
        assert_eq!(updated.price, 40.0);
        assert_eq!(updated.customer_name, "Alice");

        assert!(get_booking(&conn, "hijack").is_err());
        assert_eq!(get_booking(&conn, &created.id).unwrap(), updated);
    }

    #[test]
    fn test_completed_back_to_pending_is_allowed() {
        let conn = setup_db();
        let created = create_booking(&conn, &payload(VALID)).unwrap();
        update_booking(&conn, &created.id, &payload(r#"{"status":"Completed"}"#)).unwrap();
        let reverted =
            update_booking(&conn, &created.id, &payload(r#"{"status":"Pending"}"#)).unwrap();
        assert_eq!(reverted.status, BookingStatus::Pending);
    }

    #[test]
    fn test_invalid_update_leaves_record_untouched() {
        let conn = setup_db();
        let created = create_booking(&conn, &payload(VALID)).unwrap();
        let err = update_booking(&conn, &created.id, &payload(r#"{"status":"Lost"}"#))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(get_booking(&conn, &created.id).unwrap(), created);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let conn = setup_db();
        let err = update_booking(&conn, "missing", &payload(VALID)).unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        let conn = setup_db();
        let created = create_booking(&conn, &payload(VALID)).unwrap();
        delete_booking(&conn, &created.id).unwrap();
        assert!(matches!(get_booking(&conn, &created.id), Err(AppError::NotFound)));
        assert!(matches!(delete_booking(&conn, &created.id), Err(AppError::NotFound)));
    }
}
