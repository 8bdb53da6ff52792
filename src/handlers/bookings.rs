use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::errors::AppError;
use crate::models::{Booking, BookingPayload};
use crate::services::bookings;
use crate::services::listing::{self, BookingPage, BookingQuery, ListingParams};
use crate::state::AppState;

fn body(payload: Result<Json<BookingPayload>, JsonRejection>) -> Result<BookingPayload, AppError> {
    payload
        .map(|Json(p)| p)
        .map_err(|e| AppError::InvalidInput(e.body_text()))
}

// GET /api/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListingParams>, QueryRejection>,
) -> Result<Json<BookingPage>, AppError> {
    let Query(params) = query.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let query = BookingQuery::from_params(&params)?;

    let page = listing::list_bookings(&state.db, &query)?;
    Ok(Json(page))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let db = state.db.lock()?;
    Ok(Json(bookings::get_booking(&db, &id)?))
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BookingPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let payload = body(payload)?;

    let db = state.db.lock()?;
    let booking = bookings::create_booking(&db, &payload)?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// PUT /api/bookings/:id
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<BookingPayload>, JsonRejection>,
) -> Result<Json<Booking>, AppError> {
    let payload = body(payload)?;

    let db = state.db.lock()?;
    Ok(Json(bookings::update_booking(&db, &id, &payload)?))
}

// DELETE /api/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock()?;
    bookings::delete_booking(&db, &id)?;
    Ok(Json(serde_json::json!({"message": "Booking deleted successfully"})))
}
