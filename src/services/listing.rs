use std::num::IntErrorKind;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Booking;
use crate::services::validation::parse_calendar_date;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 9;

/// Raw listing parameters exactly as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingParams {
    pub service_type: Option<String>,
    pub car_type: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
}

/// Conjunction of the constraints a listing applies. `None` means the
/// constraint is inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub service_type: Option<String>,
    pub car_type: Option<String>,
    pub status: Option<String>,
    pub date_range: Option<DateRange>,
    pub search: Option<String>,
}

/// Inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    PriceAsc,
    DurationAsc,
    StatusAsc,
    #[default]
    CreatedAtDesc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingQuery {
    pub filter: BookingFilter,
    pub sort: SortOrder,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPage {
    pub bookings: Vec<Booking>,
    pub current_page: u64,
    pub total_pages: u64,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

impl BookingFilter {
    pub fn from_params(params: &ListingParams) -> Result<Self, AppError> {
        let date_range = match (non_empty(&params.start_date), non_empty(&params.end_date)) {
            (Some(start), Some(end)) => Some(DateRange {
                start: parse_bound("startDate", &start)?,
                end: parse_bound("endDate", &end)?,
            }),
            // A lone bound is ignored rather than rejected.
            _ => None,
        };

        Ok(Self {
            service_type: non_empty(&params.service_type),
            car_type: non_empty(&params.car_type),
            status: non_empty(&params.status),
            date_range,
            search: non_empty(&params.search),
        })
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn parse_bound(name: &str, raw: &str) -> Result<NaiveDate, AppError> {
    parse_calendar_date(raw)
        .ok_or_else(|| AppError::InvalidInput(format!("{name} `{raw}` is not a valid date")))
}

impl SortOrder {
    pub fn parse(key: Option<&str>) -> Self {
        match key {
            Some("price") => SortOrder::PriceAsc,
            Some("duration") => SortOrder::DurationAsc,
            Some("status") => SortOrder::StatusAsc,
            _ => SortOrder::CreatedAtDesc,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: parse_positive(page).unwrap_or(DEFAULT_PAGE),
            limit: parse_positive(limit).unwrap_or(DEFAULT_LIMIT),
        }
    }

    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

// Numbers too large for u64 saturate instead of falling back to the default.
fn parse_positive(raw: Option<&str>) -> Option<u64> {
    let parsed = match raw?.trim().parse::<u64>() {
        Ok(v) => v,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => u64::MAX,
        Err(_) => return None,
    };
    Some(parsed).filter(|v| *v > 0)
}

impl BookingQuery {
    pub fn from_params(params: &ListingParams) -> Result<Self, AppError> {
        Ok(Self {
            filter: BookingFilter::from_params(params)?,
            sort: SortOrder::parse(params.sort.as_deref()),
            page: PageRequest::from_params(params.page.as_deref(), params.limit.as_deref()),
        })
    }
}

/// Count the matching bookings, then fetch the requested page.
///
/// The two reads take the connection lock separately, so a write landing in
/// between can leave `total_pages` one off from the page that comes back.
pub fn list_bookings(
    db: &std::sync::Mutex<Connection>,
    query: &BookingQuery,
) -> Result<BookingPage, AppError> {
    let total = {
        let conn = db.lock()?;
        queries::count_bookings(&conn, &query.filter)?
    };

    let bookings = {
        let conn = db.lock()?;
        queries::find_bookings(&conn, &query.filter, query.sort, &query.page)?
    };

    tracing::debug!(
        total,
        returned = bookings.len(),
        page = query.page.page,
        "listed bookings"
    );

    Ok(BookingPage {
        bookings,
        current_page: query.page.page,
        total_pages: query.page.total_pages(total),
    })
}
