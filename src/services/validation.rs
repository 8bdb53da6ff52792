use chrono::{DateTime, NaiveDate};

use crate::models::{Booking, BookingPayload, BookingStatus, ServiceType};

pub const DEFAULT_DURATION: i32 = 30;
pub const DEFAULT_PRICE: f64 = 25.0;

/// The mutable fields of a booking before validation.
///
/// Create starts from [`BookingDraft::default`] (schema defaults applied),
/// update starts from the stored record; both then go through
/// [`BookingDraft::apply`] and [`validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub customer_name: Option<String>,
    pub car_make: Option<String>,
    pub car_model: Option<String>,
    pub car_year: Option<i32>,
    pub car_type: Option<String>,
    pub service_type: Option<String>,
    pub date: Option<String>,
    pub time_slot: Option<String>,
    pub duration: Option<i32>,
    pub price: Option<f64>,
    pub status: Option<String>,
    pub rating: Option<f64>,
    pub addons: Option<Vec<String>>,
}

impl Default for BookingDraft {
    fn default() -> Self {
        Self {
            customer_name: None,
            car_make: None,
            car_model: None,
            car_year: None,
            car_type: None,
            service_type: None,
            date: None,
            time_slot: None,
            duration: Some(DEFAULT_DURATION),
            price: Some(DEFAULT_PRICE),
            status: Some(BookingStatus::default().as_str().to_string()),
            rating: None,
            addons: Some(Vec::new()),
        }
    }
}

impl From<&Booking> for BookingDraft {
    fn from(b: &Booking) -> Self {
        Self {
            customer_name: Some(b.customer_name.clone()),
            car_make: b.car_make.clone(),
            car_model: b.car_model.clone(),
            car_year: b.car_year,
            car_type: b.car_type.clone(),
            service_type: Some(b.service_type.as_str().to_string()),
            date: Some(b.date.format("%Y-%m-%d").to_string()),
            time_slot: Some(b.time_slot.clone()),
            duration: Some(b.duration),
            price: Some(b.price),
            status: Some(b.status.as_str().to_string()),
            rating: b.rating,
            addons: Some(b.addons.clone()),
        }
    }
}

impl BookingDraft {
    /// Overlay the fields present in `payload`. An explicit `null` clears the
    /// field; an absent key leaves it untouched.
    pub fn apply(mut self, payload: &BookingPayload) -> Self {
        fn overlay<T: Clone>(slot: &mut Option<T>, incoming: &Option<Option<T>>) {
            if let Some(value) = incoming {
                *slot = value.clone();
            }
        }

        overlay(&mut self.customer_name, &payload.customer_name);
        overlay(&mut self.car_make, &payload.car_make);
        overlay(&mut self.car_model, &payload.car_model);
        overlay(&mut self.car_year, &payload.car_year);
        overlay(&mut self.car_type, &payload.car_type);
        overlay(&mut self.service_type, &payload.service_type);
        overlay(&mut self.date, &payload.date);
        overlay(&mut self.time_slot, &payload.time_slot);
        overlay(&mut self.duration, &payload.duration);
        overlay(&mut self.price, &payload.price);
        overlay(&mut self.status, &payload.status);
        overlay(&mut self.rating, &payload.rating);
        overlay(&mut self.addons, &payload.addons);
        self
    }
}

/// Output of [`validate`]: every rule holds and defaults are filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidBooking {
    pub customer_name: String,
    pub car_make: Option<String>,
    pub car_model: Option<String>,
    pub car_year: Option<i32>,
    pub car_type: Option<String>,
    pub service_type: ServiceType,
    pub date: NaiveDate,
    pub time_slot: String,
    pub duration: i32,
    pub price: f64,
    pub status: BookingStatus,
    pub rating: Option<f64>,
    pub addons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Booking validation failed: {}", summarize(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

fn summarize(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.field, i.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    #[cfg(test)]
    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }
}

/// Parse a calendar date given either as `YYYY-MM-DD` or as an RFC 3339
/// timestamp. Only the date component of a timestamp is kept.
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Check a draft against the booking schema. All failing fields are reported
/// at once, in schema order.
pub fn validate(draft: BookingDraft) -> Result<ValidBooking, ValidationError> {
    let mut issues = Vec::new();
    let mut issue = |field: &'static str, reason: String| {
        issues.push(FieldIssue { field, reason });
    };

    let customer_name = trimmed(draft.customer_name);
    if customer_name.is_none() {
        issue("customerName", "is required".to_string());
    }

    let service_type = match draft.service_type.as_deref() {
        None | Some("") => {
            issue("serviceType", "is required".to_string());
            None
        }
        Some(raw) => {
            let parsed = ServiceType::parse(raw);
            if parsed.is_none() {
                let allowed: Vec<&str> = ServiceType::ALL.iter().map(|t| t.as_str()).collect();
                issue(
                    "serviceType",
                    format!("`{raw}` is not one of {}", allowed.join(", ")),
                );
            }
            parsed
        }
    };

    let date = match draft.date.as_deref().map(str::trim) {
        None | Some("") => {
            issue("date", "is required".to_string());
            None
        }
        Some(raw) => {
            let parsed = parse_calendar_date(raw);
            if parsed.is_none() {
                issue("date", format!("`{raw}` is not a valid date"));
            }
            parsed
        }
    };

    let time_slot = trimmed(draft.time_slot);
    if time_slot.is_none() {
        issue("timeSlot", "is required".to_string());
    }

    // An explicit null on status or the numeric defaults falls back to the
    // schema default rather than failing.
    let status = match draft.status.as_deref() {
        None => Some(BookingStatus::default()),
        Some(raw) => {
            let parsed = BookingStatus::parse(raw);
            if parsed.is_none() {
                let allowed: Vec<&str> = BookingStatus::ALL.iter().map(|s| s.as_str()).collect();
                issue("status", format!("`{raw}` is not one of {}", allowed.join(", ")));
            }
            parsed
        }
    };

    let price = draft.price.unwrap_or(DEFAULT_PRICE);
    if !price.is_finite() {
        issue("price", "must be a finite number".to_string());
    }
    if draft.rating.is_some_and(|r| !r.is_finite()) {
        issue("rating", "must be a finite number".to_string());
    }

    match (customer_name, service_type, date, time_slot, status) {
        (Some(customer_name), Some(service_type), Some(date), Some(time_slot), Some(status))
            if issues.is_empty() =>
        {
            Ok(ValidBooking {
                customer_name,
                car_make: trimmed(draft.car_make),
                car_model: trimmed(draft.car_model),
                car_year: draft.car_year,
                car_type: draft.car_type.filter(|t| !t.is_empty()),
                service_type,
                date,
                time_slot,
                duration: draft.duration.unwrap_or(DEFAULT_DURATION),
                price,
                status,
                rating: draft.rating,
                addons: draft.addons.unwrap_or_default(),
            })
        }
        _ => Err(ValidationError { issues }),
    }
}
