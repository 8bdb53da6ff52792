use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: String,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ServiceType {
    #[serde(rename = "Basic Wash")]
    BasicWash,
    #[serde(rename = "Deluxe Wash")]
    DeluxeWash,
    #[serde(rename = "Full Detailing")]
    FullDetailing,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [
        ServiceType::BasicWash,
        ServiceType::DeluxeWash,
        ServiceType::FullDetailing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::BasicWash => "Basic Wash",
            ServiceType::DeluxeWash => "Deluxe Wash",
            ServiceType::FullDetailing => "Full Detailing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }
}

/// Write payload for create and update.
///
/// Every field is tri-state: absent (`None`), explicitly `null`
/// (`Some(None)`), or set (`Some(Some(_))`). Enum fields and the date stay as
/// raw text here so the validator can report bad values with a readable
/// message instead of a serde error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    #[serde(default, deserialize_with = "nullable")]
    pub customer_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub car_make: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub car_model: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub car_year: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub car_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub service_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub time_slot: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub duration: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub price: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub status: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub rating: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub addons: Option<Option<Vec<String>>>,
}

// Only called when the key is present, so a missing key stays `None`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
