pub mod booking;

pub use booking::{Booking, BookingPayload, BookingStatus, ServiceType};
