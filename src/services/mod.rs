pub mod bookings;
pub mod listing;
pub mod validation;
