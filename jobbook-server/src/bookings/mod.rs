//! Booking collection: date-grouped, order-sensitive job bookings

pub mod edit;
pub mod error;
pub mod manager;
pub mod request;

pub use edit::{GroupEdit, IndexOutOfRange};
pub use error::BookingError;
pub use manager::BookingManager;
pub use request::{BookingMap, BookingRequest, BookingResponse};
