//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod date_key;
pub mod job;
pub mod booking;

pub use validation::ValidationError;
pub use date_key::DateKey;
pub use job::Job;
pub use booking::{validate_id, BookingRow, NewBooking};
