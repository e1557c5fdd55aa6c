//! Booking rows as persisted by a row store

use chrono::{DateTime, Utc};

use super::{DateKey, Job, ValidationError};

/// Maximum length for booking ids
const MAX_BOOKING_ID_LEN: usize = 128;

/// Validate a caller-supplied booking id.
pub fn validate_id(id: &str) -> Result<&str, ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::Empty { field: "id" });
    }
    if id.chars().count() > MAX_BOOKING_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "id",
            max: MAX_BOOKING_ID_LEN,
        });
    }
    Ok(id)
}

/// One persisted booking
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRow {
    pub id: String,
    pub date_key: String,
    pub job: Job,
    pub created_at: DateTime<Utc>,
}

/// Row to insert; `id: None` lets the store generate one.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub id: Option<String>,
    pub date_key: DateKey,
    pub job: Job,
}
