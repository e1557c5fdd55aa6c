//! Booking operation errors

use crate::db::DbError;
use crate::models::ValidationError;

/// Errors returned by `BookingManager` operations
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Index outside `[0, len)` for the resolved group; nothing was written
    #[error("index {index} is out of range for a group of {len} bookings")]
    InvalidIndex { index: i64, len: usize },

    #[error("booking '{id}' not found")]
    NotFound { id: String },

    #[error("booking '{id}' already exists")]
    Conflict { id: String },

    #[error("operation '{method}' is not supported")]
    MethodNotSupported { method: String },

    #[error("store unavailable: {0}")]
    Store(#[source] sqlx::Error),
}

impl From<DbError> for BookingError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Sqlx(e) => Self::Store(e),
            DbError::Conflict { id } => Self::Conflict { id },
            DbError::Edit(out_of_range) => Self::InvalidIndex {
                index: out_of_range.index,
                len: out_of_range.len,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookings::edit::IndexOutOfRange;

    #[test]
    fn rejected_edit_becomes_invalid_index() {
        let err = BookingError::from(DbError::Edit(IndexOutOfRange { index: -1, len: 2 }));
        assert!(matches!(err, BookingError::InvalidIndex { index: -1, len: 2 }));
    }

    #[test]
    fn conflict_keeps_id() {
        let err = BookingError::from(DbError::Conflict { id: "b-1".into() });
        assert_eq!(err.to_string(), "booking 'b-1' already exists");
    }
}
