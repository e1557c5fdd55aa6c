//! Row store contract
//!
//! The booking manager only ever talks to a `RowStore`. Implementations:
//! - `PgRowStore`: PostgreSQL via sqlx (production)
//! - `MemoryRowStore`: process-local, used by tests and `serve --memory`

use async_trait::async_trait;

use crate::bookings::edit::{GroupEdit, IndexOutOfRange};
use crate::models::{BookingRow, DateKey, Job, NewBooking};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("booking '{id}' already exists")]
    Conflict { id: String },

    /// A positional edit was rejected after reading the group; nothing was written.
    #[error(transparent)]
    Edit(#[from] IndexOutOfRange),
}

/// Durable storage for booking rows.
///
/// Ordering contract: every `select_*` returns rows ordered by `date_key`,
/// then by insertion order within a date key.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Create the table and indexes if they do not exist (idempotent).
    async fn ensure_schema(&self) -> Result<(), DbError>;

    /// Insert one row. A duplicate id is reported as `DbError::Conflict`.
    async fn insert(&self, row: NewBooking) -> Result<BookingRow, DbError>;

    async fn select_by_date_key(&self, date_key: &DateKey) -> Result<Vec<BookingRow>, DbError>;

    async fn select_all(&self) -> Result<Vec<BookingRow>, DbError>;

    /// Replace the job of one row, optionally also filtered by date key.
    /// Returns the affected row count.
    async fn update_by_id(
        &self,
        id: &str,
        date_key: Option<&DateKey>,
        job: &Job,
    ) -> Result<u64, DbError>;

    /// Returns the affected row count.
    async fn delete_by_id(&self, id: &str) -> Result<u64, DbError>;

    /// Positional rewrite: read the group, apply `edit`, replace the group
    /// with the edited sequence. Runs as one isolated transaction per date
    /// key; on any error the group is unchanged. Ids and creation times of
    /// surviving rows are preserved. Returns the rewritten group.
    async fn rewrite_group(
        &self,
        date_key: &DateKey,
        edit: GroupEdit,
    ) -> Result<Vec<BookingRow>, DbError>;
}
