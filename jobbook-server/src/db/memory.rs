//! In-memory row store.
//!
//! Holds every row behind one async mutex, so each call is atomic and a group
//! rewrite is trivially isolated. Used by tests and by `serve --memory`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::store::{DbError, RowStore};
use crate::bookings::edit::GroupEdit;
use crate::models::{BookingRow, DateKey, Job, NewBooking};

/// Stored row with its insertion sequence.
#[derive(Debug, Clone)]
struct StoredRow {
    seq: u64,
    row: BookingRow,
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<StoredRow>,
    next_seq: u64,
}

impl MemoryState {
    fn push(&mut self, row: BookingRow) {
        self.next_seq += 1;
        self.rows.push(StoredRow {
            seq: self.next_seq,
            row,
        });
    }

    /// Rows ordered by `(date_key, seq)`.
    fn ordered(&self, date_key: Option<&str>) -> Vec<BookingRow> {
        let mut rows: Vec<&StoredRow> = self
            .rows
            .iter()
            .filter(|s| date_key.map_or(true, |k| s.row.date_key == k))
            .collect();
        rows.sort_by(|a, b| (&a.row.date_key, a.seq).cmp(&(&b.row.date_key, b.seq)));
        rows.into_iter().map(|s| s.row.clone()).collect()
    }
}

/// Process-local row store
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    state: Mutex<MemoryState>,
    unavailable: AtomicBool,
    schema_runs: AtomicUsize,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable store: every call fails until re-enabled.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// How many times `ensure_schema` actually ran.
    pub fn schema_runs(&self) -> usize {
        self.schema_runs.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), DbError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DbError::Sqlx(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn ensure_schema(&self) -> Result<(), DbError> {
        self.check_available()?;
        // Yield so that concurrent first calls would overlap if not memoized
        tokio::task::yield_now().await;
        self.schema_runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn insert(&self, row: NewBooking) -> Result<BookingRow, DbError> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        let id = row.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        if state.rows.iter().any(|s| s.row.id == id) {
            return Err(DbError::Conflict { id });
        }

        let stored = BookingRow {
            id,
            date_key: row.date_key.into_string(),
            job: row.job,
            created_at: Utc::now(),
        };
        state.push(stored.clone());
        Ok(stored)
    }

    async fn select_by_date_key(&self, date_key: &DateKey) -> Result<Vec<BookingRow>, DbError> {
        self.check_available()?;
        Ok(self.state.lock().await.ordered(Some(date_key.as_str())))
    }

    async fn select_all(&self) -> Result<Vec<BookingRow>, DbError> {
        self.check_available()?;
        Ok(self.state.lock().await.ordered(None))
    }

    async fn update_by_id(
        &self,
        id: &str,
        date_key: Option<&DateKey>,
        job: &Job,
    ) -> Result<u64, DbError> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        let mut affected = 0;
        for stored in state.rows.iter_mut().filter(|s| s.row.id == id) {
            if date_key.map_or(true, |k| stored.row.date_key == k.as_str()) {
                stored.row.job = job.clone();
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn delete_by_id(&self, id: &str) -> Result<u64, DbError> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        let before = state.rows.len();
        state.rows.retain(|s| s.row.id != id);
        Ok((before - state.rows.len()) as u64)
    }

    async fn rewrite_group(
        &self,
        date_key: &DateKey,
        edit: GroupEdit,
    ) -> Result<Vec<BookingRow>, DbError> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        let mut rows = state.ordered(Some(date_key.as_str()));
        edit.apply(&mut rows)?;

        state.rows.retain(|s| s.row.date_key != date_key.as_str());
        for row in &rows {
            state.push(row.clone());
        }
        Ok(rows)
    }
}
