//! Positional edits of a booking group
//!
//! A row store has no notion of "the n-th booking of a day". Index-addressed
//! operations therefore linearize the group, apply a `GroupEdit` to the
//! in-memory sequence and hand the result back to the store, which persists
//! it in place of the old group.

use crate::models::{BookingRow, Job};

/// Index resolved against a group of `len` rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("index {index} is out of range for a group of {len} bookings")]
pub struct IndexOutOfRange {
    pub index: i64,
    pub len: usize,
}

/// An index-addressed mutation of one group
#[derive(Debug, Clone)]
pub enum GroupEdit {
    /// Replace the job at `index`, keeping the row id
    Replace { index: i64, job: Job },
    /// Remove the row at `index`
    Remove { index: i64 },
}

impl GroupEdit {
    pub fn index(&self) -> i64 {
        match self {
            Self::Replace { index, .. } | Self::Remove { index } => *index,
        }
    }

    /// Apply the edit to a linearized group.
    ///
    /// On error `rows` is left untouched.
    pub fn apply(self, rows: &mut Vec<BookingRow>) -> Result<(), IndexOutOfRange> {
        let position = resolve(self.index(), rows.len())?;
        match self {
            Self::Replace { job, .. } => rows[position].job = job,
            Self::Remove { .. } => {
                rows.remove(position);
            }
        }
        Ok(())
    }
}

/// Check `0 <= index < len` and convert to a position.
pub fn resolve(index: i64, len: usize) -> Result<usize, IndexOutOfRange> {
    usize::try_from(index)
        .ok()
        .filter(|&position| position < len)
        .ok_or(IndexOutOfRange { index, len })
}
