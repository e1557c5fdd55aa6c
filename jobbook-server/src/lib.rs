//! jobbook-server: date-grouped job bookings over a row store
//!
//! Bookings are JSON job documents grouped by a date key. Groups are ordered,
//! and can be edited by position as well as by id; positional edits rewrite the
//! whole group inside one isolated transaction.
//!
//! Layers:
//! - [`models`]: validated inputs (date keys, jobs, ids)
//! - [`bookings`]: the booking manager and request decoding
//! - [`db`]: the row store contract, PostgreSQL and in-memory stores
//! - [`http`]: axum dispatcher endpoint

pub mod bookings;
pub mod db;
pub mod http;
pub mod models;

pub use bookings::{BookingError, BookingManager, BookingRequest, BookingResponse};
pub use db::{MemoryRowStore, PgRowStore, RowStore};
pub use http::{run_server, ServerConfig};
