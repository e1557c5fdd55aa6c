//! Database layer - connection pool and row stores
//!
//! # Design Principles
//!
//! - Connection pool (max 5 connections by default), created lazily
//! - Rely on DB constraints, handle conflicts - no check-then-insert
//! - Transactions for multi-step operations (positional rewrites)

pub mod pool;
pub mod store;
pub mod pg;
pub mod memory;

pub use pool::{create_pool, create_pool_with_options, DEFAULT_MAX_CONNECTIONS};
pub use store::{DbError, RowStore};
pub use pg::PgRowStore;
pub use memory::MemoryRowStore;
