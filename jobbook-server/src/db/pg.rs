//! PostgreSQL row store
//!
//! Patterns:
//! - Every write to a group (insert, id-addressed update/delete, positional
//!   rewrite) holds that group's transaction-scoped advisory lock
//! - Positional rewrites also read the group `FOR UPDATE`, so a row changed by
//!   a writer outside the lock is re-read rather than written back stale
//! - Rows are ordered by `(date_key, seq)`; `seq` is a BIGSERIAL, so the
//!   order of a group is its insertion order

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use super::store::{DbError, RowStore};
use crate::bookings::edit::GroupEdit;
use crate::models::{BookingRow, DateKey, Job, NewBooking};

/// Advisory lock namespace for per-date-key group locks
const GROUP_LOCK_NS: i32 = 0x4a42_0001;

/// Advisory lock namespace for schema creation
const SCHEMA_LOCK_NS: i32 = 0x4a42_0002;

/// Row as selected from `job_bookings`
#[derive(Debug, FromRow)]
struct BookingRecord {
    id: String,
    date_key: String,
    job: JsonValue,
    created_at: DateTime<Utc>,
}

impl From<BookingRecord> for BookingRow {
    fn from(r: BookingRecord) -> Self {
        Self {
            id: r.id,
            date_key: r.date_key,
            job: Job::from_stored(r.job),
            created_at: r.created_at,
        }
    }
}

/// Row store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgRowStore {
    pool: PgPool,
}

impl PgRowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RowStore for PgRowStore {
    async fn ensure_schema(&self) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        // Serialize concurrent first calls from several processes; plain
        // CREATE ... IF NOT EXISTS can still race on the catalog.
        sqlx::query("SELECT pg_advisory_xact_lock($1, 0)")
            .bind(SCHEMA_LOCK_NS)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS job_bookings (
                id TEXT PRIMARY KEY,
                date_key TEXT NOT NULL,
                job JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                seq BIGSERIAL NOT NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_job_bookings_date_seq ON job_bookings (date_key, seq)",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn insert(&self, row: NewBooking) -> Result<BookingRow, DbError> {
        let id = row.id.unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut tx = self.pool.begin().await?;
        lock_group(&mut tx, row.date_key.as_str()).await?;

        let record: BookingRecord = sqlx::query_as(
            r#"
            INSERT INTO job_bookings (id, date_key, job)
            VALUES ($1, $2, $3)
            RETURNING id, date_key, job, created_at
            "#,
        )
        .bind(&id)
        .bind(row.date_key.as_str())
        .bind(Json(&row.job))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_or(e, &id))?;

        tx.commit().await?;
        Ok(record.into())
    }

    async fn select_by_date_key(&self, date_key: &DateKey) -> Result<Vec<BookingRow>, DbError> {
        let records: Vec<BookingRecord> = sqlx::query_as(
            r#"
            SELECT id, date_key, job, created_at
            FROM job_bookings
            WHERE date_key = $1
            ORDER BY seq
            "#,
        )
        .bind(date_key.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(BookingRow::from).collect())
    }

    async fn select_all(&self) -> Result<Vec<BookingRow>, DbError> {
        let records: Vec<BookingRecord> = sqlx::query_as(
            r#"
            SELECT id, date_key, job, created_at
            FROM job_bookings
            ORDER BY date_key, seq
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(BookingRow::from).collect())
    }

    async fn update_by_id(
        &self,
        id: &str,
        date_key: Option<&DateKey>,
        job: &Job,
    ) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;

        let group = match date_key {
            Some(date_key) => date_key.as_str().to_owned(),
            None => match group_of(&mut tx, id).await? {
                Some(group) => group,
                None => return Ok(0),
            },
        };
        lock_group(&mut tx, &group).await?;

        // Runs after any rewrite of the group has committed, so it sees the
        // reinserted row rather than the version the rewrite deleted.
        let result = sqlx::query("UPDATE job_bookings SET job = $1 WHERE id = $2 AND date_key = $3")
            .bind(Json(job))
            .bind(id)
            .bind(&group)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn delete_by_id(&self, id: &str) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;

        let Some(group) = group_of(&mut tx, id).await? else {
            return Ok(0);
        };
        lock_group(&mut tx, &group).await?;

        let result = sqlx::query("DELETE FROM job_bookings WHERE id = $1 AND date_key = $2")
            .bind(id)
            .bind(&group)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn rewrite_group(
        &self,
        date_key: &DateKey,
        edit: GroupEdit,
    ) -> Result<Vec<BookingRow>, DbError> {
        let mut tx = self.pool.begin().await?;
        lock_group(&mut tx, date_key.as_str()).await?;

        // FOR UPDATE waits out any uncommitted write to a row of the group and
        // then reads its latest version; a row deleted meanwhile drops out.
        let records: Vec<BookingRecord> = sqlx::query_as(
            r#"
            SELECT id, date_key, job, created_at
            FROM job_bookings
            WHERE date_key = $1
            ORDER BY seq
            FOR UPDATE
            "#,
        )
        .bind(date_key.as_str())
        .fetch_all(&mut *tx)
        .await?;
        let mut rows: Vec<BookingRow> = records.into_iter().map(BookingRow::from).collect();

        // Dropping `tx` on error rolls back; nothing has been written yet.
        edit.apply(&mut rows)?;

        sqlx::query("DELETE FROM job_bookings WHERE date_key = $1")
            .bind(date_key.as_str())
            .execute(&mut *tx)
            .await?;

        for row in &rows {
            sqlx::query(
                r#"
                INSERT INTO job_bookings (id, date_key, job, created_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(&row.id)
            .bind(&row.date_key)
            .bind(Json(&row.job))
            .bind(row.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(rows)
    }
}

/// Take the transaction-scoped lock for one date key.
async fn lock_group(conn: &mut PgConnection, date_key: &str) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1, hashtext($2))")
        .bind(GROUP_LOCK_NS)
        .bind(date_key)
        .execute(conn)
        .await?;
    Ok(())
}

/// Date key of the row with this id. A row never changes group, so the
/// answer stays valid once the group lock is held.
async fn group_of(conn: &mut PgConnection, id: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT date_key FROM job_bookings WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
}

fn conflict_or(e: sqlx::Error, id: &str) -> DbError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return DbError::Conflict { id: id.to_owned() };
        }
    }
    DbError::Sqlx(e)
}
