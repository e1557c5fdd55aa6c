//! Booking collection manager
//!
//! Translates booking operations into row-store calls. Holds no booking state
//! of its own; the only process-wide state is the memoized schema check.
//!
//! - Id-addressed operations (add, update, delete) are single statements.
//! - Index-addressed operations go through `RowStore::rewrite_group`, which
//!   resolves the index and rewrites the group in one isolated transaction.

use std::sync::Arc;

use tokio::sync::OnceCell;

use super::edit::GroupEdit;
use super::request::{BookingMap, BookingRequest, BookingResponse};
use super::BookingError;
use crate::db::RowStore;
use crate::models::{validate_id, DateKey, Job, NewBooking};

/// Booking collection manager, shared across request handlers
pub struct BookingManager {
    store: Arc<dyn RowStore>,
    schema: OnceCell<()>,
}

impl BookingManager {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self {
            store,
            schema: OnceCell::new(),
        }
    }

    /// Store handle after the schema has been ensured.
    ///
    /// The first caller runs `ensure_schema`; concurrent callers wait for it.
    /// A failure is not memoized, so the next call tries again.
    async fn ready(&self) -> Result<&dyn RowStore, BookingError> {
        self.schema
            .get_or_try_init(|| async {
                tracing::info!("ensuring job_bookings schema");
                self.store.ensure_schema().await
            })
            .await?;
        Ok(self.store.as_ref())
    }

    /// Run schema creation now instead of on first use.
    pub async fn init(&self) -> Result<(), BookingError> {
        self.ready().await.map(|_| ())
    }

    /// Every booking, grouped by date key in insertion order.
    pub async fn list(&self) -> Result<BookingMap, BookingError> {
        let rows = self.ready().await?.select_all().await?;

        let mut map = BookingMap::new();
        for row in rows {
            let item = row.job.with_row_id(&row.id);
            map.entry(row.date_key).or_default().push(item);
        }
        Ok(map)
    }

    /// One group in order; an unknown date key is an empty group.
    pub async fn list_group(&self, date_key: &DateKey) -> Result<Vec<serde_json::Value>, BookingError> {
        let rows = self.ready().await?.select_by_date_key(date_key).await?;
        Ok(rows.iter().map(|row| row.job.with_row_id(&row.id)).collect())
    }

    /// Insert one booking and return its id.
    ///
    /// The id is the explicit one, else the job's own `id` field, else
    /// generated by the store. A taken id is a `Conflict`.
    pub async fn add(
        &self,
        date_key: DateKey,
        job: Job,
        id: Option<String>,
    ) -> Result<String, BookingError> {
        let id = match id {
            Some(id) => Some(id),
            None => job
                .embedded_id()
                .map(|id| validate_id(id).map(str::to_owned))
                .transpose()?,
        };

        tracing::debug!(date_key = %date_key, id = ?id, "adding booking");
        let row = self
            .ready()
            .await?
            .insert(NewBooking { id, date_key, job })
            .await?;
        Ok(row.id)
    }

    /// Replace the job at `index` within the group, keeping its id.
    pub async fn update_by_index(
        &self,
        date_key: &DateKey,
        index: i64,
        job: Job,
    ) -> Result<(), BookingError> {
        tracing::debug!(date_key = %date_key, index, "updating booking by index");
        self.ready()
            .await?
            .rewrite_group(date_key, GroupEdit::Replace { index, job })
            .await?;
        Ok(())
    }

    /// Replace the job of one booking. `date_key`, when given, must match too.
    pub async fn update_by_id(
        &self,
        id: &str,
        date_key: Option<&DateKey>,
        job: &Job,
    ) -> Result<(), BookingError> {
        tracing::debug!(id, date_key = ?date_key.map(DateKey::as_str), "updating booking by id");
        let affected = self.ready().await?.update_by_id(id, date_key, job).await?;
        if affected == 0 {
            return Err(BookingError::NotFound { id: id.to_owned() });
        }
        Ok(())
    }

    /// Remove the booking at `index`; later bookings shift down by one.
    pub async fn delete_by_index(&self, date_key: &DateKey, index: i64) -> Result<(), BookingError> {
        tracing::debug!(date_key = %date_key, index, "deleting booking by index");
        self.ready()
            .await?
            .rewrite_group(date_key, GroupEdit::Remove { index })
            .await?;
        Ok(())
    }

    /// Remove exactly one booking by id.
    pub async fn delete_by_id(&self, id: &str) -> Result<(), BookingError> {
        tracing::debug!(id, "deleting booking by id");
        let affected = self.ready().await?.delete_by_id(id).await?;
        if affected == 0 {
            return Err(BookingError::NotFound { id: id.to_owned() });
        }
        Ok(())
    }

    /// Run a decoded request.
    pub async fn execute(&self, request: BookingRequest) -> Result<BookingResponse, BookingError> {
        let response = match request {
            BookingRequest::List => BookingResponse::Listing(self.list().await?),
            BookingRequest::Add { date_key, job, id } => BookingResponse::Added {
                id: self.add(date_key, job, id).await?,
            },
            BookingRequest::UpdateByIndex {
                date_key,
                index,
                job,
            } => {
                self.update_by_index(&date_key, index, job).await?;
                BookingResponse::Updated
            }
            BookingRequest::UpdateById { id, date_key, job } => {
                self.update_by_id(&id, date_key.as_ref(), &job).await?;
                BookingResponse::Updated
            }
            BookingRequest::DeleteByIndex { date_key, index } => {
                self.delete_by_index(&date_key, index).await?;
                BookingResponse::Deleted
            }
            BookingRequest::DeleteById { id } => {
                self.delete_by_id(&id).await?;
                BookingResponse::Deleted
            }
        };
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryRowStore;
    use serde_json::{json, Value as JsonValue};

    const DAY: &str = "2024-05-01";

    fn setup() -> (Arc<MemoryRowStore>, BookingManager) {
        let store = Arc::new(MemoryRowStore::new());
        let manager = BookingManager::new(store.clone());
        (store, manager)
    }

    fn day() -> DateKey {
        DateKey::new(DAY).unwrap()
    }

    fn job(title: &str) -> Job {
        Job::new(json!({ "title": title })).unwrap()
    }

    async fn titles(manager: &BookingManager, date_key: &DateKey) -> Vec<String> {
        manager
            .list_group(date_key)
            .await
            .unwrap()
            .iter()
            .map(|item| item["title"].as_str().unwrap().to_owned())
            .collect()
    }

    async fn seed(manager: &BookingManager, names: &[&str]) -> Vec<String> {
        let mut ids = Vec::new();
        for name in names {
            ids.push(manager.add(day(), job(name), None).await.unwrap());
        }
        ids
    }

    #[tokio::test]
    async fn adds_keep_insertion_order() {
        let (_, manager) = setup();
        seed(&manager, &["A", "B", "C", "D"]).await;
        assert_eq!(titles(&manager, &day()).await, ["A", "B", "C", "D"]);
    }

    #[tokio::test]
    async fn add_prefers_explicit_then_embedded_id() {
        let (_, manager) = setup();
        let explicit = manager
            .add(day(), job("A"), Some("explicit".into()))
            .await
            .unwrap();
        assert_eq!(explicit, "explicit");

        let embedded = Job::new(json!({"id": "from-job", "title": "B"})).unwrap();
        assert_eq!(manager.add(day(), embedded, None).await.unwrap(), "from-job");
    }

    #[tokio::test]
    async fn duplicate_id_is_conflict_and_nothing_is_overwritten() {
        let (_, manager) = setup();
        manager.add(day(), job("A"), Some("x".into())).await.unwrap();

        let err = manager
            .add(day(), job("B"), Some("x".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Conflict { ref id } if id == "x"));
        assert_eq!(titles(&manager, &day()).await, ["A"]);
    }

    #[tokio::test]
    async fn update_by_index_touches_only_target() {
        let (_, manager) = setup();
        let ids = seed(&manager, &["A", "B", "C"]).await;

        manager.update_by_index(&day(), 1, job("B2")).await.unwrap();

        assert_eq!(titles(&manager, &day()).await, ["A", "B2", "C"]);
        // ids survive the positional rewrite
        let listed: Vec<JsonValue> = manager.list_group(&day()).await.unwrap();
        let listed_ids: Vec<_> = listed.iter().map(|i| i["id"].as_str().unwrap()).collect();
        assert_eq!(listed_ids, ids);
    }

    #[tokio::test]
    async fn delete_by_index_shifts_tail() {
        let (_, manager) = setup();
        let ids = seed(&manager, &["A", "B", "C", "D"]).await;

        manager.delete_by_index(&day(), 1).await.unwrap();

        assert_eq!(titles(&manager, &day()).await, ["A", "C", "D"]);
        // the surviving rows are still addressable by their old ids
        manager.delete_by_id(&ids[2]).await.unwrap();
        assert_eq!(titles(&manager, &day()).await, ["A", "D"]);
    }

    #[tokio::test]
    async fn out_of_range_index_is_rejected_without_change() {
        let (_, manager) = setup();
        seed(&manager, &["A", "B"]).await;
        let before = manager.list().await.unwrap();

        for index in [2, -1, i64::MAX, i64::MIN] {
            let err = manager
                .update_by_index(&day(), index, job("X"))
                .await
                .unwrap_err();
            assert!(matches!(err, BookingError::InvalidIndex { len: 2, .. }));

            let err = manager.delete_by_index(&day(), index).await.unwrap_err();
            assert!(matches!(err, BookingError::InvalidIndex { len: 2, .. }));
        }

        assert_eq!(manager.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn index_on_unknown_date_is_invalid() {
        let (_, manager) = setup();
        let err = manager.delete_by_index(&day(), 0).await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidIndex { index: 0, len: 0 }));
    }

    #[tokio::test]
    async fn delete_by_id_affects_only_that_row() {
        let (_, manager) = setup();
        let ids = seed(&manager, &["A", "B"]).await;
        let other = DateKey::new("2024-05-02").unwrap();
        manager.add(other.clone(), job("Z"), None).await.unwrap();

        manager.delete_by_id(&ids[0]).await.unwrap();

        assert_eq!(titles(&manager, &day()).await, ["B"]);
        assert_eq!(titles(&manager, &other).await, ["Z"]);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let (_, manager) = setup();
        seed(&manager, &["A"]).await;

        let err = manager.delete_by_id("nope").await.unwrap_err();
        assert!(matches!(err, BookingError::NotFound { .. }));

        let err = manager.update_by_id("nope", None, &job("X")).await.unwrap_err();
        assert!(matches!(err, BookingError::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_by_id_with_wrong_date_key_is_not_found() {
        let (_, manager) = setup();
        let ids = seed(&manager, &["A"]).await;
        let other = DateKey::new("2024-05-02").unwrap();

        let err = manager
            .update_by_id(&ids[0], Some(&other), &job("X"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound { .. }));

        manager
            .update_by_id(&ids[0], Some(&day()), &job("A2"))
            .await
            .unwrap();
        assert_eq!(titles(&manager, &day()).await, ["A2"]);
    }

    #[tokio::test]
    async fn list_is_side_effect_free() {
        let (_, manager) = setup();
        seed(&manager, &["A", "B"]).await;
        let first = manager.list().await.unwrap();
        let second = manager.list().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn walkthrough_add_delete_by_index_then_by_id() {
        let (_, manager) = setup();

        let a = manager.add(day(), job("A"), None).await.unwrap();
        let listing = manager.list().await.unwrap();
        assert_eq!(listing[DAY], vec![json!({"title": "A", "id": a})]);

        let b = manager.add(day(), job("B"), None).await.unwrap();
        assert_eq!(titles(&manager, &day()).await, ["A", "B"]);

        manager.delete_by_index(&day(), 0).await.unwrap();
        assert_eq!(
            manager.list().await.unwrap()[DAY],
            vec![json!({"title": "B", "id": b})]
        );

        manager.delete_by_id(&b).await.unwrap();
        assert!(!manager.list().await.unwrap().contains_key(DAY));
    }

    #[tokio::test]
    async fn delete_last_by_index_leaves_empty_group() {
        let (_, manager) = setup();
        seed(&manager, &["A"]).await;
        manager.delete_by_index(&day(), 0).await.unwrap();
        assert!(manager.list_group(&day()).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_index_updates_both_apply() {
        let (_, manager) = setup();
        let manager = Arc::new(manager);
        seed(&manager, &["A", "B", "C", "D"]).await;

        let first = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.update_by_index(&day(), 0, job("A2")).await })
        };
        let second = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.update_by_index(&day(), 3, job("D2")).await })
        };
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        assert_eq!(titles(&manager, &day()).await, ["A2", "B", "C", "D2"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn schema_is_ensured_once_under_concurrent_first_calls() {
        let (store, manager) = setup();
        let manager = Arc::new(manager);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.list().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.schema_runs(), 1);
    }

    #[tokio::test]
    async fn failed_schema_check_is_retried() {
        let (store, manager) = setup();
        store.set_available(false);
        let err = manager.list().await.unwrap_err();
        assert!(matches!(err, BookingError::Store(_)));
        assert_eq!(store.schema_runs(), 0);

        store.set_available(true);
        manager.list().await.unwrap();
        assert_eq!(store.schema_runs(), 1);
    }

    #[tokio::test]
    async fn execute_dispatches_requests() {
        let (_, manager) = setup();
        let added = manager
            .execute(
                BookingRequest::from_payload(json!({
                    "type": "add", "date_key": DAY, "job": {"title": "A"}, "id": "a"
                }))
                .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(added, BookingResponse::Added { id: "a".into() });

        let deleted = manager
            .execute(BookingRequest::DeleteById { id: "a".into() })
            .await
            .unwrap();
        assert_eq!(deleted, BookingResponse::Deleted);

        let listing = manager.execute(BookingRequest::List).await.unwrap();
        assert_eq!(listing, BookingResponse::Listing(BookingMap::new()));
    }
}
