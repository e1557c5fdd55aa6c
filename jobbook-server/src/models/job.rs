//! Job documents
//!
//! A job is stored verbatim; the only structural rule is that it must be a
//! JSON object so that the row id can be attached when listing.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use super::ValidationError;

/// Opaque job document (always a JSON object)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Job(Map<String, JsonValue>);

impl Job {
    /// Wrap a JSON value, rejecting anything that is not an object.
    ///
    /// ```
    /// use jobbook_server::models::Job;
    /// use serde_json::json;
    ///
    /// assert!(Job::new(json!({"title": "Fit kitchen"})).is_ok());
    /// assert!(Job::new(json!(["not", "a", "document"])).is_err());
    /// ```
    pub fn new(value: JsonValue) -> Result<Self, ValidationError> {
        match value {
            JsonValue::Object(map) => Ok(Self(map)),
            _ => Err(ValidationError::InvalidFormat {
                field: "job",
                reason: "must be a JSON object",
            }),
        }
    }

    /// Rebuild a job read back from the store.
    ///
    /// Rows are only ever written from a validated `Job`, so a non-object here
    /// means the row was written by something else; it is kept under `value`.
    pub(crate) fn from_stored(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(map) => Self(map),
            other => {
                let mut map = Map::new();
                map.insert("value".to_owned(), other);
                Self(map)
            }
        }
    }

    /// The job's own `id` field, when it carries a non-empty string one.
    pub fn embedded_id(&self) -> Option<&str> {
        self.0
            .get("id")
            .and_then(JsonValue::as_str)
            .filter(|id| !id.trim().is_empty())
    }

    pub fn as_value(&self) -> JsonValue {
        JsonValue::Object(self.0.clone())
    }

    /// Render the job with the row id attached; the row id wins over any
    /// `id` field stored inside the document.
    pub fn with_row_id(&self, id: &str) -> JsonValue {
        let mut map = self.0.clone();
        map.insert("id".to_owned(), JsonValue::String(id.to_owned()));
        JsonValue::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_non_objects() {
        for value in [json!(null), json!(3), json!("job"), json!([1, 2])] {
            let err = Job::new(value).unwrap_err();
            assert!(matches!(err, ValidationError::InvalidFormat { field: "job", .. }));
        }
    }

    #[test]
    fn embedded_id_requires_non_empty_string() {
        assert_eq!(Job::new(json!({"id": "j-1"})).unwrap().embedded_id(), Some("j-1"));
        assert_eq!(Job::new(json!({"id": 7})).unwrap().embedded_id(), None);
        assert_eq!(Job::new(json!({"id": " "})).unwrap().embedded_id(), None);
        assert_eq!(Job::new(json!({})).unwrap().embedded_id(), None);
    }

    #[test]
    fn row_id_overrides_embedded_id() {
        let job = Job::new(json!({"id": "stale", "title": "A"})).unwrap();
        assert_eq!(job.with_row_id("fresh"), json!({"id": "fresh", "title": "A"}));
    }

    #[test]
    fn stored_scalars_are_wrapped() {
        let job = Job::from_stored(json!(42));
        assert_eq!(job.as_value(), json!({"value": 42}));
    }
}
