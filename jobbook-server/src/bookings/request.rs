//! Operation requests and results
//!
//! The dispatcher delivers a method tag plus a JSON payload; this module turns
//! them into a validated `BookingRequest`. Listing is `GET`, not a tag.
//!
//! | tag            | payload                      |
//! |----------------|------------------------------|
//! | `add`          | `date_key`, `job`, `id?`     |
//! | `update`       | `id`, `job`, `date_key?`     |
//! | `update_index` | `date_key`, `index`, `job`   |
//! | `delete`       | `id`                         |
//! | `delete_index` | `date_key`, `index`          |

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::BookingError;
use crate::models::{validate_id, DateKey, Job, ValidationError};

/// Bookings grouped by date key, each item carrying its row `id`
pub type BookingMap = BTreeMap<String, Vec<JsonValue>>;

/// A validated booking operation
#[derive(Debug, Clone)]
pub enum BookingRequest {
    List,
    Add {
        date_key: DateKey,
        job: Job,
        id: Option<String>,
    },
    UpdateByIndex {
        date_key: DateKey,
        index: i64,
        job: Job,
    },
    UpdateById {
        id: String,
        date_key: Option<DateKey>,
        job: Job,
    },
    DeleteByIndex {
        date_key: DateKey,
        index: i64,
    },
    DeleteById {
        id: String,
    },
}

/// Result of a successful operation
#[derive(Debug, Clone, PartialEq)]
pub enum BookingResponse {
    Listing(BookingMap),
    Added { id: String },
    Updated,
    Deleted,
}

#[derive(Deserialize)]
struct AddPayload {
    date_key: String,
    job: JsonValue,
    id: Option<String>,
}

#[derive(Deserialize)]
struct UpdateIndexPayload {
    date_key: String,
    index: i64,
    job: JsonValue,
}

#[derive(Deserialize)]
struct UpdateIdPayload {
    id: String,
    job: JsonValue,
    date_key: Option<String>,
}

#[derive(Deserialize)]
struct DeleteIndexPayload {
    date_key: String,
    index: i64,
}

#[derive(Deserialize)]
struct DeleteIdPayload {
    id: String,
}

impl BookingRequest {
    /// Decode a payload tagged by its `type` field.
    ///
    /// A missing or unknown tag is `MethodNotSupported`; a known tag with a
    /// bad payload is a validation error.
    pub fn from_payload(payload: JsonValue) -> Result<Self, BookingError> {
        let tag = payload
            .get("type")
            .and_then(JsonValue::as_str)
            .map(str::to_owned);

        match tag {
            Some(tag) => Self::from_tagged(&tag, payload),
            None => Err(BookingError::MethodNotSupported {
                method: "POST without type".to_owned(),
            }),
        }
    }

    /// Decode a payload for an explicit operation tag.
    pub fn from_tagged(tag: &str, payload: JsonValue) -> Result<Self, BookingError> {
        let request = match tag {
            "add" => {
                let p: AddPayload = decode(payload)?;
                let id = p.id.as_deref().map(validate_id).transpose()?.map(str::to_owned);
                Self::Add {
                    date_key: DateKey::new(&p.date_key)?,
                    job: Job::new(p.job)?,
                    id,
                }
            }
            "update_index" => {
                let p: UpdateIndexPayload = decode(payload)?;
                Self::UpdateByIndex {
                    date_key: DateKey::new(&p.date_key)?,
                    index: p.index,
                    job: Job::new(p.job)?,
                }
            }
            "update" => {
                let p: UpdateIdPayload = decode(payload)?;
                Self::UpdateById {
                    id: validate_id(&p.id)?.to_owned(),
                    date_key: p.date_key.as_deref().map(DateKey::new).transpose()?,
                    job: Job::new(p.job)?,
                }
            }
            "delete_index" => {
                let p: DeleteIndexPayload = decode(payload)?;
                Self::DeleteByIndex {
                    date_key: DateKey::new(&p.date_key)?,
                    index: p.index,
                }
            }
            "delete" => {
                let p: DeleteIdPayload = decode(payload)?;
                Self::DeleteById {
                    id: validate_id(&p.id)?.to_owned(),
                }
            }
            other => {
                return Err(BookingError::MethodNotSupported {
                    method: other.to_owned(),
                })
            }
        };
        Ok(request)
    }

    /// Operation name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Add { .. } => "add",
            Self::UpdateByIndex { .. } => "update_index",
            Self::UpdateById { .. } => "update",
            Self::DeleteByIndex { .. } => "delete_index",
            Self::DeleteById { .. } => "delete",
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(payload: JsonValue) -> Result<T, ValidationError> {
    Ok(serde_json::from_value(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_with_optional_id() {
        let req = BookingRequest::from_payload(json!({
            "type": "add",
            "date_key": "2024-05-01",
            "job": {"title": "A"},
        }))
        .unwrap();
        assert!(matches!(req, BookingRequest::Add { id: None, .. }));

        let req = BookingRequest::from_payload(json!({
            "type": "add",
            "date_key": "2024-05-01",
            "job": {"title": "A"},
            "id": "job-1",
        }))
        .unwrap();
        assert!(matches!(req, BookingRequest::Add { id: Some(ref id), .. } if id == "job-1"));
    }

    #[test]
    fn negative_index_is_accepted_for_bounds_check() {
        let req = BookingRequest::from_payload(json!({
            "type": "delete_index",
            "date_key": "2024-05-01",
            "index": -1,
        }))
        .unwrap();
        assert!(matches!(req, BookingRequest::DeleteByIndex { index: -1, .. }));
    }

    #[test]
    fn update_date_key_is_optional() {
        let req = BookingRequest::from_payload(json!({
            "type": "update",
            "id": "b-1",
            "job": {"title": "B"},
        }))
        .unwrap();
        assert!(matches!(req, BookingRequest::UpdateById { date_key: None, .. }));
    }

    #[test]
    fn unknown_or_missing_tag_is_method_not_supported() {
        let err = BookingRequest::from_payload(json!({"type": "archive"})).unwrap_err();
        assert!(matches!(err, BookingError::MethodNotSupported { ref method } if method == "archive"));

        let err = BookingRequest::from_payload(json!({"date_key": "x"})).unwrap_err();
        assert!(matches!(err, BookingError::MethodNotSupported { .. }));

        // Listing is only reachable through GET; long-form names are not aliases
        for tag in ["list", "delete_date", "update_by_id", "delete_by_index"] {
            let err = BookingRequest::from_payload(json!({"type": tag, "date_key": "x", "id": "a"}))
                .unwrap_err();
            assert!(matches!(err, BookingError::MethodNotSupported { .. }), "{tag} accepted");
        }
    }

    #[test]
    fn bad_payloads_are_validation_errors() {
        let cases = [
            json!({"type": "add", "date_key": "", "job": {}}),
            json!({"type": "add", "date_key": "2024-05-01", "job": "not an object"}),
            json!({"type": "add", "date_key": "2024-05-01"}),
            json!({"type": "update_index", "date_key": "2024-05-01", "index": "0", "job": {}}),
            json!({"type": "delete", "id": ""}),
        ];
        for payload in cases {
            let err = BookingRequest::from_payload(payload.clone()).unwrap_err();
            assert!(
                matches!(err, BookingError::Validation(_)),
                "expected validation error for {payload}"
            );
        }
    }
}
