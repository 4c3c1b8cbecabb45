//! External item source contract and its HTTP implementation.
//!
//! # Responsibility
//! - Define the "id in, record out" seam the cache fetches through.
//! - Decode JSON item payloads into [`ItemRecord`].
//!
//! # Invariants
//! - A returned record always carries the requested id.
//! - Non-2xx responses are errors, never partial records.

use crate::config::ItemSourceConfig;
use crate::model::item::{ItemRecord, SubjectId};
use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const NOT_FOUND_STATUS: u16 = 404;

/// Failure to obtain an item from the external source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// HTTP client could not be constructed.
    Client(String),
    /// Source unreachable (connect/timeout/IO failure).
    Transport { id: SubjectId, message: String },
    /// Source answered with an error status.
    Status { id: SubjectId, status: u16 },
    /// Source answered with a body that is not a valid item.
    Decode { id: SubjectId, message: String },
}

impl FetchError {
    /// Returns whether the source reported the id as nonexistent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == NOT_FOUND_STATUS)
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client(message) => write!(f, "failed to build item source client: {message}"),
            Self::Transport { id, message } => {
                write!(f, "item {id} fetch failed: {message}")
            }
            Self::Status { id, status } => {
                write!(f, "item {id} fetch returned status {status}")
            }
            Self::Decode { id, message } => {
                write!(f, "item {id} payload is invalid: {message}")
            }
        }
    }
}

impl Error for FetchError {}

/// Source of item records keyed by id.
pub trait ItemSource {
    fn fetch(&self, id: SubjectId) -> Result<ItemRecord, FetchError>;
}

impl<S: ItemSource + ?Sized> ItemSource for &S {
    fn fetch(&self, id: SubjectId) -> Result<ItemRecord, FetchError> {
        (**self).fetch(id)
    }
}

/// Blocking HTTP item source: `GET {base_url}/{id}`.
pub struct HttpItemSource {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpItemSource {
    pub fn new(config: &ItemSourceConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| FetchError::Client(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn item_url(&self, id: SubjectId) -> String {
        format!("{}/{id}", self.base_url)
    }
}

impl ItemSource for HttpItemSource {
    fn fetch(&self, id: SubjectId) -> Result<ItemRecord, FetchError> {
        let mut request = self.client.get(self.item_url(id));
        if let Some(token) = self.api_token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(|err| FetchError::Transport {
            id,
            message: err.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                id,
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(|err| FetchError::Transport {
            id,
            message: err.to_string(),
        })?;
        debug!(
            "event=item_http_fetch module=cache status=ok id={id} bytes={}",
            body.len()
        );
        decode_item(id, &body)
    }
}

/// Envelope shape: `{ "id": .., "object": .., "data": { record fields } }`.
#[derive(Deserialize)]
struct Envelope {
    id: SubjectId,
    #[serde(default)]
    object: Option<String>,
    data: serde_json::Map<String, serde_json::Value>,
}

/// Decodes an item payload that is either a bare record or an envelope.
///
/// # Errors
/// Returns `FetchError::Decode` for malformed JSON, missing fields, or a
/// payload whose id differs from `id`.
pub fn decode_item(id: SubjectId, body: &str) -> Result<ItemRecord, FetchError> {
    let decode_err = |message: String| FetchError::Decode { id, message };

    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|err| decode_err(err.to_string()))?;

    let record = if value.get("data").is_some_and(serde_json::Value::is_object) {
        let envelope: Envelope =
            serde_json::from_value(value).map_err(|err| decode_err(err.to_string()))?;
        let mut fields = envelope.data;
        fields.insert("id".to_string(), envelope.id.into());
        if let Some(object) = envelope.object {
            fields.insert("object".to_string(), object.into());
        }
        serde_json::from_value::<ItemRecord>(serde_json::Value::Object(fields))
            .map_err(|err| decode_err(err.to_string()))?
    } else {
        serde_json::from_value::<ItemRecord>(value).map_err(|err| decode_err(err.to_string()))?
    };

    if record.id != id {
        return Err(decode_err(format!(
            "payload carries id {} instead of {id}",
            record.id
        )));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::{decode_item, FetchError};

    #[test]
    fn decodes_envelope_payload() {
        let body = r#"{
            "id": 2467,
            "object": "kanji",
            "data": {
                "characters": "板",
                "level": 29,
                "meanings": [{"meaning": "Board"}],
                "readings": [{"reading": "ばん"}],
                "component_subject_ids": [11, 12],
                "meaning_mnemonic": "A board made of wood."
            }
        }"#;

        let record = decode_item(2467, body).unwrap();
        assert_eq!(record.object, "kanji");
        assert_eq!(record.characters.as_deref(), Some("板"));
        assert_eq!(record.level, 29);
        assert_eq!(record.component_ids, vec![11, 12]);
        assert_eq!(
            record.meaning_mnemonic.as_deref(),
            Some("A board made of wood.")
        );
    }

    #[test]
    fn decodes_bare_record_payload() {
        let body = r#"{"id": 7, "object": "radical", "level": 1}"#;
        let record = decode_item(7, body).unwrap();
        assert_eq!(record.object, "radical");
        assert!(record.component_ids.is_empty());
    }

    #[test]
    fn rejects_mismatched_id_and_garbage() {
        let err = decode_item(8, r#"{"id": 7, "level": 1}"#).unwrap_err();
        assert!(matches!(err, FetchError::Decode { id: 8, .. }));

        let err = decode_item(8, "<html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode { id: 8, .. }));
    }

    #[test]
    fn only_404_counts_as_not_found() {
        assert!(FetchError::Status { id: 1, status: 404 }.is_not_found());
        assert!(!FetchError::Status { id: 1, status: 500 }.is_not_found());
    }
}
