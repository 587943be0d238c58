use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod memory;

pub use memory::MemoryStore;

/// Raw field map of a stored document
pub type Fields = serde_json::Map<String, Value>;

/// A document addressed by collection + id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Document id within its collection
    pub id: String,
    /// Field map as stored
    pub fields: Fields,
}

impl Document {
    /// Decode the field map into a typed model.
    ///
    /// The document id is injected under the `id` key so models can carry it
    /// as a regular field. Default-filling for absent fields happens here,
    /// through the model's serde defaults, rather than at every read site.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields))
    }

    /// Encode a typed model into a field map for `create`/`put`.
    ///
    /// The `id` key is stripped: ids live in the document address, not in
    /// the stored fields.
    pub fn encode<T: Serialize>(value: &T) -> Result<Fields, serde_json::Error> {
        match serde_json::to_value(value)? {
            Value::Object(mut fields) => {
                fields.remove("id");
                Ok(fields)
            }
            _ => Err(serde::ser::Error::custom(
                "document models must serialize to an object",
            )),
        }
    }
}

/// Atomic per-field operation applied within a single document write
#[derive(Debug, Clone)]
pub enum FieldOp {
    /// Overwrite the field
    Set(Value),
    /// Add a signed delta; an absent or non-numeric field counts as 0
    IncrementBy(i64),
    /// Append to an array field unless the value is already present
    AddToSet(Value),
    /// Remove every occurrence of the value from an array field
    RemoveFromSet(Value),
}

/// Query predicate. Equality only; richer filtering happens in the caller
/// after fetch.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Every document in the collection
    All,
    /// Documents whose field equals the value
    Eq(String, Value),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }
}

/// Store-level failures. Normal absence on `get` is `Ok(None)`, never an
/// error.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

/// Document store interface
///
/// Guarantees per-document atomicity: every op in one `update` call lands in
/// the same document write. There are no cross-document transactions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document; `Ok(None)` when absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Write a full document at a caller-chosen id, replacing any existing
    /// content.
    async fn put(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Apply field ops atomically as one document write. Fails with
    /// `NotFound` when the document does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        ops: Vec<(String, FieldOp)>,
    ) -> Result<(), StoreError>;

    /// Fetch documents matching the predicate, in the store's native
    /// iteration order (insertion order for `MemoryStore`). Callers treat
    /// that order as the tie-break for aggregation.
    async fn query(&self, collection: &str, filter: Filter) -> Result<Vec<Document>, StoreError>;

    /// Create a document with a store-generated id; returns the new id.
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    struct Note {
        #[serde(default)]
        id: String,
        body: String,
        #[serde(default)]
        pinned: bool,
    }

    #[test]
    fn decode_injects_id_and_fills_defaults() {
        let doc = Document {
            id: "n1".to_string(),
            fields: json!({ "body": "hello" }).as_object().unwrap().clone(),
        };

        let note: Note = doc.decode().unwrap();
        assert_eq!(note.id, "n1");
        assert_eq!(note.body, "hello");
        assert!(!note.pinned);
    }

    #[test]
    fn encode_strips_id() {
        let note = Note {
            id: "n1".to_string(),
            body: "hello".to_string(),
            pinned: true,
        };

        let fields = Document::encode(&note).unwrap();
        assert!(fields.get("id").is_none());
        assert_eq!(fields.get("body"), Some(&json!("hello")));
    }
}
