use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{Document, DocumentStore, FieldOp, Fields, Filter, StoreError};

#[derive(Default)]
struct CollectionData {
    /// Insertion order of ids; this is the store's native iteration order.
    order: Vec<String>,
    docs: HashMap<String, Fields>,
}

/// In-memory document store.
///
/// Backs tests and local runs. `update` applies all ops under one write
/// lock, matching the per-document atomicity of the real backend. Iteration
/// order for `query` is insertion order, which callers rely on as the
/// aggregation tie-break.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, CollectionData>>,
    /// Remaining `update` calls before an injected failure; -1 = disabled.
    update_budget: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            update_budget: AtomicI64::new(-1),
        }
    }

    /// Inject a failure: the next `n` update calls succeed, every later one
    /// fails with `Unavailable` until `clear_failures` is called.
    pub fn fail_updates_after(&self, n: i64) {
        self.update_budget.store(n, Ordering::SeqCst);
    }

    pub fn clear_failures(&self) {
        self.update_budget.store(-1, Ordering::SeqCst);
    }

    fn check_update_gate(&self) -> Result<(), StoreError> {
        let budget = self.update_budget.load(Ordering::SeqCst);
        if budget < 0 {
            return Ok(());
        }
        if budget == 0 {
            tracing::warn!("update budget exhausted, failing injected update");
            return Err(StoreError::Unavailable("injected update failure".to_string()));
        }
        self.update_budget.store(budget - 1, Ordering::SeqCst);
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_op(fields: &mut Fields, field: &str, op: FieldOp) {
    match op {
        FieldOp::Set(value) => {
            fields.insert(field.to_string(), value);
        }
        FieldOp::IncrementBy(delta) => {
            let current = fields.get(field).and_then(Value::as_i64).unwrap_or(0);
            fields.insert(field.to_string(), Value::from(current + delta));
        }
        FieldOp::AddToSet(value) => {
            let entry = fields
                .entry(field.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = entry {
                if !items.contains(&value) {
                    items.push(value);
                }
            } else {
                *entry = Value::Array(vec![value]);
            }
        }
        FieldOp::RemoveFromSet(value) => {
            if let Some(Value::Array(items)) = fields.get_mut(field) {
                items.retain(|item| item != &value);
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        let doc = collections
            .get(collection)
            .and_then(|data| data.docs.get(id))
            .map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            });
        Ok(doc)
    }

    async fn put(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let data = collections.entry(collection.to_string()).or_default();
        if !data.docs.contains_key(id) {
            data.order.push(id.to_string());
        }
        data.docs.insert(id.to_string(), fields);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        ops: Vec<(String, FieldOp)>,
    ) -> Result<(), StoreError> {
        self.check_update_gate()?;

        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|data| data.docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        for (field, op) in ops {
            apply_op(doc, &field, op);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, filter: Filter) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let Some(data) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut results = Vec::new();
        for id in &data.order {
            let Some(fields) = data.docs.get(id) else {
                continue;
            };
            let matched = match &filter {
                Filter::All => true,
                Filter::Eq(field, value) => fields.get(field) == Some(value),
            };
            if matched {
                results.push(Document {
                    id: id.clone(),
                    fields: fields.clone(),
                });
            }
        }
        Ok(results)
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.put(collection, &id, fields).await?;
        Ok(id)
    }
}
