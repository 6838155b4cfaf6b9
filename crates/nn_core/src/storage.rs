use async_trait::async_trait;
use serde_json::Value;

use crate::Result;

/// Key-value persistence used for caches, history, preferences and pipeline state.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    /// All keys currently present, in no particular order.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Approximate serialized size of everything stored.
    async fn bytes_in_use(&self) -> Result<usize>;
}
