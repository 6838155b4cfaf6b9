use std::sync::Arc;

use async_trait::async_trait;
use nn_core::{Error, KeyValueStore, Result};

pub mod backends;
pub mod hash;
pub mod manager;

pub use backends::*;
pub use hash::hash_url;
pub use manager::{CacheKind, StorageManager, CACHE_DURATION_SECS, MAX_HISTORY};

#[async_trait]
pub trait StorageBackend: KeyValueStore + Sized {
    fn get_error_message() -> &'static str;

    /// Opens the backend at `location`, or at its default location.
    async fn open(location: Option<&str>) -> Result<Self>;
}

/// Opens the named backend (`memory`, or `sqlite` when that feature is enabled).
pub async fn create_storage(kind: &str, location: Option<&str>) -> Result<Arc<dyn KeyValueStore>> {
    match kind {
        "memory" => open_backend::<MemoryStore>(location).await,
        #[cfg(feature = "sqlite")]
        "sqlite" => open_backend::<SqliteStore>(location).await,
        other => Err(Error::Storage(format!("Unknown storage backend: {}", other))),
    }
}

async fn open_backend<T: StorageBackend + 'static>(location: Option<&str>) -> Result<Arc<dyn KeyValueStore>> {
    match T::open(location).await {
        Ok(store) => Ok(Arc::new(store)),
        Err(e) => {
            tracing::error!("{} ({})", T::get_error_message(), e);
            Err(e)
        }
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, CacheKind, StorageBackend, StorageManager};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_storage() {
        let store = create_storage("memory", None).await.unwrap();
        store.set("k", serde_json::json!(1)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(serde_json::json!(1)));
    }

    #[tokio::test]
    async fn test_unknown_backend() {
        let err = create_storage("qdrant", None).await.err().unwrap();
        assert!(matches!(err, Error::Storage(_)));
    }
}
