use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use nn_core::{
    AnalysisState, Article, CacheEntry, HistoryEntry, KeyValueStore, Result, StorageStats,
    UserPreferences,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::hash_url;

pub const CACHE_DURATION_SECS: i64 = 60 * 60;
pub const MAX_HISTORY: usize = 50;

const CACHE_PREFIX: &str = "analysis_";
const RELATED_PREFIX: &str = "related_";
const HISTORY_KEY: &str = "analysisHistory";
const PREFERENCES_KEY: &str = "userPreferences";
const STATE_KEY: &str = "currentAnalysisState";
const QUOTA_MB: usize = 10;

/// What a cache entry holds. Each kind lives under its own key so a bias
/// report and a single-source summary for the same URL never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Bias,
    Narrative,
    Summary,
    Result,
}

impl CacheKind {
    fn as_str(&self) -> &'static str {
        match self {
            CacheKind::Bias => "bias",
            CacheKind::Narrative => "narrative",
            CacheKind::Summary => "summary",
            CacheKind::Result => "result",
        }
    }

    pub fn key(&self, fingerprint: &str) -> String {
        format!("{}{}_{}", CACHE_PREFIX, self.as_str(), hash_url(fingerprint))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RelatedEntry {
    articles: Vec<Article>,
    timestamp: DateTime<Utc>,
}

/// Typed access to the key-value store: analysis cache with lazy expiry,
/// related-article cache, history, preferences and pipeline state.
#[derive(Clone)]
pub struct StorageManager {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
    // Serializes read-modify-write of the history list across clones.
    history_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for StorageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageManager")
            .field("store", &"<dyn KeyValueStore>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl StorageManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            ttl: Duration::seconds(CACHE_DURATION_SECS),
            history_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    fn is_expired(&self, timestamp: DateTime<Utc>) -> bool {
        Utc::now() - timestamp > self.ttl
    }

    pub async fn cache_analysis<T: Serialize>(
        &self,
        kind: CacheKind,
        fingerprint: &str,
        data: &T,
    ) -> Result<()> {
        let entry = CacheEntry {
            data: serde_json::to_value(data)?,
            timestamp: Utc::now(),
            url: fingerprint.to_string(),
        };
        self.store
            .set(&kind.key(fingerprint), serde_json::to_value(&entry)?)
            .await?;
        debug!(kind = kind.as_str(), %fingerprint, "cached analysis");
        Ok(())
    }

    /// Returns the cached value when present and younger than the TTL.
    /// Expired or unreadable entries are removed and reported as absent.
    pub async fn get_cached_analysis<T: DeserializeOwned>(
        &self,
        kind: CacheKind,
        fingerprint: &str,
    ) -> Result<Option<T>> {
        let key = kind.key(fingerprint);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        let entry: CacheEntry = match serde_json::from_value(raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(%key, error = %e, "dropping malformed cache entry");
                self.store.remove(&key).await?;
                return Ok(None);
            }
        };

        if self.is_expired(entry.timestamp) {
            info!(kind = kind.as_str(), %fingerprint, "cache expired");
            self.store.remove(&key).await?;
            return Ok(None);
        }

        match serde_json::from_value(entry.data) {
            Ok(data) => {
                debug!(kind = kind.as_str(), %fingerprint, "cache hit");
                Ok(Some(data))
            }
            Err(e) => {
                warn!(%key, error = %e, "cached data has an unexpected shape");
                self.store.remove(&key).await?;
                Ok(None)
            }
        }
    }

    pub async fn clear_cache(&self, kind: CacheKind, fingerprint: &str) -> Result<()> {
        self.store.remove(&kind.key(fingerprint)).await
    }

    /// Removes every cached analysis and returns how many entries were dropped.
    pub async fn clear_all_cache(&self) -> Result<usize> {
        let keys: Vec<String> = self
            .store
            .keys()
            .await?
            .into_iter()
            .filter(|k| k.starts_with(CACHE_PREFIX))
            .collect();
        for key in &keys {
            self.store.remove(key).await?;
        }
        if !keys.is_empty() {
            info!("🗑️ Cleared {} cached analyses", keys.len());
        }
        Ok(keys.len())
    }

    pub async fn save_related_articles(&self, main_url: &str, articles: &[Article]) -> Result<()> {
        let entry = RelatedEntry {
            articles: articles.to_vec(),
            timestamp: Utc::now(),
        };
        let key = format!("{}{}", RELATED_PREFIX, hash_url(main_url));
        self.store.set(&key, serde_json::to_value(&entry)?).await
    }

    pub async fn get_related_articles(&self, main_url: &str) -> Result<Option<Vec<Article>>> {
        let key = format!("{}{}", RELATED_PREFIX, hash_url(main_url));
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };
        let entry: RelatedEntry = match serde_json::from_value(raw) {
            Ok(entry) => entry,
            Err(_) => {
                self.store.remove(&key).await?;
                return Ok(None);
            }
        };
        if self.is_expired(entry.timestamp) {
            self.store.remove(&key).await?;
            return Ok(None);
        }
        Ok(Some(entry.articles))
    }

    pub async fn save_preferences(&self, preferences: &UserPreferences) -> Result<()> {
        self.store
            .set(PREFERENCES_KEY, serde_json::to_value(preferences)?)
            .await?;
        info!("💾 Saved user preferences");
        Ok(())
    }

    pub async fn get_preferences(&self) -> Result<UserPreferences> {
        Ok(self
            .store
            .get(PREFERENCES_KEY)
            .await?
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default())
    }

    pub async fn get_storage_stats(&self) -> Result<StorageStats> {
        let bytes = self.store.bytes_in_use().await?;
        Ok(StorageStats {
            bytes_used: bytes,
            megabytes_used: format!("{:.2}", bytes as f64 / (1024.0 * 1024.0)),
            quota_mb: QUOTA_MB,
        })
    }

    /// Prepends an entry to the history, keeping the newest [`MAX_HISTORY`].
    pub async fn add_to_history(
        &self,
        url: &str,
        title: Option<&str>,
        bias_score: f64,
        sources: usize,
    ) -> Result<()> {
        let _guard = self.history_lock.lock().await;
        let mut history = self.get_history().await?;
        history.insert(
            0,
            HistoryEntry {
                url: url.to_string(),
                title: title
                    .filter(|t| !t.is_empty())
                    .unwrap_or("Unknown Article")
                    .to_string(),
                timestamp: Utc::now(),
                bias_score,
                sources,
            },
        );
        history.truncate(MAX_HISTORY);
        self.store
            .set(HISTORY_KEY, serde_json::to_value(&history)?)
            .await
    }

    pub async fn get_history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .store
            .get(HISTORY_KEY)
            .await?
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default())
    }

    pub async fn clear_history(&self) -> Result<()> {
        let _guard = self.history_lock.lock().await;
        self.store.remove(HISTORY_KEY).await?;
        info!("🗑️ Cleared analysis history");
        Ok(())
    }

    pub async fn save_state(&self, state: &AnalysisState) -> Result<()> {
        self.store.set(STATE_KEY, serde_json::to_value(state)?).await
    }

    pub async fn get_state(&self) -> Result<AnalysisState> {
        Ok(self
            .store
            .get(STATE_KEY)
            .await?
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_else(AnalysisState::idle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use nn_core::AnalysisStatus;
    use serde_json::{json, Value};

    fn manager() -> (StorageManager, MemoryStore) {
        let store = MemoryStore::new();
        (StorageManager::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_cache_round_trip_within_ttl() {
        let (storage, _) = manager();
        let data = json!({"biasScore": 0.42, "loadedWords": ["crisis"], "nested": {"a": [1, 2, 3]}});
        storage
            .cache_analysis(CacheKind::Bias, "https://a.com/x", &data)
            .await
            .unwrap();

        let cached: Option<Value> = storage
            .get_cached_analysis(CacheKind::Bias, "https://a.com/x")
            .await
            .unwrap();
        let cached = cached.unwrap();
        assert_eq!(cached, data);
        assert_eq!(cached.to_string(), data.to_string());
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent_and_deleted() {
        let (storage, store) = manager();
        let key = CacheKind::Summary.key("https://a.com/x");
        let stale = CacheEntry {
            data: json!({"summary": "old"}),
            timestamp: Utc::now() - Duration::hours(2),
            url: "https://a.com/x".to_string(),
        };
        store.set(&key, serde_json::to_value(&stale).unwrap()).await.unwrap();

        let cached: Option<Value> = storage
            .get_cached_analysis(CacheKind::Summary, "https://a.com/x")
            .await
            .unwrap();
        assert!(cached.is_none());
        assert_eq!(store.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cache_kinds_do_not_collide() {
        let (storage, _) = manager();
        storage.cache_analysis(CacheKind::Bias, "u", &json!(1)).await.unwrap();
        storage.cache_analysis(CacheKind::Summary, "u", &json!(2)).await.unwrap();

        let bias: Option<i64> = storage.get_cached_analysis(CacheKind::Bias, "u").await.unwrap();
        let summary: Option<i64> = storage.get_cached_analysis(CacheKind::Summary, "u").await.unwrap();
        assert_eq!(bias, Some(1));
        assert_eq!(summary, Some(2));
    }

    #[tokio::test]
    async fn test_clear_all_cache_keeps_other_keys() {
        let (storage, store) = manager();
        storage.cache_analysis(CacheKind::Bias, "a", &json!(1)).await.unwrap();
        storage.cache_analysis(CacheKind::Narrative, "b", &json!(2)).await.unwrap();
        storage.add_to_history("a", Some("A"), 0.1, 1).await.unwrap();

        assert_eq!(storage.clear_all_cache().await.unwrap(), 2);
        assert_eq!(store.len().await, 1);
        assert_eq!(storage.get_history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_capped() {
        let (storage, _) = manager();
        for i in 0..(MAX_HISTORY + 5) {
            storage
                .add_to_history(&format!("https://a.com/{}", i), Some("Story"), 0.5, 2)
                .await
                .unwrap();
        }
        let history = storage.get_history().await.unwrap();
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history[0].url, format!("https://a.com/{}", MAX_HISTORY + 4));
        assert_eq!(history[MAX_HISTORY - 1].url, "https://a.com/5");

        storage.add_to_history("https://b.com", None, 0.0, 1).await.unwrap();
        assert_eq!(storage.get_history().await.unwrap()[0].title, "Unknown Article");

        storage.clear_history().await.unwrap();
        assert!(storage.get_history().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_history_appends_are_kept() {
        let (storage, _) = manager();
        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    let url = format!("https://a.com/{}", i);
                    storage.add_to_history(&url, Some("t"), 0.1, 2).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let history = storage.get_history().await.unwrap();
        assert_eq!(history.len(), 20);
        let urls: std::collections::HashSet<_> = history.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls.len(), 20);
    }

    #[tokio::test]
    async fn test_related_articles_expire() {
        let (storage, _) = manager();
        let articles = vec![Article::new("https://b.com/1", "B", "body", None)];
        storage.save_related_articles("https://a.com/x", &articles).await.unwrap();
        assert_eq!(
            storage.get_related_articles("https://a.com/x").await.unwrap(),
            Some(articles.clone())
        );

        let storage = storage.with_ttl(Duration::seconds(-1));
        assert_eq!(storage.get_related_articles("https://a.com/x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_preferences_default_and_save() {
        let (storage, _) = manager();
        let prefs = storage.get_preferences().await.unwrap();
        assert_eq!(prefs, UserPreferences::default());
        assert_eq!(prefs.min_sources, 3);

        let updated = UserPreferences {
            min_sources: 4,
            preferred_sources: vec!["Reuters".into()],
            ..prefs
        };
        storage.save_preferences(&updated).await.unwrap();
        assert_eq!(storage.get_preferences().await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_state_defaults_to_idle() {
        let (storage, _) = manager();
        assert_eq!(storage.get_state().await.unwrap().status, AnalysisStatus::Idle);

        storage
            .save_state(&AnalysisState::failed(Some("https://a.com".into()), "boom"))
            .await
            .unwrap();
        let state = storage.get_state().await.unwrap();
        assert_eq!(state.status, AnalysisStatus::Error);
        assert_eq!(state.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_storage_stats() {
        let (storage, _) = manager();
        storage.cache_analysis(CacheKind::Bias, "a", &json!("x".repeat(1024))).await.unwrap();
        let stats = storage.get_storage_stats().await.unwrap();
        assert!(stats.bytes_used > 1024);
        assert_eq!(stats.megabytes_used, "0.00");
        assert_eq!(stats.quota_mb, 10);
    }
}
