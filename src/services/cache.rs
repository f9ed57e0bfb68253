//! Response Cache
//!
//! TTL cache in front of every GitHub read. Redis is the production
//! backend; an in-memory store is used when no Redis URL is configured.
//!
//! `CacheService::get_or_fetch` implements cache-aside:
//! - On read: check the store, fall back to the fetch closure on a miss
//! - Populate the store with the fetched value and its TTL
//! - Store failures are logged and treated as misses; fetch failures
//!   propagate and are never cached

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::Config;

/// Keys scanned per SCAN round trip during prefix invalidation
const SCAN_BATCH: usize = 100;

/// Root of every cache key
const KEY_ROOT: &str = "gitfolio";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

// ============================================================================
// Store Backends
// ============================================================================

/// Key/value store with per-entry expiry
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Delete every key starting with `prefix`, returning how many were removed
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError>;

    /// Delete every key owned by this service, across all namespaces
    async fn clear(&self) -> Result<usize, CacheError> {
        self.delete_prefix(&format!("{KEY_ROOT}:")).await
    }

    async fn ping(&self) -> Result<(), CacheError>;

    fn backend_name(&self) -> &'static str;
}

/// Redis-backed store
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Duration::from_millis(500));

        let client = redis::Client::open(redis_url)?;
        let connection = client.get_connection_manager_with_config(config).await?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await?;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let mut conn = self.connection.clone();
        let pattern = format!("{}*", escape_glob(prefix));

        let mut cursor: u64 = 0;
        let mut deleted = 0usize;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                deleted += conn.del::<_, usize>(&keys).await?;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

/// Escape Redis glob metacharacters so a prefix matches literally
fn escape_glob(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    inserted_at: Instant,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-process store with TTL and an entry cap
pub struct MemoryCache {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    max_entries: usize,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn evict_oldest(entries: &mut HashMap<String, MemoryEntry>, count: usize) {
        if count == 0 {
            return;
        }

        let mut sorted: Vec<_> = entries.iter().collect();
        sorted.sort_by_key(|(_, v)| v.inserted_at);

        let keys_to_remove: Vec<String> = sorted
            .iter()
            .take(count)
            .map(|(k, _)| (*k).clone())
            .collect();

        for key in keys_to_remove {
            entries.remove(&key);
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        if !entries.contains_key(key) && entries.len() >= self.max_entries {
            entries.retain(|_, v| !v.is_expired());

            if entries.len() >= self.max_entries {
                let to_evict = entries.len() - self.max_entries + 1;
                Self::evict_oldest(&mut entries, to_evict);
            }
        }

        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                inserted_at: now,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        Ok(before - entries.len())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Build the configured store: Redis when a URL is set, memory otherwise
pub async fn build_store(config: &Config) -> Result<Arc<dyn CacheStore>, CacheError> {
    match &config.redis_url {
        Some(url) => {
            let store = RedisCache::connect(url).await?;
            info!("Redis cache connected");
            Ok(Arc::new(store))
        }
        None => {
            info!(
                max_entries = config.memory_cache_max_entries,
                "REDIS_URL not set, using in-memory cache"
            );
            Ok(Arc::new(MemoryCache::new(config.memory_cache_max_entries)))
        }
    }
}

// ============================================================================
// Cache Metrics
// ============================================================================

#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

impl CacheMetrics {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Calculate hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hit_count();
        let total = hits + self.miss_count();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

/// Counters as served by `GET /v1/cache/stats`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub backend: String,
    pub namespace: String,
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub hit_rate: f64,
}

// ============================================================================
// CacheService - Cache-Aside Wrapper
// ============================================================================

/// Whether a value came from the cache or from GitHub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: T,
    pub status: CacheStatus,
}

impl<T> Cached<T> {
    /// Transform the value, keeping the cache status
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Cached<U> {
        Cached {
            value: f(self.value),
            status: self.status,
        }
    }
}

/// Namespaced cache-aside access to a `CacheStore`
#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn CacheStore>,
    namespace: String,
    metrics: Arc<CacheMetrics>,
}

impl CacheService {
    /// Keys are namespaced per GitHub login: `gitfolio:{login}:{key}`
    pub fn new(store: Arc<dyn CacheStore>, login: &str) -> Self {
        Self {
            store,
            namespace: format!("{KEY_ROOT}:{}:", login.to_lowercase()),
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    pub fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Return the cached value for `key`, or run `fetch` and cache its result
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<Cached<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let full_key = self.full_key(key);

        match self.store.get(&full_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    self.metrics.record_hit();
                    debug!(key = %full_key, "Cache hit");
                    return Ok(Cached {
                        value,
                        status: CacheStatus::Hit,
                    });
                }
                Err(e) => {
                    warn!(key = %full_key, error = %e, "Discarding undecodable cache entry");
                }
            },
            Ok(None) => {}
            Err(e) => {
                self.metrics.record_error();
                warn!(key = %full_key, error = %e, "Cache read failed, fetching from GitHub");
            }
        }

        self.metrics.record_miss();
        debug!(key = %full_key, "Cache miss");

        let value = fetch().await?;

        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(e) = self.store.set(&full_key, &raw, ttl).await {
                    self.metrics.record_error();
                    warn!(key = %full_key, error = %e, "Cache write failed");
                }
            }
            Err(e) => {
                self.metrics.record_error();
                warn!(key = %full_key, error = %e, "Failed to serialize value for cache");
            }
        }

        Ok(Cached {
            value,
            status: CacheStatus::Miss,
        })
    }

    /// Remove every key in this namespace starting with `prefix`
    pub async fn invalidate_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let full_prefix = self.full_key(prefix);
        let count = self.store.delete_prefix(&full_prefix).await?;
        debug!(prefix = %full_prefix, invalidated = count, "Cache prefix invalidated");
        Ok(count)
    }

    /// Remove every key in this namespace
    pub async fn clear(&self) -> Result<usize, CacheError> {
        let count = self.store.delete_prefix(&self.namespace).await?;
        info!(namespace = %self.namespace, cleared = count, "Cache cleared");
        Ok(count)
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        self.store.ping().await
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            backend: self.store.backend_name().to_string(),
            namespace: self.namespace.clone(),
            hits: self.metrics.hit_count(),
            misses: self.metrics.miss_count(),
            errors: self.metrics.error_count(),
            hit_rate: self.metrics.hit_rate(),
        }
    }
}
