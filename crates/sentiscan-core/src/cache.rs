//! Short-lived response cache keyed by request URL.
//!
//! A trending scan followed by per-symbol discussion lookups reads the same
//! community listings many times; caching them for a short TTL keeps the
//! request volume (and the politeness waits) proportional to the number of
//! distinct listings rather than the number of lookups.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CachedBody {
    body: String,
    expires_at: Instant,
}

/// Thread-safe TTL cache for upstream response bodies.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    entries: Arc<RwLock<HashMap<String, CachedBody>>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_disabled(&self) -> bool {
        self.ttl.is_zero()
    }

    /// Returns the cached body if present and not yet expired.
    pub async fn get(&self, url: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries
            .get(url)
            .filter(|entry| Instant::now() <= entry.expires_at)
            .map(|entry| entry.body.clone())
    }

    pub async fn put(&self, url: impl Into<String>, body: impl Into<String>) {
        if self.is_disabled() {
            return;
        }

        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            url.into(),
            CachedBody {
                body: body.into(),
                expires_at: now + self.ttl,
            },
        );
    }

    /// Number of stored entries, expired ones included until the next write.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
