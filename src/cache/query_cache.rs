use serde_json::json;
use std::collections::HashMap;
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::hashing::sha256_hex;
use crate::models::{RecommendationQuery, RecommendationResult};

const DEFAULT_TTL: Duration = Duration::from_secs(3600); // 1 hour
const DEFAULT_CAPACITY: usize = 100;

/// Cache key derived from the normalized query text, count and filters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(query: &RecommendationQuery) -> Self {
        let filters = &query.filters;
        let canonical = json!({
            "query": query.text.trim().to_lowercase(),
            "count": query.requested_count,
            "language": filters.language.map(|v| v.to_string()),
            "target_audience": filters.target_audience.map(|v| v.to_string()),
            "book_type": filters.book_type.map(|v| v.to_string()),
            "content_type": filters.content_type.map(|v| v.to_string()),
            "reading_level": filters.reading_level.map(|v| v.to_string()),
        });
        Self(sha256_hex(&canonical.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "recs:{}", self.0)
    }
}

/// A cached result with its creation time
#[derive(Debug, Clone)]
struct CacheEntry {
    fingerprint: Fingerprint,
    result: RecommendationResult,
    created_at: Instant,
    /// Breaks ties between entries created at the same instant
    sequence: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<Fingerprint, CacheEntry>,
    next_sequence: u64,
}

/// TTL-bounded, capacity-bounded cache of recommendation results.
///
/// All reads, writes and evictions go through one mutex, so `get`+evict and
/// `put`+evict are each atomic with respect to concurrent requests. Entries
/// are only ever written with fully assembled results.
#[derive(Debug)]
pub struct QueryCache {
    state: Mutex<CacheState>,
    ttl: Duration,
    capacity: usize,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

impl QueryCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Returns a cached result, evicting it instead if it has outlived the TTL
    pub async fn get(&self, fingerprint: &Fingerprint) -> Option<RecommendationResult> {
        let mut state = self.state.lock().await;

        let expired = match state.entries.get(fingerprint) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => {
                return Some(entry.result.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            state.entries.remove(fingerprint);
            tracing::debug!(fingerprint = %fingerprint, "Evicted expired cache entry");
        }

        None
    }

    /// Inserts or overwrites a result, evicting the oldest entry on overflow
    pub async fn put(&self, fingerprint: Fingerprint, result: RecommendationResult) {
        let mut state = self.state.lock().await;

        let sequence = state.next_sequence;
        state.next_sequence += 1;

        state.entries.insert(
            fingerprint.clone(),
            CacheEntry {
                fingerprint,
                result,
                created_at: Instant::now(),
                sequence,
            },
        );

        if state.entries.len() > self.capacity {
            let oldest = state
                .entries
                .values()
                .min_by_key(|entry| (entry.created_at, entry.sequence))
                .map(|entry| entry.fingerprint.clone());

            if let Some(oldest) = oldest {
                state.entries.remove(&oldest);
                tracing::debug!(fingerprint = %oldest, "Evicted oldest cache entry");
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
