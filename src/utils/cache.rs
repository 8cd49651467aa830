//! Caching of extracted cipher algorithms

use crate::error::RytError;
use crate::platform::cipher::ExtractedAlgorithm;
use crate::platform::player::ScriptSource;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Read-through cache of extracted algorithms keyed by script URL.
///
/// Entries are never overwritten: an insert for a key that already holds a
/// different operation sequence is reported as [`RytError::CacheConflict`].
#[derive(Clone)]
pub struct AlgorithmCache {
    algorithms: Cache<String, Arc<ExtractedAlgorithm>>,
}

impl AlgorithmCache {
    /// Create a cache with a 1 hour TTL
    pub fn new() -> Self {
        Self::with_settings(Duration::from_secs(3600), 64)
    }

    pub fn with_settings(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            algorithms: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(max_capacity)
                .build(),
        }
    }

    /// Get a cached algorithm
    pub async fn get(&self, script_url: &str) -> Option<Arc<ExtractedAlgorithm>> {
        self.algorithms.get(script_url).await
    }

    /// Return the cached algorithm for `source`, extracting it on a miss.
    ///
    /// Concurrent callers for the same URL share a single extraction. Failed
    /// extractions are not cached.
    pub async fn get_or_extract(
        &self,
        source: &ScriptSource,
    ) -> Result<Arc<ExtractedAlgorithm>, RytError> {
        self.algorithms
            .try_get_with(source.url.clone(), async {
                debug!("Algorithm cache miss for {}", source.url);
                source.extract().map(Arc::new)
            })
            .await
            .map_err(|e| RytError::Extraction((*e).clone()))
    }

    /// Insert unless an entry exists; an existing entry must agree
    pub async fn insert(
        &self,
        script_url: &str,
        algorithm: ExtractedAlgorithm,
    ) -> Result<Arc<ExtractedAlgorithm>, RytError> {
        let candidate = Arc::new(algorithm);
        let entry = self
            .algorithms
            .entry(script_url.to_string())
            .or_insert(candidate.clone())
            .await;

        if entry.is_fresh() {
            return Ok(entry.into_value());
        }

        let existing = entry.into_value();
        if existing.same_operations(&candidate) {
            Ok(existing)
        } else {
            error!(
                "Conflicting algorithms for {}: cached {:?}, new {:?}",
                script_url, existing.operations, candidate.operations
            );
            Err(RytError::CacheConflict {
                script: script_url.to_string(),
            })
        }
    }

    /// Drop every cached algorithm
    pub fn clear(&self) {
        self.algorithms.invalidate_all();
    }
}

impl Default for AlgorithmCache {
    fn default() -> Self {
        Self::new()
    }
}
