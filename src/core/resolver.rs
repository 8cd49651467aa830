//! Signature resolution for a whole format list

use crate::error::RytError;
use crate::platform::cipher::ExtractedAlgorithm;
use crate::platform::formats::{resolve_formats, RawFormat, ResolvedFormat};
use crate::platform::player::{find_player_script_url, ScriptFetcher, ScriptSource};
use crate::utils::cache::AlgorithmCache;
use crate::utils::url::is_player_script_url;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turns raw formats into playable URLs, fetching and caching player scripts
/// as needed.
///
/// An extraction failure fails the whole request. A format whose descriptor
/// is malformed only fails its own entry.
pub struct SignatureResolver<F: ScriptFetcher> {
    fetcher: F,
    cache: AlgorithmCache,
}

impl<F: ScriptFetcher> SignatureResolver<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_cache(fetcher, AlgorithmCache::new())
    }

    /// Share an existing cache between resolvers
    pub fn with_cache(fetcher: F, cache: AlgorithmCache) -> Self {
        Self { fetcher, cache }
    }

    pub fn cache(&self) -> &AlgorithmCache {
        &self.cache
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch a watch page and locate its player script
    pub async fn discover_script_url(&self, page_url: &str) -> Result<String, RytError> {
        let html = self.fetcher.fetch_page(page_url).await?;
        let script_url = find_player_script_url(&html, page_url)?;
        if !is_player_script_url(&script_url) {
            warn!("{} does not look like a player script", script_url);
        }
        Ok(script_url)
    }

    pub async fn fetch_script(&self, script_url: &str) -> Result<ScriptSource, RytError> {
        self.fetcher.fetch_script(script_url).await
    }

    /// Algorithm for a script URL, fetching the script only on a cache miss
    pub async fn algorithm_for(&self, script_url: &str) -> Result<Arc<ExtractedAlgorithm>, RytError> {
        if let Some(algorithm) = self.cache.get(script_url).await {
            debug!("Using cached algorithm for {}", script_url);
            return Ok(algorithm);
        }

        let source = self.fetch_script(script_url).await?;
        self.algorithm_for_source(&source).await
    }

    pub async fn algorithm_for_source(
        &self,
        source: &ScriptSource,
    ) -> Result<Arc<ExtractedAlgorithm>, RytError> {
        self.cache.get_or_extract(source).await
    }

    /// Resolve formats whose ciphers come from the script at `script_url`
    pub async fn resolve(
        &self,
        script_url: &str,
        formats: &[RawFormat],
    ) -> Result<Vec<ResolvedFormat>, RytError> {
        if !formats.iter().any(RawFormat::needs_decipher) {
            debug!("No format needs deciphering, skipping player script");
            return Ok(resolve_formats(formats, &ExtractedAlgorithm::default()));
        }

        let algorithm = self.algorithm_for(script_url).await?;
        Ok(self.finish(formats, &algorithm))
    }

    /// Resolve formats against an already loaded script
    pub async fn resolve_with_source(
        &self,
        source: &ScriptSource,
        formats: &[RawFormat],
    ) -> Result<Vec<ResolvedFormat>, RytError> {
        if !formats.iter().any(RawFormat::needs_decipher) {
            return Ok(resolve_formats(formats, &ExtractedAlgorithm::default()));
        }

        let algorithm = self.algorithm_for_source(source).await?;
        Ok(self.finish(formats, &algorithm))
    }

    fn finish(&self, formats: &[RawFormat], algorithm: &ExtractedAlgorithm) -> Vec<ResolvedFormat> {
        let resolved = resolve_formats(formats, algorithm);
        info!(
            "Resolved {}/{} formats with player {}",
            resolved.iter().filter(|f| f.is_resolved()).count(),
            resolved.len(),
            algorithm.script_id.as_deref().unwrap_or("<unknown>")
        );
        resolved
    }
}
