//! HTTP client for player scripts and watch pages

use crate::error::RytError;
use crate::platform::player::ScriptFetcher;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Desktop browser user agent; the platform serves the desktop player to it
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// User agent string
    pub user_agent: Option<String>,
    /// Proxy URL
    pub proxy_url: Option<String>,
    /// Delay before the first retry, doubled on each further retry
    pub retry_base_delay: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            user_agent: None,
            proxy_url: None,
            retry_base_delay: Duration::from_millis(200),
        }
    }
}

/// Fetches player scripts and watch pages over HTTP
pub struct HttpScriptFetcher {
    client: Client,
    config: HttpClientConfig,
}

impl HttpScriptFetcher {
    /// Create a fetcher with default configuration
    pub fn new() -> Result<Self, RytError> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a fetcher with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self, RytError> {
        let mut builder = ClientBuilder::new()
            .timeout(config.timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT));

        if let Some(proxy_url) = &config.proxy_url {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// Get client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    fn create_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("Accept", "*/*")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Cache-Control", "no-cache")
    }

    async fn fetch_once(&self, url: &str) -> Result<String, RytError> {
        let response = self.create_request(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RytError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }

    /// Execute request with retry logic
    async fn fetch_with_retry(&self, url: &str) -> Result<String, RytError> {
        let mut delay = self.config.retry_base_delay;
        let mut attempt = 0;

        loop {
            debug!(
                "HTTP request attempt {}/{} for {}",
                attempt + 1,
                self.config.max_retries + 1,
                url
            );

            match self.fetch_once(url).await {
                Ok(body) => {
                    debug!("Fetched {} bytes from {}", body.len(), url);
                    return Ok(body);
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    warn!("Request to {} failed ({}), retrying in {:?}", url, e, delay);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => {
                    error!("Request to {} failed: {}", url, e);
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl ScriptFetcher for HttpScriptFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, RytError> {
        self.fetch_with_retry(url).await
    }
}
