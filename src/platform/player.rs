//! Player script discovery and retrieval

use crate::error::RytError;
use crate::platform::cipher::{extract, ExtractedAlgorithm};
use crate::utils::url::player_id;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;

static JS_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r#""jsUrl"\s*:\s*"(?P<url>[^"]+)""#).unwrap());

static PLAYER_JS_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""PLAYER_JS_URL"\s*:\s*"(?P<url>[^"]+)""#).unwrap());

static BASE_JS_SCRIPT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<script[^>]+src\s*=\s*["'](?P<url>[^"']*/base\.js(?:\?[^"']*)?)["']"#).unwrap()
});

/// The text of a player script together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSource {
    pub url: String,
    pub text: String,
}

impl ScriptSource {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }

    /// Player deployment id, when the URL carries one
    pub fn player_id(&self) -> Option<&str> {
        player_id(&self.url)
    }

    /// Identity recorded on extracted algorithms
    pub fn identity(&self) -> &str {
        self.player_id().unwrap_or(&self.url)
    }

    /// Extract the cipher of this script
    pub fn extract(&self) -> Result<ExtractedAlgorithm, crate::error::ExtractionError> {
        let algorithm = extract(&self.text)?.with_script_id(self.identity());
        debug!(
            "Extracted {} operations from {}",
            algorithm.operations.len(),
            self.identity()
        );
        Ok(algorithm)
    }
}

/// Locate the player script referenced by a watch page.
///
/// Relative references are resolved against `page_url`.
pub fn find_player_script_url(html: &str, page_url: &str) -> Result<String, RytError> {
    let found = [&*JS_URL, &*PLAYER_JS_URL, &*BASE_JS_SCRIPT_TAG]
        .iter()
        .find_map(|pattern| pattern.captures(html).and_then(|caps| caps.name("url")))
        .map(|m| m.as_str().replace("\\/", "/"))
        .ok_or(RytError::PlayerScriptNotFound)?;

    let base = Url::parse(page_url)?;
    let resolved = base.join(&found)?;
    debug!("Player script for {}: {}", page_url, resolved);
    Ok(resolved.to_string())
}

/// Source of player scripts and watch pages
#[async_trait]
pub trait ScriptFetcher: Send + Sync {
    /// Fetch a resource as text
    async fn fetch_text(&self, url: &str) -> Result<String, RytError>;

    async fn fetch_script(&self, url: &str) -> Result<ScriptSource, RytError> {
        let text = self.fetch_text(url).await?;
        Ok(ScriptSource::new(url, text))
    }

    async fn fetch_page(&self, url: &str) -> Result<String, RytError> {
        self.fetch_text(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATCH_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    #[test]
    fn test_player_id_and_identity() {
        let source = ScriptSource::new(
            "https://www.youtube.com/s/player/9f2a01bc/player_ias.vflset/en_US/base.js",
            "",
        );
        assert_eq!(source.player_id(), Some("9f2a01bc"));
        assert_eq!(source.identity(), "9f2a01bc");

        let local = ScriptSource::new("fixtures/base.js", "");
        assert_eq!(local.player_id(), None);
        assert_eq!(local.identity(), "fixtures/base.js");
    }

    #[test]
    fn test_extract_records_identity() {
        let script = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/base.js"));
        let source = ScriptSource::new("/s/player/0123abcd/player_ias.vflset/en_US/base.js", script);
        let algorithm = source.extract().unwrap();
        assert_eq!(algorithm.script_id.as_deref(), Some("0123abcd"));
        assert_eq!(algorithm.operations.len(), 4);
    }

    #[test]
    fn test_find_from_js_url() {
        let html = r#"<script>ytcfg.set({"jsUrl":"\/s\/player\/0123abcd\/player_ias.vflset\/en_US\/base.js","LOGGED_IN":false});</script>"#;
        assert_eq!(
            find_player_script_url(html, WATCH_URL).unwrap(),
            "https://www.youtube.com/s/player/0123abcd/player_ias.vflset/en_US/base.js"
        );
    }

    #[test]
    fn test_find_from_player_js_url() {
        let html = r#"{"PLAYER_JS_URL":"/s/player/77aa88bb/player_ias.vflset/de_DE/base.js"}"#;
        assert_eq!(
            find_player_script_url(html, WATCH_URL).unwrap(),
            "https://www.youtube.com/s/player/77aa88bb/player_ias.vflset/de_DE/base.js"
        );
    }

    #[test]
    fn test_find_from_script_tag() {
        let html = r#"<html><head><script src="/s/player/55cc66dd/player_ias.vflset/en_US/base.js" nonce="x"></script></head></html>"#;
        assert_eq!(
            find_player_script_url(html, WATCH_URL).unwrap(),
            "https://www.youtube.com/s/player/55cc66dd/player_ias.vflset/en_US/base.js"
        );
    }

    #[test]
    fn test_js_url_preferred() {
        let html = r#"<script src="/s/player/aaaa0000/player_ias.vflset/en_US/base.js"></script>{"jsUrl":"/s/player/bbbb1111/player_ias.vflset/en_US/base.js"}"#;
        let url = find_player_script_url(html, WATCH_URL).unwrap();
        assert!(url.contains("bbbb1111"));
    }

    #[test]
    fn test_absolute_reference_kept() {
        let html = r#""jsUrl":"https://cdn.example.com/s/player/0123abcd/base.js""#;
        assert_eq!(
            find_player_script_url(html, WATCH_URL).unwrap(),
            "https://cdn.example.com/s/player/0123abcd/base.js"
        );
    }

    struct StaticFetcher;

    #[async_trait]
    impl ScriptFetcher for StaticFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String, RytError> {
            Ok(format!("// {}", url))
        }
    }

    #[test]
    fn test_default_fetch_methods() {
        let source = tokio_test::block_on(StaticFetcher.fetch_script("/s/player/0123abcd/base.js")).unwrap();
        assert_eq!(source.url, "/s/player/0123abcd/base.js");
        assert_eq!(source.text, "// /s/player/0123abcd/base.js");

        let page = tokio_test::block_on(StaticFetcher.fetch_page(WATCH_URL)).unwrap();
        assert_eq!(page, format!("// {}", WATCH_URL));
    }

    #[test]
    fn test_not_found() {
        let html = "<html><body>no player here</body></html>";
        assert!(matches!(
            find_player_script_url(html, WATCH_URL),
            Err(RytError::PlayerScriptNotFound)
        ));
    }
}
