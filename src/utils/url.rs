//! URL utilities for player scripts and stream URLs

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static PLAYER_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/s/player/(?P<id>[0-9a-zA-Z_-]+)/").unwrap());

/// Append `name=value` to the query of `base`.
///
/// The value is appended verbatim, matching how the platform expects the
/// deciphered signature.
pub fn append_query_param(base: &str, name: &str, value: &str) -> String {
    let separator = if base.ends_with('?') || base.ends_with('&') {
        ""
    } else if base.contains('?') {
        "&"
    } else {
        "?"
    };
    format!("{}{}{}={}", base, separator, name, value)
}

/// Deployment id of a player script URL (`/s/player/<id>/...`)
pub fn player_id(url: &str) -> Option<&str> {
    PLAYER_ID
        .captures(url)
        .and_then(|caps| caps.name("id"))
        .map(|m| m.as_str())
}

/// Check if URL points at a player script
pub fn is_player_script_url(url: &str) -> bool {
    let path = Url::parse(url)
        .map(|parsed| parsed.path().to_string())
        .unwrap_or_else(|_| url.split(['?', '#']).next().unwrap_or_default().to_string());
    path.contains("/s/player/") && path.ends_with(".js")
}

/// Check if string is an http(s) URL rather than a local path
pub fn is_remote(location: &str) -> bool {
    matches!(
        Url::parse(location).map(|u| u.scheme().to_string()).as_deref(),
        Ok("http") | Ok("https")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_query_param() {
        assert_eq!(
            append_query_param("https://a.example/v?itag=18", "sig", "XYZ"),
            "https://a.example/v?itag=18&sig=XYZ"
        );
        assert_eq!(
            append_query_param("https://a.example/v", "sig", "XYZ"),
            "https://a.example/v?sig=XYZ"
        );
        assert_eq!(
            append_query_param("https://a.example/v?", "signature", "A=B"),
            "https://a.example/v?signature=A=B"
        );
    }

    #[test]
    fn test_player_id() {
        assert_eq!(
            player_id("https://www.youtube.com/s/player/0123abcd/player_ias.vflset/en_US/base.js"),
            Some("0123abcd")
        );
        assert_eq!(player_id("/s/player/f3c4d5e6/tv-player-ias.vflset/tv-player-ias.js"), Some("f3c4d5e6"));
        assert_eq!(player_id("https://example.com/base.js"), None);
    }

    #[test]
    fn test_is_player_script_url() {
        assert!(is_player_script_url(
            "https://www.youtube.com/s/player/0123abcd/player_ias.vflset/en_US/base.js"
        ));
        assert!(is_player_script_url("/s/player/0123abcd/player_ias.vflset/en_US/base.js?v=1"));
        assert!(!is_player_script_url("https://www.youtube.com/s/desktop/0123abcd/jsbin/desktop_polymer.js/x"));
        assert!(!is_player_script_url("https://www.youtube.com/s/player/0123abcd/www-player.css"));
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://www.youtube.com/watch?v=x"));
        assert!(is_remote("http://localhost:8080/base.js"));
        assert!(!is_remote("./fixtures/base.js"));
        assert!(!is_remote("/tmp/base.js"));
        assert!(!is_remote("file:///tmp/base.js"));
    }
}
