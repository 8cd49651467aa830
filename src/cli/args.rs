//! Command line argument parsing

use crate::error::RytError;
use crate::platform::client::HttpClientConfig;
use crate::platform::formats::RawFormat;
use crate::utils::url::is_remote;
use clap::{ArgGroup, Parser};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

/// Resolve protected stream URLs by deciphering their signatures
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("player").required(true).args(["script", "page"])))]
pub struct Args {
    /// Player script (local path or http(s) URL)
    #[arg(short, long, value_name = "PATH|URL")]
    pub script: Option<String>,

    /// Watch page URL used to discover the player script
    #[arg(short, long, value_name = "URL")]
    pub page: Option<String>,

    /// JSON format list, or '-' for stdin
    #[arg(short, long, value_name = "PATH|-")]
    pub formats: Option<PathBuf>,

    /// Print the extracted operation list instead of resolving formats
    #[arg(long)]
    pub print_algorithm: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// HTTP timeout (e.g., 30s, 1m)
    #[arg(long, value_name = "DURATION", default_value = "30s")]
    pub timeout: humantime::Duration,

    /// HTTP retries for transient errors
    #[arg(long, default_value = "3")]
    pub retries: u32,

    /// Override User-Agent header
    #[arg(long, value_name = "USER_AGENT")]
    pub user_agent: Option<String>,

    /// Proxy URL (http/https/socks)
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Quiet output (only errors)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Where the player script comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptLocation {
    File(PathBuf),
    Remote(String),
    /// Discover the script from a watch page
    Page(String),
}

impl Args {
    /// Get HTTP timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        self.timeout.into()
    }

    pub fn script_location(&self) -> Result<ScriptLocation, RytError> {
        match (&self.script, &self.page) {
            (Some(script), _) if is_remote(script) => Ok(ScriptLocation::Remote(script.clone())),
            (Some(script), _) => Ok(ScriptLocation::File(PathBuf::from(script))),
            (None, Some(page)) if is_remote(page) => Ok(ScriptLocation::Page(page.clone())),
            (None, Some(page)) => Err(RytError::InvalidInput(format!(
                "page must be an http(s) URL: {}",
                page
            ))),
            (None, None) => Err(RytError::InvalidInput(
                "either --script or --page is required".to_string(),
            )),
        }
    }

    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout: self.timeout_duration(),
            max_retries: self.retries,
            user_agent: self.user_agent.clone(),
            proxy_url: self.proxy.clone(),
            ..Default::default()
        }
    }

    /// Load the format list, if one was given
    pub fn read_formats(&self) -> Result<Option<Vec<RawFormat>>, RytError> {
        let Some(path) = &self.formats else {
            return Ok(None);
        };

        let json = if path.as_os_str() == "-" {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        } else {
            std::fs::read_to_string(path)?
        };
        RawFormat::parse_list(&json).map(Some)
    }

    /// Get output verbosity level
    pub fn verbosity_level(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    /// Default log filter when RUST_LOG is unset
    pub fn log_filter(&self) -> &'static str {
        match self.verbosity_level() {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "info",
            VerbosityLevel::Verbose => "debug",
        }
    }
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Quiet (only errors)
    Quiet,
    /// Normal
    Normal,
    /// Verbose (debug info)
    Verbose,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("ryt-cipher").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_args_default_values() {
        let args = parse(&["--script", "base.js"]);
        assert_eq!(args.timeout_duration(), Duration::from_secs(30));
        assert_eq!(args.retries, 3);
        assert!(!args.print_algorithm);
        assert!(!args.pretty);
        assert_eq!(args.formats, None);
        assert_eq!(args.verbosity_level(), VerbosityLevel::Normal);
    }

    #[test]
    fn test_script_or_page_required() {
        assert!(Args::try_parse_from(["ryt-cipher", "--formats", "f.json"]).is_err());
        assert!(Args::try_parse_from([
            "ryt-cipher",
            "--script",
            "base.js",
            "--page",
            "https://www.youtube.com/watch?v=x"
        ])
        .is_err());
    }

    #[test]
    fn test_script_location() {
        assert_eq!(
            parse(&["--script", "./player/base.js"]).script_location().unwrap(),
            ScriptLocation::File(PathBuf::from("./player/base.js"))
        );
        assert_eq!(
            parse(&["--script", "https://www.youtube.com/s/player/0123abcd/base.js"])
                .script_location()
                .unwrap(),
            ScriptLocation::Remote("https://www.youtube.com/s/player/0123abcd/base.js".to_string())
        );
        assert_eq!(
            parse(&["--page", "https://www.youtube.com/watch?v=x"])
                .script_location()
                .unwrap(),
            ScriptLocation::Page("https://www.youtube.com/watch?v=x".to_string())
        );
        assert!(parse(&["--page", "watch.html"]).script_location().is_err());
    }

    #[test]
    fn test_http_config() {
        let args = parse(&[
            "--script",
            "base.js",
            "--timeout",
            "1m",
            "--retries",
            "5",
            "--user-agent",
            "Custom Agent",
            "--proxy",
            "socks5://127.0.0.1:1080",
        ]);
        let config = args.http_config();
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.user_agent.as_deref(), Some("Custom Agent"));
        assert_eq!(config.proxy_url.as_deref(), Some("socks5://127.0.0.1:1080"));
    }

    #[test]
    fn test_args_verbosity_level() {
        assert_eq!(parse(&["-s", "b.js", "-q"]).verbosity_level(), VerbosityLevel::Quiet);
        assert_eq!(parse(&["-s", "b.js", "-v"]).verbosity_level(), VerbosityLevel::Verbose);
        assert_eq!(parse(&["-s", "b.js", "-v"]).log_filter(), "debug");
        assert_eq!(parse(&["-s", "b.js"]).log_filter(), "info");
        assert_eq!(parse(&["-s", "b.js", "-q"]).log_filter(), "error");
        assert!(Args::try_parse_from(["ryt-cipher", "-s", "b.js", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_read_formats_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"itag": 18, "mimeType": "video/mp4", "qualityLabel": "360p", "url": "https://a.example/v"}}]"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let args = parse(&["--script", "base.js", "--formats", &path]);
        let formats = args.read_formats().unwrap().unwrap();
        assert_eq!(formats.len(), 1);
        assert_eq!(formats[0].itag, Some(18));
    }

    #[test]
    fn test_read_formats_missing_file() {
        let args = parse(&["--script", "base.js", "--formats", "/nonexistent/formats.json"]);
        assert!(matches!(args.read_formats(), Err(RytError::IoError(_))));
        assert!(parse(&["--script", "base.js"]).read_formats().unwrap().is_none());
    }
}
