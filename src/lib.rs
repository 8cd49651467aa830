//! # ryt-cipher - signature deciphering for protected streams
//!
//! Recovers the signature transformation embedded in a video player script
//! without executing it, and applies it to the ciphered formats of a player
//! response to produce playable URLs.
//!
//! ## Features
//!
//! - Static extraction with ordered fallback heuristics per stage
//! - Closed operation set (reverse, drop, swap) with total semantics
//! - Per-format failure isolation
//! - Player script discovery from watch pages
//! - Cached algorithms per player script
//!
//! ## Example
//!
//! ```rust,no_run
//! use ryt_cipher::core::SignatureResolver;
//! use ryt_cipher::platform::{HttpScriptFetcher, RawFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = SignatureResolver::new(HttpScriptFetcher::new()?);
//!     let script_url = resolver
//!         .discover_script_url("https://www.youtube.com/watch?v=VIDEO_ID")
//!         .await?;
//!
//!     let formats = RawFormat::parse_list(&std::fs::read_to_string("formats.json")?)?;
//!     for format in resolver.resolve(&script_url, &formats).await? {
//!         println!("{} {:?}", format.quality, format.url);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod platform;
pub mod utils;

// Re-export main types
pub use crate::core::SignatureResolver;
pub use crate::error::{ExtractionError, ExtractionStage, ParseError, RytError};
pub use crate::platform::cipher::{extract, ExtractedAlgorithm, Operation};
pub use crate::platform::{RawFormat, ResolvedFormat, ScriptSource};

/// Result type alias for ryt-cipher operations
pub type Result<T> = std::result::Result<T, RytError>;
