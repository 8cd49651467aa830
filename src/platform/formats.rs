//! Raw stream formats and their resolution into playable URLs

use crate::error::{ParseError, RytError};
use crate::platform::cipher::{parse_cipher_descriptor, ExtractedAlgorithm};
use crate::utils::url::append_query_param;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A stream variant as described by the hosting page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFormat {
    #[serde(default)]
    pub itag: Option<u32>,
    #[serde(default)]
    pub mime_type: String,
    /// Present on video variants (e.g. "720p")
    #[serde(default)]
    pub quality_label: Option<String>,
    /// Present on audio variants (e.g. "AUDIO_QUALITY_MEDIUM")
    #[serde(default)]
    pub audio_quality: Option<String>,
    /// Directly playable URL
    #[serde(default)]
    pub url: Option<String>,
    /// Percent-encoded cipher descriptor, for protected variants
    #[serde(default, alias = "cipher")]
    pub signature_cipher: Option<String>,
}

impl RawFormat {
    /// Whether this format can only be played after deciphering
    pub fn needs_decipher(&self) -> bool {
        self.url.is_none() && self.signature_cipher.is_some()
    }

    pub fn has_video(&self) -> bool {
        self.quality_label.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio_quality.is_some()
    }

    /// Quality label, falling back to the audio quality
    pub fn quality(&self) -> &str {
        self.quality_label
            .as_deref()
            .or(self.audio_quality.as_deref())
            .unwrap_or_default()
    }

    /// Parse a format list from JSON.
    ///
    /// Accepts a bare array of formats or a player response object, in which
    /// case `streamingData.formats` are followed by
    /// `streamingData.adaptiveFormats`.
    pub fn parse_list(json: &str) -> Result<Vec<RawFormat>, RytError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.is_array() {
            return Ok(serde_json::from_value(value)?);
        }

        let streaming = value
            .get("streamingData")
            .ok_or_else(|| RytError::InvalidInput("expected a format array or streamingData".to_string()))?;

        let mut formats = Vec::new();
        for key in ["formats", "adaptiveFormats"] {
            if let Some(list) = streaming.get(key) {
                let parsed: Vec<RawFormat> = serde_json::from_value(list.clone())?;
                formats.extend(parsed);
            }
        }
        Ok(formats)
    }
}

/// A format with its final URL, or the reason it has none
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFormat {
    pub quality: String,
    pub mime_type: String,
    pub url: Option<String>,
    pub has_audio: bool,
    pub has_video: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolvedFormat {
    pub fn is_resolved(&self) -> bool {
        self.url.is_some()
    }
}

/// Playable URL for one format
pub fn resolve_url(format: &RawFormat, algorithm: &ExtractedAlgorithm) -> Result<String, ParseError> {
    if let Some(url) = &format.url {
        return Ok(url.clone());
    }

    let blob = format
        .signature_cipher
        .as_deref()
        .ok_or(ParseError::NoStreamSource)?;
    let descriptor = parse_cipher_descriptor(blob)?;
    let signature = algorithm.apply(&descriptor.obfuscated_signature);
    Ok(append_query_param(
        &descriptor.base_url,
        &descriptor.signature_param_name,
        &signature,
    ))
}

/// Resolve one format; failures are recorded on the entry
pub fn resolve_format(format: &RawFormat, algorithm: &ExtractedAlgorithm) -> ResolvedFormat {
    let (url, error) = match resolve_url(format, algorithm) {
        Ok(url) => (Some(url), None),
        Err(e) => {
            warn!(itag = ?format.itag, "Format could not be resolved: {}", e);
            (None, Some(e.to_string()))
        }
    };

    ResolvedFormat {
        quality: format.quality().to_string(),
        mime_type: format.mime_type.clone(),
        url,
        has_audio: format.has_audio(),
        has_video: format.has_video(),
        error,
    }
}

/// Resolve every format, one output entry per input entry, in input order
pub fn resolve_formats(formats: &[RawFormat], algorithm: &ExtractedAlgorithm) -> Vec<ResolvedFormat> {
    let resolved: Vec<ResolvedFormat> = formats
        .iter()
        .map(|format| resolve_format(format, algorithm))
        .collect();
    debug!(
        "Resolved {}/{} formats",
        resolved.iter().filter(|f| f.is_resolved()).count(),
        resolved.len()
    );
    resolved
}
