//! Parsing of `signatureCipher` blobs

use crate::error::ParseError;

/// Query parameter name used when a descriptor carries no `sp`
pub const DEFAULT_SIGNATURE_PARAM: &str = "signature";

/// The decoded parts of a protected format's cipher blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureCipherDescriptor {
    pub obfuscated_signature: String,
    pub signature_param_name: String,
    pub base_url: String,
}

/// Parse `s=...&sp=...&url=...` into its three components.
///
/// Values are percent-decoded. `s` and `url` are required; `sp` defaults to
/// [`DEFAULT_SIGNATURE_PARAM`]. The first occurrence of a repeated key wins.
pub fn parse_cipher_descriptor(blob: &str) -> Result<SignatureCipherDescriptor, ParseError> {
    let mut signature: Option<String> = None;
    let mut param: Option<String> = None;
    let mut base_url: Option<String> = None;

    for (key, value) in url::form_urlencoded::parse(blob.as_bytes()) {
        let slot = match &*key {
            "s" => &mut signature,
            "sp" => &mut param,
            "url" => &mut base_url,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value.into_owned());
        }
    }

    Ok(SignatureCipherDescriptor {
        obfuscated_signature: signature.ok_or(ParseError::MissingField("s"))?,
        signature_param_name: param
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_SIGNATURE_PARAM.to_string()),
        base_url: base_url.ok_or(ParseError::MissingField("url"))?,
    })
}
