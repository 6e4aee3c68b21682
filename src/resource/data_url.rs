//! `data:<media-type>;base64,<payload>` strings.
//!
//! The grammar is `^data:([^;]+);base64,(.*)$`: the media type is any run of
//! non-`;` characters and the payload is everything after `base64,` up to the
//! end of the line. Parsing never throws; a non-matching string yields `None`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use std::sync::OnceLock;

use super::Blob;
use crate::error::{Result, WatermarkError};

static DATA_URL: OnceLock<Regex> = OnceLock::new();

fn data_url_regex() -> &'static Regex {
    DATA_URL.get_or_init(|| {
        Regex::new(r"^data:([^;]+);base64,(.*)$").expect("data URL pattern is a valid regex")
    })
}

/// The two captured halves of a data URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUrlParts<'a> {
    pub media_type: &'a str,
    pub payload: &'a str,
}

/// Split a data URL into its media type and base64 payload.
pub fn split(data_url: &str) -> Option<DataUrlParts<'_>> {
    let caps = data_url_regex().captures(data_url)?;
    Some(DataUrlParts {
        media_type: caps.get(1)?.as_str(),
        payload: caps.get(2)?.as_str(),
    })
}

/// Decode a base64 payload.
pub fn decode(payload: &str) -> Result<Vec<u8>> {
    STANDARD.decode(payload).map_err(WatermarkError::decode)
}

/// Wrap raw bytes as a data URL of the given media type.
pub fn encode(bytes: &[u8], media_type: &str) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(bytes))
}

/// Turn a data URL into a [`Blob`].
///
/// Returns `None` when the string does not match the grammar or its payload
/// is not valid base64.
pub fn to_blob(data_url: &str) -> Option<Blob> {
    let parts = split(data_url)?;
    let bytes = decode(parts.payload).ok()?;
    Some(Blob::new(parts.media_type, bytes))
}
