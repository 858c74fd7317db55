//! Media clips handed to the narrative generator for video assessment.
//!
//! Clips travel as data URIs: `data:<mimetype>;base64,<encoded_data>`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::errors::MediaError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoClip {
    mime_type: String,
    data_uri: String,
}

impl VideoClip {
    /// Encode raw bytes into a clip.
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Result<Self, MediaError> {
        let mime_type = validate_mime(mime_type)?;
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        let data_uri = format!("data:{mime_type};base64,{}", STANDARD.encode(bytes));
        Ok(Self {
            mime_type,
            data_uri,
        })
    }

    /// Validate an existing data URI.
    pub fn parse(data_uri: &str) -> Result<Self, MediaError> {
        let rest = data_uri.strip_prefix("data:").ok_or(MediaError::NotDataUri)?;
        let (mime_type, payload) = rest.split_once(";base64,").ok_or(MediaError::NotBase64)?;
        let mime_type = validate_mime(mime_type)?;
        if payload.is_empty() {
            return Err(MediaError::Empty);
        }
        STANDARD
            .decode(payload)
            .map_err(|e| MediaError::InvalidPayload(e.to_string()))?;

        Ok(Self {
            mime_type,
            data_uri: data_uri.to_string(),
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    /// Guess a MIME type from a file extension.
    pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
        match ext.to_ascii_lowercase().as_str() {
            "mp4" | "m4v" => Some("video/mp4"),
            "webm" => Some("video/webm"),
            "mov" => Some("video/quicktime"),
            "jpg" | "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            _ => None,
        }
    }
}

fn validate_mime(mime_type: &str) -> Result<String, MediaError> {
    let mime_type = mime_type.trim().to_ascii_lowercase();
    let (kind, subtype) = mime_type
        .split_once('/')
        .ok_or_else(|| MediaError::UnsupportedMime(mime_type.clone()))?;
    if !matches!(kind, "video" | "image") || subtype.is_empty() {
        return Err(MediaError::UnsupportedMime(mime_type));
    }
    Ok(mime_type)
}

/// Free-text verdict returned by the generator for a clip.
///
/// Not produced by the rule engine; `decision` is whatever the generator said.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAssessment {
    pub scenario_summary: String,
    pub decision: String,
    pub reason: String,
}
