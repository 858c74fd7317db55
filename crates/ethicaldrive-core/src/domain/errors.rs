//! Errors - error types for the collaborators around the decision engine.
//!
//! The engine itself never fails. Everything here belongs to a boundary:
//! snapshot construction, media handling, rule book construction, narrative
//! generation, configuration.

use thiserror::Error;

use super::perception::Vocabulary;

/// Caller-side contract violation while building a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("unknown object tag '{tag}' (vocabulary {vocabulary})")]
    UnknownObject { tag: String, vocabulary: Vocabulary },

    #[error("unknown signal tag '{tag}' (vocabulary {vocabulary})")]
    UnknownSignal { tag: String, vocabulary: Vocabulary },
}

/// A rule book that would make `decide` partial or out of range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleBookError {
    #[error("rule book is empty")]
    Empty,

    #[error("last rule must have an `Always` guard")]
    MissingFallback,

    #[error("`Always` guard at position {0} shadows the rules after it")]
    UnreachableRules(usize),

    #[error("confidence {confidence} of rule '{rule}' is outside (0, 1]")]
    ConfidenceOutOfRange { rule: String, confidence: f64 },
}

/// Invalid media data URI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("media uri must start with 'data:'")]
    NotDataUri,

    #[error("media uri must be base64 encoded (missing ';base64,')")]
    NotBase64,

    #[error("unsupported media type '{0}' (expected video/* or image/*)")]
    UnsupportedMime(String),

    #[error("invalid base64 payload: {0}")]
    InvalidPayload(String),

    #[error("media payload is empty")]
    Empty,

    #[error("cannot guess the media type of '{0}'")]
    UnknownExtension(String),
}

/// Failure of the narrative generator. Never affects a decision.
#[derive(Debug, Error)]
pub enum NarratorError {
    #[error("failed to build http client: {0}")]
    Client(String),

    #[error("narrator transport error: {0}")]
    Transport(String),

    #[error("narrator returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode narrator response: {0}")]
    Decode(String),

    #[error("narrator timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("{0} is not supported by this narrator")]
    Unsupported(&'static str),
}

/// Configuration load/validation error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Umbrella error for the input side of the pipeline.
///
/// Covers everything a caller can get wrong before an analysis starts:
/// reading and parsing perception records, media clips and configuration.
/// Narrator failures never appear here; the analyzer absorbs them into
/// placeholders.
#[derive(Debug, Error)]
pub enum EthicalDriveError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("invalid perception JSON: {0}")]
    PerceptionJson(#[from] serde_json::Error),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown scenario id: {0}")]
    UnknownScenario(String),
}
