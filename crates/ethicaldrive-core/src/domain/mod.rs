//! Domain model (perception, decisions, scenarios, reports, ...).

pub mod decision;
pub mod errors;
pub mod ids;
pub mod media;
pub mod perception;
pub mod report;
pub mod scenario;

pub use decision::{
    Action, Decider, Decision, Guard, Rule, RuleBook, RuleDecider, RuleId, STANDARD_RULES, decide,
};
pub use errors::{
    ConfigError, EthicalDriveError, MediaError, NarratorError, RuleBookError, SnapshotError,
};
pub use ids::AnalysisId;
pub use media::{VideoAssessment, VideoClip};
pub use perception::{DetectedObject, PerceptionSnapshot, RawPerception, TrafficSignal, Vocabulary};
pub use report::{AnalysisReport, Narrative, NarrativeSource, VideoReport};
pub use scenario::Scenario;
