//! Narrator port - the external text generator.
//!
//! The narrator turns a snapshot or a decision into prose. It is an opaque
//! text-in/text-out collaborator with no latency or availability guarantee;
//! nothing it returns feeds back into a decision.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::decision::Decision;
use crate::domain::errors::NarratorError;
use crate::domain::media::{VideoAssessment, VideoClip};
use crate::domain::perception::PerceptionSnapshot;

/// Input for the scenario summary.
///
/// `objects` and `positions` keep the order the perception source reported
/// them in, so the generator can pair them up the way the source intended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub objects: Vec<String>,
    pub positions: Vec<String>,
    pub signals: Vec<String>,
    pub context: String,
}

impl SummaryRequest {
    /// Canonical tags in reported order, plus positions and context verbatim.
    pub fn from_snapshot(snapshot: &PerceptionSnapshot) -> Self {
        let raw = snapshot.to_raw();
        Self {
            objects: raw.objects,
            positions: raw.positions,
            signals: raw.signals,
            context: raw.context,
        }
    }
}

/// Input for the decision explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub decision: String,
    pub reasoning: String,
    pub context: String,
}

impl ExplanationRequest {
    /// `decision` is the action name; `reasoning` is the rule's fixed reason.
    pub fn new(decision: &Decision, context: &str) -> Self {
        Self {
            decision: decision.action.to_string(),
            reasoning: decision.reason.to_string(),
            context: context.to_string(),
        }
    }
}

/// Trait for the narrative generator.
///
/// Implementations may be slow, fail, or hang; callers bound every call with
/// a timeout and substitute a placeholder. Nothing returned here is fed back
/// into the decision engine.
///
/// # Implementations
/// - `HttpNarrator`: remote generative-text endpoint
/// - `TemplateNarrator`: offline, deterministic templates
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Human-readable summary of the situation the vehicle is in.
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, NarratorError>;

    /// Natural-language explanation of a decision.
    async fn explain(&self, request: &ExplanationRequest) -> Result<String, NarratorError>;

    /// Summary + recommended action for a video clip, straight from the
    /// generator.
    async fn assess_video(&self, clip: &VideoClip) -> Result<VideoAssessment, NarratorError>;
}
