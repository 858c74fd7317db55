//! Analysis report: one decision plus the prose generated around it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::decision::Decision;
use super::ids::AnalysisId;
use super::media::VideoAssessment;
use super::perception::RawPerception;

/// Where a narrative string came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSource {
    Generated,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Narrative {
    pub text: String,
    pub source: NarrativeSource,
}

impl Narrative {
    pub fn generated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: NarrativeSource::Generated,
        }
    }

    pub fn placeholder(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: NarrativeSource::Placeholder,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == NarrativeSource::Placeholder
    }
}

/// Everything the presentation layer shows for one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub id: AnalysisId,
    pub analyzed_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,

    pub perception: RawPerception,
    pub decision: Decision,
    pub summary: Narrative,
    pub explanation: Narrative,
}

/// Result of a video assessment, flagged when it is a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoReport {
    pub assessment: VideoAssessment,
    pub source: NarrativeSource,
}
