//! TemplateNarrator - offline narrator that fills fixed sentence templates.
//!
//! Deterministic, instant, never fails for text. Used when no generative
//! endpoint is configured and as the default in demos.

use async_trait::async_trait;

use crate::domain::errors::NarratorError;
use crate::domain::media::{VideoAssessment, VideoClip};
use crate::ports::narrator::{ExplanationRequest, Narrator, SummaryRequest};

/// Stateless; every call is a pure function of the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

impl TemplateNarrator {
    pub fn new() -> Self {
        Self
    }

    fn summary_text(request: &SummaryRequest) -> String {
        let objects = if request.objects.is_empty() {
            "No objects are detected".to_string()
        } else {
            let listed = request
                .objects
                .iter()
                .map(|o| o.replace('_', " "))
                .collect::<Vec<_>>()
                .join(", ");
            if request.positions.is_empty() {
                format!("Detected: {listed}")
            } else {
                format!("Detected: {listed} (positions: {})", request.positions.join(", "))
            }
        };

        let signals = if request.signals.is_empty() {
            "no traffic signal is active".to_string()
        } else {
            format!("active signals: {}", request.signals.join(", "))
        };

        let mut text = format!("{objects}; {signals}.");
        if !request.context.trim().is_empty() {
            text.push(' ');
            text.push_str(request.context.trim());
        }
        text
    }

    fn explanation_text(request: &ExplanationRequest) -> String {
        let verb = match request.decision.as_str() {
            "Brake" => "brakes",
            "Stop" => "comes to a stop",
            "Continue" => "continues",
            _ => "acts",
        };
        let mut text = format!("The vehicle {verb}. {}", request.reasoning.trim());
        if !request.context.trim().is_empty() {
            text.push_str(" Situation: ");
            text.push_str(request.context.trim());
        }
        text
    }
}

#[async_trait]
impl Narrator for TemplateNarrator {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, NarratorError> {
        Ok(Self::summary_text(request))
    }

    async fn explain(&self, request: &ExplanationRequest) -> Result<String, NarratorError> {
        Ok(Self::explanation_text(request))
    }

    async fn assess_video(&self, _clip: &VideoClip) -> Result<VideoAssessment, NarratorError> {
        Err(NarratorError::Unsupported("video assessment"))
    }
}
