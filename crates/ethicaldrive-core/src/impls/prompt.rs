//! Prompt templates sent to the generative text service.

use crate::ports::narrator::{ExplanationRequest, SummaryRequest};

pub fn summary_prompt(request: &SummaryRequest) -> String {
    format!(
        "You summarize driving scenarios for an ethical reasoning system in an autonomous \
         vehicle.\n\
         Write a short, human-readable summary of the dilemma the car is facing.\n\
         \n\
         Objects: {}\n\
         Positions: {}\n\
         Signals: {}\n\
         Context: {}\n\
         \n\
         Scenario summary:",
        join_or_none(&request.objects),
        join_or_none(&request.positions),
        join_or_none(&request.signals),
        request.context,
    )
}

pub fn explanation_prompt(request: &ExplanationRequest) -> String {
    format!(
        "You explain the decisions of an autonomous vehicle to passengers.\n\
         Give a clear and concise natural-language explanation of the decision below.\n\
         \n\
         Decision: {}\n\
         Reasoning: {}\n\
         Context: {}\n\
         \n\
         Explanation:",
        request.decision, request.reasoning, request.context,
    )
}

/// The clip is attached as media; the answer must be a JSON object.
pub fn video_prompt() -> &'static str {
    "You assist an autonomous vehicle with ethical reasoning. Watch the attached driving clip \
     and reply with a JSON object with exactly these string fields:\n\
     - \"scenarioSummary\": a concise summary of the situation or dilemma\n\
     - \"decision\": the best course of action (Brake, Continue or Stop)\n\
     - \"reason\": a brief justification grounded in safety and ethics"
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_prompt_lists_fields() {
        let req = SummaryRequest {
            objects: vec!["pedestrian".into(), "vehicle".into()],
            positions: vec!["ahead".into()],
            signals: vec![],
            context: "crossing".into(),
        };
        let prompt = summary_prompt(&req);
        assert!(prompt.contains("Objects: pedestrian, vehicle\n"));
        assert!(prompt.contains("Signals: none\n"));
        assert!(prompt.contains("Context: crossing\n"));
    }

    #[test]
    fn explanation_prompt_lists_fields() {
        let req = ExplanationRequest {
            decision: "Stop".into(),
            reasoning: "Red light detected.".into(),
            context: "junction".into(),
        };
        let prompt = explanation_prompt(&req);
        assert!(prompt.contains("Decision: Stop\n"));
        assert!(prompt.contains("Reasoning: Red light detected.\n"));
        assert!(prompt.ends_with("Explanation:"));
    }
}
