//! Plain-text rendering of the dashboard panels.
//!
//! Each panel is written through a `fmt::Write` function so the pieces can be
//! printed separately: the decision goes out before the narrative exists.

use std::fmt::{self, Write};

use ethicaldrive_core::app::DecisionTally;
use ethicaldrive_core::domain::{
    Action, AnalysisReport, Decision, NarrativeSource, RawPerception, Scenario, VideoReport,
};

/// Run a panel writer into a fresh string.
fn panel(write: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    // writing into a String never fails
    write(&mut out).ok();
    out
}

pub fn scenario_list(scenarios: &[Scenario]) -> String {
    panel(|out| {
        for s in scenarios {
            writeln!(out, "{:<12} {:<20} {}", s.id, s.name, s.description)?;
        }
        Ok(())
    })
}

/// Uppercase badge; Brake/Stop are marked as urgent.
fn badge(action: Action) -> String {
    match action {
        Action::Brake | Action::Stop => format!("[!! {} !!]", action.as_str().to_uppercase()),
        Action::Continue => format!("[ {} ]", action.as_str().to_uppercase()),
    }
}

fn list_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items
            .iter()
            .map(|i| i.replace('_', " "))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn source_marker(source: NarrativeSource) -> &'static str {
    match source {
        NarrativeSource::Generated => "",
        NarrativeSource::Placeholder => " (unavailable)",
    }
}

fn write_perception(
    out: &mut impl Write,
    scenario_id: Option<&str>,
    p: &RawPerception,
) -> fmt::Result {
    writeln!(out, "== Perception Analysis {}", scenario_id.unwrap_or(""))?;
    let context = if p.context.is_empty() { "-" } else { &p.context };
    writeln!(out, "  Context:   {context}")?;
    writeln!(out, "  Objects:   {}", list_or_dash(&p.objects))?;
    writeln!(out, "  Positions: {}", list_or_dash(&p.positions))?;
    writeln!(out, "  Signals:   {}", list_or_dash(&p.signals))
}

fn write_decision(out: &mut impl Write, d: &Decision) -> fmt::Result {
    writeln!(out, "== Decision & Justification")?;
    writeln!(out, "  Decision:   {}", badge(d.action))?;
    writeln!(out, "  Confidence: {:.0}%", d.confidence * 100.0)?;
    writeln!(out, "  Rule:       {}", d.rule)?;
    writeln!(out, "  Symbolic reason: {}", d.reason)
}

fn write_narrative(out: &mut impl Write, report: &AnalysisReport) -> fmt::Result {
    writeln!(out, "== AI Context Summary{}", source_marker(report.summary.source))?;
    writeln!(out, "  {}", report.summary.text)?;
    writeln!(
        out,
        "== AI Explanation{}",
        source_marker(report.explanation.source)
    )?;
    writeln!(out, "  {}", report.explanation.text)
}

pub fn perception(scenario_id: Option<&str>, p: &RawPerception) -> String {
    panel(|out| write_perception(out, scenario_id, p))
}

pub fn decision(d: &Decision) -> String {
    panel(|out| write_decision(out, d))
}

pub fn narrative(report: &AnalysisReport) -> String {
    panel(|out| write_narrative(out, report))
}

/// All panels of a finished report, in display order.
pub fn report(report: &AnalysisReport) -> String {
    panel(|out| {
        write_perception(out, report.scenario_id.as_deref(), &report.perception)?;
        write_decision(out, &report.decision)?;
        write_narrative(out, report)
    })
}

pub fn tally(tally: &DecisionTally) -> String {
    panel(|out| {
        writeln!(out, "== Tally ({} scenarios)", tally.total())?;
        for action in Action::ALL {
            writeln!(out, "  {:<9} {}", action.as_str(), tally.count(action))?;
        }
        if tally.degraded > 0 {
            writeln!(out, "  {} report(s) used placeholder text", tally.degraded)?;
        }
        Ok(())
    })
}

pub fn video(report: &VideoReport) -> String {
    panel(|out| {
        let a = &report.assessment;
        writeln!(out, "== Video Assessment{}", source_marker(report.source))?;
        writeln!(out, "  Summary:  {}", a.scenario_summary)?;
        writeln!(out, "  Decision: {}", a.decision)?;
        writeln!(out, "  Reason:   {}", a.reason)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethicaldrive_core::app::AnalyzerBuilder;
    use ethicaldrive_core::domain::scenario;

    #[tokio::test]
    async fn report_shows_every_panel_in_order() {
        let analyzer = AnalyzerBuilder::new().build().unwrap();
        let s = scenario::find("scenario-4").unwrap();
        let r = analyzer.analyze(Some(s.id), &s.perception).await;

        let text = report(&r);
        assert!(text.contains("Decision:   [!! BRAKE !!]"));
        assert!(text.contains("Confidence: 98%"));
        assert!(text.contains("Signals:   red"));
        assert!(text.contains("Objects:   vehicle, traffic signal device, pedestrian"));
        assert!(text.contains("Positions: ahead, right corner, sidewalk"));

        let perception_at = text.find("== Perception Analysis").unwrap();
        let decision_at = text.find("== Decision & Justification").unwrap();
        let summary_at = text.find("== AI Context Summary").unwrap();
        assert!(perception_at < decision_at && decision_at < summary_at);
    }

    #[tokio::test]
    async fn decision_panel_renders_from_pending_analysis() {
        let analyzer = AnalyzerBuilder::new().build().unwrap();
        let s = scenario::find("scenario-2").unwrap();
        let pending = analyzer.start(Some(s.id), &s.perception);

        let text = decision(pending.decision());
        assert!(text.contains("Decision:   [ CONTINUE ]"));
        assert!(text.contains("Rule:       green_light"));
        assert!(perception(pending.scenario_id(), pending.perception())
            .starts_with("== Perception Analysis scenario-2"));
    }

    #[test]
    fn tally_lists_every_action() {
        let t = DecisionTally {
            brake: 3,
            proceed: 2,
            ..Default::default()
        };
        let text = tally(&t);
        assert!(text.starts_with("== Tally (5 scenarios)"));
        assert!(text.contains("Stop      0"));
        assert!(!text.contains("placeholder"));
    }

    #[test]
    fn scenario_list_has_one_line_each() {
        let catalog = scenario::catalog();
        assert_eq!(scenario_list(&catalog).lines().count(), catalog.len());
    }
}
