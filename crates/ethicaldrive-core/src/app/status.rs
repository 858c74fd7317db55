//! Status - 分析レポート集合の集計ビュー
//!
//! # 学習ポイント
//! - レポートを1件ずつ `record` して数えるだけの純粋な集計
//! - serde でそのまま `--json` 出力に載せられる形にする

use serde::{Deserialize, Serialize};

use crate::domain::decision::Action;
use crate::domain::report::AnalysisReport;

/// Decision counts per action across a batch.
///
/// `degraded` counts reports where at least one narrative fell back to its
/// placeholder; it overlaps with the per-action counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionTally {
    pub brake: usize,
    pub stop: usize,
    #[serde(rename = "continue")]
    pub proceed: usize,
    pub degraded: usize,
}

impl DecisionTally {
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a AnalysisReport>) -> Self {
        let mut tally = Self::default();
        for report in reports {
            tally.record(report);
        }
        tally
    }

    pub fn record(&mut self, report: &AnalysisReport) {
        match report.decision.action {
            Action::Brake => self.brake += 1,
            Action::Stop => self.stop += 1,
            Action::Continue => self.proceed += 1,
        }
        if report.summary.is_placeholder() || report.explanation.is_placeholder() {
            self.degraded += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.brake + self.stop + self.proceed
    }

    pub fn count(&self, action: Action) -> usize {
        match action {
            Action::Brake => self.brake,
            Action::Stop => self.stop,
            Action::Continue => self.proceed,
        }
    }
}
