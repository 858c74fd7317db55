//! Analyzer - 判断が先、ナラティブは後
//!
//! # 学習ポイント
//! - 同期的な判断と非同期のナラティブ生成を分離する
//! - `tokio::join!` による並行呼び出しと `tokio::time::timeout` による上限
//! - 失敗はプレースホルダーに置き換え、判断には一切影響させない
//!
//! # 設計原則
//! `start` は何も await せずに判断を返す。要約と説明は `PendingAnalysis::finish`
//! で並行に実行され、それぞれ独立にタイムアウト・失敗してプレースホルダーになる。
//! 判断はナラティブの失敗で再計算もリトライもされない。
//!
//! # 使用例
//! ```ignore
//! let pending = analyzer.start(Some("scenario-4"), &snapshot);
//! show(pending.decision());           // すぐに表示できる
//! let report = pending.finish().await; // ナラティブが揃った完全なレポート
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::PlaceholderConfig;
use crate::domain::decision::{Decider, Decision};
use crate::domain::errors::NarratorError;
use crate::domain::ids::AnalysisId;
use crate::domain::media::{VideoAssessment, VideoClip};
use crate::domain::perception::{PerceptionSnapshot, RawPerception};
use crate::domain::report::{AnalysisReport, Narrative, NarrativeSource, VideoReport};
use crate::domain::scenario::Scenario;
use crate::ports::{Clock, ExplanationRequest, IdGenerator, Narrator, SummaryRequest};

type NarrativeFuture = Pin<Box<dyn Future<Output = (Narrative, Narrative)> + Send>>;

/// One input of a batch run.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub scenario_id: Option<String>,
    pub snapshot: PerceptionSnapshot,
}

impl From<Scenario> for BatchItem {
    fn from(scenario: Scenario) -> Self {
        Self {
            scenario_id: Some(scenario.id.to_string()),
            snapshot: scenario.perception,
        }
    }
}

impl From<PerceptionSnapshot> for BatchItem {
    fn from(snapshot: PerceptionSnapshot) -> Self {
        Self {
            scenario_id: None,
            snapshot,
        }
    }
}

/// Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct Analyzer {
    decider: Arc<dyn Decider>,
    narrator: Arc<dyn Narrator>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    placeholders: Arc<PlaceholderConfig>,
    narrative_timeout: Duration,
}

impl Analyzer {
    pub(crate) fn new(
        decider: Arc<dyn Decider>,
        narrator: Arc<dyn Narrator>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        placeholders: PlaceholderConfig,
        narrative_timeout: Duration,
    ) -> Self {
        Self {
            decider,
            narrator,
            clock,
            ids,
            placeholders: Arc::new(placeholders),
            narrative_timeout,
        }
    }

    /// Decide now and prepare the narrative without awaiting it.
    ///
    /// The returned `PendingAnalysis` exposes the decision immediately. The
    /// narrator is first called when `finish` is awaited.
    pub fn start(
        &self,
        scenario_id: Option<&str>,
        snapshot: &PerceptionSnapshot,
    ) -> PendingAnalysis {
        let decision = self.decider.decide(snapshot);
        info!(
            scenario_id = scenario_id.unwrap_or("-"),
            rule = %decision.rule,
            action = %decision.action,
            confidence = decision.confidence,
            "decision made"
        );

        let summary_request = SummaryRequest::from_snapshot(snapshot);
        let explanation_request = ExplanationRequest::new(&decision, snapshot.context());
        let analyzer = self.clone();
        let narrative: NarrativeFuture = Box::pin(async move {
            let placeholders = Arc::clone(&analyzer.placeholders);
            tokio::join!(
                analyzer.narrate(
                    "summary",
                    analyzer.narrator.summarize(&summary_request),
                    &placeholders.summary,
                ),
                analyzer.narrate(
                    "explanation",
                    analyzer.narrator.explain(&explanation_request),
                    &placeholders.explanation,
                ),
            )
        });

        PendingAnalysis {
            id: self.ids.generate_analysis_id(),
            analyzed_at: self.clock.now(),
            scenario_id: scenario_id.map(str::to_string),
            perception: snapshot.to_raw(),
            decision,
            narrative,
        }
    }

    /// Decide and wait for both narratives.
    pub async fn analyze(
        &self,
        scenario_id: Option<&str>,
        snapshot: &PerceptionSnapshot,
    ) -> AnalysisReport {
        self.start(scenario_id, snapshot).finish().await
    }

    /// Analyze many snapshots concurrently. Reports come back in input order.
    pub async fn analyze_batch(&self, items: Vec<BatchItem>) -> Vec<AnalysisReport> {
        debug!(count = items.len(), "starting batch analysis");

        let handles: Vec<_> = items
            .into_iter()
            .map(|item| {
                let analyzer = self.clone();
                tokio::spawn(async move {
                    analyzer
                        .analyze(item.scenario_id.as_deref(), &item.snapshot)
                        .await
                })
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            // tasks are never aborted, so a join error can only be a panic
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => std::panic::resume_unwind(e.into_panic()),
            }
        }
        reports
    }

    /// Ask the narrator for a verdict on a clip; degrade to placeholders.
    pub async fn assess_video(&self, clip: &VideoClip) -> VideoReport {
        info!(
            mime = clip.mime_type(),
            bytes = clip.data_uri().len(),
            "assessing video clip"
        );

        let outcome =
            tokio::time::timeout(self.narrative_timeout, self.narrator.assess_video(clip)).await;
        match outcome {
            Ok(Ok(assessment)) => VideoReport {
                assessment,
                source: NarrativeSource::Generated,
            },
            Ok(Err(e)) => {
                warn!(error = %e, "video assessment failed; using placeholder");
                self.video_placeholder()
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.narrative_timeout.as_millis() as u64,
                    "video assessment timed out; using placeholder"
                );
                self.video_placeholder()
            }
        }
    }

    fn video_placeholder(&self) -> VideoReport {
        VideoReport {
            assessment: VideoAssessment {
                scenario_summary: self.placeholders.video.clone(),
                decision: "N/A".to_string(),
                reason: self.placeholders.video.clone(),
            },
            source: NarrativeSource::Placeholder,
        }
    }

    async fn narrate(
        &self,
        kind: &'static str,
        call: impl Future<Output = Result<String, NarratorError>>,
        placeholder: &str,
    ) -> Narrative {
        match tokio::time::timeout(self.narrative_timeout, call).await {
            Ok(Ok(text)) => Narrative::generated(text),
            Ok(Err(e)) => {
                warn!(kind, error = %e, "narrative generation failed; using placeholder");
                Narrative::placeholder(placeholder)
            }
            Err(_) => {
                warn!(
                    kind,
                    timeout_ms = self.narrative_timeout.as_millis() as u64,
                    "narrative generation timed out; using placeholder"
                );
                Narrative::placeholder(placeholder)
            }
        }
    }
}

/// An analysis whose decision is known and whose narrative is not.
///
/// # 学習ポイント
/// - 判断は構築時点で確定しており、`decision()` は待たずに読める
/// - ナラティブは `finish` を await したときに初めて生成される
pub struct PendingAnalysis {
    id: AnalysisId,
    analyzed_at: DateTime<Utc>,
    scenario_id: Option<String>,
    perception: RawPerception,
    decision: Decision,
    narrative: NarrativeFuture,
}

impl PendingAnalysis {
    pub fn decision(&self) -> &Decision {
        &self.decision
    }

    pub fn scenario_id(&self) -> Option<&str> {
        self.scenario_id.as_deref()
    }

    /// The snapshot in wire shape, for rendering alongside the decision.
    pub fn perception(&self) -> &RawPerception {
        &self.perception
    }

    /// Wait for the summary and explanation and assemble the report.
    ///
    /// Takes at most the narrative timeout; never fails.
    pub async fn finish(self) -> AnalysisReport {
        let (summary, explanation) = self.narrative.await;
        AnalysisReport {
            id: self.id,
            analyzed_at: self.analyzed_at,
            scenario_id: self.scenario_id,
            perception: self.perception,
            decision: self.decision,
            summary,
            explanation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AnalyzerBuilder;
    use crate::domain::decision::{Action, Guard, Rule, RuleBook, RuleDecider, RuleId, decide};
    use crate::domain::perception::{DetectedObject, TrafficSignal};
    use crate::domain::scenario;
    use crate::ports::FixedClock;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    /// Narrator whose calls can be told to fail, hang, or be slow.
    #[derive(Default)]
    struct StubNarrator {
        fail_summary: bool,
        fail_explanation: bool,
        hang: bool,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl StubNarrator {
        async fn enter(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
        }
    }

    #[async_trait]
    impl Narrator for StubNarrator {
        async fn summarize(&self, request: &SummaryRequest) -> Result<String, NarratorError> {
            self.enter().await;
            if self.hang {
                std::future::pending::<()>().await;
            }
            if self.fail_summary {
                return Err(NarratorError::Transport("connection reset".into()));
            }
            Ok(format!("summary of {}", request.context))
        }

        async fn explain(&self, request: &ExplanationRequest) -> Result<String, NarratorError> {
            self.enter().await;
            if self.fail_explanation {
                return Err(NarratorError::Status {
                    status: 500,
                    body: "boom".into(),
                });
            }
            Ok(format!("explained {}", request.decision))
        }

        async fn assess_video(&self, _clip: &VideoClip) -> Result<VideoAssessment, NarratorError> {
            if self.fail_summary {
                return Err(NarratorError::Decode("not json".into()));
            }
            Ok(VideoAssessment {
                scenario_summary: "A dog crosses.".into(),
                decision: "Brake".into(),
                reason: "Avoid harm.".into(),
            })
        }
    }

    fn analyzer_with(narrator: StubNarrator) -> (Analyzer, Arc<StubNarrator>) {
        analyzer_with_timeout(narrator, Duration::from_millis(50))
    }

    fn analyzer_with_timeout(
        narrator: StubNarrator,
        timeout: Duration,
    ) -> (Analyzer, Arc<StubNarrator>) {
        let narrator = Arc::new(narrator);
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let analyzer = AnalyzerBuilder::new()
            .narrator(narrator.clone())
            .clock(Arc::new(FixedClock::new(at)))
            .narrative_timeout(timeout)
            .build()
            .unwrap();
        (analyzer, narrator)
    }

    fn red_light_with_pedestrian() -> PerceptionSnapshot {
        PerceptionSnapshot::new(
            [
                DetectedObject::Vehicle,
                DetectedObject::TrafficSignalDevice,
                DetectedObject::Pedestrian,
            ],
            [TrafficSignal::Red],
        )
        .with_context("A red light is active at the upcoming intersection.")
    }

    #[tokio::test]
    async fn analyze_combines_decision_and_narrative() {
        let (analyzer, narrator) = analyzer_with(StubNarrator::default());
        let snapshot = red_light_with_pedestrian();

        let report = analyzer.analyze(Some("scenario-4"), &snapshot).await;

        assert_eq!(report.decision, decide(&snapshot));
        assert_eq!(report.decision.action, Action::Brake);
        assert_eq!(report.scenario_id.as_deref(), Some("scenario-4"));
        assert_eq!(
            report.summary,
            Narrative::generated("summary of A red light is active at the upcoming intersection.")
        );
        assert_eq!(report.explanation, Narrative::generated("explained Brake"));
        assert_eq!(report.analyzed_at, Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap());
        assert_eq!(narrator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn decision_is_available_before_the_narrative() {
        let (analyzer, narrator) = analyzer_with_timeout(
            StubNarrator {
                delay: Some(Duration::from_millis(300)),
                ..Default::default()
            },
            Duration::from_secs(5),
        );
        let snapshot = PerceptionSnapshot::empty();

        let started = Instant::now();
        let pending = analyzer.start(None, &snapshot);
        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(*pending.decision(), decide(&snapshot));
        assert_eq!(pending.decision().action, Action::Continue);
        assert_eq!(narrator.calls.load(Ordering::SeqCst), 0);

        let report = pending.finish().await;
        assert!(started.elapsed() >= Duration::from_millis(300));
        assert_eq!(report.decision, decide(&snapshot));
        assert_eq!(report.summary.source, NarrativeSource::Generated);
        assert_eq!(report.explanation.source, NarrativeSource::Generated);
    }

    #[tokio::test]
    async fn pending_analysis_carries_the_input() {
        let (analyzer, _) = analyzer_with(StubNarrator::default());
        let red_light = scenario::find("scenario-4").unwrap();

        let pending = analyzer.start(Some(red_light.id), &red_light.perception);
        assert_eq!(pending.scenario_id(), Some("scenario-4"));
        assert_eq!(pending.perception(), &red_light.perception.to_raw());

        let report = pending.finish().await;
        assert_eq!(report.perception.objects[2], "pedestrian");
        assert_eq!(report.perception.positions[2], "sidewalk");
    }

    #[tokio::test]
    async fn custom_decider_is_used() {
        let stop_everything = RuleBook::new(vec![Rule {
            id: RuleId::Custom("halt"),
            guard: Guard::Always,
            action: Action::Stop,
            reason: "Test track closed.",
            confidence: 1.0,
        }])
        .unwrap();
        let analyzer = AnalyzerBuilder::new()
            .decider(Arc::new(RuleDecider::new(stop_everything)))
            .build()
            .unwrap();

        let report = analyzer.analyze(None, &PerceptionSnapshot::empty()).await;
        assert_eq!(report.decision.action, Action::Stop);
        assert_eq!(report.decision.rule, RuleId::Custom("halt"));
    }

    #[tokio::test]
    async fn one_failure_does_not_affect_the_other_or_the_decision() {
        let (analyzer, _) = analyzer_with(StubNarrator {
            fail_summary: true,
            ..Default::default()
        });
        let snapshot = red_light_with_pedestrian();

        let report = analyzer.analyze(None, &snapshot).await;

        assert_eq!(report.decision, decide(&snapshot));
        assert_eq!(report.summary, Narrative::placeholder("Could not generate AI summary."));
        assert_eq!(report.explanation.source, NarrativeSource::Generated);
    }

    #[tokio::test]
    async fn both_failures_use_both_placeholders() {
        let (analyzer, narrator) = analyzer_with(StubNarrator {
            fail_summary: true,
            fail_explanation: true,
            ..Default::default()
        });
        let snapshot = PerceptionSnapshot::new([DetectedObject::Obstacle], []);

        let report = analyzer.analyze(None, &snapshot).await;

        assert_eq!(report.decision.rule, RuleId::Obstacle);
        assert!(report.summary.is_placeholder());
        assert_eq!(report.explanation.text, "Could not generate AI explanation.");
        // no retries
        assert_eq!(narrator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn hung_narrator_times_out_to_placeholder() {
        let (analyzer, _) = analyzer_with(StubNarrator {
            hang: true,
            ..Default::default()
        });
        let snapshot = PerceptionSnapshot::new([], [TrafficSignal::Green]);

        let report = analyzer.analyze(None, &snapshot).await;

        assert_eq!(report.decision.action, Action::Continue);
        assert_eq!(report.decision.confidence, 0.90);
        assert!(report.summary.is_placeholder());
        assert_eq!(report.explanation.source, NarrativeSource::Generated);
    }

    #[tokio::test]
    async fn batch_keeps_input_order() {
        let (analyzer, _) = analyzer_with(StubNarrator::default());
        let items: Vec<BatchItem> = scenario::catalog().into_iter().map(BatchItem::from).collect();
        let expected: Vec<_> = items.iter().map(|i| decide(&i.snapshot)).collect();

        let reports = analyzer.analyze_batch(items).await;

        assert_eq!(reports.len(), expected.len());
        for (report, decision) in reports.iter().zip(&expected) {
            assert_eq!(&report.decision, decision);
        }
        assert_eq!(reports[0].scenario_id.as_deref(), Some("scenario-1"));
        assert_eq!(reports[4].scenario_id.as_deref(), Some("scenario-5"));
    }

    #[tokio::test]
    async fn video_assessment_passes_through() {
        let (analyzer, _) = analyzer_with(StubNarrator::default());
        let clip = VideoClip::from_bytes("video/mp4", b"frames").unwrap();

        let report = analyzer.assess_video(&clip).await;
        assert_eq!(report.source, NarrativeSource::Generated);
        assert_eq!(report.assessment.decision, "Brake");
    }

    #[tokio::test]
    async fn video_failure_degrades_to_placeholder() {
        let (analyzer, _) = analyzer_with(StubNarrator {
            fail_summary: true,
            ..Default::default()
        });
        let clip = VideoClip::from_bytes("video/mp4", b"frames").unwrap();

        let report = analyzer.assess_video(&clip).await;
        assert_eq!(report.source, NarrativeSource::Placeholder);
        assert_eq!(report.assessment.decision, "N/A");
        assert_eq!(report.assessment.scenario_summary, "Could not analyze video.");
    }
}
