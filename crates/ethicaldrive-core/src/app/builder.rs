//! AnalyzerBuilder - decider / narrator / clock / プレースホルダーのワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンで `Arc<dyn Port>` を差し替え可能にする
//! - 起動時検証（Fail-fast 設計）: 不正な設定は最初のスナップショットではなく
//!   `build()` でエラーになる
//! - 設定ファイルからの構築 (`from_config`) とテスト用の手動構築を同じ型で扱う

use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, NarratorMode, PlaceholderConfig};
use crate::domain::decision::{Decider, RuleDecider};
use crate::domain::errors::NarratorError;
use crate::impls::{HttpNarrator, TemplateNarrator};
use crate::ports::{Clock, Narrator, SystemClock, UlidGenerator};

use super::analyzer::Analyzer;

/// AnalyzerBuilder は Analyzer を構築
///
/// # 使用例
/// ```ignore
/// let analyzer = AnalyzerBuilder::from_config(&config)?.build()?;
/// let report = analyzer.analyze(None, &snapshot).await;
/// ```
pub struct AnalyzerBuilder {
    decider: Arc<dyn Decider>,
    narrator: Arc<dyn Narrator>,
    clock: Arc<dyn Clock>,
    placeholders: PlaceholderConfig,
    narrative_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to create narrator: {0}")]
    Narrator(#[from] NarratorError),

    #[error("placeholder '{0}' must not be empty")]
    EmptyPlaceholder(&'static str),

    #[error("narrative timeout must be greater than zero")]
    ZeroTimeout,
}

impl AnalyzerBuilder {
    /// Standard rules, template narrator, system clock, default placeholders.
    pub fn new() -> Self {
        Self {
            decider: Arc::new(RuleDecider::default()),
            narrator: Arc::new(TemplateNarrator::new()),
            clock: Arc::new(SystemClock),
            placeholders: PlaceholderConfig::default(),
            narrative_timeout: Duration::from_millis(15_000),
        }
    }

    /// Pick the narrator implementation and limits from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, BuildError> {
        let narrator: Arc<dyn Narrator> = match config.narrator.mode {
            NarratorMode::Http => Arc::new(HttpNarrator::new(&config.narrator)?),
            NarratorMode::Template => Arc::new(TemplateNarrator::new()),
        };
        Ok(Self::new()
            .narrator(narrator)
            .placeholders(config.placeholders.clone())
            .narrative_timeout(config.narrator.timeout()))
    }

    /// Replace the standard rule book, e.g. with a validated custom one.
    pub fn decider(mut self, decider: Arc<dyn Decider>) -> Self {
        self.decider = decider;
        self
    }

    /// Narrator used for summaries, explanations and video assessment.
    pub fn narrator(mut self, narrator: Arc<dyn Narrator>) -> Self {
        self.narrator = narrator;
        self
    }

    /// Clock stamped into reports and analysis ids.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn placeholders(mut self, placeholders: PlaceholderConfig) -> Self {
        self.placeholders = placeholders;
        self
    }

    /// Upper bound for each narrator call. Must be non-zero.
    pub fn narrative_timeout(mut self, timeout: Duration) -> Self {
        self.narrative_timeout = timeout;
        self
    }

    /// Validate and assemble.
    ///
    /// # Errors
    /// - `ZeroTimeout` if the narrative timeout is zero
    /// - `EmptyPlaceholder` naming the first blank placeholder text
    pub fn build(self) -> Result<Analyzer, BuildError> {
        if self.narrative_timeout.is_zero() {
            return Err(BuildError::ZeroTimeout);
        }
        let placeholders = [
            ("summary", &self.placeholders.summary),
            ("explanation", &self.placeholders.explanation),
            ("video", &self.placeholders.video),
        ];
        if let Some((name, _)) = placeholders.iter().find(|(_, text)| text.trim().is_empty()) {
            return Err(BuildError::EmptyPlaceholder(*name));
        }

        let ids = Arc::new(UlidGenerator::new(Arc::clone(&self.clock)));
        Ok(Analyzer::new(
            self.decider,
            self.narrator,
            self.clock,
            ids,
            self.placeholders,
            self.narrative_timeout,
        ))
    }
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_with_defaults() {
        assert!(AnalyzerBuilder::new().build().is_ok());
    }

    #[test]
    fn build_rejects_empty_placeholder() {
        let placeholders = PlaceholderConfig {
            explanation: "  ".to_string(),
            ..PlaceholderConfig::default()
        };
        let result = AnalyzerBuilder::new().placeholders(placeholders).build();
        assert!(matches!(result, Err(BuildError::EmptyPlaceholder("explanation"))));
    }

    #[test]
    fn build_rejects_zero_timeout() {
        let result = AnalyzerBuilder::new()
            .narrative_timeout(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(BuildError::ZeroTimeout)));
    }

    #[test]
    fn from_config_selects_http_narrator() {
        let mut config = AppConfig::default();
        config.narrator.mode = NarratorMode::Http;
        config.narrator.api_key_env = None;
        assert!(AnalyzerBuilder::from_config(&config).unwrap().build().is_ok());
    }
}
