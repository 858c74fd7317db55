//! ethicaldrive-core
//!
//! Rule-priority decision engine for simple driving scenarios, plus the
//! pipeline that wraps each decision in generated prose.
//!
//! # Modules
//! - **domain**: perception snapshots, the rule book and decisions, scenarios, reports
//! - **ports**: Narrator, Clock, IdGenerator
//! - **impls**: HttpNarrator, TemplateNarrator
//! - **app**: AnalyzerBuilder, Analyzer, PendingAnalysis, DecisionTally
//! - **config**: TOML + environment configuration

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use domain::{Decision, PerceptionSnapshot, decide};
