//! App - application layer.
//!
//! Combines the domain and the ports into the analysis pipeline.
//!
//! # Components
//! - **AnalyzerBuilder**: wiring and startup validation
//! - **Analyzer**: decision + narrative for single snapshots, batches and clips
//! - **PendingAnalysis**: decision available now, narrative on `finish`
//! - **DecisionTally**: counts over a set of reports

pub mod analyzer;
pub mod builder;
pub mod status;

pub use self::analyzer::{Analyzer, BatchItem, PendingAnalysis};
pub use self::builder::{AnalyzerBuilder, BuildError};
pub use self::status::DecisionTally;
