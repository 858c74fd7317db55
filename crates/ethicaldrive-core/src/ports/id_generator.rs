//! IdGenerator port - ID generation.
//!
//! Kept behind a trait so tests can pair it with a `FixedClock`.

use crate::domain::ids::AnalysisId;
use crate::ports::Clock;
use ulid::Ulid;

pub trait IdGenerator: Send + Sync {
    fn generate_analysis_id(&self) -> AnalysisId;
}

/// ULID generator: clock timestamp + random bits.
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_analysis_id(&self) -> AnalysisId {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        AnalysisId::from(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}
