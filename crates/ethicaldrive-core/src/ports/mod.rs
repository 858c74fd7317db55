//! Ports - abstraction layer.
//!
//! Each trait hides something outside the decision core: the generative text
//! service, the wall clock, id generation.

pub mod clock;
pub mod id_generator;
pub mod narrator;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::narrator::{ExplanationRequest, Narrator, SummaryRequest};
