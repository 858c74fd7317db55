//! Decision model: which action the vehicle should take for a snapshot.
//!
//! This module defines the Decision type (what to do), the ordered rule book
//! that produces it, and the Decider trait (the seam callers depend on).
//!
//! Rules are evaluated top to bottom and the first rule whose guard matches
//! wins. The order encodes the safety hierarchy:
//! protect people > obey binding traffic law > avoid physical damage > proceed.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::RuleBookError;
use super::perception::{DetectedObject, PerceptionSnapshot, TrafficSignal};

/// The recommended vehicle action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Brake,
    Stop,
    Continue,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Brake, Action::Stop, Action::Continue];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Brake => "Brake",
            Action::Stop => "Stop",
            Action::Continue => "Continue",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the rule that produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    Pedestrian,
    RedLight,
    Obstacle,
    GreenLight,
    Fallback,
    /// Rules supplied by a custom rule book.
    Custom(&'static str),
}

impl RuleId {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleId::Pedestrian => "pedestrian",
            RuleId::RedLight => "red_light",
            RuleId::Obstacle => "obstacle",
            RuleId::GreenLight => "green_light",
            RuleId::Fallback => "fallback",
            RuleId::Custom(name) => name,
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean condition over a snapshot.
///
/// Guards only test membership; they never look at positions or context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    ObjectPresent(DetectedObject),
    SignalActive(TrafficSignal),
    Always,
}

impl Guard {
    /// Evaluate the guard against a snapshot.
    pub fn matches(&self, snapshot: &PerceptionSnapshot) -> bool {
        match *self {
            Guard::ObjectPresent(object) => snapshot.has_object(object),
            Guard::SignalActive(signal) => snapshot.has_signal(signal),
            Guard::Always => true,
        }
    }
}

/// One row of the rule table.
///
/// A matching rule is turned into a `Decision` field for field; rules carry no
/// logic beyond their guard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    /// Identifies the row in decisions and logs.
    pub id: RuleId,
    /// Condition that must hold for this row to fire.
    pub guard: Guard,
    pub action: Action,
    /// Fixed justification sentence shown next to the action.
    pub reason: &'static str,
    /// Static confidence, in (0, 1].
    pub confidence: f64,
}

impl Rule {
    fn outcome(&self) -> Decision {
        Decision {
            action: self.action,
            reason: self.reason,
            confidence: self.confidence,
            rule: self.id,
        }
    }
}

pub const PEDESTRIAN_REASON: &str =
    "Pedestrian detected. Primary directive is to minimize human harm.";
pub const RED_LIGHT_REASON: &str =
    "Red light detected. Adhering to traffic laws to ensure public safety.";
pub const OBSTACLE_REASON: &str =
    "Obstacle on road detected. Braking to avoid collision and property damage.";
pub const GREEN_LIGHT_REASON: &str =
    "Path is clear and traffic signal is green. Proceeding with standard caution.";
pub const FALLBACK_REASON: &str =
    "No immediate ethical risks or critical obstacles detected. Proceeding with caution.";

/// The standard rule table, in priority order.
pub static STANDARD_RULES: [Rule; 5] = [
    Rule {
        id: RuleId::Pedestrian,
        guard: Guard::ObjectPresent(DetectedObject::Pedestrian),
        action: Action::Brake,
        reason: PEDESTRIAN_REASON,
        confidence: 0.98,
    },
    Rule {
        id: RuleId::RedLight,
        guard: Guard::SignalActive(TrafficSignal::Red),
        action: Action::Stop,
        reason: RED_LIGHT_REASON,
        confidence: 0.99,
    },
    Rule {
        id: RuleId::Obstacle,
        guard: Guard::ObjectPresent(DetectedObject::Obstacle),
        action: Action::Brake,
        reason: OBSTACLE_REASON,
        confidence: 0.95,
    },
    Rule {
        id: RuleId::GreenLight,
        guard: Guard::SignalActive(TrafficSignal::Green),
        action: Action::Continue,
        reason: GREEN_LIGHT_REASON,
        confidence: 0.90,
    },
    Rule {
        id: RuleId::Fallback,
        guard: Guard::Always,
        action: Action::Continue,
        reason: FALLBACK_REASON,
        confidence: 0.85,
    },
];

/// The engine's output for one snapshot.
///
/// Immutable and identity-free: two decisions for the same snapshot compare
/// equal field by field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision {
    pub action: Action,
    pub reason: &'static str,
    pub confidence: f64,
    pub rule: RuleId,
}

/// An ordered, validated list of rules ending in an `Always` fallback.
#[derive(Debug, Clone)]
pub struct RuleBook {
    rules: Vec<Rule>,
}

impl RuleBook {
    /// Build a rule book.
    ///
    /// # Errors
    /// - `Empty` if no rules are given
    /// - `UnreachableRules` if an `Always` guard is followed by more rules
    /// - `MissingFallback` if the last rule is not `Always`
    /// - `ConfidenceOutOfRange` if any confidence is not in (0, 1]
    pub fn new(rules: Vec<Rule>) -> Result<Self, RuleBookError> {
        let last = rules.len().checked_sub(1).ok_or(RuleBookError::Empty)?;

        for (position, rule) in rules.iter().enumerate() {
            if !(rule.confidence > 0.0 && rule.confidence <= 1.0) {
                return Err(RuleBookError::ConfidenceOutOfRange {
                    rule: rule.id.to_string(),
                    confidence: rule.confidence,
                });
            }
            if rule.guard == Guard::Always && position != last {
                return Err(RuleBookError::UnreachableRules(position));
            }
        }
        if rules[last].guard != Guard::Always {
            return Err(RuleBookError::MissingFallback);
        }

        Ok(Self { rules })
    }

    /// The five standard rules. Always valid, so no `Result`.
    pub fn standard() -> Self {
        Self {
            rules: STANDARD_RULES.to_vec(),
        }
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// First-match-wins evaluation.
    pub fn evaluate(&self, snapshot: &PerceptionSnapshot) -> Decision {
        evaluate_rules(&self.rules, snapshot)
    }
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::standard()
    }
}

// `rules` always ends in an `Always` guard (checked by RuleBook::new), so the
// last row is reached at worst.
fn evaluate_rules(rules: &[Rule], snapshot: &PerceptionSnapshot) -> Decision {
    rules
        .iter()
        .find(|rule| rule.guard.matches(snapshot))
        .unwrap_or(&STANDARD_RULES[STANDARD_RULES.len() - 1])
        .outcome()
}

/// Decide with the standard rule table.
pub fn decide(snapshot: &PerceptionSnapshot) -> Decision {
    evaluate_rules(&STANDARD_RULES, snapshot)
}

/// Trait for deciding the vehicle action from a perception snapshot.
///
/// Deciders are pure functions: no side effects, no shared mutable state, so
/// one instance can serve any number of concurrent callers.
pub trait Decider: Send + Sync {
    /// Decide the action for one snapshot.
    ///
    /// # Arguments
    /// * `snapshot` - validated perception record
    ///
    /// # Returns
    /// A decision. Never fails and never blocks.
    fn decide(&self, snapshot: &PerceptionSnapshot) -> Decision;
}

/// Rule-book backed decider.
#[derive(Debug, Clone, Default)]
pub struct RuleDecider {
    rule_book: RuleBook,
}

impl RuleDecider {
    /// Decider over a custom, already validated rule book.
    pub fn new(rule_book: RuleBook) -> Self {
        Self { rule_book }
    }
}

impl Decider for RuleDecider {
    fn decide(&self, snapshot: &PerceptionSnapshot) -> Decision {
        self.rule_book.evaluate(snapshot)
    }
}
