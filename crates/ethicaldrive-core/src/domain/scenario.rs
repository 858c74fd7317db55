//! Sample scenario catalog.
//!
//! Fixed demo data the dashboard offers before any upload. Each scenario
//! carries a ready-made snapshot; the first entry is the default selection.

use serde::Serialize;

use super::perception::{DetectedObject, PerceptionSnapshot, TrafficSignal};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub image_id: &'static str,
    pub perception: PerceptionSnapshot,
}

/// All built-in scenarios in display order.
pub fn catalog() -> Vec<Scenario> {
    use DetectedObject::*;
    use TrafficSignal::*;

    vec![
        Scenario {
            id: "scenario-1",
            name: "Pedestrian Crossing",
            description: "A pedestrian is crossing the road ahead, forcing an immediate ethical \
                          decision.",
            image_id: "scene-1",
            perception: PerceptionSnapshot::new([Pedestrian, Vehicle], [])
                .with_positions(["ahead", "behind"])
                .with_context("A pedestrian has stepped onto the road unexpectedly."),
        },
        Scenario {
            id: "scenario-2",
            name: "Green Light",
            description: "The road is clear and the traffic light is green, allowing the car to \
                          proceed.",
            image_id: "scene-2",
            perception: PerceptionSnapshot::new([Vehicle, TrafficSignalDevice], [Green])
                .with_positions(["left_lane", "ahead"])
                .with_context("Approaching an intersection with a green light."),
        },
        Scenario {
            id: "scenario-3",
            name: "Road Obstacle",
            description: "An unexpected obstacle is present in the lane, requiring a defensive \
                          maneuver.",
            image_id: "scene-3",
            perception: PerceptionSnapshot::new([Obstacle], [])
                .with_positions(["ahead"])
                .with_context("A large, unidentified obstacle is blocking the current lane."),
        },
        Scenario {
            id: "scenario-4",
            name: "Red Light",
            description: "The vehicle is approaching an intersection with a red traffic light.",
            image_id: "scene-4",
            perception: PerceptionSnapshot::new([Vehicle, TrafficSignalDevice, Pedestrian], [Red])
                .with_positions(["ahead", "right_corner", "sidewalk"])
                .with_context("A red light is active at the upcoming intersection."),
        },
        Scenario {
            id: "scenario-5",
            name: "Animal in Road",
            description: "An animal has darted into the road.",
            image_id: "scene-5",
            perception: PerceptionSnapshot::new([Animal, Vehicle], [])
                .with_positions(["ahead", "behind"])
                .with_context("An animal is on the road."),
        },
    ]
}

/// Look up a scenario by id.
pub fn find(id: &str) -> Option<Scenario> {
    catalog().into_iter().find(|s| s.id == id)
}

/// The scenario shown when nothing has been selected yet.
pub fn default_scenario() -> Scenario {
    let mut all = catalog();
    all.swap_remove(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decision::{Action, RuleId, decide};
    use rstest::rstest;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique() {
        let ids: HashSet<_> = catalog().iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), catalog().len());
    }

    #[test]
    fn default_is_first() {
        assert_eq!(default_scenario().id, "scenario-1");
        assert!(find("scenario-9").is_none());
    }

    #[rstest]
    #[case("scenario-1", Action::Brake, RuleId::Pedestrian)]
    #[case("scenario-2", Action::Continue, RuleId::GreenLight)]
    #[case("scenario-3", Action::Brake, RuleId::Obstacle)]
    #[case("scenario-4", Action::Brake, RuleId::Pedestrian)]
    #[case("scenario-5", Action::Continue, RuleId::Fallback)]
    fn catalog_decisions(#[case] id: &str, #[case] action: Action, #[case] rule: RuleId) {
        let scenario = find(id).unwrap();
        let decision = decide(&scenario.perception);
        assert_eq!(decision.action, action);
        assert_eq!(decision.rule, rule);
    }
}
