//! Perception model: what the vehicle "sees" at one instant.
//!
//! A `PerceptionSnapshot` is the only input of the decision engine. Object and
//! signal tags come from closed enumerations; raw string tags are parsed at the
//! construction boundary against a versioned `Vocabulary` and anything unknown
//! is rejected there, never inside the engine.
//!
//! # Construction
//! - `PerceptionSnapshot::from_raw` / `from_json`: untrusted input, validated
//!   against a vocabulary. This is the only way in from the wire.
//! - `PerceptionSnapshot::new`: typed tags from code (catalog, tests).
//!
//! # Ordering
//! The source lists objects and positions side by side, so the object order
//! it reported is kept for display and for the narrator. The rules only look
//! at membership, which is answered from a set.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{EthicalDriveError, SnapshotError};

/// A category of object reported by the perception source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedObject {
    Pedestrian,
    Vehicle,
    Obstacle,
    TrafficSignalDevice,
    Animal,
}

impl DetectedObject {
    /// Every object known to the latest vocabulary, in declaration order.
    pub const ALL: [DetectedObject; 5] = [
        DetectedObject::Pedestrian,
        DetectedObject::Vehicle,
        DetectedObject::Obstacle,
        DetectedObject::TrafficSignalDevice,
        DetectedObject::Animal,
    ];

    /// Canonical tag (`"traffic_signal_device"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            DetectedObject::Pedestrian => "pedestrian",
            DetectedObject::Vehicle => "vehicle",
            DetectedObject::Obstacle => "obstacle",
            DetectedObject::TrafficSignalDevice => "traffic_signal_device",
            DetectedObject::Animal => "animal",
        }
    }

    /// Human-readable label for rendering.
    pub fn label(self) -> &'static str {
        match self {
            DetectedObject::Pedestrian => "Pedestrian",
            DetectedObject::Vehicle => "Vehicle",
            DetectedObject::Obstacle => "Obstacle",
            DetectedObject::TrafficSignalDevice => "Traffic light",
            DetectedObject::Animal => "Animal",
        }
    }
}

impl fmt::Display for DetectedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a traffic signal visible to the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficSignal {
    Red,
    Green,
    Yellow,
}

impl TrafficSignal {
    pub const ALL: [TrafficSignal; 3] =
        [TrafficSignal::Red, TrafficSignal::Green, TrafficSignal::Yellow];

    /// Canonical tag (`"red"`, `"green"`, `"yellow"`).
    pub fn as_str(self) -> &'static str {
        match self {
            TrafficSignal::Red => "red",
            TrafficSignal::Green => "green",
            TrafficSignal::Yellow => "yellow",
        }
    }

    /// Human-readable label for rendering.
    pub fn label(self) -> &'static str {
        match self {
            TrafficSignal::Red => "Red light",
            TrafficSignal::Green => "Green light",
            TrafficSignal::Yellow => "Yellow light",
        }
    }
}

impl fmt::Display for TrafficSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Versioned set of tags accepted at the construction boundary.
///
/// - `V1`: the original object set (no `animal`).
/// - `V2`: V1 plus `animal`.
///
/// Signals are identical in both versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vocabulary {
    V1,
    #[default]
    V2,
}

impl Vocabulary {
    /// `"v1"` or `"v2"`, as written in config files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Vocabulary::V1 => "v1",
            Vocabulary::V2 => "v2",
        }
    }

    /// Whether `object` exists in this version of the vocabulary.
    pub fn contains(self, object: DetectedObject) -> bool {
        match self {
            Vocabulary::V1 => object != DetectedObject::Animal,
            Vocabulary::V2 => true,
        }
    }

    /// Parse a raw object tag. Case-insensitive; `-` and `_` are interchangeable.
    pub fn parse_object(self, tag: &str) -> Result<DetectedObject, SnapshotError> {
        let object = match normalize(tag).as_str() {
            "pedestrian" => DetectedObject::Pedestrian,
            "vehicle" | "car" => DetectedObject::Vehicle,
            "obstacle" => DetectedObject::Obstacle,
            "traffic_signal_device" | "traffic_light" => DetectedObject::TrafficSignalDevice,
            "animal" => DetectedObject::Animal,
            _ => {
                return Err(SnapshotError::UnknownObject {
                    tag: tag.to_string(),
                    vocabulary: self,
                });
            }
        };

        if !self.contains(object) {
            return Err(SnapshotError::UnknownObject {
                tag: tag.to_string(),
                vocabulary: self,
            });
        }
        Ok(object)
    }

    /// Parse a raw signal tag. Accepts both `red` and `red_light` forms.
    pub fn parse_signal(self, tag: &str) -> Result<TrafficSignal, SnapshotError> {
        match normalize(tag).as_str() {
            "red" | "red_light" => Ok(TrafficSignal::Red),
            "green" | "green_light" => Ok(TrafficSignal::Green),
            "yellow" | "yellow_light" => Ok(TrafficSignal::Yellow),
            _ => Err(SnapshotError::UnknownSignal {
                tag: tag.to_string(),
                vocabulary: self,
            }),
        }
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Vocabulary {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" => Ok(Vocabulary::V1),
            "v2" => Ok(Vocabulary::V2),
            other => Err(format!("unknown vocabulary version: {other}")),
        }
    }
}

fn normalize(tag: &str) -> String {
    tag.trim().to_ascii_lowercase().replace('-', "_")
}

/// Wire shape of a perception record (string tags, not yet validated).
///
/// Field names follow the JSON produced by the perception source:
/// `{"objects": [...], "positions": [...], "signals": [...], "context": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPerception {
    #[serde(default)]
    pub objects: Vec<String>,

    #[serde(default)]
    pub positions: Vec<String>,

    #[serde(default)]
    pub signals: Vec<String>,

    #[serde(default)]
    pub context: String,
}

/// One immutable perception record fed to the decision engine.
///
/// Only membership in `detected_objects` / `active_signals` is observable by
/// the engine. `observed_objects`, `positions` and `context` are carried for
/// display and for the narrative generator. The engine never correlates
/// objects with positions.
///
/// Serializes as the canonical `RawPerception` shape. JSON input goes through
/// `RawPerception` and `from_raw`, never straight into a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(into = "RawPerception")]
pub struct PerceptionSnapshot {
    detected_objects: BTreeSet<DetectedObject>,
    /// Objects in the order the source reported them, duplicates included.
    observed_objects: Vec<DetectedObject>,
    positions: Vec<String>,
    active_signals: BTreeSet<TrafficSignal>,
    context: String,
}

impl PerceptionSnapshot {
    /// Empty snapshot: no objects, no signals.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from typed tags. Objects keep the order given here.
    pub fn new(
        objects: impl IntoIterator<Item = DetectedObject>,
        signals: impl IntoIterator<Item = TrafficSignal>,
    ) -> Self {
        let observed_objects: Vec<_> = objects.into_iter().collect();
        Self {
            detected_objects: observed_objects.iter().copied().collect(),
            observed_objects,
            positions: Vec::new(),
            active_signals: signals.into_iter().collect(),
            context: String::new(),
        }
    }

    /// Validate a raw record against `vocabulary`.
    ///
    /// Fails on the first unrecognized tag. Duplicates collapse for the rules
    /// but stay in the reported object order.
    ///
    /// # Errors
    /// `SnapshotError::UnknownObject` / `UnknownSignal` naming the offending tag
    /// and the vocabulary it was checked against.
    pub fn from_raw(raw: &RawPerception, vocabulary: Vocabulary) -> Result<Self, SnapshotError> {
        let observed_objects = raw
            .objects
            .iter()
            .map(|tag| vocabulary.parse_object(tag))
            .collect::<Result<Vec<_>, _>>()?;
        let active_signals = raw
            .signals
            .iter()
            .map(|tag| vocabulary.parse_signal(tag))
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Self {
            detected_objects: observed_objects.iter().copied().collect(),
            observed_objects,
            positions: raw.positions.clone(),
            active_signals,
            context: raw.context.clone(),
        })
    }

    /// Parse a JSON perception record and validate it in one step.
    pub fn from_json(json: &str, vocabulary: Vocabulary) -> Result<Self, EthicalDriveError> {
        let raw: RawPerception = serde_json::from_str(json)?;
        Ok(Self::from_raw(&raw, vocabulary)?)
    }

    pub fn with_positions(
        mut self,
        positions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.positions = positions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn has_object(&self, object: DetectedObject) -> bool {
        self.detected_objects.contains(&object)
    }

    pub fn has_signal(&self, signal: TrafficSignal) -> bool {
        self.active_signals.contains(&signal)
    }

    /// Distinct objects, in enum order.
    pub fn detected_objects(&self) -> impl Iterator<Item = DetectedObject> + '_ {
        self.detected_objects.iter().copied()
    }

    /// Objects as the source reported them, aligned with `positions` by
    /// convention.
    pub fn observed_objects(&self) -> &[DetectedObject] {
        &self.observed_objects
    }

    pub fn active_signals(&self) -> impl Iterator<Item = TrafficSignal> + '_ {
        self.active_signals.iter().copied()
    }

    pub fn positions(&self) -> &[String] {
        &self.positions
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Back to the wire shape using canonical tags, in reported order.
    pub fn to_raw(&self) -> RawPerception {
        RawPerception {
            objects: self.observed_objects.iter().map(|o| o.as_str().to_string()).collect(),
            positions: self.positions.clone(),
            signals: self.active_signals().map(|s| s.as_str().to_string()).collect(),
            context: self.context.clone(),
        }
    }
}

impl From<PerceptionSnapshot> for RawPerception {
    fn from(snapshot: PerceptionSnapshot) -> Self {
        snapshot.to_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::canonical("pedestrian", DetectedObject::Pedestrian)]
    #[case::car_alias("car", DetectedObject::Vehicle)]
    #[case::upper("OBSTACLE", DetectedObject::Obstacle)]
    #[case::traffic_light("traffic_light", DetectedObject::TrafficSignalDevice)]
    #[case::hyphenated("traffic-signal-device", DetectedObject::TrafficSignalDevice)]
    fn parses_object_aliases(#[case] tag: &str, #[case] expected: DetectedObject) {
        assert_eq!(Vocabulary::V2.parse_object(tag).unwrap(), expected);
    }

    #[rstest]
    #[case::short("red", TrafficSignal::Red)]
    #[case::long("green_light", TrafficSignal::Green)]
    #[case::padded(" Yellow ", TrafficSignal::Yellow)]
    fn parses_signal_aliases(#[case] tag: &str, #[case] expected: TrafficSignal) {
        assert_eq!(Vocabulary::V1.parse_signal(tag).unwrap(), expected);
    }

    #[test]
    fn animal_is_only_known_in_v2() {
        assert_eq!(
            Vocabulary::V2.parse_object("animal").unwrap(),
            DetectedObject::Animal
        );
        let err = Vocabulary::V1.parse_object("animal").unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::UnknownObject { vocabulary: Vocabulary::V1, .. }
        ));
    }

    #[test]
    fn unknown_tags_are_rejected_not_dropped() {
        let raw = RawPerception {
            objects: vec!["pedestrian".into(), "bicycle".into()],
            ..Default::default()
        };
        let err = PerceptionSnapshot::from_raw(&raw, Vocabulary::V2).unwrap_err();
        assert!(matches!(err, SnapshotError::UnknownObject { ref tag, .. } if tag == "bicycle"));

        let raw = RawPerception {
            signals: vec!["blue_light".into()],
            ..Default::default()
        };
        let err = PerceptionSnapshot::from_raw(&raw, Vocabulary::V2).unwrap_err();
        assert!(matches!(err, SnapshotError::UnknownSignal { .. }));
    }

    #[test]
    fn from_raw_collapses_duplicates_and_keeps_positions() {
        let raw = RawPerception {
            objects: vec!["car".into(), "vehicle".into(), "pedestrian".into()],
            positions: vec!["ahead".into(), "behind".into(), "sidewalk".into()],
            signals: vec!["red_light".into(), "red".into()],
            context: "busy junction".into(),
        };
        let snapshot = PerceptionSnapshot::from_raw(&raw, Vocabulary::V2).unwrap();

        assert_eq!(snapshot.detected_objects().count(), 2);
        assert_eq!(snapshot.observed_objects().len(), 3);
        assert_eq!(snapshot.active_signals().count(), 1);
        assert_eq!(snapshot.positions().len(), 3);
        assert_eq!(snapshot.context(), "busy junction");
    }

    #[test]
    fn raw_perception_accepts_source_json() {
        let json = r#"{
            "objects": ["car", "traffic_light"],
            "positions": ["left_lane", "ahead"],
            "signals": ["green_light"],
            "context": "Approaching an intersection."
        }"#;
        let raw: RawPerception = serde_json::from_str(json).unwrap();
        let snapshot = PerceptionSnapshot::from_raw(&raw, Vocabulary::V1).unwrap();

        assert!(snapshot.has_object(DetectedObject::TrafficSignalDevice));
        assert!(snapshot.has_signal(TrafficSignal::Green));
        assert_eq!(
            snapshot.to_raw().objects,
            vec!["vehicle".to_string(), "traffic_signal_device".to_string()]
        );
    }

    #[test]
    fn from_raw_keeps_reported_object_order() {
        let raw = RawPerception {
            objects: vec!["car".into(), "traffic_light".into(), "pedestrian".into()],
            positions: vec!["ahead".into(), "right_corner".into(), "sidewalk".into()],
            signals: vec!["red".into()],
            ..Default::default()
        };
        let snapshot = PerceptionSnapshot::from_raw(&raw, Vocabulary::V2).unwrap();

        assert_eq!(
            snapshot.observed_objects(),
            &[
                DetectedObject::Vehicle,
                DetectedObject::TrafficSignalDevice,
                DetectedObject::Pedestrian
            ]
        );
        assert_eq!(
            snapshot.to_raw().objects,
            vec!["vehicle", "traffic_signal_device", "pedestrian"]
        );
        // membership is unaffected by order
        assert!(snapshot.has_object(DetectedObject::Pedestrian));
    }

    #[test]
    fn from_json_applies_the_vocabulary() {
        let json = r#"{"objects":["animal"],"positions":["ahead"],"signals":[],"context":""}"#;

        let err = PerceptionSnapshot::from_json(json, Vocabulary::V1).unwrap_err();
        assert!(matches!(
            err,
            EthicalDriveError::Snapshot(SnapshotError::UnknownObject {
                vocabulary: Vocabulary::V1,
                ..
            })
        ));

        let snapshot = PerceptionSnapshot::from_json(json, Vocabulary::V2).unwrap();
        assert!(snapshot.has_object(DetectedObject::Animal));
    }

    #[test]
    fn from_json_reports_malformed_input() {
        let err = PerceptionSnapshot::from_json("{not json", Vocabulary::V2).unwrap_err();
        assert!(matches!(err, EthicalDriveError::PerceptionJson(_)));
    }

    #[test]
    fn snapshot_serializes_as_wire_shape() {
        let snapshot = PerceptionSnapshot::new([DetectedObject::Obstacle], [TrafficSignal::Yellow])
            .with_positions(["ahead"])
            .with_context("debris");

        let v = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "objects": ["obstacle"],
                "positions": ["ahead"],
                "signals": ["yellow"],
                "context": "debris"
            })
        );
    }

    #[test]
    fn vocabulary_from_str() {
        assert_eq!("V1".parse::<Vocabulary>().unwrap(), Vocabulary::V1);
        assert!("v3".parse::<Vocabulary>().is_err());
    }
}
