//! Event candidates built from clustered hits.

use crate::hit::Hit;
use crate::kinematics::OpeningAngles;
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Physics hypothesis attached to a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EventType {
    /// Not yet selected.
    #[default]
    Unknown,
    /// Deexcitation photon alone.
    Prompt,
    /// Three-photon annihilation, optionally with one prompt photon.
    ThreeGamma,
}

impl EventType {
    /// Short lowercase name used in output files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Prompt => "prompt",
            Self::ThreeGamma => "three_gamma",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time-sorted group of hits that may be one physical event.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventCandidate {
    /// Member hits in time order.
    pub hits: Vec<Hit>,
    /// Selection result.
    pub event_type: EventType,
    /// Decay vertex from the geometric solver (cm).
    pub annihilation_point: Option<Vector3<f64>>,
    /// Decay time from the geometric solver (ps).
    pub annihilation_time: Option<f64>,
    /// Annihilation time minus the vertex-corrected prompt time (ps).
    pub lifetime: Option<f64>,
    /// Opening angles seen from the decay vertex.
    pub angles: Option<OpeningAngles>,
}

impl EventCandidate {
    /// Creates an empty candidate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a candidate with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            hits: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Adds a hit to the candidate.
    pub fn push(&mut self, hit: Hit) {
        self.hits.push(hit);
    }

    /// Returns the number of hits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Returns true if the candidate holds no hits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Returns an iterator over the hits.
    pub fn iter(&self) -> impl Iterator<Item = &Hit> {
        self.hits.iter()
    }

    /// Annihilation-tagged hits.
    pub fn annihilation_hits(&self) -> impl Iterator<Item = &Hit> {
        self.hits.iter().filter(|hit| hit.is_annihilation())
    }

    /// Prompt-tagged hits.
    pub fn prompt_hits(&self) -> impl Iterator<Item = &Hit> {
        self.hits.iter().filter(|hit| hit.is_prompt())
    }

    /// Number of hits with quality in `[0, 0.5)`.
    #[must_use]
    pub fn annihilation_count(&self) -> usize {
        self.annihilation_hits().count()
    }

    /// Number of hits with quality in `[0.5, 1.0)`.
    #[must_use]
    pub fn prompt_count(&self) -> usize {
        self.prompt_hits().count()
    }

    /// Number of hits flagged low-confidence.
    #[must_use]
    pub fn low_confidence_count(&self) -> usize {
        self.hits.iter().filter(|hit| hit.low_confidence).count()
    }

    /// Sets the event type.
    #[must_use]
    pub fn with_event_type(mut self, event_type: EventType) -> Self {
        self.event_type = event_type;
        self
    }

    /// Stores the solved decay vertex and time.
    pub fn set_annihilation(&mut self, point: Vector3<f64>, time: f64) {
        self.annihilation_point = Some(point);
        self.annihilation_time = Some(time);
    }
}

impl FromIterator<Hit> for EventCandidate {
    fn from_iter<I: IntoIterator<Item = Hit>>(iter: I) -> Self {
        Self {
            hits: iter.into_iter().collect(),
            ..Self::default()
        }
    }
}
