//! Hit types for scintillator barrel data.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A scintillator strip of the barrel.
///
/// Two elements are the same strip when `layer` and `slot` match; `theta`
/// is the azimuth of the strip in degrees and only feeds angular cuts.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectorElement {
    /// Barrel layer id.
    pub layer: u16,
    /// Slot id within the layer.
    pub slot: u16,
    /// Azimuthal angle of the slot (degrees).
    pub theta: f64,
}

impl DetectorElement {
    /// Creates a new detector element.
    #[inline]
    #[must_use]
    pub fn new(layer: u16, slot: u16, theta: f64) -> Self {
        Self { layer, slot, theta }
    }

    /// Returns the `(layer, slot)` identity key.
    #[inline]
    #[must_use]
    pub fn key(&self) -> (u16, u16) {
        (self.layer, self.slot)
    }

    /// Checks whether both elements are the same strip.
    #[inline]
    #[must_use]
    pub fn is_same(&self, other: &Self) -> bool {
        self.key() == other.key()
    }

    /// Absolute azimuthal separation, wrapped into `[0, 180]` degrees.
    #[must_use]
    pub fn azimuthal_separation(&self, other: &Self) -> f64 {
        let d_theta = (self.theta - other.theta).abs().rem_euclid(360.0);
        if d_theta > 180.0 {
            360.0 - d_theta
        } else {
            d_theta
        }
    }
}

/// Float classification tag written by the hit classifier.
///
/// `< 0` rejected, `[0, 0.5)` annihilation, `[0.5, 1.0)` prompt.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct QualityTag(pub f64);

impl QualityTag {
    /// Tag of a hit that is neither annihilation nor prompt candidate.
    pub const REJECTED: Self = Self(-1.0);
    /// Tag of an annihilation photon candidate.
    pub const ANNIHILATION: Self = Self(0.3);
    /// Tag of a prompt (deexcitation) photon candidate.
    pub const PROMPT: Self = Self(0.7);
    /// Diagnostic marker for hits with too few fired thresholds.
    pub const LOW_CONFIDENCE: Self = Self(0.1);

    /// Returns the raw tag value.
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Checks for the rejected range.
    #[inline]
    #[must_use]
    pub fn is_rejected(self) -> bool {
        self.0 < 0.0
    }

    /// Checks for the annihilation range `[0, 0.5)`.
    #[inline]
    #[must_use]
    pub fn is_annihilation(self) -> bool {
        (0.0..0.5).contains(&self.0)
    }

    /// Checks for the prompt range `[0.5, 1.0)`.
    #[inline]
    #[must_use]
    pub fn is_prompt(self) -> bool {
        (0.5..1.0).contains(&self.0)
    }
}

impl Default for QualityTag {
    fn default() -> Self {
        Self::REJECTED
    }
}

/// Number of fired thresholds on both photomultiplier sides of a strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThresholdCount {
    /// Thresholds fired on side A.
    pub side_a: u8,
    /// Thresholds fired on side B.
    pub side_b: u8,
}

impl ThresholdCount {
    /// Fewest thresholds a side needs for a complete measurement.
    pub const MIN_COMPLETE: u8 = 2;

    /// Creates a new threshold count.
    #[inline]
    #[must_use]
    pub fn new(side_a: u8, side_b: u8) -> Self {
        Self { side_a, side_b }
    }

    /// Returns true when both sides fired at least two thresholds.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.side_a.min(self.side_b) >= Self::MIN_COMPLETE
    }
}

impl Default for ThresholdCount {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

/// A single photon interaction in the barrel.
///
/// Hits are immutable through the pipeline except for the classification
/// fields (`quality`, `low_confidence`) and the energy proxy, which the
/// optional TOT normalization rewrites before classification.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hit {
    /// Hit time (picoseconds).
    pub time: f64,
    /// Time over threshold, the energy proxy (nanoseconds).
    pub tot: f64,
    /// Hit position (centimetres).
    pub position: Vector3<f64>,
    /// Strip that registered the hit.
    pub element: DetectorElement,
    /// Fired thresholds per side.
    #[cfg_attr(feature = "serde", serde(default))]
    pub thresholds: ThresholdCount,
    /// Upstream reconstruction score.
    #[cfg_attr(feature = "serde", serde(default))]
    pub reco_quality: f64,
    /// Classification tag.
    #[cfg_attr(feature = "serde", serde(default))]
    pub quality: QualityTag,
    /// Set by the classifier for incomplete threshold measurements.
    #[cfg_attr(feature = "serde", serde(default))]
    pub low_confidence: bool,
}

impl Hit {
    /// Creates an unclassified hit with complete threshold measurements.
    #[must_use]
    pub fn new(time: f64, tot: f64, position: Vector3<f64>, element: DetectorElement) -> Self {
        Self {
            time,
            tot,
            position,
            element,
            thresholds: ThresholdCount::default(),
            reco_quality: 0.0,
            quality: QualityTag::REJECTED,
            low_confidence: false,
        }
    }

    /// Sets the fired threshold counts.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: ThresholdCount) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Sets the upstream reconstruction score.
    #[must_use]
    pub fn with_reco_quality(mut self, reco_quality: f64) -> Self {
        self.reco_quality = reco_quality;
        self
    }

    /// Sets the classification tag.
    #[must_use]
    pub fn with_quality(mut self, quality: QualityTag) -> Self {
        self.quality = quality;
        self
    }

    /// Returns true for annihilation-tagged hits.
    #[inline]
    #[must_use]
    pub fn is_annihilation(&self) -> bool {
        self.quality.is_annihilation()
    }

    /// Returns true for prompt-tagged hits.
    #[inline]
    #[must_use]
    pub fn is_prompt(&self) -> bool {
        self.quality.is_prompt()
    }

    /// Distance to another hit (centimetres).
    #[inline]
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        (self.position - other.position).norm()
    }

    /// Absolute time difference to another hit (picoseconds).
    #[inline]
    #[must_use]
    pub fn time_difference(&self, other: &Self) -> f64 {
        (self.time - other.time).abs()
    }
}

/// A fixed span of readout processed as one batch.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeWindow {
    /// Sequence number of the window in the run.
    pub index: u64,
    /// Hits of the window, ascending in time.
    pub hits: Vec<Hit>,
}

impl TimeWindow {
    /// Creates a window from its hits.
    #[must_use]
    pub fn new(index: u64, hits: Vec<Hit>) -> Self {
        Self { index, hits }
    }

    /// Returns the number of hits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Returns true if the window holds no hits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Checks the ascending time order of the hits.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnorderedHits`] naming the first hit that is
    /// earlier than its predecessor.
    pub fn check_order(&self) -> crate::Result<()> {
        match self
            .hits
            .windows(2)
            .position(|pair| pair[1].time < pair[0].time)
        {
            Some(i) => Err(crate::Error::UnorderedHits { index: i + 1 }),
            None => Ok(()),
        }
    }
}
