//! Cut configuration shared read-only by every window of a run.

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Open interval `(low, high)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Band {
    /// Exclusive lower bound.
    pub low: f64,
    /// Exclusive upper bound.
    pub high: f64,
}

impl Band {
    /// Creates a new band.
    #[inline]
    #[must_use]
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Strict containment test.
    #[inline]
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value > self.low && value < self.high
    }

    /// Returns true if both bands share some value.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.low < other.high && other.low < self.high
    }

    fn validate(&self, name: &'static str) -> Result<()> {
        if !self.low.is_finite() || !self.high.is_finite() || self.low >= self.high {
            return Err(Error::InvalidParameter {
                name,
                reason: format!("band ({}, {}) is empty", self.low, self.high),
            });
        }
        Ok(())
    }
}

/// Per-run cut parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CutConfiguration {
    /// Energy-proxy band of annihilation photon candidates (ns).
    pub tot_annihilation: Band,
    /// Energy-proxy band of prompt photon candidates (ns).
    pub tot_prompt: Band,
    /// Seed-relative clustering window (ps).
    pub cluster_time_window_ps: f64,
    /// Minimum sum of the two smallest opening angles (degrees).
    pub angle_sum_cut_deg: f64,
    /// Whether the selector applies the angle-sum cut.
    pub angle_cut_enabled: bool,
    /// Annihilation hits closer in azimuth than this are scatterings (degrees).
    pub same_element_theta_veto_deg: f64,
    /// A cluster survives only if its smallest-magnitude `d - v·t` residual exceeds this.
    pub dvt_veto_threshold: f64,
    /// Reconstruction-score band of the deexcitation hit used for pairing.
    pub prompt_quality_band: Band,
    /// Largest accepted `|z|` of a hit before solving (cm), if any.
    pub max_hit_z_cm: Option<f64>,
    /// Let filtered hits inside a cluster span be skipped instead of closing the cluster.
    pub skip_filtered_hits: bool,
}

impl CutConfiguration {
    /// Default azimuthal scattering veto (degrees).
    pub const DEFAULT_THETA_VETO_DEG: f64 = 8.0;
    /// Default time-of-flight residual threshold.
    pub const DEFAULT_DVT_THRESHOLD: f64 = -1.8;
    /// Default reconstruction-score band for the pairing prompt hit.
    pub const DEFAULT_PROMPT_QUALITY_BAND: Band = Band {
        low: 1.8,
        high: 2.2,
    };

    /// Creates a configuration from the required parameters.
    #[must_use]
    pub fn new(
        tot_annihilation: Band,
        tot_prompt: Band,
        cluster_time_window_ps: f64,
        angle_sum_cut_deg: f64,
    ) -> Self {
        Self {
            tot_annihilation,
            tot_prompt,
            cluster_time_window_ps,
            angle_sum_cut_deg,
            angle_cut_enabled: false,
            same_element_theta_veto_deg: Self::DEFAULT_THETA_VETO_DEG,
            dvt_veto_threshold: Self::DEFAULT_DVT_THRESHOLD,
            prompt_quality_band: Self::DEFAULT_PROMPT_QUALITY_BAND,
            max_hit_z_cm: None,
            skip_filtered_hits: true,
        }
    }

    /// Enables or disables the selector angle-sum cut.
    #[must_use]
    pub fn with_angle_cut(mut self, enabled: bool) -> Self {
        self.angle_cut_enabled = enabled;
        self
    }

    /// Sets the azimuthal scattering veto.
    #[must_use]
    pub fn with_theta_veto(mut self, degrees: f64) -> Self {
        self.same_element_theta_veto_deg = degrees;
        self
    }

    /// Sets the time-of-flight residual threshold.
    #[must_use]
    pub fn with_dvt_threshold(mut self, threshold: f64) -> Self {
        self.dvt_veto_threshold = threshold;
        self
    }

    /// Sets the pairing prompt-hit band.
    #[must_use]
    pub fn with_prompt_quality_band(mut self, band: Band) -> Self {
        self.prompt_quality_band = band;
        self
    }

    /// Enables the axial acceptance cut.
    #[must_use]
    pub fn with_max_hit_z(mut self, max_abs_z_cm: f64) -> Self {
        self.max_hit_z_cm = Some(max_abs_z_cm);
        self
    }

    /// Sets how filtered hits inside a cluster span are treated.
    #[must_use]
    pub fn with_skip_filtered_hits(mut self, skip: bool) -> Self {
        self.skip_filtered_hits = skip;
        self
    }

    /// Checks parameter consistency.
    ///
    /// Overlapping TOT bands are allowed (annihilation takes precedence) and
    /// only logged.
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameter`] for empty bands, a non-positive
    /// clustering window, a veto angle outside `[0, 180]` or a non-positive
    /// axial cut.
    pub fn validate(&self) -> Result<()> {
        self.tot_annihilation.validate("tot_annihilation_ns")?;
        self.tot_prompt.validate("tot_prompt_ns")?;
        self.prompt_quality_band.validate("prompt_quality_band")?;

        if !(self.cluster_time_window_ps.is_finite() && self.cluster_time_window_ps > 0.0) {
            return Err(Error::InvalidParameter {
                name: "cluster_time_window_ps",
                reason: format!("{} is not a positive duration", self.cluster_time_window_ps),
            });
        }
        if !(0.0..=180.0).contains(&self.same_element_theta_veto_deg) {
            return Err(Error::InvalidParameter {
                name: "same_element_theta_veto_deg",
                reason: format!("{} is outside [0, 180]", self.same_element_theta_veto_deg),
            });
        }
        if let Some(z) = self.max_hit_z_cm {
            if !(z.is_finite() && z > 0.0) {
                return Err(Error::InvalidParameter {
                    name: "max_hit_z_cm",
                    reason: format!("{z} is not a positive length"),
                });
            }
        }

        if self.tot_annihilation.overlaps(&self.tot_prompt) {
            log::warn!(
                "TOT bands overlap: annihilation ({}, {}) and prompt ({}, {}); annihilation wins",
                self.tot_annihilation.low,
                self.tot_annihilation.high,
                self.tot_prompt.low,
                self.tot_prompt.high
            );
        }
        Ok(())
    }
}
