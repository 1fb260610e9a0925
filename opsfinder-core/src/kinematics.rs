//! Opening angles and flight-time corrections.

use crate::{Error, Result};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Speed of light (cm/ns).
pub const SPEED_OF_LIGHT_CM_PER_NS: f64 = 29.979_245_8;

/// Picoseconds per nanosecond.
pub const PS_PER_NS: f64 = 1000.0;

/// Three pairwise opening angles of a photon triple (degrees), ascending.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OpeningAngles {
    /// Angles sorted so that `angles[0] <= angles[1] <= angles[2]`.
    pub angles: [f64; 3],
}

impl OpeningAngles {
    /// Sorts three angles into an `OpeningAngles` value.
    #[must_use]
    pub fn from_unsorted(mut angles: [f64; 3]) -> Self {
        angles.sort_by(f64::total_cmp);
        Self { angles }
    }

    /// Angles between the directions from `vertex` to each point.
    ///
    /// # Errors
    /// Returns [`Error::DegenerateGeometry`] if a point coincides with the
    /// vertex.
    pub fn from_vertex(vertex: &Vector3<f64>, points: [&Vector3<f64>; 3]) -> Result<Self> {
        let mut directions = [Vector3::zeros(); 3];
        for (direction, point) in directions.iter_mut().zip(points) {
            let d = point - vertex;
            if d.norm() <= f64::EPSILON {
                return Err(Error::DegenerateGeometry(
                    "hit position coincides with the vertex".to_string(),
                ));
            }
            *direction = d;
        }
        Ok(Self::from_unsorted([
            directions[0].angle(&directions[1]).to_degrees(),
            directions[1].angle(&directions[2]).to_degrees(),
            directions[2].angle(&directions[0]).to_degrees(),
        ]))
    }

    /// Angles between strips seen from the barrel axis.
    ///
    /// The azimuths are sorted, the two consecutive gaps taken, and the third
    /// angle closes the circle, so the three always add up to 360 degrees.
    #[must_use]
    pub fn from_azimuths(mut thetas: [f64; 3]) -> Self {
        thetas.sort_by(f64::total_cmp);
        let first = thetas[1] - thetas[0];
        let second = thetas[2] - thetas[1];
        Self::from_unsorted([first, second, 360.0 - first - second])
    }

    /// Sum of the two smallest angles.
    #[inline]
    #[must_use]
    pub fn sum_two_smallest(&self) -> f64 {
        self.angles[0] + self.angles[1]
    }

    /// Difference of the two smallest angles.
    #[inline]
    #[must_use]
    pub fn diff_two_smallest(&self) -> f64 {
        self.angles[1] - self.angles[0]
    }

    /// Sum of all three angles.
    #[inline]
    #[must_use]
    pub fn total(&self) -> f64 {
        self.angles.iter().sum()
    }
}

/// Prompt hit time moved back to the decay vertex (ps).
///
/// `time_ps − 1000·|position − vertex| / c`, positions in cm.
#[must_use]
pub fn corrected_prompt_time(time_ps: f64, position: &Vector3<f64>, vertex: &Vector3<f64>) -> f64 {
    time_ps - PS_PER_NS * (position - vertex).norm() / SPEED_OF_LIGHT_CM_PER_NS
}

/// Time-of-flight residual `dt − d/c` of two hits (ns).
#[must_use]
pub fn flight_residual(time_a_ps: f64, time_b_ps: f64, distance_cm: f64) -> f64 {
    (time_a_ps - time_b_ps).abs() / PS_PER_NS - distance_cm / SPEED_OF_LIGHT_CM_PER_NS
}
