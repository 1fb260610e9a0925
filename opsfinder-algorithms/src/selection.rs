//! Multiplicity gate.
//!
//! A three-photon candidate has exactly three annihilation hits and at most
//! one prompt hit. Clusters made of prompt hits only are kept as deexcitation
//! candidates for pairing.

use opsfinder_core::{
    CutConfiguration, Error, EventCandidate, EventType, Hit, OpeningAngles, Result,
};

/// Number of annihilation hits of a three-photon candidate.
pub const ANNIHILATION_HITS: usize = 3;
/// Largest number of prompt hits a three-photon candidate may carry.
pub const MAX_PROMPT_HITS: usize = 1;

/// Result of the selection of one cluster.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Accepted three-photon candidate.
    ThreeGamma(EventCandidate),
    /// Deexcitation-only candidate.
    Prompt(EventCandidate),
    /// Hit multiplicities do not fit either hypothesis.
    RejectedMultiplicity {
        /// Annihilation hits in the cluster.
        annihilation: usize,
        /// Prompt hits in the cluster.
        prompt: usize,
    },
    /// Multiplicities fit but the azimuthal angle-sum cut failed.
    RejectedAngleSum {
        /// Sum of the two smallest azimuthal opening angles (degrees).
        sum: f64,
    },
}

/// Selection of three-photon and prompt candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventSelector {
    angle_sum_cut_deg: Option<f64>,
}

impl Default for EventSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSelector {
    /// Creates a selector without the angle-sum cut.
    #[must_use]
    pub fn new() -> Self {
        Self {
            angle_sum_cut_deg: None,
        }
    }

    /// Creates a selector from the run configuration.
    #[must_use]
    pub fn from_cuts(cuts: &CutConfiguration) -> Self {
        if cuts.angle_cut_enabled {
            Self::new().with_angle_sum_cut(cuts.angle_sum_cut_deg)
        } else {
            Self::new()
        }
    }

    /// Requires the azimuthal angle sum to exceed `cut_deg`.
    #[must_use]
    pub fn with_angle_sum_cut(mut self, cut_deg: f64) -> Self {
        self.angle_sum_cut_deg = Some(cut_deg);
        self
    }

    /// Returns the angle-sum cut, if enabled.
    #[must_use]
    pub fn angle_sum_cut(&self) -> Option<f64> {
        self.angle_sum_cut_deg
    }

    /// Classifies a veto-surviving cluster.
    #[must_use]
    pub fn evaluate(&self, cluster: EventCandidate) -> Selection {
        let annihilation = cluster.annihilation_count();
        let prompt = cluster.prompt_count();

        if annihilation == 0 && prompt > 0 {
            return Selection::Prompt(cluster.with_event_type(EventType::Prompt));
        }
        if annihilation != ANNIHILATION_HITS || prompt > MAX_PROMPT_HITS {
            return Selection::RejectedMultiplicity {
                annihilation,
                prompt,
            };
        }

        if let Some(cut) = self.angle_sum_cut_deg {
            let mut thetas = [0.0; ANNIHILATION_HITS];
            for (theta, hit) in thetas.iter_mut().zip(cluster.annihilation_hits()) {
                *theta = hit.element.theta;
            }
            let sum = OpeningAngles::from_azimuths(thetas).sum_two_smallest();
            if sum <= cut {
                log::debug!("candidate rejected: azimuthal angle sum {sum:.1} deg");
                return Selection::RejectedAngleSum { sum };
            }
        }

        Selection::ThreeGamma(cluster.with_event_type(EventType::ThreeGamma))
    }

    /// Keeps only accepted three-photon candidates.
    #[must_use]
    pub fn select(&self, cluster: EventCandidate) -> Option<EventCandidate> {
        match self.evaluate(cluster) {
            Selection::ThreeGamma(candidate) => Some(candidate),
            _ => None,
        }
    }
}

/// The three annihilation hits of an accepted candidate.
///
/// # Errors
/// Returns [`Error::InvalidMultiplicity`] unless the candidate holds exactly
/// three annihilation hits.
pub fn annihilation_triple<'a>(
    candidate: &'a EventCandidate,
    stage: &'static str,
) -> Result<[&'a Hit; 3]> {
    let hits: Vec<&Hit> = candidate.annihilation_hits().collect();
    match hits.as_slice() {
        [a, b, c] => Ok([*a, *b, *c]),
        _ => Err(Error::InvalidMultiplicity {
            stage,
            expected: ANNIHILATION_HITS,
            found: hits.len(),
        }),
    }
}
