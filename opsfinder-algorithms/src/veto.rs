//! Scattering veto.
//!
//! A photon that scatters between strips registers as two hits close in
//! azimuth, or as a pair of hits whose time difference is too large for a
//! straight flight at the speed of light. The veto inspects every unordered
//! pair of hits in a cluster:
//!
//! - two hits in the same strip are both removed from the cluster;
//! - two annihilation hits closer in azimuth than the veto angle discard the
//!   whole cluster;
//! - annihilation pairs contribute their `dt − d/c` residual, and the cluster
//!   is kept only if the residual of smallest magnitude exceeds the
//!   threshold.

use opsfinder_core::kinematics::flight_residual;
use opsfinder_core::{CutConfiguration, EventCandidate, Hit};
use std::collections::BTreeSet;

/// Outcome of the pairwise tests on one pair of hits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairVerdict {
    /// Both hits sit in the same strip.
    pub same_element: bool,
    /// Both are annihilation hits closer in azimuth than the veto angle.
    pub angular_reject: bool,
    /// Azimuthal separation of annihilation pairs (degrees).
    pub separation: Option<f64>,
    /// Time-of-flight residual of annihilation pairs (ns).
    pub dvt: Option<f64>,
}

/// Result of vetoing a cluster.
#[derive(Debug, Clone, PartialEq)]
pub enum VetoVerdict {
    /// Cluster survives with same-strip hits removed.
    Accepted {
        /// Reduced cluster.
        cluster: EventCandidate,
        /// Number of hits removed by the same-strip rule.
        removed: usize,
        /// Smallest-magnitude residual, if any annihilation pair existed.
        min_dvt: Option<f64>,
    },
    /// Two annihilation hits were too close in azimuth.
    RejectedAngular {
        /// Offending azimuthal separation (degrees).
        separation: f64,
    },
    /// The smallest-magnitude residual did not exceed the threshold.
    RejectedTimeOfFlight {
        /// Smallest-magnitude residual (ns).
        min_dvt: f64,
    },
}

impl VetoVerdict {
    /// Returns the surviving cluster, if any.
    #[must_use]
    pub fn into_accepted(self) -> Option<EventCandidate> {
        match self {
            Self::Accepted { cluster, .. } => Some(cluster),
            _ => None,
        }
    }
}

/// Pairwise scattering filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatteringVeto {
    theta_veto_deg: f64,
    dvt_threshold: f64,
}

impl ScatteringVeto {
    /// Creates a veto with explicit parameters.
    #[must_use]
    pub fn new(theta_veto_deg: f64, dvt_threshold: f64) -> Self {
        Self {
            theta_veto_deg,
            dvt_threshold,
        }
    }

    /// Creates a veto from the run configuration.
    #[must_use]
    pub fn from_cuts(cuts: &CutConfiguration) -> Self {
        Self::new(cuts.same_element_theta_veto_deg, cuts.dvt_veto_threshold)
    }

    /// Pairwise tests; symmetric in its arguments.
    #[must_use]
    pub fn evaluate_pair(&self, a: &Hit, b: &Hit) -> PairVerdict {
        if a.element.is_same(&b.element) {
            return PairVerdict {
                same_element: true,
                angular_reject: false,
                separation: None,
                dvt: None,
            };
        }
        if !(a.is_annihilation() && b.is_annihilation()) {
            return PairVerdict {
                same_element: false,
                angular_reject: false,
                separation: None,
                dvt: None,
            };
        }

        let separation = a.element.azimuthal_separation(&b.element);
        PairVerdict {
            same_element: false,
            angular_reject: separation < self.theta_veto_deg,
            separation: Some(separation),
            dvt: Some(flight_residual(a.time, b.time, a.distance(b))),
        }
    }

    /// Runs the veto over a cluster.
    #[must_use]
    pub fn apply(&self, mut cluster: EventCandidate) -> VetoVerdict {
        let hits = &cluster.hits;
        let mut to_remove = BTreeSet::new();
        let mut min_dvt: Option<f64> = None;

        for i in 0..hits.len() {
            for j in (i + 1)..hits.len() {
                let verdict = self.evaluate_pair(&hits[i], &hits[j]);

                if verdict.same_element {
                    to_remove.insert(i);
                    to_remove.insert(j);
                    continue;
                }
                if verdict.angular_reject {
                    let separation = verdict.separation.unwrap_or_default();
                    log::debug!("cluster rejected: azimuthal separation {separation:.2} deg");
                    return VetoVerdict::RejectedAngular { separation };
                }
                if let Some(dvt) = verdict.dvt {
                    if min_dvt.is_none_or(|current| dvt.abs() < current.abs()) {
                        min_dvt = Some(dvt);
                    }
                }
            }
        }

        if let Some(dvt) = min_dvt {
            if dvt <= self.dvt_threshold {
                log::debug!("cluster rejected: min |d - vt| residual {dvt:.3}");
                return VetoVerdict::RejectedTimeOfFlight { min_dvt: dvt };
            }
        }

        let removed = to_remove.len();
        let hits = std::mem::take(&mut cluster.hits);
        cluster.hits = hits
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !to_remove.contains(i))
            .map(|(_, hit)| hit)
            .collect();

        VetoVerdict::Accepted {
            cluster,
            removed,
            min_dvt,
        }
    }

    /// Runs the veto and keeps only the surviving cluster.
    #[must_use]
    pub fn veto(&self, cluster: EventCandidate) -> Option<EventCandidate> {
        self.apply(cluster).into_accepted()
    }
}
