//! Seed-relative time-window clustering.
//!
//! Hits are scanned in time order. The first accepted hit seeds a cluster
//! and every following hit closer than the window to the *seed* joins it.
//! The first hit outside the window closes the cluster and the scan resumes
//! from that hit, so clusters partition the accepted hits.

use opsfinder_core::{CutConfiguration, EventCandidate, Hit};

/// What a filtered-out hit inside a cluster span does to that cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilteredHitPolicy {
    /// The filtered hit is stepped over and the cluster stays open.
    #[default]
    Skip,
    /// The filtered hit closes the open cluster.
    EndCluster,
}

/// Time-window clustering of an ordered hit sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowClusterer {
    window_ps: f64,
    policy: FilteredHitPolicy,
}

impl WindowClusterer {
    /// Creates a clusterer with the given window (ps).
    #[must_use]
    pub fn new(window_ps: f64) -> Self {
        Self {
            window_ps,
            policy: FilteredHitPolicy::default(),
        }
    }

    /// Creates a clusterer from the run configuration.
    #[must_use]
    pub fn from_cuts(cuts: &CutConfiguration) -> Self {
        let policy = if cuts.skip_filtered_hits {
            FilteredHitPolicy::Skip
        } else {
            FilteredHitPolicy::EndCluster
        };
        Self::new(cuts.cluster_time_window_ps).with_policy(policy)
    }

    /// Sets the filtered-hit policy.
    #[must_use]
    pub fn with_policy(mut self, policy: FilteredHitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the window (ps).
    #[must_use]
    pub fn window_ps(&self) -> f64 {
        self.window_ps
    }

    /// Returns the filtered-hit policy.
    #[must_use]
    pub fn policy(&self) -> FilteredHitPolicy {
        self.policy
    }

    /// Groups the hits accepted by `filter` into clusters.
    ///
    /// `hits` must be ascending in time. A hit failing `filter` never seeds
    /// nor joins a cluster. Returned clusters are never empty and keep the
    /// input order.
    pub fn cluster<F>(&self, hits: &[Hit], mut filter: F) -> Vec<EventCandidate>
    where
        F: FnMut(&Hit) -> bool,
    {
        let mut clusters = Vec::new();
        let n = hits.len();
        let mut s = 0;

        while s < n {
            let seed = &hits[s];
            if !filter(seed) {
                s += 1;
                continue;
            }

            let mut cluster = EventCandidate::with_capacity(4);
            cluster.push(seed.clone());

            let mut k = s + 1;
            while k < n {
                let current = &hits[k];
                if !filter(current) {
                    match self.policy {
                        FilteredHitPolicy::Skip => {
                            k += 1;
                            continue;
                        }
                        FilteredHitPolicy::EndCluster => break,
                    }
                }
                if current.time - seed.time < self.window_ps {
                    cluster.push(current.clone());
                    k += 1;
                } else {
                    break;
                }
            }

            s = k;
            clusters.push(cluster);
        }

        clusters
    }

    /// Groups all hits, without filtering.
    #[must_use]
    pub fn cluster_all(&self, hits: &[Hit]) -> Vec<EventCandidate> {
        self.cluster(hits, |_| true)
    }
}
