//! Per-stage tallies of a pipeline run.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Low-confidence hits seen at each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LowConfidenceCounts {
    /// Accepted by the classifier.
    pub classified: u64,
    /// Inside clusters that survived the scattering veto.
    pub after_veto: u64,
    /// Inside accepted three-photon candidates.
    pub selected: u64,
    /// Inside emitted candidates.
    pub emitted: u64,
}

impl LowConfidenceCounts {
    fn merge(&mut self, other: &Self) {
        self.classified += other.classified;
        self.after_veto += other.after_veto;
        self.selected += other.selected;
        self.emitted += other.emitted;
    }
}

/// Accept/reject counters threaded through the pipeline.
///
/// Counters only grow. Tallies of independent runs or workers combine with
/// [`PipelineStatistics::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineStatistics {
    /// Windows that completed every stage.
    pub windows_processed: u64,
    /// Windows dropped on an invariant violation.
    pub windows_dropped: u64,
    /// Hits read.
    pub hits_seen: u64,
    /// Hits classified as annihilation photons.
    pub hits_annihilation: u64,
    /// Hits classified as prompt photons.
    pub hits_prompt: u64,
    /// Hits outside both energy bands.
    pub hits_rejected: u64,
    /// Hits whose slot had no TOT normalization factor.
    pub hits_unnormalized: u64,
    /// Clusters formed from accepted hits.
    pub clusters_formed: u64,
    /// Clusters surviving the azimuthal scattering rule.
    pub clusters_after_angular_veto: u64,
    /// Clusters surviving the time-of-flight rule.
    pub clusters_after_tof_veto: u64,
    /// Hits removed by the same-strip rule.
    pub hits_removed_same_element: u64,
    /// Clusters accepted as three-photon candidates (after the angle cut).
    pub selected_three_gamma: u64,
    /// Clusters tagged as prompt candidates.
    pub selected_prompt: u64,
    /// Clusters dropped for their hit multiplicities.
    pub rejected_multiplicity: u64,
    /// Candidates dropped by the azimuthal angle-sum cut.
    pub rejected_angle_sum: u64,
    /// Candidates dropped by the axial acceptance cut.
    pub rejected_z: u64,
    /// Candidates the geometric solver could not solve.
    pub solver_failures: u64,
    /// Lifetimes from a paired prompt candidate.
    pub paired_lifetimes: u64,
    /// Lifetimes from the prompt hit inside the candidate.
    pub in_event_lifetimes: u64,
    /// Candidates written out.
    pub candidates_emitted: u64,
    /// Low-confidence hits per stage.
    pub low_confidence: LowConfidenceCounts,
}

impl PipelineStatistics {
    /// Creates an empty tally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds another tally to this one.
    pub fn merge(&mut self, other: &Self) {
        self.windows_processed += other.windows_processed;
        self.windows_dropped += other.windows_dropped;
        self.hits_seen += other.hits_seen;
        self.hits_annihilation += other.hits_annihilation;
        self.hits_prompt += other.hits_prompt;
        self.hits_rejected += other.hits_rejected;
        self.hits_unnormalized += other.hits_unnormalized;
        self.clusters_formed += other.clusters_formed;
        self.clusters_after_angular_veto += other.clusters_after_angular_veto;
        self.clusters_after_tof_veto += other.clusters_after_tof_veto;
        self.hits_removed_same_element += other.hits_removed_same_element;
        self.selected_three_gamma += other.selected_three_gamma;
        self.selected_prompt += other.selected_prompt;
        self.rejected_multiplicity += other.rejected_multiplicity;
        self.rejected_angle_sum += other.rejected_angle_sum;
        self.rejected_z += other.rejected_z;
        self.solver_failures += other.solver_failures;
        self.paired_lifetimes += other.paired_lifetimes;
        self.in_event_lifetimes += other.in_event_lifetimes;
        self.candidates_emitted += other.candidates_emitted;
        self.low_confidence.merge(&other.low_confidence);
    }

    /// Fraction of formed clusters that were emitted.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn emission_ratio(&self) -> f64 {
        if self.clusters_formed == 0 {
            0.0
        } else {
            self.candidates_emitted as f64 / self.clusters_formed as f64
        }
    }

    /// Logs every counter at `info` level.
    pub fn report(&self) {
        log::info!("windows processed:            {}", self.windows_processed);
        log::info!("windows dropped:              {}", self.windows_dropped);
        log::info!("hits seen:                    {}", self.hits_seen);
        log::info!("  annihilation:               {}", self.hits_annihilation);
        log::info!("  prompt:                     {}", self.hits_prompt);
        log::info!("  rejected:                   {}", self.hits_rejected);
        log::info!("  without TOT factor:         {}", self.hits_unnormalized);
        log::info!("clusters formed:              {}", self.clusters_formed);
        log::info!("  after angular veto:         {}", self.clusters_after_angular_veto);
        log::info!("  after time-of-flight veto:  {}", self.clusters_after_tof_veto);
        log::info!("  same-strip hits removed:    {}", self.hits_removed_same_element);
        log::info!("  three-photon selected:      {}", self.selected_three_gamma);
        log::info!("  prompt selected:            {}", self.selected_prompt);
        log::info!("  multiplicity rejected:      {}", self.rejected_multiplicity);
        log::info!("  angle-sum rejected:         {}", self.rejected_angle_sum);
        log::info!("  z rejected:                 {}", self.rejected_z);
        log::info!("  solver failures:            {}", self.solver_failures);
        log::info!("lifetimes (paired):           {}", self.paired_lifetimes);
        log::info!("lifetimes (in event):         {}", self.in_event_lifetimes);
        log::info!("candidates emitted:           {}", self.candidates_emitted);
        log::info!(
            "low-confidence hits:          {} classified, {} after veto, {} selected, {} emitted",
            self.low_confidence.classified,
            self.low_confidence.after_veto,
            self.low_confidence.selected,
            self.low_confidence.emitted
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_merge_adds_every_counter() {
        let mut a = PipelineStatistics {
            windows_processed: 2,
            hits_seen: 10,
            clusters_formed: 4,
            candidates_emitted: 1,
            low_confidence: LowConfidenceCounts {
                classified: 3,
                ..LowConfidenceCounts::default()
            },
            ..PipelineStatistics::default()
        };
        let b = PipelineStatistics {
            windows_processed: 1,
            windows_dropped: 1,
            hits_seen: 5,
            clusters_formed: 4,
            candidates_emitted: 1,
            low_confidence: LowConfidenceCounts {
                classified: 1,
                emitted: 1,
                ..LowConfidenceCounts::default()
            },
            ..PipelineStatistics::default()
        };
        a.merge(&b);
        assert_eq!(a.windows_processed, 3);
        assert_eq!(a.windows_dropped, 1);
        assert_eq!(a.hits_seen, 15);
        assert_eq!(a.low_confidence.classified, 4);
        assert_eq!(a.low_confidence.emitted, 1);
        assert_relative_eq!(a.emission_ratio(), 0.25);
    }

    #[test]
    fn test_emission_ratio_of_empty_run() {
        assert_eq!(PipelineStatistics::new().emission_ratio(), 0.0);
    }
}
