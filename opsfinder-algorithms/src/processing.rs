//! Per-window candidate assembly.
//!
//! One window runs through classification, clustering, the scattering veto,
//! selection, the axial cut, the geometric solver, angle analysis and lifetime
//! pairing before the next window is touched.

use crate::angles::AngleAnalyzer;
use crate::pairing::{intra_event_lifetime, CrossWindowPairing, Pairing};
use crate::selection::{annihilation_triple, EventSelector, Selection};
use crate::solver::{GeometricSolver, TrilaterationSolver};
use crate::statistics::PipelineStatistics;
use crate::veto::{ScatteringVeto, VetoVerdict};
use crate::window::WindowClusterer;
use opsfinder_core::{
    tag_all, CutConfiguration, EventCandidate, HitClass, Result, TimeWindow, TotNormalization,
};

/// Candidate-finding pipeline over independent time windows.
#[derive(Debug, Clone)]
pub struct Pipeline<S = TrilaterationSolver> {
    cuts: CutConfiguration,
    clusterer: WindowClusterer,
    veto: ScatteringVeto,
    selector: EventSelector,
    analyzer: AngleAnalyzer,
    pairing: CrossWindowPairing,
    solver: S,
    normalization: Option<TotNormalization>,
}

impl Pipeline<TrilaterationSolver> {
    /// Creates a pipeline with the reference trilateration solver.
    ///
    /// # Errors
    /// Returns an error if the configuration does not validate.
    pub fn new(cuts: CutConfiguration) -> Result<Self> {
        Self::with_solver(cuts, TrilaterationSolver::default())
    }
}

impl<S: GeometricSolver> Pipeline<S> {
    /// Creates a pipeline around the given solver.
    ///
    /// # Errors
    /// Returns an error if the configuration does not validate.
    pub fn with_solver(cuts: CutConfiguration, solver: S) -> Result<Self> {
        cuts.validate()?;
        Ok(Self {
            clusterer: WindowClusterer::from_cuts(&cuts),
            veto: ScatteringVeto::from_cuts(&cuts),
            selector: EventSelector::from_cuts(&cuts),
            analyzer: AngleAnalyzer::new(),
            pairing: CrossWindowPairing::from_cuts(&cuts),
            solver,
            normalization: None,
            cuts,
        })
    }

    /// Normalizes the energy proxy of every hit before classification.
    #[must_use]
    pub fn with_normalization(mut self, normalization: TotNormalization) -> Self {
        self.normalization = Some(normalization);
        self
    }

    /// Returns the run configuration.
    #[must_use]
    pub fn cuts(&self) -> &CutConfiguration {
        &self.cuts
    }

    /// Returns the geometric solver.
    #[must_use]
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Returns the clusterer.
    #[must_use]
    pub fn clusterer(&self) -> &WindowClusterer {
        &self.clusterer
    }

    /// Processes one window.
    ///
    /// `stats` is updated only if the window completes.
    ///
    /// # Errors
    /// Returns an error on unordered input or when a candidate reaching the
    /// solver does not hold exactly three annihilation hits.
    pub fn process_window(
        &self,
        window: &TimeWindow,
        stats: &mut PipelineStatistics,
    ) -> Result<Vec<EventCandidate>> {
        window.check_order()?;
        let mut local = PipelineStatistics::new();
        local.hits_seen = window.len() as u64;

        let mut hits = window.hits.clone();
        if let Some(normalization) = &self.normalization {
            local.hits_unnormalized += normalization.apply(&mut hits) as u64;
        }

        for class in tag_all(&mut hits, &self.cuts) {
            match class {
                HitClass::Annihilation => local.hits_annihilation += 1,
                HitClass::Prompt => local.hits_prompt += 1,
                HitClass::Rejected => local.hits_rejected += 1,
            }
        }
        local.low_confidence.classified =
            hits.iter().filter(|hit| hit.low_confidence).count() as u64;

        let clusters = self
            .clusterer
            .cluster(&hits, |hit| !hit.quality.is_rejected());
        local.clusters_formed = clusters.len() as u64;

        let mut three_gamma = Vec::new();
        let mut prompt = Vec::new();
        for cluster in clusters {
            let cluster = match self.veto.apply(cluster) {
                VetoVerdict::Accepted {
                    cluster, removed, ..
                } => {
                    local.clusters_after_angular_veto += 1;
                    local.clusters_after_tof_veto += 1;
                    local.hits_removed_same_element += removed as u64;
                    local.low_confidence.after_veto += cluster.low_confidence_count() as u64;
                    cluster
                }
                VetoVerdict::RejectedTimeOfFlight { .. } => {
                    local.clusters_after_angular_veto += 1;
                    continue;
                }
                VetoVerdict::RejectedAngular { .. } => continue,
            };

            match self.selector.evaluate(cluster) {
                Selection::ThreeGamma(candidate) => {
                    local.selected_three_gamma += 1;
                    local.low_confidence.selected += candidate.low_confidence_count() as u64;
                    three_gamma.push(candidate);
                }
                Selection::Prompt(candidate) => {
                    local.selected_prompt += 1;
                    prompt.push(candidate);
                }
                Selection::RejectedMultiplicity { .. } => local.rejected_multiplicity += 1,
                Selection::RejectedAngleSum { .. } => local.rejected_angle_sum += 1,
            }
        }

        let mut solved = Vec::with_capacity(three_gamma.len() + prompt.len());
        for mut candidate in three_gamma {
            if let Some(max_z) = self.cuts.max_hit_z_cm {
                if candidate.iter().any(|hit| hit.position.z.abs() > max_z) {
                    local.rejected_z += 1;
                    continue;
                }
            }

            let solution = match self
                .solver
                .solve(annihilation_triple(&candidate, "geometric solver")?)
            {
                Ok(solution) => solution,
                Err(err) => {
                    log::debug!("window {}: {} failed: {err}", window.index, self.solver.name());
                    local.solver_failures += 1;
                    continue;
                }
            };
            candidate.set_annihilation(solution.vertex, solution.time);

            if let Err(err) = self.analyzer.annotate(&mut candidate) {
                log::debug!("window {}: angle analysis failed: {err}", window.index);
                local.solver_failures += 1;
                continue;
            }
            solved.push(candidate);
        }
        solved.extend(prompt);

        let emitted = match self.pairing.pair(solved) {
            Pairing::Paired(candidate) => {
                local.paired_lifetimes += 1;
                vec![candidate]
            }
            Pairing::Unpaired(mut candidates) => {
                for candidate in &mut candidates {
                    if let Some(lifetime) = intra_event_lifetime(candidate) {
                        candidate.lifetime = Some(lifetime);
                        local.in_event_lifetimes += 1;
                    }
                }
                candidates
            }
        };

        local.candidates_emitted = emitted.len() as u64;
        local.low_confidence.emitted = emitted
            .iter()
            .map(|candidate| candidate.low_confidence_count() as u64)
            .sum();
        local.windows_processed = 1;
        stats.merge(&local);
        Ok(emitted)
    }

    /// Processes one window, dropping it on failure.
    ///
    /// A failed window is logged at `warn` and counted as dropped.
    pub fn run_window(
        &self,
        window: &TimeWindow,
        stats: &mut PipelineStatistics,
    ) -> Vec<EventCandidate> {
        match self.process_window(window, stats) {
            Ok(candidates) => candidates,
            Err(err) => {
                log::warn!("window {} dropped: {err}", window.index);
                stats.windows_dropped += 1;
                Vec::new()
            }
        }
    }

    /// Processes a sequence of windows in order.
    ///
    /// `emit` receives the index and candidates of every window that produced
    /// at least one candidate.
    ///
    /// # Errors
    /// Returns the first error yielded by `windows` or reported by `emit`;
    /// windows after it are not read.
    pub fn process_windows<I, F, E>(
        &self,
        windows: I,
        mut emit: F,
    ) -> std::result::Result<PipelineStatistics, E>
    where
        I: IntoIterator<Item = std::result::Result<TimeWindow, E>>,
        F: FnMut(u64, &[EventCandidate]) -> std::result::Result<(), E>,
    {
        let mut stats = PipelineStatistics::new();
        for window in windows {
            let window = window?;
            let candidates = self.run_window(&window, &mut stats);
            if !candidates.is_empty() {
                emit(window.index, &candidates)?;
            }
        }
        Ok(stats)
    }

    /// Sizes of the unfiltered clusters of a window.
    #[must_use]
    pub fn cluster_multiplicities(&self, window: &TimeWindow) -> Vec<usize> {
        self.clusterer
            .cluster_all(&window.hits)
            .iter()
            .map(EventCandidate::len)
            .collect()
    }
}
