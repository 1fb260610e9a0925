//! opsfinder-algorithms: Candidate assembly stages for o-Ps->3g selection.
//!
//! This crate provides the stages run on every time window:
//! - **WindowClusterer** - seed-relative time-window grouping
//! - **ScatteringVeto** - pairwise same-strip, azimuthal and time-of-flight tests
//! - **EventSelector** - multiplicity gate with optional angle-sum cut
//! - **AngleAnalyzer** - opening angles from the solved vertex
//! - **CrossWindowPairing** - prompt/annihilation pairing and lifetime
//!
//! [`Pipeline`] chains them together with a [`GeometricSolver`].
//!
#![warn(missing_docs)]

mod angles;
mod pairing;
mod processing;
mod selection;
pub mod solver;
mod statistics;
mod veto;
mod window;

pub use angles::AngleAnalyzer;
pub use pairing::{intra_event_lifetime, lifetime, CrossWindowPairing, Pairing};
pub use processing::Pipeline;
pub use selection::{
    annihilation_triple, EventSelector, Selection, ANNIHILATION_HITS, MAX_PROMPT_HITS,
};
pub use solver::{DecaySolution, GeometricSolver, SolverError, TrilaterationSolver};
pub use statistics::{LowConfidenceCounts, PipelineStatistics};
pub use veto::{PairVerdict, ScatteringVeto, VetoVerdict};
pub use window::{FilteredHitPolicy, WindowClusterer};

// Re-export the core error type
pub use opsfinder_core::{Error, Result};
