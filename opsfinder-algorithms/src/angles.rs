//! Opening-angle analysis of solved three-photon candidates.

use crate::selection::annihilation_triple;
use opsfinder_core::{Error, EventCandidate, OpeningAngles, Result};

const STAGE: &str = "angle analysis";

/// Computes the opening angles of a triple as seen from its decay vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AngleAnalyzer;

impl AngleAnalyzer {
    /// Creates an analyzer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Opening angles of the candidate's annihilation triple.
    ///
    /// # Errors
    /// Fails if the candidate has no solved vertex, does not hold exactly
    /// three annihilation hits, or a hit sits on the vertex.
    pub fn analyze(&self, candidate: &EventCandidate) -> Result<OpeningAngles> {
        let vertex = candidate.annihilation_point.ok_or_else(|| {
            Error::DegenerateGeometry("candidate has no solved vertex".to_string())
        })?;
        let [a, b, c] = annihilation_triple(candidate, STAGE)?;
        OpeningAngles::from_vertex(&vertex, [&a.position, &b.position, &c.position])
    }

    /// Computes the opening angles and stores them on the candidate.
    ///
    /// # Errors
    /// See [`AngleAnalyzer::analyze`].
    pub fn annotate(&self, candidate: &mut EventCandidate) -> Result<OpeningAngles> {
        let angles = self.analyze(candidate)?;
        candidate.angles = Some(angles);
        Ok(angles)
    }
}
