//! Pairing of a deexcitation candidate with a three-photon candidate.
//!
//! Within one window a lifetime is derived only when the pairing is
//! unambiguous: one `Prompt` candidate, one solved `ThreeGamma` candidate,
//! and exactly one cleanly reconstructed hit in the prompt cluster.

use opsfinder_core::kinematics::corrected_prompt_time;
use opsfinder_core::{Band, CutConfiguration, EventCandidate, EventType, Hit, Vector3};

/// Outcome of pairing the candidates of one window.
#[derive(Debug, Clone, PartialEq)]
pub enum Pairing {
    /// The three-photon candidate with its lifetime attached.
    Paired(EventCandidate),
    /// No unambiguous pair; the three-photon candidates, unchanged.
    Unpaired(Vec<EventCandidate>),
}

/// Lifetime of a decay at `vertex`/`annihilation_time` started by `prompt`.
#[must_use]
pub fn lifetime(annihilation_time: f64, vertex: &Vector3<f64>, prompt: &Hit) -> f64 {
    annihilation_time - corrected_prompt_time(prompt.time, &prompt.position, vertex)
}

/// Lifetime from the prompt hit carried inside a solved three-photon candidate.
///
/// Returns `None` unless the candidate is solved and holds exactly one
/// prompt-tagged hit.
#[must_use]
pub fn intra_event_lifetime(candidate: &EventCandidate) -> Option<f64> {
    let vertex = candidate.annihilation_point?;
    let time = candidate.annihilation_time?;
    let mut prompts = candidate.prompt_hits();
    match (prompts.next(), prompts.next()) {
        (Some(prompt), None) => Some(lifetime(time, &vertex, prompt)),
        _ => None,
    }
}

/// Cross-candidate lifetime pairing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossWindowPairing {
    quality_band: Band,
}

impl Default for CrossWindowPairing {
    fn default() -> Self {
        Self::new(CutConfiguration::DEFAULT_PROMPT_QUALITY_BAND)
    }
}

impl CrossWindowPairing {
    /// Creates a pairing stage accepting prompt hits whose reconstruction
    /// score lies strictly inside `quality_band`.
    #[must_use]
    pub fn new(quality_band: Band) -> Self {
        Self { quality_band }
    }

    /// Creates a pairing stage from the run configuration.
    #[must_use]
    pub fn from_cuts(cuts: &CutConfiguration) -> Self {
        Self::new(cuts.prompt_quality_band)
    }

    /// Returns the prompt-quality band.
    #[must_use]
    pub fn quality_band(&self) -> Band {
        self.quality_band
    }

    /// The single in-band hit of a prompt cluster, if it is unique.
    #[must_use]
    pub fn reference_hit<'a>(&self, prompt: &'a EventCandidate) -> Option<&'a Hit> {
        let mut in_band = prompt
            .iter()
            .filter(|hit| self.quality_band.contains(hit.reco_quality));
        match (in_band.next(), in_band.next()) {
            (Some(hit), None) => Some(hit),
            _ => None,
        }
    }

    /// Pairs the candidates of one window.
    ///
    /// Prompt candidates are consumed either way; candidates of any other
    /// type are dropped.
    #[must_use]
    pub fn pair(&self, candidates: Vec<EventCandidate>) -> Pairing {
        let (mut three_gamma, prompt): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .filter(|candidate| candidate.event_type != EventType::Unknown)
            .partition(|candidate| candidate.event_type == EventType::ThreeGamma);

        if three_gamma.len() != 1 || prompt.len() != 1 {
            return Pairing::Unpaired(three_gamma);
        }
        let Some(reference) = self.reference_hit(&prompt[0]) else {
            log::debug!("pairing skipped: no unique prompt hit in the quality band");
            return Pairing::Unpaired(three_gamma);
        };

        let candidate = &three_gamma[0];
        let (Some(vertex), Some(time)) =
            (candidate.annihilation_point, candidate.annihilation_time)
        else {
            return Pairing::Unpaired(three_gamma);
        };
        let value = lifetime(time, &vertex, reference);

        let mut paired = three_gamma.swap_remove(0);
        paired.lifetime = Some(value);
        Pairing::Paired(paired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use opsfinder_core::{DetectorElement, QualityTag};

    fn prompt_hit(time: f64, position: Vector3<f64>, reco_quality: f64) -> Hit {
        Hit::new(time, 5.0, position, DetectorElement::new(1, 40, 90.0))
            .with_quality(QualityTag::PROMPT)
            .with_reco_quality(reco_quality)
    }

    fn three_gamma(time: f64) -> EventCandidate {
        let mut candidate: EventCandidate = (0..3)
            .map(|i| {
                Hit::new(0.0, 20.0, Vector3::zeros(), DetectorElement::new(1, i, 0.0))
                    .with_quality(QualityTag::ANNIHILATION)
            })
            .collect::<EventCandidate>()
            .with_event_type(EventType::ThreeGamma);
        candidate.set_annihilation(Vector3::zeros(), time);
        candidate
    }

    fn prompt(hits: Vec<Hit>) -> EventCandidate {
        hits.into_iter()
            .collect::<EventCandidate>()
            .with_event_type(EventType::Prompt)
    }

    #[test]
    fn test_lifetime_from_corrected_prompt_time() {
        let window = vec![
            prompt(vec![prompt_hit(500.0, Vector3::new(30.0, 0.0, 0.0), 2.0)]),
            three_gamma(1200.0),
        ];
        match CrossWindowPairing::default().pair(window) {
            Pairing::Paired(candidate) => {
                let corrected = 500.0 - 1000.0 * 30.0 / 29.979_245_8;
                assert_abs_diff_eq!(corrected, -500.692_4, epsilon = 1e-3);
                assert_abs_diff_eq!(
                    candidate.lifetime.unwrap(),
                    1200.0 - corrected,
                    epsilon = 1e-9
                );
                assert_eq!(candidate.event_type, EventType::ThreeGamma);
            }
            other => panic!("unexpected pairing {other:?}"),
        }
    }

    #[test]
    fn test_band_is_exclusive() {
        let pairing = CrossWindowPairing::default();
        for quality in [1.8, 2.2, 0.7] {
            let window = vec![
                prompt(vec![prompt_hit(0.0, Vector3::zeros(), quality)]),
                three_gamma(0.0),
            ];
            assert!(matches!(pairing.pair(window), Pairing::Unpaired(ref c) if c.len() == 1));
        }
    }

    #[test]
    fn test_ambiguous_prompt_hits() {
        let window = vec![
            prompt(vec![
                prompt_hit(0.0, Vector3::zeros(), 2.0),
                prompt_hit(10.0, Vector3::zeros(), 1.9),
            ]),
            three_gamma(0.0),
        ];
        assert!(matches!(
            CrossWindowPairing::default().pair(window),
            Pairing::Unpaired(_)
        ));
    }

    #[test]
    fn test_requires_one_candidate_of_each_type() {
        let pairing = CrossWindowPairing::default();
        let two_triples = vec![
            prompt(vec![prompt_hit(0.0, Vector3::zeros(), 2.0)]),
            three_gamma(0.0),
            three_gamma(10.0),
        ];
        match pairing.pair(two_triples) {
            Pairing::Unpaired(candidates) => {
                assert_eq!(candidates.len(), 2);
                assert!(candidates.iter().all(|c| c.lifetime.is_none()));
            }
            other => panic!("unexpected pairing {other:?}"),
        }

        let no_prompt = vec![three_gamma(0.0)];
        assert!(matches!(pairing.pair(no_prompt), Pairing::Unpaired(ref c) if c.len() == 1));
    }

    #[test]
    fn test_unsolved_triple_is_not_paired() {
        let mut unsolved = three_gamma(0.0);
        unsolved.annihilation_point = None;
        unsolved.annihilation_time = None;
        let window = vec![
            prompt(vec![prompt_hit(0.0, Vector3::zeros(), 2.0)]),
            unsolved,
        ];
        assert!(matches!(
            CrossWindowPairing::default().pair(window),
            Pairing::Unpaired(_)
        ));
    }

    #[test]
    fn test_intra_event_lifetime() {
        let mut candidate = three_gamma(800.0);
        assert_eq!(intra_event_lifetime(&candidate), None);

        candidate.push(prompt_hit(500.0, Vector3::new(0.0, 30.0, 0.0), 0.0));
        let corrected = 500.0 - 1000.0 * 30.0 / 29.979_245_8;
        assert_abs_diff_eq!(
            intra_event_lifetime(&candidate).unwrap(),
            800.0 - corrected,
            epsilon = 1e-9
        );

        candidate.push(prompt_hit(600.0, Vector3::zeros(), 0.0));
        assert_eq!(intra_event_lifetime(&candidate), None);
    }
}
