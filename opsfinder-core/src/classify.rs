//! Hit classification by energy proxy.

use crate::config::CutConfiguration;
use crate::hit::{Hit, QualityTag};

/// Photon hypothesis of a single hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitClass {
    /// Neither band matched; the hit takes no further part.
    Rejected,
    /// Candidate photon of the three-photon decay.
    Annihilation,
    /// Candidate deexcitation photon.
    Prompt,
}

impl HitClass {
    /// Quality tag written for this class.
    #[must_use]
    pub fn quality_tag(self) -> QualityTag {
        match self {
            Self::Rejected => QualityTag::REJECTED,
            Self::Annihilation => QualityTag::ANNIHILATION,
            Self::Prompt => QualityTag::PROMPT,
        }
    }

    /// Returns true unless rejected.
    #[must_use]
    pub fn is_accepted(self) -> bool {
        self != Self::Rejected
    }
}

/// Classifies a hit by its energy proxy.
///
/// The annihilation band is tested first, so a value inside both bands is
/// an annihilation candidate.
#[must_use]
pub fn classify(hit: &Hit, cuts: &CutConfiguration) -> HitClass {
    if cuts.tot_annihilation.contains(hit.tot) {
        HitClass::Annihilation
    } else if cuts.tot_prompt.contains(hit.tot) {
        HitClass::Prompt
    } else {
        HitClass::Rejected
    }
}

/// Returns a tagged copy of the hit, or `None` if it is rejected.
///
/// Hits with an incomplete threshold measurement on either side are flagged
/// low-confidence; the flag never changes the tag.
#[must_use]
pub fn tag(hit: &Hit, cuts: &CutConfiguration) -> Option<Hit> {
    let class = classify(hit, cuts);
    if !class.is_accepted() {
        return None;
    }
    let mut tagged = hit.clone();
    tagged.quality = class.quality_tag();
    tagged.low_confidence = !hit.thresholds.is_complete();
    Some(tagged)
}

/// Tags every hit of a window in place and returns the class of each.
pub fn tag_all(hits: &mut [Hit], cuts: &CutConfiguration) -> Vec<HitClass> {
    hits.iter_mut()
        .map(|hit| {
            let class = classify(hit, cuts);
            hit.quality = class.quality_tag();
            hit.low_confidence = class.is_accepted() && !hit.thresholds.is_complete();
            class
        })
        .collect()
}
