//! opsfinder-core: Core types for positronium decay candidate selection.
//!
//! This crate provides the hit and event data model, the per-run cut
//! configuration, energy-proxy classification and the kinematic helpers
//! shared by the selection stages.
//!

pub mod classify;
pub mod config;
pub mod error;
pub mod event;
pub mod hit;
pub mod kinematics;
pub mod tot;

pub use classify::{classify, tag, tag_all, HitClass};
pub use config::{Band, CutConfiguration};
pub use error::{Error, Result};
pub use event::{EventCandidate, EventType};
pub use hit::{DetectorElement, Hit, QualityTag, ThresholdCount, TimeWindow};
pub use kinematics::{OpeningAngles, SPEED_OF_LIGHT_CM_PER_NS};
pub use tot::TotNormalization;

pub use nalgebra::Vector3;
