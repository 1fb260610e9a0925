//! JSON run configuration.

use crate::Result;
use opsfinder_core::{Band, CutConfiguration, Error as CoreError};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Default transverse chamber radius (cm).
pub const DEFAULT_CHAMBER_RADIUS_CM: f64 = 10.0;

/// Cut configuration plus solver geometry, as loaded from a run file.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Selection cuts.
    pub cuts: CutConfiguration,
    /// Transverse radius accepted by the reference solver (cm).
    pub chamber_radius_cm: f64,
}

#[derive(Deserialize)]
struct JsonBand {
    low: f64,
    high: f64,
}

impl From<JsonBand> for Band {
    fn from(band: JsonBand) -> Self {
        Band::new(band.low, band.high)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonConfig {
    cluster_time_window_ps: Option<f64>,
    tot_annihilation_ns: Option<JsonBand>,
    tot_prompt_ns: Option<JsonBand>,
    angle_sum_cut_deg: Option<f64>,
    #[serde(default)]
    angle_cut_enabled: bool,
    same_element_theta_veto_deg: Option<f64>,
    dvt_veto_threshold: Option<f64>,
    prompt_quality_band: Option<JsonBand>,
    max_hit_z_cm: Option<f64>,
    skip_filtered_hits: Option<bool>,
    chamber_radius_cm: Option<f64>,
}

impl RunConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, lacks
    /// a required parameter or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let json_config: JsonConfig = serde_json::from_reader(BufReader::new(file))?;
        Self::from_json_config(json_config)
    }

    /// Loads a configuration from a JSON string.
    ///
    /// # Errors
    /// See [`RunConfig::from_file`].
    pub fn from_json(json: &str) -> Result<Self> {
        let json_config: JsonConfig = serde_json::from_str(json)?;
        Self::from_json_config(json_config)
    }

    fn from_json_config(config: JsonConfig) -> Result<Self> {
        let window = config
            .cluster_time_window_ps
            .ok_or(CoreError::MissingParameter("cluster_time_window_ps"))?;
        let annihilation = config
            .tot_annihilation_ns
            .ok_or(CoreError::MissingParameter("tot_annihilation_ns"))?;
        let prompt = config
            .tot_prompt_ns
            .ok_or(CoreError::MissingParameter("tot_prompt_ns"))?;
        let angle_sum_cut = config
            .angle_sum_cut_deg
            .ok_or(CoreError::MissingParameter("angle_sum_cut_deg"))?;

        let mut cuts =
            CutConfiguration::new(annihilation.into(), prompt.into(), window, angle_sum_cut)
                .with_angle_cut(config.angle_cut_enabled)
                .with_skip_filtered_hits(config.skip_filtered_hits.unwrap_or(true));
        if let Some(degrees) = config.same_element_theta_veto_deg {
            cuts = cuts.with_theta_veto(degrees);
        }
        if let Some(threshold) = config.dvt_veto_threshold {
            cuts = cuts.with_dvt_threshold(threshold);
        }
        if let Some(band) = config.prompt_quality_band {
            cuts = cuts.with_prompt_quality_band(band.into());
        }
        if let Some(max_z) = config.max_hit_z_cm {
            cuts = cuts.with_max_hit_z(max_z);
        }
        cuts.validate()?;

        let chamber_radius_cm = config
            .chamber_radius_cm
            .unwrap_or(DEFAULT_CHAMBER_RADIUS_CM);
        if !(chamber_radius_cm.is_finite() && chamber_radius_cm > 0.0) {
            return Err(CoreError::InvalidParameter {
                name: "chamber_radius_cm",
                reason: format!("{chamber_radius_cm} is not a positive radius"),
            }
            .into());
        }

        Ok(Self {
            cuts,
            chamber_radius_cm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const MINIMAL: &str = r#"{
        "cluster_time_window_ps": 5000.0,
        "tot_annihilation_ns": { "low": 15.0, "high": 25.0 },
        "tot_prompt_ns": { "low": 0.0, "high": 10.0 },
        "angle_sum_cut_deg": 190.0
    }"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = RunConfig::from_json(MINIMAL).unwrap();
        assert_eq!(config.cuts.cluster_time_window_ps, 5000.0);
        assert_eq!(config.cuts.tot_annihilation, Band::new(15.0, 25.0));
        assert!(!config.cuts.angle_cut_enabled);
        assert_eq!(config.cuts.same_element_theta_veto_deg, 8.0);
        assert_eq!(config.cuts.dvt_veto_threshold, -1.8);
        assert_eq!(config.cuts.prompt_quality_band, Band::new(1.8, 2.2));
        assert_eq!(config.cuts.max_hit_z_cm, None);
        assert!(config.cuts.skip_filtered_hits);
        assert_eq!(config.chamber_radius_cm, DEFAULT_CHAMBER_RADIUS_CM);
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "cluster_time_window_ps": 4000.0,
            "tot_annihilation_ns": { "low": 15.0, "high": 25.0 },
            "tot_prompt_ns": { "low": 0.0, "high": 10.0 },
            "angle_sum_cut_deg": 200.0,
            "angle_cut_enabled": true,
            "same_element_theta_veto_deg": 6.0,
            "dvt_veto_threshold": -2.0,
            "prompt_quality_band": { "low": 1.5, "high": 2.5 },
            "max_hit_z_cm": 23.0,
            "skip_filtered_hits": false,
            "chamber_radius_cm": 12.0
        }"#;
        let config = RunConfig::from_json(json).unwrap();
        assert!(config.cuts.angle_cut_enabled);
        assert!(!config.cuts.skip_filtered_hits);
        assert_eq!(config.cuts.same_element_theta_veto_deg, 6.0);
        assert_eq!(config.cuts.dvt_veto_threshold, -2.0);
        assert_eq!(config.cuts.prompt_quality_band, Band::new(1.5, 2.5));
        assert_eq!(config.cuts.max_hit_z_cm, Some(23.0));
        assert_eq!(config.chamber_radius_cm, 12.0);
    }

    #[test]
    fn test_missing_required_parameter() {
        let json = r#"{
            "cluster_time_window_ps": 5000.0,
            "tot_annihilation_ns": { "low": 15.0, "high": 25.0 },
            "angle_sum_cut_deg": 190.0
        }"#;
        match RunConfig::from_json(json) {
            Err(Error::Core(CoreError::MissingParameter(name))) => {
                assert_eq!(name, "tot_prompt_ns");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_invalid_band_rejected() {
        let json = MINIMAL.replace(r#""low": 15.0, "high": 25.0"#, r#""low": 25.0, "high": 15.0"#);
        assert!(matches!(
            RunConfig::from_json(&json),
            Err(Error::Core(CoreError::InvalidParameter { .. }))
        ));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let json = MINIMAL.replace(
            "\"angle_sum_cut_deg\"",
            "\"angle_sum_cut\": 1.0, \"angle_sum_cut_deg\"",
        );
        assert!(matches!(RunConfig::from_json(&json), Err(Error::Json(_))));
    }
}
