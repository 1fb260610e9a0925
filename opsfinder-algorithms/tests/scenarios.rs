//! End-to-end checks of the documented selection scenarios.
#![allow(clippy::uninlined_format_args)]

use approx::assert_abs_diff_eq;
use opsfinder_algorithms::{
    EventSelector, Pipeline, PipelineStatistics, ScatteringVeto, VetoVerdict, WindowClusterer,
};
use opsfinder_core::kinematics::flight_residual;
use opsfinder_core::{
    tag_all, Band, CutConfiguration, DetectorElement, EventType, Hit, TimeWindow, Vector3,
    SPEED_OF_LIGHT_CM_PER_NS,
};

const RADIUS: f64 = 42.5;

fn cuts() -> CutConfiguration {
    CutConfiguration::new(Band::new(15.0, 25.0), Band::new(0.0, 10.0), 5000.0, 190.0)
}

fn barrel_hit(time: f64, tot: f64, theta: f64, slot: u16) -> Hit {
    let phi = theta.to_radians();
    let position = Vector3::new(RADIUS * phi.cos(), RADIUS * phi.sin(), 0.0);
    Hit::new(time, tot, position, DetectorElement::new(1, slot, theta))
}

/// Photon emitted from `vertex` at `t0` along azimuth `phi_deg`.
fn photon(vertex: Vector3<f64>, t0: f64, phi_deg: f64, slot: u16) -> Hit {
    let (s, c) = phi_deg.to_radians().sin_cos();
    let b = 2.0 * (vertex.x * c + vertex.y * s);
    let q = vertex.x * vertex.x + vertex.y * vertex.y - RADIUS * RADIUS;
    let path = (-b + (b * b - 4.0 * q).sqrt()) / 2.0;
    let position = vertex + Vector3::new(c, s, 0.0) * path;
    let time = t0 + path / SPEED_OF_LIGHT_CM_PER_NS * 1000.0;
    let theta = position.y.atan2(position.x).to_degrees().rem_euclid(360.0);
    Hit::new(time, 20.0, position, DetectorElement::new(1, slot, theta))
}

fn sorted(mut hits: Vec<Hit>) -> Vec<Hit> {
    hits.sort_by(|a, b| a.time.total_cmp(&b.time));
    hits
}

#[test]
fn test_clusters_measured_from_seed() {
    let cuts = cuts();
    let mut hits = vec![
        barrel_hit(0.0, 20.0, 0.0, 1),
        barrel_hit(1000.0, 5.0, 90.0, 2),
        barrel_hit(10_000.0, 20.0, 180.0, 3),
    ];
    let classes = tag_all(&mut hits, &cuts);
    assert!(classes.iter().all(|class| class.is_accepted()));
    assert!(hits[0].is_annihilation());
    assert!(hits[1].is_prompt());

    let clusters = WindowClusterer::from_cuts(&cuts).cluster(&hits, |h| !h.quality.is_rejected());
    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[0].hits, vec![hits[0].clone(), hits[1].clone()]);
    assert_eq!(clusters[1].hits, vec![hits[2].clone()]);
}

#[test]
fn test_duplicate_strip_leaves_too_few_annihilation_hits() {
    let cuts = cuts();
    let mut hits = vec![
        barrel_hit(0.0, 20.0, 0.0, 1),
        barrel_hit(100.0, 20.0, 0.0, 1),
        barrel_hit(1000.0, 20.0, 40.0, 6),
        barrel_hit(1100.0, 5.0, 270.0, 9),
    ];
    tag_all(&mut hits, &cuts);
    let cluster = hits.into_iter().collect();

    let cleaned = ScatteringVeto::from_cuts(&cuts).veto(cluster).unwrap();
    assert_eq!(cleaned.annihilation_count(), 1);
    assert_eq!(cleaned.prompt_count(), 1);
    assert!(EventSelector::from_cuts(&cuts).select(cleaned).is_none());
}

#[test]
fn test_residual_threshold_both_sides() {
    let cuts = cuts();
    let flight = RADIUS * 3.0_f64.sqrt() / SPEED_OF_LIGHT_CM_PER_NS * 1000.0;
    let mut hits = vec![
        barrel_hit(0.0, 20.0, 0.0, 1),
        barrel_hit(flight - 30.0, 20.0, 120.0, 2),
        barrel_hit(flight + 40.0, 20.0, 240.0, 3),
        barrel_hit(flight + 100.0, 5.0, 60.0, 4).with_reco_quality(2.0),
    ];
    tag_all(&mut hits, &cuts);

    let d01 = hits[0].distance(&hits[1]);
    let expected = flight_residual(hits[0].time, hits[1].time, d01);
    assert!(expected.abs() < 0.1);
    assert!(expected < 0.0);

    let cluster: opsfinder_core::EventCandidate = hits.into_iter().collect();
    let min_dvt = match ScatteringVeto::from_cuts(&cuts).apply(cluster.clone()) {
        VetoVerdict::Accepted { min_dvt, cluster, .. } => {
            let selected = EventSelector::from_cuts(&cuts).select(cluster).unwrap();
            assert_eq!(selected.annihilation_count(), 3);
            assert_eq!(selected.prompt_count(), 1);
            min_dvt.unwrap()
        }
        other => panic!("unexpected verdict {:?}", other),
    };
    assert_abs_diff_eq!(min_dvt, expected, epsilon = 1e-12);

    assert!(ScatteringVeto::new(8.0, min_dvt).veto(cluster.clone()).is_none());
    assert!(ScatteringVeto::new(8.0, min_dvt - 1e-6).veto(cluster).is_some());
}

#[test]
fn test_pairing_emits_lifetime() {
    let vertex = Vector3::new(1.0, 2.0, 0.0);
    let prompt = Hit::new(
        -6000.0,
        5.0,
        Vector3::new(1.0, 32.0, 0.0),
        DetectorElement::new(1, 40, 88.0),
    )
    .with_reco_quality(2.0);
    let hits = sorted(vec![
        prompt,
        photon(vertex, 100.0, 0.0, 1),
        photon(vertex, 100.0, 30.0, 4),
        photon(vertex, 100.0, 200.0, 20),
    ]);
    let window = TimeWindow::new(11, hits);

    let pipeline = Pipeline::new(cuts()).unwrap();
    let mut stats = PipelineStatistics::new();
    let candidates = pipeline.process_window(&window, &mut stats).unwrap();
    assert_eq!(candidates.len(), 1, "{:?}", stats);

    let candidate = &candidates[0];
    assert_eq!(candidate.event_type, EventType::ThreeGamma);
    let point = candidate.annihilation_point.unwrap();
    assert_abs_diff_eq!((point - vertex).norm(), 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(candidate.annihilation_time.unwrap(), 100.0, epsilon = 1e-3);

    let corrected = -6000.0 - 1000.0 * 30.0 / 29.979_245_8;
    assert_abs_diff_eq!(candidate.lifetime.unwrap(), 100.0 - corrected, epsilon = 1e-3);
    assert_eq!(stats.paired_lifetimes, 1);
    assert_eq!(stats.selected_prompt, 1);

    let angles = candidate.angles.unwrap();
    assert_abs_diff_eq!(angles.total(), 360.0, epsilon = 1e-6);
}

#[test]
fn test_corrected_prompt_time_at_thirty_cm() {
    let corrected = opsfinder_core::kinematics::corrected_prompt_time(
        500.0,
        &Vector3::new(30.0, 0.0, 0.0),
        &Vector3::zeros(),
    );
    assert_abs_diff_eq!(corrected, -500.69, epsilon = 0.01);
}

#[test]
fn test_in_event_prompt_gives_lifetime() {
    let vertex = Vector3::new(1.0, 2.0, 0.0);
    let prompt = Hit::new(
        80.0,
        5.0,
        Vector3::new(1.0, 32.0, 0.0),
        DetectorElement::new(1, 40, 88.0),
    );
    let hits = sorted(vec![
        prompt,
        photon(vertex, 100.0, 0.0, 1),
        photon(vertex, 100.0, 30.0, 4),
        photon(vertex, 100.0, 200.0, 20),
    ]);
    let pipeline = Pipeline::new(cuts()).unwrap();
    let mut stats = PipelineStatistics::new();
    let candidates = pipeline
        .process_window(&TimeWindow::new(0, hits), &mut stats)
        .unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].len(), 4);
    let corrected = 80.0 - 1000.0 * 30.0 / 29.979_245_8;
    assert_abs_diff_eq!(
        candidates[0].lifetime.unwrap(),
        100.0 - corrected,
        epsilon = 1e-3
    );
    assert_eq!(stats.in_event_lifetimes, 1);
    assert_eq!(stats.paired_lifetimes, 0);
}
