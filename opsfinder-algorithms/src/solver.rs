//! Decay vertex reconstruction from three annihilation hits.
//!
//! The pipeline only depends on the [`GeometricSolver`] trait.
//! [`TrilaterationSolver`] is a reference implementation that assumes the
//! decay vertex lies in the plane of the three hits, which holds for a
//! three-body decay at rest.

use nalgebra::{Matrix2, Vector2, Vector3};
use opsfinder_core::kinematics::PS_PER_NS;
use opsfinder_core::{Hit, SPEED_OF_LIGHT_CM_PER_NS};
use thiserror::Error;

/// Solver failure; `code` is never zero.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverError {
    /// No physical solution exists for the triple.
    #[error("no physical solution (error code {code})")]
    NoSolution {
        /// Non-zero solver error code.
        code: i32,
    },
}

impl SolverError {
    /// Integer error code of the failure.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::NoSolution { code } => *code,
        }
    }
}

/// Solved decay point and time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecaySolution {
    /// Decay vertex (cm).
    pub vertex: Vector3<f64>,
    /// Decay time (ps).
    pub time: f64,
}

/// Turns three annihilation hits into a decay vertex and time.
pub trait GeometricSolver {
    /// Returns the name of the solver.
    fn name(&self) -> &'static str;

    /// Solves one triple.
    ///
    /// # Errors
    /// Returns [`SolverError`] when the triple has no physical solution.
    fn solve(&self, hits: [&Hit; 3]) -> Result<DecaySolution, SolverError>;
}

/// Hits are collinear or coincident.
pub const ERROR_DEGENERATE: i32 = 1;
/// The vertex equation has no real root.
pub const ERROR_NO_ROOT: i32 = 2;
/// Every root would emit after a detection.
pub const ERROR_ACAUSAL: i32 = 3;
/// Every causal root lies outside the chamber.
pub const ERROR_OUTSIDE_CHAMBER: i32 = 4;

/// In-plane time-difference-of-arrival solver.
///
/// With `t0` the decay time, each hit satisfies `|x − p_i| = c·(t_i − t0)`.
/// Differences of these equations are linear in the in-plane vertex for a
/// given `t0`; substituting back leaves a quadratic in `t0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrilaterationSolver {
    chamber_radius_cm: f64,
}

impl Default for TrilaterationSolver {
    fn default() -> Self {
        Self {
            chamber_radius_cm: 10.0,
        }
    }
}

impl TrilaterationSolver {
    /// Creates a solver accepting vertices up to `chamber_radius_cm` from the axis.
    #[must_use]
    pub fn new(chamber_radius_cm: f64) -> Self {
        Self { chamber_radius_cm }
    }

    /// Returns the chamber radius (cm).
    #[must_use]
    pub fn chamber_radius(&self) -> f64 {
        self.chamber_radius_cm
    }
}

impl GeometricSolver for TrilaterationSolver {
    fn name(&self) -> &'static str {
        "Trilateration"
    }

    fn solve(&self, hits: [&Hit; 3]) -> Result<DecaySolution, SolverError> {
        let fail = |code| SolverError::NoSolution { code };
        let c = SPEED_OF_LIGHT_CM_PER_NS / PS_PER_NS;

        let origin = hits[0].position;
        let e1 = hits[1].position - origin;
        let e2 = hits[2].position - origin;
        let normal = e1.cross(&e2);
        if e1.norm() <= f64::EPSILON || normal.norm() <= 1e-9 * e1.norm() * e2.norm() {
            return Err(fail(ERROR_DEGENERATE));
        }

        // in-plane basis with hit 0 at the origin
        let u = e1.normalize();
        let v = normal.normalize().cross(&u);
        let q1 = Vector2::new(e1.dot(&u), e1.dot(&v));
        let q2 = Vector2::new(e2.dot(&u), e2.dot(&v));

        // times relative to hit 0
        let t0_ref = hits[0].time;
        let t1 = hits[1].time - t0_ref;
        let t2 = hits[2].time - t0_ref;

        let a = Matrix2::new(2.0 * q1.x, 2.0 * q1.y, 2.0 * q2.x, 2.0 * q2.y);
        let b = Vector2::new(
            q1.norm_squared() - c * c * t1 * t1,
            q2.norm_squared() - c * c * t2 * t2,
        );
        let w = Vector2::new(2.0 * c * c * t1, 2.0 * c * c * t2);
        let a_inv = a.try_inverse().ok_or_else(|| fail(ERROR_DEGENERATE))?;
        let m = a_inv * b;
        let k = a_inv * w;

        // |m + T k|^2 = c^2 T^2
        let qa = k.norm_squared() - c * c;
        let qb = 2.0 * m.dot(&k);
        let qc = m.norm_squared();
        let roots: Vec<f64> = if qa.abs() <= f64::EPSILON * (qb.abs() + qc.abs()).max(1.0) {
            if qb == 0.0 {
                return Err(fail(ERROR_NO_ROOT));
            }
            vec![-qc / qb]
        } else {
            let discriminant = qb * qb - 4.0 * qa * qc;
            if discriminant < 0.0 {
                return Err(fail(ERROR_NO_ROOT));
            }
            let sq = discriminant.sqrt();
            vec![(-qb - sq) / (2.0 * qa), (-qb + sq) / (2.0 * qa)]
        };

        let earliest = 0.0_f64.min(t1).min(t2);
        let tolerance = 1e-6 * (1.0 + earliest.abs());
        let causal: Vec<DecaySolution> = roots
            .into_iter()
            .filter(|t| *t <= earliest + tolerance)
            .map(|t| {
                let x = m + k * t;
                DecaySolution {
                    vertex: origin + u * x.x + v * x.y,
                    time: t + t0_ref,
                }
            })
            .collect();
        if causal.is_empty() {
            return Err(fail(ERROR_ACAUSAL));
        }

        causal
            .into_iter()
            .map(|solution| (solution.vertex.xy().norm(), solution))
            .filter(|(radius, _)| *radius <= self.chamber_radius_cm)
            .min_by(|(r1, _), (r2, _)| r1.total_cmp(r2))
            .map(|(_, solution)| solution)
            .ok_or_else(|| fail(ERROR_OUTSIDE_CHAMBER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use opsfinder_core::{DetectorElement, OpeningAngles};

    const RADIUS: f64 = 42.5;

    /// Photon emitted from `vertex` at `t0` along azimuth `phi`, hitting the barrel.
    fn photon(vertex: Vector3<f64>, t0: f64, phi_deg: f64, slot: u16) -> Hit {
        let (s, c) = phi_deg.to_radians().sin_cos();
        let b = 2.0 * (vertex.x * c + vertex.y * s);
        let q = vertex.x * vertex.x + vertex.y * vertex.y - RADIUS * RADIUS;
        let path = (-b + (b * b - 4.0 * q).sqrt()) / 2.0;
        let position = vertex + Vector3::new(c, s, 0.0) * path;
        let time = t0 + path / SPEED_OF_LIGHT_CM_PER_NS * PS_PER_NS;
        let theta = position.y.atan2(position.x).to_degrees().rem_euclid(360.0);
        Hit::new(time, 20.0, position, DetectorElement::new(1, slot, theta))
    }

    #[test]
    fn test_recovers_vertex_and_time() {
        let vertex = Vector3::new(1.0, 2.0, 0.0);
        let hits = [
            photon(vertex, 100.0, 0.0, 1),
            photon(vertex, 100.0, 120.0, 2),
            photon(vertex, 100.0, 240.0, 3),
        ];
        let solution = TrilaterationSolver::default()
            .solve([&hits[0], &hits[1], &hits[2]])
            .unwrap();
        assert_abs_diff_eq!(solution.vertex.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(solution.vertex.y, 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(solution.vertex.z, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(solution.time, 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_recovers_off_plane_vertex() {
        let vertex = Vector3::new(3.0, -1.0, 5.0);
        let hits = [
            photon(vertex, -50.0, 30.0, 1),
            photon(vertex, -50.0, 150.0, 2),
            photon(vertex, -50.0, 280.0, 3),
        ];
        let solution = TrilaterationSolver::default()
            .solve([&hits[0], &hits[1], &hits[2]])
            .unwrap();
        assert_abs_diff_eq!((solution.vertex - vertex).norm(), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(solution.time, -50.0, epsilon = 1e-3);
    }

    #[test]
    fn test_angle_sum_identity_with_solved_vertex() {
        let vertex = Vector3::new(-2.0, 1.5, 0.0);
        let hits = [
            photon(vertex, 0.0, 10.0, 1),
            photon(vertex, 0.0, 140.0, 2),
            photon(vertex, 0.0, 250.0, 3),
        ];
        let solution = TrilaterationSolver::default()
            .solve([&hits[0], &hits[1], &hits[2]])
            .unwrap();
        let angles = OpeningAngles::from_vertex(
            &solution.vertex,
            [&hits[0].position, &hits[1].position, &hits[2].position],
        )
        .unwrap();
        assert_abs_diff_eq!(angles.total(), 360.0, epsilon = 1e-6);
        assert_abs_diff_eq!(angles.sum_two_smallest(), 230.0, epsilon = 1e-6);
    }

    #[test]
    fn test_collinear_hits_are_degenerate() {
        let element = DetectorElement::new(1, 1, 0.0);
        let hits = [
            Hit::new(0.0, 20.0, Vector3::new(-40.0, 0.0, 0.0), element),
            Hit::new(10.0, 20.0, Vector3::new(0.0, 0.0, 0.0), element),
            Hit::new(20.0, 20.0, Vector3::new(40.0, 0.0, 0.0), element),
        ];
        let err = TrilaterationSolver::default()
            .solve([&hits[0], &hits[1], &hits[2]])
            .unwrap_err();
        assert_eq!(err.code(), ERROR_DEGENERATE);
    }

    #[test]
    fn test_vertex_outside_chamber() {
        let vertex = Vector3::new(1.0, 2.0, 0.0);
        let hits = [
            photon(vertex, 100.0, 0.0, 1),
            photon(vertex, 100.0, 120.0, 2),
            photon(vertex, 100.0, 240.0, 3),
        ];
        let err = TrilaterationSolver::new(1.0)
            .solve([&hits[0], &hits[1], &hits[2]])
            .unwrap_err();
        assert_eq!(err.code(), ERROR_OUTSIDE_CHAMBER);
        assert_ne!(err.code(), 0);
    }
}
