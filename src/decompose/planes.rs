//! Fault-plane and principal-axis geometry.
//!
//! Conventions (Aki & Richards, north-east-down frame):
//!
//! - fault normal  `n = (−sinδ sinφ, sinδ cosφ, −cosδ)`
//! - slip vector   `u = (cosλ cosφ + sinλ cosδ sinφ,
//!                       cosλ sinφ − sinλ cosδ cosφ,
//!                       −sinλ sinδ)`
//!
//! with strike φ, dip δ, rake λ. Both are unit vectors; swapping them yields
//! the auxiliary plane. Inverting these relations recovers strike `[0, 360)`,
//! dip `[0, 90]` and rake `(−180, 180]` after normalizing the normal to point
//! upward (negative down component).

use nalgebra::Vector3;

use crate::domain::{FaultKind, NodalPlane, PrincipalAxis};

/// Dips with `sin δ` below this are treated as horizontal planes, where the
/// strike direction is taken from the slip vector instead.
const FLAT_DIP_SIN: f64 = 1e-10;

/// Unit fault normal and slip vector for a nodal plane.
pub fn vectors_from_plane(plane: &NodalPlane) -> (Vector3<f64>, Vector3<f64>) {
    let phi = plane.strike.to_radians();
    let delta = plane.dip.to_radians();
    let lambda = plane.rake.to_radians();

    let (sp, cp) = phi.sin_cos();
    let (sd, cd) = delta.sin_cos();
    let (sl, cl) = lambda.sin_cos();

    let normal = Vector3::new(-sd * sp, sd * cp, -cd);
    let slip = Vector3::new(cl * cp + sl * cd * sp, cl * sp - sl * cd * cp, -sl * sd);
    (normal, slip)
}

/// Recover strike/dip/rake from a fault normal and slip vector.
///
/// The pair `(−n, −u)` describes the same dislocation, so the normal is first
/// flipped to point upward; the result is then unique up to the usual
/// fault/auxiliary-plane ambiguity.
pub fn plane_from_vectors(normal: &Vector3<f64>, slip: &Vector3<f64>) -> NodalPlane {
    let (n, u) = if normal[2] > 0.0 {
        (-normal, -slip)
    } else {
        (*normal, *slip)
    };

    let delta = (-n[2]).clamp(-1.0, 1.0).acos();
    let sin_d = delta.sin();
    if sin_d < FLAT_DIP_SIN {
        // Horizontal plane: strike is undefined; align it with the slip
        // azimuth so the rake is zero by construction.
        return NodalPlane {
            strike: normalize_degrees(u[1].atan2(u[0]).to_degrees()),
            dip: delta.to_degrees(),
            rake: 0.0,
        };
    }

    let phi = (-n[0]).atan2(n[1]);
    let rake = (-u[2] / sin_d).atan2(u[0] * phi.cos() + u[1] * phi.sin());

    NodalPlane {
        strike: normalize_degrees(phi.to_degrees()),
        dip: delta.to_degrees(),
        rake: rake.to_degrees(),
    }
}

/// Trend/plunge of a principal axis, lower hemisphere (plunge ≥ 0).
pub fn axis_from_vector(v: &Vector3<f64>) -> PrincipalAxis {
    let v = if v[2] < 0.0 { -v } else { *v };
    let norm = v.norm().max(f64::MIN_POSITIVE);
    PrincipalAxis {
        trend: normalize_degrees(v[1].atan2(v[0]).to_degrees()),
        plunge: (v[2] / norm).clamp(-1.0, 1.0).asin().to_degrees(),
    }
}

/// Classify fault style from a rake angle using windows of `half_width`
/// degrees around the canonical rakes. Dip-slip windows take precedence at
/// the boundaries.
pub fn classify_rake(rake: f64, half_width: f64) -> FaultKind {
    let r = normalize_rake(rake);
    if (r + 90.0).abs() <= half_width {
        FaultKind::Normal
    } else if (r - 90.0).abs() <= half_width {
        FaultKind::Reverse
    } else if r.abs() <= half_width || r.abs() >= 180.0 - half_width {
        FaultKind::StrikeSlip
    } else {
        FaultKind::Oblique
    }
}

/// Wrap an angle into `[0, 360)`.
pub fn normalize_degrees(angle: f64) -> f64 {
    angle.rem_euclid(360.0)
}

/// Wrap a rake into `(−180, 180]`.
fn normalize_rake(rake: f64) -> f64 {
    let r = rake.rem_euclid(360.0);
    if r > 180.0 { r - 360.0 } else { r }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_angle_close(a: f64, b: f64, tol: f64) {
        let diff = (a - b).rem_euclid(360.0);
        let diff = diff.min(360.0 - diff);
        assert!(diff < tol, "angles {a} and {b} differ by {diff}");
    }

    #[test]
    fn plane_round_trips_through_vectors() {
        for &(strike, dip, rake) in &[
            (30.0, 60.0, 90.0),
            (210.0, 35.0, -70.0),
            (0.0, 90.0, 0.0),
            (123.0, 45.0, 160.0),
            (300.0, 80.0, -15.0),
        ] {
            let plane = NodalPlane { strike, dip, rake };
            let (n, u) = vectors_from_plane(&plane);
            assert!((n.norm() - 1.0).abs() < 1e-12);
            assert!((u.norm() - 1.0).abs() < 1e-12);
            assert!(n.dot(&u).abs() < 1e-12, "slip must lie in the plane");

            let back = plane_from_vectors(&n, &u);
            assert_angle_close(back.strike, strike, 1e-6);
            assert!((back.dip - dip).abs() < 1e-6);
            assert_angle_close(back.rake, rake, 1e-6);
        }
    }

    #[test]
    fn flipped_vectors_describe_the_same_plane() {
        let plane = NodalPlane {
            strike: 75.0,
            dip: 40.0,
            rake: 110.0,
        };
        let (n, u) = vectors_from_plane(&plane);
        let back = plane_from_vectors(&(-n), &(-u));
        assert_angle_close(back.strike, plane.strike, 1e-6);
        assert!((back.dip - plane.dip).abs() < 1e-6);
        assert_angle_close(back.rake, plane.rake, 1e-6);
    }

    #[test]
    fn axis_is_normalized_to_the_lower_hemisphere() {
        let axis = axis_from_vector(&Vector3::new(0.0, 0.5, -0.5));
        assert!(axis.plunge >= 0.0);
        assert_angle_close(axis.trend, 180.0, 1e-9);
        assert!((axis.plunge - 45.0).abs() < 1e-9);

        let vertical = axis_from_vector(&Vector3::new(0.0, 0.0, 1.0));
        assert!((vertical.plunge - 90.0).abs() < 1e-9);
    }

    #[test]
    fn rake_windows_classify_the_canonical_styles() {
        assert_eq!(classify_rake(-90.0, 45.0), FaultKind::Normal);
        assert_eq!(classify_rake(90.0, 45.0), FaultKind::Reverse);
        assert_eq!(classify_rake(0.0, 45.0), FaultKind::StrikeSlip);
        assert_eq!(classify_rake(180.0, 45.0), FaultKind::StrikeSlip);
        assert_eq!(classify_rake(-170.0, 45.0), FaultKind::StrikeSlip);

        // Narrower windows leave oblique gaps.
        assert_eq!(classify_rake(45.0, 30.0), FaultKind::Oblique);
        assert_eq!(classify_rake(-135.0, 30.0), FaultKind::Oblique);
    }
}
