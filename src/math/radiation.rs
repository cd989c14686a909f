//! Far-field P-wave radiation model.
//!
//! Each station contributes one row of the design matrix: the projection of a
//! unit moment-tensor component onto the displacement observed along the ray
//! leaving the source at the station's azimuth/take-off direction,
//!
//! ```text
//! u = γ_i γ_j M_ij / (4 π ρ v³ r)
//! ```
//!
//! in the north-east-down frame, with direction cosines
//!
//! - `γ_N = cos(azimuth) · sin(takeoff)`
//! - `γ_E = sin(azimuth) · sin(takeoff)`
//! - `γ_D = cos(takeoff)`
//!
//! Numerical note: a take-off angle of exactly 90° makes `γ_D` vanish and the
//! ray purely horizontal; it is nudged down by a small configurable epsilon
//! (0.25° by default) before evaluating the cosines.

use crate::domain::StationRecord;

/// Number of independent moment-tensor components.
pub const TENSOR_COMPONENTS: usize = 6;

/// Direction cosines `[γ_N, γ_E, γ_D]` of the ray leaving the source.
pub fn direction_cosines(azimuth_deg: f64, takeoff_deg: f64, takeoff_eps_deg: f64) -> [f64; 3] {
    let takeoff = if takeoff_deg == 90.0 {
        90.0 - takeoff_eps_deg
    } else {
        takeoff_deg
    };
    let az = azimuth_deg.to_radians();
    let tk = takeoff.to_radians();

    let gd = tk.cos();
    let horizontal = (1.0 - gd * gd).max(0.0).sqrt();
    [az.cos() * horizontal, az.sin() * horizontal, gd]
}

/// Green's-function coefficient row for one station, ordered to match the
/// solver's component vector `[m11, m12, m13, m22, m23, m33]`.
pub fn coefficient_row(record: &StationRecord, takeoff_eps_deg: f64) -> [f64; TENSOR_COMPONENTS] {
    let [gn, ge, gd] = direction_cosines(record.azimuth, record.takeoff, takeoff_eps_deg);

    let scale = 1.0
        / (4.0
            * std::f64::consts::PI
            * record.density
            * record.velocity.powi(3)
            * record.distance);

    [
        gn * gn * scale,
        2.0 * gn * ge * scale,
        2.0 * gn * gd * scale,
        ge * ge * scale,
        2.0 * ge * gd * scale,
        gd * gd * scale,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StationRecord;

    fn station(azimuth: f64, takeoff: f64) -> StationRecord {
        StationRecord {
            id: 1,
            name: "01".into(),
            component: "ZZ".into(),
            pick_active: true,
            channel_active: true,
            displacement: 1e-6,
            duration: 0.2,
            azimuth,
            takeoff,
            incidence: 0.0,
            distance: 1000.0,
            velocity: 3000.0,
            density: 2700.0,
            start: 0.0,
            end: 0.2,
        }
    }

    #[test]
    fn vertical_ray_projects_only_onto_m33() {
        let row = coefficient_row(&station(0.0, 0.0), 0.25);
        let scale = row[5];
        assert!(scale > 0.0);
        for &c in &row[..5] {
            assert!(c.abs() < scale * 1e-12);
        }
    }

    #[test]
    fn horizontal_takeoff_is_nudged() {
        // takeoff == 90 exactly uses the epsilon; the result must match an
        // explicit 89.75° ray and keep a non-zero vertical cosine.
        let nudged = coefficient_row(&station(30.0, 90.0), 0.25);
        let explicit = coefficient_row(&station(30.0, 89.75), 0.25);
        assert_eq!(nudged, explicit);
        assert!(nudged[5] > 0.0);
    }

    #[test]
    fn direction_cosines_are_unit_length() {
        for &(az, tk) in &[(0.0, 10.0), (123.4, 57.0), (359.0, 170.0), (200.0, 90.0)] {
            let [gn, ge, gd] = direction_cosines(az, tk, 0.25);
            let norm = (gn * gn + ge * ge + gd * gd).sqrt();
            assert!((norm - 1.0).abs() < 1e-12, "({az}, {tk}) gave norm {norm}");
        }
    }

    #[test]
    fn row_scales_inversely_with_distance() {
        let near = coefficient_row(&station(45.0, 60.0), 0.25);
        let mut far_station = station(45.0, 60.0);
        far_station.distance = 2000.0;
        let far = coefficient_row(&far_station, 0.25);
        for (n, f) in near.iter().zip(far.iter()) {
            assert!((n - 2.0 * f).abs() < n.abs().max(1e-300) * 1e-12);
        }
    }
}
