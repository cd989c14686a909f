//! Moment-tensor decomposition.
//!
//! Given a symmetric tensor this module produces everything a fault solution
//! reports besides misfit: ordered eigenvalues, the ISO/CLVD/DC split, the two
//! double-couple nodal planes, principal axes, fault style, scalar moment and
//! moment magnitude.
//!
//! The split follows the standard deviatoric decomposition: with
//! `iso = tr(M)/3` and deviatoric eigenvalues `e`, the CLVD share is driven by
//! `ε = −e_min/|e_max|` (smallest against largest by absolute value), which is
//! bounded by ±0.5; `DC = 100 − |ISO| − |CLVD|` keeps the three shares summing
//! to 100.

use nalgebra::{Matrix3, Vector3};

use crate::domain::{Config, FaultKind, MomentTensor, NodalPlane, PrincipalAxes};

pub mod planes;

pub use planes::*;

/// Geometry and moment information derived from one tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    /// Eigenvalues in descending order, N·m.
    pub eigenvalues: [f64; 3],
    pub iso_pct: f64,
    pub clvd_pct: f64,
    pub dc_pct: f64,
    pub axes: PrincipalAxes,
    pub plane_a: NodalPlane,
    pub plane_b: NodalPlane,
    pub kind: FaultKind,
    /// Deviatoric scalar moment `(|e1| + |e3|)/2`, N·m.
    pub m0: f64,
    /// Total moment including the isotropic part, N·m.
    pub mt: f64,
    /// Hanks–Kanamori moment magnitude.
    pub magnitude: f64,
}

/// Hanks–Kanamori: `Mw = (log10 M0[N·m] − 9.1) / 1.5`.
pub fn moment_magnitude(m0: f64) -> f64 {
    (m0.max(f64::MIN_POSITIVE).log10() - 9.1) / 1.5
}

/// Eigen-decompose a symmetric tensor into descending eigenvalues and the
/// matching orthonormal eigenvectors.
fn eigen_sorted(m: &Matrix3<f64>) -> ([f64; 3], [Vector3<f64>; 3]) {
    let eigen = m.symmetric_eigen();
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[b]
            .partial_cmp(&eigen.eigenvalues[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let values = [
        eigen.eigenvalues[order[0]],
        eigen.eigenvalues[order[1]],
        eigen.eigenvalues[order[2]],
    ];
    let vectors = [
        eigen.eigenvectors.column(order[0]).into_owned(),
        eigen.eigenvectors.column(order[1]).into_owned(),
        eigen.eigenvectors.column(order[2]).into_owned(),
    ];
    (values, vectors)
}

/// Decompose a tensor into the full set of fault-solution geometry fields.
pub fn decompose(tensor: &MomentTensor, cfg: &Config) -> Decomposition {
    let (values, vectors) = eigen_sorted(&tensor.as_matrix());
    let iso = tensor.isotropic();
    let deviatoric = [values[0] - iso, values[1] - iso, values[2] - iso];

    let scale = values.iter().map(|v| v.abs()).fold(0.0_f64, f64::max);
    let (e_max, e_min) = extreme_by_abs(&deviatoric);

    let (iso_pct, clvd_pct) = if e_max.abs() <= scale * cfg.degenerate_eigen_tol {
        // Near-isotropic source: the deviatoric part is numerical noise and
        // the CLVD/DC shares are undefined. Report a pure explosion/implosion.
        (if iso == 0.0 { 0.0 } else { 100.0 * iso.signum() }, 0.0)
    } else {
        let iso_pct = 100.0 * iso / (iso.abs() + e_max.abs());
        let epsilon = -e_min / e_max.abs();
        (iso_pct, 2.0 * epsilon * (100.0 - iso_pct.abs()))
    };
    let dc_pct = 100.0 - iso_pct.abs() - clvd_pct.abs();

    // Tension axis belongs to the largest eigenvalue, pressure to the
    // smallest, null to the middle.
    let (t, b, p) = (&vectors[0], &vectors[1], &vectors[2]);
    let sqrt_half = std::f64::consts::FRAC_1_SQRT_2;
    let normal = (t + p) * sqrt_half;
    let slip = (t - p) * sqrt_half;

    let plane_a = plane_from_vectors(&normal, &slip);
    let plane_b = plane_from_vectors(&slip, &normal);
    let axes = PrincipalAxes {
        p: axis_from_vector(p),
        t: axis_from_vector(t),
        b: axis_from_vector(b),
    };

    let m0 = (deviatoric[0].abs() + deviatoric[2].abs()) / 2.0;
    let mt = (values.iter().map(|v| v * v).sum::<f64>() / 2.0).sqrt();

    Decomposition {
        eigenvalues: values,
        iso_pct,
        clvd_pct,
        dc_pct,
        axes,
        plane_a,
        plane_b,
        kind: classify_rake(plane_a.rake, cfg.rake_half_width_deg),
        m0,
        mt,
        magnitude: moment_magnitude(m0),
    }
}

/// The best double-couple tensor: deviatoric eigenvectors with eigenvalues
/// forced to `(m, 0, −m)`, `m = (e1 − e3)/2`.
pub fn best_double_couple(tensor: &MomentTensor) -> MomentTensor {
    let dev = tensor.deviatoric();
    let (values, vectors) = eigen_sorted(&dev.as_matrix());
    let m = (values[0] - values[2]) / 2.0;

    let (t, p) = (&vectors[0], &vectors[2]);
    let matrix = (t * t.transpose() - p * p.transpose()) * m;
    MomentTensor::new(
        matrix[(0, 0)],
        matrix[(0, 1)],
        matrix[(0, 2)],
        matrix[(1, 1)],
        matrix[(1, 2)],
        matrix[(2, 2)],
    )
}

/// Deviatoric eigenvalues with the largest and smallest absolute value.
fn extreme_by_abs(deviatoric: &[f64; 3]) -> (f64, f64) {
    let mut e_max = deviatoric[0];
    let mut e_min = deviatoric[0];
    for &e in &deviatoric[1..] {
        if e.abs() > e_max.abs() {
            e_max = e;
        }
        if e.abs() < e_min.abs() {
            e_min = e;
        }
    }
    (e_max, e_min)
}
