//! Residual-based quality assessment.
//!
//! Three numbers summarize how much to trust a solution:
//!
//! - relative RMS misfit `‖d − û‖ / ‖d‖` between observed and synthetic
//!   displacements
//! - a linearized-covariance error bound on the scalar moment: with
//!   `C = s²(AᵀA)⁻¹` and `s² = ‖r‖²/(n − 6)`, the misfit is propagated
//!   through the gradient of the tensor-norm moment, `err = √(gᵀCg)`
//! - a bounded quality index `100 · exp(−rms) · coverage`, where coverage
//!   penalizes one-sided networks via the largest azimuthal gap

use nalgebra::{DMatrix, DVector};

use crate::math::TENSOR_COMPONENTS;

/// Quality numbers for one solution flavor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality {
    pub rms: f64,
    pub m0_error: f64,
    pub index: f64,
}

/// Assess a candidate component vector against the observations it was (or
/// would have been) derived from.
pub fn assess(
    design: &DMatrix<f64>,
    observed: &DVector<f64>,
    synthetic: &DVector<f64>,
    azimuths: &[f64],
    components: &[f64; TENSOR_COMPONENTS],
) -> Quality {
    let residuals = observed - synthetic;
    let rms = residuals.norm() / observed.norm().max(f64::MIN_POSITIVE);

    let m0_error = moment_error_bound(design, &residuals, components);

    let coverage = azimuthal_coverage(azimuths);
    let index = (100.0 * (-rms).exp() * coverage).clamp(0.0, 100.0);

    Quality {
        rms,
        m0_error,
        index,
    }
}

/// Delta-method error bound on the tensor-norm scalar moment
/// `M = √(Σ Mᵢⱼ²/2)`.
fn moment_error_bound(
    design: &DMatrix<f64>,
    residuals: &DVector<f64>,
    c: &[f64; TENSOR_COMPONENTS],
) -> f64 {
    let n = design.nrows();
    if n <= TENSOR_COMPONENTS {
        // No degrees of freedom left; the residual variance estimate is
        // undefined and the bound degenerates to zero.
        return 0.0;
    }
    let s2 = residuals.norm_squared() / (n - TENSOR_COMPONENTS) as f64;

    let Some(cov) = (design.transpose() * design).try_inverse() else {
        return f64::INFINITY;
    };

    // Norm uses each off-diagonal component twice.
    let f = (c[0] * c[0] + c[3] * c[3] + c[5] * c[5]
        + 2.0 * (c[1] * c[1] + c[2] * c[2] + c[4] * c[4]))
        / 2.0;
    if f <= 0.0 {
        return 0.0;
    }
    let m0 = f.sqrt();
    let g = DVector::from_row_slice(&[
        c[0] / (2.0 * m0),
        c[1] / m0,
        c[2] / m0,
        c[3] / (2.0 * m0),
        c[4] / m0,
        c[5] / (2.0 * m0),
    ]);

    (s2 * (g.transpose() * (cov * &g))[(0, 0)]).max(0.0).sqrt()
}

/// `1 − max_gap/360` over the sorted station azimuths, in `[0, 1]`.
fn azimuthal_coverage(azimuths: &[f64]) -> f64 {
    if azimuths.len() < 2 {
        return 0.0;
    }
    let mut sorted = azimuths.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut max_gap: f64 = 360.0 - sorted[sorted.len() - 1] + sorted[0];
    for pair in sorted.windows(2) {
        max_gap = max_gap.max(pair[1] - pair[0]);
    }
    (1.0 - max_gap / 360.0).clamp(0.0, 1.0)
}
