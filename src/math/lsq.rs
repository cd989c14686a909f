//! Least-squares solve for the moment-tensor system.
//!
//! The design matrix is tall (≥6 rows, 6 columns) and can be badly scaled:
//! Green's-function coefficients carry the `1/(4πρv³r)` factor, so singular
//! values are tiny in absolute terms. We therefore use SVD with a *relative*
//! rank threshold, and report rank deficiency instead of silently projecting
//! onto a pseudo-inverse: a rank-deficient geometry means some tensor
//! component is simply unobservable with this station layout.

use nalgebra::{DMatrix, DVector};

use crate::error::InversionError;

/// Singular values below `max_sv * RANK_REL_TOL` count as zero for the rank
/// check. Documented (and exercised) by the degenerate-geometry tests.
const RANK_REL_TOL: f64 = 1e-10;

/// Solve `A x = d` in the least-squares sense, requiring `A` to have full
/// column rank.
pub fn solve_full_rank(a: &DMatrix<f64>, d: &DVector<f64>) -> Result<DVector<f64>, InversionError> {
    let ncols = a.ncols();
    let svd = a.clone().svd(true, true);

    let max_sv = svd.singular_values.iter().cloned().fold(0.0_f64, f64::max);
    let rank = svd
        .singular_values
        .iter()
        .filter(|&&s| s > max_sv * RANK_REL_TOL)
        .count();
    if rank < ncols {
        return Err(InversionError::SingularSystem { rank });
    }

    let x = svd
        .solve(d, max_sv * RANK_REL_TOL)
        .map_err(|_| InversionError::SingularSystem { rank })?;
    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(InversionError::SingularSystem { rank })
    }
}
