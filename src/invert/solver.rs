//! Linear solver: `A·m = d` for the six independent tensor components.
//!
//! The L2 path is a single SVD least-squares solve. The L1 path runs
//! iteratively reweighted least squares with weights `1/max(|rᵢ|, floor)`,
//! which converges to the least-absolute-deviation solution; it starts from
//! the L2 iterate and stops when the relative solution change drops below the
//! configured tolerance. Hitting the iteration cap is not a failure: the best
//! iterate is returned flagged as unconverged, and downstream consumers treat
//! the solution as reduced quality.

use log::{debug, warn};
use nalgebra::{DMatrix, DVector};

use crate::domain::{Config, MomentTensor, NormType, StationTable};
use crate::error::InversionError;
use crate::math::{TENSOR_COMPONENTS, coefficient_row, solve_full_rank};

/// Six unknowns need at least six independent observations.
pub const MIN_ACTIVE_STATIONS: usize = TENSOR_COMPONENTS;

/// L1 residuals below `mean(|d|) * L1_FLOOR_REL` are clamped when forming
/// weights, so stations the model already fits exactly cannot dominate.
const L1_FLOOR_REL: f64 = 1e-8;

/// Everything the downstream stages need from one linear solve.
///
/// `design`, `observed` and `azimuths` cover the active stations in table
/// order; `predict` re-applies the design matrix to any candidate tensor
/// (full, trace-null, double-couple) so each solution flavor gets its own
/// synthetic displacements and residuals.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub tensor: MomentTensor,
    pub design: DMatrix<f64>,
    pub observed: DVector<f64>,
    pub azimuths: Vec<f64>,
    pub converged: bool,
    pub iterations: usize,
}

impl SolveOutcome {
    /// Synthetic displacements predicted by `tensor` at the active stations.
    pub fn predict(&self, tensor: &MomentTensor) -> DVector<f64> {
        &self.design * DVector::from_row_slice(&tensor.aki())
    }
}

/// Validate the table, assemble the design matrix and solve under the
/// configured norm.
pub fn solve(table: &StationTable, cfg: &Config) -> Result<SolveOutcome, InversionError> {
    table.validate()?;

    let active: Vec<_> = table.active().collect();
    let n = active.len();
    if n < MIN_ACTIVE_STATIONS {
        return Err(InversionError::Underdetermined {
            needed: MIN_ACTIVE_STATIONS,
            got: n,
        });
    }

    let mut design = DMatrix::<f64>::zeros(n, TENSOR_COMPONENTS);
    let mut observed = DVector::<f64>::zeros(n);
    let mut azimuths = Vec::with_capacity(n);
    for (i, record) in active.iter().enumerate() {
        let row = coefficient_row(record, cfg.takeoff_eps_deg);
        for (j, &value) in row.iter().enumerate() {
            design[(i, j)] = value;
        }
        observed[i] = record.displacement;
        azimuths.push(record.azimuth);
    }

    let (components, converged, iterations) = match cfg.norm {
        NormType::L2 => (solve_full_rank(&design, &observed)?, true, 1),
        NormType::L1 => solve_l1(&design, &observed, cfg)?,
    };

    let mut c = [0.0; TENSOR_COMPONENTS];
    c.copy_from_slice(components.as_slice());

    Ok(SolveOutcome {
        tensor: MomentTensor::from_components(&c),
        design,
        observed,
        azimuths,
        converged,
        iterations,
    })
}

/// Iteratively reweighted least squares approximating the L1 norm.
fn solve_l1(
    design: &DMatrix<f64>,
    observed: &DVector<f64>,
    cfg: &Config,
) -> Result<(DVector<f64>, bool, usize), InversionError> {
    let n = design.nrows();
    let mean_abs = observed.iter().map(|v| v.abs()).sum::<f64>() / n as f64;
    let floor = (mean_abs * L1_FLOOR_REL).max(f64::MIN_POSITIVE);

    let mut x = solve_full_rank(design, observed)?;

    for iteration in 1..=cfg.l1_max_iterations {
        let residuals = observed - design * &x;

        let mut weighted_a = design.clone();
        let mut weighted_d = observed.clone();
        for i in 0..n {
            let sw = (1.0 / residuals[i].abs().max(floor)).sqrt();
            for j in 0..weighted_a.ncols() {
                weighted_a[(i, j)] *= sw;
            }
            weighted_d[i] *= sw;
        }

        let next = solve_full_rank(&weighted_a, &weighted_d)?;
        let change = (&next - &x).norm() / x.norm().max(f64::MIN_POSITIVE);
        x = next;
        debug!("L1 iteration {iteration}: relative change {change:.3e}");

        if change < cfg.l1_tolerance {
            return Ok((x, true, iteration));
        }
    }

    warn!(
        "L1 reweighting hit the {}-iteration cap; returning best iterate",
        cfg.l1_max_iterations
    );
    Ok((x, false, cfg.l1_max_iterations))
}
