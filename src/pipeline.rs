//! The single-event inversion pipeline.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! station table -> design matrix -> linear solve -> decomposition -> quality
//!
//! The resampling engine re-runs `run_inversion` on perturbed tables; the
//! direct fault-angle path enters below the solver via
//! `solution_set_from_tensor`, so both produce the same `SolutionSet` shape.

use crate::decompose::{best_double_couple, decompose};
use crate::domain::{Config, FaultSolution, MomentTensor, SolutionSet, StationTable};
use crate::error::InversionError;
use crate::invert::{SolveOutcome, assess, solve};

/// Invert one station table and decompose the result into the full,
/// trace-null and double-couple solutions.
pub fn run_inversion(table: &StationTable, cfg: &Config) -> Result<SolutionSet, InversionError> {
    let outcome = solve(table, cfg)?;

    let full = outcome.tensor;
    let deviatoric = full.deviatoric();
    let double_couple = best_double_couple(&full);

    Ok(SolutionSet {
        full: station_solution(full, &outcome, cfg),
        deviatoric: station_solution(deviatoric, &outcome, cfg),
        double_couple: station_solution(double_couple, &outcome, cfg),
    })
}

/// Decompose a candidate tensor and assess it against the solve's
/// observations. Each solution flavor gets its own synthetic displacements,
/// misfit and moment error.
fn station_solution(tensor: MomentTensor, outcome: &SolveOutcome, cfg: &Config) -> FaultSolution {
    let dec = decompose(&tensor, cfg);
    let synthetic = outcome.predict(&tensor);
    let quality = assess(
        &outcome.design,
        &outcome.observed,
        &synthetic,
        &outcome.azimuths,
        &tensor.aki(),
    );

    FaultSolution {
        tensor,
        iso_pct: dec.iso_pct,
        clvd_pct: dec.clvd_pct,
        dc_pct: dec.dc_pct,
        axes: dec.axes,
        plane_a: dec.plane_a,
        plane_b: dec.plane_b,
        kind: dec.kind,
        m0: dec.m0,
        mt: dec.mt,
        magnitude: dec.magnitude,
        m0_error: quality.m0_error,
        rms: quality.rms,
        quality: quality.index,
        synthetic: synthetic.iter().copied().collect(),
        converged: outcome.converged,
    }
}

/// Build a solution from a tensor alone, with no stations to misfit against.
/// Used by the direct fault-angle ensemble path; the quality fields are zero
/// and the synthetic vector empty.
pub fn solution_from_tensor(tensor: MomentTensor, cfg: &Config) -> FaultSolution {
    let dec = decompose(&tensor, cfg);
    FaultSolution {
        tensor,
        iso_pct: dec.iso_pct,
        clvd_pct: dec.clvd_pct,
        dc_pct: dec.dc_pct,
        axes: dec.axes,
        plane_a: dec.plane_a,
        plane_b: dec.plane_b,
        kind: dec.kind,
        m0: dec.m0,
        mt: dec.mt,
        magnitude: dec.magnitude,
        m0_error: 0.0,
        rms: 0.0,
        quality: 0.0,
        synthetic: Vec::new(),
        converged: true,
    }
}

/// The three solution flavors for a tensor that did not come from a solve.
pub fn solution_set_from_tensor(tensor: MomentTensor, cfg: &Config) -> SolutionSet {
    SolutionSet {
        full: solution_from_tensor(tensor, cfg),
        deviatoric: solution_from_tensor(tensor.deviatoric(), cfg),
        double_couple: solution_from_tensor(best_double_couple(&tensor), cfg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FaultKind, NormType, StationRecord};
    use crate::math::coefficient_row;

    fn synthetic_table(tensor: &MomentTensor, cfg: &Config) -> StationTable {
        let takeoffs = [40.0, 60.0, 80.0, 100.0, 120.0, 140.0, 55.0, 75.0];
        let c = tensor.aki();
        let mut table = StationTable::new();
        for i in 0..8 {
            let mut record = StationRecord {
                id: i as i32 + 1,
                name: format!("{:02}", i + 1),
                component: "ZZ".into(),
                pick_active: true,
                channel_active: true,
                displacement: 0.0,
                duration: 0.2,
                azimuth: 45.0 * i as f64,
                takeoff: takeoffs[i],
                incidence: 0.0,
                distance: 1200.0 + 150.0 * i as f64,
                velocity: 3200.0,
                density: 2700.0,
                start: 0.0,
                end: 0.2,
            };
            let row = coefficient_row(&record, cfg.takeoff_eps_deg);
            record.displacement = row.iter().zip(c.iter()).map(|(a, m)| a * m).sum();
            table.add(record);
        }
        table
    }

    #[test]
    fn pipeline_recovers_a_pure_thrust() {
        let cfg = Config::default();
        let truth = MomentTensor::from_strike_dip_rake(30.0, 60.0, 90.0, 1e12);
        let table = synthetic_table(&truth, &cfg);

        let set = run_inversion(&table, &cfg).unwrap();
        let full = &set.full;
        assert_eq!(full.kind, FaultKind::Reverse);
        assert!(full.dc_pct > 99.0);
        assert!(full.rms < 1e-6);
        assert!((full.m0 - 1e12).abs() < 1e12 * 1e-6);
        assert_eq!(full.synthetic.len(), table.active_count());
        assert!(full.converged);

        // The exact-data solve makes all three flavors agree.
        assert!((set.double_couple.m0 - full.m0).abs() < 1e12 * 1e-6);
        assert!(set.deviatoric.tensor.trace().abs() < 1e12 * 1e-9);
    }

    #[test]
    fn flavors_differ_for_a_tensor_with_isotropic_part() {
        let cfg = Config::default();
        let truth = MomentTensor::new(6e12, 1e12, -0.5e12, 4e12, 0.8e12, 5e12);
        let table = synthetic_table(&truth, &cfg);

        let set = run_inversion(&table, &cfg).unwrap();
        assert!(set.full.iso_pct.abs() > 1.0);
        assert!(set.deviatoric.iso_pct.abs() < 1e-6);
        assert!(set.double_couple.dc_pct > 99.99);
        // Removing the isotropic part must cost misfit on iso-bearing data.
        assert!(set.deviatoric.rms >= set.full.rms);
    }

    #[test]
    fn l1_pipeline_produces_a_converged_solution() {
        let cfg = Config {
            norm: NormType::L1,
            ..Config::default()
        };
        let truth = MomentTensor::from_strike_dip_rake(250.0, 40.0, -90.0, 4e11);
        let table = synthetic_table(&truth, &cfg);

        let set = run_inversion(&table, &cfg).unwrap();
        assert!(set.full.converged);
        assert_eq!(set.full.kind, FaultKind::Normal);
    }

    #[test]
    fn direct_tensor_solutions_skip_quality() {
        let cfg = Config::default();
        let set = solution_set_from_tensor(
            MomentTensor::from_strike_dip_rake(30.0, 60.0, 90.0, 1.0),
            &cfg,
        );
        assert!(set.full.synthetic.is_empty());
        assert_eq!(set.full.rms, 0.0);
        assert_eq!(set.full.quality, 0.0);
        assert_eq!(set.full.kind, FaultKind::Reverse);
        assert!(set.double_couple.dc_pct > 99.9);
    }
}
