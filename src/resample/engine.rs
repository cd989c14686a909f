//! Jackknife and amplitude-noise resampling.
//!
//! Both tests clone the caller's table into an immutable snapshot and re-run
//! the full pipeline once per iteration. Iterations share nothing mutable, so
//! they fan out over rayon's pool; `collect` keeps iteration order, which is
//! the presentation order of the ensemble. A failed iteration becomes a
//! failed tagged entry and never aborts its siblings; only the nominal
//! inversion in `run` is fatal.
//!
//! Noise model (per station, per sample): `d' = d * (1 + z/3 * factor)` with
//! `z` standard normal from two uniform draws via Box–Muller. Each sample
//! seeds its own RNG stream from the base seed, so a fixed seed reproduces
//! the whole ensemble regardless of worker scheduling.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::domain::{Config, NoiseConfig, StationTable};
use crate::error::InversionError;
use crate::pipeline::run_inversion;
use crate::resample::{EnsembleBuilder, EnsembleEntry, SolutionEnsemble, SourceTag};

/// Which resampling test `run` appends after the nominal inversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResamplingMode {
    Jackknife,
    Noise,
}

/// Cloneable handle on a monotonically increasing iteration counter.
#[derive(Debug, Clone, Default)]
pub struct Progress(Arc<AtomicUsize>);

impl Progress {
    /// Completed iterations of the resampling test currently running.
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

/// Re-runs the inversion pipeline under perturbed inputs.
#[derive(Debug, Clone)]
pub struct ResamplingEngine {
    config: Config,
    noise: NoiseConfig,
    progress: Progress,
}

impl ResamplingEngine {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            noise: NoiseConfig::default(),
            progress: Progress::default(),
        }
    }

    pub fn with_noise(mut self, noise: NoiseConfig) -> Self {
        self.noise = noise;
        self
    }

    /// Handle the caller may poll while a test is running.
    pub fn progress(&self) -> Progress {
        self.progress.clone()
    }

    /// Nominal inversion plus the requested resampling test. A failed nominal
    /// inversion is fatal for the invocation; test iterations only ever fail
    /// individually.
    pub fn run(
        &self,
        table: &StationTable,
        mode: Option<ResamplingMode>,
    ) -> Result<SolutionEnsemble, InversionError> {
        let nominal = run_inversion(table, &self.config)?;

        let mut builder = EnsembleBuilder::new();
        builder.record(SourceTag::Nominal, 0, Ok(nominal));
        match mode {
            None => {}
            Some(ResamplingMode::Jackknife) => builder.append(self.jackknife(table)),
            Some(ResamplingMode::Noise) => builder.append(self.noise_test(table)?),
        }
        Ok(builder.finish())
    }

    /// Leave-one-out test: one entry per station in the table, tagged with
    /// the removed station's id.
    pub fn jackknife(&self, table: &StationTable) -> SolutionEnsemble {
        self.progress.reset();
        let snapshot = table.clone();

        // Indexed parallel iterators collect in iteration order, so the
        // ensemble reads in table order no matter how workers interleave.
        let entries: Vec<EnsembleEntry> = (0..snapshot.count())
            .into_par_iter()
            .map(|i| {
                let mut subset = snapshot.clone();
                let removed = subset.remove(i);
                let result = run_inversion(&subset, &self.config);
                if let Err(err) = &result {
                    warn!("jackknife without station {}: {err}", removed.id);
                }
                self.progress.bump();
                EnsembleEntry {
                    tag: SourceTag::Jackknife,
                    id: removed.id,
                    result,
                }
            })
            .collect();
        entries.into_iter().collect()
    }

    /// Monte-Carlo amplitude-noise test: `samples` entries tagged with their
    /// sample index.
    pub fn noise_test(&self, table: &StationTable) -> Result<SolutionEnsemble, InversionError> {
        if !(self.noise.factor.is_finite() && self.noise.factor > 0.0) {
            return Err(InversionError::InvalidInput(format!(
                "noise factor {} must be finite and > 0",
                self.noise.factor
            )));
        }

        self.progress.reset();
        let snapshot = table.clone();
        let base_seed = self.noise.seed.unwrap_or_else(rand::random);
        let factor = self.noise.factor;

        let entries: Vec<EnsembleEntry> = (0..self.noise.samples)
            .into_par_iter()
            .map(|sample| {
                let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(sample as u64));
                let perturbed = perturb_displacements(&snapshot, factor, &mut rng);
                let result = run_inversion(&perturbed, &self.config);
                if let Err(err) = &result {
                    warn!("noise sample {sample}: {err}");
                }
                self.progress.bump();
                EnsembleEntry {
                    tag: SourceTag::Noise,
                    id: sample as i32,
                    result,
                }
            })
            .collect();
        Ok(entries.into_iter().collect())
    }
}

/// Apply multiplicative Gaussian noise to every active station's amplitude.
fn perturb_displacements(table: &StationTable, factor: f64, rng: &mut StdRng) -> StationTable {
    let mut perturbed = StationTable::new();
    for record in table.iter() {
        let mut record = record.clone();
        if record.is_active() {
            record.displacement *= 1.0 + standard_normal(rng) / 3.0 * factor;
        }
        perturbed.add(record);
    }
    perturbed
}

/// One standard-normal variate via the Box–Muller transform.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1 = 1.0 - rng.r#gen::<f64>(); // (0, 1]: keeps ln(u1) finite
    let u2: f64 = rng.r#gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::domain::{MomentTensor, StationRecord};
    use crate::math::coefficient_row;

    fn synthetic_table(n: usize) -> StationTable {
        let cfg = Config::default();
        let truth = MomentTensor::from_strike_dip_rake(30.0, 60.0, 90.0, 1e12);
        let c = truth.aki();
        let mut table = StationTable::new();
        for i in 0..n {
            let mut record = StationRecord {
                id: 10 + i as i32,
                name: format!("{:02}", i + 1),
                component: "ZZ".into(),
                pick_active: true,
                channel_active: true,
                displacement: 0.0,
                duration: 0.2,
                azimuth: (360.0 / n as f64) * i as f64,
                takeoff: 35.0 + (110.0 / n as f64) * i as f64,
                incidence: 0.0,
                distance: 900.0 + 120.0 * i as f64,
                velocity: 3000.0,
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
    fn jackknife_yields_one_entry_per_station_with_distinct_ids() {
        let table = synthetic_table(9);
        let engine = ResamplingEngine::new(Config::default());

        let ensemble = engine.jackknife(&table);
        assert_eq!(ensemble.len(), 9);
        assert_eq!(ensemble.failed_count(), 0);

        let ids: HashSet<i32> = ensemble.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), 9);
        let expected: HashSet<i32> = table.iter().map(|r| r.id).collect();
        assert_eq!(ids, expected);
        assert_eq!(engine.progress().get(), 9);
        // The caller's table is untouched.
        assert_eq!(table.count(), 9);
    }

    #[test]
    fn jackknife_on_a_minimal_table_records_failures() {
        // Six stations: every leave-one-out subset is underdetermined.
        let table = synthetic_table(6);
        let engine = ResamplingEngine::new(Config::default());

        let ensemble = engine.jackknife(&table);
        assert_eq!(ensemble.len(), 6);
        assert_eq!(ensemble.failed_count(), 6);
        for entry in ensemble.iter() {
            assert!(matches!(
                entry.result,
                Err(InversionError::Underdetermined { needed: 6, got: 5 })
            ));
        }
    }

    #[test]
    fn noise_test_yields_the_configured_sample_count() {
        let table = synthetic_table(8);
        let engine = ResamplingEngine::new(Config::default()).with_noise(NoiseConfig {
            factor: 0.5,
            samples: 17,
            seed: Some(42),
        });

        let ensemble = engine.noise_test(&table).unwrap();
        assert_eq!(ensemble.len(), 17);
        assert_eq!(ensemble.failed_count(), 0);
        let ids: Vec<i32> = ensemble.iter().map(|e| e.id).collect();
        assert_eq!(ids, (0..17).collect::<Vec<i32>>());
        assert_eq!(engine.progress().get(), 17);
    }

    #[test]
    fn noise_ensemble_is_reproducible_for_a_fixed_seed() {
        let table = synthetic_table(8);
        let noise = NoiseConfig {
            factor: 1.0,
            samples: 5,
            seed: Some(7),
        };
        let engine = ResamplingEngine::new(Config::default()).with_noise(noise);

        let a = engine.noise_test(&table).unwrap();
        let b = engine.noise_test(&table).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            let (sx, sy) = (x.result.as_ref().unwrap(), y.result.as_ref().unwrap());
            for (cx, cy) in sx.full.tensor.aki().iter().zip(sy.full.tensor.aki().iter()) {
                assert_eq!(cx.to_bits(), cy.to_bits());
            }
        }
    }

    #[test]
    fn vanishing_noise_converges_to_the_nominal_solution() {
        let table = synthetic_table(8);
        let cfg = Config::default();
        let nominal = run_inversion(&table, &cfg).unwrap();

        let engine = ResamplingEngine::new(cfg).with_noise(NoiseConfig {
            factor: 1e-10,
            samples: 10,
            seed: Some(1),
        });
        let ensemble = engine.noise_test(&table).unwrap();
        for entry in ensemble.iter() {
            let set = entry.result.as_ref().unwrap();
            let rel = (set.full.m0 - nominal.full.m0).abs() / nominal.full.m0;
            assert!(rel < 1e-8, "m0 drifted by {rel}");
            assert!((set.full.plane_a.dip - nominal.full.plane_a.dip).abs() < 1e-4);
        }
    }

    #[test]
    fn invalid_noise_factor_is_rejected() {
        let table = synthetic_table(8);
        let engine = ResamplingEngine::new(Config::default()).with_noise(NoiseConfig {
            factor: 0.0,
            samples: 3,
            seed: Some(1),
        });
        assert!(matches!(
            engine.noise_test(&table),
            Err(InversionError::InvalidInput(_))
        ));
    }

    #[test]
    fn run_prepends_the_nominal_entry() {
        let table = synthetic_table(8);
        let engine = ResamplingEngine::new(Config::default());

        let ensemble = engine
            .run(&table, Some(ResamplingMode::Jackknife))
            .unwrap();
        assert_eq!(ensemble.len(), 1 + 8);
        assert_eq!(ensemble.iter().next().unwrap().tag, SourceTag::Nominal);
        assert!(ensemble.nominal().is_some());
    }

    #[test]
    fn run_is_fatal_when_the_nominal_inversion_fails() {
        let table = synthetic_table(5);
        let engine = ResamplingEngine::new(Config::default());
        assert!(matches!(
            engine.run(&table, Some(ResamplingMode::Noise)),
            Err(InversionError::Underdetermined { .. })
        ));
    }

    #[test]
    fn box_muller_moments_are_plausible() {
        let mut rng = StdRng::seed_from_u64(123);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| standard_normal(&mut rng)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|z| (z - mean) * (z - mean)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05, "mean = {mean}");
        assert!((var - 1.0).abs() < 0.05, "var = {var}");
    }
}
