//! Solution ensembles.
//!
//! Every pipeline re-run lands here as one tagged entry, failures included: a
//! diverging jackknife subset is information about station influence, not
//! something to discard. The same builder also serves the direct fault-angle
//! path, so "one nominal solution" and "a list of bootstrap solutions" are
//! the same shape to downstream consumers.

use serde::{Deserialize, Serialize};

use crate::domain::{Config, MomentTensor, SolutionSet};
use crate::error::InversionError;
use crate::pipeline::solution_set_from_tensor;

/// Where an ensemble entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    /// The unperturbed inversion of the canonical table.
    Nominal,
    /// One leave-one-out re-inversion; the id is the removed station's.
    Jackknife,
    /// One amplitude-noise re-inversion; the id is the sample index.
    Noise,
    /// Built directly from a strike/dip/rake tuple; the id is its position.
    Direct,
}

/// One tagged pipeline outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleEntry {
    pub tag: SourceTag,
    pub id: i32,
    pub result: Result<SolutionSet, InversionError>,
}

/// Ordered collection of tagged solutions from one resampling run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolutionEnsemble {
    entries: Vec<EnsembleEntry>,
}

impl SolutionEnsemble {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnsembleEntry> {
        self.entries.iter()
    }

    /// The first nominal entry that solved, if any.
    pub fn nominal(&self) -> Option<&SolutionSet> {
        self.entries
            .iter()
            .find(|e| e.tag == SourceTag::Nominal)
            .and_then(|e| e.result.as_ref().ok())
    }

    /// Entries whose inversion succeeded.
    pub fn solved(&self) -> impl Iterator<Item = &EnsembleEntry> {
        self.entries.iter().filter(|e| e.result.is_ok())
    }

    pub fn failed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.result.is_err()).count()
    }
}

/// Accumulates entries in presentation order.
#[derive(Debug, Default)]
pub struct EnsembleBuilder {
    entries: Vec<EnsembleEntry>,
}

impl EnsembleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, tag: SourceTag, id: i32, result: Result<SolutionSet, InversionError>) {
        self.entries.push(EnsembleEntry { tag, id, result });
    }

    pub fn append(&mut self, ensemble: SolutionEnsemble) {
        self.entries.extend(ensemble.entries);
    }

    pub fn finish(self) -> SolutionEnsemble {
        SolutionEnsemble {
            entries: self.entries,
        }
    }
}

impl FromIterator<EnsembleEntry> for SolutionEnsemble {
    fn from_iter<I: IntoIterator<Item = EnsembleEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Build an ensemble straight from strike/dip/rake tuples (degrees), unit
/// scalar moment. The first tuple is the nominal mechanism, the rest are
/// bootstrap solutions.
pub fn from_fault_angles(angles: &[(f64, f64, f64)], cfg: &Config) -> SolutionEnsemble {
    let mut builder = EnsembleBuilder::new();
    for (i, &(strike, dip, rake)) in angles.iter().enumerate() {
        let tensor = MomentTensor::from_strike_dip_rake(strike, dip, rake, 1.0);
        let tag = if i == 0 {
            SourceTag::Nominal
        } else {
            SourceTag::Direct
        };
        builder.record(tag, i as i32, Ok(solution_set_from_tensor(tensor, cfg)));
    }
    builder.finish()
}
