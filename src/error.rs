//! Error type for the inversion core.
//!
//! A failed solve aborts only the pipeline invocation it belongs to. Inside
//! the resampling engine a failure is recorded as a failed ensemble entry and
//! sibling iterations keep running; a failed *nominal* inversion is returned
//! to the caller, who maps it to a process exit status.
//!
//! L1 non-convergence is deliberately not an error: the solver returns its
//! best iterate with `converged = false` on the solution instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum InversionError {
    /// Fewer usable stations than unknown tensor components.
    #[error("underdetermined system: {got} active stations, {needed} required")]
    Underdetermined { needed: usize, got: usize },

    /// The station geometry does not constrain all six components.
    #[error("singular design matrix: rank {rank} < 6")]
    SingularSystem { rank: usize },

    /// A station record carries a non-finite or out-of-range field.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
