//! Moment-tensor inversion.
//!
//! Responsibilities:
//!
//! - assemble the design matrix from per-station radiation rows
//! - solve for the six tensor components under L2 or L1 (IRLS) norm
//! - assess residual-based quality of a candidate tensor

pub mod quality;
pub mod solver;

pub use quality::*;
pub use solver::*;
