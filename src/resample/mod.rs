//! Resampling: uncertainty quantification by re-running the pipeline.
//!
//! Responsibilities:
//!
//! - leave-one-out (jackknife) re-inversion per station
//! - Monte-Carlo amplitude-noise re-inversion
//! - collecting tagged solutions (including failures) into an ensemble

pub mod engine;
pub mod ensemble;

pub use engine::*;
pub use ensemble::*;
