//! `smt-invert` library crate.
//!
//! Seismic moment-tensor inversion from multi-station ground-displacement
//! amplitudes: design-matrix assembly from station geometry, L1/L2 linear
//! solves, eigen-decomposition of the tensor into ISO/CLVD/DC, fault geometry,
//! and jackknife/noise resampling for uncertainty.
//!
//! The crate is a library on purpose:
//!
//! - core logic is testable without spawning processes
//! - argument parsing, text dumps and beach-ball rendering live in the
//!   consuming binaries, which only read the output types
//! - modules stay easy to navigate as the project grows

pub mod decompose;
pub mod domain;
pub mod error;
pub mod invert;
pub mod math;
pub mod pipeline;
pub mod resample;
