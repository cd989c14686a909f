//! Mathematical utilities: Green's-function rows and least squares.

pub mod lsq;
pub mod radiation;

pub use lsq::*;
pub use radiation::*;
