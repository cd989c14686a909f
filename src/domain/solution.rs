//! Moment tensor and fault-solution output types.
//!
//! Everything here is produced once per solve and consumed read-only by
//! downstream collaborators (text dumps, beach-ball rendering), so the types
//! are plain serializable data with no behavior beyond convention accessors.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

/// Symmetric 3×3 seismic moment tensor in N·m, stored as its six independent
/// components in the Aki & Richards north-east-down frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentTensor {
    pub m11: f64,
    pub m12: f64,
    pub m13: f64,
    pub m22: f64,
    pub m23: f64,
    pub m33: f64,
}

impl MomentTensor {
    pub fn new(m11: f64, m12: f64, m13: f64, m22: f64, m23: f64, m33: f64) -> Self {
        Self {
            m11,
            m12,
            m13,
            m22,
            m23,
            m33,
        }
    }

    /// Build from the component ordering used by the linear solver:
    /// `[m11, m12, m13, m22, m23, m33]`.
    pub fn from_components(c: &[f64; 6]) -> Self {
        Self::new(c[0], c[1], c[2], c[3], c[4], c[5])
    }

    /// Build a pure double-couple tensor of scalar moment `m0` from fault
    /// strike/dip/rake (degrees), after Aki & Richards (box 4.4).
    pub fn from_strike_dip_rake(strike: f64, dip: f64, rake: f64, m0: f64) -> Self {
        let phi = strike.to_radians();
        let delta = dip.to_radians();
        let lambda = rake.to_radians();

        let (sp, cp) = phi.sin_cos();
        let (sd, cd) = delta.sin_cos();
        let (sl, cl) = lambda.sin_cos();
        let s2p = (2.0 * phi).sin();
        let c2p = (2.0 * phi).cos();
        let s2d = (2.0 * delta).sin();
        let c2d = (2.0 * delta).cos();

        Self::new(
            -m0 * (sd * cl * s2p + s2d * sl * sp * sp),
            m0 * (sd * cl * c2p + 0.5 * s2d * sl * s2p),
            -m0 * (cd * cl * cp + c2d * sl * sp),
            m0 * (sd * cl * s2p - s2d * sl * cp * cp),
            -m0 * (cd * cl * sp - c2d * sl * cp),
            m0 * s2d * sl,
        )
    }

    /// Components in the solver/Aki ordering `[M11, M12, M13, M22, M23, M33]`.
    pub fn aki(&self) -> [f64; 6] {
        [self.m11, self.m12, self.m13, self.m22, self.m23, self.m33]
    }

    /// Components in the CMT catalog ordering and sign convention:
    /// `[M33, M11, M22, M13, -M23, -M12]`.
    pub fn cmt(&self) -> [f64; 6] {
        [
            self.m33, self.m11, self.m22, self.m13, -self.m23, -self.m12,
        ]
    }

    pub fn as_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.m11, self.m12, self.m13, //
            self.m12, self.m22, self.m23, //
            self.m13, self.m23, self.m33,
        )
    }

    pub fn trace(&self) -> f64 {
        self.m11 + self.m22 + self.m33
    }

    /// Isotropic part, `tr(M) / 3`.
    pub fn isotropic(&self) -> f64 {
        self.trace() / 3.0
    }

    /// The tensor with its isotropic part removed (trace-null).
    pub fn deviatoric(&self) -> Self {
        let iso = self.isotropic();
        Self::new(
            self.m11 - iso,
            self.m12,
            self.m13,
            self.m22 - iso,
            self.m23,
            self.m33 - iso,
        )
    }
}

/// One nodal plane, angles in degrees: strike `[0, 360)`, dip `[0, 90]`,
/// rake `(-180, 180]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodalPlane {
    pub strike: f64,
    pub dip: f64,
    pub rake: f64,
}

/// Principal-axis orientation: trend `[0, 360)`, plunge `[0, 90]`, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrincipalAxis {
    pub trend: f64,
    pub plunge: f64,
}

/// The pressure, tension and null axes of the tensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrincipalAxes {
    pub p: PrincipalAxis,
    pub t: PrincipalAxis,
    pub b: PrincipalAxis,
}

/// Fault style classified from the dominant nodal plane's rake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultKind {
    Normal,
    Reverse,
    StrikeSlip,
    Oblique,
}

impl FaultKind {
    /// Human-readable label for downstream dumps.
    pub fn display_name(self) -> &'static str {
        match self {
            FaultKind::Normal => "Normal fault",
            FaultKind::Reverse => "Reverse fault",
            FaultKind::StrikeSlip => "Strike-slip fault",
            FaultKind::Oblique => "Oblique fault",
        }
    }
}

/// A fully decomposed inversion result.
///
/// Created once per solve and immutable afterwards; the quality fields are
/// zero for solutions built directly from fault angles (no stations to misfit
/// against).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultSolution {
    pub tensor: MomentTensor,

    /// Signed isotropic percentage of the total scalar moment.
    pub iso_pct: f64,
    /// Signed compensated-linear-vector-dipole percentage.
    pub clvd_pct: f64,
    /// Double-couple percentage; `|iso| + |clvd| + dc = 100`.
    pub dc_pct: f64,

    pub axes: PrincipalAxes,
    pub plane_a: NodalPlane,
    pub plane_b: NodalPlane,
    pub kind: FaultKind,

    /// Scalar seismic moment, N·m.
    pub m0: f64,
    /// Total moment including the isotropic part, N·m.
    pub mt: f64,
    /// Moment magnitude (Hanks–Kanamori).
    pub magnitude: f64,
    /// Linearized-covariance error bound on `m0`, N·m.
    pub m0_error: f64,

    /// Relative RMS misfit between observed and synthetic displacements.
    pub rms: f64,
    /// Bounded quality index in `[0, 100]`.
    pub quality: f64,

    /// Tensor-predicted displacement at each active station, in table order.
    pub synthetic: Vec<f64>,

    /// False when the L1 reweighting loop hit its iteration cap; the solution
    /// is the best iterate and should be treated as reduced quality.
    pub converged: bool,
}

/// The three solution flavors computed for every inversion: the raw tensor,
/// its trace-null projection, and the best double couple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionSet {
    pub full: FaultSolution,
    pub deviatoric: FaultSolution,
    pub double_couple: FaultSolution,
}
