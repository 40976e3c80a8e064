//! Six-parameter motion records.
//!
//! A rigid transform decomposes into three translations (physical units)
//! and three Euler angles (radians). Two output conventions are supported,
//! reflecting a coordinate-handedness difference between two common
//! neuroimaging ecosystems: they agree on tx, tz, rx, rz and differ only
//! in the sign of ty and ry. Both use the same ZYX extraction, so results
//! stay comparable across conventions.

use nalgebra::Rotation3;
use serde::{Deserialize, Serialize};

use super::rigid::RigidTransform;

/// Output convention for a six-parameter motion record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamConvention {
    /// Baseline convention (FSL-style).
    Fsl,
    /// SPM-style convention: y translation and y rotation are negated.
    Spm,
}

/// Per-frame motion parameters: `tx ty tz rx ry rz`.
///
/// Translations in physical units, rotations in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionParams {
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl MotionParams {
    /// Decompose a rigid transform under the given convention.
    ///
    /// Euler angles are extracted for `R = Rz(rz) * Ry(ry) * Rx(rx)`, the
    /// composition order used by [`RigidTransform::from_euler`].
    pub fn from_transform(transform: &RigidTransform, convention: ParamConvention) -> Self {
        let (rx, ry, rz) = Rotation3::from_matrix_unchecked(transform.rotation()).euler_angles();
        let t = transform.translation();

        let mut params = Self {
            tx: t.x,
            ty: t.y,
            tz: t.z,
            rx,
            ry,
            rz,
        };
        if convention == ParamConvention::Spm {
            params.ty = -params.ty;
            params.ry = -params.ry;
        }
        params
    }

    /// The record as an ordered row, `tx ty tz rx ry rz`.
    pub fn as_row(&self) -> [f64; 6] {
        [self.tx, self.ty, self.tz, self.rx, self.ry, self.rz]
    }
}
