//! Rigid transform implementation.
//!
//! A rigid transform is a rotation plus a translation, stored as a 4x4
//! homogeneous matrix mapping physical coordinates of one frame into
//! reference space. Translation is in physical units.

use nalgebra::Rotation3;

use crate::error::{MotionError, Result};
use crate::geometry::{Matrix3, Matrix4, Vector3};

/// Maximum allowed deviation of the rotation block from orthonormality.
/// Violations are reported, never repaired.
pub const ORTHONORMALITY_TOL: f64 = 1e-4;

/// Rigid transform (rotation + translation).
///
/// The rotation block must be orthonormal with positive determinant within
/// [`ORTHONORMALITY_TOL`]; constructors reject anything else.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidTransform {
    matrix: Matrix4,
}

impl RigidTransform {
    /// The identity transform (no rotation, no translation).
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a transform from a 4x4 homogeneous matrix.
    ///
    /// # Errors
    /// Returns a computation error when the bottom row is not `[0 0 0 1]`,
    /// the rotation block is not orthonormal within tolerance, or the
    /// rotation block has a non-positive determinant (reflection).
    pub fn from_matrix(matrix: Matrix4) -> Result<Self> {
        let bottom = [matrix[(3, 0)], matrix[(3, 1)], matrix[(3, 2)], matrix[(3, 3)] - 1.0];
        if bottom.iter().any(|v| v.abs() > ORTHONORMALITY_TOL) {
            return Err(MotionError::computation(
                "matrix is not homogeneous: bottom row differs from [0 0 0 1]",
            ));
        }

        let r: Matrix3 = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let residual = r.transpose() * r - Matrix3::identity();
        let max_residual = residual.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        if max_residual > ORTHONORMALITY_TOL {
            return Err(MotionError::computation(format!(
                "rotation block is not orthonormal: max residual {:.3e} exceeds tolerance {:.1e}",
                max_residual, ORTHONORMALITY_TOL
            )));
        }
        if r.determinant() <= 0.0 {
            return Err(MotionError::computation(
                "rotation block has non-positive determinant (reflection is not rigid)",
            ));
        }

        Ok(Self { matrix })
    }

    /// Create a transform from a rotation block and a translation vector.
    pub fn from_parts(rotation: Matrix3, translation: Vector3) -> Result<Self> {
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation);
        m[(0, 3)] = translation.x;
        m[(1, 3)] = translation.y;
        m[(2, 3)] = translation.z;
        Self::from_matrix(m)
    }

    /// Create a transform from Euler angles (radians) and a translation.
    ///
    /// Angles compose as `R = Rz(rz) * Ry(ry) * Rx(rx)`, the same ZYX
    /// order used throughout this crate.
    pub fn from_euler(translation: Vector3, rx: f64, ry: f64, rz: f64) -> Self {
        let rotation = Rotation3::from_euler_angles(rx, ry, rz);
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation.matrix());
        m[(0, 3)] = translation.x;
        m[(1, 3)] = translation.y;
        m[(2, 3)] = translation.z;
        Self { matrix: m }
    }

    /// The underlying homogeneous matrix.
    pub fn matrix(&self) -> &Matrix4 {
        &self.matrix
    }

    /// The 3x3 rotation block.
    pub fn rotation(&self) -> Matrix3 {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// The translation vector.
    pub fn translation(&self) -> Vector3 {
        Vector3::new(self.matrix[(0, 3)], self.matrix[(1, 3)], self.matrix[(2, 3)])
    }

    /// The exact inverse: `R^T`, `-R^T t`.
    pub fn inverse(&self) -> Self {
        let rt = self.rotation().transpose();
        let t = -(rt * self.translation());
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&rt);
        m[(0, 3)] = t.x;
        m[(1, 3)] = t.y;
        m[(2, 3)] = t.z;
        Self { matrix: m }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let t = RigidTransform::identity();
        assert_eq!(t.translation(), Vector3::zeros());
        assert_eq!(t.rotation(), Matrix3::identity());
    }

    #[test]
    fn test_rejects_scaling() {
        let mut m = Matrix4::identity();
        m[(0, 0)] = 1.1;
        let err = RigidTransform::from_matrix(m).unwrap_err();
        assert!(matches!(err, MotionError::Computation(_)));
    }

    #[test]
    fn test_rejects_reflection() {
        let mut m = Matrix4::identity();
        m[(0, 0)] = -1.0;
        let err = RigidTransform::from_matrix(m).unwrap_err();
        assert!(err.to_string().contains("determinant"));
    }

    #[test]
    fn test_rejects_bad_bottom_row() {
        let mut m = Matrix4::identity();
        m[(3, 0)] = 0.5;
        assert!(RigidTransform::from_matrix(m).is_err());
    }

    #[test]
    fn test_inverse_composes_to_identity() {
        let t = RigidTransform::from_euler(Vector3::new(3.0, -2.0, 1.0), 0.1, -0.2, 0.3);
        let product = t.inverse().matrix() * t.matrix();
        let residual = product - Matrix4::identity();
        let max = residual.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        assert!(max < 1e-12, "inverse residual too large: {}", max);
    }
}
