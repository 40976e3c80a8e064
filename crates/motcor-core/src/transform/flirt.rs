//! Conversion between world-space affines and FSL's matrix convention.
//!
//! FLIRT matrices act on scaled-voxel coordinates rather than physical
//! coordinates: a grid's FSL frame is `C = swap * diag(zooms) * A^-1`,
//! where `A` is the voxel-to-world affine and `swap` mirrors the x axis
//! when `A` has positive determinant. A world transform `M` mapping
//! moving-space coordinates into reference space then becomes
//! `M_fsl = C_ref * M * C_mov^-1`. The conversion is a pure matrix
//! transform; the inverse direction is its exact algebraic inverse.

use crate::error::{MotionError, Result};
use crate::geometry::Matrix4;
use crate::volume::VolumeGeometry;

/// The FSL coordinate frame of a grid: scaled voxels, x mirrored for
/// grids with positive-determinant affines.
fn fsl_frame(geometry: &VolumeGeometry) -> Result<Matrix4> {
    let affine = geometry.affine();
    let inverse = affine.try_inverse().ok_or_else(|| {
        MotionError::computation("voxel-to-world affine is not invertible")
    })?;

    let zooms = geometry.spacing();
    let mut scale = Matrix4::identity();
    scale[(0, 0)] = zooms.x;
    scale[(1, 1)] = zooms.y;
    scale[(2, 2)] = zooms.z;

    let mut swap = Matrix4::identity();
    if affine.determinant() > 0.0 {
        swap[(0, 0)] = -1.0;
        swap[(0, 3)] = (geometry.shape()[0] as f64 - 1.0) * zooms.x;
    }

    Ok(swap * scale * inverse)
}

/// Re-express a world-space transform in the FSL matrix convention.
pub fn world_to_flirt(
    world: &Matrix4,
    reference: &VolumeGeometry,
    moving: &VolumeGeometry,
) -> Result<Matrix4> {
    let c_ref = fsl_frame(reference)?;
    let c_mov = fsl_frame(moving)?;
    let c_mov_inv = c_mov.try_inverse().ok_or_else(|| {
        MotionError::computation("moving FSL frame is not invertible")
    })?;
    Ok(c_ref * world * c_mov_inv)
}

/// Recover a world-space transform from the FSL matrix convention.
pub fn flirt_to_world(
    flirt: &Matrix4,
    reference: &VolumeGeometry,
    moving: &VolumeGeometry,
) -> Result<Matrix4> {
    let c_ref = fsl_frame(reference)?;
    let c_mov = fsl_frame(moving)?;
    let c_ref_inv = c_ref.try_inverse().ok_or_else(|| {
        MotionError::computation("reference FSL frame is not invertible")
    })?;
    Ok(c_ref_inv * flirt * c_mov)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point3, Vector3};
    use crate::transform::RigidTransform;
    use nalgebra::Matrix3;

    fn geometry() -> VolumeGeometry {
        VolumeGeometry::new(
            [10, 12, 14],
            Point3::new(-20.0, -24.0, -28.0),
            Vector3::new(2.0, 2.0, 2.0),
            Matrix3::identity(),
        )
    }

    #[test]
    fn test_translation_x_is_mirrored() {
        // Positive-determinant grid: the x axis flips in FSL space.
        let geom = geometry();
        let world = RigidTransform::from_euler(Vector3::new(3.0, 0.0, 0.0), 0.0, 0.0, 0.0);
        let flirt = world_to_flirt(world.matrix(), &geom, &geom).unwrap();
        assert!((flirt[(0, 3)] + 3.0).abs() < 1e-9, "got {}", flirt[(0, 3)]);
        assert!((flirt[(1, 3)]).abs() < 1e-9);
    }

    #[test]
    fn test_identity_maps_to_identity() {
        let geom = geometry();
        let flirt = world_to_flirt(&Matrix4::identity(), &geom, &geom).unwrap();
        let residual = flirt - Matrix4::identity();
        let max = residual.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        assert!(max < 1e-9, "identity not preserved: residual {}", max);
    }

    #[test]
    fn test_roundtrip() {
        let geom = geometry();
        let world = RigidTransform::from_euler(Vector3::new(1.0, -2.0, 0.5), 0.04, 0.1, -0.07);
        let flirt = world_to_flirt(world.matrix(), &geom, &geom).unwrap();
        let back = flirt_to_world(&flirt, &geom, &geom).unwrap();
        let residual = back - world.matrix();
        let max = residual.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        assert!(max < 1e-9, "roundtrip residual {}", max);
    }
}
