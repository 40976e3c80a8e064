//! Volume types with physical-space metadata.
//!
//! A volume combines voxel data with the metadata that maps voxel indices
//! to physical coordinates (origin, spacing, direction). A volume stack is
//! an ordered sequence of frames sharing one grid; frame order is
//! significant and preserved end-to-end.

use ndarray::{Array3, Array4, Axis};

use crate::error::{MotionError, Result};
use crate::geometry::{Matrix3, Matrix4, Point3, Vector3};

/// Physical-space metadata of a voxel grid.
///
/// Describes how voxel indices map to physical coordinates:
/// `world = direction * diag(spacing) * index + origin`.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeGeometry {
    /// Grid extent along each axis.
    shape: [usize; 3],
    /// Physical coordinate of voxel (0, 0, 0).
    origin: Point3,
    /// Physical distance between voxels along each axis.
    spacing: Vector3,
    /// Orientation of the grid axes (unit column vectors).
    direction: Matrix3,
}

impl VolumeGeometry {
    /// Create geometry from explicit components.
    pub fn new(shape: [usize; 3], origin: Point3, spacing: Vector3, direction: Matrix3) -> Self {
        Self {
            shape,
            origin,
            spacing,
            direction,
        }
    }

    /// Create an axis-aligned geometry with unit spacing at the origin.
    pub fn isotropic(shape: [usize; 3]) -> Self {
        Self::new(
            shape,
            Point3::origin(),
            Vector3::new(1.0, 1.0, 1.0),
            Matrix3::identity(),
        )
    }

    /// Decompose a voxel-to-world affine into origin, spacing and direction.
    ///
    /// Spacing is recovered as the norm of each linear column; columns are
    /// normalized to direction cosines. A degenerate column falls back to
    /// the corresponding coordinate axis.
    pub fn from_affine(shape: [usize; 3], affine: &Matrix4) -> Self {
        let origin = Point3::new(affine[(0, 3)], affine[(1, 3)], affine[(2, 3)]);

        let cols: Vec<Vector3> = (0..3)
            .map(|j| Vector3::new(affine[(0, j)], affine[(1, j)], affine[(2, j)]))
            .collect();
        let norms: Vec<f64> = cols.iter().map(|c| c.norm()).collect();

        let axes = [Vector3::x(), Vector3::y(), Vector3::z()];
        let dirs: Vec<Vector3> = cols
            .iter()
            .zip(norms.iter())
            .zip(axes.iter())
            .map(|((c, &n), axis)| if n > 1e-9 { c / n } else { *axis })
            .collect();

        Self {
            shape,
            origin,
            spacing: Vector3::new(norms[0].max(1e-9), norms[1].max(1e-9), norms[2].max(1e-9)),
            direction: Matrix3::from_columns(&dirs),
        }
    }

    /// Get the grid extent.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Get the origin.
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Get the spacing.
    pub fn spacing(&self) -> &Vector3 {
        &self.spacing
    }

    /// Get the direction matrix.
    pub fn direction(&self) -> &Matrix3 {
        &self.direction
    }

    /// The voxel-to-world affine as a 4x4 homogeneous matrix.
    pub fn affine(&self) -> Matrix4 {
        let linear = self.direction * Matrix3::from_diagonal(&self.spacing);
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&linear);
        m[(0, 3)] = self.origin.x;
        m[(1, 3)] = self.origin.y;
        m[(2, 3)] = self.origin.z;
        m
    }

    /// Map a continuous voxel index to physical coordinates.
    pub fn voxel_to_world(&self, index: [f64; 3]) -> Point3 {
        let linear = self.direction * Matrix3::from_diagonal(&self.spacing);
        self.origin + linear * Vector3::new(index[0], index[1], index[2])
    }

    /// Physical coordinates of the grid's geometric centre.
    pub fn center_world(&self) -> Point3 {
        self.voxel_to_world([
            (self.shape[0] as f64 - 1.0) / 2.0,
            (self.shape[1] as f64 - 1.0) / 2.0,
            (self.shape[2] as f64 - 1.0) / 2.0,
        ])
    }

    /// Physical volume of one voxel.
    pub fn voxel_volume(&self) -> f64 {
        self.spacing.x * self.spacing.y * self.spacing.z
    }

    /// Whether two geometries describe the same grid within tolerance.
    pub fn same_grid(&self, other: &VolumeGeometry) -> bool {
        if self.shape != other.shape {
            return false;
        }
        let a = self.affine();
        let b = other.affine();
        (a - b).iter().all(|d| d.abs() < 1e-3)
    }
}

/// A single 3D volume: voxel data plus grid metadata.
#[derive(Debug, Clone)]
pub struct Volume {
    data: Array3<f32>,
    geometry: VolumeGeometry,
}

impl Volume {
    /// Create a new volume. The data shape must match the geometry.
    pub fn new(data: Array3<f32>, geometry: VolumeGeometry) -> Self {
        Self { data, geometry }
    }

    /// Get the voxel data.
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// Get the grid metadata.
    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    /// Consume the volume, returning its data.
    pub fn into_data(self) -> Array3<f32> {
        self.data
    }
}

/// An ordered sequence of 3D frames sharing one grid.
///
/// The fourth axis of the data array is time; frame order is authoritative
/// and preserved by every operation on the stack.
#[derive(Debug, Clone)]
pub struct VolumeStack {
    data: Array4<f32>,
    geometry: VolumeGeometry,
}

impl VolumeStack {
    /// Create a new stack. The first three data axes must match the geometry.
    pub fn new(data: Array4<f32>, geometry: VolumeGeometry) -> Self {
        Self { data, geometry }
    }

    /// Get the voxel data (x, y, z, t).
    pub fn data(&self) -> &Array4<f32> {
        &self.data
    }

    /// Get the grid metadata shared by all frames.
    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    /// Number of frames.
    pub fn num_frames(&self) -> usize {
        self.data.shape()[3]
    }

    /// Extract one frame as an owned volume.
    pub fn frame(&self, index: usize) -> Result<Volume> {
        if index >= self.num_frames() {
            return Err(MotionError::computation(format!(
                "frame index {} out of range for {}-frame stack",
                index,
                self.num_frames()
            )));
        }
        let data = self.data.index_axis(Axis(3), index).to_owned();
        Ok(Volume::new(data, self.geometry.clone()))
    }

    /// Voxelwise temporal mean across all frames.
    pub fn mean_frame(&self) -> Result<Volume> {
        let data = self
            .data
            .mean_axis(Axis(3))
            .ok_or_else(|| MotionError::computation("cannot average an empty stack"))?;
        Ok(Volume::new(data, self.geometry.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    fn stack_with_frames(values: &[f32]) -> VolumeStack {
        let n = values.len();
        let mut data = Array4::<f32>::zeros((2, 2, 2, n));
        for (t, &v) in values.iter().enumerate() {
            data.index_axis_mut(Axis(3), t).fill(v);
        }
        VolumeStack::new(data, VolumeGeometry::isotropic([2, 2, 2]))
    }

    #[test]
    fn test_affine_roundtrip() {
        let geom = VolumeGeometry::new(
            [4, 5, 6],
            Point3::new(-10.0, 3.0, 7.5),
            Vector3::new(2.0, 2.0, 3.5),
            Matrix3::identity(),
        );
        let recovered = VolumeGeometry::from_affine([4, 5, 6], &geom.affine());
        assert!(geom.same_grid(&recovered));
    }

    #[test]
    fn test_center_world() {
        let geom = VolumeGeometry::new(
            [5, 5, 5],
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(2.0, 2.0, 2.0),
            Matrix3::identity(),
        );
        let c = geom.center_world();
        assert_eq!(c, Point3::new(4.0, 4.0, 4.0));
    }

    #[test]
    fn test_frame_extraction_order() {
        let stack = stack_with_frames(&[0.0, 1.0, 2.0]);
        assert_eq!(stack.num_frames(), 3);
        for t in 0..3 {
            let frame = stack.frame(t).unwrap();
            assert_eq!(frame.data()[[0, 0, 0]], t as f32);
        }
        assert!(stack.frame(3).is_err());
    }

    #[test]
    fn test_mean_frame() {
        let stack = stack_with_frames(&[1.0, 3.0]);
        let mean = stack.mean_frame().unwrap();
        assert_eq!(mean.data()[[1, 1, 1]], 2.0);
    }
}
