//! RMS displacement between rigid transforms.
//!
//! Quantifies how far, on average, points within a spatial support move
//! between two transforms. The closed form avoids enumerating voxels: for
//! a spherical support of effective radius R centred at c,
//!
//! ```text
//! rms = sqrt( (R^2 / 5) * trace(M^T M) + ||t||^2 )
//! ```
//!
//! where `M` is the 3x3 block of `A^-1 B - I` and `t` is the translation
//! difference induced at c. The support is either derived from a mask
//! (equal-volume sphere radius, mask centroid) or a default sphere at the
//! volume's geometric centre.

use serde::{Deserialize, Serialize};

use crate::error::{MotionError, Result};
use crate::geometry::{Matrix3, Matrix4, Vector3};
use crate::transform::RigidTransform;
use crate::volume::{Volume, VolumeGeometry};

/// Default support radius in physical units, used when no mask is given.
pub const DEFAULT_SUPPORT_RADIUS_MM: f64 = 80.0;

/// Spherical region over which RMS displacement is evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct SphericalSupport {
    /// Effective radius in physical units.
    pub radius: f64,
    /// Centre of the support in world coordinates.
    pub center: Vector3,
}

impl SphericalSupport {
    /// Default support: fixed radius at the grid's geometric centre.
    pub fn with_default_radius(geometry: &VolumeGeometry) -> Self {
        Self::with_radius(geometry, DEFAULT_SUPPORT_RADIUS_MM)
    }

    /// Fixed-radius support at the grid's geometric centre.
    pub fn with_radius(geometry: &VolumeGeometry, radius: f64) -> Self {
        let c = geometry.center_world();
        Self {
            radius,
            center: Vector3::new(c.x, c.y, c.z),
        }
    }

    /// Mask-derived support.
    ///
    /// The radius is that of a sphere with the same volume as the mask
    /// (nonzero voxels times voxel volume); the centre is the mask's
    /// world-space centroid.
    ///
    /// # Errors
    /// Returns an input error when the mask has no nonzero voxels.
    pub fn from_mask(mask: &Volume) -> Result<Self> {
        let geometry = mask.geometry();
        let mut count = 0usize;
        let mut centroid = Vector3::zeros();
        for ((i, j, k), &value) in mask.data().indexed_iter() {
            if value > 0.0 {
                count += 1;
                let p = geometry.voxel_to_world([i as f64, j as f64, k as f64]);
                centroid += Vector3::new(p.x, p.y, p.z);
            }
        }
        if count == 0 {
            return Err(MotionError::input("mask has no nonzero voxels"));
        }
        centroid /= count as f64;

        let volume = count as f64 * geometry.voxel_volume();
        let radius = (3.0 * volume / (4.0 * std::f64::consts::PI)).cbrt();
        Ok(Self {
            radius,
            center: centroid,
        })
    }
}

/// Absolute and relative RMS displacement of one frame.
///
/// `abs_rms` is the deviation from identity; `rel_rms` the deviation from
/// the preceding frame's transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Displacement {
    pub abs_rms: f64,
    pub rel_rms: f64,
}

/// RMS displacement between two transforms over a spherical support.
///
/// Both transforms must be relative to the same reference.
pub fn rms_displacement(a: &RigidTransform, b: &RigidTransform, support: &SphericalSupport) -> f64 {
    let difference: Matrix4 = a.inverse().matrix() * b.matrix() - Matrix4::identity();
    let m: Matrix3 = difference.fixed_view::<3, 3>(0, 0).into_owned();
    let t = Vector3::new(difference[(0, 3)], difference[(1, 3)], difference[(2, 3)])
        + m * support.center;

    let rotational = support.radius * support.radius / 5.0 * (m.transpose() * m).trace();
    (rotational + t.norm_squared()).max(0.0).sqrt()
}

/// Per-frame absolute and relative displacement, in frame order.
///
/// The predecessor is passed explicitly for each frame; frame 0 is paired
/// with itself, so `rel_rms[0]` is zero by the same code path as every
/// other frame. This degenerate boundary matches the legacy tool.
pub fn displacement_series(
    transforms: &[RigidTransform],
    support: &SphericalSupport,
) -> Vec<Displacement> {
    let identity = RigidTransform::identity();
    (0..transforms.len())
        .map(|i| {
            let previous = &transforms[i.saturating_sub(1)];
            Displacement {
                abs_rms: rms_displacement(&identity, &transforms[i], support),
                rel_rms: rms_displacement(previous, &transforms[i], support),
            }
        })
        .collect()
}
