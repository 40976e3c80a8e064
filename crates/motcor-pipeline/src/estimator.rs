//! The injected motion-estimation capability.
//!
//! The pipeline never registers images itself; it consumes one rigid
//! transform per frame from whatever engine the caller supplies behind
//! this trait.

use motcor_core::transform::RigidTransform;
use motcor_core::{Result, Volume};

/// Result of registering one frame to the reference.
#[derive(Debug, Clone)]
pub struct FrameRegistration {
    /// Rigid transform mapping the frame into reference space.
    pub transform: RigidTransform,
    /// The frame resampled into reference space.
    pub resampled: Volume,
}

/// A rigid-registration engine.
pub trait MotionEstimator {
    /// Register `moving` to `fixed`, optionally restricted to `mask`.
    fn estimate(
        &self,
        moving: &Volume,
        fixed: &Volume,
        mask: Option<&Volume>,
    ) -> Result<FrameRegistration>;
}
