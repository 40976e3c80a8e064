pub mod displacement;
pub mod error;
pub mod geometry;
pub mod transform;
pub mod volume;

pub use displacement::{Displacement, SphericalSupport, DEFAULT_SUPPORT_RADIUS_MM};
pub use error::{MotionError, Result};
pub use transform::{MotionParams, ParamConvention, RigidTransform, TransformStack};
pub use volume::{Volume, VolumeGeometry, VolumeStack};
