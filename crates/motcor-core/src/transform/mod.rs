//! Rigid transforms and their per-frame representations.

pub mod euler;
pub mod flirt;
pub mod rigid;
pub mod stack;

pub use euler::{MotionParams, ParamConvention};
pub use rigid::RigidTransform;
pub use stack::TransformStack;
