//! Ordered aggregation of per-frame transforms.

use crate::error::{MotionError, Result};

use super::rigid::RigidTransform;

/// An ordered collection of per-frame transforms.
///
/// Block order equals frame index order; the frame index is authoritative,
/// not insertion order. Duplicate or missing indices are fatal.
#[derive(Debug, Clone)]
pub struct TransformStack {
    transforms: Vec<RigidTransform>,
}

impl TransformStack {
    /// Assemble a stack from `(frame index, transform)` pairs.
    ///
    /// Accepts the pairs in any order and places each transform at its
    /// frame index.
    ///
    /// # Errors
    /// Returns a computation error on an out-of-range index, a duplicate
    /// index, or when fewer than `expected_len` indices are covered.
    pub fn from_indexed(
        items: impl IntoIterator<Item = (usize, RigidTransform)>,
        expected_len: usize,
    ) -> Result<Self> {
        let mut slots: Vec<Option<RigidTransform>> = vec![None; expected_len];
        for (index, transform) in items {
            if index >= expected_len {
                return Err(MotionError::computation(format!(
                    "frame index {} out of range for {} frames",
                    index, expected_len
                )));
            }
            if slots[index].is_some() {
                return Err(MotionError::computation(format!(
                    "duplicate frame index {}",
                    index
                )));
            }
            slots[index] = Some(transform);
        }

        let mut transforms = Vec::with_capacity(expected_len);
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(t) => transforms.push(t),
                None => {
                    return Err(MotionError::computation(format!(
                        "missing transform for frame {}",
                        index
                    )))
                }
            }
        }
        Ok(Self { transforms })
    }

    /// Number of per-frame blocks.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// The transforms in frame order.
    pub fn transforms(&self) -> &[RigidTransform] {
        &self.transforms
    }

    /// Iterate the transforms in frame order.
    pub fn iter(&self) -> impl Iterator<Item = &RigidTransform> {
        self.transforms.iter()
    }
}
