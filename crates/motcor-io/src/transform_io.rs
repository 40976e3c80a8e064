//! Text-form rigid transforms and the concatenated transform artifact.
//!
//! Transforms are written as ITK-style blocks. The multi-transform
//! artifact carries a fixed header with the format version and block
//! count, then one block per frame in frame-index order.

use std::fs;
use std::path::Path;

use nalgebra::Matrix3;

use motcor_core::geometry::Vector3;
use motcor_core::transform::{RigidTransform, TransformStack};
use motcor_core::{MotionError, Result};

/// First header line of every transform file.
pub const TRANSFORM_FILE_HEADER: &str = "#Insight Transform File V1.0";

const TRANSFORM_TYPE: &str = "MatrixOffsetTransformBase_double_3_3";

fn format_block(index: usize, transform: &RigidTransform) -> String {
    let r = transform.rotation();
    let t = transform.translation();
    let params: Vec<String> = (0..3)
        .flat_map(|i| (0..3).map(move |j| (i, j)))
        .map(|(i, j)| format!("{}", r[(i, j)]))
        .chain([t.x, t.y, t.z].into_iter().map(|v| format!("{}", v)))
        .collect();

    format!(
        "#Transform {}\nTransform: {}\nParameters: {}\nFixedParameters: 0 0 0\n",
        index,
        TRANSFORM_TYPE,
        params.join(" ")
    )
}

/// Write a single transform as a standalone text file.
pub fn write_transform<P: AsRef<Path>>(path: P, transform: &RigidTransform) -> Result<()> {
    let path = path.as_ref();
    let text = format!("{}\n{}", TRANSFORM_FILE_HEADER, format_block(0, transform));
    fs::write(path, text)
        .map_err(|e| MotionError::input(format!("failed to write {}: {}", path.display(), e)))
}

/// Write the concatenated multi-transform artifact.
///
/// Header: format version, then `#Transforms: N`. Block order equals
/// frame-index order.
pub fn write_transform_stack<P: AsRef<Path>>(path: P, stack: &TransformStack) -> Result<()> {
    let path = path.as_ref();
    let mut text = format!("{}\n#Transforms: {}\n", TRANSFORM_FILE_HEADER, stack.len());
    for (index, transform) in stack.iter().enumerate() {
        text.push_str(&format_block(index, transform));
    }
    fs::write(path, text)
        .map_err(|e| MotionError::input(format!("failed to write {}: {}", path.display(), e)))
}

/// Read a concatenated multi-transform artifact.
///
/// # Errors
/// Input error for a missing file, bad header, or malformed block;
/// computation error when the blocks do not cover exactly the declared
/// frame indices or a block is not rigid.
pub fn read_transform_stack<P: AsRef<Path>>(path: P) -> Result<TransformStack> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| MotionError::input(format!("failed to read {}: {}", path.display(), e)))?;

    let mut lines = text.lines();
    if lines.next().map(str::trim) != Some(TRANSFORM_FILE_HEADER) {
        return Err(MotionError::input(format!(
            "{}: not a transform file (bad header)",
            path.display()
        )));
    }
    let count_line = lines.next().unwrap_or_default().trim().to_string();
    let declared: usize = count_line
        .strip_prefix("#Transforms:")
        .and_then(|rest| rest.trim().parse().ok())
        .ok_or_else(|| {
            MotionError::input(format!("{}: missing block count in header", path.display()))
        })?;

    let mut blocks = Vec::with_capacity(declared);
    let mut current: Option<usize> = None;
    for line in lines {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("#Transform ") {
            let index = rest.trim().parse::<usize>().map_err(|_| {
                MotionError::input(format!("{}: invalid block index {:?}", path.display(), rest))
            })?;
            current = Some(index);
        } else if let Some(rest) = line.strip_prefix("Parameters:") {
            let index = current.ok_or_else(|| {
                MotionError::input(format!("{}: parameters outside a block", path.display()))
            })?;
            let values: Vec<f64> = rest
                .split_whitespace()
                .map(|tok| {
                    tok.parse::<f64>().map_err(|_| {
                        MotionError::input(format!(
                            "{}: invalid parameter {:?}",
                            path.display(),
                            tok
                        ))
                    })
                })
                .collect::<Result<_>>()?;
            if values.len() != 12 {
                return Err(MotionError::input(format!(
                    "{}: expected 12 parameters per block, found {}",
                    path.display(),
                    values.len()
                )));
            }
            let rotation = Matrix3::new(
                values[0], values[1], values[2], values[3], values[4], values[5], values[6],
                values[7], values[8],
            );
            let translation = Vector3::new(values[9], values[10], values[11]);
            blocks.push((index, RigidTransform::from_parts(rotation, translation)?));
        }
    }

    TransformStack::from_indexed(blocks, declared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_stack() -> TransformStack {
        let transforms = (0..3).map(|i| {
            (
                i,
                RigidTransform::from_euler(
                    Vector3::new(i as f64, -0.5 * i as f64, 0.0),
                    0.01 * i as f64,
                    0.0,
                    -0.02 * i as f64,
                ),
            )
        });
        TransformStack::from_indexed(transforms, 3).unwrap()
    }

    #[test]
    fn test_artifact_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("motion.cat");

        let stack = sample_stack();
        write_transform_stack(&path, &stack).unwrap();
        let back = read_transform_stack(&path).unwrap();

        assert_eq!(back.len(), 3);
        for (a, b) in stack.iter().zip(back.iter()) {
            let residual = (a.matrix() - b.matrix())
                .iter()
                .fold(0.0f64, |acc, v| acc.max(v.abs()));
            assert!(residual < 1e-12, "residual {}", residual);
        }
    }

    #[test]
    fn test_artifact_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("motion.cat");
        write_transform_stack(&path, &sample_stack()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(TRANSFORM_FILE_HEADER));
        assert_eq!(lines.next(), Some("#Transforms: 3"));
        assert_eq!(text.matches("#Transform ").count(), 3);
    }

    #[test]
    fn test_bad_header_is_input_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bogus.cat");
        std::fs::write(&path, "not a transform file\n").unwrap();

        let err = read_transform_stack(&path).unwrap_err();
        assert!(matches!(err, MotionError::Input(_)));
    }

    #[test]
    fn test_declared_count_mismatch_is_computation_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.cat");
        let stack = sample_stack();
        write_transform_stack(&path, &stack).unwrap();

        // Claim one more block than the file holds.
        let text = std::fs::read_to_string(&path)
            .unwrap()
            .replace("#Transforms: 3", "#Transforms: 4");
        std::fs::write(&path, text).unwrap();

        let err = read_transform_stack(&path).unwrap_err();
        assert!(matches!(err, MotionError::Computation(_)));
    }
}
