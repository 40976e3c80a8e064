//! Plain-text 4x4 matrix files (FLIRT format).
//!
//! Four whitespace-separated values per row, four rows.

use std::fs;
use std::path::Path;

use motcor_core::geometry::Matrix4;
use motcor_core::{MotionError, Result};

/// Write a matrix as four rows of four values.
pub fn write_matrix<P: AsRef<Path>>(path: P, matrix: &Matrix4) -> Result<()> {
    let path = path.as_ref();
    let mut out = String::new();
    for i in 0..4 {
        let row: Vec<String> = (0..4).map(|j| format!("{:.10}", matrix[(i, j)])).collect();
        out.push_str(&row.join("  "));
        out.push('\n');
    }
    fs::write(path, out)
        .map_err(|e| MotionError::input(format!("failed to write {}: {}", path.display(), e)))
}

/// Read a matrix written by [`write_matrix`] (or any whitespace-separated
/// 16-value text file, row-major).
pub fn read_matrix<P: AsRef<Path>>(path: P) -> Result<Matrix4> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| MotionError::input(format!("failed to read {}: {}", path.display(), e)))?;

    let values: Vec<f64> = text
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f64>().map_err(|_| {
                MotionError::input(format!("{}: invalid matrix entry {:?}", path.display(), tok))
            })
        })
        .collect::<Result<_>>()?;
    if values.len() != 16 {
        return Err(MotionError::input(format!(
            "{}: expected 16 matrix entries, found {}",
            path.display(),
            values.len()
        )));
    }

    let mut m = Matrix4::identity();
    for i in 0..4 {
        for j in 0..4 {
            m[(i, j)] = values[i * 4 + j];
        }
    }
    Ok(m)
}
