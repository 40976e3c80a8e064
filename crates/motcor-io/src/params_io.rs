//! Delimited text writers for motion parameters and displacement series.

use std::fs;
use std::path::Path;

use motcor_core::transform::MotionParams;
use motcor_core::{MotionError, Result};

/// Write motion parameters, one frame per row, six columns
/// (`tx ty tz rx ry rz`). Row order equals frame order.
pub fn write_params<P: AsRef<Path>>(path: P, params: &[MotionParams]) -> Result<()> {
    let path = path.as_ref();
    let mut out = String::new();
    for record in params {
        let row: Vec<String> = record.as_row().iter().map(|v| format!("{:.6}", v)).collect();
        out.push_str(&row.join("  "));
        out.push('\n');
    }
    fs::write(path, out)
        .map_err(|e| MotionError::input(format!("failed to write {}: {}", path.display(), e)))
}

/// Write one displacement value per line, in frame order.
pub fn write_rms<P: AsRef<Path>>(path: P, values: &[f64]) -> Result<()> {
    let path = path.as_ref();
    let mut out = String::new();
    for v in values {
        out.push_str(&format!("{:.6}\n", v));
    }
    fs::write(path, out)
        .map_err(|e| MotionError::input(format!("failed to write {}: {}", path.display(), e)))
}
