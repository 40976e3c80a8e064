//! Intermediate-artifact lifecycle.
//!
//! Runs strictly after aggregation and displacement have consumed their
//! inputs, so no deletion can race a consumer. Deletion is best-effort:
//! individual failures are logged and counted, never fatal.

use std::fs;
use std::path::PathBuf;

use tracing::warn;

use crate::config::Retention;
use crate::layout::OutputLayout;

fn remove_file_logged(path: PathBuf) -> usize {
    if !path.exists() {
        return 0;
    }
    match fs::remove_file(&path) {
        Ok(()) => 0,
        Err(e) => {
            warn!("could not delete intermediate {}: {}", path.display(), e);
            1
        }
    }
}

/// Delete every intermediate whose retention flag is unset.
///
/// Returns the number of deletions that failed (cleanup warnings).
pub fn sweep(layout: &OutputLayout, retention: &Retention, num_frames: usize) -> usize {
    let mut warnings = 0;
    for frame in 0..num_frames {
        if !retention.raw_matrices {
            warnings += remove_file_logged(layout.raw_matrix(frame));
        }
        if !retention.flirt_matrices {
            warnings += remove_file_logged(layout.flirt_matrix(frame));
        }
        if !retention.text_transforms {
            warnings += remove_file_logged(layout.text_transform(frame));
        }
        if !retention.frame_volumes {
            warnings += remove_file_logged(layout.frame_volume(frame));
        }
    }

    // Drop directories that are now empty; a non-empty directory is kept.
    for dir in [layout.mat_dir(), layout.frames_dir()] {
        let _ = fs::remove_dir(&dir);
    }

    // Engine scratch space is never retained.
    let scratch = layout.scratch_dir();
    if scratch.exists() {
        if let Err(e) = fs::remove_dir_all(&scratch) {
            warn!("could not delete scratch directory {}: {}", scratch.display(), e);
            warnings += 1;
        }
    }

    warnings
}
