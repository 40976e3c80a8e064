//! Output file layout.
//!
//! Every output and intermediate path is derived from a single prefix, so
//! one run owns one coherent family of files.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// The file layout of one pipeline run.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    prefix: PathBuf,
}

impl OutputLayout {
    /// Create a layout rooted at an explicit prefix.
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Derive the default prefix from an input path: the path with its
    /// `.nii` / `.nii.gz` extension stripped and `_mc` appended.
    pub fn derive_from_input(input: &Path) -> Self {
        let name = input.to_string_lossy();
        let stem = name
            .strip_suffix(".nii.gz")
            .or_else(|| name.strip_suffix(".nii"))
            .unwrap_or(&name);
        Self::new(format!("{}_mc", stem))
    }

    /// The prefix itself.
    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut s: OsString = self.prefix.clone().into_os_string();
        s.push(suffix);
        PathBuf::from(s)
    }

    /// Motion-corrected stack.
    pub fn corrected_stack(&self) -> PathBuf {
        self.with_suffix(".nii.gz")
    }

    /// Derived reference volume (written only when the reference is
    /// computed rather than supplied).
    pub fn reference_volume(&self) -> PathBuf {
        self.with_suffix("_ref.nii.gz")
    }

    /// Six-parameter motion record file.
    pub fn params(&self) -> PathBuf {
        self.with_suffix(".par")
    }

    /// Absolute RMS displacement file.
    pub fn abs_rms(&self) -> PathBuf {
        self.with_suffix("_abs.rms")
    }

    /// Relative RMS displacement file.
    pub fn rel_rms(&self) -> PathBuf {
        self.with_suffix("_rel.rms")
    }

    /// Concatenated multi-transform artifact.
    pub fn transform_stack(&self) -> PathBuf {
        self.with_suffix(".cat")
    }

    /// Directory of per-frame matrices and text transforms.
    pub fn mat_dir(&self) -> PathBuf {
        self.with_suffix(".mat")
    }

    /// Per-frame raw world-space matrix.
    pub fn raw_matrix(&self, frame: usize) -> PathBuf {
        self.mat_dir().join(format!("MAT_{:04}", frame))
    }

    /// Per-frame matrix in the FSL convention.
    pub fn flirt_matrix(&self, frame: usize) -> PathBuf {
        self.mat_dir().join(format!("FLIRT_{:04}.mat", frame))
    }

    /// Per-frame text-form transform.
    pub fn text_transform(&self, frame: usize) -> PathBuf {
        self.mat_dir().join(format!("frame_{:04}.tfm", frame))
    }

    /// Directory of per-frame resampled volumes.
    pub fn frames_dir(&self) -> PathBuf {
        self.with_suffix("_frames")
    }

    /// Per-frame resampled volume.
    pub fn frame_volume(&self, frame: usize) -> PathBuf {
        self.frames_dir().join(format!("frame_{:04}.nii.gz", frame))
    }

    /// Scratch space for an external registration engine.
    pub fn scratch_dir(&self) -> PathBuf {
        self.with_suffix("_scratch")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_strips_nii_gz() {
        let layout = OutputLayout::derive_from_input(Path::new("/data/bold.nii.gz"));
        assert_eq!(layout.prefix(), Path::new("/data/bold_mc"));
        assert_eq!(layout.corrected_stack(), PathBuf::from("/data/bold_mc.nii.gz"));
    }

    #[test]
    fn test_derive_strips_nii() {
        let layout = OutputLayout::derive_from_input(Path::new("run1.nii"));
        assert_eq!(layout.params(), PathBuf::from("run1_mc.par"));
    }

    #[test]
    fn test_per_frame_paths_are_indexed() {
        let layout = OutputLayout::new("/tmp/out");
        assert_eq!(layout.raw_matrix(7), PathBuf::from("/tmp/out.mat/MAT_0007"));
        assert_eq!(
            layout.frame_volume(12),
            PathBuf::from("/tmp/out_frames/frame_0012.nii.gz")
        );
    }
}
