//! External registration engine adapter.
//!
//! Invokes a caller-supplied command once per frame, exchanging volumes
//! and transforms through a scratch directory. The command is given as a
//! whitespace-separated template with placeholders `{moving}`, `{fixed}`,
//! `{transform}`, `{resampled}` and optionally `{mask}`; the engine must
//! write the transform as a 4x4 world-space text matrix.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use motcor_core::transform::RigidTransform;
use motcor_core::{MotionError, Result, Volume};
use motcor_io::{matrix_io, nifti_io};

use crate::estimator::{FrameRegistration, MotionEstimator};

const REQUIRED_PLACEHOLDERS: [&str; 4] = ["{moving}", "{fixed}", "{transform}", "{resampled}"];

/// A registration engine driven through a shell command template.
#[derive(Debug)]
pub struct CommandEstimator {
    template: String,
    scratch: PathBuf,
    counter: AtomicUsize,
}

impl CommandEstimator {
    /// Create an adapter writing its exchange files under `scratch`.
    ///
    /// # Errors
    /// Argument error when the template lacks a required placeholder;
    /// input error when the scratch directory cannot be created.
    pub fn new(template: impl Into<String>, scratch: impl Into<PathBuf>) -> Result<Self> {
        let template = template.into();
        for placeholder in REQUIRED_PLACEHOLDERS {
            if !template.contains(placeholder) {
                return Err(MotionError::argument(format!(
                    "engine command is missing the {} placeholder",
                    placeholder
                )));
            }
        }
        let scratch = scratch.into();
        fs::create_dir_all(&scratch).map_err(|e| {
            MotionError::input(format!(
                "cannot create scratch directory {}: {}",
                scratch.display(),
                e
            ))
        })?;
        Ok(Self {
            template,
            scratch,
            counter: AtomicUsize::new(0),
        })
    }

    /// Expand the template into an argument vector.
    fn expand(&self, substitutions: &[(&str, String)]) -> Vec<String> {
        self.template
            .split_whitespace()
            .map(|token| {
                let mut token = token.to_string();
                for (placeholder, value) in substitutions {
                    token = token.replace(placeholder, value);
                }
                token
            })
            .collect()
    }
}

impl MotionEstimator for CommandEstimator {
    fn estimate(
        &self,
        moving: &Volume,
        fixed: &Volume,
        mask: Option<&Volume>,
    ) -> Result<FrameRegistration> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst);
        let moving_path = self.scratch.join(format!("moving_{:04}.nii.gz", index));
        let fixed_path = self.scratch.join(format!("fixed_{:04}.nii.gz", index));
        let transform_path = self.scratch.join(format!("xfm_{:04}.mat", index));
        let resampled_path = self.scratch.join(format!("resampled_{:04}.nii.gz", index));

        nifti_io::write_volume(&moving_path, moving)?;
        nifti_io::write_volume(&fixed_path, fixed)?;

        let mut substitutions = vec![
            ("{moving}", moving_path.display().to_string()),
            ("{fixed}", fixed_path.display().to_string()),
            ("{transform}", transform_path.display().to_string()),
            ("{resampled}", resampled_path.display().to_string()),
        ];
        if self.template.contains("{mask}") {
            let mask = mask.ok_or_else(|| {
                MotionError::argument("engine command uses {mask} but no mask was supplied")
            })?;
            let mask_path = self.scratch.join(format!("mask_{:04}.nii.gz", index));
            nifti_io::write_volume(&mask_path, mask)?;
            substitutions.push(("{mask}", mask_path.display().to_string()));
        }

        let argv = self.expand(&substitutions);
        debug!("running engine: {}", argv.join(" "));
        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .output()
            .map_err(|e| MotionError::input(format!("failed to launch engine {}: {}", argv[0], e)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MotionError::input(format!(
                "engine exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let matrix = matrix_io::read_matrix(&transform_path)?;
        let transform = RigidTransform::from_matrix(matrix)?;
        let resampled = nifti_io::read_volume(&resampled_path)?;
        Ok(FrameRegistration {
            transform,
            resampled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_placeholder_is_argument_error() {
        let dir = tempdir().unwrap();
        let err = CommandEstimator::new("register {moving} {fixed}", dir.path()).unwrap_err();
        assert!(matches!(err, MotionError::Argument(_)));
    }

    #[test]
    fn test_template_expansion() {
        let dir = tempdir().unwrap();
        let estimator = CommandEstimator::new(
            "engine -m {moving} -f {fixed} -o {transform},{resampled}",
            dir.path(),
        )
        .unwrap();

        let argv = estimator.expand(&[
            ("{moving}", "m.nii".into()),
            ("{fixed}", "f.nii".into()),
            ("{transform}", "x.mat".into()),
            ("{resampled}", "r.nii".into()),
        ]);
        assert_eq!(argv, vec!["engine", "-m", "m.nii", "-f", "f.nii", "-o", "x.mat,r.nii"]);
    }
}
