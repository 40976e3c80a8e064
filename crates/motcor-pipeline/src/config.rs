//! Run configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use motcor_core::transform::ParamConvention;
use motcor_core::{MotionError, Result, DEFAULT_SUPPORT_RADIUS_MM};

/// How the reference volume is obtained.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReferenceChoice {
    /// Use frame 0 of the stack.
    #[default]
    FirstFrame,
    /// Use the voxelwise temporal mean of all frames.
    TemporalMean,
    /// Load an externally supplied reference volume.
    External(PathBuf),
}

/// Which per-frame intermediates survive a successful run.
///
/// Each flag is independent; everything left unset is deleted once the
/// aggregation and displacement stages have consumed their inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Retention {
    /// Per-frame resampled volumes.
    pub frame_volumes: bool,
    /// Per-frame matrices in the FSL convention.
    pub flirt_matrices: bool,
    /// Per-frame text-form transforms.
    pub text_transforms: bool,
    /// Per-frame raw world-space matrices.
    pub raw_matrices: bool,
}

impl Retention {
    /// Keep every intermediate.
    pub fn keep_all() -> Self {
        Self {
            frame_volumes: true,
            flirt_matrices: true,
            text_transforms: true,
            raw_matrices: true,
        }
    }
}

/// Configuration of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Reference selection.
    pub reference: ReferenceChoice,
    /// Output convention for the six-parameter records.
    pub convention: ParamConvention,
    /// Optional mask restricting the displacement support.
    pub mask: Option<PathBuf>,
    /// Support radius in physical units, used when no mask is given.
    pub support_radius: f64,
    /// Intermediate retention flags.
    pub retention: Retention,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            reference: ReferenceChoice::default(),
            convention: ParamConvention::Fsl,
            mask: None,
            support_radius: DEFAULT_SUPPORT_RADIUS_MM,
            retention: Retention::default(),
        }
    }
}

impl RunConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reference selection.
    pub fn with_reference(mut self, reference: ReferenceChoice) -> Self {
        self.reference = reference;
        self
    }

    /// Set the parameter convention.
    pub fn with_convention(mut self, convention: ParamConvention) -> Self {
        self.convention = convention;
        self
    }

    /// Restrict the displacement support to a mask.
    pub fn with_mask(mut self, mask: impl Into<PathBuf>) -> Self {
        self.mask = Some(mask.into());
        self
    }

    /// Override the default support radius.
    pub fn with_support_radius(mut self, radius: f64) -> Self {
        self.support_radius = radius;
        self
    }

    /// Set the retention flags.
    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }

    /// Check the configuration for conflicts.
    ///
    /// # Errors
    /// Returns an argument error for a non-positive or non-finite support
    /// radius.
    pub fn validate(&self) -> Result<()> {
        if !self.support_radius.is_finite() || self.support_radius <= 0.0 {
            return Err(MotionError::argument(format!(
                "support radius must be positive and finite, got {}",
                self.support_radius
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bad_radius_is_argument_error() {
        let err = RunConfig::new().with_support_radius(0.0).validate().unwrap_err();
        assert!(matches!(err, MotionError::Argument(_)));
    }
}
