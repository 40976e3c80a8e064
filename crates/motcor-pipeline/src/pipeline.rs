//! The motion quantification run.
//!
//! Control flow: reference selection, per-frame motion estimation
//! (external, blocking), parameter and matrix conversion plus
//! displacement quantification across frames, ordered aggregation, output
//! writes, then the intermediate-retention sweep. Conversion is
//! parallelized across frames; aggregation and every file write stay on
//! the calling thread so frame order in the artifacts is guaranteed by a
//! single writer.

use std::path::Path;

use ndarray::{Array4, Axis};
use rayon::prelude::*;
use tracing::{debug, info};

use motcor_core::displacement::{displacement_series, Displacement, SphericalSupport};
use motcor_core::geometry::Matrix4;
use motcor_core::transform::flirt;
use motcor_core::transform::{MotionParams, ParamConvention, RigidTransform, TransformStack};
use motcor_core::{MotionError, Result, VolumeStack};
use motcor_io::{matrix_io, nifti_io, params_io, transform_io};

use crate::cleanup;
use crate::config::RunConfig;
use crate::estimator::{FrameRegistration, MotionEstimator};
use crate::layout::OutputLayout;
use crate::progress::Progress;
use crate::reference;

/// Per-frame records derived from a set of transforms.
#[derive(Debug, Clone)]
pub struct MotionSummary {
    /// Six-parameter records, frame order.
    pub params: Vec<MotionParams>,
    /// Absolute and relative RMS displacement, frame order.
    pub displacement: Vec<Displacement>,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Number of frames processed.
    pub num_frames: usize,
    /// Six-parameter records, frame order.
    pub params: Vec<MotionParams>,
    /// Absolute and relative RMS displacement, frame order.
    pub displacement: Vec<Displacement>,
    /// Number of intermediate deletions that failed (non-fatal).
    pub cleanup_warnings: usize,
}

/// Convert per-frame transforms into parameter records and displacement.
///
/// This is the pure core of the pipeline, usable with transforms from any
/// source. Parameter conversion runs in parallel across frames; the
/// displacement series passes each frame's predecessor explicitly, so
/// results are independent of evaluation order.
///
/// # Errors
/// Returns a computation error when the transform count does not match
/// the frame count.
pub fn quantify(
    transforms: &[RigidTransform],
    num_frames: usize,
    support: &SphericalSupport,
    convention: ParamConvention,
) -> Result<MotionSummary> {
    if transforms.len() != num_frames {
        return Err(MotionError::computation(format!(
            "{} transforms supplied for a {}-frame stack",
            transforms.len(),
            num_frames
        )));
    }

    let params: Vec<MotionParams> = transforms
        .par_iter()
        .map(|t| MotionParams::from_transform(t, convention))
        .collect();
    let displacement = displacement_series(transforms, support);

    Ok(MotionSummary {
        params,
        displacement,
    })
}

/// Execute a full motion quantification run.
///
/// Primary outputs (parameters, displacement files, transform artifact,
/// corrected stack) are written only after every computation has
/// succeeded; a failure in any stage aborts with no partial primary
/// output. Volumes already written by the external engine are not rolled
/// back.
pub fn run(
    input: &Path,
    layout: &OutputLayout,
    config: &RunConfig,
    estimator: &dyn MotionEstimator,
    progress: &dyn Progress,
) -> Result<RunSummary> {
    config.validate()?;

    info!("reading volume stack from {}", input.display());
    let stack = nifti_io::read_stack(input)?;
    let num_frames = stack.num_frames();

    let reference = reference::select(&stack, &config.reference, layout)?;

    let mask = match &config.mask {
        Some(path) => {
            let mask = nifti_io::read_volume(path)?;
            if !mask.geometry().same_grid(reference.geometry()) {
                return Err(MotionError::input(format!(
                    "mask {} is not on the reference grid",
                    path.display()
                )));
            }
            Some(mask)
        }
        None => None,
    };
    let support = match &mask {
        Some(mask) => SphericalSupport::from_mask(mask)?,
        None => SphericalSupport::with_radius(stack.geometry(), config.support_radius),
    };
    info!("displacement support: radius {:.1} mm", support.radius);

    progress.begin(num_frames);
    info!("estimating motion for {} frames", num_frames);
    let mut registrations: Vec<FrameRegistration> = Vec::with_capacity(num_frames);
    for index in 0..num_frames {
        let frame = stack.frame(index)?;
        let registration = estimator.estimate(&frame, &reference, mask.as_ref())?;
        if !registration.resampled.geometry().same_grid(reference.geometry()) {
            return Err(MotionError::computation(format!(
                "engine returned frame {} on a different grid than the reference",
                index
            )));
        }
        debug!(
            "frame {}: translation norm {:.3} mm",
            index,
            registration.transform.translation().norm()
        );
        progress.frame_done(index);
        registrations.push(registration);
    }

    let transforms: Vec<RigidTransform> =
        registrations.iter().map(|r| r.transform.clone()).collect();

    let summary = quantify(&transforms, num_frames, &support, config.convention)?;

    let flirt_matrices: Vec<Matrix4> = transforms
        .par_iter()
        .map(|t| flirt::world_to_flirt(t.matrix(), reference.geometry(), stack.geometry()))
        .collect::<Result<_>>()?;

    let aggregate =
        TransformStack::from_indexed(transforms.iter().cloned().enumerate(), num_frames)?;

    // Assemble the corrected stack on the reference grid.
    let shape = reference.geometry().shape();
    let mut corrected = Array4::<f32>::zeros((shape[0], shape[1], shape[2], num_frames));
    for (index, registration) in registrations.iter().enumerate() {
        corrected
            .index_axis_mut(Axis(3), index)
            .assign(registration.resampled.data());
    }
    let corrected = VolumeStack::new(corrected, reference.geometry().clone());

    // Per-frame intermediates. These are write-only side outputs: every
    // consumer works from the in-memory records above.
    std::fs::create_dir_all(layout.mat_dir()).map_err(|e| {
        MotionError::input(format!("cannot create {}: {}", layout.mat_dir().display(), e))
    })?;
    std::fs::create_dir_all(layout.frames_dir()).map_err(|e| {
        MotionError::input(format!("cannot create {}: {}", layout.frames_dir().display(), e))
    })?;
    for (index, registration) in registrations.iter().enumerate() {
        matrix_io::write_matrix(layout.raw_matrix(index), transforms[index].matrix())?;
        matrix_io::write_matrix(layout.flirt_matrix(index), &flirt_matrices[index])?;
        transform_io::write_transform(layout.text_transform(index), &transforms[index])?;
        nifti_io::write_volume(layout.frame_volume(index), &registration.resampled)?;
    }

    // Primary outputs, single writer, frame order throughout.
    info!("writing outputs with prefix {}", layout.prefix().display());
    nifti_io::write_stack(layout.corrected_stack(), &corrected)?;
    params_io::write_params(layout.params(), &summary.params)?;
    let abs: Vec<f64> = summary.displacement.iter().map(|d| d.abs_rms).collect();
    let rel: Vec<f64> = summary.displacement.iter().map(|d| d.rel_rms).collect();
    params_io::write_rms(layout.abs_rms(), &abs)?;
    params_io::write_rms(layout.rel_rms(), &rel)?;
    transform_io::write_transform_stack(layout.transform_stack(), &aggregate)?;

    // All consumers are done; sweep unretained intermediates.
    let cleanup_warnings = cleanup::sweep(layout, &config.retention, num_frames);

    info!("motion quantification complete: {} frames", num_frames);
    Ok(RunSummary {
        num_frames,
        params: summary.params,
        displacement: summary.displacement,
        cleanup_warnings,
    })
}
