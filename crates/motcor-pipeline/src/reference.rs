//! Reference volume selection.

use tracing::info;

use motcor_core::{Result, Volume, VolumeStack};
use motcor_io::nifti_io;

use crate::config::ReferenceChoice;
use crate::layout::OutputLayout;

/// Produce the reference volume for a run.
///
/// An explicit reference is loaded as-is. A derived reference (first
/// frame or temporal mean) is persisted alongside the outputs so
/// downstream steps can reuse it.
pub fn select(
    stack: &VolumeStack,
    choice: &ReferenceChoice,
    layout: &OutputLayout,
) -> Result<Volume> {
    match choice {
        ReferenceChoice::External(path) => {
            info!("loading reference volume from {}", path.display());
            nifti_io::read_volume(path)
        }
        ReferenceChoice::FirstFrame => {
            info!("using first frame as reference");
            let reference = stack.frame(0)?;
            nifti_io::write_volume(layout.reference_volume(), &reference)?;
            Ok(reference)
        }
        ReferenceChoice::TemporalMean => {
            info!("using temporal mean of {} frames as reference", stack.num_frames());
            let reference = stack.mean_frame()?;
            nifti_io::write_volume(layout.reference_volume(), &reference)?;
            Ok(reference)
        }
    }
}
