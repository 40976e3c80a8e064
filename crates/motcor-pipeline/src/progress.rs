//! Progress reporting hooks for the per-frame loop.

/// Callback interface for observing per-frame progress.
pub trait Progress {
    /// Called once before the first frame is processed.
    fn begin(&self, _total_frames: usize) {}

    /// Called after each frame's registration completes.
    fn frame_done(&self, _index: usize) {}
}

/// A progress reporter that does nothing.
pub struct NoProgress;

impl Progress for NoProgress {}
