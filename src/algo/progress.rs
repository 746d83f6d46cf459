//! Progress reporting for the smoothing pipeline.
//!
//! Drivers that want feedback while a large file is welded can hand a
//! [`Progress`] to [`crate::pipeline::smooth_file_with_progress`], which
//! reports once as each stage starts and once when the run is complete.
//!
//! # Example
//!
//! ```
//! use stlsmooth::algo::Progress;
//!
//! let progress = Progress::new(|current, total, message| {
//!     eprintln!("[{}/{}] {}", current, total, message);
//! });
//! progress.report(0, 4, "read");
//! ```

use crate::pipeline::Stage;

/// A progress callback that receives updates during long-running operations.
///
/// The callback receives:
/// - `current`: Number of steps already finished
/// - `total`: Total number of steps
/// - `message`: Description of the step now running
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// Report that a pipeline stage is starting.
    pub fn stage(&self, stage: Stage) {
        self.report(stage.ordinal(), Stage::ALL.len(), stage.name());
    }

    /// Report that every pipeline stage has finished.
    pub fn finished(&self) {
        self.report(Stage::ALL.len(), Stage::ALL.len(), "done");
    }

    /// Create a no-op progress reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}
