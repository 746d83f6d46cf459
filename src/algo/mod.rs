//! Mesh processing algorithms.
//!
//! - **Smoothing**: single-pass uniform Laplacian smoothing ([`smooth`])
//! - **Progress**: stage callbacks for long runs ([`Progress`])

pub mod progress;
pub mod smooth;

pub use progress::Progress;
