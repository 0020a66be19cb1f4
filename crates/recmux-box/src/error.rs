//! Error types for recmux-box.

use thiserror::Error;

/// Result type for box writing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for box writing operations.
///
/// Running out of room in the caller's buffer is the only recoverable
/// failure. Everything else the writer is handed is trusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The output buffer cannot hold the requested write.
    #[error("Out of resources: need {need} bytes, have {have}")]
    OutOfResources { need: usize, have: usize },
}

impl Error {
    /// Create an out-of-resources error.
    pub fn out_of_resources(need: usize, have: usize) -> Self {
        Self::OutOfResources { need, have }
    }
}
