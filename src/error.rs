use thiserror::Error;

use crate::window_control::WindowControlError;

/// Errors a capture session can end with.
///
/// None of these propagate past the session boundary; each terminal outcome
/// produces exactly one user-visible notification. `SelectionCancelled` is a
/// normal user exit, not a failure.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Screen capture source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("No capturable screen found - check the OS screen recording permission")]
    PermissionDenied,

    #[error("Screen capture produced an empty image")]
    EmptyCapture,

    #[error("Selection cancelled")]
    SelectionCancelled,

    #[error("Window control unavailable: {0}")]
    WindowControlUnavailable(#[from] WindowControlError),

    #[error("{0}")]
    Unknown(String),
}
