// error.rs

use thiserror::Error;

/// Failures of a backend exchange. None of these stop the control loop.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("network connectivity unavailable")]
    ConnectivityUnavailable,
    #[error("authentication failed (status {status}): {reason}")]
    AuthenticationFailed { status: u16, reason: String },
    #[error("token rejected by backend")]
    Unauthorized,
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Rejected local control request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("expected on or off, got {0:?}")]
    BadSwitch(String),
    #[error("threshold must be a non-negative integer, got {0:?}")]
    BadThreshold(String),
}

// EOF
