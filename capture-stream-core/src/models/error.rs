use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by every control call on a capture session.
///
/// Per-chunk read failures never surface here; the worker reports those
/// through the status channel as a failed [`ReadOutcome`](super::outcome::ReadOutcome).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("not supported")]
    NotSupported,

    #[error("device not initialized")]
    NotInitialized,

    #[error("{op} failed with device status {status}")]
    Device { op: &'static str, status: i32 },
}

impl StreamError {
    pub fn already_prepared() -> Self {
        Self::InvalidState("transport already prepared".into())
    }

    pub fn closed() -> Self {
        Self::InvalidState("session is closed".into())
    }

    /// Wire form of this error, as carried inside a status record.
    pub fn code(&self) -> ResultCode {
        match self {
            Self::InvalidArguments(_) => ResultCode::InvalidArguments,
            Self::InvalidState(_) => ResultCode::InvalidState,
            Self::NotSupported => ResultCode::NotSupported,
            Self::NotInitialized => ResultCode::NotInitialized,
            Self::Device { .. } => ResultCode::Io,
        }
    }
}

/// Result code stored in shared memory next to each captured chunk.
#[repr(u32)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultCode {
    #[default]
    Ok = 0,
    NotInitialized = 1,
    InvalidArguments = 2,
    InvalidState = 3,
    NotSupported = 4,
    Io = 5,
}

impl ResultCode {
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_follow_taxonomy() {
        assert_eq!(
            StreamError::InvalidArguments("x".into()).code(),
            ResultCode::InvalidArguments
        );
        assert_eq!(StreamError::already_prepared().code(), ResultCode::InvalidState);
        assert_eq!(StreamError::NotSupported.code(), ResultCode::NotSupported);
        assert_eq!(StreamError::NotInitialized.code(), ResultCode::NotInitialized);
        assert_eq!(
            StreamError::Device { op: "read", status: -5 }.code(),
            ResultCode::Io
        );
    }

    #[test]
    fn device_error_display_names_operation() {
        let err = StreamError::Device { op: "read", status: -5 };
        assert_eq!(err.to_string(), "read failed with device status -5");
    }
}
