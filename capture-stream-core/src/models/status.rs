use std::fmt;

use super::error::StreamError;

/// Errno-style status code reported by an audio source.
///
/// Zero means success, negative values are `-errno`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeStatus(pub i32);

impl NativeStatus {
    pub const OK: Self = Self(0);
    pub const IO: Self = Self(-5);
    pub const WOULD_BLOCK: Self = Self(-11);
    pub const NO_DEVICE: Self = Self(-19);
    pub const INVALID_ARGUMENT: Self = Self(-22);
    pub const NOT_IMPLEMENTED: Self = Self(-38);
    pub const NO_DATA: Self = Self(-61);

    /// Translate a failed device call into the session error taxonomy.
    ///
    /// Every failure is logged with the name of the device operation.
    pub fn into_error(self, op: &'static str) -> StreamError {
        log::warn!("device call {} failed: {}", op, self);
        match self {
            Self::INVALID_ARGUMENT => {
                StreamError::InvalidArguments(format!("{} rejected arguments", op))
            }
            Self::NO_DATA => {
                StreamError::InvalidState(format!("{} has no data in current state", op))
            }
            Self::NO_DEVICE => StreamError::NotInitialized,
            Self::NOT_IMPLEMENTED => StreamError::NotSupported,
            Self(status) => StreamError::Device { op, status },
        }
    }
}

impl fmt::Display for NativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::OK => "OK",
            Self::IO => "EIO",
            Self::WOULD_BLOCK => "EAGAIN",
            Self::NO_DEVICE => "ENODEV",
            Self::INVALID_ARGUMENT => "EINVAL",
            Self::NOT_IMPLEMENTED => "ENOSYS",
            Self::NO_DATA => "ENODATA",
            _ => return write!(f, "status {}", self.0),
        };
        write!(f, "{} ({})", name, self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_taxonomy() {
        assert!(matches!(
            NativeStatus::INVALID_ARGUMENT.into_error("set_gain"),
            StreamError::InvalidArguments(_)
        ));
        assert!(matches!(
            NativeStatus::NO_DATA.into_error("read"),
            StreamError::InvalidState(_)
        ));
        assert_eq!(NativeStatus::NO_DEVICE.into_error("read"), StreamError::NotInitialized);
        assert_eq!(
            NativeStatus::NOT_IMPLEMENTED.into_error("get_capture_position"),
            StreamError::NotSupported
        );
    }

    #[test]
    fn unknown_codes_stay_device_errors() {
        assert_eq!(
            NativeStatus::IO.into_error("read"),
            StreamError::Device { op: "read", status: -5 }
        );
        assert_eq!(
            NativeStatus(-1234).into_error("standby"),
            StreamError::Device { op: "standby", status: -1234 }
        );
    }

    #[test]
    fn display_uses_errno_names() {
        assert_eq!(NativeStatus::INVALID_ARGUMENT.to_string(), "EINVAL (-22)");
        assert_eq!(NativeStatus(-7).to_string(), "status -7");
    }
}
