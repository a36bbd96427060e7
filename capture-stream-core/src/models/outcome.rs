use serde::{Deserialize, Serialize};

use super::error::ResultCode;

/// Per-chunk status record published by the capture worker.
///
/// Exactly one record is produced per read attempt. `transferred` is the
/// count the device reported, which may exceed what fit in the transport.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOutcome {
    pub result: ResultCode,
    pub transferred: u64,
}

impl ReadOutcome {
    pub fn ok(transferred: u64) -> Self {
        Self {
            result: ResultCode::Ok,
            transferred,
        }
    }

    pub fn failed(result: ResultCode) -> Self {
        Self {
            result,
            transferred: 0,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}
