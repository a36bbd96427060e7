use thiserror::Error;

use crate::models::audio_models::ThreadPriority;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PriorityError {
    #[error("real-time scheduling unavailable on this platform")]
    Unsupported,

    #[error("scheduler refused priority {priority:?}: os error {code}")]
    Refused { priority: ThreadPriority, code: i32 },
}

/// Elevates the scheduling class of the calling thread.
///
/// Called once, from the capture worker thread, before its loop starts.
/// Failures are logged by the caller and never stop capture.
pub trait PriorityRequester: Send + Sync {
    fn request(&self, priority: ThreadPriority) -> Result<(), PriorityError>;
}

/// Requester for platforms without real-time scheduling classes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPriorityRequester;

impl PriorityRequester for NoopPriorityRequester {
    fn request(&self, priority: ThreadPriority) -> Result<(), PriorityError> {
        log::debug!("ignoring priority request {:?}", priority);
        Ok(())
    }
}
