//! # capture-stream-platform
//!
//! OS scheduling backends for the capture worker thread.
//!
//! Provides:
//! - `PthreadPriorityRequester`: SCHED_FIFO via `pthread_setschedparam` (Unix)
//! - `MmcssPriorityRequester`: MMCSS task registration (Windows)
//! - `default_priority_requester()`: the best backend for the current target
//!
//! ## Usage
//! ```ignore
//! use capture_stream_core::{CaptureSession, SessionConfig};
//! use capture_stream_platform::default_priority_requester;
//!
//! let mut session = CaptureSession::new(device, SessionConfig::default())?;
//! session.set_priority_requester(default_priority_requester());
//! ```

use std::sync::Arc;

use capture_stream_core::PriorityRequester;

#[cfg(target_os = "windows")]
pub mod mmcss_priority;
#[cfg(unix)]
pub mod pthread_priority;

#[cfg(target_os = "windows")]
pub use mmcss_priority::MmcssPriorityRequester;
#[cfg(unix)]
pub use pthread_priority::PthreadPriorityRequester;

/// Real-time priority backend for the target platform.
#[cfg(unix)]
pub fn default_priority_requester() -> Arc<dyn PriorityRequester> {
    Arc::new(PthreadPriorityRequester::default())
}

/// Real-time priority backend for the target platform.
#[cfg(target_os = "windows")]
pub fn default_priority_requester() -> Arc<dyn PriorityRequester> {
    Arc::new(MmcssPriorityRequester)
}

/// Real-time priority backend for the target platform.
#[cfg(not(any(unix, target_os = "windows")))]
pub fn default_priority_requester() -> Arc<dyn PriorityRequester> {
    Arc::new(capture_stream_core::NoopPriorityRequester)
}

#[cfg(test)]
mod tests {
    use capture_stream_core::ThreadPriority;

    use super::*;

    #[test]
    fn normal_priority_is_always_accepted() {
        let requester = default_priority_requester();
        assert!(requester.request(ThreadPriority::Normal).is_ok());
    }

    #[test]
    fn elevated_request_never_panics() {
        // Without privileges the scheduler may refuse; that is reported, not fatal.
        let requester = default_priority_requester();
        let _ = std::thread::spawn(move || requester.request(ThreadPriority::Audio))
            .join()
            .unwrap();
    }
}
