//! POSIX real-time scheduling for the capture thread.
//!
//! Moves the calling thread into `SCHED_FIFO`. Usually needs
//! `CAP_SYS_NICE` or an `rtprio` rlimit on Linux; without either the
//! scheduler returns `EPERM` and the thread keeps its default policy.

use capture_stream_core::{PriorityError, PriorityRequester, ThreadPriority};

/// FIFO levels used for each hint, relative to the policy minimum.
#[derive(Debug, Clone, Copy)]
pub struct PthreadPriorityRequester {
    pub audio_level: i32,
    pub urgent_level: i32,
}

impl Default for PthreadPriorityRequester {
    fn default() -> Self {
        Self {
            audio_level: 2,
            urgent_level: 3,
        }
    }
}

impl PthreadPriorityRequester {
    fn fifo_priority(&self, priority: ThreadPriority) -> i32 {
        let level = match priority {
            ThreadPriority::Normal => 0,
            ThreadPriority::Audio => self.audio_level,
            ThreadPriority::Urgent => self.urgent_level,
        };
        // SAFETY: plain queries of the scheduler's static priority range.
        let (min, max) = unsafe {
            (
                libc::sched_get_priority_min(libc::SCHED_FIFO),
                libc::sched_get_priority_max(libc::SCHED_FIFO),
            )
        };
        (min + level).clamp(min, max)
    }
}

impl PriorityRequester for PthreadPriorityRequester {
    fn request(&self, priority: ThreadPriority) -> Result<(), PriorityError> {
        if !priority.is_elevated() {
            return Ok(());
        }

        let sched_priority = self.fifo_priority(priority);
        // SAFETY: `param` is fully initialized and only the calling thread is changed.
        let code = unsafe {
            let mut param: libc::sched_param = std::mem::zeroed();
            param.sched_priority = sched_priority;
            libc::pthread_setschedparam(libc::pthread_self(), libc::SCHED_FIFO, &param)
        };

        if code == 0 {
            log::debug!(
                "capture thread set to SCHED_FIFO priority {} ({:?})",
                sched_priority,
                priority
            );
            Ok(())
        } else {
            Err(PriorityError::Refused { priority, code })
        }
    }
}
