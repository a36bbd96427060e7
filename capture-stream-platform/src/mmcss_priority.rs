//! Windows MMCSS registration for the capture thread.
//!
//! Registers the calling thread with the Multimedia Class Scheduler Service
//! under the "Audio" or "Pro Audio" task, which boosts it into the
//! real-time range for as long as the thread lives.

use windows::core::PCWSTR;
use windows::Win32::System::Threading::*;

use capture_stream_core::{PriorityError, PriorityRequester, ThreadPriority};

#[derive(Debug, Default, Clone, Copy)]
pub struct MmcssPriorityRequester;

fn task_name(priority: ThreadPriority) -> Option<&'static str> {
    match priority {
        ThreadPriority::Normal => None,
        ThreadPriority::Audio => Some("Audio\0"),
        ThreadPriority::Urgent => Some("Pro Audio\0"),
    }
}

impl PriorityRequester for MmcssPriorityRequester {
    fn request(&self, priority: ThreadPriority) -> Result<(), PriorityError> {
        let Some(task) = task_name(priority) else {
            return Ok(());
        };

        let wide: Vec<u16> = task.encode_utf16().collect();
        let mut task_index: u32 = 0;
        // SAFETY: `wide` is NUL terminated and outlives the call.
        let registered =
            unsafe { AvSetMmThreadCharacteristicsW(PCWSTR(wide.as_ptr()), &mut task_index) };

        match registered {
            Ok(_) => {
                log::debug!("capture thread registered with MMCSS task {:?}", task);
                Ok(())
            }
            Err(e) => Err(PriorityError::Refused {
                priority,
                code: e.code().0,
            }),
        }
    }
}
