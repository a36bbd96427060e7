//! Named wake-up bits shared by the producer and consumer of a transport.
//!
//! The bits live in the event flag word of the data queue's shared header.
//! Setting a bit is a release-ordered `fetch_or`; waiting consumes the
//! requested bits with an acquire-release `fetch_and`. A waiter always
//! regains control after its timeout, even if nobody ever wakes it.

use std::ops::BitOr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::models::error::StreamError;
use crate::transport::message_queue::DataQueue;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalMask(u32);

impl SignalMask {
    /// Data available for the consumer.
    pub const NOT_EMPTY: Self = Self(1 << 0);
    /// Space available for the producer.
    pub const NOT_FULL: Self = Self(1 << 1);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0 && !other.is_empty()
    }
}

impl BitOr for SignalMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

pub struct SignalGroup {
    queue: Arc<DataQueue>,
    lock: Mutex<()>,
    cond: Condvar,
}

impl SignalGroup {
    /// Bind a signal group to the event flag word of `queue`.
    ///
    /// Fails if another group already owns the word.
    pub fn create(queue: Arc<DataQueue>) -> Result<Self, StreamError> {
        if !queue.bind_event_flag() {
            return Err(StreamError::InvalidArguments(
                "event flag word already bound to a signal group".into(),
            ));
        }
        Ok(Self {
            queue,
            lock: Mutex::new(()),
            cond: Condvar::new(),
        })
    }

    fn word(&self) -> &AtomicU32 {
        self.queue.event_flag_word()
    }

    fn take(&self, mask: SignalMask) -> SignalMask {
        SignalMask(self.word().fetch_and(!mask.0, Ordering::AcqRel) & mask.0)
    }

    /// Block until any bit in `mask` is set or `timeout` elapses.
    ///
    /// Returns the requested bits that were observed, clearing them. An
    /// empty mask means the wait timed out.
    pub fn wait(&self, mask: SignalMask, timeout: Duration) -> SignalMask {
        if mask.is_empty() {
            return SignalMask::empty();
        }

        let deadline = Instant::now() + timeout;
        let mut guard = self.lock.lock();
        loop {
            let observed = self.take(mask);
            if !observed.is_empty() {
                return observed;
            }
            if self.cond.wait_until(&mut guard, deadline).timed_out() {
                return self.take(mask);
            }
        }
    }

    /// Set the bits in `mask` and release every waiter.
    ///
    /// The bits are published without the lock. The lock is then taken
    /// only around `notify_all`; every holder keeps it for a single atomic
    /// `fetch_and` before parking, so the capture thread never waits on a
    /// descheduled consumer for longer than that.
    pub fn wake(&self, mask: SignalMask) {
        self.word().fetch_or(mask.0, Ordering::Release);
        let _guard = self.lock.lock();
        self.cond.notify_all();
    }

    /// Bits currently set, without consuming them.
    pub fn pending(&self) -> SignalMask {
        SignalMask(self.word().load(Ordering::Acquire))
    }
}

impl Drop for SignalGroup {
    fn drop(&mut self) {
        self.queue.unbind_event_flag();
    }
}

impl std::fmt::Debug for SignalGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalGroup")
            .field("pending", &self.pending())
            .finish()
    }
}
