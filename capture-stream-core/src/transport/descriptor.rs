use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::models::outcome::ReadOutcome;
use crate::transport::message_queue::{Consumer, DataQueue, StatusQueue};
use crate::transport::signal_group::{SignalGroup, SignalMask};

/// Handles a consumer uses to attach to a prepared transport.
///
/// Owns the read ends of both queues, so whoever holds the descriptor is the
/// single reader; the write ends live on the capture thread. It requests
/// space with [`request_space`](Self::request_space) after draining, and
/// waits for data with [`wait_data`](Self::wait_data).
///
/// ```compile_fail
/// use capture_stream_core::TransportDescriptor;
///
/// fn publish(descriptor: &TransportDescriptor) {
///     descriptor.data().write(&[0xEE; 4]);
/// }
/// ```
pub struct TransportDescriptor {
    id: Uuid,
    chunk_byte_size: usize,
    chunk_count: usize,
    data: Consumer<u8>,
    status: Consumer<ReadOutcome>,
    signals: Arc<SignalGroup>,
}

impl TransportDescriptor {
    pub(crate) fn new(
        chunk_byte_size: usize,
        chunk_count: usize,
        data: Consumer<u8>,
        status: Consumer<ReadOutcome>,
        signals: Arc<SignalGroup>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            chunk_byte_size,
            chunk_count,
            data,
            status,
            signals,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn chunk_byte_size(&self) -> usize {
        self.chunk_byte_size
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Fill levels of the data queue.
    pub fn data(&self) -> &DataQueue {
        self.data.queue()
    }

    pub fn status(&self) -> &StatusQueue {
        self.status.queue()
    }

    pub fn signals(&self) -> &Arc<SignalGroup> {
        &self.signals
    }

    /// Tell the producer there is room for another chunk.
    pub fn request_space(&self) {
        self.signals.wake(SignalMask::NOT_FULL);
    }

    /// Wait for the producer to publish. Returns `false` on timeout.
    pub fn wait_data(&self, timeout: Duration) -> bool {
        self.signals
            .wait(SignalMask::NOT_EMPTY, timeout)
            .contains(SignalMask::NOT_EMPTY)
    }

    /// Drain up to `out.len()` captured bytes.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        self.data.read(out)
    }

    /// Take the pending status record, if any.
    pub fn next_status(&mut self) -> Option<ReadOutcome> {
        self.status.read_one()
    }
}

impl fmt::Debug for TransportDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportDescriptor")
            .field("id", &self.id)
            .field("chunk_byte_size", &self.chunk_byte_size)
            .field("chunk_count", &self.chunk_count)
            .field("data", self.data())
            .finish()
    }
}
