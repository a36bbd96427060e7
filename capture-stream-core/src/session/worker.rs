//! Dedicated capture thread moving chunks from the audio source into the transport.
//!
//! The loop never hands control back to a scheduler between iterations:
//! once started it owns its thread until the stop flag is raised. The only
//! suspension point is the bounded signal wait, which is also where a stop
//! request is noticed.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::models::audio_models::{CaptureDiagnostics, ThreadPriority};
use crate::models::error::StreamError;
use crate::models::outcome::ReadOutcome;
use crate::models::state::WorkerState;
use crate::traits::audio_source::AudioSource;
use crate::traits::priority::PriorityRequester;
use crate::transport::message_queue::Producer;
use crate::transport::signal_group::{SignalGroup, SignalMask};

const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(2);

#[derive(Debug, Default)]
struct WorkerStats {
    iterations: AtomicU64,
    idle_waits: AtomicU64,
    reads_ok: AtomicU64,
    read_errors: AtomicU64,
    bytes_read: AtomicU64,
    bytes_published: AtomicU64,
    short_writes: AtomicU64,
    bytes_dropped: AtomicU64,
    status_published: AtomicU64,
    status_drops: AtomicU64,
}

impl WorkerStats {
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    fn snapshot(&self, state: WorkerState) -> CaptureDiagnostics {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CaptureDiagnostics {
            worker_state: Some(state),
            iterations: load(&self.iterations),
            idle_waits: load(&self.idle_waits),
            reads_ok: load(&self.reads_ok),
            read_errors: load(&self.read_errors),
            bytes_read: load(&self.bytes_read),
            bytes_published: load(&self.bytes_published),
            short_writes: load(&self.short_writes),
            bytes_dropped: load(&self.bytes_dropped),
            status_published: load(&self.status_published),
            status_drops: load(&self.status_drops),
        }
    }
}

/// State shared between the controlling session and the worker thread.
#[derive(Debug)]
struct WorkerControl {
    stop: AtomicBool,
    state: AtomicU8,
    stats: WorkerStats,
}

impl WorkerControl {
    fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
            state: AtomicU8::new(WorkerState::Created as u8),
            stats: WorkerStats::default(),
        }
    }

    fn state(&self) -> WorkerState {
        WorkerState::from_raw(self.state.load(Ordering::Acquire))
    }

    fn advance(&self, from: WorkerState, to: WorkerState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Everything the capture loop takes from its session. The loop owns the
/// only write ends of both queues.
pub(crate) struct WorkerContext<S: AudioSource> {
    pub source: Arc<S>,
    pub data: Producer<u8>,
    pub status: Producer<ReadOutcome>,
    pub signals: Arc<SignalGroup>,
    pub priority: ThreadPriority,
    pub requester: Arc<dyn PriorityRequester>,
    pub wait_timeout: Duration,
}

/// Handle to a launched capture thread, owned by the session.
pub(crate) struct CaptureWorker {
    control: Arc<WorkerControl>,
    thread: Option<thread::JoinHandle<()>>,
}

impl CaptureWorker {
    pub fn launch<S: AudioSource>(ctx: WorkerContext<S>) -> Result<Self, StreamError> {
        let control = Arc::new(WorkerControl::new());
        let loop_control = Arc::clone(&control);

        let handle = thread::Builder::new()
            .name("capture-reader".into())
            .spawn(move || ReadLoop::new(ctx, loop_control).run())
            .map_err(|e| {
                StreamError::InvalidArguments(format!("failed to spawn capture thread: {}", e))
            })?;

        Ok(Self {
            control,
            thread: Some(handle),
        })
    }

    pub fn state(&self) -> WorkerState {
        self.control.state()
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.control.stats.snapshot(self.state())
    }

    /// Raise the stop flag. The loop notices it within one wait timeout.
    pub fn request_stop(&self) {
        self.control.stop.store(true, Ordering::Release);
        if !self.control.advance(WorkerState::Running, WorkerState::Stopping) {
            self.control.advance(WorkerState::Created, WorkerState::Stopping);
        }
    }

    /// Wait up to `timeout` for the thread to exit, then join it.
    ///
    /// Returns `false` if the thread did not exit in time; it is then
    /// detached and left to finish on its own.
    pub fn join(&mut self, timeout: Duration) -> bool {
        let Some(handle) = self.thread.take() else {
            return true;
        };

        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                log::error!(
                    "capture thread did not exit within {:?} (state: {})",
                    timeout,
                    self.state()
                );
                return false;
            }
            thread::sleep(JOIN_POLL_INTERVAL);
        }

        if handle.join().is_err() {
            log::error!("capture thread panicked");
            self.control
                .state
                .store(WorkerState::Exited as u8, Ordering::Release);
        }
        true
    }
}

struct ReadLoop<S: AudioSource> {
    ctx: WorkerContext<S>,
    control: Arc<WorkerControl>,
    buffer: Vec<u8>,
}

impl<S: AudioSource> ReadLoop<S> {
    fn new(ctx: WorkerContext<S>, control: Arc<WorkerControl>) -> Self {
        let buffer = vec![0u8; ctx.data.capacity()];
        Self {
            ctx,
            control,
            buffer,
        }
    }

    fn run(mut self) {
        if self.ctx.priority.is_elevated() {
            if let Err(e) = self.ctx.requester.request(self.ctx.priority) {
                log::warn!(
                    "failed to set capture thread priority {:?}: {}",
                    self.ctx.priority,
                    e
                );
            }
        }
        self.control.advance(WorkerState::Created, WorkerState::Running);
        log::debug!("capture thread running");

        while !self.control.stop.load(Ordering::Acquire) {
            let observed = self
                .ctx
                .signals
                .wait(SignalMask::NOT_FULL, self.ctx.wait_timeout);
            if !observed.contains(SignalMask::NOT_FULL) {
                WorkerStats::bump(&self.control.stats.idle_waits, 1);
                continue;
            }
            self.iterate();
        }

        self.control
            .state
            .store(WorkerState::Exited as u8, Ordering::Release);
        log::debug!("capture thread exited");
    }

    /// One read attempt: exactly one status record and one data-available signal.
    fn iterate(&mut self) {
        let stats = &self.control.stats;
        WorkerStats::bump(&stats.iterations, 1);

        let available = self.ctx.data.available_to_write();
        let outcome = match self.ctx.source.read(&mut self.buffer[..available]) {
            Ok(read) => {
                let written = self.ctx.data.write(&self.buffer[..read.min(available)]);
                if written < read {
                    log::warn!(
                        "data queue write short: {} of {} bytes ({} free)",
                        written,
                        read,
                        available
                    );
                    WorkerStats::bump(&stats.short_writes, 1);
                    WorkerStats::bump(&stats.bytes_dropped, (read - written) as u64);
                }
                WorkerStats::bump(&stats.reads_ok, 1);
                WorkerStats::bump(&stats.bytes_read, read as u64);
                WorkerStats::bump(&stats.bytes_published, written as u64);
                ReadOutcome::ok(read as u64)
            }
            Err(status) => {
                WorkerStats::bump(&stats.read_errors, 1);
                ReadOutcome::failed(status.into_error("read").code())
            }
        };

        if self.ctx.status.write_one(outcome) {
            WorkerStats::bump(&stats.status_published, 1);
        } else {
            log::warn!("status queue write failed, dropping {:?}", outcome);
            WorkerStats::bump(&stats.status_drops, 1);
        }

        self.ctx.signals.wake(SignalMask::NOT_EMPTY);
    }
}
