use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::audio_models::{
    AudioFormat, AudioProperties, CaptureDiagnostics, CapturePosition, ChannelMask,
    DeviceAddress, InputSource, ParameterValue, ThreadPriority,
};
use crate::models::config::SessionConfig;
use crate::models::error::StreamError;
use crate::models::state::{SessionState, WorkerState};
use crate::session::worker::{CaptureWorker, WorkerContext};
use crate::traits::audio_source::AudioSource;
use crate::traits::priority::{NoopPriorityRequester, PriorityRequester};
use crate::transport::descriptor::TransportDescriptor;
use crate::transport::message_queue::{DataQueue, StatusQueue};
use crate::transport::signal_group::SignalGroup;

/// Signal group and worker, created and destroyed together. The queues are
/// split between the worker (write ends) and the consumer's descriptor
/// (read ends).
struct PreparedTransport {
    id: Uuid,
    signals: Arc<SignalGroup>,
    worker: CaptureWorker,
}

struct SessionInner {
    state: SessionState,
    transport: Option<PreparedTransport>,
    final_diagnostics: Option<CaptureDiagnostics>,
}

/// Input stream session orchestrator.
///
/// Owns the audio source for its whole lifetime and, once prepared, exactly
/// one transport + signal group + capture worker triple. The consumer drains
/// the transport directly through the [`TransportDescriptor`] returned by
/// [`setup`](Self::setup); the session is never on the data path.
///
/// ```text
/// [AudioSource] → [capture worker] → [DataQueue + StatusQueue] → consumer
///                        ↑ NOT_FULL        NOT_EMPTY ↓
///                        └──────── [SignalGroup] ────┘
/// ```
///
/// Control calls are meant to be serialized by the caller. `close` is
/// guarded so that at most one teardown ever runs.
pub struct CaptureSession<S: AudioSource> {
    config: SessionConfig,
    requester: Arc<dyn PriorityRequester>,
    source: Mutex<Option<Arc<S>>>,
    inner: Mutex<SessionInner>,
    closed: AtomicBool,
}

impl<S: AudioSource> CaptureSession<S> {
    pub fn new(source: S, config: SessionConfig) -> Result<Self, StreamError> {
        config.validate().map_err(StreamError::InvalidArguments)?;
        Ok(Self {
            config,
            requester: Arc::new(NoopPriorityRequester),
            source: Mutex::new(Some(Arc::new(source))),
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                transport: None,
                final_diagnostics: None,
            }),
            closed: AtomicBool::new(false),
        })
    }

    /// Replace the requester used to elevate the capture thread.
    pub fn set_priority_requester(&mut self, requester: Arc<dyn PriorityRequester>) {
        self.requester = requester;
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Prepared {
            let running = inner
                .transport
                .as_ref()
                .is_some_and(|t| t.worker.state() == WorkerState::Running);
            if running {
                log::debug!("capture session running");
                inner.state = SessionState::Running;
            }
        }
        inner.state
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Worker counters; after close, the counters at the time the worker stopped.
    pub fn diagnostics(&self) -> CaptureDiagnostics {
        let inner = self.inner.lock();
        match (&inner.transport, &inner.final_diagnostics) {
            (Some(transport), _) => transport.worker.diagnostics(),
            (None, Some(last)) => last.clone(),
            (None, None) => CaptureDiagnostics::default(),
        }
    }

    /// Allocate the transport and launch the capture worker.
    ///
    /// The data queue holds `chunk_byte_size × chunk_count` bytes and the
    /// status queue holds a single record. Any failure tears down whatever
    /// was already built before returning.
    pub fn setup(
        &self,
        chunk_byte_size: u32,
        chunk_count: u32,
        priority: ThreadPriority,
    ) -> Result<TransportDescriptor, StreamError> {
        let source = self.source()?;
        let mut inner = self.inner.lock();
        if inner.state.has_transport() {
            log::error!("setup called twice on the same session");
            return Err(StreamError::already_prepared());
        }

        let capacity = (chunk_byte_size as usize)
            .checked_mul(chunk_count as usize)
            .filter(|bytes| *bytes > 0)
            .ok_or_else(|| {
                StreamError::InvalidArguments(format!(
                    "bad transport size {} x {}",
                    chunk_byte_size, chunk_count
                ))
            })?;
        if capacity > self.config.max_transport_bytes {
            return Err(StreamError::InvalidArguments(format!(
                "transport of {} bytes exceeds limit of {}",
                capacity, self.config.max_transport_bytes
            )));
        }

        let (data_tx, data_rx) = DataQueue::split(capacity).inspect_err(|e| {
            log::error!("data queue is invalid: {}", e);
        })?;
        let (status_tx, status_rx) = StatusQueue::split(1).inspect_err(|e| {
            log::error!("status queue is invalid: {}", e);
        })?;
        let signals = SignalGroup::create(Arc::clone(data_rx.queue())).inspect_err(|e| {
            log::error!("failed creating signal group for data queue: {}", e);
        })?;
        let signals = Arc::new(signals);
        inner.state = SessionState::Prepared;

        let worker = CaptureWorker::launch(WorkerContext {
            source,
            data: data_tx,
            status: status_tx,
            signals: Arc::clone(&signals),
            priority,
            requester: Arc::clone(&self.requester),
            wait_timeout: self.config.wait_timeout(),
        })
        .inspect_err(|e| {
            log::warn!("failed to start capture thread: {}", e);
            inner.state = SessionState::Idle;
        })?;

        let descriptor = TransportDescriptor::new(
            chunk_byte_size as usize,
            chunk_count as usize,
            data_rx,
            status_rx,
            Arc::clone(&signals),
        );
        log::debug!(
            "prepared transport {} ({} x {} bytes, priority {:?})",
            descriptor.id(),
            chunk_count,
            chunk_byte_size,
            priority
        );
        inner.transport = Some(PreparedTransport {
            id: descriptor.id(),
            signals,
            worker,
        });
        Ok(descriptor)
    }

    /// Start the device. A no-op unless the session runs in mmap mode.
    pub fn start(&self) -> Result<(), StreamError> {
        let source = self.source()?;
        if self.config.mmap_mode {
            source.start().map_err(|s| s.into_error("start"))
        } else {
            Ok(())
        }
    }

    /// Stop the device. A no-op unless the session runs in mmap mode.
    pub fn stop(&self) -> Result<(), StreamError> {
        let source = self.source()?;
        if self.config.mmap_mode {
            source.stop().map_err(|s| s.into_error("stop"))
        } else {
            Ok(())
        }
    }

    /// Stop the worker, release the transport and close the device.
    ///
    /// Teardown order: stop flag, bounded join, signal group and queues,
    /// then the audio source. A worker that fails to exit in time is logged
    /// and abandoned; the session still closes.
    pub fn close(&self) -> Result<(), StreamError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(StreamError::closed());
        }

        let mut inner = self.inner.lock();
        if let Some(PreparedTransport {
            id,
            signals,
            mut worker,
        }) = inner.transport.take()
        {
            worker.request_stop();
            if !worker.join(self.config.join_timeout()) {
                log::error!("capture thread exit error: still {}", worker.state());
            }
            inner.final_diagnostics = Some(worker.diagnostics());

            let outstanding = Arc::strong_count(&signals) - 1;
            drop(signals);
            log::debug!(
                "released transport {} ({} other handles outstanding)",
                id,
                outstanding
            );
        }
        inner.state = SessionState::Closed;
        drop(inner);

        if let Some(source) = self.source.lock().take() {
            source.close();
        }
        log::debug!("capture session closed");
        Ok(())
    }

    pub(crate) fn source(&self) -> Result<Arc<S>, StreamError> {
        self.source.lock().clone().ok_or_else(StreamError::closed)
    }

    // --- Pass-through accessors ---

    pub fn frame_size(&self) -> Result<usize, StreamError> {
        Ok(self.source()?.frame_size())
    }

    pub fn frame_count(&self) -> Result<usize, StreamError> {
        let source = self.source()?;
        Ok(source.buffer_size() / source.frame_size().max(1))
    }

    pub fn buffer_size(&self) -> Result<usize, StreamError> {
        Ok(self.source()?.buffer_size())
    }

    pub fn sample_rate(&self) -> Result<u32, StreamError> {
        Ok(self.source()?.sample_rate())
    }

    pub fn supported_sample_rates(&self) -> Result<Vec<u32>, StreamError> {
        Ok(self.source()?.supported_sample_rates())
    }

    pub fn set_sample_rate(&self, sample_rate: u32) -> Result<(), StreamError> {
        self.source()?
            .set_sample_rate(sample_rate)
            .map_err(|s| s.into_error("set_sample_rate"))
    }

    pub fn channel_mask(&self) -> Result<ChannelMask, StreamError> {
        Ok(self.source()?.channel_mask())
    }

    pub fn set_channel_mask(&self, mask: ChannelMask) -> Result<(), StreamError> {
        self.source()?
            .set_channel_mask(mask)
            .map_err(|s| s.into_error("set_channel_mask"))
    }

    pub fn supported_channel_masks(&self) -> Result<Vec<ChannelMask>, StreamError> {
        self.source()?
            .supported_channel_masks()
            .map_err(|s| s.into_error("get_supported_channel_masks"))
    }

    pub fn format(&self) -> Result<AudioFormat, StreamError> {
        Ok(self.source()?.format())
    }

    pub fn supported_formats(&self) -> Result<Vec<AudioFormat>, StreamError> {
        self.source()?
            .supported_formats()
            .map_err(|s| s.into_error("get_supported_formats"))
    }

    /// Sample rate, channel mask and format read together.
    pub fn audio_properties(&self) -> Result<AudioProperties, StreamError> {
        self.source()?
            .audio_properties()
            .map_err(|s| s.into_error("get_audio_properties"))
    }

    pub fn set_format(&self, format: AudioFormat) -> Result<(), StreamError> {
        self.source()?
            .set_format(format)
            .map_err(|s| s.into_error("set_format"))
    }

    pub fn device(&self) -> Result<DeviceAddress, StreamError> {
        Ok(self.source()?.device())
    }

    pub fn set_device(&self, address: &DeviceAddress) -> Result<(), StreamError> {
        self.source()?
            .set_device(address)
            .map_err(|s| s.into_error("set_device"))
    }

    /// Tell the device that `address` was connected or disconnected.
    pub fn set_connected_state(
        &self,
        address: &DeviceAddress,
        connected: bool,
    ) -> Result<(), StreamError> {
        self.source()?
            .set_connected_state(address, connected)
            .map_err(|s| s.into_error("set_connected_state"))
    }

    pub fn standby(&self) -> Result<(), StreamError> {
        self.source()?
            .standby()
            .map_err(|s| s.into_error("standby"))
    }

    pub fn set_gain(&self, gain: f32) -> Result<(), StreamError> {
        self.source()?
            .set_gain(gain)
            .map_err(|s| s.into_error("set_gain"))
    }

    pub fn parameters(&self, keys: &[&str]) -> Result<Vec<ParameterValue>, StreamError> {
        let source = self.source()?;
        keys.iter()
            .map(|key| {
                source
                    .parameter(key)
                    .map(|value| ParameterValue::new(*key, value))
                    .map_err(|s| s.into_error("get_parameters"))
            })
            .collect()
    }

    pub fn set_parameters(&self, parameters: &[ParameterValue]) -> Result<(), StreamError> {
        let source = self.source()?;
        for p in parameters {
            source
                .set_parameter(&p.key, &p.value)
                .map_err(|s| s.into_error("set_parameters"))?;
        }
        Ok(())
    }

    /// Capture use case reported by the device. Callers typically fall
    /// back to `InputSource::default()` on error.
    pub fn input_source(&self) -> Result<InputSource, StreamError> {
        let raw = self
            .source()?
            .parameter(InputSource::PARAMETER_KEY)
            .map_err(|s| s.into_error("get_parameters"))?;
        raw.trim()
            .parse::<i32>()
            .map(InputSource::from_raw)
            .map_err(|e| {
                StreamError::InvalidArguments(format!("bad input source {:?}: {}", raw, e))
            })
    }

    pub fn input_frames_lost(&self) -> Result<u32, StreamError> {
        Ok(self.source()?.input_frames_lost())
    }

    pub fn capture_position(&self) -> Result<CapturePosition, StreamError> {
        self.source()?
            .capture_position()
            .map_err(|s| s.into_error("get_capture_position"))
    }
}

impl<S: AudioSource> Drop for CaptureSession<S> {
    fn drop(&mut self) {
        if !self.is_closed() {
            let _ = self.close();
        }
    }
}
