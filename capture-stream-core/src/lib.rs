//! # capture-stream-core
//!
//! Platform-agnostic input stream core.
//!
//! A dedicated real-time capture thread pulls fixed-size chunks from an
//! [`AudioSource`] and publishes them, with one status record per chunk,
//! into shared-memory queues that an external consumer drains directly.
//! Platform backends supply a [`PriorityRequester`] for the capture thread.
//!
//! ## Architecture
//!
//! ```text
//! capture-stream-core (this crate)
//! ├── traits/       ← AudioSource, PriorityRequester
//! ├── models/       ← StreamError, NativeStatus, ReadOutcome, SessionConfig, states
//! ├── transport/    ← MessageQueue + Producer/Consumer, SignalGroup, TransportDescriptor
//! └── session/      ← CaptureSession (orchestrator), capture worker
//! ```

pub mod models;
pub mod session;
pub mod transport;
pub mod traits;

#[cfg(test)]
mod mock;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{
    AudioFormat, AudioProperties, CaptureDiagnostics, CapturePosition, ChannelMask,
    DeviceAddress, InputSource, ParameterValue, ThreadPriority,
};
pub use models::config::SessionConfig;
pub use models::error::{ResultCode, StreamError};
pub use models::outcome::ReadOutcome;
pub use models::state::{SessionState, WorkerState};
pub use models::status::NativeStatus;
pub use session::capture::CaptureSession;
pub use traits::audio_source::AudioSource;
pub use traits::priority::{NoopPriorityRequester, PriorityError, PriorityRequester};
pub use transport::descriptor::TransportDescriptor;
pub use transport::message_queue::{Consumer, DataQueue, MessageQueue, Producer, StatusQueue};
pub use transport::signal_group::{SignalGroup, SignalMask};
