use serde::{Deserialize, Serialize};

use super::state::WorkerState;

/// Scheduling hint for the capture worker thread.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadPriority {
    #[default]
    Normal,
    Audio,
    Urgent,
}

impl ThreadPriority {
    pub fn is_elevated(&self) -> bool {
        !matches!(self, Self::Normal)
    }
}

/// Sample encoding of the captured stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioFormat {
    Pcm16,
    Pcm8_24,
    Pcm24Packed,
    Pcm32,
    PcmFloat,
    Other(u32),
}

impl AudioFormat {
    /// Bytes per sample, when the encoding has a fixed width.
    pub fn bytes_per_sample(&self) -> Option<usize> {
        match self {
            Self::Pcm16 => Some(2),
            Self::Pcm24Packed => Some(3),
            Self::Pcm8_24 | Self::Pcm32 | Self::PcmFloat => Some(4),
            Self::Other(_) => None,
        }
    }
}

/// Channel layout bitmask as understood by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelMask(pub u32);

impl ChannelMask {
    pub const MONO: Self = Self(0x10);
    pub const STEREO: Self = Self(0x0C);

    pub fn channel_count(&self) -> u32 {
        self.0.count_ones()
    }
}

/// Stream configuration as one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioProperties {
    pub sample_rate: u32,
    pub channel_mask: ChannelMask,
    pub format: AudioFormat,
}

/// Device the stream is routed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceAddress {
    pub device: u32,
    pub address: String,
}

/// What the device is capturing for, as reported by its `input_source` parameter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputSource {
    #[default]
    Default,
    Mic,
    VoiceUplink,
    VoiceDownlink,
    VoiceCall,
    Camcorder,
    VoiceRecognition,
    VoiceCommunication,
    RemoteSubmix,
    Unprocessed,
    Other(i32),
}

impl InputSource {
    pub const PARAMETER_KEY: &'static str = "input_source";

    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Default,
            1 => Self::Mic,
            2 => Self::VoiceUplink,
            3 => Self::VoiceDownlink,
            4 => Self::VoiceCall,
            5 => Self::Camcorder,
            6 => Self::VoiceRecognition,
            7 => Self::VoiceCommunication,
            8 => Self::RemoteSubmix,
            9 => Self::Unprocessed,
            other => Self::Other(other),
        }
    }
}

/// Frames captured so far and the monotonic time they were observed at.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturePosition {
    pub frames: u64,
    pub time_ns: u64,
}

/// Key/value pair for generic device parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterValue {
    pub key: String,
    pub value: String,
}

impl ParameterValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Snapshot of capture worker counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureDiagnostics {
    pub worker_state: Option<WorkerState>,
    pub iterations: u64,
    pub idle_waits: u64,
    pub reads_ok: u64,
    pub read_errors: u64,
    pub bytes_read: u64,
    pub bytes_published: u64,
    pub short_writes: u64,
    pub bytes_dropped: u64,
    pub status_published: u64,
    pub status_drops: u64,
}

impl Default for CaptureDiagnostics {
    fn default() -> Self {
        Self {
            worker_state: None,
            iterations: 0,
            idle_waits: 0,
            reads_ok: 0,
            read_errors: 0,
            bytes_read: 0,
            bytes_published: 0,
            short_writes: 0,
            bytes_dropped: 0,
            status_published: 0,
            status_drops: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_source_parses_known_and_unknown_values() {
        assert_eq!(InputSource::from_raw(1), InputSource::Mic);
        assert_eq!(InputSource::from_raw(9), InputSource::Unprocessed);
        assert_eq!(InputSource::from_raw(1999), InputSource::Other(1999));
    }

    #[test]
    fn channel_mask_counts_channels() {
        assert_eq!(ChannelMask::MONO.channel_count(), 1);
        assert_eq!(ChannelMask::STEREO.channel_count(), 2);
    }

    #[test]
    fn fixed_width_formats_report_sample_size() {
        assert_eq!(AudioFormat::Pcm16.bytes_per_sample(), Some(2));
        assert_eq!(AudioFormat::Pcm24Packed.bytes_per_sample(), Some(3));
        assert_eq!(AudioFormat::PcmFloat.bytes_per_sample(), Some(4));
        assert_eq!(AudioFormat::Other(0x1234).bytes_per_sample(), None);
    }

    #[test]
    fn priority_serializes_lowercase() {
        let json = serde_json::to_string(&ThreadPriority::Urgent).unwrap();
        assert_eq!(json, "\"urgent\"");
        assert!(!ThreadPriority::Normal.is_elevated());
    }
}
