use crate::models::audio_models::{
    AudioFormat, AudioProperties, CapturePosition, ChannelMask, DeviceAddress,
};
use crate::models::status::NativeStatus;

/// Capability interface for the device-side input stream.
///
/// Calls are synchronous and may block. `read` is invoked only from the
/// capture worker thread while the accessors are invoked from control
/// threads, so implementations must be internally synchronized.
///
/// Optional capabilities default to `NOT_IMPLEMENTED`, which the session
/// reports as `NotSupported`.
pub trait AudioSource: Send + Sync + 'static {
    /// Read up to `buf.len()` bytes of captured audio.
    ///
    /// Returns the number of bytes the device transferred. A count larger
    /// than `buf.len()` is treated as device truth for status reporting, but
    /// only `buf.len()` bytes are ever published.
    fn read(&self, buf: &mut [u8]) -> Result<usize, NativeStatus>;

    /// Frames dropped by the device since the previous call.
    fn input_frames_lost(&self) -> u32;

    fn capture_position(&self) -> Result<CapturePosition, NativeStatus> {
        Err(NativeStatus::NOT_IMPLEMENTED)
    }

    fn set_gain(&self, gain: f32) -> Result<(), NativeStatus>;

    fn parameter(&self, key: &str) -> Result<String, NativeStatus>;

    fn set_parameter(&self, key: &str, value: &str) -> Result<(), NativeStatus>;

    fn sample_rate(&self) -> u32;

    fn set_sample_rate(&self, _sample_rate: u32) -> Result<(), NativeStatus> {
        Err(NativeStatus::NOT_IMPLEMENTED)
    }

    fn supported_sample_rates(&self) -> Vec<u32> {
        vec![self.sample_rate()]
    }

    fn channel_mask(&self) -> ChannelMask;

    fn set_channel_mask(&self, _mask: ChannelMask) -> Result<(), NativeStatus> {
        Err(NativeStatus::NOT_IMPLEMENTED)
    }

    fn supported_channel_masks(&self) -> Result<Vec<ChannelMask>, NativeStatus> {
        Err(NativeStatus::NOT_IMPLEMENTED)
    }

    fn format(&self) -> AudioFormat;

    fn set_format(&self, _format: AudioFormat) -> Result<(), NativeStatus> {
        Err(NativeStatus::NOT_IMPLEMENTED)
    }

    fn supported_formats(&self) -> Result<Vec<AudioFormat>, NativeStatus> {
        Err(NativeStatus::NOT_IMPLEMENTED)
    }

    /// Current sample rate, channel mask and format.
    fn audio_properties(&self) -> Result<AudioProperties, NativeStatus> {
        Ok(AudioProperties {
            sample_rate: self.sample_rate(),
            channel_mask: self.channel_mask(),
            format: self.format(),
        })
    }

    /// Size of one frame (all channels of one sample) in bytes.
    ///
    /// Derived from the format and channel mask unless the source knows
    /// better; encodings without a fixed sample width count as one byte.
    fn frame_size(&self) -> usize {
        let sample = self.format().bytes_per_sample().unwrap_or(1);
        sample * self.channel_mask().channel_count().max(1) as usize
    }

    /// Device buffer size in bytes.
    fn buffer_size(&self) -> usize;

    fn device(&self) -> DeviceAddress;

    fn set_device(&self, _address: &DeviceAddress) -> Result<(), NativeStatus> {
        Err(NativeStatus::NOT_IMPLEMENTED)
    }

    /// Notification that a device at `address` came or went.
    fn set_connected_state(
        &self,
        _address: &DeviceAddress,
        _connected: bool,
    ) -> Result<(), NativeStatus> {
        Err(NativeStatus::NOT_IMPLEMENTED)
    }

    fn standby(&self) -> Result<(), NativeStatus>;

    /// Start the device in mmap mode.
    fn start(&self) -> Result<(), NativeStatus> {
        Err(NativeStatus::NOT_IMPLEMENTED)
    }

    /// Stop the device in mmap mode.
    fn stop(&self) -> Result<(), NativeStatus> {
        Err(NativeStatus::NOT_IMPLEMENTED)
    }

    /// Release the device. Called exactly once, after the worker has stopped.
    fn close(&self);
}
