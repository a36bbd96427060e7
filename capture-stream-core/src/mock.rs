//! Scripted audio source for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::audio_models::{AudioFormat, CapturePosition, ChannelMask, DeviceAddress};
use crate::models::status::NativeStatus;
use crate::traits::audio_source::AudioSource;

/// What a read returns once the script queue is empty.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ReadBehavior {
    /// Report `len` bytes of `byte`, however small the buffer is.
    Constant { byte: u8, len: usize },
    /// Report `len` bytes continuing a running `0, 1, 2, ...` pattern.
    Counting { len: usize },
    /// Block inside the device for `hold`, then report nothing.
    Stall { hold: Duration },
}

struct MockState {
    script: VecDeque<Result<Vec<u8>, NativeStatus>>,
    counter: u8,
    gain: f32,
    sample_rate: u32,
    parameters: HashMap<String, String>,
    position: Option<CapturePosition>,
    frames_lost: u32,
    device: DeviceAddress,
    connection: Option<(DeviceAddress, bool)>,
    mmap_running: bool,
}

pub(crate) struct MockAudioSource {
    behavior: ReadBehavior,
    state: Mutex<MockState>,
    reads: AtomicUsize,
    closes: AtomicUsize,
    closed: AtomicBool,
}

impl MockAudioSource {
    pub fn new(behavior: ReadBehavior) -> Self {
        Self {
            behavior,
            state: Mutex::new(MockState {
                script: VecDeque::new(),
                counter: 0,
                gain: 1.0,
                sample_rate: 48000,
                parameters: HashMap::new(),
                position: None,
                frames_lost: 0,
                device: DeviceAddress {
                    device: 0x8000_0004,
                    address: "bottom".into(),
                },
                connection: None,
                mmap_running: false,
            }),
            reads: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Queue a one-off read result ahead of the default behavior.
    pub fn push_read(&self, result: Result<Vec<u8>, NativeStatus>) {
        self.state.lock().script.push_back(result);
    }

    pub fn set_parameter_value(&self, key: &str, value: &str) {
        self.state
            .lock()
            .parameters
            .insert(key.to_string(), value.to_string());
    }

    pub fn set_position(&self, position: CapturePosition) {
        self.state.lock().position = Some(position);
    }

    pub fn set_frames_lost(&self, frames: u32) {
        self.state.lock().frames_lost = frames;
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn gain(&self) -> f32 {
        self.state.lock().gain
    }

    pub fn mmap_running(&self) -> bool {
        self.state.lock().mmap_running
    }

    pub fn last_connection(&self) -> Option<(DeviceAddress, bool)> {
        self.state.lock().connection.clone()
    }
}

impl AudioSource for MockAudioSource {
    fn read(&self, buf: &mut [u8]) -> Result<usize, NativeStatus> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.closed.load(Ordering::SeqCst) {
            return Err(NativeStatus::NO_DEVICE);
        }

        if let ReadBehavior::Stall { hold } = self.behavior {
            thread::sleep(hold);
            return Ok(0);
        }

        let mut state = self.state.lock();
        if let Some(scripted) = state.script.pop_front() {
            let bytes = scripted?;
            let n = bytes.len().min(buf.len());
            buf[..n].copy_from_slice(&bytes[..n]);
            return Ok(bytes.len());
        }

        match self.behavior {
            ReadBehavior::Constant { byte, len } => {
                let n = len.min(buf.len());
                buf[..n].fill(byte);
                Ok(len)
            }
            ReadBehavior::Counting { len } => {
                let n = len.min(buf.len());
                for slot in &mut buf[..n] {
                    *slot = state.counter;
                    state.counter = state.counter.wrapping_add(1);
                }
                Ok(n)
            }
            ReadBehavior::Stall { .. } => Ok(0),
        }
    }

    fn input_frames_lost(&self) -> u32 {
        std::mem::take(&mut self.state.lock().frames_lost)
    }

    fn capture_position(&self) -> Result<CapturePosition, NativeStatus> {
        self.state
            .lock()
            .position
            .ok_or(NativeStatus::NOT_IMPLEMENTED)
    }

    fn set_gain(&self, gain: f32) -> Result<(), NativeStatus> {
        if !(0.0..=1.0).contains(&gain) {
            return Err(NativeStatus::INVALID_ARGUMENT);
        }
        self.state.lock().gain = gain;
        Ok(())
    }

    fn parameter(&self, key: &str) -> Result<String, NativeStatus> {
        self.state
            .lock()
            .parameters
            .get(key)
            .cloned()
            .ok_or(NativeStatus::INVALID_ARGUMENT)
    }

    fn set_parameter(&self, key: &str, value: &str) -> Result<(), NativeStatus> {
        self.set_parameter_value(key, value);
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.state.lock().sample_rate
    }

    fn set_sample_rate(&self, sample_rate: u32) -> Result<(), NativeStatus> {
        if sample_rate == 0 {
            return Err(NativeStatus::INVALID_ARGUMENT);
        }
        self.state.lock().sample_rate = sample_rate;
        Ok(())
    }

    fn channel_mask(&self) -> ChannelMask {
        ChannelMask::STEREO
    }

    fn supported_channel_masks(&self) -> Result<Vec<ChannelMask>, NativeStatus> {
        Ok(vec![ChannelMask::MONO, ChannelMask::STEREO])
    }

    fn format(&self) -> AudioFormat {
        AudioFormat::Pcm16
    }

    fn buffer_size(&self) -> usize {
        3840
    }

    fn device(&self) -> DeviceAddress {
        self.state.lock().device.clone()
    }

    fn set_device(&self, address: &DeviceAddress) -> Result<(), NativeStatus> {
        self.state.lock().device = address.clone();
        Ok(())
    }

    fn set_connected_state(
        &self,
        address: &DeviceAddress,
        connected: bool,
    ) -> Result<(), NativeStatus> {
        if address.address.is_empty() {
            return Err(NativeStatus::INVALID_ARGUMENT);
        }
        self.state.lock().connection = Some((address.clone(), connected));
        Ok(())
    }

    fn standby(&self) -> Result<(), NativeStatus> {
        Ok(())
    }

    fn start(&self) -> Result<(), NativeStatus> {
        self.state.lock().mmap_running = true;
        Ok(())
    }

    fn stop(&self) -> Result<(), NativeStatus> {
        let mut state = self.state.lock();
        if !state.mmap_running {
            return Err(NativeStatus::NO_DATA);
        }
        state.mmap_running = false;
        Ok(())
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }
}
