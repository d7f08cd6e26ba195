//! Real microphone backend via cpal.
//!
//! The cpal stream is not `Send`, so each opened stream runs on its own
//! thread: the audio callback downmixes to mono, resamples the device
//! rate to the requested rate, converts to i16, and pushes into a shared
//! buffer that `read_chunk` drains. Stream errors surface on the next
//! read.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;

use headway_core::error::{HeadwayError, Result};

use crate::{MicrophoneSource, MicrophoneStream};

/// Interval at which `read_chunk` polls the shared buffer.
const READ_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Cross-platform microphone source backed by the default cpal input
/// device.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalMicrophone;

impl CpalMicrophone {
    pub fn new() -> Self {
        Self
    }
}

impl MicrophoneSource for CpalMicrophone {
    fn open(&self, sample_rate: u32) -> Result<Box<dyn MicrophoneStream>> {
        let stream = CpalStream::open(sample_rate)?;
        Ok(Box::new(stream))
    }
}

#[derive(Default)]
struct SharedBuffer {
    samples: Mutex<VecDeque<i16>>,
    error: Mutex<Option<String>>,
}

impl SharedBuffer {
    fn push(&self, samples: &[i16]) {
        self.samples
            .lock()
            .expect("audio buffer mutex poisoned")
            .extend(samples.iter().copied());
    }

    fn set_error(&self, message: String) {
        let mut error = self.error.lock().expect("audio error mutex poisoned");
        if error.is_none() {
            *error = Some(message);
        }
    }

    fn take_error(&self) -> Option<String> {
        self.error.lock().expect("audio error mutex poisoned").take()
    }
}

/// One open cpal input stream.
struct CpalStream {
    shared: Arc<SharedBuffer>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CpalStream {
    fn open(target_rate: u32) -> Result<Self> {
        let shared = Arc::new(SharedBuffer::default());
        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<()>>();

        let thread_shared = Arc::clone(&shared);
        let thread_stop = Arc::clone(&stop);
        let thread = std::thread::spawn(move || {
            run_input_stream(target_rate, thread_shared, thread_stop, ready_tx);
        });

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                shared,
                stop,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(HeadwayError::Audio("audio thread exited early".into()))
            }
        }
    }
}

impl MicrophoneStream for CpalStream {
    fn read_chunk(&mut self, samples: usize) -> Result<Vec<i16>> {
        loop {
            if let Some(message) = self.shared.take_error() {
                return Err(HeadwayError::Audio(message));
            }

            {
                let mut buffer = self
                    .shared
                    .samples
                    .lock()
                    .expect("audio buffer mutex poisoned");
                if buffer.len() >= samples {
                    return Ok(buffer.drain(..samples).collect());
                }
            }

            std::thread::sleep(READ_POLL_INTERVAL);
        }
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Build and run the cpal input stream until the stop flag is set.
/// Owns the `cpal::Stream` for its whole lifetime (the stream is !Send).
fn run_input_stream(
    target_rate: u32,
    shared: Arc<SharedBuffer>,
    stop: Arc<AtomicBool>,
    ready_tx: std::sync::mpsc::Sender<Result<()>>,
) {
    let host = cpal::default_host();
    let device = match host.default_input_device() {
        Some(d) => d,
        None => {
            let _ = ready_tx.send(Err(HeadwayError::Audio("no input device available".into())));
            return;
        }
    };

    let config = match device.default_input_config() {
        Ok(c) => c,
        Err(e) => {
            let _ = ready_tx.send(Err(HeadwayError::Audio(format!(
                "failed to get default input config: {e}"
            ))));
            return;
        }
    };

    let device_rate = config.sample_rate().0;
    let channels = config.channels() as usize;
    tracing::info!(
        device = device.name().unwrap_or_else(|_| "unknown".into()),
        device_rate,
        channels,
        target_rate,
        "Opening microphone stream"
    );

    let err_shared = Arc::clone(&shared);
    let err_cb = move |e: cpal::StreamError| {
        err_shared.set_error(format!("microphone stream failed: {e}"));
    };

    let stream = match config.sample_format() {
        SampleFormat::F32 => {
            let data_shared = Arc::clone(&shared);
            device.build_input_stream(
                &config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    push_frames(&data_shared, data, channels, device_rate, target_rate);
                },
                err_cb,
                None,
            )
        }
        SampleFormat::I16 => {
            let data_shared = Arc::clone(&shared);
            device.build_input_stream(
                &config.into(),
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let floats: Vec<f32> =
                        data.iter().map(|&s| s as f32 / 32_768.0).collect();
                    push_frames(&data_shared, &floats, channels, device_rate, target_rate);
                },
                err_cb,
                None,
            )
        }
        other => {
            let _ = ready_tx.send(Err(HeadwayError::Audio(format!(
                "unsupported input sample format: {other}"
            ))));
            return;
        }
    };

    let stream = match stream {
        Ok(s) => s,
        Err(e) => {
            let _ = ready_tx.send(Err(HeadwayError::Audio(format!(
                "failed to build input stream: {e}"
            ))));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(HeadwayError::Audio(format!(
            "failed to start input stream: {e}"
        ))));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    while !stop.load(Ordering::Relaxed) {
        std::thread::sleep(READ_POLL_INTERVAL);
    }
    drop(stream);
    tracing::debug!("Microphone stream closed");
}

/// Downmix interleaved frames to mono, resample to the target rate, and
/// push i16 samples into the shared buffer.
fn push_frames(
    shared: &SharedBuffer,
    data: &[f32],
    channels: usize,
    from_rate: u32,
    to_rate: u32,
) {
    let mono: Vec<f32> = data
        .chunks(channels.max(1))
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    let resampled = resample(&mono, from_rate, to_rate);
    let converted: Vec<i16> = resampled
        .iter()
        .map(|&s| (s * 32_767.0).clamp(-32_768.0, 32_767.0) as i16)
        .collect();
    shared.push(&converted);
}

/// Simple linear resampling from one sample rate to another. Sufficient
/// for speech input; a polyphase resampler would be overkill here.
fn resample(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || input.is_empty() {
        return input.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (input.len() as f64 / ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_idx = i as f64 * ratio;
        let idx0 = src_idx.floor() as usize;
        let idx1 = (idx0 + 1).min(input.len() - 1);
        let frac = (src_idx - idx0 as f64) as f32;

        let sample = input[idx0] * (1.0 - frac) + input[idx1] * frac;
        output.push(sample);
    }

    output
}
