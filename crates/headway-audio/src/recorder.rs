//! Silence-gated audio recorder.
//!
//! Pulls fixed-duration chunks from a microphone stream and stops once a
//! contiguous run of below-threshold chunks reaches the configured
//! timeout. Run length is measured in stream time (accumulated chunk
//! duration), which equals wall time for a paced device and keeps the
//! timeout deterministic under test.

use std::time::Duration;

use headway_core::error::Result;
use headway_core::types::Waveform;

use crate::MicrophoneStream;

/// Recorder configuration.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
    /// Duration of one captured chunk in milliseconds.
    pub chunk_ms: u64,
    /// RMS energy (16-bit sample scale) below which a chunk is silence.
    pub silence_threshold: f64,
    /// Contiguous silence that terminates capture.
    pub silence_timeout: Duration,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            chunk_ms: 500,
            silence_threshold: 300.0,
            silence_timeout: Duration::from_secs(6),
        }
    }
}

impl RecorderConfig {
    /// Samples per captured chunk.
    pub fn chunk_samples(&self) -> usize {
        (self.sample_rate as u64 * self.chunk_ms / 1000) as usize
    }
}

/// Root-mean-square energy of a chunk. Samples are promoted to `f64`
/// before squaring, so full-scale 16-bit input cannot overflow.
pub fn rms(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples
        .iter()
        .map(|&s| {
            let v = s as f64;
            v * v
        })
        .sum();
    (sum_sq / samples.len() as f64).sqrt()
}

/// Record from `stream` until the silence timeout elapses.
///
/// Every chunk joins the waveform before its silence check, so the
/// trailing silence is part of the result (downstream transcription may
/// trim it). An all-silent capture returns just the silent lead-in; there
/// is no minimum speech length. A stream error aborts the capture with no
/// partial retry - the caller decides whether to retry the whole session.
pub fn capture_until_silence(
    stream: &mut dyn MicrophoneStream,
    config: &RecorderConfig,
) -> Result<Waveform> {
    let chunk_samples = config.chunk_samples();
    let timeout_ms = config.silence_timeout.as_millis() as u64;
    let mut samples: Vec<i16> = Vec::new();
    let mut silence_run_ms: u64 = 0;

    tracing::info!(
        sample_rate = config.sample_rate,
        chunk_ms = config.chunk_ms,
        "Recording until silence"
    );

    loop {
        let chunk = stream.read_chunk(chunk_samples)?;
        let energy = rms(&chunk);
        samples.extend_from_slice(&chunk);

        if energy < config.silence_threshold {
            silence_run_ms += config.chunk_ms;
            if silence_run_ms >= timeout_ms {
                break;
            }
        } else {
            // Speech resets the countdown: only a contiguous run counts.
            silence_run_ms = 0;
        }
    }

    let waveform = Waveform {
        samples,
        sample_rate: config.sample_rate,
    };
    tracing::info!(
        duration_secs = waveform.duration_secs(),
        "Capture stopped on silence timeout"
    );
    Ok(waveform)
}
