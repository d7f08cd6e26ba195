//! Headway audio crate - microphone boundary, silence-gated recorder,
//! WAV encoding.
//!
//! Provides trait-based abstractions for microphone capture plus a mock
//! implementation for testing without real audio hardware. The real
//! backend rides on cpal.

use std::collections::VecDeque;

use headway_core::error::{HeadwayError, Result};

pub mod cpal_mic;
pub mod recorder;
pub mod wav;

pub use cpal_mic::CpalMicrophone;
pub use recorder::{capture_until_silence, rms, RecorderConfig};
pub use wav::encode_wav;

// =============================================================================
// Traits
// =============================================================================

/// One open microphone stream delivering mono 16-bit PCM.
///
/// `read_chunk` is a bounded, low-latency blocking call; implementations
/// never buffer more than the recorder asks for.
pub trait MicrophoneStream: Send {
    /// Read exactly `samples` samples, blocking until they are available
    /// or the device fails.
    fn read_chunk(&mut self, samples: usize) -> Result<Vec<i16>>;
}

/// Per-session stream factory for a microphone device.
pub trait MicrophoneSource: Send + Sync {
    /// Open a fresh stream delivering mono PCM at `sample_rate` Hz.
    fn open(&self, sample_rate: u32) -> Result<Box<dyn MicrophoneStream>>;
}

// =============================================================================
// Mock implementation
// =============================================================================

/// Mock microphone for testing.
///
/// Each opened stream plays a fixed chunk script; once the script runs
/// out the stream either fails (simulating a device disconnect) or
/// produces silence forever.
#[derive(Debug, Clone, Default)]
pub struct MockMicrophone {
    chunks: Vec<Vec<i16>>,
    fail_when_exhausted: bool,
}

impl MockMicrophone {
    /// Streams play `chunks` in order, then silence forever.
    pub fn new(chunks: Vec<Vec<i16>>) -> Self {
        Self {
            chunks,
            fail_when_exhausted: false,
        }
    }

    /// Streams play `chunks` in order, then fail on the next read.
    pub fn with_failure(chunks: Vec<Vec<i16>>) -> Self {
        Self {
            chunks,
            fail_when_exhausted: true,
        }
    }
}

impl MicrophoneSource for MockMicrophone {
    fn open(&self, _sample_rate: u32) -> Result<Box<dyn MicrophoneStream>> {
        Ok(Box::new(MockMicrophoneStream {
            script: self.chunks.clone().into(),
            fail_when_exhausted: self.fail_when_exhausted,
        }))
    }
}

struct MockMicrophoneStream {
    script: VecDeque<Vec<i16>>,
    fail_when_exhausted: bool,
}

impl MicrophoneStream for MockMicrophoneStream {
    fn read_chunk(&mut self, samples: usize) -> Result<Vec<i16>> {
        match self.script.pop_front() {
            Some(mut chunk) => {
                chunk.resize(samples, 0);
                Ok(chunk)
            }
            None if self.fail_when_exhausted => Err(HeadwayError::Audio(
                "mock microphone disconnected".into(),
            )),
            None => Ok(vec![0i16; samples]),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_microphone_plays_script_then_silence() {
        let mic = MockMicrophone::new(vec![vec![100i16; 4], vec![-100i16; 4]]);
        let mut stream = mic.open(16_000).unwrap();

        assert_eq!(stream.read_chunk(4).unwrap(), vec![100i16; 4]);
        assert_eq!(stream.read_chunk(4).unwrap(), vec![-100i16; 4]);
        assert_eq!(stream.read_chunk(4).unwrap(), vec![0i16; 4]);
        assert_eq!(stream.read_chunk(4).unwrap(), vec![0i16; 4]);
    }

    #[test]
    fn test_mock_microphone_failure_after_script() {
        let mic = MockMicrophone::with_failure(vec![vec![5i16; 2]]);
        let mut stream = mic.open(16_000).unwrap();

        assert!(stream.read_chunk(2).is_ok());
        let err = stream.read_chunk(2).unwrap_err();
        assert!(matches!(err, HeadwayError::Audio(_)));
    }

    #[test]
    fn test_mock_microphone_pads_short_chunks() {
        let mic = MockMicrophone::new(vec![vec![7i16, 7]]);
        let mut stream = mic.open(16_000).unwrap();
        assert_eq!(stream.read_chunk(4).unwrap(), vec![7, 7, 0, 0]);
    }

    #[test]
    fn test_mock_microphone_streams_are_independent() {
        let mic = MockMicrophone::new(vec![vec![9i16; 2]]);
        let mut first = mic.open(16_000).unwrap();
        let mut second = mic.open(16_000).unwrap();

        assert_eq!(first.read_chunk(2).unwrap(), vec![9i16; 2]);
        // The second stream replays the same script from the start.
        assert_eq!(second.read_chunk(2).unwrap(), vec![9i16; 2]);
    }
}
