//! Transport boundary for the sensor stream.
//!
//! A real serial backend is an embedder concern; this crate ships a
//! scripted mock for tests and a file-replay transport for development
//! without hardware.

use std::collections::VecDeque;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use headway_core::error::{HeadwayError, Result};

/// Source of raw sensor lines/frames.
///
/// `read_event` resolves to `Ok(Some(bytes))` for one raw line or frame,
/// `Ok(None)` when nothing arrived within the transport's bounded poll
/// interval, and `Err(HeadwayError::Transport)` on link failure. The
/// bounded poll lets the bridge loop service its shutdown flag.
pub trait SensorTransport: Send {
    fn read_event(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;
}

/// One scripted step of the mock transport.
#[derive(Debug, Clone)]
enum ScriptStep {
    Event(Vec<u8>),
    Idle,
    Pause(Duration),
    Disconnect,
}

/// Scripted transport for tests.
///
/// Plays back a fixed sequence of events, idle polls, and failures. An
/// exhausted script reads as a closed stream.
#[derive(Debug, Default)]
pub struct MockSensorTransport {
    script: VecDeque<ScriptStep>,
}

impl MockSensorTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one raw line (newline handling is the caller's concern).
    pub fn line(mut self, line: &str) -> Self {
        self.script.push_back(ScriptStep::Event(line.as_bytes().to_vec()));
        self
    }

    /// Queue one raw binary frame.
    pub fn frame(mut self, frame: &[u8]) -> Self {
        self.script.push_back(ScriptStep::Event(frame.to_vec()));
        self
    }

    /// Queue an empty poll (nothing arrived within the timeout).
    pub fn idle(mut self) -> Self {
        self.script.push_back(ScriptStep::Idle);
        self
    }

    /// Queue an empty poll that takes `duration` of stream time. Lets a
    /// test elapse debounce windows mid-script.
    pub fn pause(mut self, duration: Duration) -> Self {
        self.script.push_back(ScriptStep::Pause(duration));
        self
    }

    /// Queue a link failure.
    pub fn disconnect(mut self) -> Self {
        self.script.push_back(ScriptStep::Disconnect);
        self
    }
}

impl SensorTransport for MockSensorTransport {
    async fn read_event(&mut self) -> Result<Option<Vec<u8>>> {
        match self.script.pop_front() {
            Some(ScriptStep::Event(bytes)) => Ok(Some(bytes)),
            Some(ScriptStep::Idle) => Ok(None),
            Some(ScriptStep::Pause(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(None)
            }
            Some(ScriptStep::Disconnect) => {
                Err(HeadwayError::Transport("mock link failure".into()))
            }
            None => Err(HeadwayError::Transport("sensor stream closed".into())),
        }
    }
}

/// Replays a text file of sensor lines at a configurable pace.
///
/// Development aid for exercising the full bridge without a device:
/// each non-empty line of the file becomes one sensor event.
#[derive(Debug)]
pub struct ReplayTransport {
    lines: VecDeque<String>,
    pace: Duration,
}

impl ReplayTransport {
    pub fn from_file(path: &Path, pace: Duration) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let lines: VecDeque<String> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        tracing::info!(
            path = %path.display(),
            lines = lines.len(),
            "Replay transport loaded"
        );
        Ok(Self { lines, pace })
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl SensorTransport for ReplayTransport {
    async fn read_event(&mut self) -> Result<Option<Vec<u8>>> {
        match self.lines.pop_front() {
            Some(line) => {
                tokio::time::sleep(self.pace).await;
                Ok(Some(line.into_bytes()))
            }
            None => {
                tracing::info!("Replay exhausted");
                Err(HeadwayError::Transport("replay exhausted".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_mock_transport_plays_script_in_order() {
        let mut transport = MockSensorTransport::new()
            .line("CLK")
            .idle()
            .line("5,5")
            .disconnect();

        assert_eq!(transport.read_event().await.unwrap(), Some(b"CLK".to_vec()));
        assert_eq!(transport.read_event().await.unwrap(), None);
        assert_eq!(transport.read_event().await.unwrap(), Some(b"5,5".to_vec()));
        assert!(transport.read_event().await.is_err());
    }

    #[tokio::test]
    async fn test_mock_transport_exhausted_script_is_closed_stream() {
        let mut transport = MockSensorTransport::new().line("CLK");
        transport.read_event().await.unwrap();
        let err = transport.read_event().await.unwrap_err();
        assert!(matches!(err, HeadwayError::Transport(_)));
    }

    #[tokio::test]
    async fn test_mock_transport_pause_reads_as_idle() {
        let mut transport = MockSensorTransport::new()
            .pause(Duration::from_millis(0))
            .line("CLK");

        assert_eq!(transport.read_event().await.unwrap(), None);
        assert_eq!(transport.read_event().await.unwrap(), Some(b"CLK".to_vec()));
    }

    #[tokio::test]
    async fn test_mock_transport_binary_frame() {
        let mut transport = MockSensorTransport::new().frame(&[1, 0, 2, 0, 0]);
        assert_eq!(
            transport.read_event().await.unwrap(),
            Some(vec![1, 0, 2, 0, 0])
        );
    }

    #[tokio::test]
    async fn test_replay_transport_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "CLK").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  5,5  ").unwrap();
        file.flush().unwrap();

        let mut transport = ReplayTransport::from_file(file.path(), Duration::ZERO).unwrap();
        assert_eq!(transport.remaining(), 2);

        assert_eq!(transport.read_event().await.unwrap(), Some(b"CLK".to_vec()));
        assert_eq!(transport.read_event().await.unwrap(), Some(b"5,5".to_vec()));
        assert!(transport.read_event().await.is_err());
    }

    #[test]
    fn test_replay_transport_missing_file() {
        let result = ReplayTransport::from_file(Path::new("/nonexistent/replay.txt"), Duration::ZERO);
        assert!(result.is_err());
    }
}
