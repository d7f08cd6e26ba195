//! Speech-to-text client.
//!
//! Defines the [`TranscriptionService`] trait plus the hosted HTTP
//! backend and a mock for tests.

use std::future::Future;
use std::sync::Mutex;

use headway_core::error::Result;
use headway_core::settings::Settings;

pub mod http;

pub use http::HttpTranscriptionService;

// ============================================================================
// Trait
// ============================================================================

/// Turns an encoded WAV recording into text.
pub trait TranscriptionService: Send + Sync {
    fn transcribe(&self, wav_bytes: Vec<u8>) -> impl Future<Output = Result<String>> + Send;
}

// ============================================================================
// Configuration
// ============================================================================

/// Connection parameters for the hosted transcription API.
#[derive(Debug, Clone)]
pub struct SttConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub mode: String,
    pub timeout_secs: u64,
}

impl SttConfig {
    /// Build from settings, resolving the API key from the environment
    /// when the settings file leaves it blank.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_url: settings.stt_api_url.clone(),
            api_key: settings.resolve_stt_api_key(),
            model: settings.stt_model.clone(),
            mode: settings.stt_mode.clone(),
            timeout_secs: settings.stt_timeout_secs,
        }
    }
}

// ============================================================================
// Mock service
// ============================================================================

/// Test double that records every request and returns a canned reply.
pub struct MockTranscriptionService {
    reply: std::result::Result<String, String>,
    requests: Mutex<Vec<usize>>,
}

impl MockTranscriptionService {
    pub fn replying(transcript: impl Into<String>) -> Self {
        Self {
            reply: Ok(transcript.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Byte lengths of the WAV payloads received so far.
    pub fn request_sizes(&self) -> Vec<usize> {
        self.requests.lock().expect("mock mutex poisoned").clone()
    }
}

impl TranscriptionService for MockTranscriptionService {
    fn transcribe(&self, wav_bytes: Vec<u8>) -> impl Future<Output = Result<String>> + Send {
        self.requests
            .lock()
            .expect("mock mutex poisoned")
            .push(wav_bytes.len());
        let reply = self.reply.clone();
        async move { reply.map_err(headway_core::error::HeadwayError::Transcription) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_canned_transcript() {
        let service = MockTranscriptionService::replying("hello world");
        let text = service.transcribe(vec![0u8; 44]).await.unwrap();
        assert_eq!(text, "hello world");
        assert_eq!(service.request_sizes(), vec![44]);
    }

    #[tokio::test]
    async fn test_mock_failure_is_transcription_error() {
        let service = MockTranscriptionService::failing("boom");
        let err = service.transcribe(Vec::new()).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_config_from_settings_defaults() {
        let settings = Settings::default();
        let config = SttConfig::from_settings(&settings);
        assert_eq!(config.model, "saaras:v3");
        assert_eq!(config.mode, "transcribe");
        assert_eq!(config.timeout_secs, 30);
    }
}
