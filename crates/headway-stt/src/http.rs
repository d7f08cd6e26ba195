//! HTTP backend for the hosted speech-to-text API.

use std::future::Future;
use std::time::Duration;

use reqwest::multipart::{Form, Part};

use headway_core::error::{HeadwayError, Result};

use crate::{SttConfig, TranscriptionService};

/// Client for the hosted transcription endpoint. Sends the recording as
/// a multipart upload and extracts the transcript from the JSON reply.
pub struct HttpTranscriptionService {
    client: reqwest::Client,
    config: SttConfig,
}

impl HttpTranscriptionService {
    pub fn new(config: SttConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                HeadwayError::Transcription(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { client, config })
    }

    async fn post_recording(&self, wav_bytes: Vec<u8>) -> Result<String> {
        if self.config.api_key.is_empty() {
            return Err(HeadwayError::Transcription(
                "no API key configured".into(),
            ));
        }

        let file = Part::bytes(wav_bytes)
            .file_name("recording.wav")
            .mime_str("audio/wav")
            .map_err(|e| HeadwayError::Transcription(format!("invalid mime type: {e}")))?;

        let form = Form::new()
            .part("file", file)
            .text("model", self.config.model.clone())
            .text("language_code", "unknown")
            .text("mode", self.config.mode.clone());

        let response = self
            .client
            .post(&self.config.api_url)
            .header("api-subscription-key", &self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| HeadwayError::Transcription(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| HeadwayError::Transcription(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(HeadwayError::Transcription(format!(
                "API returned {status}: {body}"
            )));
        }

        parse_transcript(&body)
    }
}

impl TranscriptionService for HttpTranscriptionService {
    fn transcribe(&self, wav_bytes: Vec<u8>) -> impl Future<Output = Result<String>> + Send {
        async move {
            let started = std::time::Instant::now();
            let transcript = self.post_recording(wav_bytes).await?;
            tracing::info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                chars = transcript.len(),
                "Transcription complete"
            );
            Ok(transcript)
        }
    }
}

/// Pull the transcript field out of the API's JSON response.
fn parse_transcript(body: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| HeadwayError::Transcription(format!("malformed API response: {e}")))?;

    match value.get("transcript").and_then(|t| t.as_str()) {
        Some(transcript) => Ok(transcript.trim().to_string()),
        None => Err(HeadwayError::Transcription(format!(
            "response missing transcript field: {body}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transcript_trims_whitespace() {
        let body = r#"{"transcript": "  hello there  "}"#;
        assert_eq!(parse_transcript(body).unwrap(), "hello there");
    }

    #[test]
    fn test_parse_transcript_missing_field() {
        let err = parse_transcript(r#"{"text": "nope"}"#).unwrap_err();
        assert!(err.to_string().contains("missing transcript"));
    }

    #[test]
    fn test_parse_transcript_rejects_invalid_json() {
        assert!(parse_transcript("not json").is_err());
    }

    #[test]
    fn test_empty_api_key_fails_fast() {
        let config = SttConfig {
            api_url: "https://example.invalid/stt".into(),
            api_key: String::new(),
            model: "saaras:v3".into(),
            mode: "transcribe".into(),
            timeout_secs: 5,
        };
        let service = HttpTranscriptionService::new(config).unwrap();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let err = runtime
            .block_on(service.transcribe(vec![0u8; 44]))
            .unwrap_err();
        assert!(err.to_string().contains("no API key"));
    }
}
