//! The dictation pipeline: capture, transcribe, type.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use headway_audio::{capture_until_silence, encode_wav, MicrophoneSource, RecorderConfig};
use headway_core::settings::Settings;
use headway_input::InputInjector;
use headway_stt::TranscriptionService;

use crate::broadcast::StateBroadcaster;
use crate::guard::{SessionGuard, SessionPermit};
use crate::state::SttState;

/// Engine knobs, derived from the settings file.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub recorder: RecorderConfig,
}

impl EngineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            recorder: RecorderConfig {
                sample_rate: settings.sample_rate,
                chunk_ms: settings.chunk_ms,
                silence_threshold: settings.silence_threshold,
                silence_timeout: settings.silence_timeout(),
            },
        }
    }
}

/// Runs dictation sessions end to end. Sessions are single-flight: a
/// trigger while one is running is dropped, not queued.
pub struct DictationEngine<M, T> {
    microphone: Arc<M>,
    transcriber: Arc<T>,
    injector: Arc<dyn InputInjector>,
    broadcaster: Arc<StateBroadcaster>,
    guard: SessionGuard,
    config: EngineConfig,
}

impl<M, T> DictationEngine<M, T>
where
    M: MicrophoneSource + 'static,
    T: TranscriptionService + 'static,
{
    pub fn new(
        microphone: Arc<M>,
        transcriber: Arc<T>,
        injector: Arc<dyn InputInjector>,
        broadcaster: Arc<StateBroadcaster>,
        config: EngineConfig,
    ) -> Self {
        Self {
            microphone,
            transcriber,
            injector,
            broadcaster,
            guard: SessionGuard::new(),
            config,
        }
    }

    /// Whether a session is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.guard.is_active()
    }

    /// Start a session in the background. Returns false when one is
    /// already running.
    pub fn trigger(self: &Arc<Self>) -> bool {
        let Some(permit) = self.guard.try_acquire() else {
            tracing::info!("Dictation already in progress, ignoring trigger");
            return false;
        };
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine.run_session(permit).await;
        });
        true
    }

    /// Run one session to completion on the current task. Returns false
    /// when a session was already running.
    pub async fn run(&self) -> bool {
        let Some(permit) = self.guard.try_acquire() else {
            tracing::info!("Dictation already in progress, ignoring trigger");
            return false;
        };
        self.run_session(permit).await;
        true
    }

    async fn run_session(&self, _permit: SessionPermit) {
        let session_id = Uuid::new_v4();
        let started = Instant::now();
        tracing::info!(%session_id, started_at = %Utc::now(), "Dictation session started");

        self.broadcaster.publish(SttState::Listening);

        let microphone = Arc::clone(&self.microphone);
        let recorder = self.config.recorder.clone();
        let captured = tokio::task::spawn_blocking(move || {
            let mut stream = microphone.open(recorder.sample_rate)?;
            capture_until_silence(stream.as_mut(), &recorder)
        })
        .await;

        let waveform = match captured {
            Ok(Ok(waveform)) => waveform,
            Ok(Err(e)) => {
                tracing::error!(%session_id, error = %e, "Audio capture failed");
                self.broadcaster.publish(SttState::Error);
                return;
            }
            Err(e) => {
                tracing::error!(%session_id, error = %e, "Capture task aborted");
                self.broadcaster.publish(SttState::Error);
                return;
            }
        };

        tracing::debug!(
            %session_id,
            samples = waveform.samples.len(),
            duration_secs = waveform.duration_secs(),
            "Capture complete"
        );
        self.broadcaster.publish(SttState::Transcribing);

        let transcript = match encode_wav(&waveform) {
            Ok(wav_bytes) => match self.transcriber.transcribe(wav_bytes).await {
                Ok(transcript) => transcript,
                Err(e) => {
                    tracing::error!(%session_id, error = %e, "Transcription failed");
                    self.broadcaster.publish(SttState::Error);
                    return;
                }
            },
            Err(e) => {
                tracing::error!(%session_id, error = %e, "WAV encoding failed");
                self.broadcaster.publish(SttState::Error);
                return;
            }
        };

        self.broadcaster.publish(SttState::Typing);

        if transcript.is_empty() {
            tracing::info!(%session_id, "Empty transcript, nothing to type");
        } else {
            let injector = Arc::clone(&self.injector);
            let text = transcript.clone();
            let typed =
                tokio::task::spawn_blocking(move || injector.type_text(&text)).await;
            match typed {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    // Partial typing is better than a failed session.
                    tracing::warn!(%session_id, error = %e, "Typing failed");
                }
                Err(e) => {
                    tracing::warn!(%session_id, error = %e, "Typing task aborted");
                }
            }
        }

        self.broadcaster.publish(SttState::Done);
        tracing::info!(
            %session_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            chars = transcript.chars().count(),
            "Dictation session complete"
        );
    }
}
