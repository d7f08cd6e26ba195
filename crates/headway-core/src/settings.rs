use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::types::LinkProtocol;

/// Default transcription endpoint (Sarvam speech-to-text REST API).
pub const DEFAULT_STT_API_URL: &str = "https://api.sarvam.ai/speech-to-text";

/// Environment variable that overrides the stored API key.
pub const STT_API_KEY_ENV: &str = "HEADWAY_STT_API_KEY";

/// Flat JSON settings object for the Headway application.
///
/// Loaded from `~/.headway/config.json` by default, saved back whenever a
/// value changes. Every field has a deliberate default so a partial or
/// missing file still yields a working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Serial port name for the embedder's transport (e.g. `COM8`).
    pub port: String,
    /// Serial baud rate.
    pub baud_rate: u32,
    /// Pointer scale factor applied to movement deltas.
    pub sensitivity: f64,
    /// Axis deltas with absolute value below this clamp to 0.
    pub deadzone: i32,
    /// Invert the X axis in the pointer map.
    pub invert_x: bool,
    /// Invert the Y axis in the pointer map.
    pub invert_y: bool,
    /// Sensor frame grammar: text lines or 5-byte binary frames.
    pub link_protocol: LinkProtocol,
    /// Tokens the firmware sends for a short button press.
    pub short_press_tokens: Vec<String>,
    /// Tokens the firmware sends for a long button press.
    pub long_press_tokens: Vec<String>,
    /// Gesture debounce window in milliseconds.
    pub click_window_ms: u64,
    /// Press count that fires a right-click immediately.
    pub triple_click_threshold: u32,
    /// Audio capture sample rate in Hz.
    pub sample_rate: u32,
    /// Audio capture chunk duration in milliseconds.
    pub chunk_ms: u64,
    /// RMS (16-bit sample scale) below which a chunk counts as silence.
    pub silence_threshold: f64,
    /// Contiguous silence before capture stops, in seconds.
    pub silence_timeout_secs: f64,
    /// Transcription endpoint URL.
    pub stt_api_url: String,
    /// Transcription API key (env `HEADWAY_STT_API_KEY` overrides).
    pub stt_api_key: String,
    /// Transcription model identifier.
    pub stt_model: String,
    /// Transcription mode: "transcribe" or "translate".
    pub stt_mode: String,
    /// Transcription HTTP request timeout in seconds.
    pub stt_timeout_secs: u64,
    /// Delay between injected characters when typing, in milliseconds.
    pub type_interval_ms: u64,
    /// Virtual-button store path. Empty means alongside the config file.
    pub buttons_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: 115_200,
            sensitivity: 1.0,
            deadzone: 2,
            invert_x: true,
            invert_y: true,
            link_protocol: LinkProtocol::Text,
            short_press_tokens: vec!["CLK".into(), "LC".into(), "C,L".into()],
            long_press_tokens: vec!["STT".into(), "RC".into()],
            click_window_ms: 500,
            triple_click_threshold: 3,
            sample_rate: 16_000,
            chunk_ms: 500,
            silence_threshold: 300.0,
            silence_timeout_secs: 6.0,
            stt_api_url: DEFAULT_STT_API_URL.to_string(),
            stt_api_key: String::new(),
            stt_model: "saaras:v3".to_string(),
            stt_mode: "transcribe".to_string(),
            stt_timeout_secs: 30,
            type_interval_ms: 20,
            buttons_path: String::new(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        info!("Settings loaded from {}", path.display());
        Ok(settings)
    }

    /// Load settings from a JSON file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(
                    "Failed to load settings from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current settings to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Gesture debounce window as a `Duration`.
    pub fn click_window(&self) -> Duration {
        Duration::from_millis(self.click_window_ms)
    }

    /// Silence timeout as a `Duration`.
    pub fn silence_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.silence_timeout_secs)
    }

    /// Capture chunk duration as a `Duration`.
    pub fn chunk_duration(&self) -> Duration {
        Duration::from_millis(self.chunk_ms)
    }

    /// Inter-character typing delay as a `Duration`.
    pub fn type_interval(&self) -> Duration {
        Duration::from_millis(self.type_interval_ms)
    }

    /// Resolve the transcription API key: env override first, then the
    /// stored value.
    pub fn resolve_stt_api_key(&self) -> String {
        std::env::var(STT_API_KEY_ENV).unwrap_or_else(|_| self.stt_api_key.clone())
    }

    /// Resolve the virtual-button store path. An empty `buttons_path`
    /// places `buttons.json` next to the config file.
    pub fn resolve_buttons_path(&self, config_path: &Path) -> PathBuf {
        if self.buttons_path.is_empty() {
            config_path
                .parent()
                .map(|dir| dir.join("buttons.json"))
                .unwrap_or_else(|| PathBuf::from("buttons.json"))
        } else {
            PathBuf::from(&self.buttons_path)
        }
    }
}
