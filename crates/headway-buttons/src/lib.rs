//! On-screen virtual buttons: persistence and action dispatch.
//!
//! Rendering and layout belong to the embedding shell; this crate owns
//! the button records on disk and translates a pressed button into
//! injector calls or a dictation trigger.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use headway_core::error::{HeadwayError, Result};
use headway_core::types::MouseButton;
use headway_input::InputInjector;

// ============================================================================
// Button records
// ============================================================================

/// One configured on-screen button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualButton {
    pub label: String,
    #[serde(default)]
    pub tooltip: String,
    pub action: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

/// Ordered collection of buttons persisted as a JSON array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ButtonStore {
    buttons: Vec<VirtualButton>,
}

impl ButtonStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from disk. A missing file is an empty store, not an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No button file, starting empty");
            return Ok(Self::new());
        }
        let contents = fs::read_to_string(path)?;
        let buttons: Vec<VirtualButton> = serde_json::from_str(&contents)?;
        tracing::info!(path = %path.display(), count = buttons.len(), "Loaded buttons");
        Ok(Self { buttons })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(&self.buttons)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn buttons(&self) -> &[VirtualButton] {
        &self.buttons
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    pub fn add(&mut self, button: VirtualButton) {
        self.buttons.push(button);
    }

    /// Remove the button at `index`, if present.
    pub fn remove(&mut self, index: usize) -> Option<VirtualButton> {
        if index < self.buttons.len() {
            Some(self.buttons.remove(index))
        } else {
            None
        }
    }

    /// Reorder a button from one position to another.
    pub fn move_button(&mut self, from: usize, to: usize) -> Result<()> {
        if from >= self.buttons.len() || to >= self.buttons.len() {
            return Err(HeadwayError::Config(format!(
                "button move out of range: {from} -> {to} (len {})",
                self.buttons.len()
            )));
        }
        let button = self.buttons.remove(from);
        self.buttons.insert(to, button);
        Ok(())
    }
}

// ============================================================================
// Action dispatch
// ============================================================================

/// Parsed button action ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum ButtonAction {
    Key(String),
    Scroll(i32),
    Stt,
    Hotkey(Vec<String>),
    Click(MouseButton),
    Type(String),
}

impl ButtonAction {
    /// Parse the `(action, value)` pair stored on a button.
    pub fn parse(action: &str, value: &str) -> Result<Self> {
        match action {
            "key" => {
                if value.is_empty() {
                    return Err(HeadwayError::Injection("key action needs a value".into()));
                }
                Ok(Self::Key(value.to_string()))
            }
            "scroll" => {
                let amount = value.trim().parse::<i32>().map_err(|_| {
                    HeadwayError::Injection(format!("bad scroll amount: {value:?}"))
                })?;
                Ok(Self::Scroll(amount))
            }
            "stt" => Ok(Self::Stt),
            "hotkey" => {
                let keys: Vec<String> = value
                    .split('+')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect();
                if keys.is_empty() {
                    return Err(HeadwayError::Injection(
                        "hotkey action needs a combo".into(),
                    ));
                }
                Ok(Self::Hotkey(keys))
            }
            "click" => match MouseButton::parse(value) {
                Some(button) => Ok(Self::Click(button)),
                None => Err(HeadwayError::Injection(format!(
                    "unknown mouse button: {value:?}"
                ))),
            },
            "type" => Ok(Self::Type(value.to_string())),
            other => Err(HeadwayError::Injection(format!(
                "unknown button action: {other}"
            ))),
        }
    }

    /// Execute against the injector. `stt_trigger` starts a dictation
    /// session and reports whether it was accepted.
    pub fn execute(
        &self,
        injector: &dyn InputInjector,
        stt_trigger: &dyn Fn() -> bool,
    ) -> Result<()> {
        match self {
            Self::Key(key) => injector.press_key(key),
            Self::Scroll(amount) => injector.scroll(*amount),
            Self::Stt => {
                if !stt_trigger() {
                    tracing::info!("Dictation button ignored, session already running");
                }
                Ok(())
            }
            Self::Hotkey(keys) => injector.hotkey(keys),
            Self::Click(button) => injector.click(*button),
            Self::Type(text) => injector.type_text(text),
        }
    }
}
