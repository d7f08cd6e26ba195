//! Shared domain types crossing crate boundaries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One decoded sensor event, produced from a single line or frame.
///
/// Events are immutable and consumed exactly once by the bridge loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorEvent {
    /// Raw movement delta in sensor units, deadzone already applied.
    Move { dx: i32, dy: i32 },
    /// Short press of the primary button (click gesture input).
    ButtonShort,
    /// Long press of the secondary button (dictation trigger).
    ButtonLong,
    /// A single token the decoder does not recognize. Dropped by callers.
    Unknown,
}

/// The gesture produced by a debounced burst of button presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifiedGesture {
    /// One press within the window.
    LeftClick,
    /// Two presses within the window.
    DoubleClick,
    /// Three presses - fired immediately at the threshold.
    RightClick,
}

impl fmt::Display for ClassifiedGesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifiedGesture::LeftClick => write!(f, "left-click"),
            ClassifiedGesture::DoubleClick => write!(f, "double-click"),
            ClassifiedGesture::RightClick => write!(f, "right-click"),
        }
    }
}

/// Mouse button identifier for the input injector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// Parse a button name as stored in virtual-button records.
    /// Empty input means the default left button.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "" | "left" => Some(MouseButton::Left),
            "right" => Some(MouseButton::Right),
            "middle" => Some(MouseButton::Middle),
            _ => None,
        }
    }
}

/// Sensor link state as observed by the bridge loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connected,
    Error,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Error => write!(f, "error"),
        }
    }
}

/// Frame grammar spoken by the sensor firmware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkProtocol {
    /// Newline-delimited text lines (`dx,dy`, `M,dx,dy`, button tokens).
    #[default]
    Text,
    /// Fixed 5-byte little-endian frames (two i16 deltas + reserved byte).
    Binary,
}

/// Captured mono 16-bit PCM audio, the hand-off unit between the
/// recorder and the WAV encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
