//! OS input injection.
//!
//! [`InputInjector`] is the object-safe seam between gesture handling
//! and the desktop: the real backend drives enigo, the logging backend
//! only reports what it would do, and the mock records calls for tests.

use std::sync::Mutex;

use headway_core::error::Result;
use headway_core::types::MouseButton;

pub mod enigo_injector;
pub mod keymap;

pub use enigo_injector::EnigoInjector;
pub use keymap::parse_key;

// ============================================================================
// Trait
// ============================================================================

/// Synthesizes pointer, wheel, and keyboard events on the host desktop.
pub trait InputInjector: Send + Sync {
    fn move_relative(&self, dx: i32, dy: i32) -> Result<()>;
    fn click(&self, button: MouseButton) -> Result<()>;
    fn double_click(&self) -> Result<()>;
    fn type_text(&self, text: &str) -> Result<()>;
    fn press_key(&self, key: &str) -> Result<()>;
    fn hotkey(&self, keys: &[String]) -> Result<()>;
    fn scroll(&self, amount: i32) -> Result<()>;
}

// ============================================================================
// Logging backend
// ============================================================================

/// Dry-run backend that logs every action instead of performing it.
#[derive(Debug, Default)]
pub struct LoggingInjector;

impl LoggingInjector {
    pub fn new() -> Self {
        Self
    }
}

impl InputInjector for LoggingInjector {
    fn move_relative(&self, dx: i32, dy: i32) -> Result<()> {
        tracing::debug!(dx, dy, "Would move pointer");
        Ok(())
    }

    fn click(&self, button: MouseButton) -> Result<()> {
        tracing::info!(?button, "Would click");
        Ok(())
    }

    fn double_click(&self) -> Result<()> {
        tracing::info!("Would double-click");
        Ok(())
    }

    fn type_text(&self, text: &str) -> Result<()> {
        tracing::info!(chars = text.chars().count(), "Would type text");
        Ok(())
    }

    fn press_key(&self, key: &str) -> Result<()> {
        tracing::info!(key, "Would press key");
        Ok(())
    }

    fn hotkey(&self, keys: &[String]) -> Result<()> {
        tracing::info!(combo = keys.join("+"), "Would press hotkey");
        Ok(())
    }

    fn scroll(&self, amount: i32) -> Result<()> {
        tracing::info!(amount, "Would scroll");
        Ok(())
    }
}

// ============================================================================
// Mock backend
// ============================================================================

/// One recorded injector call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedCall {
    MoveRelative { dx: i32, dy: i32 },
    Click(MouseButton),
    DoubleClick,
    TypeText(String),
    PressKey(String),
    Hotkey(Vec<String>),
    Scroll(i32),
}

/// Test double that records every call, optionally failing each one.
#[derive(Debug, Default)]
pub struct MockInjector {
    calls: Mutex<Vec<InjectedCall>>,
    fail: bool,
}

impl MockInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call is recorded and then reported as failed.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<InjectedCall> {
        self.calls.lock().expect("mock mutex poisoned").clone()
    }

    fn record(&self, call: InjectedCall) -> Result<()> {
        self.calls.lock().expect("mock mutex poisoned").push(call);
        if self.fail {
            Err(headway_core::error::HeadwayError::Injection(
                "mock injector failure".into(),
            ))
        } else {
            Ok(())
        }
    }
}

impl InputInjector for MockInjector {
    fn move_relative(&self, dx: i32, dy: i32) -> Result<()> {
        self.record(InjectedCall::MoveRelative { dx, dy })
    }

    fn click(&self, button: MouseButton) -> Result<()> {
        self.record(InjectedCall::Click(button))
    }

    fn double_click(&self) -> Result<()> {
        self.record(InjectedCall::DoubleClick)
    }

    fn type_text(&self, text: &str) -> Result<()> {
        self.record(InjectedCall::TypeText(text.to_string()))
    }

    fn press_key(&self, key: &str) -> Result<()> {
        self.record(InjectedCall::PressKey(key.to_string()))
    }

    fn hotkey(&self, keys: &[String]) -> Result<()> {
        self.record(InjectedCall::Hotkey(keys.to_vec()))
    }

    fn scroll(&self, amount: i32) -> Result<()> {
        self.record(InjectedCall::Scroll(amount))
    }
}
