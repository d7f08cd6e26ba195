//! Real input backend driving enigo.

use std::sync::Mutex;
use std::time::Duration;

use enigo::{
    Axis, Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings as EnigoSettings,
};

use headway_core::error::{HeadwayError, Result};
use headway_core::types::MouseButton;

use crate::keymap::parse_key;
use crate::InputInjector;

/// Desktop input backend. Enigo is not thread-safe, so all calls
/// serialize through a mutex.
pub struct EnigoInjector {
    enigo: Mutex<Enigo>,
    type_interval: Duration,
}

impl EnigoInjector {
    pub fn new(type_interval: Duration) -> Result<Self> {
        let enigo = Enigo::new(&EnigoSettings::default())
            .map_err(|e| HeadwayError::Injection(format!("failed to initialize input: {e}")))?;
        Ok(Self {
            enigo: Mutex::new(enigo),
            type_interval,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Enigo>> {
        self.enigo
            .lock()
            .map_err(|_| HeadwayError::Injection("input backend mutex poisoned".into()))
    }
}

fn to_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
    }
}

impl InputInjector for EnigoInjector {
    fn move_relative(&self, dx: i32, dy: i32) -> Result<()> {
        self.lock()?
            .move_mouse(dx, dy, Coordinate::Rel)
            .map_err(|e| HeadwayError::Injection(format!("pointer move failed: {e}")))
    }

    fn click(&self, button: MouseButton) -> Result<()> {
        self.lock()?
            .button(to_button(button), Direction::Click)
            .map_err(|e| HeadwayError::Injection(format!("click failed: {e}")))
    }

    fn double_click(&self) -> Result<()> {
        let mut enigo = self.lock()?;
        for _ in 0..2 {
            enigo
                .button(Button::Left, Direction::Click)
                .map_err(|e| HeadwayError::Injection(format!("double-click failed: {e}")))?;
        }
        Ok(())
    }

    fn type_text(&self, text: &str) -> Result<()> {
        // Typed character by character so slow target applications keep
        // up with dictated text.
        let mut enigo = self.lock()?;
        for c in text.chars() {
            let mut buffer = [0u8; 4];
            enigo
                .text(c.encode_utf8(&mut buffer))
                .map_err(|e| HeadwayError::Injection(format!("typing failed: {e}")))?;
            if !self.type_interval.is_zero() {
                std::thread::sleep(self.type_interval);
            }
        }
        Ok(())
    }

    fn press_key(&self, key: &str) -> Result<()> {
        let parsed = parse_key(key)?;
        self.lock()?
            .key(parsed, Direction::Click)
            .map_err(|e| HeadwayError::Injection(format!("key press failed: {e}")))
    }

    fn hotkey(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Err(HeadwayError::Injection("empty hotkey combo".into()));
        }

        let parsed: Vec<_> = keys.iter().map(|k| parse_key(k)).collect::<Result<_>>()?;
        let (last, modifiers) = parsed.split_last().expect("combo checked non-empty");

        let mut enigo = self.lock()?;
        for key in modifiers {
            enigo
                .key(*key, Direction::Press)
                .map_err(|e| HeadwayError::Injection(format!("hotkey press failed: {e}")))?;
        }
        let result = enigo
            .key(*last, Direction::Click)
            .map_err(|e| HeadwayError::Injection(format!("hotkey failed: {e}")));
        // Release modifiers in reverse even when the final key failed.
        for key in modifiers.iter().rev() {
            let _ = enigo.key(*key, Direction::Release);
        }
        result
    }

    fn scroll(&self, amount: i32) -> Result<()> {
        self.lock()?
            .scroll(amount, Axis::Vertical)
            .map_err(|e| HeadwayError::Injection(format!("scroll failed: {e}")))
    }
}
