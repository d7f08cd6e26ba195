//! Single-flight guard for dictation sessions.

use std::sync::{Arc, Mutex};

/// Ensures at most one dictation session runs at a time. Acquiring
/// yields a [`SessionPermit`] that releases the slot when dropped, so
/// every exit path (including panics unwinding through the session
/// task) frees it.
#[derive(Debug, Clone, Default)]
pub struct SessionGuard {
    active: Arc<Mutex<bool>>,
}

impl SessionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the session slot. Returns `None` when a session is already
    /// running.
    pub fn try_acquire(&self) -> Option<SessionPermit> {
        let mut active = self.active.lock().expect("session guard mutex poisoned");
        if *active {
            return None;
        }
        *active = true;
        Some(SessionPermit {
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_active(&self) -> bool {
        *self.active.lock().expect("session guard mutex poisoned")
    }
}

/// Proof of holding the session slot.
#[derive(Debug)]
pub struct SessionPermit {
    active: Arc<Mutex<bool>>,
}

impl Drop for SessionPermit {
    fn drop(&mut self) {
        // Tolerate a poisoned mutex here: dropping during unwind must
        // still release the slot.
        if let Ok(mut active) = self.active.lock() {
            *active = false;
        } else {
            self.active.clear_poison();
            if let Ok(mut active) = self.active.lock() {
                *active = false;
            }
        }
    }
}
