//! Dictation session orchestration.
//!
//! A session runs capture, transcription, and typing as one pipeline:
//! the [`guard`] keeps sessions single-flight, [`state`] models the
//! lifecycle, [`broadcast`] fans state changes out to observers, and
//! [`engine`] drives the whole thing.

pub mod broadcast;
pub mod engine;
pub mod guard;
pub mod state;

pub use broadcast::StateBroadcaster;
pub use engine::{DictationEngine, EngineConfig};
pub use guard::{SessionGuard, SessionPermit};
pub use state::SttState;
