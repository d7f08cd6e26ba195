//! Headway gesture crate - the debounced multi-click classifier.
//!
//! Rapid button presses are coalesced into one gesture: the count as of
//! the end of a quiet window decides single vs. double click, and hitting
//! the triple threshold fires a right-click immediately. All count and
//! window bookkeeping happens under one mutex so a press racing the
//! window expiry can neither double-fire nor lose a count.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use headway_core::error::Result;
use headway_core::types::ClassifiedGesture;

/// Downstream consumer of classified gestures.
///
/// Sink failures are logged and never propagated: classification success
/// is independent of injection success.
pub type GestureSink = dyn Fn(ClassifiedGesture) -> Result<()> + Send + Sync;

/// Classifier configuration.
#[derive(Debug, Clone)]
pub struct GestureConfig {
    /// Quiet period after the last press before the gesture is evaluated.
    pub window: Duration,
    /// Press count that fires a right-click without waiting.
    pub triple_threshold: u32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(500),
            triple_threshold: 3,
        }
    }
}

/// Observable phase of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    /// No presses pending.
    Idle,
    /// Accumulating presses, window running.
    Counting(u32),
}

/// State owned exclusively by the classifier, mutated only inside its
/// critical section.
struct GestureState {
    pending_count: u32,
    /// Bumped on every window replacement and on reset; a scheduled
    /// evaluation whose generation no longer matches is stale and must
    /// do nothing. This makes aborting a window that is already firing
    /// a safe no-op.
    generation: u64,
    window: Option<JoinHandle<()>>,
}

/// Debounce state machine turning a press stream into click gestures.
///
/// `on_button_event` must be called from within a tokio runtime: the
/// debounce window is a spawned one-shot task.
#[derive(Clone)]
pub struct GestureClassifier {
    state: Arc<Mutex<GestureState>>,
    config: GestureConfig,
    sink: Arc<GestureSink>,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig, sink: Arc<GestureSink>) -> Self {
        Self {
            state: Arc::new(Mutex::new(GestureState {
                pending_count: 0,
                generation: 0,
                window: None,
            })),
            config,
            sink,
        }
    }

    /// Register one button press.
    ///
    /// Increments the pending count under the classifier mutex. At the
    /// triple threshold the gesture fires synchronously and the count
    /// resets; otherwise the debounce window is replaced with a fresh
    /// one-shot.
    pub fn on_button_event(&self) {
        let fired = {
            let mut state = self.state.lock().expect("gesture mutex poisoned");
            state.pending_count += 1;
            tracing::debug!(count = state.pending_count, "Button press registered");

            if let Some(handle) = state.window.take() {
                handle.abort();
            }
            state.generation = state.generation.wrapping_add(1);

            if state.pending_count >= self.config.triple_threshold {
                state.pending_count = 0;
                true
            } else {
                let generation = state.generation;
                let classifier = self.clone();
                // Spawning is a non-blocking enqueue, safe inside the lock.
                state.window = Some(tokio::spawn(async move {
                    tokio::time::sleep(classifier.config.window).await;
                    classifier.evaluate_window(generation);
                }));
                false
            }
        };

        if fired {
            self.emit(ClassifiedGesture::RightClick);
        }
    }

    /// Evaluate an expired debounce window.
    ///
    /// Runs on the spawned one-shot. Takes the same mutex as event
    /// arrival, so the count it sees is the count as of fire time.
    fn evaluate_window(&self, generation: u64) {
        let count = {
            let mut state = self.state.lock().expect("gesture mutex poisoned");
            if state.generation != generation {
                // Window was replaced or cancelled while this task was
                // already running.
                return;
            }
            let count = state.pending_count;
            state.pending_count = 0;
            state.window = None;
            count
        };

        let gesture = match count {
            0 => return,
            1 => ClassifiedGesture::LeftClick,
            2 => ClassifiedGesture::DoubleClick,
            // Defensive: counts at the threshold fire immediately and
            // should never reach window evaluation.
            _ => ClassifiedGesture::RightClick,
        };
        self.emit(gesture);
    }

    /// Cancel any pending window and return to idle. Used on transport
    /// loss and shutdown.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("gesture mutex poisoned");
        if let Some(handle) = state.window.take() {
            handle.abort();
        }
        state.generation = state.generation.wrapping_add(1);
        state.pending_count = 0;
    }

    /// Presses accumulated in the current window.
    pub fn pending_count(&self) -> u32 {
        self.state.lock().expect("gesture mutex poisoned").pending_count
    }

    /// Current classifier phase.
    pub fn phase(&self) -> GesturePhase {
        let count = self.pending_count();
        if count == 0 {
            GesturePhase::Idle
        } else {
            GesturePhase::Counting(count)
        }
    }

    fn emit(&self, gesture: ClassifiedGesture) {
        tracing::info!(gesture = %gesture, "Gesture classified");
        if let Err(e) = (self.sink)(gesture) {
            tracing::warn!(gesture = %gesture, error = %e, "Gesture sink failed");
        }
    }
}
