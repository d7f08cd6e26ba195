//! The sensor bridge loop: raw sensor bytes in, desktop input out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use headway_core::settings::Settings;
use headway_core::types::{ConnectionStatus, SensorEvent};
use headway_gesture::GestureClassifier;
use headway_input::InputInjector;
use headway_signal::{Decoder, SensorTransport};

// ============================================================================
// Pointer map
// ============================================================================

/// Maps sensor deltas to pointer deltas: inversion first, then the
/// sensitivity scale, truncating toward zero.
#[derive(Debug, Clone, Copy)]
pub struct PointerMap {
    pub sensitivity: f64,
    pub invert_x: bool,
    pub invert_y: bool,
}

impl PointerMap {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            sensitivity: settings.sensitivity,
            invert_x: settings.invert_x,
            invert_y: settings.invert_y,
        }
    }

    pub fn apply(&self, dx: i32, dy: i32) -> (i32, i32) {
        let sx = if self.invert_x { -1.0 } else { 1.0 };
        let sy = if self.invert_y { -1.0 } else { 1.0 };
        (
            (dx as f64 * sx * self.sensitivity) as i32,
            (dy as f64 * sy * self.sensitivity) as i32,
        )
    }
}

// ============================================================================
// Bridge loop
// ============================================================================

/// Reads the sensor stream and routes each decoded event: movement to
/// the pointer, short presses to the gesture classifier, long presses
/// to the dictation trigger.
pub struct SensorBridge {
    decoder: Decoder,
    classifier: GestureClassifier,
    pointer: PointerMap,
    injector: Arc<dyn InputInjector>,
    stt_trigger: Arc<dyn Fn() -> bool + Send + Sync>,
    status: Arc<Mutex<ConnectionStatus>>,
    shutdown: Arc<AtomicBool>,
}

impl SensorBridge {
    pub fn new(
        decoder: Decoder,
        classifier: GestureClassifier,
        pointer: PointerMap,
        injector: Arc<dyn InputInjector>,
        stt_trigger: Arc<dyn Fn() -> bool + Send + Sync>,
    ) -> Self {
        Self {
            decoder,
            classifier,
            pointer,
            injector,
            stt_trigger,
            status: Arc::new(Mutex::new(ConnectionStatus::Disconnected)),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.lock().expect("status mutex poisoned")
    }

    /// Flag that stops the loop at the next iteration. An in-flight
    /// dictation session is not aborted.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    fn set_status(&self, status: ConnectionStatus) {
        *self.status.lock().expect("status mutex poisoned") = status;
    }

    /// Drive the loop until shutdown or a transport error.
    pub async fn run<T: SensorTransport>(&self, mut transport: T) {
        self.set_status(ConnectionStatus::Connected);
        tracing::info!("Sensor bridge started");

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                tracing::info!("Sensor bridge shutting down");
                self.classifier.reset();
                self.set_status(ConnectionStatus::Disconnected);
                return;
            }

            match transport.read_event().await {
                Ok(Some(raw)) => self.handle_raw(&raw),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Sensor link lost");
                    self.classifier.reset();
                    self.set_status(ConnectionStatus::Error);
                    return;
                }
            }
        }
    }

    fn handle_raw(&self, raw: &[u8]) {
        let event = match self.decoder.decode(raw) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(error = %e, "Dropped undecodable input");
                return;
            }
        };

        match event {
            SensorEvent::Move { dx, dy } => {
                let (px, py) = self.pointer.apply(dx, dy);
                if let Err(e) = self.injector.move_relative(px, py) {
                    // One lost delta is invisible to the user.
                    tracing::debug!(error = %e, "Pointer move failed");
                }
            }
            SensorEvent::ButtonShort => self.classifier.on_button_event(),
            SensorEvent::ButtonLong => {
                if !(self.stt_trigger)() {
                    tracing::info!("Dictation trigger ignored, session already running");
                }
            }
            SensorEvent::Unknown => {
                tracing::debug!("Dropped unrecognized sensor token");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use headway_core::types::{ClassifiedGesture, MouseButton};
    use headway_gesture::GestureConfig;
    use headway_input::{InjectedCall, MockInjector};
    use headway_signal::MockSensorTransport;

    fn test_pointer() -> PointerMap {
        PointerMap {
            sensitivity: 1.0,
            invert_x: true,
            invert_y: true,
        }
    }

    fn bridge_with(
        injector: Arc<MockInjector>,
        trigger: Arc<dyn Fn() -> bool + Send + Sync>,
    ) -> SensorBridge {
        let sink_injector = Arc::clone(&injector);
        let classifier = GestureClassifier::new(
            GestureConfig {
                window: Duration::from_millis(500),
                triple_threshold: 3,
            },
            Arc::new(move |gesture| match gesture {
                ClassifiedGesture::LeftClick => sink_injector.click(MouseButton::Left),
                ClassifiedGesture::DoubleClick => sink_injector.double_click(),
                ClassifiedGesture::RightClick => sink_injector.click(MouseButton::Right),
            }),
        );
        SensorBridge::new(
            Decoder::default(),
            classifier,
            test_pointer(),
            injector,
            trigger,
        )
    }

    #[test]
    fn test_pointer_map_inverts_and_scales() {
        let map = PointerMap {
            sensitivity: 1.5,
            invert_x: true,
            invert_y: false,
        };
        assert_eq!(map.apply(10, 10), (-15, 15));
        // 1.5 and -1.5 both truncate toward zero, not round.
        assert_eq!(map.apply(1, 1), (-1, 1));
        assert_eq!(map.apply(1, -1), (-1, -1));
        assert_eq!(map.apply(0, 0), (0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_moves_and_clicks_reach_injector() {
        let injector = Arc::new(MockInjector::new());
        let bridge = bridge_with(Arc::clone(&injector), Arc::new(|| true));

        // The pause elapses the debounce window while the link is still
        // up, so the press classifies before the disconnect.
        let transport = MockSensorTransport::new()
            .line("M,10,-4")
            .line("CLK")
            .pause(Duration::from_millis(600))
            .disconnect();

        bridge.run(transport).await;
        assert_eq!(bridge.status(), ConnectionStatus::Error);

        assert_eq!(
            injector.calls(),
            vec![
                InjectedCall::MoveRelative { dx: -10, dy: 4 },
                InjectedCall::Click(MouseButton::Left),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_press_pending_at_disconnect_never_clicks() {
        let injector = Arc::new(MockInjector::new());
        let bridge = bridge_with(Arc::clone(&injector), Arc::new(|| true));

        // Link drops while the debounce window is still open: the reset
        // cancels the pending press instead of emitting a late click.
        let transport = MockSensorTransport::new().line("CLK").disconnect();
        bridge.run(transport).await;
        assert_eq!(bridge.status(), ConnectionStatus::Error);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(injector.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_press_fires_dictation_trigger() {
        let injector = Arc::new(MockInjector::new());
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let bridge = bridge_with(
            Arc::clone(&injector),
            Arc::new(move || {
                flag.store(true, Ordering::SeqCst);
                true
            }),
        );

        let transport = MockSensorTransport::new().line("STT").disconnect();
        bridge.run(transport).await;

        assert!(fired.load(Ordering::SeqCst));
        assert!(injector.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_garbage_input_is_dropped() {
        let injector = Arc::new(MockInjector::new());
        let bridge = bridge_with(Arc::clone(&injector), Arc::new(|| true));

        let transport = MockSensorTransport::new()
            .line("not,a,real,event")
            .line("BOGUS")
            .disconnect();
        bridge.run(transport).await;

        assert!(injector.calls().is_empty());
        assert_eq!(bridge.status(), ConnectionStatus::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flag_stops_loop_cleanly() {
        let injector = Arc::new(MockInjector::new());
        let bridge = bridge_with(Arc::clone(&injector), Arc::new(|| true));
        bridge.shutdown_flag().store(true, Ordering::Relaxed);

        let transport = MockSensorTransport::new().line("M,5,5");
        bridge.run(transport).await;

        assert_eq!(bridge.status(), ConnectionStatus::Disconnected);
        assert!(injector.calls().is_empty());
    }
}
