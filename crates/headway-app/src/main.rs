//! Headway application binary - composition root.
//!
//! Wires the whole bridge together:
//! 1. Load settings from JSON
//! 2. Build the input injector (real or dry-run)
//! 3. Build the dictation engine (microphone -> transcription -> typing)
//! 4. Wire the gesture classifier to mouse clicks
//! 5. Run the sensor bridge loop until ctrl-c
//!
//! The serial link itself is an embedder concern; this binary drives the
//! bridge from a replay file (`--replay`) for development.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use headway_audio::CpalMicrophone;
use headway_buttons::ButtonStore;
use headway_core::settings::Settings;
use headway_core::types::{ClassifiedGesture, MouseButton};
use headway_dictation::{DictationEngine, EngineConfig, StateBroadcaster};
use headway_gesture::{GestureClassifier, GestureConfig};
use headway_input::{EnigoInjector, InputInjector, LoggingInjector};
use headway_signal::{Decoder, DecoderConfig, ReplayTransport};
use headway_stt::{HttpTranscriptionService, SttConfig};

mod bridge;
mod cli;

use bridge::{PointerMap, SensorBridge};
use cli::CliArgs;

fn build_injector(args: &CliArgs, settings: &Settings) -> Arc<dyn InputInjector> {
    if args.dry_run {
        tracing::info!("Dry run: input injection disabled");
        return Arc::new(LoggingInjector::new());
    }
    match EnigoInjector::new(settings.type_interval()) {
        Ok(injector) => Arc::new(injector),
        Err(e) => {
            tracing::warn!(error = %e, "Input backend unavailable, falling back to dry run");
            Arc::new(LoggingInjector::new())
        }
    }
}

fn build_classifier(
    settings: &Settings,
    injector: Arc<dyn InputInjector>,
) -> GestureClassifier {
    GestureClassifier::new(
        GestureConfig {
            window: settings.click_window(),
            triple_threshold: settings.triple_click_threshold,
        },
        Arc::new(move |gesture| match gesture {
            ClassifiedGesture::LeftClick => injector.click(MouseButton::Left),
            ClassifiedGesture::DoubleClick => injector.double_click(),
            ClassifiedGesture::RightClick => injector.click(MouseButton::Right),
        }),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Tracing.
    let default_directive = args.log_level.clone().unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive)),
        )
        .init();

    tracing::info!("Starting headway v{}", env!("CARGO_PKG_VERSION"));

    // Settings.
    let config_path = args.resolve_config_path();
    let settings = Settings::load_or_default(&config_path);
    tracing::info!(config = %config_path.display(), "Settings loaded");

    // Input injection.
    let injector = build_injector(&args, &settings);

    // Dictation pipeline.
    let broadcaster = Arc::new(StateBroadcaster::new());
    broadcaster.subscribe(|state| tracing::info!(%state, "Dictation state"));
    let transcriber = Arc::new(HttpTranscriptionService::new(SttConfig::from_settings(
        &settings,
    ))?);
    let engine = Arc::new(DictationEngine::new(
        Arc::new(CpalMicrophone::new()),
        transcriber,
        Arc::clone(&injector),
        Arc::clone(&broadcaster),
        EngineConfig::from_settings(&settings),
    ));

    // Virtual buttons (rendered by an embedding shell; loaded here so a
    // broken file surfaces at startup).
    let buttons_path = settings.resolve_buttons_path(&config_path);
    match ButtonStore::load(&buttons_path) {
        Ok(store) => tracing::info!(count = store.len(), "Virtual buttons ready"),
        Err(e) => tracing::warn!(error = %e, "Virtual buttons unavailable"),
    }

    // Gestures and the bridge loop.
    let classifier = build_classifier(&settings, Arc::clone(&injector));
    let trigger_engine = Arc::clone(&engine);
    let bridge = Arc::new(SensorBridge::new(
        Decoder::new(DecoderConfig {
            deadzone: settings.deadzone,
            protocol: settings.link_protocol,
            short_press_tokens: settings.short_press_tokens.clone(),
            long_press_tokens: settings.long_press_tokens.clone(),
        }),
        classifier,
        PointerMap::from_settings(&settings),
        Arc::clone(&injector),
        Arc::new(move || trigger_engine.trigger()),
    ));

    // Ctrl-c stops the bridge loop; an in-flight dictation session is
    // left to finish.
    let shutdown = bridge.shutdown_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    match args.replay {
        Some(ref path) => {
            let transport =
                ReplayTransport::from_file(path, Duration::from_millis(args.pace_ms))?;
            bridge.run(transport).await;
        }
        None => {
            tracing::error!(
                port = %settings.port,
                "No sensor transport: the serial link is provided by the embedding \
                 shell; use --replay <file> to drive the bridge from a capture"
            );
        }
    }

    tracing::info!(status = %bridge.status(), "Headway stopped");
    Ok(())
}
