//! Recovery input - input-handling core for a device recovery-mode UI
//!
//! Reads Linux input devices, recognizes hotkey combos and touch gestures,
//! and hands menu actions to a foreground loop through a bounded queue.

pub mod codes;
pub mod config;
pub mod dispatch;
pub mod hotkeys;
pub mod keys;
pub mod platform;
pub mod queue;
pub mod service;
pub mod source;
pub mod touch;

pub use config::Config;
pub use dispatch::EventDispatcher;
pub use hotkeys::{DefaultKeyPolicy, KeyAction, KeyPolicy, KeySnapshot};
pub use queue::{ActionQueue, OverflowPolicy};
pub use service::{RecoveryInput, RecoveryInputBuilder};
pub use source::{run_event_loop, EventSource, EvdevSource, InputError, RawEvent};

use anyhow::Context;
use std::thread;

/// Install the global tracing subscriber: stdout plus an append-mode log
/// file when one is configured and can be opened.
pub fn init_logging(config: &config::LoggingConfig) {
    use tracing_subscriber::prelude::*;

    /// Format timestamps using the system's local time via chrono
    struct LocalTimer;
    impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
        fn format_time(
            &self,
            w: &mut tracing_subscriber::fmt::format::Writer<'_>,
        ) -> std::fmt::Result {
            write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
        }
    }

    let log_file = config.log_file.as_ref().and_then(|path| {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    if let Some(file) = log_file {
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_timer(LocalTimer)
            .with_ansi(false);
        let stdout_layer = tracing_subscriber::fmt::layer().with_timer(LocalTimer);
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::fmt().with_timer(LocalTimer).init();
    }
}

/// Run the input core against the real devices until `wait_key` times out
pub fn run() -> anyhow::Result<()> {
    let config = config::load(None).context("Failed to load config")?;
    init_logging(&config.logging);
    tracing::info!("Recovery input starting");

    let input = RecoveryInput::builder(config.clone())
        .build()
        .context("Failed to start input service")?;

    let mut source = EvdevSource::open(&config.input.device_dir, config.input.rescan_interval())
        .with_context(|| format!("Failed to open devices in {:?}", config.input.device_dir))?;
    tracing::info!("Reading {} input device(s)", source.device_count());

    let mut dispatcher = EventDispatcher::new(input.clone(), &config);
    thread::Builder::new()
        .name("input-dispatch".to_string())
        .spawn(move || {
            if let Err(e) = run_event_loop(&mut source, &mut dispatcher) {
                tracing::error!("Input dispatch stopped: {}", e);
            }
        })
        .context("Failed to spawn dispatch thread")?;

    while let Some(code) = input.wait_key() {
        match input.touch_selection() {
            Some(index) if code == codes::INVOKE_ITEM => {
                tracing::info!("Action {} (menu item {})", code, index)
            }
            _ => tracing::info!("Action {}", code),
        }
    }

    tracing::info!(
        "No input for {}s, exiting",
        config.input.wait_key_timeout_secs
    );
    Ok(())
}
