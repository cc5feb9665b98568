//! Card Pick Capture
//!
//! Records "card pick" events during a match: every press of the trigger key
//! saves a grayscale crop of the player's and the opponent's screen region as
//! a numbered pair under `<output_root>/sequence_<n>/`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use pick_capture::config::{load_file_config, CaptureConfig, Overrides};
use pick_capture::error::ConfigError;
use pick_capture::{logger, paths};

#[derive(Debug, Parser)]
#[command(about = "Saves paired screen crops on every press of the trigger key")]
struct Args {
    /// Config file (defaults to config.json next to the executable)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory that receives the sequence_<n> folders
    #[arg(long)]
    output_root: Option<PathBuf>,
    /// Key polling period in seconds
    #[arg(long)]
    poll_interval: Option<f64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        log::error!("[PANIC]{} {}", location, msg);
        eprintln!("[PANIC]{} {}", location, msg);
    }));

    paths::ensure_directories().context("Failed to create logs directory")?;
    logger::init(LevelFilter::Info, &paths::get_log_file())
        .context("Failed to install logger")?;

    let config_path = args.config.clone().unwrap_or_else(paths::get_default_config);
    log::info!("Loading config from {}", config_path.display());
    let overrides = Overrides {
        output_root: args.output_root.clone(),
        poll_interval_seconds: args.poll_interval,
    };

    match run(&config_path, &overrides) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("{}", e);
            Err(e.into())
        }
    }
}

/// Validates the configuration, opens the session and runs the loop until stopped.
#[cfg(windows)]
fn run(config_path: &std::path::Path, overrides: &Overrides) -> Result<(), ConfigError> {
    use pick_capture::capture::{enable_dpi_awareness, GdiScreen, ScreenSource};
    use pick_capture::input::AsyncKeyPoller;
    use pick_capture::runner::{spawn_stop_watcher, CaptureLoop, StopHandle};
    use pick_capture::session::SequenceSession;

    enable_dpi_awareness();
    let screen = GdiScreen::new();
    let screen_size = screen.dimensions()?;
    log::info!("Screen size: {}x{}", screen_size.0, screen_size.1);

    let config = load_config(config_path, overrides, screen_size)?;
    let session = SequenceSession::open(&config.output_root)?;

    let stop = StopHandle::new();
    let watcher = spawn_stop_watcher(
        AsyncKeyPoller::new(config.stop_key),
        stop.clone(),
        config.poll_interval,
    );

    log::info!(
        "Press {} to capture a pick, {} to stop",
        config.trigger_key,
        config.stop_key
    );
    let mut capture_loop = CaptureLoop::new(
        AsyncKeyPoller::new(config.trigger_key),
        screen,
        session,
        config.regions,
        config.poll_interval,
        stop,
    );
    capture_loop.run();

    if watcher.join().is_err() {
        log::warn!("Stop key watcher panicked");
    }
    Ok(())
}

#[cfg(not(windows))]
fn run(_config_path: &std::path::Path, _overrides: &Overrides) -> Result<(), ConfigError> {
    Err(ConfigError::UnsupportedPlatform)
}

/// Loads, overrides and validates the config, then applies its log level.
#[cfg_attr(not(windows), allow(dead_code))]
fn load_config(
    config_path: &std::path::Path,
    overrides: &Overrides,
    screen_size: (u32, u32),
) -> Result<CaptureConfig, ConfigError> {
    let config = load_file_config(config_path)?.validate(
        overrides,
        screen_size,
        &paths::get_default_output_root(),
    )?;
    logger::set_level(config.log_level);

    let player = config.regions.player.rect();
    let opponent = config.regions.opponent.rect();
    log::info!(
        "Player region: ({}, {}, {}, {}), opponent region: ({}, {}, {}, {})",
        player.x1,
        player.x2,
        player.y1,
        player.y2,
        opponent.x1,
        opponent.x2,
        opponent.y1,
        opponent.y2
    );
    log::info!("Output root: {}", config.output_root.display());
    Ok(config)
}
