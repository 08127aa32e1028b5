use anyhow::{Context, Result};
use clap::Parser;
use log::{Level, LevelFilter};
use std::fs;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

mod demo;

use demo::{DemoOptions, Pattern};
use hdr_backlight::{Backlight, LinkSettings};

#[derive(Parser)]
#[command(name = "hdr_backlight")]
#[command(about = "HDR backlight driver - demo patterns\n\nDrives the 9x16 RGB LED backlight over serial.", long_about = None)]
struct Cli {
    /// Path to configuration file (JSON); defaults are used when omitted
    config: Option<String>,

    /// Serial port, overrides the config file
    #[arg(long)]
    port: Option<String>,

    /// Baud rate, overrides the config file
    #[arg(long)]
    baud: Option<u32>,

    /// Skip the reset/reconnect handshake at startup
    #[arg(long)]
    no_reset: bool,

    /// Demo pattern to run
    #[arg(long, value_enum, default_value_t = Pattern::All)]
    pattern: Pattern,

    /// Brightness step for the sweep pattern
    #[arg(long, default_value_t = 0x100 / 4)]
    step: u16,

    /// Frame rate cap for the scan pattern (0 = unlimited)
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Enable debug output (statistics)
    #[arg(long)]
    debug: bool,

    /// Enable detailed debug (hex dumps every frame)
    #[arg(long)]
    ddebug: bool,
}

/// Warnings only by default; `--debug` adds connection info and stats, `--ddebug` frame dumps
fn log_level(debug: bool, ddebug: bool) -> LevelFilter {
    if ddebug {
        LevelFilter::Trace
    } else if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

fn init_logging(debug: bool, ddebug: bool) {
    let result = env_logger::Builder::new()
        .filter_level(log_level(debug, ddebug))
        .format(|buf, record| match record.level() {
            Level::Debug | Level::Trace => writeln!(buf, "[DEBUG] {}", record.args()),
            _ => writeln!(buf, "{}", record.args()),
        })
        .parse_default_env()
        .try_init();

    if let Err(e) = result {
        eprintln!("Warning: Could not install logger: {}", e);
    }
}

fn load_settings(cli: &Cli) -> Result<LinkSettings> {
    let mut settings = match &cli.config {
        Some(path) => {
            let config_data = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path))?;
            serde_json::from_str(&config_data)
                .with_context(|| format!("Invalid config file {}", path))?
        }
        None => LinkSettings::default(),
    };

    if let Some(port) = &cli.port {
        settings.port = port.clone();
    }
    if let Some(baud) = cli.baud {
        settings.baud_rate = baud;
    }
    if cli.no_reset {
        settings.reset_on_connect = false;
    }

    Ok(settings)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ddebug implies debug
    let debug = cli.debug || cli.ddebug;
    init_logging(debug, cli.ddebug);

    let settings = load_settings(&cli)?;

    let mut backlight = Backlight::open(settings)?;

    // Set up Ctrl-C handler with graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let running_for_handler = Arc::clone(&running);
    let result = ctrlc::set_handler(move || {
        if debug {
            println!("\nShutting down...");
        }
        running_for_handler.store(false, Ordering::Relaxed);
    });

    if let Err(e) = result {
        eprintln!("Warning: Could not set Ctrl-C handler: {}", e);
    }

    let options = DemoOptions {
        pattern: cli.pattern,
        step: cli.step,
        fps: cli.fps,
    };

    // Runs until Ctrl-C
    let outcome = demo::run(&mut backlight, &options, &running);

    // Graceful shutdown - send a black frame to turn off LEDs
    if debug {
        println!("Turning off LEDs...");
    }
    if let Err(e) = backlight.blank() {
        eprintln!("Warning: Could not blank {}: {}", backlight.port_name(), e);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_flags() {
        assert_eq!(log_level(false, false), LevelFilter::Warn);
        assert_eq!(log_level(true, false), LevelFilter::Debug);
        assert_eq!(log_level(false, true), LevelFilter::Trace);
        assert_eq!(log_level(true, true), LevelFilter::Trace);
    }

    #[test]
    fn test_stats_only_with_debug() {
        // The demo reports stats at info
        assert!(log::Level::Info > log_level(false, false));
        assert!(log::Level::Info <= log_level(true, false));
        assert!(log::Level::Warn <= log_level(false, false));
    }
}
