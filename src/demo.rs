use anyhow::{Context, Result};
use clap::ValueEnum;
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use hdr_backlight::address_table::CHIP_COUNT;
use hdr_backlight::transport::Transport;
use hdr_backlight::{Backlight, SCREEN_HEIGHT, SCREEN_WIDTH};

const FULL: u16 = 0xFFFF;

/// How long each chip stays lit in the chip test
const CHIP_HOLD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Pattern {
    /// Fade the whole panel up, then back down pixel by pixel
    Sweep,
    /// Light one LED at a time across the grid and report the frame rate
    Scan,
    /// Light each driver chip in turn, to spot a dead one
    Chips,
    /// Sweep then scan
    All,
}

pub struct DemoOptions {
    pub pattern: Pattern,
    /// Brightness increment per sweep frame
    pub step: u16,
    /// Frame rate cap for the scan, 0 for none
    pub fps: u32,
}

/// Run the selected pattern until `running` is cleared
pub fn run<T: Transport>(
    backlight: &mut Backlight<T>,
    options: &DemoOptions,
    running: &AtomicBool,
) -> Result<()> {
    while running.load(Ordering::Relaxed) {
        match options.pattern {
            Pattern::Sweep => sweep(backlight, options.step, running)?,
            Pattern::Scan => scan(backlight, options.fps, running)?,
            Pattern::Chips => chips(backlight, running)?,
            Pattern::All => {
                sweep(backlight, options.step, running)?;
                scan(backlight, options.fps, running)?;
            }
        }

        let stats = backlight.stats();
        info!(
            "[Stats] {} frames sent, {} acked, {} timeouts, {} mismatches, {} read errors",
            stats.frames_sent, stats.acked, stats.timeouts, stats.mismatches, stats.read_errors
        );
    }

    Ok(())
}

fn send<T: Transport>(backlight: &mut Backlight<T>) -> Result<()> {
    backlight
        .update_frame()
        .with_context(|| format!("Lost connection to {}", backlight.port_name()))?;
    Ok(())
}

fn sweep<T: Transport>(backlight: &mut Backlight<T>, step: u16, running: &AtomicBool) -> Result<()> {
    let step = step.max(1) as usize;

    // Up with set_all
    for bright in (0..=FULL as u32).step_by(step) {
        if !running.load(Ordering::Relaxed) {
            return Ok(());
        }
        backlight.set_all(bright as u16);
        send(backlight)?;
    }

    // Down one pixel at a time, which must look the same
    for bright in (0..=FULL as u32).rev().step_by(step) {
        if !running.load(Ordering::Relaxed) {
            return Ok(());
        }
        for x in 0..SCREEN_WIDTH {
            for y in 0..SCREEN_HEIGHT {
                backlight.set_pixel(x, y, bright as u16)?;
            }
        }
        send(backlight)?;
    }

    Ok(())
}

fn scan<T: Transport>(backlight: &mut Backlight<T>, fps: u32, running: &AtomicBool) -> Result<()> {
    // Wall clock: the thread spends most of its time blocked on the port
    let frame_time = if fps == 0 {
        Duration::ZERO
    } else {
        Duration::from_secs(1) / fps
    };

    let start = Instant::now();
    let mut frames = 0u32;
    let mut next = start;

    'grid: for x in 0..SCREEN_WIDTH {
        for y in 0..SCREEN_HEIGHT {
            if !running.load(Ordering::Relaxed) {
                break 'grid;
            }

            let now = Instant::now();
            if next > now {
                thread::sleep(next - now);
            }
            next = Instant::now() + frame_time;

            backlight.set_all(0);
            backlight.set_pixel(x, y, FULL)?;
            send(backlight)?;
            frames += 1;
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    if frames > 0 && elapsed > 0.0 {
        println!("{:.1} frames per sec.", frames as f64 / elapsed);
    }

    Ok(())
}

fn chips<T: Transport>(backlight: &mut Backlight<T>, running: &AtomicBool) -> Result<()> {
    for chip in 0..CHIP_COUNT {
        if !running.load(Ordering::Relaxed) {
            return Ok(());
        }

        println!("Lighting chip {}", chip);
        backlight.set_all(0);
        backlight.set_chip_group(chip, FULL)?;
        send(backlight)?;

        let until = Instant::now() + CHIP_HOLD;
        while running.load(Ordering::Relaxed) && Instant::now() < until {
            thread::sleep(Duration::from_millis(100));
        }
    }

    Ok(())
}
