use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(windows)]
pub const DEFAULT_SERIAL_PORT: &str = "COM4";
#[cfg(not(windows))]
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyACM0";

pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// The first reopen after a reset has to fail, so fewer attempts can never connect
pub const MIN_RECONNECT_ATTEMPTS: u32 = 2;

/// Serial link settings for one backlight board
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LinkSettings {
    pub port: String,
    pub baud_rate: u32,
    /// Send the reset command on startup and wait for the device to reboot
    pub reset_on_connect: bool,
    pub reconnect: RetryPolicy,
    pub ack: AckTimeouts,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERIAL_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            reset_on_connect: true,
            reconnect: RetryPolicy::default(),
            ack: AckTimeouts::default(),
        }
    }
}

impl LinkSettings {
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            ..Self::default()
        }
    }
}

/// How the link waits for the device to come back after a reset
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub interval_ms: u64,
    /// `None` retries forever. At least [`MIN_RECONNECT_ATTEMPTS`].
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            max_attempts: Some(50),
        }
    }
}

impl RetryPolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Wall-clock limits for the two acknowledgment reads.
///
/// Their sum bounds how long one frame can block, which is what caps the
/// frame rate at 10 fps with the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AckTimeouts {
    pub first_ms: u64,
    pub second_ms: u64,
}

impl Default for AckTimeouts {
    fn default() -> Self {
        Self {
            first_ms: 90,
            second_ms: 10,
        }
    }
}

impl AckTimeouts {
    pub fn first(&self) -> Duration {
        Duration::from_millis(self.first_ms)
    }

    pub fn second(&self) -> Duration {
        Duration::from_millis(self.second_ms)
    }
}
