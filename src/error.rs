use std::io;

use thiserror::Error;

use crate::address_table::{HardwareSlot, CHANNELS_PER_CHIP};

/// Errors surfaced by the backlight driver.
///
/// Mapping and buffer errors are caller mistakes. The port, reboot and
/// checksum variants can only come out of construction and leave no usable
/// driver behind. Acknowledgment problems are not errors at all; see
/// [`AckStatus`](crate::protocol::AckStatus).
#[derive(Debug, Error)]
pub enum Error {
    #[error("coordinate ({x}, {y}) is outside the 9x16 grid")]
    OutOfRange { x: usize, y: usize },

    #[error("chip index {0} is invalid (board has 3 chips)")]
    InvalidChip(usize),

    #[error("wiring table entry at ({x}, {y}) names a slot that does not exist: {slot:?}")]
    InvalidTableEntry { x: usize, y: usize, slot: HardwareSlot },

    #[error("reconnect policy allows {max_attempts} attempts, at least {min} are needed to see the device reboot")]
    InvalidRetryPolicy { max_attempts: u32, min: u32 },

    #[error("wiring table checksum failed: expected every channel to sum to {expected}, got {sums:?}")]
    ChecksumMismatch {
        expected: u32,
        sums: [u32; CHANNELS_PER_CHIP],
    },

    #[error("failed to open serial port {port}")]
    PortOpenFailed {
        port: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to send reset command to {port}")]
    ResetFailed {
        port: String,
        #[source]
        source: io::Error,
    },

    #[error("device on {port} did not reboot (port reopened on the first attempt)")]
    RebootFailed { port: String },

    #[error("device on {port} did not come back after {attempts} reconnect attempts")]
    ReconnectTimeout { port: String, attempts: u32 },

    #[error("failed to write frame to {port}")]
    Write {
        port: String,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
