//! Byte-level serial link to the microcontroller.
//!
//! The handshake only needs whole-buffer writes and single-byte reads with a
//! wall-clock timeout. Backends implement [`Transport`] for an open handle
//! and [`Connector`] to open one; closing a handle is dropping it.

mod serial;

pub use serial::{SerialConnector, SerialTransport};

use std::io;
use std::time::Duration;

use crate::config::LinkSettings;
use crate::protocol::ReadOutcome;

pub trait Transport {
    /// Write the whole buffer. Partial writes are not retried by the caller.
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read one byte, waiting at most `timeout`
    fn read_byte(&mut self, timeout: Duration) -> ReadOutcome;
}

pub trait Connector {
    type Transport: Transport;

    fn open(&mut self, settings: &LinkSettings) -> io::Result<Self::Transport>;
}
