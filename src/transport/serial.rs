use std::io::{self, ErrorKind, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use log::warn;
use serialport::SerialPort;

use super::{Connector, Transport};
use crate::config::LinkSettings;
use crate::protocol::ReadOutcome;

/// Write timeout, so a wedged device cannot block a frame forever
const WRITE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Settle time after opening before the first byte goes out
const OPEN_SETTLE: Duration = Duration::from_millis(100);

/// Opens serial ports through the `serialport` crate (POSIX and Windows)
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    type Transport = SerialTransport;

    fn open(&mut self, settings: &LinkSettings) -> io::Result<SerialTransport> {
        let mut port = serialport::new(&settings.port, settings.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(WRITE_TIMEOUT)
            .open()?;

        // The board's USB serial only starts talking once DTR is up
        if let Err(e) = port.write_data_terminal_ready(true) {
            warn!("Failed to set DTR on {}: {}", settings.port, e);
        }

        thread::sleep(OPEN_SETTLE);

        Ok(SerialTransport { port })
    }
}

/// An open serial port
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl Transport for SerialTransport {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.set_timeout(WRITE_TIMEOUT)?;
        self.port.write_all(bytes)?;
        self.port.flush()
    }

    fn read_byte(&mut self, timeout: Duration) -> ReadOutcome {
        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; 1];

        // An interrupted read resumes with whatever is left of the timeout
        while let Some(remaining) = time_left(deadline, Instant::now()) {
            if let Err(e) = self.port.set_timeout(remaining) {
                return ReadOutcome::Failed(e.into());
            }

            match self.port.read(&mut buf) {
                Ok(1) => return ReadOutcome::Byte(buf[0]),
                Ok(_) => return ReadOutcome::TimedOut,
                Err(e) if e.kind() == ErrorKind::TimedOut => return ReadOutcome::TimedOut,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return ReadOutcome::Failed(e),
            }
        }

        ReadOutcome::TimedOut
    }
}

/// Time remaining until `deadline`, `None` once it has passed
fn time_left(deadline: Instant, now: Instant) -> Option<Duration> {
    deadline
        .checked_duration_since(now)
        .filter(|remaining| !remaining.is_zero())
}
