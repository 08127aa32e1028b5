use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use crate::config::LinkSettings;
use crate::protocol::ReadOutcome;
use crate::transport::{Connector, Transport};

/// Everything that crossed the fake wire, shared between connector and transports
#[derive(Debug, Default)]
pub struct FakeWire {
    pub writes: Vec<Vec<u8>>,
    pub reads: VecDeque<ReadOutcome>,
    pub read_timeouts: Vec<Duration>,
    pub fail_writes: bool,
    pub opens: u32,
    pub closes: u32,
}

impl FakeWire {
    pub fn queue_bytes(&mut self, bytes: &[u8]) {
        self.reads.extend(bytes.iter().map(|&b| ReadOutcome::Byte(b)));
    }
}

pub struct FakeConnector {
    pub wire: Rc<RefCell<FakeWire>>,
    /// Result of each successive open; once drained, opens succeed
    pub open_script: VecDeque<bool>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self {
            wire: Rc::new(RefCell::new(FakeWire::default())),
            open_script: VecDeque::new(),
        }
    }

    /// Initial open succeeds, then `failures` reopen attempts fail before one succeeds
    pub fn rebooting_after(failures: usize) -> Self {
        let mut connector = Self::new();
        connector.open_script.push_back(true);
        connector.open_script.extend(std::iter::repeat(false).take(failures));
        connector
    }

    pub fn wire(&self) -> Rc<RefCell<FakeWire>> {
        Rc::clone(&self.wire)
    }
}

impl Connector for FakeConnector {
    type Transport = FakeTransport;

    fn open(&mut self, _settings: &LinkSettings) -> io::Result<FakeTransport> {
        if !self.open_script.pop_front().unwrap_or(true) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such device"));
        }

        self.wire.borrow_mut().opens += 1;
        Ok(FakeTransport {
            wire: Rc::clone(&self.wire),
        })
    }
}

pub struct FakeTransport {
    wire: Rc<RefCell<FakeWire>>,
}

impl Transport for FakeTransport {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut wire = self.wire.borrow_mut();
        if wire.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "write failed"));
        }
        wire.writes.push(bytes.to_vec());
        Ok(())
    }

    fn read_byte(&mut self, timeout: Duration) -> ReadOutcome {
        let mut wire = self.wire.borrow_mut();
        wire.read_timeouts.push(timeout);
        wire.reads.pop_front().unwrap_or(ReadOutcome::TimedOut)
    }
}

impl Drop for FakeTransport {
    fn drop(&mut self) {
        self.wire.borrow_mut().closes += 1;
    }
}

/// Settings that skip the real reboot delays
pub fn fast_settings() -> LinkSettings {
    let mut settings = LinkSettings::new("/dev/fake0", 9600);
    settings.reconnect.interval_ms = 0;
    settings
}
