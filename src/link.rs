use log::{debug, info, trace, warn};
use std::thread;

use crate::config::{LinkSettings, MIN_RECONNECT_ATTEMPTS};
use crate::error::{Error, Result};
use crate::protocol::{classify_ack, AckStatus, Frame, RESET_COMMAND};
use crate::transport::{Connector, Transport};

/// Where the link is in its startup and per-frame handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Opening,
    Resetting,
    Reconnecting,
    Connected,
    Sending,
    AwaitingAck,
    Failed,
}

/// Running totals of how frames were acknowledged
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkStats {
    pub frames_sent: u64,
    pub acked: u64,
    pub timeouts: u64,
    pub mismatches: u64,
    pub read_errors: u64,
}

impl LinkStats {
    fn record(&mut self, status: AckStatus) {
        self.frames_sent += 1;
        match status {
            AckStatus::Done => self.acked += 1,
            AckStatus::Timeout => self.timeouts += 1,
            AckStatus::Mismatch(_) => self.mismatches += 1,
            AckStatus::ReadError(_) => self.read_errors += 1,
        }
    }
}

/// Synchronous send/acknowledge link to the device
pub struct Link<T: Transport> {
    transport: T,
    settings: LinkSettings,
    state: LinkState,
    stats: LinkStats,
}

impl<T: Transport> Link<T> {
    /// Open the port and, if enabled, reboot the device and wait for it to come back
    pub fn establish<C>(mut connector: C, settings: LinkSettings) -> Result<Self>
    where
        C: Connector<Transport = T>,
    {
        if settings.reset_on_connect {
            if let Some(max_attempts) = settings.reconnect.max_attempts {
                if max_attempts < MIN_RECONNECT_ATTEMPTS {
                    return Err(Error::InvalidRetryPolicy {
                        max_attempts,
                        min: MIN_RECONNECT_ATTEMPTS,
                    });
                }
            }
        }

        let mut state = LinkState::Disconnected;
        enter(&settings, &mut state, LinkState::Opening);

        let transport = match connector.open(&settings) {
            Ok(transport) => transport,
            Err(source) => {
                enter(&settings, &mut state, LinkState::Failed);
                return Err(Error::PortOpenFailed {
                    port: settings.port.clone(),
                    source,
                });
            }
        };

        let transport = if settings.reset_on_connect {
            match reboot(&mut connector, transport, &settings, &mut state) {
                Ok(transport) => transport,
                Err(e) => {
                    enter(&settings, &mut state, LinkState::Failed);
                    return Err(e);
                }
            }
        } else {
            transport
        };

        enter(&settings, &mut state, LinkState::Connected);
        info!("✓ Connected to {} @ {} baud", settings.port, settings.baud_rate);

        Ok(Link {
            transport,
            settings,
            state,
            stats: LinkStats::default(),
        })
    }

    /// Send one frame and wait for the device to acknowledge it.
    ///
    /// A failed write aborts the frame and is returned as an error. Problems
    /// with the acknowledgment are logged and reported in the status only.
    pub fn exchange(&mut self, frame: &Frame) -> Result<AckStatus> {
        enter(&self.settings, &mut self.state, LinkState::Sending);

        if log::log_enabled!(log::Level::Trace) {
            trace!(
                "[DEBUG {}] Sending frame: {} bytes: {}",
                self.settings.port,
                frame.len(),
                frame.hex()
            );
        }

        if let Err(source) = self.transport.write_bytes(frame.as_bytes()) {
            enter(&self.settings, &mut self.state, LinkState::Connected);
            return Err(Error::Write {
                port: self.settings.port.clone(),
                source,
            });
        }

        enter(&self.settings, &mut self.state, LinkState::AwaitingAck);

        // Two separate clocks: the second read starts after the first returns
        let first = self.transport.read_byte(self.settings.ack.first());
        let second = self.transport.read_byte(self.settings.ack.second());
        let status = classify_ack(first, second);

        self.stats.record(status);
        if !status.is_done() {
            warn!("✗ Frame on {}: {}", self.settings.port, status);
        }

        enter(&self.settings, &mut self.state, LinkState::Connected);
        Ok(status)
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn settings(&self) -> &LinkSettings {
        &self.settings
    }
}

/// Send the reset command, drop the port and poll until the device re-enumerates.
///
/// The first reopen must fail: a port that is still there means the device
/// never went away.
fn reboot<C: Connector>(
    connector: &mut C,
    mut transport: C::Transport,
    settings: &LinkSettings,
    state: &mut LinkState,
) -> Result<C::Transport> {
    enter(settings, state, LinkState::Resetting);

    transport
        .write_bytes(&RESET_COMMAND)
        .map_err(|source| Error::ResetFailed {
            port: settings.port.clone(),
            source,
        })?;
    drop(transport);

    enter(settings, state, LinkState::Reconnecting);

    let mut attempts = 0u32;
    loop {
        attempts += 1;

        match connector.open(settings) {
            Ok(_) if attempts == 1 => {
                return Err(Error::RebootFailed {
                    port: settings.port.clone(),
                });
            }
            Ok(transport) => {
                debug!(
                    "{} came back after {} reconnect attempts",
                    settings.port, attempts
                );
                return Ok(transport);
            }
            Err(e) => {
                trace!("Reconnect attempt {} on {}: {}", attempts, settings.port, e);

                if matches!(settings.reconnect.max_attempts, Some(max) if attempts >= max) {
                    return Err(Error::ReconnectTimeout {
                        port: settings.port.clone(),
                        attempts,
                    });
                }

                thread::sleep(settings.reconnect.interval());
            }
        }
    }
}

fn enter(settings: &LinkSettings, state: &mut LinkState, next: LinkState) {
    trace!("{}: {:?} -> {:?}", settings.port, state, next);
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_buffer::PixelBuffer;
    use crate::protocol::{build_frame, ReadOutcome};
    use crate::test_utils::*;
    use std::io;
    use std::time::Duration;

    fn connected() -> (Link<FakeTransport>, std::rc::Rc<std::cell::RefCell<FakeWire>>) {
        let connector = FakeConnector::rebooting_after(2);
        let wire = connector.wire();
        let link = Link::establish(connector, fast_settings()).unwrap();
        wire.borrow_mut().writes.clear();
        (link, wire)
    }

    #[test]
    fn test_reboot_handshake() {
        let connector = FakeConnector::rebooting_after(3);
        let wire = connector.wire();

        let link = Link::establish(connector, fast_settings()).unwrap();

        assert_eq!(link.state(), LinkState::Connected);
        let wire = wire.borrow();
        assert_eq!(wire.writes, vec![b"RT".to_vec()]);
        assert_eq!(wire.opens, 2);
        assert_eq!(wire.closes, 1);
    }

    #[test]
    fn test_no_reset() {
        let connector = FakeConnector::new();
        let wire = connector.wire();
        let mut settings = fast_settings();
        settings.reset_on_connect = false;

        let link = Link::establish(connector, settings).unwrap();

        assert_eq!(link.state(), LinkState::Connected);
        assert!(wire.borrow().writes.is_empty());
        assert_eq!(wire.borrow().opens, 1);
    }

    #[test]
    fn test_open_failure() {
        let mut connector = FakeConnector::new();
        connector.open_script.push_back(false);

        match Link::establish(connector, fast_settings()) {
            Err(Error::PortOpenFailed { port, source }) => {
                assert_eq!(port, "/dev/fake0");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("expected open failure"),
        }
    }

    #[test]
    fn test_immediate_reopen_is_reboot_failure() {
        let connector = FakeConnector::rebooting_after(0);
        let wire = connector.wire();

        let result = Link::establish(connector, fast_settings());

        assert!(matches!(result, Err(Error::RebootFailed { .. })));
        // Both handles were released
        assert_eq!(wire.borrow().opens, 2);
        assert_eq!(wire.borrow().closes, 2);
    }

    #[test]
    fn test_reconnect_gives_up() {
        let connector = FakeConnector::rebooting_after(100);
        let mut settings = fast_settings();
        settings.reconnect.max_attempts = Some(5);

        match Link::establish(connector, settings) {
            Err(Error::ReconnectTimeout { attempts, .. }) => assert_eq!(attempts, 5),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("expected reconnect timeout"),
        }
    }

    #[test]
    fn test_unbounded_reconnect() {
        let connector = FakeConnector::rebooting_after(200);
        let mut settings = fast_settings();
        settings.reconnect.max_attempts = None;

        assert!(Link::establish(connector, settings).is_ok());
    }

    #[test]
    fn test_reset_write_failure() {
        let connector = FakeConnector::rebooting_after(1);
        connector.wire.borrow_mut().fail_writes = true;

        let result = Link::establish(connector, fast_settings());
        assert!(matches!(result, Err(Error::ResetFailed { .. })));
    }

    #[test]
    fn test_exchange_acknowledged() {
        let (mut link, wire) = connected();
        wire.borrow_mut().queue_bytes(b"DN");
        let frame = build_frame(&PixelBuffer::new());

        let status = link.exchange(&frame).unwrap();

        assert_eq!(status, AckStatus::Done);
        assert_eq!(link.state(), LinkState::Connected);
        let wire = wire.borrow();
        assert_eq!(wire.writes.len(), 1);
        assert_eq!(wire.writes[0], frame.as_bytes());
        assert_eq!(
            wire.read_timeouts,
            vec![Duration::from_millis(90), Duration::from_millis(10)]
        );
    }

    #[test]
    fn test_exchange_ack_failures_are_not_errors() {
        let (mut link, wire) = connected();
        let frame = build_frame(&PixelBuffer::new());

        // Nothing queued: both reads time out
        assert_eq!(link.exchange(&frame).unwrap(), AckStatus::Timeout);

        wire.borrow_mut().queue_bytes(b"XN");
        assert_eq!(link.exchange(&frame).unwrap(), AckStatus::Mismatch(*b"XN"));

        wire.borrow_mut()
            .reads
            .push_back(ReadOutcome::Failed(io::Error::new(io::ErrorKind::Other, "gone")));
        assert_eq!(
            link.exchange(&frame).unwrap(),
            AckStatus::ReadError(io::ErrorKind::Other)
        );

        wire.borrow_mut().queue_bytes(b"DN");
        assert_eq!(link.exchange(&frame).unwrap(), AckStatus::Done);

        assert_eq!(
            link.stats(),
            LinkStats {
                frames_sent: 4,
                acked: 1,
                timeouts: 1,
                mismatches: 1,
                read_errors: 1,
            }
        );
        assert_eq!(link.state(), LinkState::Connected);
    }

    #[test]
    fn test_exchange_write_failure() {
        let (mut link, wire) = connected();
        wire.borrow_mut().fail_writes = true;
        let frame = build_frame(&PixelBuffer::new());

        assert!(matches!(link.exchange(&frame), Err(Error::Write { .. })));
        assert_eq!(link.state(), LinkState::Connected);
        assert_eq!(link.stats().frames_sent, 0);
        // No ack was waited for
        assert!(wire.borrow().read_timeouts.is_empty());
    }

    #[test]
    fn test_unreachable_retry_policy_is_rejected() {
        for max_attempts in [0, 1] {
            let connector = FakeConnector::rebooting_after(1);
            let wire = connector.wire();
            let mut settings = fast_settings();
            settings.reconnect.max_attempts = Some(max_attempts);

            match Link::establish(connector, settings) {
                Err(Error::InvalidRetryPolicy { max_attempts: got, min }) => {
                    assert_eq!(got, max_attempts);
                    assert_eq!(min, 2);
                }
                Err(e) => panic!("unexpected error: {}", e),
                Ok(_) => panic!("expected invalid retry policy"),
            }
            // Rejected before the port was touched
            assert_eq!(wire.borrow().opens, 0);
        }
    }

    #[test]
    fn test_minimum_retry_policy_connects() {
        let connector = FakeConnector::rebooting_after(1);
        let mut settings = fast_settings();
        settings.reconnect.max_attempts = Some(2);

        assert!(Link::establish(connector, settings).is_ok());
    }

    #[test]
    fn test_retry_policy_ignored_without_reset() {
        let connector = FakeConnector::new();
        let mut settings = fast_settings();
        settings.reset_on_connect = false;
        settings.reconnect.max_attempts = Some(0);

        assert!(Link::establish(connector, settings).is_ok());
    }
}
