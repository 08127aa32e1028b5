use std::fmt;
use std::io;

/// Bytes the device answers with once it has latched a frame
pub const ACK: [u8; 2] = *b"DN";

/// Result of a single byte read with a timeout
#[derive(Debug)]
pub enum ReadOutcome {
    Byte(u8),
    TimedOut,
    Failed(io::Error),
}

/// How the device answered one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    Done,
    Timeout,
    ReadError(io::ErrorKind),
    Mismatch([u8; 2]),
}

impl AckStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, AckStatus::Done)
    }
}

impl fmt::Display for AckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AckStatus::Done => write!(f, "acknowledged"),
            AckStatus::Timeout => write!(f, "timed out waiting for acknowledgment"),
            AckStatus::ReadError(kind) => write!(f, "failed to read acknowledgment: {}", kind),
            AckStatus::Mismatch(got) => write!(
                f,
                "unexpected acknowledgment {:02x} {:02x} ({:?})",
                got[0],
                got[1],
                String::from_utf8_lossy(got)
            ),
        }
    }
}

/// Classify the two acknowledgment reads. A read error wins over a timeout.
pub fn classify_ack(first: ReadOutcome, second: ReadOutcome) -> AckStatus {
    match (first, second) {
        (ReadOutcome::Byte(a), ReadOutcome::Byte(b)) => {
            if [a, b] == ACK {
                AckStatus::Done
            } else {
                AckStatus::Mismatch([a, b])
            }
        }
        (ReadOutcome::Failed(e), _) | (_, ReadOutcome::Failed(e)) => {
            AckStatus::ReadError(e.kind())
        }
        _ => AckStatus::Timeout,
    }
}
