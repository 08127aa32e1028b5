pub mod ack;
pub mod frame;

pub use ack::{classify_ack, AckStatus, ReadOutcome, ACK};
pub use frame::{build_frame, Frame, FRAME_CAPACITY, FRAME_HEADER, FRAME_LEN};

/// Sent once at startup to make the device reboot
pub const RESET_COMMAND: [u8; 2] = *b"RT";
