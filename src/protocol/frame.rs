use crate::address_table::SLOT_COUNT;
use crate::pixel_buffer::PixelBuffer;

/// Sync marker that opens every frame
pub const FRAME_HEADER: [u8; 2] = *b"GO";

pub const FRAME_LEN: usize = FRAME_HEADER.len() + SLOT_COUNT * 2;

/// Allocation size for the frame buffer: the payload plus the same again as headroom
pub const FRAME_CAPACITY: usize = 2 * SLOT_COUNT * 2;

/// One serialized snapshot of the pixel buffer, ready for the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(Vec<u8>);

impl Frame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hex dump in the same format as the debug logs
    pub fn hex(&self) -> String {
        self.0
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Build a frame: `GO` then every slot as a big-endian u16, in slot order
pub fn build_frame(buffer: &PixelBuffer) -> Frame {
    let mut frame = Vec::with_capacity(FRAME_CAPACITY);

    // Header
    push_checked(&mut frame, &FRAME_HEADER);

    // Grayscale data
    for &intensity in buffer.slots() {
        push_checked(&mut frame, &intensity.to_be_bytes());
    }

    Frame(frame)
}

fn push_checked(frame: &mut Vec<u8>, bytes: &[u8]) {
    assert!(
        frame.len() + bytes.len() <= FRAME_CAPACITY,
        "frame buffer overflow: {} + {} bytes exceeds capacity {}",
        frame.len(),
        bytes.len(),
        FRAME_CAPACITY
    );
    frame.extend_from_slice(bytes);
}
