use crate::address_table::{self, CHIP_COUNT, SLOTS_PER_CHIP, SLOT_COUNT};
use crate::error::{Error, Result};

/// Current grayscale intensity of every driver slot, in wire order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    slots: [u16; SLOT_COUNT],
}

impl Default for PixelBuffer {
    fn default() -> Self {
        Self {
            slots: [0; SLOT_COUNT],
        }
    }
}

impl PixelBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the LED at grid cell `(x, y)`. Nothing is sent until the next frame.
    pub fn set_pixel(&mut self, x: usize, y: usize, intensity: u16) -> Result<()> {
        let slot = address_table::resolve(x, y)?;
        self.slots[slot.index()] = intensity;
        Ok(())
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Result<u16> {
        let slot = address_table::resolve(x, y)?;
        Ok(self.slots[slot.index()])
    }

    pub fn set_all(&mut self, intensity: u16) {
        self.slots.fill(intensity);
    }

    /// Set every slot driven by one chip, e.g. to find a dead driver IC
    pub fn set_chip_group(&mut self, chip: usize, intensity: u16) -> Result<()> {
        if chip >= CHIP_COUNT {
            return Err(Error::InvalidChip(chip));
        }

        let start = chip * SLOTS_PER_CHIP;
        self.slots[start..start + SLOTS_PER_CHIP].fill(intensity);
        Ok(())
    }

    /// All slots in (chip, channel, color) order
    pub fn slots(&self) -> &[u16; SLOT_COUNT] {
        &self.slots
    }
}
