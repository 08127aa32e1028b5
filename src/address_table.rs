//! Fixed wiring map from LED grid coordinates to driver chip slots.
//!
//! The board has a 9x16 grid of RGB LEDs wired across three daisy-chained
//! grayscale drivers, each with 16 channels of 3 color lanes. The three
//! tables below are transcribed from the PCB and indexed `[x][y]`.

use crate::error::{Error, Result};

pub const SCREEN_WIDTH: usize = 9;
pub const SCREEN_HEIGHT: usize = 16;

pub const CHIP_COUNT: usize = 3;
pub const CHANNELS_PER_CHIP: usize = 16;
pub const COLOR_COUNT: usize = 3;

pub const SLOTS_PER_CHIP: usize = CHANNELS_PER_CHIP * COLOR_COUNT;
pub const SLOT_COUNT: usize = CHIP_COUNT * SLOTS_PER_CHIP;

/// Every channel must sum `chip + color` to this over the cells wired to it
pub const CHANNEL_CHECKSUM: u32 =
    (CHIP_COUNT * COLOR_COUNT * (COLOR_COUNT + CHIP_COUNT - 2) / 2) as u32;

type Table = [[u8; SCREEN_HEIGHT]; SCREEN_WIDTH];

const CHIP_TABLE: Table = [
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0],
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0],
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0],
    [2, 2, 2, 2, 2, 2, 2, 2, 1, 1, 1, 0, 0, 0, 0, 0],
    [2, 2, 2, 2, 2, 2, 2, 2, 1, 1, 1, 0, 0, 0, 0, 0],
    [2, 2, 2, 2, 2, 2, 2, 2, 1, 1, 1, 0, 0, 0, 0, 0],
    [2, 2, 2, 2, 2, 2, 2, 2, 1, 1, 0, 0, 0, 0, 0, 0],
    [2, 2, 2, 2, 2, 2, 2, 2, 1, 1, 0, 0, 0, 0, 0, 0],
    [2, 2, 2, 2, 2, 2, 2, 2, 1, 1, 0, 0, 0, 0, 0, 0],
];

const CHANNEL_TABLE: Table = [
    [9, 9, 9, 12, 12, 12, 8, 8, 4, 4, 0, 2, 6, 11, 11, 11],
    [10, 14, 14, 14, 13, 13, 13, 8, 4, 0, 0, 6, 6, 15, 15, 15],
    [10, 10, 15, 15, 15, 11, 11, 11, 7, 5, 5, 3, 3, 10, 10, 10],
    [9, 12, 12, 12, 0, 0, 0, 5, 7, 1, 5, 7, 3, 14, 14, 14],
    [13, 9, 9, 8, 4, 5, 5, 1, 7, 2, 1, 7, 7, 13, 13, 13],
    [14, 13, 13, 8, 4, 1, 1, 2, 3, 2, 1, 4, 4, 9, 9, 9],
    [10, 14, 14, 8, 4, 2, 2, 6, 3, 2, 2, 5, 0, 4, 12, 12],
    [15, 10, 10, 11, 7, 6, 6, 3, 3, 6, 2, 5, 5, 0, 12, 8],
    [15, 15, 11, 11, 7, 7, 3, 3, 6, 6, 1, 1, 1, 0, 8, 8],
];

// Adjacent LEDs on the same channel must have different colors
const COLOR_TABLE: Table = [
    [1, 0, 2, 1, 0, 2, 1, 0, 0, 1, 2, 1, 2, 1, 0, 2],
    [2, 1, 0, 2, 1, 0, 2, 2, 2, 1, 0, 0, 1, 1, 0, 2],
    [0, 1, 2, 0, 1, 2, 0, 1, 1, 1, 2, 0, 2, 1, 0, 2],
    [2, 1, 2, 0, 2, 0, 1, 2, 0, 2, 0, 2, 1, 1, 0, 2],
    [2, 1, 0, 1, 1, 0, 1, 2, 2, 2, 0, 1, 0, 1, 0, 2],
    [2, 1, 0, 0, 0, 0, 1, 2, 1, 0, 1, 2, 0, 1, 0, 2],
    [2, 1, 0, 2, 2, 0, 1, 2, 0, 1, 0, 2, 1, 1, 1, 0],
    [2, 1, 0, 1, 1, 0, 1, 2, 2, 2, 2, 1, 0, 2, 2, 1],
    [0, 1, 2, 0, 0, 2, 1, 0, 1, 0, 1, 0, 2, 0, 0, 2],
];

/// One addressable unit of driver state: a color lane on a chip channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HardwareSlot {
    pub chip: u8,
    pub channel: u8,
    pub color: u8,
}

impl HardwareSlot {
    /// Position of this slot in wire order (chip, channel, color)
    pub fn index(&self) -> usize {
        (self.chip as usize * CHANNELS_PER_CHIP + self.channel as usize) * COLOR_COUNT
            + self.color as usize
    }
}

/// Look up the driver slot wired to grid cell `(x, y)`
pub fn resolve(x: usize, y: usize) -> Result<HardwareSlot> {
    if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
        return Err(Error::OutOfRange { x, y });
    }

    Ok(HardwareSlot {
        chip: CHIP_TABLE[x][y],
        channel: CHANNEL_TABLE[x][y],
        color: COLOR_TABLE[x][y],
    })
}

/// Per-channel sums of `chip + color` over the whole grid
pub fn channel_sums() -> [u32; CHANNELS_PER_CHIP] {
    sums_of(&CHIP_TABLE, &CHANNEL_TABLE, &COLOR_TABLE)
}

/// Check the wiring tables against [`CHANNEL_CHECKSUM`].
///
/// This catches transcription typos, not every possible miswiring: a table
/// can pass and still map two cells to the same slot.
pub fn validate() -> Result<()> {
    validate_tables(&CHIP_TABLE, &CHANNEL_TABLE, &COLOR_TABLE)
}

fn validate_tables(chip: &Table, channel: &Table, color: &Table) -> Result<()> {
    check_entries(chip, channel, color)?;
    check_sums(sums_of(chip, channel, color))
}

/// Every entry must name a real chip, channel and color lane
fn check_entries(chip: &Table, channel: &Table, color: &Table) -> Result<()> {
    for x in 0..SCREEN_WIDTH {
        for y in 0..SCREEN_HEIGHT {
            let slot = HardwareSlot {
                chip: chip[x][y],
                channel: channel[x][y],
                color: color[x][y],
            };

            if slot.chip as usize >= CHIP_COUNT
                || slot.channel as usize >= CHANNELS_PER_CHIP
                || slot.color as usize >= COLOR_COUNT
            {
                return Err(Error::InvalidTableEntry { x, y, slot });
            }
        }
    }

    Ok(())
}

// Entries must already have passed `check_entries`
fn sums_of(chip: &Table, channel: &Table, color: &Table) -> [u32; CHANNELS_PER_CHIP] {
    let mut sums = [0u32; CHANNELS_PER_CHIP];

    for x in 0..SCREEN_WIDTH {
        for y in 0..SCREEN_HEIGHT {
            sums[channel[x][y] as usize] += chip[x][y] as u32 + color[x][y] as u32;
        }
    }

    sums
}

fn check_sums(sums: [u32; CHANNELS_PER_CHIP]) -> Result<()> {
    if sums.iter().all(|&sum| sum == CHANNEL_CHECKSUM) {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch {
            expected: CHANNEL_CHECKSUM,
            sums,
        })
    }
}
