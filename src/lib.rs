//! Host-side driver for an HDR backlight: a 9x16 grid of RGB LEDs on three
//! daisy-chained 16-channel grayscale drivers, fed over USB serial by a
//! microcontroller.
//!
//! ```no_run
//! use hdr_backlight::{Backlight, LinkSettings};
//!
//! let mut backlight = Backlight::open(LinkSettings::new("/dev/ttyACM0", 9600))?;
//! backlight.set_pixel(4, 8, 0xFFFF)?;
//! backlight.update_frame()?;
//! # Ok::<(), hdr_backlight::Error>(())
//! ```

pub mod address_table;
pub mod config;
pub mod driver;
pub mod error;
pub mod link;
pub mod pixel_buffer;
pub mod protocol;
pub mod transport;

#[cfg(test)]
mod test_utils;

pub use address_table::{HardwareSlot, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use config::LinkSettings;
pub use driver::Backlight;
pub use error::{Error, Result};
pub use link::{LinkState, LinkStats};
pub use protocol::{AckStatus, Frame};
