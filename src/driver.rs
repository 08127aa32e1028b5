use log::debug;

use crate::address_table;
use crate::config::LinkSettings;
use crate::error::Result;
use crate::link::{Link, LinkState, LinkStats};
use crate::pixel_buffer::PixelBuffer;
use crate::protocol::{build_frame, AckStatus, Frame};
use crate::transport::{Connector, SerialConnector, SerialTransport, Transport};

/// Driver for the 9x16 RGB backlight behind three grayscale LED driver chips.
///
/// Owns the pixel buffer and the serial link. Setters only touch the buffer;
/// nothing reaches the device until [`update_frame`](Self::update_frame).
pub struct Backlight<T: Transport> {
    pixels: PixelBuffer,
    link: Link<T>,
}

impl Backlight<SerialTransport> {
    /// Open the configured serial port
    pub fn open(settings: LinkSettings) -> Result<Self> {
        Self::new(SerialConnector, settings)
    }
}

impl<T: Transport> Backlight<T> {
    /// Verify the wiring tables, then bring up the link.
    ///
    /// Any failure here leaves no usable driver.
    pub fn new<C>(connector: C, settings: LinkSettings) -> Result<Self>
    where
        C: Connector<Transport = T>,
    {
        address_table::validate()?;
        debug!("Wiring table checksum OK");

        let link = Link::establish(connector, settings)?;

        Ok(Backlight {
            pixels: PixelBuffer::new(),
            link,
        })
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, intensity: u16) -> Result<()> {
        self.pixels.set_pixel(x, y, intensity)
    }

    pub fn set_all(&mut self, intensity: u16) {
        self.pixels.set_all(intensity)
    }

    /// Light (or darken) every LED on one driver chip
    pub fn set_chip_group(&mut self, chip: usize, intensity: u16) -> Result<()> {
        self.pixels.set_chip_group(chip, intensity)
    }

    /// The frame the next update would send
    pub fn frame(&self) -> Frame {
        build_frame(&self.pixels)
    }

    /// Send the current buffer and wait for the device to latch it.
    ///
    /// Only a failed write is an error. The buffer is left as is, so calling
    /// again retries the same frame.
    pub fn update_frame(&mut self) -> Result<AckStatus> {
        let frame = self.frame();
        self.link.exchange(&frame)
    }

    /// Turn every LED off on the device
    pub fn blank(&mut self) -> Result<AckStatus> {
        self.pixels.set_all(0);
        self.update_frame()
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn settings(&self) -> &LinkSettings {
        self.link.settings()
    }

    pub fn port_name(&self) -> &str {
        &self.link.settings().port
    }

    pub fn state(&self) -> LinkState {
        self.link.state()
    }

    pub fn stats(&self) -> LinkStats {
        self.link.stats()
    }
}
