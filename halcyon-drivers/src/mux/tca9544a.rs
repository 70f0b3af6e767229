//! TCA9544A 4-channel I2C multiplexer
//!
//! The control register takes `0b100 | channel`; bit 2 enables the
//! selected channel.

use halcyon_hal::{BusOps, HalError, HalResult, Mux, MuxOps};

use super::address;

/// Channel enable bit of the control register
const ENABLE: u8 = 0x04;

/// TCA9544A at a fixed bus address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tca9544a {
    address: u8,
}

impl Tca9544a {
    /// Downstream channel count
    pub const CHANNELS: u8 = 4;

    /// Device strapped with A2..A0 = `pins`
    pub const fn new(pins: u8) -> Self {
        Self {
            address: address(pins),
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Open a multiplexer handle in front of `upstream`
    pub fn open<B: BusOps>(upstream: B, pins: u8) -> Mux<B, Self> {
        Mux::open(upstream, Self::CHANNELS, Self::new(pins))
    }
}

impl MuxOps for Tca9544a {
    fn select_channel(&mut self, upstream: &mut dyn BusOps, channel: u8) -> HalResult {
        if channel >= Self::CHANNELS {
            return Err(HalError::Error);
        }
        upstream.write(self.address, &[ENABLE | channel])
    }
}
