//! PCA9548A 8-channel I2C switch
//!
//! Every control register bit enables one channel. Only one channel is
//! enabled at a time here.

use halcyon_hal::{BusOps, HalError, HalResult, Mux, MuxOps};

use super::address;

/// PCA9548A at a fixed bus address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pca9548a {
    address: u8,
}

impl Pca9548a {
    pub const CHANNELS: u8 = 8;

    pub const fn new(pins: u8) -> Self {
        Self {
            address: address(pins),
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn open<B: BusOps>(upstream: B, pins: u8) -> Mux<B, Self> {
        Mux::open(upstream, Self::CHANNELS, Self::new(pins))
    }
}

impl MuxOps for Pca9548a {
    fn select_channel(&mut self, upstream: &mut dyn BusOps, channel: u8) -> HalResult {
        if channel >= Self::CHANNELS {
            return Err(HalError::Error);
        }
        upstream.write(self.address, &[1 << channel])
    }
}
