//! Device adapters
//!
//! Drivers written once against the `halcyon-hal` contracts. They run on
//! silicon and on the virtual peripherals alike:
//!
//! - [`sdev::BusDevice`] - serial device bound to a fixed address on a bus
//! - [`mux::Tca9544a`], [`mux::Pca9548a`] - I2C multiplexers
//! - [`ehal`] - bridges to and from `embedded-hal` I2C

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod ehal;
pub mod mux;
pub mod sdev;

pub use ehal::{BusError, EmbeddedHalBus, HalI2c};
pub use mux::{Pca9548a, Tca9544a};
pub use sdev::BusDevice;
