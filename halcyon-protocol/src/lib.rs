//! Peripheral Simulator Link Protocol
//!
//! This crate defines the byte-level protocol spoken between the virtual
//! peripherals in `halcyon-hal-virtual` and the host-side visualizer that
//! plays the role of the attached hardware.
//!
//! # Protocol Overview
//!
//! Every inbound message starts with a peripheral kind byte followed by a
//! kind-specific body:
//! ```text
//! ┌──────┬─────────┬─────────────────────────────────────────────┐
//! │ KIND │ CHANNEL │ BODY                                        │
//! │ 1B   │ 1B      │ I2C: 1B bus byte                            │
//! │      │         │ UART: 3B header, START, DATA, [PAR], STOP×n │
//! │      │         │ GPIO: 2B pins changed, 2B new values        │
//! └──────┴─────────┴─────────────────────────────────────────────┘
//! ```
//!
//! Outbound bytes are written through the transport, which is keyed by
//! kind and instance id, so they carry no prefix of their own.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod gpio;
pub mod i2c;
pub mod uart;

pub use gpio::GpioMessage;
pub use i2c::{Direction, I2cMessage};
pub use uart::{FrameError, FrameHeader};

/// Peripheral kind, first byte of every inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PeripheralKind {
    Gpio = 0,
    I2c = 1,
    Uart = 2,
    Timer = 3,
}

impl PeripheralKind {
    /// Get the kind as a byte value
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create a kind from a byte value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(PeripheralKind::Gpio),
            1 => Some(PeripheralKind::I2c),
            2 => Some(PeripheralKind::Uart),
            3 => Some(PeripheralKind::Timer),
            _ => None,
        }
    }
}
