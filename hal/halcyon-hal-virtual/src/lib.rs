//! Halcyon virtual peripherals
//!
//! Software models of I2C masters, UARTs and GPIO ports that speak the
//! `halcyon-protocol` wire format over a [`Transport`] to a host-side
//! visualizer, which plays the attached hardware. Application code written
//! against the `halcyon-hal` contracts runs on them unchanged.
//!
//! # Actors
//!
//! Each channel is driven by two parties:
//! - the caller, which starts a transfer and either waits for it (blocking)
//!   or returns immediately and is told later through a notifier (interrupt)
//! - the delivery handler, [`VirtualPeripherals::poll`], which routes every
//!   inbound message to the bank that owns it
//!
//! The caller moves a channel out of READY before any byte is exchanged,
//! and the handler ignores channels with nothing in flight, so the two never
//! act on the same transfer step.
//!
//! # Example
//!
//! ```ignore
//! let transport = TcpTransport::connect_local()?;
//! let sim: VirtualPeripherals<_> = VirtualPeripherals::new(transport, VirtualConfig::default());
//!
//! std::thread::scope(|s| {
//!     s.spawn(|| sim.serve());
//!     let mut bus = sim.i2c_bus(0)?;
//!     bus.write(0x50, &[0x11, 0x22, 0x33])
//! })?;
//! ```

#![no_std]
#![deny(unsafe_code)]

#[cfg(any(test, feature = "std"))]
extern crate std;

// This must go FIRST so that the other modules see its macros
#[macro_use]
mod fmt;

pub mod channel;
pub mod config;
pub mod gpio;
pub mod i2c;
pub mod notify;
pub mod peripherals;
pub mod transport;
pub mod uart;

#[cfg(test)]
mod testing;

pub use channel::{Mode, TransferStatus};
pub use config::VirtualConfig;
pub use gpio::{VirtualGpio, VirtualGpioPort, VirtualPin};
pub use i2c::{VirtualI2c, VirtualI2cBus};
pub use notify::NotifierSlot;
pub use peripherals::VirtualPeripherals;
pub use transport::Transport;
#[cfg(feature = "std")]
pub use transport::{TcpTransport, DEFAULT_PORT};
pub use uart::{VirtualUart, VirtualUartPort};

/// Largest transfer a virtual I2C or UART channel buffers
pub const MAX_TRANSFER: usize = 64;
