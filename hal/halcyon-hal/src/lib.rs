//! Halcyon Hardware Abstraction Layer
//!
//! This crate defines the contracts that application code and device
//! drivers are written against. Each contract is a trait; a handle type
//! binds one implementation to it. The same caller code runs unchanged on a
//! chip-specific driver or on the host-side simulator.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application / halcyon-drivers          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  halcyon-hal (this crate - contracts)   │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  chip driver  │       │ halcyon-hal-  │
//! │ (embedded-hal)│       │    virtual    │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Contracts
//!
//! - [`bus::BusOps`] / [`bus::Bus`] - Addressable bus (write, read, probe)
//! - [`device::SerialDevice`] / [`device::Device`] - Point-to-point serial device
//! - [`mux::MuxOps`] / [`mux::Mux`] - Channel multiplexer in front of a bus
//! - [`gpio::GpioPort`], [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial communication

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod device;
pub mod error;
pub mod gpio;
pub mod mux;
pub mod uart;

// Re-export key types at crate root for convenience
pub use bus::{Bus, BusOps};
pub use device::{Device, SerialDevice};
pub use error::{HalError, HalResult};
pub use gpio::{Edge, GpioPort, InputPin, OutputPin};
pub use mux::{Mux, MuxChannel, MuxOps};
pub use uart::{UartConfig, UartRx, UartTx};

/// Callback invoked when an asynchronous transfer on a channel completes
///
/// Receives the channel index and the outcome. Runs in the delivery
/// handler's context, so it must return quickly and must not block.
pub type CompletionFn = fn(channel: u8, outcome: HalResult);

/// Callback invoked when edge interrupts fire on a GPIO port
///
/// Receives the port index and the mask of pins that triggered.
pub type EdgeFn = fn(port: u8, pins: u16);
