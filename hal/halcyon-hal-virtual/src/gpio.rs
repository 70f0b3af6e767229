//! Virtual GPIO ports and edge interrupts
//!
//! The visualizer drives the input registers with [`GpioMessage`]s. Output
//! operations only touch the local output image.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use halcyon_hal::gpio::{pin_mask, Edge, GpioPort, InputPin, OutputPin};
use halcyon_hal::{EdgeFn, HalError, HalResult};
use halcyon_protocol::GpioMessage;

use crate::notify::NotifierSlot;

#[derive(Debug, Clone, Copy, Default)]
struct PortState {
    input: u16,
    output: u16,
    /// Recorded but not enforced
    direction: u16,
    irq_enable: u16,
    /// 1 = rising, 0 = falling
    irq_edge: u16,
}

impl PortState {
    const fn new() -> Self {
        Self {
            input: 0,
            output: 0,
            direction: 0,
            irq_enable: 0,
            irq_edge: 0,
        }
    }

    /// Apply an input change, returning the pins whose interrupt fired
    fn apply(&mut self, pins: u16, values: u16) -> u16 {
        let changed = (self.input ^ values) & pins;
        let triggers = changed & self.irq_enable & !(values ^ self.irq_edge);

        self.input |= values & pins;
        self.input &= !(!values & pins);
        triggers
    }
}

/// Bank of virtual 16-bit GPIO ports
pub struct VirtualGpio<const N: usize = 8> {
    ports: [Mutex<CriticalSectionRawMutex, RefCell<PortState>>; N],
    edge: NotifierSlot<EdgeFn>,
}

impl<const N: usize> Default for VirtualGpio<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> VirtualGpio<N> {
    pub const fn new() -> Self {
        Self {
            ports: [const { Mutex::new(RefCell::new(PortState::new())) }; N],
            edge: NotifierSlot::new(),
        }
    }

    fn with_port<R>(&self, port: u8, f: impl FnOnce(&mut PortState) -> R) -> HalResult<R> {
        let slot = self.ports.get(port as usize).ok_or(HalError::Error)?;
        Ok(slot.lock(|p| f(&mut p.borrow_mut())))
    }

    pub fn len(&self) -> usize {
        N
    }

    pub fn is_empty(&self) -> bool {
        N == 0
    }

    /// Input register of `port`
    pub fn read(&self, port: u8) -> HalResult<u16> {
        self.with_port(port, |p| p.input)
    }

    /// Output register image of `port`
    pub fn output(&self, port: u8) -> HalResult<u16> {
        self.with_port(port, |p| p.output)
    }

    pub fn set(&self, port: u8, pins: u16) -> HalResult {
        self.with_port(port, |p| p.output |= pins)
    }

    pub fn clear(&self, port: u8, pins: u16) -> HalResult {
        self.with_port(port, |p| p.output &= !pins)
    }

    pub fn toggle(&self, port: u8, pins: u16) -> HalResult {
        self.with_port(port, |p| p.output ^= pins)
    }

    /// Record pin directions (1 = output)
    pub fn set_direction(&self, port: u8, outputs: u16) -> HalResult {
        self.with_port(port, |p| p.direction = outputs)
    }

    pub fn direction(&self, port: u8) -> HalResult<u16> {
        self.with_port(port, |p| p.direction)
    }

    /// Fire the edge notifier when any of `pins` sees `edge`
    pub fn enable_interrupt(&self, port: u8, pins: u16, edge: Edge) -> HalResult {
        self.with_port(port, |p| {
            p.irq_enable |= pins;
            match edge {
                Edge::Rising => p.irq_edge |= pins,
                Edge::Falling => p.irq_edge &= !pins,
            }
        })
    }

    pub fn disable_interrupt(&self, port: u8, pins: u16) -> HalResult {
        self.with_port(port, |p| p.irq_enable &= !pins)
    }

    /// Register the edge notifier, replacing any previous one
    pub fn on_edge(&self, callback: EdgeFn) {
        self.edge.register(callback);
    }

    /// Apply an inbound input change
    ///
    /// Returns the mask of pins whose interrupt fired; the edge notifier
    /// has already been called with it when non-zero. Messages for unknown
    /// ports are ignored.
    pub fn handle_message(&self, msg: GpioMessage) -> u16 {
        let Ok(triggers) = self.with_port(msg.port, |p| p.apply(msg.pins, msg.values)) else {
            debug!("gpio: message for unknown port {}", msg.port);
            return 0;
        };

        if triggers != 0 {
            trace!("gpio{}: edge on {=u16:#x}", msg.port, triggers);
            if let Some(notify) = self.edge.get() {
                notify(msg.port, triggers);
            }
        }
        triggers
    }
}

/// One virtual GPIO port
pub struct VirtualGpioPort<'a, const N: usize> {
    bank: &'a VirtualGpio<N>,
    port: u8,
}

impl<'a, const N: usize> VirtualGpioPort<'a, N> {
    /// Bind `port` of `bank`; fails if the port does not exist
    pub fn new(bank: &'a VirtualGpio<N>, port: u8) -> HalResult<Self> {
        bank.read(port)?;
        Ok(Self { bank, port })
    }

    pub fn port(&self) -> u8 {
        self.port
    }

    /// Single pin of this port
    pub fn pin(&self, pin: u8) -> HalResult<VirtualPin<'a, N>> {
        match pin_mask(pin) {
            0 => Err(HalError::Error),
            mask => Ok(VirtualPin {
                bank: self.bank,
                port: self.port,
                mask,
            }),
        }
    }
}

impl<const N: usize> GpioPort for VirtualGpioPort<'_, N> {
    fn read(&self) -> HalResult<u16> {
        self.bank.read(self.port)
    }

    fn set(&mut self, pins: u16) -> HalResult {
        self.bank.set(self.port, pins)
    }

    fn clear(&mut self, pins: u16) -> HalResult {
        self.bank.clear(self.port, pins)
    }

    fn toggle(&mut self, pins: u16) -> HalResult {
        self.bank.toggle(self.port, pins)
    }

    fn output(&self) -> HalResult<u16> {
        self.bank.output(self.port)
    }
}

/// One pin of a virtual GPIO port
pub struct VirtualPin<'a, const N: usize> {
    bank: &'a VirtualGpio<N>,
    port: u8,
    mask: u16,
}

impl<const N: usize> OutputPin for VirtualPin<'_, N> {
    fn set_high(&mut self) -> HalResult {
        self.bank.set(self.port, self.mask)
    }

    fn set_low(&mut self) -> HalResult {
        self.bank.clear(self.port, self.mask)
    }

    fn toggle(&mut self) -> HalResult {
        self.bank.toggle(self.port, self.mask)
    }

    fn is_set_high(&self) -> HalResult<bool> {
        Ok(self.bank.output(self.port)? & self.mask != 0)
    }
}

impl<const N: usize> InputPin for VirtualPin<'_, N> {
    fn is_high(&self) -> HalResult<bool> {
        Ok(self.bank.read(self.port)? & self.mask != 0)
    }
}
