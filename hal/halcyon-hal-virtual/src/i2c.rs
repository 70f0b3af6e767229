//! Virtual I2C master
//!
//! Reproduces master-mode I2C framing over the transport. A transfer is
//! opened by the caller writing START and the addressing byte; from then on
//! it is driven by [`VirtualI2c::handle_byte`], called once per byte the
//! peer delivers.
//!
//! # Send
//!
//! ```text
//! master: START ADDR|W       D0        D1   ...   Dn-1       STOP
//! peer:              ACK         ACK        ACK         ACK
//! ```
//! Any non-ACK from the peer writes STOP and aborts the transfer.
//!
//! # Receive
//!
//! ```text
//! master: START ADDR|R       ACK       ACK  ...        STOP
//! peer:              ACK  D0       D1        ...  Dn-1
//! ```
//! Only the addressing acknowledge can abort a receive.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Duration;
use halcyon_hal::{BusOps, CompletionFn, HalError, HalResult};
use halcyon_protocol::i2c::{self, Direction};
use halcyon_protocol::PeripheralKind;
use heapless::Vec;

use crate::channel::{spin_until_settled, Mode, TransferStatus};
use crate::config::VirtualConfig;
use crate::notify::NotifierSlot;
use crate::transport::Transport;
use crate::MAX_TRANSFER;

/// State of one virtual I2C channel
#[derive(Debug)]
struct I2cChannel {
    status: TransferStatus,
    mode: Mode,
    /// Data to send; `tx_pos` is the transmit cursor
    tx: Vec<u8, MAX_TRANSFER>,
    tx_pos: usize,
    /// Data received so far; its length is the receive cursor
    rx: Vec<u8, MAX_TRANSFER>,
    /// Bytes still to send or receive
    remaining: usize,
    /// Receive is waiting for the addressing acknowledge
    wait_ack: bool,
}

impl I2cChannel {
    const fn new() -> Self {
        Self {
            status: TransferStatus::Ready,
            mode: Mode::Blocking,
            tx: Vec::new(),
            tx_pos: 0,
            rx: Vec::new(),
            remaining: 0,
            wait_ack: false,
        }
    }

    /// Write STOP and settle the transfer
    fn stop<T: Transport + ?Sized>(&mut self, transport: &T, channel: u8, ok: bool) {
        let stopped = transport.write_byte(PeripheralKind::I2c, channel, i2c::STOP);
        self.status = if ok && stopped {
            TransferStatus::FinishedOk
        } else {
            TransferStatus::FinishedError
        };
    }

    fn on_send_byte<T: Transport + ?Sized>(&mut self, transport: &T, channel: u8, byte: u8) {
        if byte != i2c::ACK {
            debug!("i2c{}: NACK after {} bytes", channel, self.tx_pos);
            self.stop(transport, channel, false);
            return;
        }

        if self.remaining == 0 {
            self.stop(transport, channel, true);
            return;
        }

        let next = self.tx[self.tx_pos];
        if !transport.write_byte(PeripheralKind::I2c, channel, next) {
            warn!("i2c{}: transport rejected data byte", channel);
            self.stop(transport, channel, false);
            return;
        }
        self.tx_pos += 1;
        self.remaining -= 1;
    }

    fn on_recv_byte<T: Transport + ?Sized>(&mut self, transport: &T, channel: u8, byte: u8) {
        if self.wait_ack {
            if byte != i2c::ACK {
                debug!("i2c{}: address not acknowledged", channel);
                self.stop(transport, channel, false);
                return;
            }
            self.wait_ack = false;
            if self.remaining == 0 {
                self.stop(transport, channel, true);
            }
            return;
        }

        // `remaining` never exceeds the buffer capacity
        let _ = self.rx.push(byte);
        self.remaining -= 1;

        if self.remaining == 0 {
            self.stop(transport, channel, true);
        } else if !transport.write_byte(PeripheralKind::I2c, channel, i2c::ACK) {
            warn!("i2c{}: transport rejected ACK", channel);
            self.stop(transport, channel, false);
        }
    }
}

/// Bank of virtual I2C channels
///
/// Place it in a `static` or construct it once at startup; channel states
/// live for the whole program.
pub struct VirtualI2c<const N: usize = 4> {
    channels: [Mutex<CriticalSectionRawMutex, RefCell<I2cChannel>>; N],
    send_done: NotifierSlot<CompletionFn>,
    recv_done: NotifierSlot<CompletionFn>,
}

impl<const N: usize> Default for VirtualI2c<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> VirtualI2c<N> {
    /// Create a bank with every channel READY
    pub const fn new() -> Self {
        Self {
            channels: [const { Mutex::new(RefCell::new(I2cChannel::new())) }; N],
            send_done: NotifierSlot::new(),
            recv_done: NotifierSlot::new(),
        }
    }

    fn channel(&self, channel: u8) -> HalResult<&Mutex<CriticalSectionRawMutex, RefCell<I2cChannel>>> {
        self.channels.get(channel as usize).ok_or(HalError::Error)
    }

    /// Number of channels in the bank
    pub fn len(&self) -> usize {
        N
    }

    pub fn is_empty(&self) -> bool {
        N == 0
    }

    /// Current status of `channel`
    pub fn status(&self, channel: u8) -> HalResult<TransferStatus> {
        Ok(self.channel(channel)?.lock(|c| c.borrow().status))
    }

    /// Register the send-complete notifier (interrupt mode)
    pub fn on_send_complete(&self, callback: CompletionFn) {
        self.send_done.register(callback);
    }

    /// Register the receive-complete notifier (interrupt mode)
    pub fn on_recv_complete(&self, callback: CompletionFn) {
        self.recv_done.register(callback);
    }

    /// Send `data` to `address` and wait for the outcome
    ///
    /// # Returns
    /// * `Err(Busy)` if a transfer is already in flight (nothing changes)
    /// * `Err(Error)` on NACK, transport failure or oversized `data`
    /// * `Err(Timeout)` if `timeout` expired; the channel is READY again
    pub fn master_send<T: Transport + ?Sized>(
        &self,
        transport: &T,
        channel: u8,
        address: u8,
        data: &[u8],
        timeout: Duration,
    ) -> HalResult {
        self.start_send(transport, channel, address, data, Mode::Blocking)?;
        self.collect(channel, timeout, None)
    }

    /// Receive `buf.len()` bytes from `address` and wait for the outcome
    ///
    /// `buf` is only written when the transfer succeeds.
    pub fn master_recv<T: Transport + ?Sized>(
        &self,
        transport: &T,
        channel: u8,
        address: u8,
        buf: &mut [u8],
        timeout: Duration,
    ) -> HalResult {
        self.start_recv(transport, channel, address, buf.len(), Mode::Blocking)?;
        self.collect(channel, timeout, Some(buf))
    }

    /// Start sending `data` to `address` and return immediately
    ///
    /// The outcome is delivered through the send-complete notifier.
    pub fn master_send_it<T: Transport + ?Sized>(
        &self,
        transport: &T,
        channel: u8,
        address: u8,
        data: &[u8],
    ) -> HalResult {
        self.start_send(transport, channel, address, data, Mode::Interrupt)
    }

    /// Start receiving `len` bytes from `address` and return immediately
    ///
    /// The outcome is delivered through the receive-complete notifier; the
    /// data can then be fetched with [`read_received`](Self::read_received).
    pub fn master_recv_it<T: Transport + ?Sized>(
        &self,
        transport: &T,
        channel: u8,
        address: u8,
        len: usize,
    ) -> HalResult {
        self.start_recv(transport, channel, address, len, Mode::Interrupt)
    }

    /// Copy the data of the last receive into `buf`
    ///
    /// Returns the number of bytes copied.
    pub fn read_received(&self, channel: u8, buf: &mut [u8]) -> HalResult<usize> {
        self.channel(channel)?.lock(|c| {
            let ch = c.borrow();
            if ch.status.in_flight() {
                return Err(HalError::Busy);
            }
            let n = buf.len().min(ch.rx.len());
            buf[..n].copy_from_slice(&ch.rx[..n]);
            Ok(n)
        })
    }

    fn start_send<T: Transport + ?Sized>(
        &self,
        transport: &T,
        channel: u8,
        address: u8,
        data: &[u8],
        mode: Mode,
    ) -> HalResult {
        let slot = self.channel(channel)?;
        if address > i2c::MAX_ADDRESS {
            debug!("i2c{}: address {=u8:#x} is not 7-bit", channel, address);
            return Err(HalError::Error);
        }
        slot.lock(|c| {
            let mut ch = c.borrow_mut();
            if ch.status != TransferStatus::Ready {
                return Err(HalError::Busy);
            }
            ch.tx.clear();
            ch.tx.extend_from_slice(data).map_err(|_| HalError::Error)?;
            ch.tx_pos = 0;
            ch.remaining = data.len();
            ch.wait_ack = false;
            ch.mode = mode;
            ch.status = TransferStatus::Sending;
            Ok(())
        })?;

        trace!("i2c{}: send {} bytes to {=u8:#x}", channel, data.len(), address);
        self.open_transfer(transport, slot, channel, address, Direction::Write)
    }

    fn start_recv<T: Transport + ?Sized>(
        &self,
        transport: &T,
        channel: u8,
        address: u8,
        len: usize,
        mode: Mode,
    ) -> HalResult {
        let slot = self.channel(channel)?;
        if address > i2c::MAX_ADDRESS {
            debug!("i2c{}: address {=u8:#x} is not 7-bit", channel, address);
            return Err(HalError::Error);
        }
        slot.lock(|c| {
            let mut ch = c.borrow_mut();
            if ch.status != TransferStatus::Ready {
                return Err(HalError::Busy);
            }
            if len > MAX_TRANSFER {
                return Err(HalError::Error);
            }
            ch.rx.clear();
            ch.remaining = len;
            ch.wait_ack = true;
            ch.mode = mode;
            ch.status = TransferStatus::Receiving;
            Ok(())
        })?;

        trace!("i2c{}: receive {} bytes from {=u8:#x}", channel, len, address);
        self.open_transfer(transport, slot, channel, address, Direction::Read)
    }

    /// Write START and the addressing byte; undo the state change on failure
    fn open_transfer<T: Transport + ?Sized>(
        &self,
        transport: &T,
        slot: &Mutex<CriticalSectionRawMutex, RefCell<I2cChannel>>,
        channel: u8,
        address: u8,
        direction: Direction,
    ) -> HalResult {
        let start = i2c::start_sequence(address, direction);
        if transport.write(PeripheralKind::I2c, channel, &start) != start.len() {
            warn!("i2c{}: transport rejected START", channel);
            slot.lock(|c| c.borrow_mut().status = TransferStatus::Ready);
            return Err(HalError::Error);
        }
        Ok(())
    }

    /// Wait for a blocking transfer, then collect its outcome and reset
    fn collect(&self, channel: u8, timeout: Duration, out: Option<&mut [u8]>) -> HalResult {
        let slot = self.channel(channel)?;
        spin_until_settled(|| slot.lock(|c| c.borrow().status.in_flight()), timeout);

        slot.lock(|c| {
            let mut ch = c.borrow_mut();
            let outcome = match ch.status {
                TransferStatus::FinishedOk => Ok(()),
                TransferStatus::FinishedError => Err(HalError::Error),
                _ => {
                    warn!("i2c{}: transfer timed out", channel);
                    Err(HalError::Timeout)
                }
            };
            if let (Ok(()), Some(buf)) = (outcome, out) {
                let n = buf.len().min(ch.rx.len());
                buf[..n].copy_from_slice(&ch.rx[..n]);
            }
            ch.status = TransferStatus::Ready;
            outcome
        })
    }

    /// Deliver one byte received from the peer on `channel`
    ///
    /// Bytes for unknown channels or for channels with nothing in flight
    /// are ignored.
    pub fn handle_byte<T: Transport + ?Sized>(&self, transport: &T, channel: u8, byte: u8) {
        let Ok(slot) = self.channel(channel) else {
            debug!("i2c: byte for unknown channel {}", channel);
            return;
        };

        let completion = slot.lock(|c| {
            let mut ch = c.borrow_mut();
            let direction = match ch.status {
                TransferStatus::Sending => {
                    ch.on_send_byte(transport, channel, byte);
                    Direction::Write
                }
                TransferStatus::Receiving => {
                    ch.on_recv_byte(transport, channel, byte);
                    Direction::Read
                }
                _ => {
                    trace!("i2c{}: stray byte {=u8:#x}", channel, byte);
                    return None;
                }
            };

            if ch.mode == Mode::Interrupt && ch.status.is_finished() {
                let outcome = if ch.status == TransferStatus::FinishedOk {
                    Ok(())
                } else {
                    Err(HalError::Error)
                };
                ch.status = TransferStatus::Ready;
                return Some((direction, outcome));
            }
            None
        });

        match completion {
            Some((Direction::Write, outcome)) => {
                if let Some(notify) = self.send_done.get() {
                    notify(channel, outcome);
                }
            }
            Some((Direction::Read, outcome)) => {
                if let Some(notify) = self.recv_done.get() {
                    notify(channel, outcome);
                }
            }
            None => {}
        }
    }
}

/// One virtual I2C channel as a bus
///
/// Transfers block for at most the configured timeout each.
pub struct VirtualI2cBus<'a, T: ?Sized, const N: usize> {
    bank: &'a VirtualI2c<N>,
    transport: &'a T,
    channel: u8,
    config: VirtualConfig,
}

impl<'a, T: Transport + ?Sized, const N: usize> VirtualI2cBus<'a, T, N> {
    /// Bind `channel` of `bank`; fails if the channel does not exist
    pub fn new(
        bank: &'a VirtualI2c<N>,
        transport: &'a T,
        channel: u8,
        config: VirtualConfig,
    ) -> HalResult<Self> {
        bank.channel(channel)?;
        Ok(Self {
            bank,
            transport,
            channel,
            config,
        })
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn config(&self) -> &VirtualConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: VirtualConfig) {
        self.config = config;
    }
}

impl<T: Transport + ?Sized, const N: usize> BusOps for VirtualI2cBus<'_, T, N> {
    fn write(&mut self, address: u8, data: &[u8]) -> HalResult {
        self.bank
            .master_send(self.transport, self.channel, address, data, self.config.timeout())
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> HalResult {
        self.bank
            .master_recv(self.transport, self.channel, address, buf, self.config.timeout())
    }

    fn probe(&mut self, address: u8) -> HalResult {
        let mut outcome = Err(HalError::Error);
        for _ in 0..self.config.probe_attempts.max(1) {
            outcome = self.write(address, &[]);
            if outcome.is_ok() {
                break;
            }
        }
        outcome
    }
}
