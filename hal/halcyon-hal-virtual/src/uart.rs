//! Virtual UART
//!
//! Every character travels in its own frame:
//!
//! ```text
//! ┌──────┬────────┬──────┬───────┬──────┬────────┬────────────┐
//! │ BAUD │ PARITY │ STOP │ START │ DATA │ [PAR]  │ STOP × n   │
//! │ tag  │ mode   │ bits │ 0x5A  │ 1B   │ 0 / 1  │ 0xA5       │
//! └──────┴────────┴──────┴───────┴──────┴────────┴────────────┘
//! ```
//!
//! Sending writes all frames in one transport call. Receiving only takes
//! frames while a receive is pending; frames whose settings do not match
//! the channel configuration, or that are malformed, are dropped as line
//! noise without affecting the pending receive.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Duration;
use halcyon_hal::uart::{UartConfig, UartRx, UartTx};
use halcyon_hal::{CompletionFn, HalError, HalResult, SerialDevice};
use halcyon_protocol::uart::{self as frame, FrameHeader, MAX_FRAME_LEN};
use halcyon_protocol::PeripheralKind;
use heapless::Vec;

use crate::channel::{spin_until_settled, Mode, TransferStatus};
use crate::notify::NotifierSlot;
use crate::transport::Transport;
use crate::MAX_TRANSFER;

/// Longest encoded send
const MAX_ENCODED: usize = MAX_TRANSFER * MAX_FRAME_LEN;

#[derive(Debug)]
struct UartChannel {
    status: TransferStatus,
    mode: Mode,
    config: UartConfig,
    rx: Vec<u8, MAX_TRANSFER>,
    remaining: usize,
}

impl UartChannel {
    const fn new() -> Self {
        Self {
            status: TransferStatus::Ready,
            mode: Mode::Blocking,
            config: UartConfig::DEFAULT,
            rx: Vec::new(),
            remaining: 0,
        }
    }
}

/// Bank of virtual UART channels
pub struct VirtualUart<const N: usize = 4> {
    channels: [Mutex<CriticalSectionRawMutex, RefCell<UartChannel>>; N],
    send_done: NotifierSlot<CompletionFn>,
    recv_done: NotifierSlot<CompletionFn>,
}

impl<const N: usize> Default for VirtualUart<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> VirtualUart<N> {
    /// Create a bank with every channel READY at 115200 8N1
    pub const fn new() -> Self {
        Self {
            channels: [const { Mutex::new(RefCell::new(UartChannel::new())) }; N],
            send_done: NotifierSlot::new(),
            recv_done: NotifierSlot::new(),
        }
    }

    fn channel(&self, channel: u8) -> HalResult<&Mutex<CriticalSectionRawMutex, RefCell<UartChannel>>> {
        self.channels.get(channel as usize).ok_or(HalError::Error)
    }

    pub fn len(&self) -> usize {
        N
    }

    pub fn is_empty(&self) -> bool {
        N == 0
    }

    /// Apply line settings to `channel`
    ///
    /// Refused with `Busy` while a receive is pending.
    pub fn configure(&self, channel: u8, config: UartConfig) -> HalResult {
        self.channel(channel)?.lock(|c| {
            let mut ch = c.borrow_mut();
            if ch.status != TransferStatus::Ready {
                return Err(HalError::Busy);
            }
            ch.config = config;
            Ok(())
        })
    }

    /// Current line settings of `channel`
    pub fn config(&self, channel: u8) -> HalResult<UartConfig> {
        Ok(self.channel(channel)?.lock(|c| c.borrow().config))
    }

    pub fn status(&self, channel: u8) -> HalResult<TransferStatus> {
        Ok(self.channel(channel)?.lock(|c| c.borrow().status))
    }

    /// Bytes still wanted by the pending receive
    pub fn remaining(&self, channel: u8) -> HalResult<usize> {
        Ok(self.channel(channel)?.lock(|c| c.borrow().remaining))
    }

    pub fn on_send_complete(&self, callback: CompletionFn) {
        self.send_done.register(callback);
    }

    pub fn on_recv_complete(&self, callback: CompletionFn) {
        self.recv_done.register(callback);
    }

    /// Frame `data` and write it in a single transport call
    ///
    /// Succeeds only if the transport accepts every byte. Sending does not
    /// take part in the channel state machine, so it never reports `Busy`.
    pub fn send<T: Transport + ?Sized>(&self, transport: &T, channel: u8, data: &[u8]) -> HalResult {
        let config = self.config(channel)?;
        if data.len() > MAX_TRANSFER {
            return Err(HalError::Error);
        }

        let frames =
            frame::encode_frames::<MAX_ENCODED>(&config, data).map_err(|_| HalError::Error)?;
        let written = transport.write(PeripheralKind::Uart, channel, &frames);
        if written != frames.len() {
            warn!("uart{}: transport took {} of {} bytes", channel, written, frames.len());
            return Err(HalError::Error);
        }
        trace!("uart{}: sent {} bytes", channel, data.len());
        Ok(())
    }

    /// Send `data` and report the outcome through the send-complete notifier
    pub fn send_it<T: Transport + ?Sized>(&self, transport: &T, channel: u8, data: &[u8]) -> HalResult {
        let outcome = self.send(transport, channel, data);
        if let Some(notify) = self.send_done.get() {
            notify(channel, outcome);
        }
        outcome
    }

    /// Wait until `buf.len()` characters have arrived on `channel`
    pub fn recv(&self, channel: u8, buf: &mut [u8], timeout: Duration) -> HalResult {
        if buf.is_empty() {
            return self.check_ready(channel);
        }
        self.start_recv(channel, buf.len(), Mode::Blocking)?;

        let slot = self.channel(channel)?;
        spin_until_settled(|| slot.lock(|c| c.borrow().status.in_flight()), timeout);

        slot.lock(|c| {
            let mut ch = c.borrow_mut();
            let outcome = match ch.status {
                TransferStatus::FinishedOk => {
                    buf.copy_from_slice(&ch.rx);
                    Ok(())
                }
                TransferStatus::FinishedError => Err(HalError::Error),
                _ => {
                    debug!("uart{}: receive timed out with {} bytes missing", channel, ch.remaining);
                    Err(HalError::Timeout)
                }
            };
            ch.status = TransferStatus::Ready;
            ch.remaining = 0;
            outcome
        })
    }

    /// Start receiving `len` characters and return immediately
    ///
    /// Completion is reported through the receive-complete notifier; a
    /// zero-length receive completes at once.
    pub fn recv_it(&self, channel: u8, len: usize) -> HalResult {
        if len == 0 {
            self.check_ready(channel)?;
            if let Some(notify) = self.recv_done.get() {
                notify(channel, Ok(()));
            }
            return Ok(());
        }
        self.start_recv(channel, len, Mode::Interrupt)
    }

    /// Copy the characters of the last completed receive into `buf`
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

    /// `Busy` unless `channel` has nothing in flight
    fn check_ready(&self, channel: u8) -> HalResult {
        self.channel(channel)?.lock(|c| match c.borrow().status {
            TransferStatus::Ready => Ok(()),
            _ => Err(HalError::Busy),
        })
    }

    fn start_recv(&self, channel: u8, len: usize, mode: Mode) -> HalResult {
        self.channel(channel)?.lock(|c| {
            let mut ch = c.borrow_mut();
            if ch.status != TransferStatus::Ready {
                return Err(HalError::Busy);
            }
            if len > MAX_TRANSFER {
                return Err(HalError::Error);
            }
            ch.rx.clear();
            ch.remaining = len;
            ch.mode = mode;
            ch.status = TransferStatus::Receiving;
            Ok(())
        })
    }

    /// Deliver one inbound frame: its settings `header` and the `body`
    /// that follows it
    pub fn handle_frame(&self, channel: u8, header: FrameHeader, body: &[u8]) {
        let Ok(slot) = self.channel(channel) else {
            debug!("uart: frame for unknown channel {}", channel);
            return;
        };

        let completed = slot.lock(|c| {
            let mut ch = c.borrow_mut();
            if ch.status != TransferStatus::Receiving {
                trace!("uart{}: no receive pending, frame dropped", channel);
                return false;
            }

            let data = match frame::parse_body(&ch.config, header, body) {
                Ok(data) => data,
                Err(_e) => {
                    debug!("uart{}: frame discarded: {}", channel, _e);
                    return false;
                }
            };

            // `remaining` never exceeds the buffer capacity
            let _ = ch.rx.push(data);
            ch.remaining -= 1;
            if ch.remaining > 0 {
                return false;
            }

            ch.status = TransferStatus::FinishedOk;
            if ch.mode == Mode::Interrupt {
                ch.status = TransferStatus::Ready;
                return true;
            }
            false
        });

        if completed {
            if let Some(notify) = self.recv_done.get() {
                notify(channel, Ok(()));
            }
        }
    }
}

/// One virtual UART channel as a serial port
pub struct VirtualUartPort<'a, T: ?Sized, const N: usize> {
    bank: &'a VirtualUart<N>,
    transport: &'a T,
    channel: u8,
    timeout: Duration,
}

impl<'a, T: Transport + ?Sized, const N: usize> VirtualUartPort<'a, T, N> {
    /// Bind `channel` of `bank`; fails if the channel does not exist
    pub fn new(bank: &'a VirtualUart<N>, transport: &'a T, channel: u8, timeout: Duration) -> HalResult<Self> {
        bank.channel(channel)?;
        Ok(Self {
            bank,
            transport,
            channel,
            timeout,
        })
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn configure(&mut self, config: UartConfig) -> HalResult {
        self.bank.configure(self.channel, config)
    }
}

impl<T: Transport + ?Sized, const N: usize> UartTx for VirtualUartPort<'_, T, N> {
    fn write_blocking(&mut self, data: &[u8]) -> HalResult {
        self.bank.send(self.transport, self.channel, data)
    }
}

impl<T: Transport + ?Sized, const N: usize> UartRx for VirtualUartPort<'_, T, N> {
    fn read_blocking(&mut self, buf: &mut [u8]) -> HalResult<usize> {
        self.bank.recv(self.channel, buf, self.timeout)?;
        Ok(buf.len())
    }
}

impl<T: Transport + ?Sized, const N: usize> SerialDevice for VirtualUartPort<'_, T, N> {
    fn write(&mut self, data: &[u8]) -> HalResult {
        self.bank.send(self.transport, self.channel, data)
    }

    fn read(&mut self, buf: &mut [u8]) -> HalResult {
        self.bank.recv(self.channel, buf, self.timeout)
    }

    /// A UART has no way to tell whether anything is listening
    fn test(&mut self) -> HalResult {
        Err(HalError::NotImplemented)
    }
}
