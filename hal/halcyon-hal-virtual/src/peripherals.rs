//! Peripheral registry and inbound dispatch
//!
//! [`VirtualPeripherals`] owns the transport and one bank per peripheral
//! kind. It is built once at startup, usually in a `static`, and shared by
//! reference between application code and the thread running
//! [`serve`](VirtualPeripherals::serve).

use halcyon_hal::{HalError, HalResult};
use halcyon_protocol::uart::{FrameHeader, HEADER_LEN};
use halcyon_protocol::{gpio, i2c, GpioMessage, I2cMessage, PeripheralKind};

use crate::config::VirtualConfig;
use crate::gpio::{VirtualGpio, VirtualGpioPort};
use crate::i2c::{VirtualI2c, VirtualI2cBus};
use crate::transport::{read_exact, Transport};
use crate::uart::{VirtualUart, VirtualUartPort};

/// Largest UART frame body a header can announce
const MAX_BODY: usize = 2 + 1 + u8::MAX as usize;

/// Transport plus every virtual peripheral bank
pub struct VirtualPeripherals<T, const I2C: usize = 4, const UART: usize = 4, const GPIO: usize = 8> {
    transport: T,
    config: VirtualConfig,
    i2c: VirtualI2c<I2C>,
    uart: VirtualUart<UART>,
    gpio: VirtualGpio<GPIO>,
}

impl<T: Transport, const I2C: usize, const UART: usize, const GPIO: usize>
    VirtualPeripherals<T, I2C, UART, GPIO>
{
    pub const fn new(transport: T, config: VirtualConfig) -> Self {
        Self {
            transport,
            config,
            i2c: VirtualI2c::new(),
            uart: VirtualUart::new(),
            gpio: VirtualGpio::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &VirtualConfig {
        &self.config
    }

    pub fn i2c(&self) -> &VirtualI2c<I2C> {
        &self.i2c
    }

    pub fn uart(&self) -> &VirtualUart<UART> {
        &self.uart
    }

    pub fn gpio(&self) -> &VirtualGpio<GPIO> {
        &self.gpio
    }

    /// I2C `channel` as a bus, using the registry configuration
    pub fn i2c_bus(&self, channel: u8) -> HalResult<VirtualI2cBus<'_, T, I2C>> {
        VirtualI2cBus::new(&self.i2c, &self.transport, channel, self.config)
    }

    /// UART `channel` as a serial port
    pub fn uart_port(&self, channel: u8) -> HalResult<VirtualUartPort<'_, T, UART>> {
        VirtualUartPort::new(&self.uart, &self.transport, channel, self.config.timeout())
    }

    pub fn gpio_port(&self, port: u8) -> HalResult<VirtualGpioPort<'_, GPIO>> {
        VirtualGpioPort::new(&self.gpio, port)
    }

    /// Read one inbound message and route it to its bank
    ///
    /// Returns the kind of the message handled.
    ///
    /// # Errors
    /// * `Error` if the link closed before a whole message arrived
    /// * `NotImplemented` for timer messages and unknown kinds; the rest of
    ///   the stream can no longer be framed reliably
    pub fn poll(&self) -> HalResult<PeripheralKind> {
        let mut kind = [0u8; 1];
        self.read(&mut kind)?;

        let Some(kind) = PeripheralKind::from_u8(kind[0]) else {
            warn!("link: unknown peripheral kind {}", kind[0]);
            return Err(HalError::NotImplemented);
        };

        match kind {
            PeripheralKind::I2c => {
                let mut raw = [0u8; i2c::MESSAGE_LEN];
                self.read(&mut raw)?;
                let msg = I2cMessage::decode(raw);
                self.i2c.handle_byte(&self.transport, msg.channel, msg.byte);
            }
            PeripheralKind::Uart => {
                let mut head = [0u8; 1 + HEADER_LEN];
                self.read(&mut head)?;
                let header = FrameHeader::decode([head[1], head[2], head[3]]);

                let mut body = [0u8; MAX_BODY];
                let body = &mut body[..header.body_len()];
                self.read(body)?;
                self.uart.handle_frame(head[0], header, body);
            }
            PeripheralKind::Gpio => {
                let mut raw = [0u8; gpio::MESSAGE_LEN];
                self.read(&mut raw)?;
                self.gpio.handle_message(GpioMessage::decode(raw));
            }
            PeripheralKind::Timer => {
                warn!("link: timer messages are not supported");
                return Err(HalError::NotImplemented);
            }
        }
        Ok(kind)
    }

    /// Dispatch inbound messages until the link fails
    ///
    /// Returns the error that stopped the loop.
    pub fn serve(&self) -> HalError {
        loop {
            if let Err(e) = self.poll() {
                debug!("link: dispatcher stopped: {}", e);
                return e;
            }
        }
    }

    fn read(&self, buf: &mut [u8]) -> HalResult {
        if read_exact(&self.transport, buf) {
            Ok(())
        } else {
            Err(HalError::Error)
        }
    }
}
