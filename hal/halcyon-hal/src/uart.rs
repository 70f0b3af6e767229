//! Serial port contracts
//!
//! Provides blocking serial traits and the line settings shared by real
//! UART drivers and the virtual UART.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::HalResult;

/// Sending half of a serial port
pub trait UartTx {
    /// Queue `data` for transmission
    ///
    /// Returns once every byte has been handed to the line.
    fn write_blocking(&mut self, data: &[u8]) -> HalResult;

    /// Wait until queued bytes have left the port
    fn flush(&mut self) -> HalResult {
        Ok(())
    }
}

/// Receiving half of a serial port
pub trait UartRx {
    /// Fill `buf` with received characters
    ///
    /// Returns the number of characters stored.
    fn read_blocking(&mut self, buf: &mut [u8]) -> HalResult<usize>;

    fn read_byte(&mut self) -> HalResult<u8> {
        let mut byte = [0u8];
        self.read_blocking(&mut byte)?;
        Ok(byte[0])
    }
}

/// UART line settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UartConfig {
    /// Baud rate
    pub baud: BaudRate,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl UartConfig {
    /// 115200 baud, no parity, one stop bit
    pub const DEFAULT: Self = Self {
        baud: BaudRate::B115200,
        parity: Parity::None,
        stop_bits: StopBits::One,
    };
}

/// Supported baud rates
///
/// The discriminant is the tag used on the simulator link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum BaudRate {
    B9600 = 0,
    B19200 = 1,
    B38400 = 2,
    B57600 = 3,
    #[default]
    B115200 = 4,
    B230400 = 5,
    B460800 = 6,
    B921600 = 7,
}

impl BaudRate {
    /// Get the link tag
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Look up a rate by link tag
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(BaudRate::B9600),
            1 => Some(BaudRate::B19200),
            2 => Some(BaudRate::B38400),
            3 => Some(BaudRate::B57600),
            4 => Some(BaudRate::B115200),
            5 => Some(BaudRate::B230400),
            6 => Some(BaudRate::B460800),
            7 => Some(BaudRate::B921600),
            _ => None,
        }
    }

    /// Bits per second
    pub fn bps(self) -> u32 {
        match self {
            BaudRate::B9600 => 9_600,
            BaudRate::B19200 => 19_200,
            BaudRate::B38400 => 38_400,
            BaudRate::B57600 => 57_600,
            BaudRate::B115200 => 115_200,
            BaudRate::B230400 => 230_400,
            BaudRate::B460800 => 460_800,
            BaudRate::B921600 => 921_600,
        }
    }

    /// Look up a rate by bits per second
    pub fn from_bps(bps: u32) -> Option<Self> {
        (0..=7)
            .filter_map(Self::from_tag)
            .find(|rate| rate.bps() == bps)
    }
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Parity {
    #[default]
    None = 0,
    Odd = 1,
    Even = 2,
}

impl Parity {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Parity::None),
            1 => Some(Parity::Odd),
            2 => Some(Parity::Even),
            _ => None,
        }
    }

    /// Parity bit that accompanies `data`, `None` when parity is disabled
    pub fn bit(self, data: u8) -> Option<u8> {
        let odd_ones = (data.count_ones() & 1) as u8;
        match self {
            Parity::None => None,
            Parity::Even => Some(odd_ones),
            Parity::Odd => Some(odd_ones ^ 1),
        }
    }
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum StopBits {
    #[default]
    One = 1,
    Two = 2,
}

impl StopBits {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(StopBits::One),
            2 => Some(StopBits::Two),
            _ => None,
        }
    }

    pub fn count(self) -> usize {
        self as usize
    }
}
