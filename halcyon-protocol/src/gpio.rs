//! GPIO input change messages
//!
//! Format (5 bytes, 16-bit fields little-endian):
//! - PORT (1 byte): port index
//! - PINS (2 bytes): mask of pins whose input is being driven
//! - VALUES (2 bytes): new input level for those pins

/// Inbound message length
pub const MESSAGE_LEN: usize = 5;

/// Input change driven by the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioMessage {
    pub port: u8,
    pub pins: u16,
    pub values: u16,
}

impl GpioMessage {
    pub fn decode(raw: [u8; MESSAGE_LEN]) -> Self {
        Self {
            port: raw[0],
            pins: u16::from_le_bytes([raw[1], raw[2]]),
            values: u16::from_le_bytes([raw[3], raw[4]]),
        }
    }

    pub fn encode(&self) -> [u8; MESSAGE_LEN] {
        let pins = self.pins.to_le_bytes();
        let values = self.values.to_le_bytes();
        [self.port, pins[0], pins[1], values[0], values[1]]
    }
}
