//! I2C bus bytes
//!
//! The virtual I2C master writes START, the addressing byte, data bytes,
//! ACKs (while receiving) and STOP. The peer answers one byte at a time,
//! each wrapped in an [`I2cMessage`].

/// Start condition marker
pub const START: u8 = 0x5A;

/// Stop condition marker
pub const STOP: u8 = 0xA5;

/// Acknowledge; any other byte from the peer is a NACK
pub const ACK: u8 = 0xAA;

/// Highest 7-bit bus address
pub const MAX_ADDRESS: u8 = 0x7F;

/// Inbound message length: channel + bus byte
pub const MESSAGE_LEN: usize = 2;

/// Transfer direction, the R/W bit of the addressing byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Direction {
    Write = 0,
    Read = 1,
}

/// Build the addressing byte for a 7-bit address
///
/// Callers must reject addresses above [`MAX_ADDRESS`] first; the top bit
/// is shifted out.
pub fn address_byte(address: u8, direction: Direction) -> u8 {
    (address << 1) | direction as u8
}

/// Build the two bytes that open a transfer
pub fn start_sequence(address: u8, direction: Direction) -> [u8; 2] {
    [START, address_byte(address, direction)]
}

/// One byte delivered by the peer on an I2C channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cMessage {
    pub channel: u8,
    pub byte: u8,
}

impl I2cMessage {
    pub fn decode(raw: [u8; MESSAGE_LEN]) -> Self {
        Self {
            channel: raw[0],
            byte: raw[1],
        }
    }

    pub fn encode(&self) -> [u8; MESSAGE_LEN] {
        [self.channel, self.byte]
    }

    /// True if the peer acknowledged
    pub fn is_ack(&self) -> bool {
        self.byte == ACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_byte() {
        assert_eq!(address_byte(0x50, Direction::Write), 0xA0);
        assert_eq!(address_byte(0x50, Direction::Read), 0xA1);
        assert_eq!(address_byte(0x7F, Direction::Read), 0xFF);
    }

    #[test]
    fn test_start_sequence() {
        assert_eq!(start_sequence(0x20, Direction::Write), [0x5A, 0x40]);
    }

    #[test]
    fn test_message_ack() {
        let msg = I2cMessage::decode([2, ACK]);
        assert_eq!(msg.channel, 2);
        assert!(msg.is_ack());
        assert!(!I2cMessage::decode([2, 0x55]).is_ack());
    }
}
