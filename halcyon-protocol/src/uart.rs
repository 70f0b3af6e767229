//! UART character framing
//!
//! Each UART character travels as one frame:
//! ```text
//! ┌──────┬────────┬──────┬───────┬──────┬────────┬──────────┐
//! │ BAUD │ PARITY │ STOP │ START │ DATA │ PARITY │ STOP × n │
//! │ 1B   │ 1B     │ 1B   │ 1B    │ 1B   │ 0-1B   │ 1-2B     │
//! └──────┴────────┴──────┴───────┴──────┴────────┴──────────┘
//! ```
//! The first three bytes are the settings header: baud-rate tag, parity
//! mode (0 none, 1 odd, 2 even) and stop-bit count. The parity byte, when
//! present, holds the parity bit of DATA (0 or 1).

use halcyon_hal::uart::UartConfig;
use heapless::Vec;

/// Start marker
pub const START: u8 = 0x5A;

/// Stop marker, repeated once per stop bit
pub const STOP: u8 = 0xA5;

/// Length of the settings header
pub const HEADER_LEN: usize = 3;

/// Longest frame with valid settings (parity and two stop bits)
pub const MAX_FRAME_LEN: usize = HEADER_LEN + 1 + 1 + 1 + 2;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Header settings differ from the channel configuration
    SettingsMismatch,
    /// Body length does not match the header
    Incomplete,
    /// START marker missing
    MissingStart,
    /// Parity byte does not match the data
    BadParity,
    /// A STOP position holds something else
    MissingStop,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// Settings header as received
///
/// Kept raw so that headers which do not describe any valid configuration
/// can still be measured and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameHeader {
    pub baud: u8,
    pub parity: u8,
    pub stop_bits: u8,
}

impl FrameHeader {
    /// Header describing `config`
    pub fn from_config(config: &UartConfig) -> Self {
        Self {
            baud: config.baud.tag(),
            parity: config.parity as u8,
            stop_bits: config.stop_bits as u8,
        }
    }

    pub fn decode(raw: [u8; HEADER_LEN]) -> Self {
        Self {
            baud: raw[0],
            parity: raw[1],
            stop_bits: raw[2],
        }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        [self.baud, self.parity, self.stop_bits]
    }

    /// True if the header announces exactly the settings of `config`
    pub fn matches(&self, config: &UartConfig) -> bool {
        *self == Self::from_config(config)
    }

    /// Number of bytes that follow the header
    ///
    /// Any non-zero parity mode is counted as carrying a parity byte.
    pub fn body_len(&self) -> usize {
        2 + usize::from(self.parity != 0) + usize::from(self.stop_bits)
    }
}

/// Full frame length for a channel configured with `config`
pub fn frame_len(config: &UartConfig) -> usize {
    HEADER_LEN + FrameHeader::from_config(config).body_len()
}

/// Encode one character into `buffer`
///
/// Returns the number of bytes written
pub fn encode_frame(config: &UartConfig, data: u8, buffer: &mut [u8]) -> Result<usize, FrameError> {
    let len = frame_len(config);
    if buffer.len() < len {
        return Err(FrameError::BufferTooSmall);
    }

    buffer[..HEADER_LEN].copy_from_slice(&FrameHeader::from_config(config).encode());
    let mut pos = HEADER_LEN;
    buffer[pos] = START;
    buffer[pos + 1] = data;
    pos += 2;

    if let Some(bit) = config.parity.bit(data) {
        buffer[pos] = bit;
        pos += 1;
    }

    for _ in 0..config.stop_bits.count() {
        buffer[pos] = STOP;
        pos += 1;
    }

    Ok(pos)
}

/// Encode a run of characters back to back
pub fn encode_frames<const N: usize>(
    config: &UartConfig,
    data: &[u8],
) -> Result<Vec<u8, N>, FrameError> {
    let mut out = Vec::new();
    let mut frame = [0u8; MAX_FRAME_LEN];
    for &byte in data {
        let len = encode_frame(config, byte, &mut frame)?;
        out.extend_from_slice(&frame[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
    }
    Ok(out)
}

/// Validate a received frame body against the channel configuration
///
/// `body` is everything after the header. Returns the data byte.
pub fn parse_body(config: &UartConfig, header: FrameHeader, body: &[u8]) -> Result<u8, FrameError> {
    if !header.matches(config) {
        return Err(FrameError::SettingsMismatch);
    }

    if body.len() != header.body_len() {
        return Err(FrameError::Incomplete);
    }

    if body[0] != START {
        return Err(FrameError::MissingStart);
    }

    let data = body[1];
    let mut pos = 2;

    if let Some(bit) = config.parity.bit(data) {
        if body[pos] != bit {
            return Err(FrameError::BadParity);
        }
        pos += 1;
    }

    if body[pos..].iter().any(|&b| b != STOP) {
        return Err(FrameError::MissingStop);
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use halcyon_hal::uart::{BaudRate, Parity, StopBits};
    use proptest::prelude::*;

    const EVEN_2: UartConfig = UartConfig {
        baud: BaudRate::B9600,
        parity: Parity::Even,
        stop_bits: StopBits::Two,
    };

    #[test]
    fn test_encode_8n1() {
        let config = UartConfig::default();
        let mut buffer = [0u8; MAX_FRAME_LEN];
        let len = encode_frame(&config, 0x41, &mut buffer).unwrap();

        assert_eq!(len, 6);
        assert_eq!(&buffer[..len], &[4, 0, 1, START, 0x41, STOP]);
    }

    #[test]
    fn test_encode_parity_and_two_stops() {
        let mut buffer = [0u8; MAX_FRAME_LEN];
        let len = encode_frame(&EVEN_2, 0x07, &mut buffer).unwrap();

        assert_eq!(len, MAX_FRAME_LEN);
        assert_eq!(&buffer[..len], &[0, 2, 2, START, 0x07, 1, STOP, STOP]);
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let mut buffer = [0u8; 5];
        let result = encode_frame(&UartConfig::default(), 0, &mut buffer);
        assert_eq!(result, Err(FrameError::BufferTooSmall));
    }

    #[test]
    fn test_encode_frames_concatenates() {
        let config = UartConfig::default();
        let frames: Vec<u8, 32> = encode_frames(&config, &[1, 2, 3]).unwrap();
        assert_eq!(frames.len(), 3 * frame_len(&config));
        assert_eq!(frames[4], 1);
        assert_eq!(frames[10], 2);
        assert_eq!(frames[16], 3);

        let overflow: Result<Vec<u8, 8>, _> = encode_frames(&config, &[1, 2]);
        assert_eq!(overflow, Err(FrameError::BufferTooSmall));
    }

    #[test]
    fn test_parse_rejects_settings_mismatch() {
        let header = FrameHeader::from_config(&UartConfig::default());
        let result = parse_body(&EVEN_2, header, &[START, 0x07, STOP]);
        assert_eq!(result, Err(FrameError::SettingsMismatch));
    }

    #[test]
    fn test_parse_checks_every_stop() {
        let header = FrameHeader::from_config(&EVEN_2);
        let result = parse_body(&EVEN_2, header, &[START, 0x07, 1, STOP, 0x00]);
        assert_eq!(result, Err(FrameError::MissingStop));
    }

    #[test]
    fn test_parse_checks_parity() {
        let header = FrameHeader::from_config(&EVEN_2);
        let result = parse_body(&EVEN_2, header, &[START, 0x07, 0, STOP, STOP]);
        assert_eq!(result, Err(FrameError::BadParity));
    }

    #[test]
    fn test_body_len_of_unknown_header() {
        let header = FrameHeader::decode([9, 7, 3]);
        assert_eq!(header.body_len(), 6);
        assert!(!header.matches(&UartConfig::default()));
    }

    fn any_config() -> impl Strategy<Value = UartConfig> {
        (0u8..8, 0u8..3, 1u8..3).prop_map(|(baud, parity, stop)| UartConfig {
            baud: BaudRate::from_tag(baud).unwrap(),
            parity: Parity::from_u8(parity).unwrap(),
            stop_bits: StopBits::from_u8(stop).unwrap(),
        })
    }

    proptest! {
        #[test]
        fn prop_encoded_frame_parses(config in any_config(), data in any::<u8>()) {
            let mut buffer = [0u8; MAX_FRAME_LEN];
            let len = encode_frame(&config, data, &mut buffer).unwrap();
            let header = FrameHeader::decode([buffer[0], buffer[1], buffer[2]]);

            prop_assert_eq!(len, frame_len(&config));
            prop_assert_eq!(parse_body(&config, header, &buffer[HEADER_LEN..len]), Ok(data));
        }

        #[test]
        fn prop_missing_start_is_rejected(config in any_config(), data in any::<u8>(), start in any::<u8>()) {
            prop_assume!(start != START);
            let mut buffer = [0u8; MAX_FRAME_LEN];
            let len = encode_frame(&config, data, &mut buffer).unwrap();
            buffer[HEADER_LEN] = start;
            let header = FrameHeader::from_config(&config);

            prop_assert_eq!(
                parse_body(&config, header, &buffer[HEADER_LEN..len]),
                Err(FrameError::MissingStart)
            );
        }
    }
}
