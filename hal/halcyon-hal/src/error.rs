//! Status codes shared by every contract
//!
//! Success is `Ok(..)`. Handles never translate or mask an error returned by
//! the implementation they dispatch to.

use core::fmt;

/// Failure outcomes of a HAL operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// Generic failure: protocol NACK, short transport write, bad argument
    Error,
    /// An operation is already in flight on this channel
    Busy,
    /// Operation not ported for this target or device model
    NotImplemented,
    /// A blocking wait expired before the transfer finished
    Timeout,
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HalError::Error => f.write_str("operation failed"),
            HalError::Busy => f.write_str("channel busy"),
            HalError::NotImplemented => f.write_str("operation not implemented"),
            HalError::Timeout => f.write_str("operation timed out"),
        }
    }
}

/// Result of a HAL operation
pub type HalResult<T = ()> = Result<T, HalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_defaults_to_unit() {
        let ok: HalResult = Ok(());
        assert!(ok.is_ok());

        let busy: HalResult<u8> = Err(HalError::Busy);
        assert_eq!(busy, Err(HalError::Busy));
    }
}
