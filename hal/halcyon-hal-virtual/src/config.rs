//! Simulator configuration

use embassy_time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use halcyon_hal::bus::PROBE_ATTEMPTS;

/// Settings applied to the handles a [`VirtualPeripherals`] hands out
///
/// [`VirtualPeripherals`]: crate::VirtualPeripherals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VirtualConfig {
    /// Upper bound on every blocking transfer, in milliseconds
    pub timeout_ms: u32,
    /// Zero-length writes attempted by a bus probe
    pub probe_attempts: u8,
}

impl VirtualConfig {
    /// 100 ms per transfer, three probe attempts
    pub const DEFAULT: Self = Self {
        timeout_ms: 100,
        probe_attempts: PROBE_ATTEMPTS as u8,
    };

    /// Create a config with the given blocking timeout
    pub const fn with_timeout_ms(timeout_ms: u32) -> Self {
        Self {
            timeout_ms,
            ..Self::DEFAULT
        }
    }

    /// Blocking timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }
}

impl Default for VirtualConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
