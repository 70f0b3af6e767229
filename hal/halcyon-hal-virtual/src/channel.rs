//! Per-channel transfer status shared by the virtual I2C and UART

use embassy_time::{Duration, Instant};

/// Lifecycle of one transfer
///
/// `Ready → Sending | Receiving → FinishedOk | FinishedError → Ready`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferStatus {
    /// Idle, a new operation may start
    #[default]
    Ready,
    /// Master send in flight
    Sending,
    /// Receive in flight
    Receiving,
    /// Transfer completed, result not yet collected
    FinishedOk,
    /// Transfer aborted, result not yet collected
    FinishedError,
}

impl TransferStatus {
    /// True while bytes are still being exchanged
    pub fn in_flight(self) -> bool {
        matches!(self, TransferStatus::Sending | TransferStatus::Receiving)
    }

    /// True once a transfer has finished, either way
    pub fn is_finished(self) -> bool {
        matches!(self, TransferStatus::FinishedOk | TransferStatus::FinishedError)
    }
}

/// How completion is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// The initiating caller waits and collects the result
    #[default]
    Blocking,
    /// The delivery handler resets the channel and fires the notifier
    Interrupt,
}

/// Spin while `in_flight` holds, at most for `timeout`
///
/// Returns false if the deadline passed first.
pub(crate) fn spin_until_settled(in_flight: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now()
        .checked_add(timeout)
        .unwrap_or(Instant::MAX);

    while in_flight() {
        if Instant::now() >= deadline {
            return false;
        }
        core::hint::spin_loop();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert!(TransferStatus::Sending.in_flight());
        assert!(TransferStatus::Receiving.in_flight());
        assert!(!TransferStatus::Ready.in_flight());
        assert!(TransferStatus::FinishedError.is_finished());
        assert!(!TransferStatus::Sending.is_finished());
    }

    #[test]
    fn test_spin_expires() {
        let start = Instant::now();
        assert!(!spin_until_settled(|| true, Duration::from_millis(5)));
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_spin_returns_when_settled() {
        assert!(spin_until_settled(|| false, Duration::from_millis(0)));
    }
}
