//! GPIO pin and port abstractions
//!
//! Provides traits for digital input and output that can be implemented by
//! chip drivers or by the virtual GPIO port. Ports are 16 bits wide; pins
//! are addressed by bit mask.

use crate::error::HalResult;

/// Mask for a single pin of a 16-bit port
///
/// Pins outside `0..16` yield an empty mask.
pub const fn pin_mask(pin: u8) -> u16 {
    if pin < 16 {
        1 << pin
    } else {
        0
    }
}

/// Edge that triggers an interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Low to high transition
    Rising,
    /// High to low transition
    Falling,
}

/// 16-bit GPIO port
pub trait GpioPort {
    /// Read the input register
    fn read(&self) -> HalResult<u16>;

    /// Set the given pins to 1
    fn set(&mut self, pins: u16) -> HalResult;

    /// Set the given pins to 0
    fn clear(&mut self, pins: u16) -> HalResult;

    /// Toggle the given pins
    fn toggle(&mut self, pins: u16) -> HalResult;

    /// Current output register image
    fn output(&self) -> HalResult<u16>;
}

/// Single output line
///
/// Operations fail when the line has gone away, e.g. a pin of a port
/// bank that no longer answers.
pub trait OutputPin {
    /// Drive the line to 1
    fn set_high(&mut self) -> HalResult;

    /// Drive the line to 0
    fn set_low(&mut self) -> HalResult;

    fn toggle(&mut self) -> HalResult;

    /// Drive the line to `high`
    fn set_level(&mut self, high: bool) -> HalResult {
        if high {
            self.set_high()
        } else {
            self.set_low()
        }
    }

    /// Level last driven, read back from the output register
    fn is_set_high(&self) -> HalResult<bool>;
}

/// Single input line
pub trait InputPin {
    fn is_high(&self) -> HalResult<bool>;

    fn is_low(&self) -> HalResult<bool> {
        self.is_high().map(|high| !high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_mask() {
        assert_eq!(pin_mask(0), 0x0001);
        assert_eq!(pin_mask(15), 0x8000);
        assert_eq!(pin_mask(16), 0);
    }

    /// Port backed by plain registers
    #[derive(Default)]
    struct RegPort {
        input: u16,
        output: u16,
    }

    impl GpioPort for RegPort {
        fn read(&self) -> HalResult<u16> {
            Ok(self.input)
        }

        fn set(&mut self, pins: u16) -> HalResult {
            self.output |= pins;
            Ok(())
        }

        fn clear(&mut self, pins: u16) -> HalResult {
            self.output &= !pins;
            Ok(())
        }

        fn toggle(&mut self, pins: u16) -> HalResult {
            self.output ^= pins;
            Ok(())
        }

        fn output(&self) -> HalResult<u16> {
            Ok(self.output)
        }
    }

    struct PortPin<'a> {
        port: &'a mut RegPort,
        mask: u16,
    }

    impl OutputPin for PortPin<'_> {
        fn set_high(&mut self) -> HalResult {
            self.port.set(self.mask)
        }

        fn set_low(&mut self) -> HalResult {
            self.port.clear(self.mask)
        }

        fn toggle(&mut self) -> HalResult {
            self.port.toggle(self.mask)
        }

        fn is_set_high(&self) -> HalResult<bool> {
            Ok(self.port.output()? & self.mask != 0)
        }
    }

    impl InputPin for PortPin<'_> {
        fn is_high(&self) -> HalResult<bool> {
            Ok(self.port.read()? & self.mask != 0)
        }
    }

    #[test]
    fn test_set_level_uses_set_and_clear() {
        let mut port = RegPort::default();
        let mut pin = PortPin {
            port: &mut port,
            mask: pin_mask(3),
        };

        pin.set_level(true).unwrap();
        assert_eq!(pin.is_set_high(), Ok(true));
        pin.set_level(false).unwrap();
        assert_eq!(pin.is_set_high(), Ok(false));
        pin.toggle().unwrap();
        assert_eq!(pin.is_low(), Ok(true));
        assert_eq!(port.output(), Ok(0b1000));
    }
}
