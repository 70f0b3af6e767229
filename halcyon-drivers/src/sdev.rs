//! Serial device over a bus
//!
//! Binds a bus and a fixed endpoint address into a [`SerialDevice`]:
//! `write`, `read` and `test` become bus `write`, `read` and `probe` at
//! that address.

use halcyon_hal::{BusOps, HalError, HalResult, SerialDevice};

/// `ioctl` request: copy the bound address into `arg[0]`
pub const GET_ADDRESS: u32 = 0x01;

/// `ioctl` request: rebind to the 7-bit address in `arg[0]`
pub const SET_ADDRESS: u32 = 0x02;

/// Serial device at a fixed bus address
#[derive(Debug)]
pub struct BusDevice<B> {
    bus: B,
    address: u8,
}

impl<B: BusOps> BusDevice<B> {
    pub const fn new(bus: B, address: u8) -> Self {
        Self { bus, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn bus(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Release the bus
    pub fn into_inner(self) -> B {
        self.bus
    }
}

impl<B: BusOps> SerialDevice for BusDevice<B> {
    fn write(&mut self, data: &[u8]) -> HalResult {
        self.bus.write(self.address, data)
    }

    fn read(&mut self, buf: &mut [u8]) -> HalResult {
        self.bus.read(self.address, buf)
    }

    fn test(&mut self) -> HalResult {
        self.bus.probe(self.address)
    }

    fn ioctl(&mut self, request: u32, arg: &mut [u8]) -> HalResult {
        match request {
            GET_ADDRESS => {
                *arg.first_mut().ok_or(HalError::Error)? = self.address;
                Ok(())
            }
            SET_ADDRESS => match arg.first() {
                Some(&address) if address < 0x80 => {
                    self.address = address;
                    Ok(())
                }
                _ => Err(HalError::Error),
            },
            _ => Err(HalError::NotImplemented),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halcyon_hal::Device;
    use std::vec::Vec;

    /// Bus that records writes and answers reads with the address
    #[derive(Default)]
    struct MockBus {
        writes: Vec<(u8, Vec<u8>)>,
        present: Option<u8>,
    }

    impl BusOps for MockBus {
        fn write(&mut self, address: u8, data: &[u8]) -> HalResult {
            self.writes.push((address, data.to_vec()));
            if self.present == Some(address) {
                Ok(())
            } else {
                Err(HalError::Error)
            }
        }

        fn read(&mut self, address: u8, buf: &mut [u8]) -> HalResult {
            buf.fill(address);
            Ok(())
        }
    }

    #[test]
    fn test_forwards_at_fixed_address() {
        let bus = MockBus {
            present: Some(0x3C),
            ..Default::default()
        };
        let mut dev = Device::open(BusDevice::new(bus, 0x3C));

        assert_eq!(dev.write(&[0x00, 0xAF]), Ok(()));
        let mut buf = [0u8; 2];
        assert_eq!(dev.read(&mut buf), Ok(()));
        assert_eq!(buf, [0x3C, 0x3C]);
        assert_eq!(dev.test(), Ok(()));
        assert_eq!(dev.close(), Ok(()));

        let bus = dev.into_inner().into_inner();
        assert_eq!(bus.writes[0], (0x3C, std::vec![0x00, 0xAF]));
        // Probe is a zero-length write
        assert_eq!(bus.writes[1], (0x3C, Vec::new()));
    }

    #[test]
    fn test_probe_error_passes_through() {
        let mut dev = BusDevice::new(MockBus::default(), 0x50);
        assert_eq!(dev.test(), Err(HalError::Error));
        assert_eq!(dev.bus().writes.len(), halcyon_hal::bus::PROBE_ATTEMPTS);
    }

    #[test]
    fn test_address_ioctl() {
        let mut dev = BusDevice::new(MockBus::default(), 0x50);

        let mut arg = [0u8; 1];
        assert_eq!(dev.ioctl(GET_ADDRESS, &mut arg), Ok(()));
        assert_eq!(arg, [0x50]);

        assert_eq!(dev.ioctl(SET_ADDRESS, &mut [0x51]), Ok(()));
        assert_eq!(dev.address(), 0x51);

        assert_eq!(dev.ioctl(SET_ADDRESS, &mut [0x80]), Err(HalError::Error));
        assert_eq!(dev.ioctl(GET_ADDRESS, &mut []), Err(HalError::Error));
        assert_eq!(dev.ioctl(0x99, &mut arg), Err(HalError::NotImplemented));
        assert_eq!(dev.address(), 0x51);
    }
}
