//! I2C multiplexers
//!
//! Both parts answer at `0x70` plus their A2..A0 strap pins and select a
//! channel with a single control byte.

mod pca9548a;
mod tca9544a;

pub use pca9548a::Pca9548a;
pub use tca9544a::Tca9544a;

/// Address with all strap pins low
pub const BASE_ADDRESS: u8 = 0x70;

/// Bus address of a part strapped with A2..A0 = `pins`
pub const fn address(pins: u8) -> u8 {
    BASE_ADDRESS | (pins & 0x07)
}

#[cfg(test)]
mod tests {
    use super::*;
    use halcyon_hal::{BusOps, HalError, HalResult};
    use halcyon_hal_virtual::{Transport, VirtualConfig, VirtualPeripherals};
    use halcyon_protocol::{i2c, PeripheralKind};
    use std::sync::mpsc::{channel, Receiver, Sender};
    use std::sync::Mutex;
    use std::time::Duration;
    use std::vec::Vec;

    #[derive(Default)]
    struct RecordingBus {
        writes: Vec<(u8, Vec<u8>)>,
        fail: bool,
    }

    impl BusOps for RecordingBus {
        fn write(&mut self, address: u8, data: &[u8]) -> HalResult {
            self.writes.push((address, data.to_vec()));
            if self.fail {
                Err(HalError::Error)
            } else {
                Ok(())
            }
        }

        fn read(&mut self, _address: u8, buf: &mut [u8]) -> HalResult {
            buf.fill(0);
            Ok(())
        }
    }

    #[test]
    fn test_addresses() {
        assert_eq!(address(0), 0x70);
        assert_eq!(address(0b101), 0x75);
        assert_eq!(address(0xFF), 0x77);
        assert_eq!(Tca9544a::new(3).address(), 0x73);
        assert_eq!(Pca9548a::new(7).address(), 0x77);
    }

    #[test]
    fn test_tca9544a_control_byte() {
        let mut mux = Tca9544a::open(RecordingBus::default(), 0);
        assert_eq!(mux.output_count(), 4);

        mux.select(2).unwrap();
        mux.select(2).unwrap();
        mux.select(0).unwrap();
        assert_eq!(mux.select(4), Err(HalError::Error));

        let writes = &mux.input_bus().writes;
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0], (0x70, std::vec![0x06]));
        assert_eq!(writes[1], (0x70, std::vec![0x04]));
    }

    #[test]
    fn test_pca9548a_control_byte() {
        let mut mux = Pca9548a::open(RecordingBus::default(), 1);
        assert_eq!(mux.output_count(), 8);

        for ch in [0, 3, 7] {
            mux.select(ch).unwrap();
        }
        let bytes: Vec<_> = mux.input_bus().writes.iter().map(|(a, d)| (*a, d[0])).collect();
        assert_eq!(bytes, [(0x71, 0x01), (0x71, 0x08), (0x71, 0x80)]);
    }

    #[test]
    fn test_failed_select_is_not_cached() {
        let bus = RecordingBus {
            fail: true,
            ..Default::default()
        };
        let mut mux = Tca9544a::open(bus, 0);

        assert_eq!(mux.select(1), Err(HalError::Error));
        assert_eq!(mux.selected(), None);
    }

    #[test]
    fn test_unported_model_reports_not_implemented() {
        struct Unported;
        impl halcyon_hal::MuxOps for Unported {
            fn select_channel(&mut self, _: &mut dyn BusOps, _: u8) -> HalResult {
                Err(HalError::NotImplemented)
            }
        }

        let mut mux = halcyon_hal::Mux::open(RecordingBus::default(), 4, Unported);
        assert_eq!(mux.select(0), Err(HalError::NotImplemented));
    }

    /// I2C peer that acknowledges every address and data byte
    struct AckEverything {
        inbound_tx: Mutex<Sender<u8>>,
        inbound_rx: Mutex<Receiver<u8>>,
        sent: Mutex<Vec<u8>>,
    }

    impl AckEverything {
        fn new() -> Self {
            let (tx, rx) = channel();
            Self {
                inbound_tx: Mutex::new(tx),
                inbound_rx: Mutex::new(rx),
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for AckEverything {
        fn read(&self, buf: &mut [u8]) -> usize {
            let rx = self.inbound_rx.lock().unwrap();
            for (i, slot) in buf.iter_mut().enumerate() {
                match rx.recv_timeout(Duration::from_millis(300)) {
                    Ok(b) => *slot = b,
                    Err(_) => return i,
                }
            }
            buf.len()
        }

        fn write(&self, kind: PeripheralKind, id: u8, data: &[u8]) -> usize {
            self.sent.lock().unwrap().extend_from_slice(data);
            if kind == PeripheralKind::I2c && data != [i2c::STOP] {
                let tx = self.inbound_tx.lock().unwrap();
                for b in [PeripheralKind::I2c.as_u8(), id, i2c::ACK] {
                    tx.send(b).unwrap();
                }
            }
            data.len()
        }
    }

    #[test]
    fn test_mux_channel_over_virtual_bus() {
        let sim: VirtualPeripherals<AckEverything> =
            VirtualPeripherals::new(AckEverything::new(), VirtualConfig::with_timeout_ms(1000));

        std::thread::scope(|s| {
            s.spawn(|| sim.serve());

            let mut mux = Tca9544a::open(sim.i2c_bus(0).unwrap(), 0);
            let mut eeprom = mux.open_channel_as_bus(1).unwrap();
            assert_eq!(eeprom.write(0x50, &[0x11]), Ok(()));
            assert_eq!(eeprom.write(0x50, &[0x22]), Ok(()));
            assert_eq!(mux.selected(), Some(1));
        });

        let sent = sim.transport().sent.lock().unwrap().clone();
        assert_eq!(
            sent,
            [
                // select channel 1 once
                0x5A, 0xE0, 0x05, 0xA5,
                0x5A, 0xA0, 0x11, 0xA5,
                0x5A, 0xA0, 0x22, 0xA5,
            ]
        );
    }
}
