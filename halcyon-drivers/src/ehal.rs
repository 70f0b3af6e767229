//! `embedded-hal` I2C bridges
//!
//! [`EmbeddedHalBus`] puts any `embedded_hal::i2c::I2c` driver behind
//! [`BusOps`], so silicon I2C peripherals can back the contracts.
//! [`HalI2c`] goes the other way and lets ecosystem device drivers run on
//! any [`BusOps`] implementation, the virtual buses included.

use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use halcyon_hal::{BusOps, HalError, HalResult};
use heapless::Vec;

/// Longest run of adjacent operations [`HalI2c`] merges into one transfer
pub const MAX_MERGED: usize = 64;

/// `embedded-hal` driver as a bus
#[derive(Debug)]
pub struct EmbeddedHalBus<I> {
    i2c: I,
}

impl<I: I2c> EmbeddedHalBus<I> {
    pub const fn new(i2c: I) -> Self {
        Self { i2c }
    }

    pub fn into_inner(self) -> I {
        self.i2c
    }
}

impl<I: I2c> BusOps for EmbeddedHalBus<I> {
    fn write(&mut self, address: u8, data: &[u8]) -> HalResult {
        self.i2c.write(address, data).map_err(|_| HalError::Error)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> HalResult {
        self.i2c.read(address, buf).map_err(|_| HalError::Error)
    }
}

/// [`HalError`] as an `embedded-hal` I2C error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusError(pub HalError);

impl From<HalError> for BusError {
    fn from(e: HalError) -> Self {
        BusError(e)
    }
}

impl i2c::Error for BusError {
    fn kind(&self) -> ErrorKind {
        match self.0 {
            HalError::Error => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            HalError::Busy => ErrorKind::Bus,
            HalError::NotImplemented | HalError::Timeout => ErrorKind::Other,
        }
    }
}

/// Bus as an `embedded-hal` I2C driver
///
/// The contracts have no repeated start, so a transaction becomes one bus
/// transfer per run of adjacent operations of the same direction. Runs of
/// more than one operation are merged through a [`MAX_MERGED`] byte buffer.
#[derive(Debug)]
pub struct HalI2c<B> {
    bus: B,
}

impl<B: BusOps> HalI2c<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_inner(self) -> B {
        self.bus
    }

    fn write_run(&mut self, address: u8, run: &[Operation<'_>]) -> Result<(), BusError> {
        if let [Operation::Write(data)] = run {
            return Ok(self.bus.write(address, data)?);
        }

        let mut merged: Vec<u8, MAX_MERGED> = Vec::new();
        for op in run {
            if let Operation::Write(data) = op {
                merged.extend_from_slice(data).map_err(|_| BusError(HalError::Error))?;
            }
        }
        Ok(self.bus.write(address, &merged)?)
    }

    fn read_run(&mut self, address: u8, run: &mut [Operation<'_>]) -> Result<(), BusError> {
        if let [Operation::Read(buf)] = run {
            return Ok(self.bus.read(address, buf)?);
        }

        let total: usize = run
            .iter()
            .map(|op| match op {
                Operation::Read(buf) => buf.len(),
                Operation::Write(_) => 0,
            })
            .sum();
        if total > MAX_MERGED {
            return Err(BusError(HalError::Error));
        }

        let mut merged = [0u8; MAX_MERGED];
        self.bus.read(address, &mut merged[..total])?;

        let mut pos = 0;
        for op in run {
            if let Operation::Read(buf) = op {
                let end = pos + buf.len();
                buf.copy_from_slice(&merged[pos..end]);
                pos = end;
            }
        }
        Ok(())
    }
}

impl<B> ErrorType for HalI2c<B> {
    type Error = BusError;
}

impl<B: BusOps> I2c for HalI2c<B> {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        let mut start = 0;
        while start < operations.len() {
            let is_write = matches!(operations[start], Operation::Write(_));
            let len = operations[start..]
                .iter()
                .take_while(|op| matches!(op, Operation::Write(_)) == is_write)
                .count();

            let run = &mut operations[start..start + len];
            if is_write {
                self.write_run(address, run)?;
            } else {
                self.read_run(address, run)?;
            }
            start += len;
        }
        Ok(())
    }
}
