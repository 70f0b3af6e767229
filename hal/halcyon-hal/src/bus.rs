//! Addressable bus abstractions
//!
//! Provides the master-side bus contract (I2C-style addressing) that can be
//! implemented by chip drivers or by the virtual peripheral simulator.

use crate::error::{HalError, HalResult};

/// Number of zero-length writes a default [`BusOps::probe`] attempts
pub const PROBE_ATTEMPTS: usize = 3;

/// Bus master operations
///
/// Provides basic read/write operations for communicating with endpoints
/// identified by a 7-bit address.
pub trait BusOps {
    /// Write data to the endpoint at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit endpoint address
    /// * `data` - Bytes to write (may be empty)
    fn write(&mut self, address: u8, data: &[u8]) -> HalResult;

    /// Read data from the endpoint at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit endpoint address
    /// * `buf` - Buffer to fill completely
    fn read(&mut self, address: u8, buf: &mut [u8]) -> HalResult;

    /// Check that an endpoint acknowledges its address
    ///
    /// Logically "write zero bytes, expect acknowledge". Succeeds on the first
    /// acknowledged attempt; otherwise the last error is returned unchanged.
    fn probe(&mut self, address: u8) -> HalResult {
        let mut outcome = Err(HalError::Error);
        for _ in 0..PROBE_ATTEMPTS {
            outcome = self.write(address, &[]);
            if outcome.is_ok() {
                break;
            }
        }
        outcome
    }
}

impl<T: BusOps + ?Sized> BusOps for &mut T {
    fn write(&mut self, address: u8, data: &[u8]) -> HalResult {
        (**self).write(address, data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> HalResult {
        (**self).read(address, buf)
    }

    fn probe(&mut self, address: u8) -> HalResult {
        (**self).probe(address)
    }
}

/// Bus handle
///
/// Binds one [`BusOps`] implementation. Every call is forwarded to it
/// unconditionally; status codes pass through untouched.
#[derive(Debug)]
pub struct Bus<O> {
    ops: O,
}

impl<O: BusOps> Bus<O> {
    /// Open a bus handle over the given implementation
    pub const fn open(ops: O) -> Self {
        Self { ops }
    }

    /// Rebind the handle
    ///
    /// Pure state assignment; reopening with an equivalent implementation
    /// leaves observable behavior unchanged.
    pub fn reopen(&mut self, ops: O) {
        self.ops = ops;
    }

    /// Write data to the endpoint at `address`
    pub fn write(&mut self, address: u8, data: &[u8]) -> HalResult {
        self.ops.write(address, data)
    }

    /// Read data from the endpoint at `address`
    pub fn read(&mut self, address: u8, buf: &mut [u8]) -> HalResult {
        self.ops.read(address, buf)
    }

    /// Check that the endpoint at `address` acknowledges
    pub fn probe(&mut self, address: u8) -> HalResult {
        self.ops.probe(address)
    }

    /// Access the bound implementation
    pub fn ops(&self) -> &O {
        &self.ops
    }

    /// Mutable access to the bound implementation
    pub fn ops_mut(&mut self) -> &mut O {
        &mut self.ops
    }

    /// Release the bound implementation
    pub fn into_inner(self) -> O {
        self.ops
    }
}

impl<O: BusOps> BusOps for Bus<O> {
    fn write(&mut self, address: u8, data: &[u8]) -> HalResult {
        Bus::write(self, address, data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> HalResult {
        Bus::read(self, address, buf)
    }

    fn probe(&mut self, address: u8) -> HalResult {
        Bus::probe(self, address)
    }
}
