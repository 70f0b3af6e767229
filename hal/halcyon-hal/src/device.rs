//! Serial device abstractions
//!
//! A serial device is a point-to-point endpoint: a chip behind a fixed bus
//! address, a UART, or anything else that can move bytes both ways.

use crate::error::{HalError, HalResult};

/// Serial device operations
///
/// All operations block until the underlying transaction is complete.
pub trait SerialDevice {
    /// Write a sequence of bytes to the device
    fn write(&mut self, data: &[u8]) -> HalResult;

    /// Fill `buf` with bytes read from the device
    fn read(&mut self, buf: &mut [u8]) -> HalResult;

    /// Check that the device is responding
    fn test(&mut self) -> HalResult;

    /// Implementation-defined control request
    ///
    /// `arg` carries request input and/or output. Devices without a control
    /// channel return [`HalError::NotImplemented`].
    fn ioctl(&mut self, request: u32, arg: &mut [u8]) -> HalResult {
        let _ = (request, arg);
        Err(HalError::NotImplemented)
    }

    /// Close the device
    ///
    /// Owned resources are released when the implementation is dropped, so
    /// the default does nothing.
    fn close(&mut self) -> HalResult {
        Ok(())
    }
}

impl<T: SerialDevice + ?Sized> SerialDevice for &mut T {
    fn write(&mut self, data: &[u8]) -> HalResult {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> HalResult {
        (**self).read(buf)
    }

    fn test(&mut self) -> HalResult {
        (**self).test()
    }

    fn ioctl(&mut self, request: u32, arg: &mut [u8]) -> HalResult {
        (**self).ioctl(request, arg)
    }

    fn close(&mut self) -> HalResult {
        (**self).close()
    }
}

/// Serial device handle
#[derive(Debug)]
pub struct Device<O> {
    ops: O,
}

impl<O: SerialDevice> Device<O> {
    /// Open a device handle over the given implementation
    pub const fn open(ops: O) -> Self {
        Self { ops }
    }

    /// Rebind the handle (pure state assignment)
    pub fn reopen(&mut self, ops: O) {
        self.ops = ops;
    }

    pub fn write(&mut self, data: &[u8]) -> HalResult {
        self.ops.write(data)
    }

    pub fn read(&mut self, buf: &mut [u8]) -> HalResult {
        self.ops.read(buf)
    }

    pub fn test(&mut self) -> HalResult {
        self.ops.test()
    }

    pub fn ioctl(&mut self, request: u32, arg: &mut [u8]) -> HalResult {
        self.ops.ioctl(request, arg)
    }

    pub fn close(&mut self) -> HalResult {
        self.ops.close()
    }

    /// Access the bound implementation
    pub fn ops(&self) -> &O {
        &self.ops
    }

    /// Release the bound implementation
    pub fn into_inner(self) -> O {
        self.ops
    }
}
