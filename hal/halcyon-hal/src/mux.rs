//! Bus multiplexer abstractions
//!
//! A multiplexer routes one of N downstream buses onto a single upstream
//! bus. The handle caches the current selection so that repeated
//! transactions on the same channel do not touch the hardware.
//!
//! Channel selection is not reentrant: callers sharing one [`Mux`] must
//! serialize access themselves.

use crate::bus::BusOps;
use crate::error::{HalError, HalResult};

/// Multiplexer model operations
pub trait MuxOps {
    /// Route `channel` onto the upstream bus
    ///
    /// Called only for in-range channels that differ from the cached
    /// selection.
    fn select_channel(&mut self, upstream: &mut dyn BusOps, channel: u8) -> HalResult;
}

/// Multiplexer handle
#[derive(Debug)]
pub struct Mux<B, O> {
    upstream: B,
    ops: O,
    output_count: u8,
    /// `None` until the first successful selection
    selected: Option<u8>,
}

impl<B: BusOps, O: MuxOps> Mux<B, O> {
    /// Open a multiplexer in front of `upstream` with `output_count` channels
    pub const fn open(upstream: B, output_count: u8, ops: O) -> Self {
        Self {
            upstream,
            ops,
            output_count,
            selected: None,
        }
    }

    /// Rebind the handle (pure state assignment, selection cache cleared)
    pub fn reopen(&mut self, upstream: B, output_count: u8, ops: O) {
        self.upstream = upstream;
        self.ops = ops;
        self.output_count = output_count;
        self.selected = None;
    }

    /// Select an output channel
    ///
    /// Out-of-range channels fail without side effects. Selecting the
    /// channel that is already selected succeeds without calling the model.
    /// The cache is only updated when the model reports success; its error
    /// is returned unchanged otherwise.
    pub fn select(&mut self, channel: u8) -> HalResult {
        if channel >= self.output_count {
            return Err(HalError::Error);
        }

        if self.selected == Some(channel) {
            return Ok(());
        }

        self.ops.select_channel(&mut self.upstream, channel)?;
        self.selected = Some(channel);
        Ok(())
    }

    /// Currently selected channel, `None` if nothing was selected yet
    pub fn selected(&self) -> Option<u8> {
        self.selected
    }

    /// Number of downstream channels
    pub fn output_count(&self) -> u8 {
        self.output_count
    }

    /// The upstream bus the multiplexer sits on
    pub fn input_bus(&mut self) -> &mut B {
        &mut self.upstream
    }

    /// Access the multiplexer model
    pub fn ops(&self) -> &O {
        &self.ops
    }

    /// Expose one downstream channel as a bus
    ///
    /// Every transaction on the returned bus selects `channel` first.
    pub fn open_channel_as_bus(&mut self, channel: u8) -> HalResult<MuxChannel<'_, B, O>> {
        if channel >= self.output_count {
            return Err(HalError::Error);
        }
        Ok(MuxChannel { mux: self, channel })
    }
}

/// One downstream channel of a [`Mux`], usable as a bus
#[derive(Debug)]
pub struct MuxChannel<'a, B, O> {
    mux: &'a mut Mux<B, O>,
    channel: u8,
}

impl<B: BusOps, O: MuxOps> MuxChannel<'_, B, O> {
    /// The channel this bus routes to
    pub fn channel(&self) -> u8 {
        self.channel
    }
}

impl<B: BusOps, O: MuxOps> BusOps for MuxChannel<'_, B, O> {
    fn write(&mut self, address: u8, data: &[u8]) -> HalResult {
        self.mux.select(self.channel)?;
        self.mux.upstream.write(address, data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> HalResult {
        self.mux.select(self.channel)?;
        self.mux.upstream.read(address, buf)
    }

    fn probe(&mut self, address: u8) -> HalResult {
        self.mux.select(self.channel)?;
        self.mux.upstream.probe(address)
    }
}
