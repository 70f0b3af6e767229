//! Scripted transport for tests
//!
//! Records every outbound write and lets a peer closure answer it by
//! queueing inbound bytes, the way the visualizer would.

use std::boxed::Box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;
use std::time::Duration;
use std::vec::Vec;

use halcyon_protocol::{i2c, PeripheralKind};

use crate::transport::Transport;

/// How long a read waits for inbound bytes before reporting a closed link
const READ_TIMEOUT: Duration = Duration::from_millis(500);

type Peer = Box<dyn FnMut(PeripheralKind, u8, &[u8]) -> Vec<u8> + Send>;

pub struct ScriptedTransport {
    writes: Mutex<Vec<(PeripheralKind, u8, Vec<u8>)>>,
    inbound_tx: Mutex<Sender<u8>>,
    inbound_rx: Mutex<Receiver<u8>>,
    peer: Mutex<Peer>,
    /// Largest write accepted in full; longer writes are cut short
    max_write: AtomicUsize,
}

impl ScriptedTransport {
    /// Transport whose peer answers each write with `peer(kind, id, data)`
    pub fn with_peer(peer: impl FnMut(PeripheralKind, u8, &[u8]) -> Vec<u8> + Send + 'static) -> Self {
        let (tx, rx) = channel();
        Self {
            writes: Mutex::new(Vec::new()),
            inbound_tx: Mutex::new(tx),
            inbound_rx: Mutex::new(rx),
            peer: Mutex::new(Box::new(peer)),
            max_write: AtomicUsize::new(usize::MAX),
        }
    }

    /// Transport whose peer never answers
    pub fn silent() -> Self {
        Self::with_peer(|_, _, _| Vec::new())
    }

    /// I2C slave that acknowledges everything and serves `data` on reads
    ///
    /// Replies go to the channel that wrote. A written data byte equal to
    /// STOP is indistinguishable from a stop condition, so tests avoid it.
    pub fn i2c_slave(data: Vec<u8>) -> Self {
        let mut next = 0usize;
        let mut reading = false;
        Self::with_peer(move |kind, id, bytes| {
            if kind != PeripheralKind::I2c {
                return Vec::new();
            }
            let reply = |b: u8| std::vec![PeripheralKind::I2c.as_u8(), id, b];
            match bytes {
                [i2c::START, addr] => {
                    reading = addr & 1 == 1;
                    let mut out = reply(i2c::ACK);
                    if reading {
                        next = 1;
                        out.extend(reply(data.first().copied().unwrap_or(0xFF)));
                    }
                    out
                }
                [i2c::STOP] => Vec::new(),
                // Master acknowledged a received byte: serve the next one
                [_] if reading => {
                    let b = data.get(next).copied().unwrap_or(0xFF);
                    next += 1;
                    reply(b)
                }
                // Data byte written by the master
                _ => reply(i2c::ACK),
            }
        })
    }

    /// Cut every write down to at most `n` bytes
    pub fn limit_writes(&self, n: usize) {
        self.max_write.store(n, Ordering::SeqCst);
    }

    /// Queue inbound bytes directly
    pub fn inject(&self, bytes: &[u8]) {
        let tx = self.inbound_tx.lock().unwrap();
        for &b in bytes {
            tx.send(b).unwrap();
        }
    }

    /// All bytes written for `kind`, in order
    pub fn written(&self, kind: PeripheralKind) -> Vec<u8> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .flat_map(|(_, _, data)| data.iter().copied())
            .collect()
    }

    /// Number of write calls made for `kind`
    pub fn write_calls(&self, kind: PeripheralKind) -> usize {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .count()
    }

    /// Instance ids of all writes, in order
    pub fn written_ids(&self) -> Vec<u8> {
        self.writes.lock().unwrap().iter().map(|(_, id, _)| *id).collect()
    }
}

impl Transport for ScriptedTransport {
    fn read(&self, buf: &mut [u8]) -> usize {
        let rx = self.inbound_rx.lock().unwrap();
        for (i, slot) in buf.iter_mut().enumerate() {
            match rx.recv_timeout(READ_TIMEOUT) {
                Ok(b) => *slot = b,
                Err(_) => return i,
            }
        }
        buf.len()
    }

    fn write(&self, kind: PeripheralKind, id: u8, data: &[u8]) -> usize {
        let accepted = data.len().min(self.max_write.load(Ordering::SeqCst));
        let data = &data[..accepted];
        self.writes.lock().unwrap().push((kind, id, data.to_vec()));

        let reply = (self.peer.lock().unwrap())(kind, id, data);
        self.inject(&reply);
        accepted
    }
}
