//! Byte transport to the peripheral visualizer
//!
//! The transport is shared by the operation-initiating caller and the
//! delivery handler, so every method takes `&self`; implementations provide
//! their own interior synchronization.

use halcyon_protocol::PeripheralKind;

/// Blocking byte channel keyed by peripheral kind and instance id
pub trait Transport {
    /// Read inbound bytes
    ///
    /// Blocks until at least one byte is available. Returns the number of
    /// bytes read; 0 means the link is closed.
    fn read(&self, buf: &mut [u8]) -> usize;

    /// Write bytes on behalf of peripheral `kind`, instance `id`
    ///
    /// Returns the number of bytes accepted.
    fn write(&self, kind: PeripheralKind, id: u8, data: &[u8]) -> usize;

    /// Write a single byte, true if it was accepted
    fn write_byte(&self, kind: PeripheralKind, id: u8, byte: u8) -> bool {
        self.write(kind, id, &[byte]) == 1
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn read(&self, buf: &mut [u8]) -> usize {
        (**self).read(buf)
    }

    fn write(&self, kind: PeripheralKind, id: u8, data: &[u8]) -> usize {
        (**self).write(kind, id, data)
    }

    fn write_byte(&self, kind: PeripheralKind, id: u8, byte: u8) -> bool {
        (**self).write_byte(kind, id, byte)
    }
}

/// Fill `buf` completely, false if the link closed first
pub(crate) fn read_exact<T: Transport + ?Sized>(transport: &T, buf: &mut [u8]) -> bool {
    let mut filled = 0;
    while filled < buf.len() {
        let n = transport.read(&mut buf[filled..]);
        if n == 0 {
            return false;
        }
        filled += n;
    }
    true
}

#[cfg(feature = "std")]
pub use tcp::{TcpTransport, DEFAULT_PORT};

#[cfg(feature = "std")]
mod tcp {
    use std::io::{Read, Write};
    use std::net::{TcpStream, ToSocketAddrs};
    use std::sync::Mutex;

    use super::Transport;
    use halcyon_protocol::PeripheralKind;

    /// Port the visualizer listens on by default
    pub const DEFAULT_PORT: u16 = 8080;

    /// Transport over a TCP connection to the visualizer
    ///
    /// Outbound records are `[kind][id][len][data...]`, split into several
    /// records when `data` is longer than 255 bytes. The inbound stream is
    /// handed to the dispatcher verbatim.
    pub struct TcpTransport {
        reader: Mutex<TcpStream>,
        writer: Mutex<TcpStream>,
    }

    impl TcpTransport {
        /// Connect to the visualizer
        pub fn connect<A: ToSocketAddrs>(addr: A) -> std::io::Result<Self> {
            let writer = TcpStream::connect(addr)?;
            writer.set_nodelay(true)?;
            let reader = writer.try_clone()?;
            Ok(Self {
                reader: Mutex::new(reader),
                writer: Mutex::new(writer),
            })
        }

        /// Connect to a visualizer on this machine
        pub fn connect_local() -> std::io::Result<Self> {
            Self::connect(("127.0.0.1", DEFAULT_PORT))
        }
    }

    impl Transport for TcpTransport {
        fn read(&self, buf: &mut [u8]) -> usize {
            match self.reader.lock() {
                Ok(mut stream) => stream.read(buf).unwrap_or(0),
                Err(_) => 0,
            }
        }

        fn write(&self, kind: PeripheralKind, id: u8, data: &[u8]) -> usize {
            let Ok(mut stream) = self.writer.lock() else {
                return 0;
            };

            let mut written = 0;
            for chunk in data.chunks(u8::MAX as usize) {
                let head = [kind.as_u8(), id, chunk.len() as u8];
                if stream.write_all(&head).is_err() || stream.write_all(chunk).is_err() {
                    break;
                }
                written += chunk.len();
            }
            written
        }
    }
}
