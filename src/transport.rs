//! Carrier abstraction: the engine is agnostic to what actually moves
//! encoded envelopes from one side to the other. This is an ambient
//! addition — a `Transport` trait plus simple in-memory implementations
//! for tests and demos — since no carrier is named at the core.

use crate::error::Result;

/// Moves whole encoded envelopes. Implementors decide how a "send" and a
/// "receive" map onto their underlying carrier (a DNS query/response
/// pair, a socket, a pipe, whatever).
pub trait Transport {
    /// Sends one encoded envelope. Must not block indefinitely; returns
    /// `Error::WouldBlock` if the carrier cannot accept it right now.
    fn send(&mut self, envelope: &[u8]) -> Result<()>;

    /// Receives one encoded envelope into `out`, returning the number of
    /// bytes written. Returns `Error::WouldBlock` if none is available.
    fn recv(&mut self, out: &mut [u8]) -> Result<usize>;
}

/// Discards everything sent, never has anything to receive. Useful for
/// exercising the sending path in isolation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn send(&mut self, _envelope: &[u8]) -> Result<()> {
        Ok(())
    }

    fn recv(&mut self, _out: &mut [u8]) -> Result<usize> {
        Err(crate::error::Error::WouldBlock)
    }
}

/// An in-process transport that loops a single envelope back to its own
/// receiver, for round-trip tests and demos without a real carrier.
pub struct LoopbackTransport<const N: usize> {
    pending: heapless::Deque<heapless::Vec<u8, N>, 16>,
}

impl<const N: usize> LoopbackTransport<N> {
    pub const fn new() -> Self {
        Self {
            pending: heapless::Deque::new(),
        }
    }
}

impl<const N: usize> Default for LoopbackTransport<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Transport for LoopbackTransport<N> {
    fn send(&mut self, envelope: &[u8]) -> Result<()> {
        let mut buf = heapless::Vec::new();
        buf.extend_from_slice(envelope)
            .map_err(|_| crate::error::Error::BufferTooSmall)?;
        self.pending
            .push_back(buf)
            .map_err(|_| crate::error::Error::WindowFull)?;
        Ok(())
    }

    fn recv(&mut self, out: &mut [u8]) -> Result<usize> {
        let buf = self.pending.pop_front().ok_or(crate::error::Error::WouldBlock)?;
        if buf.len() > out.len() {
            return Err(crate::error::Error::BufferTooSmall);
        }
        out[..buf.len()].copy_from_slice(&buf);
        Ok(buf.len())
    }
}

/// Pairs a `Transport` with a byte-level `RingBuffer` so partial reads
/// from a stream-oriented carrier can be staged until a full envelope is
/// available. Not needed by a datagram carrier (DNS query/response is
/// inherently message-shaped), kept for stream-shaped carriers.
pub struct BufferedTransport<T, const N: usize> {
    inner: T,
    staging: crate::buffer::RingBuffer<N>,
}

impl<T: Transport, const N: usize> BufferedTransport<T, N> {
    pub const fn new(inner: T) -> Self {
        Self {
            inner,
            staging: crate::buffer::RingBuffer::new(),
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: Transport, const N: usize> Transport for BufferedTransport<T, N> {
    fn send(&mut self, envelope: &[u8]) -> Result<()> {
        self.inner.send(envelope)
    }

    fn recv(&mut self, out: &mut [u8]) -> Result<usize> {
        let n = self.inner.recv(out)?;
        self.staging.push(&out[..n])?;
        self.staging.pop(out);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_round_trips_one_envelope() {
        let mut t: LoopbackTransport<64> = LoopbackTransport::new();
        t.send(b"hello").unwrap();
        let mut out = [0u8; 64];
        let n = t.recv(&mut out).unwrap();
        assert_eq!(&out[..n], b"hello");
    }

    #[test]
    fn loopback_recv_would_block_when_empty() {
        let mut t: LoopbackTransport<64> = LoopbackTransport::new();
        let mut out = [0u8; 64];
        assert_eq!(t.recv(&mut out), Err(crate::error::Error::WouldBlock));
    }

    #[test]
    fn null_transport_never_yields_data() {
        let mut t = NullTransport;
        t.send(b"anything").unwrap();
        let mut out = [0u8; 8];
        assert_eq!(t.recv(&mut out), Err(crate::error::Error::WouldBlock));
    }
}
