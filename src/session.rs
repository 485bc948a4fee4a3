//! Session orchestration (SPEC_FULL expansion): pairs one send-direction
//! and one recv-direction `WindowBuffer` with the downstream codec and a
//! `Transport`, so a caller drives `poll_send`/`deliver` instead of
//! hand-wiring the two windows and the envelope codec itself.
//!
//! This is scaffolding, not protocol logic: it contains no state beyond
//! sequencing the calls the window/codec modules already define, and it
//! does not negotiate a session — no handshake, no login exchange.

use crate::codec::hmac::{NullRandom, RandomSource};
use crate::codec::{downstream_decode, downstream_encode};
use crate::config::{Config, MAX_FRAGSIZE_DOWN, MAX_FRAGSIZE_UP};
use crate::error::{Error, Result};
use crate::fragment::Direction;
use crate::transport::Transport;
use crate::window::WindowBuffer;

/// Largest HMAC key this session type stores inline.
const MAX_KEY_LEN: usize = 32;

/// Worst-case envelope size: the fragment-header-prefixed body at its
/// largest (`MAX_FRAGSIZE_DOWN` plus the 3-byte header), blown up by the
/// most expansive encoder (base32, 8 output bytes per 5 input), plus the
/// clear flags byte and the trailing NUL the encoder appends.
const MAX_ENVELOPE: usize = 1 + 1 + (((MAX_FRAGSIZE_DOWN + 3) * 8) + 4) / 5;

/// A minimal fragment header the session layer prepends to the payload
/// it hands the codec, so a fragment's sequencing metadata survives the
/// trip through `downstream_encode`/`downstream_decode`. Wire placement
/// of this metadata (including the piggybacked `ack_other`) is left to
/// the session layer by design; this is one concrete, documented choice,
/// not part of the core wire format.
///
/// Layout: `[seq_id:1][bits:1][ack_other:1 if ACK_OTHER_PRESENT]`.
struct FragmentHeader {
    seq_id: u8,
    compressed: bool,
    start: bool,
    end: bool,
    ack_other: Option<u8>,
}

const BIT_COMPRESSED: u8 = 0x01;
const BIT_START: u8 = 0x02;
const BIT_END: u8 = 0x04;
const BIT_ACK_OTHER: u8 = 0x08;

impl FragmentHeader {
    fn write(&self, out: &mut [u8]) -> usize {
        out[0] = self.seq_id;
        let mut bits = 0u8;
        if self.compressed {
            bits |= BIT_COMPRESSED;
        }
        if self.start {
            bits |= BIT_START;
        }
        if self.end {
            bits |= BIT_END;
        }
        if let Some(ack) = self.ack_other {
            bits |= BIT_ACK_OTHER;
            out[1] = bits;
            out[2] = ack;
            3
        } else {
            out[1] = bits;
            2
        }
    }

    fn read(input: &[u8]) -> Result<(Self, usize)> {
        if input.len() < 2 {
            return Err(Error::TooShort);
        }
        let seq_id = input[0];
        let bits = input[1];
        let (ack_other, used) = if bits & BIT_ACK_OTHER != 0 {
            if input.len() < 3 {
                return Err(Error::TooShort);
            }
            (Some(input[2]), 3)
        } else {
            (None, 2)
        };
        Ok((
            FragmentHeader {
                seq_id,
                compressed: bits & BIT_COMPRESSED != 0,
                start: bits & BIT_START != 0,
                end: bits & BIT_END != 0,
                ack_other,
            },
            used,
        ))
    }
}

/// Pairs a send window, a recv window, and the downstream codec behind
/// one `Transport`. `LEN` is the slot-ring length (≥ `windowsize`, the
/// data model's typical `2 * windowsize`); `MAXFRAG` bounds a single
/// fragment's payload.
pub struct Session<const LEN: usize, const MAXFRAG: usize> {
    send: WindowBuffer<LEN, MAXFRAG>,
    recv: WindowBuffer<LEN, MAXFRAG>,
    key: Option<([u8; MAX_KEY_LEN], usize)>,
    cmc: u32,
    flags: u8,
    pending_other_ack: Option<u8>,
}

impl<const LEN: usize, const MAXFRAG: usize> Session<LEN, MAXFRAG> {
    /// Builds a session from `cfg`. `key` is the pre-shared HMAC key, if
    /// one has been negotiated already; `None` produces randomness-padded
    /// envelopes (pre-login, per §4.5 step 4).
    pub fn new(cfg: Config, key: Option<&[u8]>) -> Self {
        assert!(MAXFRAG <= MAX_FRAGSIZE_DOWN.max(MAX_FRAGSIZE_UP));
        let mut stored_key = None;
        if let Some(k) = key {
            let mut buf = [0u8; MAX_KEY_LEN];
            let n = core::cmp::min(k.len(), MAX_KEY_LEN);
            buf[..n].copy_from_slice(&k[..n]);
            stored_key = Some((buf, n));
        }
        Self {
            send: WindowBuffer::new(cfg.window_size as usize, cfg.timeout, cfg.max_retries, Direction::Sending),
            recv: WindowBuffer::new(cfg.window_size as usize, cfg.timeout, cfg.max_retries, Direction::Recving),
            key: stored_key,
            cmc: 0,
            flags: if cfg.hmac32 { crate::codec::FLAG_HMAC32 } else { 0 },
            pending_other_ack: None,
        }
    }

    fn key(&self) -> Option<&[u8]> {
        self.key.as_ref().map(|(buf, n)| &buf[..*n])
    }

    pub fn send_window(&self) -> &WindowBuffer<LEN, MAXFRAG> {
        &self.send
    }

    pub fn recv_window(&self) -> &WindowBuffer<LEN, MAXFRAG> {
        &self.recv
    }

    /// Queues application data for the sending path (`add_outgoing_data`).
    pub fn queue_outgoing(&mut self, data: &[u8], compressed: bool) -> Result<usize> {
        self.send.add_outgoing_data(data, compressed)
    }

    /// If a fragment is due (new or retry), encodes and sends it through
    /// `transport`. Returns whether anything was sent.
    pub fn poll_send<T: Transport>(&mut self, transport: &mut T, now: u64) -> Result<bool> {
        let other_ack = self.pending_other_ack.take();
        let frag = match self.send.get_next_sending_fragment(now, other_ack) {
            Some(f) => f,
            None => return Ok(false),
        };

        let header = FragmentHeader {
            seq_id: frag.seq_id,
            compressed: frag.compressed,
            start: frag.start,
            end: frag.end,
            ack_other: frag.ack_other,
        };

        let mut body = [0u8; MAX_FRAGSIZE_DOWN];
        let hlen = header.write(&mut body);
        if hlen + frag.data.len() > body.len() {
            return Err(Error::PayloadTooLarge);
        }
        body[hlen..hlen + frag.data.len()].copy_from_slice(frag.data);
        let body_len = hlen + frag.data.len();

        self.cmc = self.cmc.wrapping_add(1);
        let mut envelope = [0u8; MAX_ENVELOPE];
        let mut rng = NullRandom;
        let n = downstream_encode(
            &body[..body_len],
            self.flags,
            self.cmc,
            self.key(),
            &mut rng as &mut dyn RandomSource,
            &mut envelope,
        )?;
        transport.send(&envelope[..n])?;
        Ok(true)
    }

    /// Receives one envelope from `transport` and, if it is a data
    /// fragment, feeds it to `process_incoming_fragment`. ACKs carried
    /// in the fragment header are applied to the send window; the
    /// fragment's own `ack_other` (from the peer, piggybacking an ACK of
    /// our own traffic) is stashed for the next `poll_send` to
    /// piggyback — the core's `ack_other` plumbing is only the carry; a
    /// real session layer would apply it directly to the peer's ACK.
    pub fn deliver<T: Transport>(&mut self, transport: &mut T) -> Result<Option<usize>> {
        let mut raw = [0u8; MAX_ENVELOPE];
        let n = transport.recv(&mut raw)?;

        let mut body = [0u8; MAX_FRAGSIZE_DOWN];
        let body_len = downstream_decode(&raw[..n], self.key(), &mut body)?;

        let (header, used) = FragmentHeader::read(&body[..body_len])?;
        let payload = &body[used..body_len];

        if let Some(ack) = header.ack_other {
            self.send.ack(ack);
            self.send.tick();
        }

        let accepted = self.recv.process_incoming_fragment(
            header.seq_id,
            payload,
            header.compressed,
            header.start,
            header.end,
        );
        self.pending_other_ack = Some(header.seq_id);
        Ok(if accepted > 0 { Some(accepted) } else { None })
    }

    /// Drains complete reassembled messages into `out`, one per call.
    pub fn reassemble(&mut self, out: &mut [u8]) -> Option<(usize, bool)> {
        self.recv.reassemble_data(out)
    }

    /// Acknowledges a fragment sequence ID on the send window and slides
    /// past any newly-fully-ACKed prefix.
    pub fn ack(&mut self, seq_id: u8) {
        self.send.ack(seq_id);
        self.send.tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LoopbackTransport;

    /// P4: feeding every sent fragment into the peer's receiver
    /// eventually reassembles the original payload.
    #[test]
    fn end_to_end_round_trip_over_loopback() {
        let cfg = Config::new().with_window_size(4).with_max_retries(2);
        let mut alice: Session<8, 16> = Session::new(cfg, Some(b"sharedkey"));
        let mut bob: Session<8, 16> = Session::new(cfg, Some(b"sharedkey"));

        let mut wire: LoopbackTransport<4096> = LoopbackTransport::new();

        alice.queue_outgoing(b"hello across the tunnel", false).unwrap();

        let mut now = 0u64;
        while alice.poll_send(&mut wire, now).unwrap() {
            now += 1;
        }

        let mut delivered_any = false;
        loop {
            match bob.deliver(&mut wire) {
                Ok(Some(_)) => delivered_any = true,
                Ok(None) => {}
                Err(Error::WouldBlock) => break,
                Err(e) => panic!("unexpected error: {e:?}"),
            }
        }
        assert!(delivered_any);

        let mut out = [0u8; 64];
        let (written, compressed) = bob.reassemble(&mut out).expect("complete message");
        assert_eq!(&out[..written], b"hello across the tunnel");
        assert!(!compressed);
    }

    #[test]
    fn bad_key_on_receiver_rejects_every_envelope() {
        let cfg = Config::new().with_window_size(4);
        let mut alice: Session<8, 16> = Session::new(cfg, Some(b"correct"));
        let mut eve: Session<8, 16> = Session::new(cfg, Some(b"wrongkey"));
        let mut wire: LoopbackTransport<4096> = LoopbackTransport::new();

        alice.queue_outgoing(b"short", false).unwrap();
        alice.poll_send(&mut wire, 0).unwrap();

        assert_eq!(eve.deliver(&mut wire), Err(Error::BadHmac));
    }
}
