//! The fragment window buffer: a ring of fragment slots, multiplexed by
//! direction, implementing both the sending and the receiving path.

use crate::config::MAX_SEQ_AHEAD;
use crate::fragment::{Direction, FragmentSlot};
use crate::seq;

/// A fragment ready to be handed to the carrier, borrowed from its slot.
#[derive(Debug)]
pub struct SendFragment<'a> {
    pub seq_id: u8,
    pub data: &'a [u8],
    pub compressed: bool,
    pub start: bool,
    pub end: bool,
    /// Opposite-direction ACK to piggyback, supplied by the caller.
    pub ack_other: Option<u8>,
}

/// A ring of `LEN` fragment slots (`LEN` should be `2 * windowsize` per the
/// data model), each holding up to `MAXFRAG` payload bytes.
///
/// One `WindowBuffer` serves either the sending or the receiving path,
/// selected by `direction` — the "tagged roles" form from the design
/// notes, chosen because the caller already separates send/recv one
/// level up.
pub struct WindowBuffer<const LEN: usize, const MAXFRAG: usize> {
    frags: [FragmentSlot<MAXFRAG>; LEN],
    /// Slot index of the oldest populated slot (`window_start`/`chunk_start`
    /// in the data model — the two coincide in this representation).
    base: usize,
    /// Send side: next seqID to assign. Recv side: next expected seqID.
    cur_seq_id: u8,
    /// SeqID stored at `base`.
    start_seq_id: u8,
    /// Most recent append index (send side only).
    last_write: usize,
    windowsize: usize,
    timeout: u64,
    max_retries: u16,
    numitems: usize,
    resends: u64,
    oos: u64,
    direction: Direction,
}

impl<const LEN: usize, const MAXFRAG: usize> WindowBuffer<LEN, MAXFRAG> {
    /// `init(length, windowsize, maxfraglen, direction)`. `length` and
    /// `maxfraglen` are fixed at compile time via `LEN`/`MAXFRAG`;
    /// `windowsize` must not exceed `LEN`.
    pub fn new(windowsize: usize, timeout: u64, max_retries: u16, direction: Direction) -> Self {
        assert!(windowsize <= LEN, "windowsize must not exceed the ring length");
        Self {
            frags: core::array::from_fn(|_| FragmentSlot::empty()),
            base: 0,
            cur_seq_id: 0,
            start_seq_id: 0,
            last_write: LEN - 1,
            windowsize,
            timeout,
            max_retries,
            numitems: 0,
            resends: 0,
            oos: 0,
            direction,
        }
    }

    pub const fn direction(&self) -> Direction {
        self.direction
    }

    pub const fn numitems(&self) -> usize {
        self.numitems
    }

    pub const fn resends(&self) -> u64 {
        self.resends
    }

    pub const fn oos(&self) -> u64 {
        self.oos
    }

    pub const fn windowsize(&self) -> usize {
        self.windowsize
    }

    pub const fn cur_seq_id(&self) -> u8 {
        self.cur_seq_id
    }

    /// `available()`: free fragment slots in the whole ring, not bytes.
    pub const fn available(&self) -> usize {
        LEN - self.numitems
    }

    /// `clear()`: zero every slot, reset counters and indices. Preserves
    /// `windowsize`, `timeout`, `max_retries`, `direction`.
    pub fn clear(&mut self) {
        for slot in &mut self.frags {
            slot.free();
        }
        self.base = 0;
        self.cur_seq_id = 0;
        self.start_seq_id = 0;
        self.last_write = LEN - 1;
        self.numitems = 0;
        self.resends = 0;
        self.oos = 0;
    }

    /// `resize(new_windowsize)`: logical re-shape, data-destructive by
    /// contract. The physical ring (`LEN`/`MAXFRAG`) is fixed at compile
    /// time, so this adjusts the logical window within it and clears.
    pub fn resize(&mut self, new_windowsize: usize) {
        assert!(new_windowsize <= LEN);
        self.windowsize = new_windowsize;
        self.clear();
    }

    /// Slot index holding seqID `s`: the chunk-start slot offset forward
    /// by `s`'s distance from `start_seq_id`.
    fn index_for_seq(&self, s: u8) -> usize {
        let offset = seq::seq_offset(self.start_seq_id, s) as usize;
        seq::wrap(self.base + offset, LEN)
    }

    /// `slide(n, delete)`: advance `base`/`start_seq_id` by `n`, optionally
    /// freeing every slot passed over.
    fn slide(&mut self, n: usize, delete: bool) {
        for i in 0..n {
            if delete {
                let idx = seq::wrap(self.base + i, LEN);
                if !self.frags[idx].is_free() {
                    self.frags[idx].free();
                    self.numitems = self.numitems.saturating_sub(1);
                }
            }
        }
        self.base = seq::wrap(self.base + n, LEN);
        self.start_seq_id = self.start_seq_id.wrapping_add(n as u8);
    }

    /// `tick()`: on the sending side, slide across any contiguous prefix
    /// of fully-ACKed slots. On the receiving side this is a no-op —
    /// reassembly drives sliding there.
    pub fn tick(&mut self) {
        if self.direction != Direction::Sending {
            return;
        }
        let mut advanced = 0;
        while advanced < self.windowsize {
            let idx = seq::wrap(self.base + advanced, LEN);
            let slot = &self.frags[idx];
            if slot.is_free() || slot.acks == 0 {
                break;
            }
            advanced += 1;
        }
        if advanced > 0 {
            self.slide(advanced, true);
        }
    }

    // ---- Sending path (§4.3) ----

    /// `add_outgoing_data`: splits `data` into `ceil(len / MAXFRAG)`
    /// fragments and admits them atomically (all-or-nothing).
    pub fn add_outgoing_data(&mut self, data: &[u8], compressed: bool) -> crate::error::Result<usize> {
        debug_assert_eq!(self.direction, Direction::Sending);

        let frag_count = if data.is_empty() {
            1
        } else {
            data.len().div_ceil(MAXFRAG)
        };

        if self.available() < frag_count {
            return Err(crate::error::Error::WindowFull);
        }

        // Verify every target slot is free before mutating anything
        // (atomic admission).
        for i in 0..frag_count {
            let idx = seq::wrap(self.last_write + 1 + i, LEN);
            if !self.frags[idx].is_free() {
                return Err(crate::error::Error::WindowFull);
            }
        }

        for i in 0..frag_count {
            let idx = seq::wrap(self.last_write + 1 + i, LEN);
            let chunk = if data.is_empty() {
                &data[0..0]
            } else {
                let start = i * MAXFRAG;
                let end = core::cmp::min(start + MAXFRAG, data.len());
                &data[start..end]
            };
            let is_start = i == 0;
            let is_end = i == frag_count - 1;
            self.frags[idx].fill(chunk, self.cur_seq_id, compressed, is_start, is_end);
            self.cur_seq_id = self.cur_seq_id.wrapping_add(1);
            self.last_write = idx;
            self.numitems += 1;
        }

        Ok(frag_count)
    }

    /// `sending(now)`: count of fragments eligible to (re)send.
    pub fn sending(&self, now: u64) -> usize {
        debug_assert_eq!(self.direction, Direction::Sending);
        let mut count = 0;
        for i in 0..self.windowsize {
            let idx = seq::wrap(self.base + i, LEN);
            let slot = &self.frags[idx];
            if slot.is_free() || slot.acks != 0 {
                continue;
            }
            if slot.retries == 0 || now.saturating_sub(slot.last_sent) >= self.timeout {
                count += 1;
            }
        }
        count
    }

    /// `get_next_sending_fragment`: first eligible fragment in
    /// `base`-forward order, marked sent. Frees and skips fragments that
    /// have exhausted `max_retries`.
    pub fn get_next_sending_fragment(
        &mut self,
        now: u64,
        other_ack: Option<u8>,
    ) -> Option<SendFragment<'_>> {
        debug_assert_eq!(self.direction, Direction::Sending);

        let mut found: Option<usize> = None;
        let mut i = 0;
        while i < self.windowsize {
            let idx = seq::wrap(self.base + i, LEN);
            let slot = &self.frags[idx];

            if slot.is_free() || slot.acks != 0 {
                i += 1;
                continue;
            }

            if slot.retries as u32 > self.max_retries as u32 {
                log::warn!("fragment seq_id={} exceeded max_retries, freeing slot", slot.seq_id);
                self.frags[idx].free();
                self.numitems = self.numitems.saturating_sub(1);
                i += 1;
                continue;
            }

            let due = slot.retries == 0 || now.saturating_sub(slot.last_sent) >= self.timeout;
            if due {
                found = Some(idx);
                break;
            }
            i += 1;
        }

        let idx = found?;
        let slot = &mut self.frags[idx];
        slot.last_sent = now;
        slot.retries += 1;
        slot.ack_other = other_ack;

        let slot = &self.frags[idx];
        Some(SendFragment {
            seq_id: slot.seq_id,
            data: slot.data(),
            compressed: slot.compressed,
            start: slot.start,
            end: slot.end,
            ack_other: slot.ack_other,
        })
    }

    /// `ack(seqid)`: increment the matching slot's ACK count if it is
    /// within the active window and populated; silently ignored otherwise.
    pub fn ack(&mut self, seq_id: u8) {
        debug_assert_eq!(self.direction, Direction::Sending);

        let offset = seq::seq_offset(self.start_seq_id, seq_id);
        if offset as usize >= self.windowsize {
            return; // outside the active window: late or bogus ACK
        }
        let idx = self.index_for_seq(seq_id);
        let slot = &mut self.frags[idx];
        if !slot.is_free() && slot.seq_id == seq_id {
            slot.acks += 1;
        }
    }

    // ---- Receiving path (§4.4) ----

    /// `process_incoming_fragment`: insert, dedup, or drop an arriving
    /// fragment. Returns the number of payload bytes accepted (0 for
    /// drops and duplicates).
    #[allow(clippy::too_many_arguments)]
    pub fn process_incoming_fragment(
        &mut self,
        seq_id: u8,
        data: &[u8],
        compressed: bool,
        start: bool,
        end: bool,
    ) -> usize {
        debug_assert_eq!(self.direction, Direction::Recving);

        let delta = seq::seq_offset(self.start_seq_id, seq_id);

        if delta >= MAX_SEQ_AHEAD {
            // Stale: strictly behind start_seq_id (wrapped distance reads
            // as "far ahead" otherwise).
            let idx = self.index_for_seq(seq_id);
            let slot = &mut self.frags[idx];
            if !slot.is_free() && slot.seq_id == seq_id {
                slot.retries += 1;
                self.resends += 1;
                log::trace!("duplicate stale fragment seq_id={seq_id}");
            } else {
                self.oos += 1;
                log::trace!("dropped stale fragment seq_id={seq_id}");
            }
            return 0;
        }

        if delta as usize >= self.windowsize {
            // Ahead far enough that accepting would grow the populated
            // extent past `windowsize` slots beyond base: reject rather
            // than risk overrunning unacked slots (Open Question,
            // resolved conservatively).
            self.oos += 1;
            log::trace!("dropped far-ahead fragment seq_id={seq_id}, delta={delta}");
            return 0;
        }

        let idx = self.index_for_seq(seq_id);
        let slot_is_free = self.frags[idx].is_free();

        if slot_is_free {
            self.frags[idx].fill(data, seq_id, compressed, start, end);
            self.numitems += 1;
            data.len()
        } else if self.frags[idx].seq_id == seq_id {
            self.frags[idx].retries += 1;
            self.resends += 1;
            log::trace!("duplicate fragment seq_id={seq_id}");
            0
        } else {
            // Collision with an unrelated seqID at the computed slot.
            self.oos += 1;
            log::warn!(
                "sequence collision at slot {idx}: have seq_id={}, got seq_id={seq_id}",
                self.frags[idx].seq_id
            );
            0
        }
    }

    /// `reassemble_data`: emit the next complete `start..end` run, or 0
    /// (and no mutation) if the run is incomplete. Returns bytes written
    /// and whether the message was compressed.
    pub fn reassemble_data(&mut self, out: &mut [u8]) -> Option<(usize, bool)> {
        debug_assert_eq!(self.direction, Direction::Recving);

        // Discard leading fragments that aren't the start of a message.
        let mut skip = 0;
        while skip < self.windowsize {
            let idx = seq::wrap(self.base + skip, LEN);
            let slot = &self.frags[idx];
            if slot.is_free() {
                return None;
            }
            if slot.start {
                break;
            }
            skip += 1;
        }
        if skip == self.windowsize {
            return None;
        }
        if skip > 0 {
            self.slide(skip, true);
        }

        // Scan forward from the (now-aligned) start for a contiguous run
        // terminated by `end`.
        let mut run_len = 0;
        let mut written = 0usize;
        let mut compressed = true;
        let mut complete = false;

        while run_len < self.windowsize {
            let idx = seq::wrap(self.base + run_len, LEN);
            let slot = &self.frags[idx];
            if slot.is_free() {
                break;
            }
            let frag_len = slot.len();
            if written + frag_len > out.len() {
                break;
            }
            out[written..written + frag_len].copy_from_slice(slot.data());
            written += frag_len;
            compressed &= slot.compressed;
            run_len += 1;
            if slot.end {
                complete = true;
                break;
            }
        }

        if !complete {
            return None;
        }

        self.slide(run_len, true);
        Some((written, compressed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Direction;

    fn sender() -> WindowBuffer<16, 8> {
        WindowBuffer::new(8, 100, 2, Direction::Sending)
    }

    fn receiver() -> WindowBuffer<16, 8> {
        WindowBuffer::new(8, 100, 2, Direction::Recving)
    }

    /// Scenario 1: single fragment, ideal path.
    #[test]
    fn single_fragment_ideal_path() {
        let mut w = sender();
        let n = w.add_outgoing_data(b"hello", false).unwrap();
        assert_eq!(n, 1);

        let frag = w.get_next_sending_fragment(0, None).unwrap();
        assert_eq!(frag.seq_id, 0);
        assert!(frag.start && frag.end);
        assert_eq!(frag.data, b"hello");

        w.ack(0);
        w.tick();
        assert_eq!(w.numitems(), 0);
    }

    /// Scenario 2: multi-fragment message, out-of-order receive.
    #[test]
    fn multi_fragment_reassembly_out_of_order() {
        let mut sender_w = sender();
        let data: Vec<u8> = (0..20u8).collect();
        let n = sender_w.add_outgoing_data(&data, false).unwrap();
        assert_eq!(n, 3); // 8,8,4 bytes per fragment at MAXFRAG=8

        let mut fragments = Vec::new();
        while let Some(f) = sender_w.get_next_sending_fragment(0, None) {
            fragments.push((f.seq_id, f.data.to_vec(), f.compressed, f.start, f.end));
        }

        let mut recv_w = receiver();
        // Deliver in order 2, 0, 1.
        let order = [2usize, 0, 1];
        for &i in &order {
            let (seq_id, data, compressed, start, end) = fragments[i].clone();
            recv_w.process_incoming_fragment(seq_id, &data, compressed, start, end);
        }

        let mut out = [0u8; 64];
        let (written, compressed) = recv_w.reassemble_data(&mut out).unwrap();
        assert_eq!(written, 20);
        assert_eq!(&out[..20], &data[..]);
        assert!(!compressed);
    }

    /// Scenario 3: duplicate + out-of-order.
    #[test]
    fn duplicate_and_ooo_counters() {
        let mut recv_w = receiver();
        recv_w.process_incoming_fragment(0, b"AAAAAAAA", false, true, false);
        recv_w.process_incoming_fragment(0, b"AAAAAAAA", false, true, false); // dup
        recv_w.process_incoming_fragment(1, b"BB", false, false, true);
        recv_w.process_incoming_fragment(0, b"AAAAAAAA", false, true, false); // dup again

        assert_eq!(recv_w.resends(), 2);
        assert_eq!(recv_w.oos(), 0);

        let mut out = [0u8; 64];
        let (written, _) = recv_w.reassemble_data(&mut out).unwrap();
        assert_eq!(written, 10);
    }

    /// Scenario 4: retry timeout frees the slot after max_retries + 1.
    #[test]
    fn retry_bound_frees_slot() {
        let mut w = sender();
        w.add_outgoing_data(b"x", false).unwrap();

        // attempt 1 @ t=0
        assert!(w.get_next_sending_fragment(0, None).is_some());
        // attempt 2 @ t=110 (timeout=100)
        assert!(w.get_next_sending_fragment(110, None).is_some());
        // attempt 3 @ t=220
        assert!(w.get_next_sending_fragment(220, None).is_some());
        // max_retries=2: fragment now has retries=3 > max_retries, freed on next scan
        assert!(w.get_next_sending_fragment(330, None).is_none());
        assert_eq!(w.numitems(), 0);
    }

    #[test]
    fn ack_is_idempotent_for_slide() {
        let mut w = sender();
        w.add_outgoing_data(b"a", false).unwrap();
        w.get_next_sending_fragment(0, None);

        w.ack(0);
        w.tick();
        let after_first = w.numitems();

        w.ack(0);
        w.tick();
        assert_eq!(w.numitems(), after_first);
    }

    #[test]
    fn stale_fragment_is_dropped() {
        let mut w = receiver();
        // Advance start_seq_id far enough that seq_id 0 now reads as stale.
        w.process_incoming_fragment(200, b"x", false, true, true);
        let before = w.oos();
        w.process_incoming_fragment(0, b"y", false, true, true);
        assert_eq!(w.oos(), before + 1);
    }
}
