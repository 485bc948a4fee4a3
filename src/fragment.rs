//! The fragment slot: per-fragment metadata plus its payload view.

/// Which role a `WindowBuffer` plays; toggles the meaning of `retries`
/// and `cur_seq_id` (see the window buffer's direction-flag design note).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `cur_seq_id` is the next seqID to assign; `retries` counts send
    /// attempts.
    Sending,
    /// `cur_seq_id` is the next expected seqID; `retries` counts
    /// duplicate arrivals.
    Recving,
}

/// One protocol fragment: payload bytes plus the bookkeeping a window
/// slot needs regardless of which direction owns it.
///
/// `N` bounds the payload (`MAX_FRAGSIZE_UP` for a sending window,
/// `MAX_FRAGSIZE_DOWN` for a receiving one).
#[derive(Debug, Clone)]
pub struct FragmentSlot<const N: usize> {
    payload: [u8; N],
    /// Bytes of `payload` that are valid. Zero means the slot is free (I3).
    len: usize,
    /// Sequence ID in `[0, 256)`.
    pub seq_id: u8,
    /// Timestamp of the most recent transmission attempt.
    pub last_sent: u64,
    /// Send-side: transmission attempts. Recv-side: duplicate-arrival count.
    pub retries: u16,
    /// Send-side cumulative ACK count.
    pub acks: u16,
    /// Piggybacked opposite-direction ACK; `None` when unset.
    pub ack_other: Option<u8>,
    /// Fragment carries a compressed chunk.
    pub compressed: bool,
    /// First fragment of a message.
    pub start: bool,
    /// Last fragment of a message.
    pub end: bool,
}

impl<const N: usize> FragmentSlot<N> {
    /// An empty, free slot.
    pub const fn empty() -> Self {
        Self {
            payload: [0u8; N],
            len: 0,
            seq_id: 0,
            last_sent: 0,
            retries: 0,
            acks: 0,
            ack_other: None,
            compressed: false,
            start: false,
            end: false,
        }
    }

    /// True when the slot holds no fragment (I3).
    #[inline]
    pub const fn is_free(&self) -> bool {
        self.len == 0
    }

    /// Bytes of `payload` currently valid.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// The fragment's payload.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.payload[..self.len]
    }

    /// Fills the slot with a new fragment. Overwrites whatever was there.
    #[allow(clippy::too_many_arguments)]
    pub fn fill(
        &mut self,
        data: &[u8],
        seq_id: u8,
        compressed: bool,
        start: bool,
        end: bool,
    ) {
        debug_assert!(data.len() <= N);
        self.payload[..data.len()].copy_from_slice(data);
        self.len = data.len();
        self.seq_id = seq_id;
        self.last_sent = 0;
        self.retries = 0;
        self.acks = 0;
        self.ack_other = None;
        self.compressed = compressed;
        self.start = start;
        self.end = end;
    }

    /// Frees the slot (I3).
    pub fn free(&mut self) {
        self.len = 0;
    }
}

impl<const N: usize> Default for FragmentSlot<N> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slot_is_free() {
        let slot: FragmentSlot<8> = FragmentSlot::empty();
        assert!(slot.is_free());
        assert_eq!(slot.len(), 0);
    }

    #[test]
    fn fill_and_free_round_trip() {
        let mut slot: FragmentSlot<8> = FragmentSlot::empty();
        slot.fill(b"hello", 3, false, true, true);
        assert!(!slot.is_free());
        assert_eq!(slot.data(), b"hello");
        assert_eq!(slot.seq_id, 3);
        assert!(slot.start && slot.end);

        slot.free();
        assert!(slot.is_free());
    }
}
