//! Command sequence counter with terminator-safe serialization
//!
//! The counter travels as 4 big-endian bytes inside every command frame.
//! The robot's firmware scans the byte stream for the `0x0A` terminator, so
//! no nibble of the counter may ever be `0xA` — a byte with a zero high
//! nibble and an `0xA` low nibble would read as end-of-frame mid-counter.

/// Remap every `0xA` nibble of `value` to `0xB`.
///
/// This is the whole safety bijection: the sanitized domain (all u32 values
/// with no `0xA` nibble) maps to itself, and the function is idempotent and
/// monotonically non-decreasing, so the counter still only ever grows.
pub fn sanitize(value: u32) -> u32 {
    let mut out = value;
    for shift in (0..32).step_by(4) {
        if (out >> shift) & 0xF == 0xA {
            out = (out & !(0xF << shift)) | (0xB << shift);
        }
    }
    out
}

/// The process-wide command counter, single-writer
#[derive(Debug)]
pub struct SequenceCounter {
    count: u32,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self { count: 1 }
    }

    /// Current counter value (the one stamped on the next command)
    pub fn peek(&self) -> u32 {
        self.count
    }

    /// Step to the next terminator-safe value
    pub fn advance(&mut self) {
        self.count = sanitize(self.count.wrapping_add(1));
    }

    /// Correlate a received ack against the outstanding command.
    ///
    /// A robot counter ahead of ours is trusted and adopted. On an exact
    /// match with a well-formed ack the counter advances and the command is
    /// committed; anything else leaves state untouched so the same command
    /// is retried next tick.
    pub fn reconcile(&mut self, ack_seq: u32, well_formed: bool) -> bool {
        if !well_formed {
            return false;
        }
        if ack_seq > self.count {
            self.count = ack_seq;
        }
        if ack_seq == self.count {
            self.advance();
            return true;
        }
        false
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::EOF;

    fn has_terminator_nibble(value: u32) -> bool {
        (0..32).step_by(4).any(|s| (value >> s) & 0xF == 0xA)
    }

    #[test]
    fn advanced_counter_never_serializes_the_terminator_digit() {
        let mut seq = SequenceCounter::new();
        for _ in 0..(1 << 20) {
            seq.advance();
            let value = seq.peek();
            assert!(!has_terminator_nibble(value), "value {value:#x}");
            for byte in value.to_be_bytes() {
                assert_ne!(byte, EOF, "value {value:#x}");
            }
        }
    }

    #[test]
    fn sanitize_is_idempotent_and_monotone() {
        for value in [0x9u32, 0xA, 0xAA, 0x1A2A, 0xFFFF_FFFA, 0xABCD_EF0A] {
            let once = sanitize(value);
            assert_eq!(sanitize(once), once);
            assert!(once >= value);
        }
        assert_eq!(sanitize(0xA), 0xB);
        assert_eq!(sanitize(0x1A2A), 0x1B2B);
    }

    #[test]
    fn matching_ack_advances_exactly_one_safe_step() {
        let mut seq = SequenceCounter::new();
        let before = seq.peek();
        assert!(seq.reconcile(before, true));
        assert_eq!(seq.peek(), sanitize(before + 1));
    }

    #[test]
    fn stale_or_malformed_ack_never_mutates() {
        let mut seq = SequenceCounter::new();
        seq.advance();
        seq.advance();
        let current = seq.peek();

        assert!(!seq.reconcile(current - 1, true));
        assert_eq!(seq.peek(), current);

        assert!(!seq.reconcile(current, false));
        assert_eq!(seq.peek(), current);
    }

    #[test]
    fn robot_ahead_is_adopted_and_committed() {
        let mut seq = SequenceCounter::new();
        assert!(seq.reconcile(0x99, true));
        // Adopted 0x99, then advanced one safe step past it.
        assert_eq!(seq.peek(), sanitize(0x9A));
        assert_eq!(seq.peek(), 0x9B);
    }
}
