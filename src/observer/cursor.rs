//! Poll-mode bookkeeping: which block numbers still need dispatching.

use std::ops::RangeInclusive;

/// Remembers the highest block number already dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockCursor {
    last_seen: u64,
}

impl BlockCursor {
    /// Start after `head`; blocks up to and including it are considered seen.
    pub fn new(head: u64) -> Self {
        Self { last_seen: head }
    }

    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }

    /// Numbers in `(last_seen, head]`, ascending. Empty when the head has not
    /// moved past the cursor (including a head that went backwards).
    pub fn pending(&self, head: u64) -> RangeInclusive<u64> {
        self.last_seen.saturating_add(1)..=head
    }

    /// Mark `number` as dispatched. Never moves backwards.
    pub fn advance(&mut self, number: u64) {
        self.last_seen = self.last_seen.max(number);
    }
}
