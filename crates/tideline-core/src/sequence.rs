use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Numbers the requests of one logical query so that only the most
/// recently issued one may write its result.
#[derive(Debug, Default)]
pub struct QuerySequence {
    issued: AtomicU64,
}

impl QuerySequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.issued.load(Ordering::Acquire) == ticket.0
    }

    /// `Some(value)` if `ticket` is still the latest, otherwise the value is dropped.
    pub fn accept<V>(&self, ticket: Ticket, value: V) -> Option<V> {
        if self.is_latest(ticket) {
            Some(value)
        } else {
            debug!(
                ticket = ticket.0,
                latest = self.issued.load(Ordering::Acquire),
                "discarding stale response"
            );
            None
        }
    }
}
