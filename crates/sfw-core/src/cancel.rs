// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellation handles for "at most one in-flight call of each kind".
//!
//! Each tier keeps one [`CancelSlot`] per logical call kind (load,
//! request-session, enable, ...). Starting a new call of that kind bumps
//! the slot's generation and returns a [`Ticket`]; the async task that
//! eventually completes checks `ticket.is_current()` before touching tier
//! state. A ticket whose generation has been superseded belongs to a
//! cancelled call and its result is discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One logical "in-flight call" slot.
#[derive(Clone, Default)]
pub struct CancelSlot(Arc<AtomicU64>);

impl CancelSlot {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU64::new(0)))
    }

    /// Start a new call, invalidating any ticket previously issued by this
    /// slot.
    pub fn begin(&self) -> Ticket {
        let generation = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            slot: self.0.clone(),
            generation,
        }
    }

    /// Invalidate any in-flight ticket without starting a new call (used on
    /// `Final`/teardown).
    pub fn cancel(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// A handle identifying one specific call attempt. Valid until a later
/// `begin()` or `cancel()` on the same slot.
pub struct Ticket {
    slot: Arc<AtomicU64>,
    generation: u64,
}

impl Ticket {
    /// True if no later call has been started or cancelled on this slot
    /// since this ticket was issued.
    pub fn is_current(&self) -> bool {
        self.slot.load(Ordering::SeqCst) == self.generation
    }
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
