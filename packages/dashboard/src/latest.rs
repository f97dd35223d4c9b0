//! Keeps only the result of the most recent request.
//!
//! A page that reloads when a parameter changes can have several loads in
//! flight at once. Each load takes a ticket before it starts; when it
//! finishes, its result is kept only if no newer ticket has been handed out
//! since, so a slow older response never replaces a newer one.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// A slot holding the latest result of a repeated request.
#[derive(Debug, Default)]
pub struct LatestOnly<T> {
    generation: AtomicU64,
    value: Mutex<Option<(u64, T)>>,
}

impl<T: Clone> LatestOnly<T> {
    /// Creates an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            value: Mutex::new(None),
        }
    }

    /// Starts a new request and returns its ticket.
    pub fn ticket(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Stores the result of the request holding `ticket`.
    ///
    /// Returns `false`, dropping `value`, if a newer request has started.
    ///
    /// # Panics
    ///
    /// Panics if the slot's `Mutex` is poisoned.
    pub fn store(&self, ticket: u64, value: T) -> bool {
        let mut slot = self.value.lock().expect("latest-result mutex poisoned");
        if ticket != self.generation.load(Ordering::SeqCst) {
            log::debug!("Dropping stale result for request {ticket}");
            return false;
        }
        *slot = Some((ticket, value));
        true
    }

    /// Returns the latest stored result, if any.
    ///
    /// # Panics
    ///
    /// Panics if the slot's `Mutex` is poisoned.
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.value
            .lock()
            .expect("latest-result mutex poisoned")
            .as_ref()
            .map(|(_, value)| value.clone())
    }
}
