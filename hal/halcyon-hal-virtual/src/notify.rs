//! Registrable completion notifiers
//!
//! Each slot holds at most one callback. Registering replaces the previous
//! one; firing an empty slot does nothing.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Single-callback slot
pub struct NotifierSlot<F: Copy> {
    slot: Mutex<CriticalSectionRawMutex, Cell<Option<F>>>,
}

impl<F: Copy> NotifierSlot<F> {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
        }
    }

    /// Install `callback`, replacing any previous one
    pub fn register(&self, callback: F) {
        self.slot.lock(|slot| slot.set(Some(callback)));
    }

    /// Empty the slot
    pub fn clear(&self) {
        self.slot.lock(|slot| slot.set(None));
    }

    /// Current callback, if any
    pub fn get(&self) -> Option<F> {
        self.slot.lock(|slot| slot.get())
    }
}

impl<F: Copy> Default for NotifierSlot<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    static HITS: AtomicU32 = AtomicU32::new(0);

    fn add_one(n: u32) {
        HITS.fetch_add(n, Ordering::SeqCst);
    }

    fn add_hundred(n: u32) {
        HITS.fetch_add(100 * n, Ordering::SeqCst);
    }

    #[test]
    fn test_register_replaces() {
        let slot: NotifierSlot<fn(u32)> = NotifierSlot::new();
        assert!(slot.get().is_none());

        slot.register(add_one);
        slot.register(add_hundred);
        if let Some(f) = slot.get() {
            f(1);
        }
        assert_eq!(HITS.load(Ordering::SeqCst), 100);

        slot.clear();
        assert!(slot.get().is_none());
    }
}
