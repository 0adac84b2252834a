//! Per-instrument in-flight order slots.

use dashmap::DashMap;
use std::sync::Arc;

/// Tracks which instruments currently have an unresolved order.
///
/// At most one in-flight order per instrument: a slot is taken when an
/// order is about to be submitted and released when it reaches a terminal
/// state (guard drop), so overlapping decision cycles cannot submit
/// duplicates for the same symbol.
#[derive(Clone, Default)]
pub struct InFlightGuard {
    slots: Arc<DashMap<String, ()>>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for a symbol. `None` when an order for that symbol
    /// is already in flight.
    pub fn try_acquire(&self, symbol: &str) -> Option<InFlightSlot> {
        use dashmap::mapref::entry::Entry;

        match self.slots.entry(symbol.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(vacant) => {
                vacant.insert(());
                Some(InFlightSlot {
                    slots: Arc::clone(&self.slots),
                    symbol: symbol.to_string(),
                })
            }
        }
    }

    /// Whether a symbol currently holds an in-flight order.
    pub fn is_in_flight(&self, symbol: &str) -> bool {
        self.slots.contains_key(symbol)
    }
}

/// Releases the instrument's slot on drop.
pub struct InFlightSlot {
    slots: Arc<DashMap<String, ()>>,
    symbol: String,
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.slots.remove(&self.symbol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_refused() {
        let guard = InFlightGuard::new();
        let slot = guard.try_acquire("FFIE");
        assert!(slot.is_some());
        assert!(guard.try_acquire("FFIE").is_none());
        assert!(guard.is_in_flight("FFIE"));
    }

    #[test]
    fn test_slot_released_on_drop() {
        let guard = InFlightGuard::new();
        {
            let _slot = guard.try_acquire("FFIE").unwrap();
            assert!(guard.is_in_flight("FFIE"));
        }
        assert!(!guard.is_in_flight("FFIE"));
        assert!(guard.try_acquire("FFIE").is_some());
    }

    #[test]
    fn test_slots_are_per_symbol() {
        let guard = InFlightGuard::new();
        let _a = guard.try_acquire("FFIE").unwrap();
        assert!(guard.try_acquire("NXTC").is_some());
    }
}
