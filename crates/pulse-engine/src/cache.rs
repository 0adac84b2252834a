//! Last-action display cache.

use parking_lot::RwLock;
use pulse_core::LastAction;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-instrument most recent filled action.
///
/// Written only by the order executor on a fill; read by broadcasts for
/// display. Decision logic never consults it.
#[derive(Clone, Default)]
pub struct LastActionCache {
    inner: Arc<RwLock<HashMap<String, LastAction>>>,
}

impl LastActionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the entry for a symbol.
    pub fn record(&self, symbol: &str, action: LastAction) {
        self.inner.write().insert(symbol.to_string(), action);
    }

    pub fn get(&self, symbol: &str) -> Option<LastAction> {
        self.inner.read().get(symbol).cloned()
    }

    pub fn snapshot(&self) -> HashMap<String, LastAction> {
        self.inner.read().clone()
    }
}
