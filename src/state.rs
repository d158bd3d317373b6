use std::sync::Arc;

use daysync_core::store::MemoryStore;

/// Shared application state.
///
/// The store implements both `EventStore` and `UserDirectory`; handlers
/// borrow it as whichever trait they need.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
}

impl AppState {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        AppState { store }
    }
}
