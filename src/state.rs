use crate::storage::Store;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    /// Held for a whole load-mutate-persist cycle so requests in this process never interleave.
    pub cycle: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            cycle: Arc::new(Mutex::new(())),
        }
    }
}
