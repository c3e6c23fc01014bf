use std::sync::Arc;

use crate::storage::ProductStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }
}
