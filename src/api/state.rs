use std::sync::Arc;

use crate::store::EventStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub default_locale: Arc<String>,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>, default_locale: impl Into<String>) -> Self {
        Self {
            store,
            default_locale: Arc::new(default_locale.into()),
        }
    }
}
