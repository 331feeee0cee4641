// Application state module
// Owns the configuration and the dispatcher shared by every connection

use std::sync::Arc;
use std::time::Duration;

use super::types::Config;
use crate::dispatch::{DispatchPolicy, Dispatcher};
use crate::store::{DocumentDirectory, DocumentStore};

/// Application state
pub struct AppState {
    pub config: Config,
    pub dispatcher: Dispatcher,
}

impl AppState {
    /// Wire the dispatcher for the configured folder on top of `store`
    pub fn new(config: &Config, store: Arc<dyn DocumentStore>) -> Self {
        let directory = DocumentDirectory::new(
            Arc::clone(&store),
            config.store.folder_id.clone(),
            Duration::from_secs(config.store.lookup_cache_ttl),
        );
        let policy = DispatchPolicy {
            reject_duplicates: config.store.reject_duplicates,
        };

        Self {
            config: config.clone(),
            dispatcher: Dispatcher::new(store, directory, policy),
        }
    }
}
