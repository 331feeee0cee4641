//! Document directory
//!
//! Resolves document names to ids for one folder. The folder listing is
//! cached for at most `cache_ttl` and dropped whenever the dispatcher writes
//! a new document. A listing that was in flight across an invalidation is
//! returned to its caller but never cached, so lookups never serve a listing
//! older than the last create.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{DocumentStore, DocumentSummary, StoreError};
use crate::logger;

struct CachedListing {
    fetched_at: Instant,
    documents: Arc<Vec<DocumentSummary>>,
}

/// Name-to-id lookup over one folder of the document store
pub struct DocumentDirectory {
    store: Arc<dyn DocumentStore>,
    folder_id: String,
    cache_ttl: Duration,
    cache: RwLock<Option<CachedListing>>,
    /// Bumped by every `invalidate`
    generation: AtomicU64,
}

impl DocumentDirectory {
    /// A zero `cache_ttl` disables caching: every lookup lists the folder.
    pub fn new(store: Arc<dyn DocumentStore>, folder_id: String, cache_ttl: Duration) -> Self {
        Self {
            store,
            folder_id,
            cache_ttl,
            cache: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn folder_id(&self) -> &str {
        &self.folder_id
    }

    /// Find the first document whose name equals `name` exactly
    pub async fn lookup_by_name(&self, name: &str) -> Result<Option<DocumentSummary>, StoreError> {
        let documents = self.listing().await?;
        Ok(documents.iter().find(|d| d.name == name).cloned())
    }

    /// Drop the cached listing
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        *cache = None;
    }

    /// Fetch the listing ahead of the first request
    ///
    /// Returns the number of documents found. Errors are logged and returned;
    /// callers may continue since the next lookup retries the listing.
    pub async fn warm(&self) -> Result<usize, StoreError> {
        match self.refresh().await {
            Ok(documents) => Ok(documents.len()),
            Err(e) => {
                logger::log_warning(&format!(
                    "Could not list folder {} at startup: {e}",
                    self.folder_id
                ));
                Err(e)
            }
        }
    }

    async fn listing(&self) -> Result<Arc<Vec<DocumentSummary>>, StoreError> {
        if !self.cache_ttl.is_zero() {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(Arc::clone(&cached.documents));
                }
            }
        }
        self.refresh().await
    }

    async fn refresh(&self) -> Result<Arc<Vec<DocumentSummary>>, StoreError> {
        let generation = self.generation.load(Ordering::Acquire);
        let documents = Arc::new(self.store.list_documents(&self.folder_id).await?);
        logger::log_debug(&format!(
            "[Directory] Listed {} document(s) in folder {}",
            documents.len(),
            self.folder_id
        ));

        if !self.cache_ttl.is_zero() {
            let mut cache = self.cache.write().await;
            if self.generation.load(Ordering::Acquire) == generation {
                *cache = Some(CachedListing {
                    fetched_at: Instant::now(),
                    documents: Arc::clone(&documents),
                });
            }
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{EditDirective, InMemoryStore};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    /// Store whose first listing is taken, then held until released
    struct GatedStore {
        inner: InMemoryStore,
        entered: Mutex<Option<oneshot::Sender<()>>>,
        release: Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl DocumentStore for GatedStore {
        async fn list_documents(&self, folder_id: &str) -> Result<Vec<DocumentSummary>, StoreError> {
            let snapshot = self.inner.list_documents(folder_id).await?;
            let entered = self.entered.lock().unwrap().take();
            let release = self.release.lock().unwrap().take();
            if let (Some(entered), Some(release)) = (entered, release) {
                let _ = entered.send(());
                let _ = release.await;
            }
            Ok(snapshot)
        }

        async fn create_document(
            &self,
            name: &str,
            folder_id: &str,
        ) -> Result<DocumentSummary, StoreError> {
            self.inner.create_document(name, folder_id).await
        }

        async fn batch_update(
            &self,
            document_id: &str,
            directives: &[EditDirective],
        ) -> Result<(), StoreError> {
            self.inner.batch_update(document_id, directives).await
        }
    }

    fn directory(store: &Arc<InMemoryStore>, ttl_secs: u64) -> DocumentDirectory {
        let store: Arc<dyn DocumentStore> = store.clone();
        DocumentDirectory::new(store, "folder".to_string(), Duration::from_secs(ttl_secs))
    }

    #[tokio::test]
    async fn test_lookup_is_exact_and_case_sensitive() {
        let store = Arc::new(InMemoryStore::new());
        let doc = store.insert("folder", "Report");
        let dir = directory(&store, 0);

        assert_eq!(dir.lookup_by_name("Report").await.unwrap(), Some(doc));
        assert_eq!(dir.lookup_by_name("report").await.unwrap(), None);
        assert_eq!(dir.lookup_by_name("Rep").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let store = Arc::new(InMemoryStore::new());
        let first = store.insert("folder", "Dup");
        store.insert("folder", "Dup");
        let dir = directory(&store, 0);

        assert_eq!(dir.lookup_by_name("Dup").await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_zero_ttl_queries_every_time() {
        let store = Arc::new(InMemoryStore::new());
        let dir = directory(&store, 0);

        dir.lookup_by_name("a").await.unwrap();
        dir.lookup_by_name("b").await.unwrap();
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_serves_until_invalidated() {
        let store = Arc::new(InMemoryStore::new());
        let dir = directory(&store, 300);
        assert_eq!(dir.warm().await.unwrap(), 0);

        let doc = store.insert("folder", "Late");
        assert_eq!(dir.lookup_by_name("Late").await.unwrap(), None);
        assert_eq!(store.list_calls(), 1);

        dir.invalidate().await;
        assert_eq!(dir.lookup_by_name("Late").await.unwrap(), Some(doc));
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expires_after_ttl() {
        let store = Arc::new(InMemoryStore::new());
        let dir = directory(&store, 30);
        dir.warm().await.unwrap();

        let doc = store.insert("folder", "Later");
        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(dir.lookup_by_name("Later").await.unwrap(), Some(doc));
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_listing_in_flight_across_invalidate_is_not_cached() {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let store = Arc::new(GatedStore {
            inner: InMemoryStore::new(),
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(Some(release_rx)),
        });
        let dyn_store: Arc<dyn DocumentStore> = store.clone();
        let dir = Arc::new(DocumentDirectory::new(
            dyn_store,
            "folder".to_string(),
            Duration::from_secs(300),
        ));

        let in_flight = tokio::spawn({
            let dir = Arc::clone(&dir);
            async move { dir.lookup_by_name("Report").await }
        });
        entered_rx.await.unwrap();

        let created = store.create_document("Report", "folder").await.unwrap();
        dir.invalidate().await;
        release_tx.send(()).unwrap();

        assert_eq!(in_flight.await.unwrap().unwrap(), None);
        assert_eq!(dir.lookup_by_name("Report").await.unwrap(), Some(created));
        assert_eq!(store.inner.list_calls(), 2);
    }
}
