//! Shared last-value cache over a [`CollectionSource`].
//!
//! Any number of consumers subscribe to the same collection and share one
//! underlying fetch. A fetch starts when the subscriber count goes from zero
//! to one, or on an explicit [`SharedCollection::invalidate`]. Every fetch is
//! tagged with a generation; only the latest generation may publish.

use crate::errors::SourceError;
use crate::model::{CollectionFilters, ListItem};
use crate::source::collection::CollectionSource;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// The last published state of a shared collection.
#[derive(Debug, Clone, Default)]
pub struct CollectionSnapshot {
    /// Generation of the fetch this snapshot describes
    pub generation: u64,
    /// Last successfully fetched items, sorted
    pub items: Option<Arc<Vec<ListItem>>>,
    /// A fetch is in flight
    pub loading: bool,
    /// The most recent fetch failed; `items` still holds the last good list
    pub error: Option<Arc<SourceError>>,
}

impl CollectionSnapshot {
    /// Check if a fetch has ever completed successfully.
    pub fn is_ready(&self) -> bool {
        self.items.is_some() && !self.loading && self.error.is_none()
    }
}

#[derive(Debug, Default)]
struct CacheState {
    subscribers: usize,
    generation: u64,
    fetches: Vec<JoinHandle<()>>,
}

struct SharedInner {
    source: CollectionSource,
    filters: CollectionFilters,
    state: Mutex<CacheState>,
    tx: watch::Sender<CollectionSnapshot>,
}

impl SharedInner {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A collection shared between consumers with reference counting.
#[derive(Clone)]
pub struct SharedCollection {
    inner: Arc<SharedInner>,
}

impl SharedCollection {
    pub fn new(source: CollectionSource, filters: CollectionFilters) -> Self {
        let (tx, _rx) = watch::channel(CollectionSnapshot::default());
        Self {
            inner: Arc::new(SharedInner {
                source,
                filters,
                state: Mutex::new(CacheState::default()),
                tx,
            }),
        }
    }

    pub fn filters(&self) -> &CollectionFilters {
        &self.inner.filters
    }

    pub fn source(&self) -> &CollectionSource {
        &self.inner.source
    }

    /// Register a consumer. The first one triggers a fetch.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(&self) -> CollectionSubscription {
        let rx = self.inner.tx.subscribe();
        {
            let mut state = self.inner.lock();
            state.subscribers += 1;
            if state.subscribers == 1 {
                debug!("first subscriber, fetching collection");
                start_fetch(&self.inner, &mut state);
            }
        }
        CollectionSubscription {
            inner: self.inner.clone(),
            rx,
        }
    }

    /// Drop the cached list and refetch. A no-op without subscribers; the
    /// next subscriber fetches anyway.
    pub fn invalidate(&self) {
        invalidate(&self.inner);
    }

    /// The last published snapshot.
    pub fn snapshot(&self) -> CollectionSnapshot {
        self.inner.tx.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers
    }
}

impl std::fmt::Debug for SharedCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCollection")
            .field("filters", &self.inner.filters)
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

/// A registered consumer. Dropping it unregisters; dropping the last one
/// aborts any fetch still in flight.
pub struct CollectionSubscription {
    inner: Arc<SharedInner>,
    rx: watch::Receiver<CollectionSnapshot>,
}

impl CollectionSubscription {
    /// The receiver the consumer waits on.
    pub fn receiver(&mut self) -> &mut watch::Receiver<CollectionSnapshot> {
        &mut self.rx
    }

    /// Read the current snapshot and mark it seen.
    pub fn current(&mut self) -> CollectionSnapshot {
        self.rx.borrow_and_update().clone()
    }

    pub fn invalidate(&self) {
        invalidate(&self.inner);
    }
}

impl Drop for CollectionSubscription {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        state.subscribers = state.subscribers.saturating_sub(1);
        if state.subscribers == 0 {
            let aborted = state.fetches.len();
            for fetch in state.fetches.drain(..) {
                fetch.abort();
            }
            // A later fetch must not be mistaken for the aborted one.
            state.generation += 1;
            self.inner.tx.send_modify(|snapshot| snapshot.loading = false);
            debug!(aborted, "last subscriber left");
        }
    }
}

fn invalidate(inner: &Arc<SharedInner>) {
    let mut state = inner.lock();
    if state.subscribers == 0 {
        return;
    }
    debug!("collection invalidated");
    start_fetch(inner, &mut state);
}

fn start_fetch(inner: &Arc<SharedInner>, state: &mut CacheState) {
    state.generation += 1;
    let generation = state.generation;
    state.fetches.retain(|fetch| !fetch.is_finished());

    inner.tx.send_modify(|snapshot| {
        snapshot.generation = generation;
        snapshot.loading = true;
        snapshot.error = None;
    });

    let task_inner = inner.clone();
    let handle = tokio::spawn(async move { run_fetch(task_inner, generation).await });
    state.fetches.push(handle);
}

async fn run_fetch(inner: Arc<SharedInner>, generation: u64) {
    let result = inner.source.fetch(&inner.filters).await;

    let state = inner.lock();
    if state.generation != generation {
        debug!(generation, current = state.generation, "discarding stale fetch");
        return;
    }

    match result {
        Ok(items) => {
            debug!(generation, count = items.len(), "collection fetched");
            inner.tx.send_modify(|snapshot| {
                snapshot.items = Some(Arc::new(items));
                snapshot.loading = false;
                snapshot.error = None;
            });
        }
        Err(e) => {
            warn!(generation, error = %e, "collection fetch failed");
            inner.tx.send_modify(|snapshot| {
                snapshot.loading = false;
                snapshot.error = Some(Arc::new(e));
            });
        }
    }
    drop(state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityKind, ItemId, SortOrder};
    use crate::source::service::MemoryCollectionService;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn service_with(ids: &[i64]) -> Arc<MemoryCollectionService> {
        let items = ids
            .iter()
            .map(|&id| {
                ListItem::new(
                    id,
                    &format!("r{}", id),
                    EntityKind::Chat,
                    Utc.timestamp_opt(id, 0).unwrap(),
                )
            })
            .collect();
        Arc::new(MemoryCollectionService::with_items(EntityKind::Chat, items))
    }

    fn shared(service: Arc<MemoryCollectionService>) -> SharedCollection {
        SharedCollection::new(
            CollectionSource::new(service, SortOrder::NewestFirst),
            CollectionFilters::default(),
        )
    }

    async fn wait_ready(sub: &mut CollectionSubscription) -> CollectionSnapshot {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let snapshot = sub.current();
                if !snapshot.loading && (snapshot.items.is_some() || snapshot.error.is_some()) {
                    return snapshot;
                }
                sub.receiver().changed().await.unwrap();
            }
        })
        .await
        .expect("collection never settled")
    }

    #[tokio::test]
    async fn test_subscribers_share_one_fetch() {
        let service = service_with(&[1, 2]);
        let collection = shared(service.clone());

        let mut first = collection.subscribe();
        let mut second = collection.subscribe();
        assert_eq!(collection.subscriber_count(), 2);

        let a = wait_ready(&mut first).await;
        let b = wait_ready(&mut second).await;
        assert_eq!(a.items, b.items);
        assert_eq!(service.list_calls(), 1);
        assert_eq!(a.items.unwrap()[0].id, ItemId::Num(2));
    }

    #[tokio::test]
    async fn test_invalidate_refetches() {
        let service = service_with(&[1]);
        let collection = shared(service.clone());
        let mut sub = collection.subscribe();
        wait_ready(&mut sub).await;

        service.insert(ListItem::new(
            9,
            "r9",
            EntityKind::Chat,
            Utc.timestamp_opt(9, 0).unwrap(),
        ));
        collection.invalidate();
        let snapshot = wait_ready(&mut sub).await;

        assert_eq!(service.list_calls(), 2);
        assert_eq!(snapshot.items.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_without_subscribers_is_noop() {
        let service = service_with(&[1]);
        let collection = shared(service.clone());
        collection.invalidate();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(service.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_resubscribe_refetches() {
        let service = service_with(&[1]);
        let collection = shared(service.clone());

        let mut sub = collection.subscribe();
        wait_ready(&mut sub).await;
        drop(sub);
        assert_eq!(collection.subscriber_count(), 0);

        let mut sub = collection.subscribe();
        wait_ready(&mut sub).await;
        assert_eq!(service.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_stale_fetch_is_discarded() {
        let service = service_with(&[1]);
        service.hold_listings();
        let collection = shared(service.clone());

        let mut sub = collection.subscribe();
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Second fetch supersedes the first before either completes.
        collection.invalidate();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(service.list_calls(), 2);

        // The gate is FIFO: this permit lets the superseded fetch finish.
        service.release_listings(1);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let snapshot = sub.current();
        assert!(snapshot.loading);
        assert!(snapshot.items.is_none());

        service.release_listings(1);
        let snapshot = wait_ready(&mut sub).await;
        assert_eq!(snapshot.generation, 2);
        assert_eq!(snapshot.items.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_last_good_items() {
        let service = service_with(&[1, 2]);
        let collection = shared(service.clone());
        let mut sub = collection.subscribe();
        wait_ready(&mut sub).await;

        service.fail_listing(Some("offline"));
        collection.invalidate();
        let snapshot = wait_ready(&mut sub).await;

        assert!(snapshot.error.is_some());
        assert_eq!(snapshot.items.unwrap().len(), 2);
        assert!(!collection.snapshot().is_ready());
    }

    #[tokio::test]
    async fn test_last_unsubscribe_aborts_fetch() {
        let service = service_with(&[1]);
        service.hold_listings();
        let collection = shared(service.clone());

        let sub = collection.subscribe();
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(sub);

        service.release_listings(1);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let snapshot = collection.snapshot();
        assert!(snapshot.items.is_none());
        assert!(!snapshot.loading);
    }
}
