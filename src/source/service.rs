//! The collection service port and its in-memory implementation.

use crate::model::{CollectionFilters, EntityKind, ItemId, ListItem, SortOrder};
use crate::wire::{WireEntity, parse_entities};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Semaphore;

/// One page of a paginated listing, zero-based, in `order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
    pub order: SortOrder,
}

impl PageRequest {
    pub fn new(page: usize, size: usize) -> Self {
        Self {
            page,
            size,
            order: SortOrder::default(),
        }
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

/// Backing service that lists and creates entities.
/// Real implementation: the REST backend. Test double: `MemoryCollectionService`.
///
/// Creation is not guaranteed idempotent.
#[async_trait]
pub trait CollectionService: Send + Sync {
    async fn list_entities(&self, filters: &CollectionFilters) -> Result<Vec<ListItem>>;

    async fn create_entity(&self, recipient_id: &str, context: Option<&str>) -> Result<ListItem>;

    /// List one page. The default sorts a full listing and slices it.
    async fn list_page(
        &self,
        filters: &CollectionFilters,
        page: PageRequest,
    ) -> Result<Vec<ListItem>> {
        let mut all = self.list_entities(filters).await?;
        page.order.apply(&mut all);
        Ok(all.into_iter().skip(page.offset()).take(page.size).collect())
    }
}

/// A switch that can hold calls until permits are released.
#[derive(Debug)]
struct Gate {
    enabled: AtomicBool,
    permits: Semaphore,
}

impl Gate {
    fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            permits: Semaphore::new(0),
        }
    }

    async fn pass(&self) {
        if !self.enabled.load(Ordering::SeqCst) {
            return;
        }
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    items: Vec<ListItem>,
    next_id: i64,
    fail_list: Option<String>,
    fail_create: Option<String>,
}

/// In-process collection service backed by a vector.
///
/// Created entities get ascending numeric ids and `created_at = now`.
#[derive(Debug)]
pub struct MemoryCollectionService {
    kind: EntityKind,
    state: Mutex<MemoryState>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    list_gate: Gate,
    create_gate: Gate,
}

impl MemoryCollectionService {
    /// Create a service that produces entities of `kind`.
    pub fn new(kind: EntityKind) -> Self {
        Self::with_items(kind, Vec::new())
    }

    /// Create a service seeded with items, in backend response order.
    pub fn with_items(kind: EntityKind, items: Vec<ListItem>) -> Self {
        let next_id = items
            .iter()
            .filter_map(|item| match item.id {
                ItemId::Num(n) => Some(n),
                ItemId::Text(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        Self {
            kind,
            state: Mutex::new(MemoryState {
                items,
                next_id,
                ..Default::default()
            }),
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            list_gate: Gate::new(),
            create_gate: Gate::new(),
        }
    }

    /// Load a JSON fixture file (an array of wire entities).
    pub fn from_fixture_file(kind: EntityKind, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture file: {}", path.display()))?;
        let items = parse_entities(&content)
            .with_context(|| format!("Failed to parse fixture file: {}", path.display()))?;
        Ok(Self::with_items(kind, items))
    }

    /// Write every item back as a JSON fixture file.
    pub fn save_fixture_file(&self, path: &Path) -> Result<()> {
        let entities: Vec<WireEntity> = self.items().iter().map(WireEntity::from).collect();
        let content =
            serde_json::to_string_pretty(&entities).context("Failed to serialize fixtures")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write fixture file: {}", path.display()))?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All stored items in insertion order.
    pub fn items(&self) -> Vec<ListItem> {
        self.lock().items.clone()
    }

    /// Insert an item as if another client had created it.
    pub fn insert(&self, item: ListItem) {
        self.lock().items.push(item);
    }

    /// Remove an item by id, returning whether it existed.
    pub fn remove(&self, id: &ItemId) -> bool {
        let mut state = self.lock();
        let before = state.items.len();
        state.items.retain(|item| &item.id != id);
        state.items.len() != before
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Make listings fail with `message` (or succeed again with `None`).
    pub fn fail_listing(&self, message: Option<&str>) {
        self.lock().fail_list = message.map(str::to_string);
    }

    /// Make creations fail with `message` (or succeed again with `None`).
    pub fn fail_creation(&self, message: Option<&str>) {
        self.lock().fail_create = message.map(str::to_string);
    }

    /// Hold listings until `release_listings` is called.
    pub fn hold_listings(&self) {
        self.list_gate.enabled.store(true, Ordering::SeqCst);
    }

    pub fn release_listings(&self, count: usize) {
        self.list_gate.permits.add_permits(count);
    }

    /// Hold creations until `release_creations` is called.
    pub fn hold_creations(&self) {
        self.create_gate.enabled.store(true, Ordering::SeqCst);
    }

    pub fn release_creations(&self, count: usize) {
        self.create_gate.permits.add_permits(count);
    }
}

#[async_trait]
impl CollectionService for MemoryCollectionService {
    async fn list_entities(&self, filters: &CollectionFilters) -> Result<Vec<ListItem>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.list_gate.pass().await;

        let state = self.lock();
        if let Some(ref message) = state.fail_list {
            anyhow::bail!("{}", message);
        }
        Ok(state
            .items
            .iter()
            .filter(|item| filters.matches(item))
            .cloned()
            .collect())
    }

    async fn create_entity(&self, recipient_id: &str, context: Option<&str>) -> Result<ListItem> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.create_gate.pass().await;

        let mut state = self.lock();
        if let Some(ref message) = state.fail_create {
            anyhow::bail!("{}", message);
        }
        let id = state.next_id;
        state.next_id += 1;

        let mut item = ListItem::new(id, recipient_id, self.kind, Utc::now());
        item.topic = context.map(str::to_string);
        state.items.push(item.clone());
        Ok(item)
    }
}
