//! Collection source: one listing call per fetch, then a stable sort.

use crate::errors::SourceError;
use crate::model::{CollectionFilters, ListItem, SortOrder};
use crate::source::service::CollectionService;
use std::sync::Arc;

/// Produces the current list of entities for the signed-in actor.
///
/// No retries: a failed call is returned to the caller as-is.
#[derive(Clone)]
pub struct CollectionSource {
    service: Arc<dyn CollectionService>,
    order: SortOrder,
}

impl CollectionSource {
    pub fn new(service: Arc<dyn CollectionService>, order: SortOrder) -> Self {
        Self { service, order }
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn service(&self) -> &Arc<dyn CollectionService> {
        &self.service
    }

    /// Fetch and sort. Ties keep the backend's response order.
    pub async fn fetch(&self, filters: &CollectionFilters) -> Result<Vec<ListItem>, SourceError> {
        let mut items = self
            .service
            .list_entities(filters)
            .await
            .map_err(SourceError::Fetch)?;
        self.order.apply(&mut items);
        Ok(items)
    }

    /// Issue exactly one creation request.
    pub async fn create(
        &self,
        recipient_id: &str,
        context: Option<&str>,
    ) -> Result<ListItem, SourceError> {
        self.service
            .create_entity(recipient_id, context)
            .await
            .map_err(|source| SourceError::Create {
                recipient_id: recipient_id.to_string(),
                source,
            })
    }
}

impl std::fmt::Debug for CollectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionSource")
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}
