//! Paginated list accumulation ("load more").
//!
//! Pages are appended in arrival order and deduplicated by id. Changing the
//! filters resets the list and bumps the generation, so a page requested
//! under the old filters is dropped when it lands.

use crate::errors::SourceError;
use crate::model::{CollectionFilters, ItemId, ListItem, SortOrder};
use crate::source::service::{CollectionService, PageRequest};
use std::collections::HashSet;
use tracing::debug;

/// A page request stamped with the generation it was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    pub generation: u64,
    pub request: PageRequest,
}

/// Accumulates pages for one filter set.
#[derive(Debug)]
pub struct PageAccumulator {
    filters: CollectionFilters,
    order: SortOrder,
    page_size: usize,
    next_page: usize,
    generation: u64,
    items: Vec<ListItem>,
    seen: HashSet<ItemId>,
    has_more: bool,
}

impl PageAccumulator {
    pub fn new(filters: CollectionFilters, page_size: usize) -> Self {
        Self {
            filters,
            order: SortOrder::default(),
            page_size: page_size.max(1),
            next_page: 0,
            generation: 0,
            items: Vec::new(),
            seen: HashSet::new(),
            has_more: true,
        }
    }

    /// Page through the listing in `order` instead of newest first.
    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn filters(&self) -> &CollectionFilters {
        &self.filters
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn pages_loaded(&self) -> usize {
        self.next_page
    }

    /// The next page to ask for, or `None` once the last page has arrived.
    pub fn next_request(&self) -> Option<PageTicket> {
        if !self.has_more {
            return None;
        }
        Some(PageTicket {
            generation: self.generation,
            request: PageRequest::new(self.next_page, self.page_size).with_order(self.order),
        })
    }

    /// Apply a page that arrived for `ticket`. Returns how many new items
    /// were appended, or `None` if the ticket is stale.
    pub fn apply(&mut self, ticket: PageTicket, page: Vec<ListItem>) -> Option<usize> {
        if ticket.generation != self.generation || ticket.request.page != self.next_page {
            debug!(
                generation = ticket.generation,
                current = self.generation,
                page = ticket.request.page,
                "discarding stale page"
            );
            return None;
        }

        self.has_more = page.len() >= self.page_size;
        self.next_page += 1;

        let mut appended = 0;
        for item in page {
            if self.seen.insert(item.id.clone()) {
                self.items.push(item);
                appended += 1;
            }
        }
        Some(appended)
    }

    /// Start over with new filters.
    pub fn reset(&mut self, filters: CollectionFilters) {
        self.filters = filters;
        self.generation += 1;
        self.next_page = 0;
        self.items.clear();
        self.seen.clear();
        self.has_more = true;
    }

    /// Request and apply the next page in one step.
    ///
    /// Returns the number of appended items; zero when nothing is left.
    pub async fn load_next(&mut self, service: &dyn CollectionService) -> Result<usize, SourceError> {
        let Some(ticket) = self.next_request() else {
            return Ok(0);
        };
        let page = service
            .list_page(&self.filters, ticket.request)
            .await
            .map_err(SourceError::Fetch)?;
        Ok(self.apply(ticket, page).unwrap_or(0))
    }
}
