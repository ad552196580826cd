//! Collection sources: the service port, fetch-and-sort, the shared cache
//! and paginated accumulation.
//!
//! ## Architecture
//!
//! 1. **Service** - [`CollectionService`] is the backend port (list, create, page)
//! 2. **Source** - [`CollectionSource`] issues one listing per fetch and sorts it
//! 3. **Shared** - [`SharedCollection`] shares the last fetched list between consumers
//! 4. **Pagination** - [`PageAccumulator`] appends pages for "load more" lists

mod collection;
mod pagination;
mod service;
mod shared;

pub use collection::CollectionSource;
pub use pagination::{PageAccumulator, PageTicket};
pub use service::{CollectionService, MemoryCollectionService, PageRequest};
pub use shared::{CollectionSnapshot, CollectionSubscription, SharedCollection};
