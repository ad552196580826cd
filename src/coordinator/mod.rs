//! Selection coordination for list-and-detail pages.
//!
//! The coordinator keeps the selected item consistent with the navigation
//! selector and the shared collection. A selector that names an item by
//! counterpart is turned into one that names it by id, creating the item
//! first when none exists. Every change of the selector starts a new cycle;
//! work started by an older cycle is discarded when it finishes.
//!
//! ## Architecture
//!
//! 1. **Resolver** - [`resolve`] decides what one selector means for one snapshot
//! 2. **State** - [`CoordinatorState`] turns inputs into effects, one at a time
//! 3. **Runtime** - [`Coordinator`] runs the state on a task and performs its effects
//!
//! A cycle ends in exactly one of: a selection, a navigation, or nothing yet.
//! A navigation always names an item by id, so the cycle it starts resolves
//! without navigating again.
//!
//! ## Example
//!
//! ```no_run
//! use docket::coordinator::{Coordinator, ResolverPolicy};
//! use docket::model::{CollectionFilters, EntityKind, SortOrder};
//! use docket::navigation::MemoryNavigator;
//! use docket::selector::DesiredSelector;
//! use docket::source::{CollectionSource, MemoryCollectionService, SharedCollection};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let service = Arc::new(MemoryCollectionService::new(EntityKind::Chat));
//! let collection = SharedCollection::new(
//!     CollectionSource::new(service, SortOrder::NewestFirst),
//!     CollectionFilters::default(),
//! );
//! let navigator = Arc::new(MemoryNavigator::new(DesiredSelector::counterpart("C", None)));
//!
//! let handle = Coordinator::new(collection, navigator, ResolverPolicy::default()).spawn();
//! let view = handle.wait_for(|v| v.is_resolved()).await?;
//! println!("selected {:?}", view.selection);
//! handle.dispose().await?;
//! # Ok(())
//! # }
//! ```

mod events;
mod resolver;
mod runtime;
mod state;

pub use events::{CoordinatorEvent, CycleId};
pub use resolver::{Resolution, ResolverPolicy, resolve};
pub use runtime::{Coordinator, CoordinatorHandle};
pub use state::{CoordinatorState, CyclePhase, Effect, Input, SelectionView, ViewStatus};
