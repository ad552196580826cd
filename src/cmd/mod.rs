//! CLI command implementations.
//!
//! | Module    | Commands handled |
//! |-----------|------------------|
//! | `list`    | `List`           |
//! | `resolve` | `Resolve`        |
//! | `config`  | `Config`         |

pub mod config;
pub mod list;
pub mod resolve;

pub use config::cmd_config;
pub use list::cmd_list;
pub use resolve::cmd_resolve;

use super::CollectionArgs;
use docket::model::CollectionFilters;

/// Filters selected by the shared collection flags.
fn filters_for(args: &CollectionArgs) -> CollectionFilters {
    let mut filters = CollectionFilters::default().with_kind(args.kind);
    if let Some(ref status) = args.status {
        filters = filters.with_status(status);
    }
    if let Some(ref topic) = args.topic {
        filters = filters.with_topic(topic);
    }
    filters
}
