//! Paginated collection listing: `docket list`.

use anyhow::{Context, Result};
use docket::config::DocketConfig;
use docket::errors::ConfigError;
use docket::model::ListItem;
use docket::source::{MemoryCollectionService, PageAccumulator};
use tracing::debug;

use super::super::CollectionArgs;
use super::filters_for;

pub async fn cmd_list(
    config: &DocketConfig,
    args: &CollectionArgs,
    counterpart: Option<&str>,
    pages: usize,
    all: bool,
) -> Result<()> {
    let page_size = config.page_size();
    if page_size == 0 {
        return Err(ConfigError::InvalidPageSize(page_size).into());
    }

    let service = MemoryCollectionService::from_fixture_file(args.kind, &args.fixture)?;
    let mut filters = filters_for(args);
    if let Some(counterpart) = counterpart {
        filters = filters.with_counterpart(counterpart);
    }

    let mut accumulator = PageAccumulator::new(filters, page_size).with_order(config.sort());
    while accumulator.has_more() && (all || accumulator.pages_loaded() < pages) {
        let appended = accumulator
            .load_next(&service)
            .await
            .context("Failed to load page")?;
        debug!(page = accumulator.pages_loaded(), appended, "page loaded");
    }

    if args.json {
        let output = serde_json::json!({
            "items": accumulator.items(),
            "pages": accumulator.pages_loaded(),
            "has_more": accumulator.has_more(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_items(accumulator.items());
    println!();
    if accumulator.has_more() {
        println!(
            "{} items from {} page(s); more available",
            accumulator.items().len(),
            accumulator.pages_loaded()
        );
    } else {
        println!(
            "{} items from {} page(s)",
            accumulator.items().len(),
            accumulator.pages_loaded()
        );
    }
    Ok(())
}

pub(crate) fn print_items(items: &[ListItem]) {
    if items.is_empty() {
        println!("No entities found.");
        return;
    }
    println!(
        "{:<10} {:<16} {:<8} {:<22} Title",
        "Id", "Recipient", "Kind", "Created"
    );
    println!(
        "{:<10} {:<16} {:<8} {:<22} -----",
        "----------", "----------------", "--------", "----------------------"
    );
    for item in items {
        println!(
            "{:<10} {:<16} {:<8} {:<22} {}",
            item.id.to_string(),
            item.recipient_id,
            item.kind.to_string(),
            item.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            item.title.as_deref().or(item.topic.as_deref()).unwrap_or("-")
        );
    }
}
