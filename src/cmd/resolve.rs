//! Selection resolution over a fixture collection: `docket resolve`.
//!
//! Runs a real coordinator against an in-memory service loaded from the
//! fixture file, prints the event trace and the settled selection.

use anyhow::{Context, Result};
use docket::config::DocketConfig;
use docket::coordinator::{Coordinator, CoordinatorEvent, SelectionView, ViewStatus};
use docket::navigation::{MemoryNavigator, Navigator};
use docket::selector::DesiredSelector;
use docket::source::{CollectionSource, MemoryCollectionService, SharedCollection};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

use super::super::CollectionArgs;
use super::filters_for;

pub async fn cmd_resolve(
    config: &DocketConfig,
    args: &CollectionArgs,
    query: &str,
    save: bool,
    timeout_secs: u64,
) -> Result<()> {
    let selector = DesiredSelector::from_query(query)
        .with_context(|| format!("Invalid navigation query '{}'", query))?;
    let service = Arc::new(MemoryCollectionService::from_fixture_file(
        args.kind,
        &args.fixture,
    )?);

    let collection = SharedCollection::new(
        CollectionSource::new(service.clone(), config.sort()),
        filters_for(args),
    );
    let navigator = Arc::new(MemoryNavigator::new(selector.clone()));

    let (tx, mut rx) = mpsc::channel(64);
    let print_live = !args.json;
    let collector = tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            if print_live {
                println!("{}", describe(&event));
            }
            events.push(event);
        }
        events
    });

    let handle = Coordinator::new(collection, navigator.clone(), config.policy())
        .with_event_channel(tx)
        .spawn();

    let settled = tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        handle.wait_for(is_settled),
    )
    .await;
    handle.dispose().await?;
    let events = collector.await.context("Event collector failed")?;

    let view = match settled {
        Ok(view) => view?,
        Err(_) => anyhow::bail!("Selection did not settle within {} second(s)", timeout_secs),
    };

    let created = service.create_calls();
    if save && created > 0 {
        service.save_fixture_file(&args.fixture)?;
        info!(created, fixture = %args.fixture.display(), "saved created entities");
    }

    let final_selector = navigator.current_selector();
    if args.json {
        let output = serde_json::json!({
            "status": view.status,
            "selection": view.selection,
            "error": view.error.as_ref().map(|e| e.to_string()),
            "cycle": view.cycle,
            "selector": final_selector.to_query(),
            "replacements": navigator.replacement_count(),
            "created": created,
            "events": events,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!();
        print_view(&view);
        println!(
            "Navigation: {} ({} replacement(s))",
            final_selector,
            navigator.replacement_count()
        );
        if created > 0 {
            let saved = if save { ", saved to fixture" } else { "" };
            println!("Created {} entity(ies){}", created, saved);
        }
    }

    if let Some(ref error) = view.error {
        anyhow::bail!("Resolution failed: {}", error);
    }
    Ok(())
}

fn is_settled(view: &SelectionView) -> bool {
    matches!(
        view.status,
        ViewStatus::Resolved | ViewStatus::Pending | ViewStatus::Failed
    )
}

fn describe(event: &CoordinatorEvent) -> String {
    let detail = match event {
        CoordinatorEvent::CycleStarted { cycle, selector } => format!("[{}] {}", cycle, selector),
        CoordinatorEvent::Redirected { cycle, to } => format!("[{}] -> {}", cycle, to),
        CoordinatorEvent::CreationRequested {
            cycle,
            recipient_id,
            context,
        } => match context {
            Some(context) => format!("[{}] recipient {} ({})", cycle, recipient_id, context),
            None => format!("[{}] recipient {}", cycle, recipient_id),
        },
        CoordinatorEvent::CreationDiscarded { cycle } => format!("[{}]", cycle),
        CoordinatorEvent::Resolved { cycle, id } => format!("[{}] id {}", cycle, id),
        CoordinatorEvent::Pending { cycle } => format!("[{}]", cycle),
        CoordinatorEvent::Failed { cycle, error } => format!("[{}] {}", cycle, error),
        CoordinatorEvent::Disposed => String::new(),
    };
    format!("{:<9} {}", event.label(), detail).trim_end().to_string()
}

fn print_view(view: &SelectionView) {
    match (&view.status, &view.selection) {
        (ViewStatus::Resolved, Some(item)) => {
            println!(
                "Selected: {} (recipient {}, {})",
                item.id, item.recipient_id, item.kind
            );
            if let Some(ref topic) = item.topic {
                println!("Topic: {}", topic);
            }
        }
        (ViewStatus::Failed, _) => {
            if let Some(ref error) = view.error {
                println!("Failed: {}", error);
            }
        }
        _ => println!("Nothing selected ({})", view.status),
    }
}
