//! The coordinator task: feeds channel activity into the reducer and carries
//! out the effects it returns.

use crate::coordinator::events::{CoordinatorEvent, CycleId};
use crate::coordinator::resolver::ResolverPolicy;
use crate::coordinator::state::{CoordinatorState, Effect, Input, SelectionView};
use crate::errors::{CoordinatorError, SourceError};
use crate::model::ListItem;
use crate::navigation::Navigator;
use crate::selector::DesiredSelector;
use crate::source::{
    CollectionSnapshot, CollectionSource, CollectionSubscription, SharedCollection,
};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

/// Requests a handle sends to its running coordinator.
#[derive(Debug)]
enum Command {
    Navigate(DesiredSelector),
    Refresh,
    Dispose,
}

/// Builder for one page's coordinator.
pub struct Coordinator {
    collection: SharedCollection,
    navigator: Arc<dyn Navigator>,
    policy: ResolverPolicy,
    event_tx: Option<mpsc::Sender<CoordinatorEvent>>,
}

impl Coordinator {
    pub fn new(
        collection: SharedCollection,
        navigator: Arc<dyn Navigator>,
        policy: ResolverPolicy,
    ) -> Self {
        Self {
            collection,
            navigator,
            policy,
            event_tx: None,
        }
    }

    /// Set an event channel for progress updates.
    ///
    /// Events are dropped, with a warning, while the channel is full.
    pub fn with_event_channel(mut self, tx: mpsc::Sender<CoordinatorEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Subscribe to the collection and start coordinating.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> CoordinatorHandle {
        let state = CoordinatorState::new(self.policy, self.collection.source().order());
        let (view_tx, view_rx) = watch::channel(state.view().clone());
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let subscription = self.collection.subscribe();
        let selector_rx = self.navigator.watch();

        let driver = Driver {
            state,
            source: self.collection.source().clone(),
            subscription,
            navigator: self.navigator,
            selector_rx,
            creations: JoinSet::new(),
            view_tx,
            event_tx: self.event_tx,
            last_items: None,
            last_error: None,
        };
        let task = tokio::spawn(driver.run(command_rx));

        CoordinatorHandle {
            commands: command_tx,
            view_rx,
            task,
        }
    }
}

/// Handle to a running coordinator. Dropping it disposes the coordinator.
#[derive(Debug)]
pub struct CoordinatorHandle {
    commands: mpsc::UnboundedSender<Command>,
    view_rx: watch::Receiver<SelectionView>,
    task: JoinHandle<()>,
}

impl CoordinatorHandle {
    /// The current view.
    pub fn view(&self) -> SelectionView {
        self.view_rx.borrow().clone()
    }

    /// Observe every published view.
    pub fn subscribe(&self) -> watch::Receiver<SelectionView> {
        self.view_rx.clone()
    }

    /// Replace the navigation selector, as a user click would.
    pub fn navigate(&self, next: DesiredSelector) -> Result<(), CoordinatorError> {
        self.commands
            .send(Command::Navigate(next))
            .map_err(|_| CoordinatorError::Disposed)
    }

    /// Refetch the collection. After a failed creation this also lets the
    /// next snapshot try again.
    pub fn refresh(&self) -> Result<(), CoordinatorError> {
        self.commands
            .send(Command::Refresh)
            .map_err(|_| CoordinatorError::Disposed)
    }

    /// Wait until a published view satisfies `pred`.
    pub async fn wait_for<F>(&self, mut pred: F) -> Result<SelectionView, CoordinatorError>
    where
        F: FnMut(&SelectionView) -> bool,
    {
        let mut rx = self.view_rx.clone();
        let view = rx
            .wait_for(|view| pred(view))
            .await
            .map_err(|_| CoordinatorError::Disposed)?;
        Ok(view.clone())
    }

    /// Tear down and wait for the task to finish. In-flight requests are
    /// abandoned and nothing is published afterwards.
    pub async fn dispose(self) -> Result<(), CoordinatorError> {
        // The task may already be gone; joining it below still reports how it ended.
        self.commands.send(Command::Dispose).ok();
        self.task.await.map_err(CoordinatorError::TaskFailed)
    }
}

type CreationOutcome = (CycleId, Result<ListItem, SourceError>);

struct Driver {
    state: CoordinatorState,
    source: CollectionSource,
    subscription: CollectionSubscription,
    navigator: Arc<dyn Navigator>,
    selector_rx: watch::Receiver<DesiredSelector>,
    creations: JoinSet<CreationOutcome>,
    view_tx: watch::Sender<SelectionView>,
    event_tx: Option<mpsc::Sender<CoordinatorEvent>>,
    /// Snapshot parts already fed to the reducer
    last_items: Option<Arc<Vec<ListItem>>>,
    last_error: Option<Arc<SourceError>>,
}

impl Driver {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let initial = self.selector_rx.borrow_and_update().clone();
        self.apply(Input::SelectorChanged(initial));
        let snapshot = self.subscription.current();
        self.apply_snapshot(snapshot);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Navigate(next)) => self.navigator.set_selector(next),
                    Some(Command::Refresh) => self.apply(Input::Refresh),
                    Some(Command::Dispose) | None => break,
                },
                changed = self.selector_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let next = self.selector_rx.borrow_and_update().clone();
                    self.apply(Input::SelectorChanged(next));
                }
                changed = self.subscription.receiver().changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = self.subscription.current();
                    self.apply_snapshot(snapshot);
                }
                Some(joined) = self.creations.join_next() => match joined {
                    Ok((cycle, result)) => {
                        let result = result.map_err(Arc::new);
                        self.apply(Input::CreationFinished { cycle, result });
                    }
                    Err(e) => warn!(error = %e, "creation task ended abnormally"),
                },
            }
        }

        self.apply(Input::Dispose);
        self.creations.abort_all();
        debug!(cycle = %self.state.cycle(), "coordinator stopped");
    }

    /// Feed the parts of a snapshot the reducer has not seen yet.
    fn apply_snapshot(&mut self, snapshot: CollectionSnapshot) {
        let new_items = match (&snapshot.items, &self.last_items) {
            (Some(next), Some(prev)) => !Arc::ptr_eq(next, prev),
            (Some(_), None) => true,
            _ => false,
        };
        let new_error = match (&snapshot.error, &self.last_error) {
            (Some(next), Some(prev)) => !Arc::ptr_eq(next, prev),
            (Some(_), None) => true,
            _ => false,
        };
        self.last_error = snapshot.error.clone();

        if new_items && let Some(items) = snapshot.items {
            self.last_items = Some(items.clone());
            self.apply(Input::CollectionChanged(items));
        }
        if new_error && let Some(error) = snapshot.error {
            self.apply(Input::CollectionFailed(error));
        } else if !new_items && snapshot.loading {
            self.apply(Input::CollectionLoading);
        }
    }

    fn apply(&mut self, input: Input) {
        for effect in self.state.reduce(input) {
            self.dispatch(effect);
        }
    }

    fn dispatch(&mut self, effect: Effect) {
        match effect {
            Effect::Navigate(next) => self.navigator.set_selector(next),
            Effect::Create {
                cycle,
                recipient_id,
                context,
            } => {
                let source = self.source.clone();
                self.creations.spawn(async move {
                    let result = source.create(&recipient_id, context.as_deref()).await;
                    (cycle, result)
                });
            }
            Effect::Invalidate => self.subscription.invalidate(),
            Effect::Publish(view) => {
                self.view_tx.send_replace(view);
            }
            Effect::Notify(event) => {
                if let Some(ref tx) = self.event_tx
                    && let Err(TrySendError::Full(event)) = tx.try_send(event)
                {
                    warn!(event = event.label(), "event channel full, dropping event");
                }
            }
        }
    }
}
