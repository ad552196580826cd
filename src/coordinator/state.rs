//! The coordinator reducer.
//!
//! All coordination decisions happen here, synchronously, one [`Input`] at a
//! time. The runtime owns the async side: it turns channel activity into
//! inputs and carries out the returned [`Effect`]s.

use crate::coordinator::events::{CoordinatorEvent, CycleId};
use crate::coordinator::resolver::{Resolution, ResolverPolicy, resolve};
use crate::errors::SourceError;
use crate::model::{ListItem, SortOrder};
use crate::selector::DesiredSelector;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Something that happened outside the reducer.
#[derive(Debug, Clone)]
pub enum Input {
    SelectorChanged(DesiredSelector),
    CollectionLoading,
    CollectionChanged(Arc<Vec<ListItem>>),
    CollectionFailed(Arc<SourceError>),
    CreationFinished {
        cycle: CycleId,
        result: Result<ListItem, Arc<SourceError>>,
    },
    Refresh,
    Dispose,
}

/// Something the runtime must do on the reducer's behalf.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Replace the navigation selector
    Navigate(DesiredSelector),
    /// Issue one creation request tagged with its cycle
    Create {
        cycle: CycleId,
        recipient_id: String,
        context: Option<String>,
    },
    /// Refetch the shared collection
    Invalidate,
    /// Hand a new view to the UI
    Publish(SelectionView),
    /// Report progress to observers
    Notify(CoordinatorEvent),
}

/// Where the current cycle stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    /// Waiting for a snapshot to match against
    Matching,
    /// A creation request is in flight
    Creating,
    /// The cycle ended with a navigation; waiting for the next selector
    Redirected,
    /// Resolved or pending; re-evaluated when the collection changes
    Settled,
    /// A creation failed; waiting for a new selector or a refresh
    Halted,
}

/// What the UI is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewStatus {
    Loading,
    Pending,
    Creating,
    Resolved,
    Failed,
    Disposed,
}

impl std::fmt::Display for ViewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ViewStatus::Loading => "loading",
            ViewStatus::Pending => "pending",
            ViewStatus::Creating => "creating",
            ViewStatus::Resolved => "resolved",
            ViewStatus::Failed => "failed",
            ViewStatus::Disposed => "disposed",
        };
        write!(f, "{}", label)
    }
}

/// The coordinator's output: the resolved selection plus loading state.
#[derive(Debug, Clone)]
pub struct SelectionView {
    /// The selected item, or the last good one while failed
    pub selection: Option<ListItem>,
    pub status: ViewStatus,
    pub error: Option<Arc<SourceError>>,
    /// Cycle that produced this view
    pub cycle: CycleId,
}

impl SelectionView {
    pub fn initial() -> Self {
        Self {
            selection: None,
            status: ViewStatus::Loading,
            error: None,
            cycle: CycleId::default(),
        }
    }

    /// The loading flag the UI binds to.
    pub fn loading(&self) -> bool {
        matches!(self.status, ViewStatus::Loading | ViewStatus::Creating)
    }

    pub fn is_resolved(&self) -> bool {
        self.status == ViewStatus::Resolved
    }

    fn same_as(&self, other: &SelectionView) -> bool {
        let same_error = match (&self.error, &other.error) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        self.selection == other.selection && self.status == other.status && same_error
    }
}

/// Reducer state for one coordinator instance.
#[derive(Debug)]
pub struct CoordinatorState {
    policy: ResolverPolicy,
    order: SortOrder,
    cycle: CycleId,
    selector: DesiredSelector,
    phase: CyclePhase,
    /// Last fetched snapshot as published by the collection
    fetched: Option<Arc<Vec<ListItem>>>,
    /// Created items not yet seen in a fetched snapshot
    created: Vec<ListItem>,
    /// `fetched` plus `created`, sorted
    items: Option<Arc<Vec<ListItem>>>,
    view: SelectionView,
    disposed: bool,
}

impl CoordinatorState {
    pub fn new(policy: ResolverPolicy, order: SortOrder) -> Self {
        Self {
            policy,
            order,
            cycle: CycleId::default(),
            selector: DesiredSelector::None,
            phase: CyclePhase::Matching,
            fetched: None,
            created: Vec::new(),
            items: None,
            view: SelectionView::initial(),
            disposed: false,
        }
    }

    pub fn view(&self) -> &SelectionView {
        &self.view
    }

    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    pub fn selector(&self) -> &DesiredSelector {
        &self.selector
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The snapshot resolution currently runs against.
    pub fn items(&self) -> Option<&[ListItem]> {
        self.items.as_deref().map(Vec::as_slice)
    }

    /// Apply one input and return the effects to carry out, in order.
    pub fn reduce(&mut self, input: Input) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.disposed {
            return effects;
        }

        match input {
            Input::SelectorChanged(selector) => {
                self.cycle = self.cycle.next();
                self.selector = selector;
                self.phase = CyclePhase::Matching;
                debug!(cycle = %self.cycle, selector = %self.selector, "resolution cycle started");
                effects.push(Effect::Notify(CoordinatorEvent::CycleStarted {
                    cycle: self.cycle,
                    selector: self.selector.to_string(),
                }));
                self.evaluate(&mut effects);
            }
            Input::CollectionLoading => {
                if self.items.is_none() {
                    self.publish(None, ViewStatus::Loading, None, &mut effects);
                }
            }
            Input::CollectionChanged(fetched) => {
                self.fetched = Some(fetched);
                self.rebuild_items();
                self.evaluate(&mut effects);
            }
            Input::CollectionFailed(error) => {
                warn!(cycle = %self.cycle, error = %error, "collection unavailable");
                effects.push(Effect::Notify(CoordinatorEvent::Failed {
                    cycle: self.cycle,
                    error: error.to_string(),
                }));
                let selection = self.view.selection.clone();
                self.publish(selection, ViewStatus::Failed, Some(error), &mut effects);
            }
            Input::CreationFinished { cycle, result } => {
                self.on_creation_finished(cycle, result, &mut effects);
            }
            Input::Refresh => {
                if self.phase == CyclePhase::Halted {
                    self.phase = CyclePhase::Matching;
                }
                effects.push(Effect::Invalidate);
            }
            Input::Dispose => {
                self.disposed = true;
                debug!(cycle = %self.cycle, "coordinator disposed");
                effects.push(Effect::Notify(CoordinatorEvent::Disposed));
                let selection = self.view.selection.clone();
                self.publish(selection, ViewStatus::Disposed, None, &mut effects);
            }
        }

        effects
    }

    fn evaluate(&mut self, effects: &mut Vec<Effect>) {
        if !matches!(self.phase, CyclePhase::Matching | CyclePhase::Settled) {
            return;
        }
        let Some(items) = self.items.clone() else {
            return;
        };

        match resolve(&items, &self.selector, &self.policy) {
            Resolution::Selected(item) => {
                self.phase = CyclePhase::Settled;
                let id = item.id.clone();
                if self.publish(Some(item), ViewStatus::Resolved, None, effects) {
                    debug!(cycle = %self.cycle, id = %id, "selection resolved");
                    effects.push(Effect::Notify(CoordinatorEvent::Resolved {
                        cycle: self.cycle,
                        id,
                    }));
                }
            }
            Resolution::Redirect(id) => {
                self.redirect(DesiredSelector::Id { id }, effects);
            }
            Resolution::Create {
                recipient_id,
                context,
            } => {
                self.phase = CyclePhase::Creating;
                info!(cycle = %self.cycle, recipient_id = %recipient_id, "no match, creating entity");
                effects.push(Effect::Notify(CoordinatorEvent::CreationRequested {
                    cycle: self.cycle,
                    recipient_id: recipient_id.clone(),
                    context: context.clone(),
                }));
                effects.push(Effect::Create {
                    cycle: self.cycle,
                    recipient_id,
                    context,
                });
                let selection = self.view.selection.clone();
                self.publish(selection, ViewStatus::Creating, None, effects);
            }
            Resolution::Pending => {
                self.phase = CyclePhase::Settled;
                if self.publish(None, ViewStatus::Pending, None, effects) {
                    effects.push(Effect::Notify(CoordinatorEvent::Pending { cycle: self.cycle }));
                }
            }
        }
    }

    /// End the cycle with a navigation. Nothing is published for this cycle.
    fn redirect(&mut self, next: DesiredSelector, effects: &mut Vec<Effect>) {
        self.phase = CyclePhase::Redirected;
        info!(cycle = %self.cycle, to = %next, "redirecting");
        effects.push(Effect::Notify(CoordinatorEvent::Redirected {
            cycle: self.cycle,
            to: next.to_string(),
        }));
        effects.push(Effect::Navigate(next));
    }

    fn on_creation_finished(
        &mut self,
        cycle: CycleId,
        result: Result<ListItem, Arc<SourceError>>,
        effects: &mut Vec<Effect>,
    ) {
        if cycle != self.cycle || self.phase != CyclePhase::Creating {
            info!(cycle = %cycle, current = %self.cycle, "discarding creation from superseded cycle");
            effects.push(Effect::Notify(CoordinatorEvent::CreationDiscarded { cycle }));
            return;
        }

        match result {
            Ok(item) => {
                let next = DesiredSelector::Id {
                    id: item.id.clone(),
                };
                self.created.push(item);
                self.rebuild_items();
                effects.push(Effect::Invalidate);
                self.redirect(next, effects);
            }
            Err(error) => {
                self.phase = CyclePhase::Halted;
                warn!(cycle = %cycle, error = %error, "creation failed");
                effects.push(Effect::Notify(CoordinatorEvent::Failed {
                    cycle,
                    error: error.to_string(),
                }));
                let selection = self.view.selection.clone();
                self.publish(selection, ViewStatus::Failed, Some(error), effects);
            }
        }
    }

    fn rebuild_items(&mut self) {
        if let Some(ref fetched) = self.fetched {
            self.created
                .retain(|created| !fetched.iter().any(|item| item.id == created.id));
        }
        if self.created.is_empty() {
            self.items = self.fetched.clone();
            return;
        }

        let mut merged: Vec<ListItem> = self
            .fetched
            .as_deref()
            .map(|items| items.to_vec())
            .unwrap_or_default();
        merged.extend(self.created.iter().cloned());
        self.order.apply(&mut merged);
        self.items = Some(Arc::new(merged));
    }

    /// Replace the view and emit `Publish` if anything visible changed.
    fn publish(
        &mut self,
        selection: Option<ListItem>,
        status: ViewStatus,
        error: Option<Arc<SourceError>>,
        effects: &mut Vec<Effect>,
    ) -> bool {
        let next = SelectionView {
            selection,
            status,
            error,
            cycle: self.cycle,
        };
        if self.view.same_as(&next) {
            return false;
        }
        self.view = next.clone();
        effects.push(Effect::Publish(next));
        true
    }
}
