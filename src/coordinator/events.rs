//! Events emitted while the coordinator resolves selections.

use crate::model::ItemId;
use serde::{Deserialize, Serialize};

/// Monotonic id of a resolution cycle. A new cycle starts on every selector change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CycleId(pub u64);

impl CycleId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Events emitted during coordination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinatorEvent {
    /// A selector change started a new cycle.
    CycleStarted { cycle: CycleId, selector: String },
    /// The cycle ended with a navigation instead of a selection.
    Redirected { cycle: CycleId, to: String },
    /// A creation request was issued.
    CreationRequested {
        cycle: CycleId,
        recipient_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<String>,
    },
    /// A creation finished after its cycle was superseded.
    CreationDiscarded { cycle: CycleId },
    /// A selection became visible.
    Resolved { cycle: CycleId, id: ItemId },
    /// Nothing to select; waiting for the collection.
    Pending { cycle: CycleId },
    /// A fetch or creation failed.
    Failed { cycle: CycleId, error: String },
    /// The coordinator was torn down.
    Disposed,
}

impl CoordinatorEvent {
    /// Short label used by the CLI trace.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CycleStarted { .. } => "cycle",
            Self::Redirected { .. } => "redirect",
            Self::CreationRequested { .. } => "create",
            Self::CreationDiscarded { .. } => "discard",
            Self::Resolved { .. } => "resolved",
            Self::Pending { .. } => "pending",
            Self::Failed { .. } => "failed",
            Self::Disposed => "disposed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_id_next() {
        assert_eq!(CycleId::default().next(), CycleId(1));
        assert!(CycleId(2) > CycleId(1));
    }

    #[test]
    fn test_event_serialization() {
        let event = CoordinatorEvent::Redirected {
            cycle: CycleId(3),
            to: "?id=2".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"redirected\""));
        assert!(json.contains("\"cycle\":3"));
    }
}
