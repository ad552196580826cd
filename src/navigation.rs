//! The navigation port: where the desired selector lives.
//!
//! Selector changes replace the current navigation state rather than pushing
//! a history entry, so redirects never make the back button loop.

use crate::selector::DesiredSelector;
use std::sync::Mutex;
use tokio::sync::watch;

/// Reads and replaces the desired selector held in navigation state.
pub trait Navigator: Send + Sync {
    fn current_selector(&self) -> DesiredSelector;

    /// Replace (not push) the current selector.
    fn set_selector(&self, next: DesiredSelector);

    /// Observe selector changes.
    fn watch(&self) -> watch::Receiver<DesiredSelector>;
}

/// In-process navigator, one per page.
#[derive(Debug)]
pub struct MemoryNavigator {
    tx: watch::Sender<DesiredSelector>,
    replacements: Mutex<Vec<DesiredSelector>>,
}

impl MemoryNavigator {
    pub fn new(initial: DesiredSelector) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx,
            replacements: Mutex::new(Vec::new()),
        }
    }

    /// Every selector passed to `set_selector`, in order.
    pub fn replacements(&self) -> Vec<DesiredSelector> {
        self.replacements
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn replacement_count(&self) -> usize {
        self.replacements
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new(DesiredSelector::None)
    }
}

impl Navigator for MemoryNavigator {
    fn current_selector(&self) -> DesiredSelector {
        self.tx.borrow().clone()
    }

    fn set_selector(&self, next: DesiredSelector) {
        self.replacements
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(next.clone());
        self.tx.send_replace(next);
    }

    fn watch(&self) -> watch::Receiver<DesiredSelector> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_selector_replaces_current() {
        let nav = MemoryNavigator::new(DesiredSelector::counterpart("B", None));
        nav.set_selector(DesiredSelector::id(2));

        assert_eq!(nav.current_selector(), DesiredSelector::id(2));
        assert_eq!(nav.replacements(), vec![DesiredSelector::id(2)]);
    }

    #[tokio::test]
    async fn test_watch_sees_replacement() {
        let nav = MemoryNavigator::default();
        let mut rx = nav.watch();
        assert_eq!(*rx.borrow_and_update(), DesiredSelector::None);

        nav.set_selector(DesiredSelector::id(7));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), DesiredSelector::id(7));
    }
}
