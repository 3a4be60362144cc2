//! Change notifications for history mutations.
//!
//! Observers are injected by the caller and invoked after the store's lock
//! has been released, on whichever thread performed the mutation.

use serde::{Deserialize, Serialize};

/// What changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryEventKind {
    StateAdded,
    Undone,
    Redone,
    Cleared,
}

/// State of the store right after a mutation committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub kind: HistoryEventKind,
    pub current_index: Option<usize>,
    pub len: usize,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Receives history change notifications.
pub trait HistoryObserver: Send + Sync {
    fn on_history_changed(&self, event: &HistoryEvent);
}

impl<F> HistoryObserver for F
where
    F: Fn(&HistoryEvent) + Send + Sync,
{
    fn on_history_changed(&self, event: &HistoryEvent) {
        self(event)
    }
}
