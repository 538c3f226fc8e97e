//! Event types for chart store notifications.
//!
//! The store emits these as edits are scheduled, committed, and propagated,
//! so hosts can trace the pipeline and tests can assert on ordering.

use crate::cell_key::CellKey;

/// Events emitted by `ChartStore`.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartEvent {
    /// An edit was committed to the chart.
    EditCommitted(EditCommittedEvent),

    /// The debounced change notification fired.
    ChangeNotified(ChangeNotifiedEvent),

    /// A submission was attempted.
    SubmitAttempted(SubmitAttemptedEvent),

    /// The store was disposed; pending edits were dropped.
    Disposed(DisposedEvent),
}

/// Emitted once per committed edit.
#[derive(Debug, Clone, PartialEq)]
pub struct EditCommittedEvent {
    /// Revision produced by this commit.
    pub revision: u64,
    /// The edited cell.
    pub cell: CellKey,
    /// Number of surfaces with violations after the commit.
    pub error_groups: usize,
}

/// Emitted when the change callback is invoked.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeNotifiedEvent {
    /// Revision handed to the change callback.
    pub revision: u64,
    /// Commits coalesced into this notification.
    pub commits: usize,
}

/// Emitted for every submit call.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitAttemptedEvent {
    pub revision: u64,
    /// True if the submit callback ran.
    pub accepted: bool,
    /// Surfaces with violations at the time of the attempt.
    pub error_groups: usize,
}

/// Emitted once, when the store is disposed.
#[derive(Debug, Clone, PartialEq)]
pub struct DisposedEvent {
    /// Pending edits that were cancelled.
    pub cancelled_edits: usize,
    /// Whether a change notification was still pending.
    pub cancelled_notification: bool,
}

/// Callback type for receiving chart events.
pub type EventCallback = Box<dyn FnMut(&ChartEvent)>;

/// Simple event collector for testing.
#[derive(Default)]
pub struct EventCollector {
    events: Vec<ChartEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: ChartEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[ChartEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Filter to only EditCommitted events.
    pub fn commits(&self) -> Vec<&EditCommittedEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ChartEvent::EditCommitted(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    /// Filter to only ChangeNotified events.
    pub fn notifications(&self) -> Vec<&ChangeNotifiedEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ChartEvent::ChangeNotified(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    /// Filter to only SubmitAttempted events.
    pub fn submits(&self) -> Vec<&SubmitAttemptedEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ChartEvent::SubmitAttempted(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}
