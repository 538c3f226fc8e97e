//! Chart store and the debounced update pipeline.
//!
//! ```text
//! input(cell, value, now)
//!   ├─ boolean  → commit now
//!   ├─ numeric  → per-cell timer (150 ms, restarts on each keystroke)
//!   └─ notes    → per-cell timer (300 ms)
//! tick(now)
//!   ├─ expired timers → commit, in deadline order
//!   └─ 100 ms after the last commit → on_change(chart)
//! ```
//!
//! Commits are the only mutation. Each derives a new [`Chart`] from the
//! latest committed one through [`update`], so validation, summary, and
//! change detection always see a consistent value.
//!
//! The host owns the clock. It calls [`ChartStore::tick`] from its event loop
//! (or sleeps until [`ChartStore::next_deadline`]) and passes a monotonic
//! `Instant` to every call. Nothing here blocks or spawns.

use std::time::{Duration, Instant};

use crate::cell_key::CellKey;
use crate::chart::{build_chart, update, CellInput, Chart, PartialChart};
use crate::debounce::Debouncer;
use crate::events::{
    ChangeNotifiedEvent, ChartEvent, DisposedEvent, EditCommittedEvent, EventCallback,
    SubmitAttemptedEvent,
};
use crate::schema::FieldKind;
use crate::summary::{summarize, ChartSummary};
use crate::validation::{ChartValidator, ViolationMap};

/// Quiet periods for each edit kind, plus the change-notification window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditTimings {
    /// Numeric fields commit after this much quiet.
    pub numeric: Duration,
    /// The notes field commits after this much quiet.
    pub text: Duration,
    /// `on_change` fires this long after the last commit.
    pub change: Duration,
}

impl Default for EditTimings {
    fn default() -> Self {
        Self {
            numeric: Duration::from_millis(150),
            text: Duration::from_millis(300),
            change: Duration::from_millis(100),
        }
    }
}

impl EditTimings {
    pub fn from_millis(numeric: u64, text: u64, change: u64) -> Self {
        Self {
            numeric: Duration::from_millis(numeric),
            text: Duration::from_millis(text),
            change: Duration::from_millis(change),
        }
    }

    /// Commit delay for a field kind. `None` means commit immediately.
    pub fn delay_for(&self, kind: FieldKind) -> Option<Duration> {
        match kind {
            FieldKind::Boolean => None,
            FieldKind::Numeric { .. } => Some(self.numeric),
            FieldKind::Text { .. } => Some(self.text),
        }
    }
}

/// Callback receiving the committed chart.
pub type ChartCallback = Box<dyn FnMut(&Chart)>;

/// Result of [`ChartStore::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The submit callback ran with the current chart.
    Submitted,
    /// The chart has violations; nothing was submitted.
    Blocked { error_groups: usize },
    /// The store was disposed; nothing was submitted.
    Disposed,
}

/// Holds the committed chart and runs the edit pipeline.
pub struct ChartStore {
    chart: Chart,
    revision: u64,
    timings: EditTimings,
    pending: Debouncer<CellKey, CellInput>,
    change_deadline: Option<Instant>,
    commits_since_notify: usize,
    validator: ChartValidator,
    summary: Option<(Chart, ChartSummary)>,
    on_change: Option<ChartCallback>,
    on_submit: Option<ChartCallback>,
    on_event: Option<EventCallback>,
    disposed: bool,
}

impl ChartStore {
    /// Create a store from partial initial values, with default timings.
    pub fn new(initial: &PartialChart) -> Self {
        Self::from_chart(build_chart(initial), EditTimings::default())
    }

    pub fn with_timings(initial: &PartialChart, timings: EditTimings) -> Self {
        Self::from_chart(build_chart(initial), timings)
    }

    pub fn from_chart(chart: Chart, timings: EditTimings) -> Self {
        Self {
            chart,
            revision: 0,
            timings,
            pending: Debouncer::new(),
            change_deadline: None,
            commits_since_notify: 0,
            validator: ChartValidator::new(),
            summary: None,
            on_change: None,
            on_submit: None,
            on_event: None,
            disposed: false,
        }
    }

    // ------------------------------------------------------------------------
    // Callbacks
    // ------------------------------------------------------------------------

    /// Set the debounced change callback.
    pub fn on_change(&mut self, callback: impl FnMut(&Chart) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    /// Set the submit callback. Only invoked for a valid chart.
    pub fn on_submit(&mut self, callback: impl FnMut(&Chart) + 'static) {
        self.on_submit = Some(Box::new(callback));
    }

    /// Set the pipeline event callback.
    pub fn on_event(&mut self, callback: impl FnMut(&ChartEvent) + 'static) {
        self.on_event = Some(Box::new(callback));
    }

    fn emit(&mut self, event: ChartEvent) {
        if let Some(cb) = self.on_event.as_mut() {
            cb(&event);
        }
    }

    // ------------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------------

    /// The committed chart.
    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    /// Number of commits applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn timings(&self) -> EditTimings {
        self.timings
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Input waiting on a timer for `cell`, if any.
    pub fn pending(&self, cell: &CellKey) -> Option<&CellInput> {
        self.pending.peek(cell)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty() || self.change_deadline.is_some()
    }

    /// Earliest instant at which [`ChartStore::tick`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.pending.next_deadline(), self.change_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Violations of the committed chart, keyed by `"{tooth}-{surface}"`.
    pub fn validation_errors(&mut self) -> &ViolationMap {
        self.validator.validate(&self.chart)
    }

    /// Number of surfaces with at least one violation.
    pub fn error_count(&mut self) -> usize {
        self.validation_errors().len()
    }

    pub fn is_submittable(&mut self) -> bool {
        self.validation_errors().is_empty()
    }

    /// Summary of the committed chart, cached until the next commit.
    pub fn summary(&mut self) -> ChartSummary {
        if let Some((chart, summary)) = &self.summary {
            if Chart::ptr_eq(chart, &self.chart) {
                return *summary;
            }
        }
        let summary = summarize(&self.chart);
        self.summary = Some((self.chart.clone(), summary));
        summary
    }

    // ------------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------------

    /// Feed raw input for a cell.
    ///
    /// Boolean fields commit immediately. Numeric and notes fields (re)start
    /// the cell's timer; the value commits on a later [`ChartStore::tick`].
    /// Returns `false` if the store is disposed.
    pub fn input(&mut self, cell: CellKey, value: impl Into<CellInput>, now: Instant) -> bool {
        if self.disposed {
            log::warn!("input for {} ignored: chart store disposed", cell);
            return false;
        }
        let value = value.into();

        match self.timings.delay_for(cell.field.kind()) {
            None => {
                self.pending.cancel(&cell);
                self.commit(cell, &value, now);
            }
            Some(delay) => {
                let restarted = self.pending.schedule(cell, value, delay, now);
                log::trace!(
                    "scheduled {} in {:?}{}",
                    cell,
                    delay,
                    if restarted { " (restarted)" } else { "" }
                );
            }
        }
        true
    }

    /// Fire every timer that expired at or before `now`.
    ///
    /// Commits and the change notification are processed in time order, so
    /// a notification whose window closed before a later commit fires first.
    /// Returns the number of commits applied.
    pub fn tick(&mut self, now: Instant) -> usize {
        if self.disposed {
            return 0;
        }
        let mut committed = 0;

        loop {
            let next_commit = self.pending.next_deadline().filter(|d| *d <= now);
            let notify_at = self.change_deadline.filter(|d| *d <= now);

            match (next_commit, notify_at) {
                (Some(c), Some(n)) if n < c => self.notify(),
                (Some(c), _) => {
                    for (cell, value, at) in self.pending.poll(c) {
                        if self.commit(cell, &value, at) {
                            committed += 1;
                        }
                    }
                }
                (None, Some(_)) => self.notify(),
                (None, None) => break,
            }
        }

        committed
    }

    /// Commit every pending edit now, ignoring remaining quiet periods.
    /// The change notification stays debounced.
    pub fn flush(&mut self, now: Instant) -> usize {
        if self.disposed {
            return 0;
        }
        let mut committed = 0;
        for (cell, value, _) in self.pending.drain() {
            if self.commit(cell, &value, now) {
                committed += 1;
            }
        }
        committed
    }

    /// Apply one edit. Returns `false` if the edit left the chart unchanged.
    fn commit(&mut self, cell: CellKey, value: &CellInput, at: Instant) -> bool {
        let next = update(&self.chart, cell.tooth, cell.surface, cell.field, value);
        if next == self.chart {
            log::trace!("commit {} left chart unchanged", cell);
            return false;
        }

        self.chart = next;
        self.revision += 1;
        self.commits_since_notify += 1;
        self.change_deadline = Some(at + self.timings.change);

        let error_groups = self.error_count();
        log::debug!(
            "committed {} (revision {}, {} error group(s))",
            cell,
            self.revision,
            error_groups
        );
        self.emit(ChartEvent::EditCommitted(EditCommittedEvent {
            revision: self.revision,
            cell,
            error_groups,
        }));
        true
    }

    fn notify(&mut self) {
        self.change_deadline = None;
        let commits = std::mem::take(&mut self.commits_since_notify);

        if let Some(cb) = self.on_change.as_mut() {
            cb(&self.chart);
        }
        log::debug!("change notified at revision {} ({} commit(s))", self.revision, commits);
        self.emit(ChartEvent::ChangeNotified(ChangeNotifiedEvent {
            revision: self.revision,
            commits,
        }));
    }

    /// Hand the committed chart to the submit callback if it is valid.
    ///
    /// Pending (uncommitted) input is not included; call
    /// [`ChartStore::flush`] first to submit what the operator typed.
    pub fn submit(&mut self) -> SubmitOutcome {
        if self.disposed {
            log::warn!("submit ignored: chart store disposed");
            return SubmitOutcome::Disposed;
        }

        let error_groups = self.error_count();
        let accepted = error_groups == 0;
        if accepted {
            if let Some(cb) = self.on_submit.as_mut() {
                cb(&self.chart);
            }
            log::info!("chart submitted at revision {}", self.revision);
        } else {
            log::warn!("submit blocked: {} surface(s) with violations", error_groups);
        }

        self.emit(ChartEvent::SubmitAttempted(SubmitAttemptedEvent {
            revision: self.revision,
            accepted,
            error_groups,
        }));

        if accepted {
            SubmitOutcome::Submitted
        } else {
            SubmitOutcome::Blocked { error_groups }
        }
    }

    /// Cancel all pending timers and stop accepting input. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        let cancelled_edits = self.pending.cancel_all();
        let cancelled_notification = self.change_deadline.take().is_some();
        self.disposed = true;

        log::debug!(
            "chart store disposed ({} pending edit(s) cancelled)",
            cancelled_edits
        );
        self.emit(ChartEvent::Disposed(DisposedEvent {
            cancelled_edits,
            cancelled_notification,
        }));
    }
}

impl std::fmt::Debug for ChartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartStore")
            .field("revision", &self.revision)
            .field("timings", &self.timings)
            .field("pending", &self.pending.len())
            .field("change_deadline", &self.change_deadline)
            .field("disposed", &self.disposed)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventCollector;
    use crate::schema::{Field, Surface, ToothId};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn cell(s: &str) -> CellKey {
        s.parse().unwrap()
    }

    fn store_with_log() -> (ChartStore, Rc<RefCell<Vec<Chart>>>, Rc<RefCell<EventCollector>>) {
        let mut store = ChartStore::new(&PartialChart::new());
        let changes = Rc::new(RefCell::new(Vec::new()));
        let events = Rc::new(RefCell::new(EventCollector::new()));

        let sink = Rc::clone(&changes);
        store.on_change(move |chart| sink.borrow_mut().push(chart.clone()));
        let sink = Rc::clone(&events);
        store.on_event(move |event| sink.borrow_mut().push(event.clone()));

        (store, changes, events)
    }

    #[test]
    fn test_boolean_commits_immediately() {
        let t0 = Instant::now();
        let (mut store, changes, events) = store_with_log();

        store.input(cell("18-buccal-bleeding_mid"), true, t0);
        assert!(store.chart().measurement(ToothId::new(18).unwrap(), Surface::Buccal).bleeding_mid);
        assert_eq!(store.revision(), 1);
        assert_eq!(events.borrow().commits().len(), 1);

        // Change notification is still debounced.
        store.tick(t0 + ms(99));
        assert!(changes.borrow().is_empty());
        store.tick(t0 + ms(100));
        assert_eq!(changes.borrow().len(), 1);
    }

    #[test]
    fn test_numeric_keystrokes_coalesce() {
        let t0 = Instant::now();
        let (mut store, changes, events) = store_with_log();
        let key = cell("36-palatal-probing_depth_mid");

        store.input(key, "1", t0);
        store.input(key, "12", t0 + ms(80));
        assert_eq!(store.tick(t0 + ms(200)), 0, "timer restarted at 80ms");
        assert_eq!(store.pending(&key), Some(&CellInput::Text("12".into())));

        assert_eq!(store.tick(t0 + ms(230)), 1);
        let m = store.chart().measurement(key.tooth, key.surface);
        assert_eq!(m.probing_depth_mid, Some(12));
        assert_eq!(store.revision(), 1);

        store.tick(t0 + ms(330));
        assert_eq!(changes.borrow().len(), 1);
        assert_eq!(events.borrow().notifications()[0].commits, 1);
    }

    #[test]
    fn test_notes_use_longer_window() {
        let t0 = Instant::now();
        let (mut store, _, _) = store_with_log();
        let key = cell("11-buccal-notes");

        store.input(key, "sensitive", t0);
        store.tick(t0 + ms(299));
        assert_eq!(store.chart().measurement(key.tooth, key.surface).notes, "");
        store.tick(t0 + ms(300));
        assert_eq!(store.chart().measurement(key.tooth, key.surface).notes, "sensitive");
    }

    #[test]
    fn test_change_notification_coalesces_commits() {
        let t0 = Instant::now();
        let (mut store, changes, events) = store_with_log();

        store.input(cell("18-buccal-plaque_distal"), true, t0);
        store.input(cell("17-buccal-plaque_distal"), true, t0 + ms(50));
        store.input(cell("16-buccal-plaque_distal"), true, t0 + ms(90));
        store.tick(t0 + ms(189));
        assert!(changes.borrow().is_empty());
        store.tick(t0 + ms(190));

        assert_eq!(changes.borrow().len(), 1);
        assert_eq!(events.borrow().notifications()[0].commits, 3);
        assert_eq!(changes.borrow()[0], *store.chart());
    }

    #[test]
    fn test_tick_processes_in_time_order() {
        let t0 = Instant::now();
        let (mut store, changes, events) = store_with_log();

        store.input(cell("18-buccal-implant"), true, t0); // commit at 0, notify at 100
        store.input(cell("18-buccal-mobility"), "2", t0 + ms(50)); // commit at 200

        // One late tick covering both windows.
        store.tick(t0 + ms(500));

        let notes = events.borrow().notifications().len();
        assert_eq!(notes, 2, "notification at 100ms precedes the 200ms commit");
        assert_eq!(changes.borrow()[0].measurement(ToothId::new(18).unwrap(), Surface::Buccal).mobility, Some(0));
        assert_eq!(changes.borrow()[1].measurement(ToothId::new(18).unwrap(), Surface::Buccal).mobility, Some(2));
    }

    #[test]
    fn test_unchanged_commit_is_skipped() {
        let t0 = Instant::now();
        let (mut store, changes, _) = store_with_log();

        store.input(cell("21-buccal-implant"), false, t0);
        assert_eq!(store.revision(), 0);
        store.tick(t0 + ms(1000));
        assert!(changes.borrow().is_empty());
    }

    #[test]
    fn test_flush_commits_pending() {
        let t0 = Instant::now();
        let (mut store, _, _) = store_with_log();
        store.input(cell("48-palatal-furcation"), "3", t0);
        store.input(cell("48-palatal-notes"), "furcation II", t0);

        assert_eq!(store.flush(t0 + ms(1)), 2);
        let m = store.chart().measurement(ToothId::new(48).unwrap(), Surface::Palatal);
        assert_eq!(m.furcation, Some(3));
        assert_eq!(m.notes, "furcation II");
        assert!(store.pending(&cell("48-palatal-notes")).is_none());
    }

    #[test]
    fn test_submit_gated_on_validity() {
        let mut initial = PartialChart::new();
        let tooth = ToothId::new(26).unwrap();
        let json = r#"{ "buccal": { "probing_depth_distal": 20 } }"#;
        initial.insert(tooth, serde_json::from_str(json).unwrap());

        let mut store = ChartStore::new(&initial);
        let submitted = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&submitted);
        store.on_submit(move |_| *sink.borrow_mut() += 1);

        assert!(!store.is_submittable());
        assert_eq!(store.submit(), SubmitOutcome::Blocked { error_groups: 1 });
        assert_eq!(*submitted.borrow(), 0);

        let t0 = Instant::now();
        store.input(CellKey::new(tooth, Surface::Buccal, Field::ProbingDepthDistal), "4", t0);
        store.flush(t0);
        assert!(store.is_submittable());
        assert_eq!(store.submit(), SubmitOutcome::Submitted);
        assert_eq!(*submitted.borrow(), 1);
    }

    #[test]
    fn test_dispose_cancels_timers() {
        let t0 = Instant::now();
        let (mut store, changes, events) = store_with_log();

        store.input(cell("18-buccal-implant"), true, t0);
        store.input(cell("18-buccal-mobility"), "3", t0);
        store.dispose();
        store.dispose();

        assert_eq!(store.tick(t0 + ms(1000)), 0);
        assert!(changes.borrow().is_empty());
        assert!(!store.input(cell("18-buccal-furcation"), "1", t0));
        assert_eq!(store.submit(), SubmitOutcome::Disposed);
        assert_eq!(
            store.chart().measurement(ToothId::new(18).unwrap(), Surface::Buccal).mobility,
            Some(0)
        );

        let disposed: Vec<_> = events
            .borrow()
            .events()
            .iter()
            .filter_map(|e| match e {
                ChartEvent::Disposed(d) => Some(d.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(disposed.len(), 1);
        assert_eq!(disposed[0].cancelled_edits, 1);
        assert!(disposed[0].cancelled_notification);
    }

    #[test]
    fn test_summary_cached_until_commit() {
        let t0 = Instant::now();
        let mut store = ChartStore::new(&PartialChart::new());
        assert_eq!(store.summary().formatted().plaque_percent, "0");
        store.input(cell("18-palatal-plaque_mid"), true, t0);
        assert_eq!(store.summary().formatted().plaque_percent, "2");
    }

    #[test]
    fn test_next_deadline() {
        let t0 = Instant::now();
        let mut store = ChartStore::new(&PartialChart::new());
        assert_eq!(store.next_deadline(), None);
        store.input(cell("18-buccal-notes"), "a", t0);
        assert_eq!(store.next_deadline(), Some(t0 + ms(300)));
        store.input(cell("18-buccal-implant"), true, t0 + ms(10));
        assert_eq!(store.next_deadline(), Some(t0 + ms(110)));
    }
}
