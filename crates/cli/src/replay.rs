//! Entry replay: drive a chart store with a timed script of operator input.
//!
//! Usage: periochart replay session.toml [--chart initial.json] [--output final.json]
//!
//! Scripts are TOML, one `[[event]]` table per step:
//!
//! ```toml
//! [[event]]
//! at_ms = 0
//! cell = "46-buccal-probing_depth_distal"
//! input = "5"
//!
//! [[event]]
//! at_ms = 100
//! cell = "46-buccal-bleeding_distal"
//! flag = true
//!
//! [[event]]
//! at_ms = 600
//! action = "submit"
//! ```
//!
//! Time is virtual. The script runs instantly, but every debounce timer
//! fires at the offset it would have in a live session, so the printed
//! timeline matches what an operator would see.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use periochart_engine::events::{ChartEvent, EventCollector};
use periochart_engine::{CellInput, CellKey, Chart, ChartStore, EditTimings, SubmitOutcome};
use serde::{Deserialize, Serialize};

use crate::CliError;

// ============================================================================
// Script format
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayScript {
    #[serde(default, rename = "event")]
    pub events: Vec<ScriptEvent>,
}

/// Non-input steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptAction {
    /// Commit every pending edit immediately.
    Flush,
    /// Attempt submission of the committed chart.
    Submit,
    /// Tear the store down; later input is ignored.
    Dispose,
}

/// Raw `input` value: TOML strings are typed text, integers are numbers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptInput {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptEvent {
    /// Offset from the start of the session.
    pub at_ms: u64,
    pub cell: Option<String>,
    pub input: Option<ScriptInput>,
    pub flag: Option<bool>,
    pub action: Option<ScriptAction>,
}

/// A checked script step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Input { cell: CellKey, value: CellInput },
    Action(ScriptAction),
}

impl ScriptEvent {
    fn step(&self, index: usize) -> Result<Step, CliError> {
        let at = format!("event {} (at_ms = {})", index + 1, self.at_ms);

        match (&self.cell, self.action) {
            (None, Some(action)) if self.input.is_none() && self.flag.is_none() => {
                Ok(Step::Action(action))
            }
            (Some(cell), None) => {
                let cell: CellKey = cell
                    .parse()
                    .map_err(|e| CliError::parse(format!("{}: {}", at, e)))?;
                let value = match (&self.input, self.flag) {
                    (Some(ScriptInput::Text(s)), None) => CellInput::Text(s.clone()),
                    (Some(ScriptInput::Number(n)), None) => CellInput::Number(*n),
                    (None, Some(b)) => CellInput::Flag(b),
                    _ => {
                        return Err(CliError::parse(format!(
                            "{}: give exactly one of `input` or `flag`",
                            at
                        )))
                    }
                };
                Ok(Step::Input { cell, value })
            }
            _ => Err(CliError::parse(format!(
                "{}: expected `cell` with `input` or `flag`, or a lone `action`",
                at
            ))
            .with_hint("actions are \"flush\", \"submit\", \"dispose\"")),
        }
    }
}

impl ReplayScript {
    pub fn parse(text: &str) -> Result<Self, CliError> {
        toml::from_str(text).map_err(|e| CliError::parse(format!("replay script: {}", e)))
    }

    /// Checked steps in time order. Events sharing an offset keep script order.
    pub fn steps(&self) -> Result<Vec<(u64, Step)>, CliError> {
        let mut steps = self
            .events
            .iter()
            .enumerate()
            .map(|(i, e)| e.step(i).map(|step| (e.at_ms, step)))
            .collect::<Result<Vec<_>, _>>()?;
        steps.sort_by_key(|(at_ms, _)| *at_ms);
        Ok(steps)
    }
}

// ============================================================================
// Timeline
// ============================================================================

/// One store event, stamped with its offset into the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub at_ms: u64,
    #[serde(flatten)]
    pub kind: TimelineKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TimelineKind {
    #[serde(rename_all = "camelCase")]
    Commit { revision: u64, cell: CellKey, error_groups: usize },
    #[serde(rename_all = "camelCase")]
    Change { revision: u64, commits: usize },
    #[serde(rename_all = "camelCase")]
    Submit { revision: u64, accepted: bool, error_groups: usize },
    #[serde(rename_all = "camelCase")]
    Dispose { cancelled_edits: usize, cancelled_notification: bool },
}

impl From<&ChartEvent> for TimelineKind {
    fn from(event: &ChartEvent) -> Self {
        match event {
            ChartEvent::EditCommitted(e) => TimelineKind::Commit {
                revision: e.revision,
                cell: e.cell,
                error_groups: e.error_groups,
            },
            ChartEvent::ChangeNotified(e) => TimelineKind::Change {
                revision: e.revision,
                commits: e.commits,
            },
            ChartEvent::SubmitAttempted(e) => TimelineKind::Submit {
                revision: e.revision,
                accepted: e.accepted,
                error_groups: e.error_groups,
            },
            ChartEvent::Disposed(e) => TimelineKind::Dispose {
                cancelled_edits: e.cancelled_edits,
                cancelled_notification: e.cancelled_notification,
            },
        }
    }
}

impl fmt::Display for TimelineEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>7}ms  ", self.at_ms)?;
        match &self.kind {
            TimelineKind::Commit { revision, cell, error_groups } => {
                write!(f, "commit   r{:<4} {}", revision, cell)?;
                if *error_groups > 0 {
                    write!(f, " ({} surface(s) with violations)", error_groups)?;
                }
                Ok(())
            }
            TimelineKind::Change { revision, commits } => {
                write!(f, "change   r{:<4} {} commit(s)", revision, commits)
            }
            TimelineKind::Submit { revision, accepted: true, .. } => {
                write!(f, "submit   r{:<4} accepted", revision)
            }
            TimelineKind::Submit { revision, error_groups, .. } => {
                write!(f, "submit   r{:<4} blocked: {} surface(s) with violations", revision, error_groups)
            }
            TimelineKind::Dispose { cancelled_edits, .. } => {
                write!(f, "dispose        {} pending edit(s) dropped", cancelled_edits)
            }
        }
    }
}

// ============================================================================
// Execution
// ============================================================================

/// Result of replaying a script.
pub struct ReplayReport {
    pub timeline: Vec<TimelineEntry>,
    /// Committed chart at the end of the session.
    pub chart: Chart,
    pub revision: u64,
    /// Surfaces with violations in the final chart.
    pub error_groups: usize,
    /// Outcome of the last `submit` action, if any.
    pub last_submit: Option<SubmitOutcome>,
    /// Number of times the submit callback ran.
    pub submitted: usize,
}

fn millis_since(t0: Instant, t: Instant) -> u64 {
    t.saturating_duration_since(t0).as_millis() as u64
}

/// Move collected events onto the timeline.
fn record(collector: &RefCell<EventCollector>, at_ms: u64, timeline: &mut Vec<TimelineEntry>) {
    let mut collector = collector.borrow_mut();
    timeline.extend(
        collector
            .events()
            .iter()
            .map(|e| TimelineEntry { at_ms, kind: e.into() }),
    );
    collector.clear();
}

/// Fire timers one deadline at a time, up to and including `until`
/// (or until none remain).
fn advance(
    store: &mut ChartStore,
    t0: Instant,
    until: Option<Instant>,
    collector: &RefCell<EventCollector>,
    timeline: &mut Vec<TimelineEntry>,
) {
    while let Some(deadline) = store.next_deadline() {
        if until.is_some_and(|u| deadline > u) {
            break;
        }
        store.tick(deadline);
        record(collector, millis_since(t0, deadline), timeline);
    }
}

/// Replay `script` against a store seeded with `initial`.
pub fn run(script: &ReplayScript, initial: Chart, timings: EditTimings) -> Result<ReplayReport, CliError> {
    let steps = script.steps()?;

    let t0 = Instant::now();
    let mut store = ChartStore::from_chart(initial, timings);

    let collector = Rc::new(RefCell::new(EventCollector::new()));
    let sink = Rc::clone(&collector);
    store.on_event(move |e| sink.borrow_mut().push(e.clone()));

    let submitted = Rc::new(RefCell::new(0usize));
    let sink = Rc::clone(&submitted);
    store.on_submit(move |_| *sink.borrow_mut() += 1);

    let mut timeline = Vec::new();
    let mut last_submit = None;

    for (at_ms, step) in steps {
        let at = t0 + Duration::from_millis(at_ms);
        advance(&mut store, t0, Some(at), &collector, &mut timeline);

        match step {
            Step::Input { cell, value } => {
                store.input(cell, value, at);
            }
            Step::Action(ScriptAction::Flush) => {
                store.flush(at);
            }
            Step::Action(ScriptAction::Submit) => last_submit = Some(store.submit()),
            Step::Action(ScriptAction::Dispose) => store.dispose(),
        }
        record(&collector, at_ms, &mut timeline);
    }
    advance(&mut store, t0, None, &collector, &mut timeline);

    log::debug!(
        "replayed {} event(s) to revision {}",
        script.events.len(),
        store.revision()
    );

    let error_groups = store.error_count();
    let submitted = *submitted.borrow();
    Ok(ReplayReport {
        timeline,
        chart: store.chart().clone(),
        revision: store.revision(),
        error_groups,
        last_submit,
        submitted,
    })
}
