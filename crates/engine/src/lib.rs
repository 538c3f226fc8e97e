//! Periodontal chart engine: data model, validation, navigation, and the
//! debounced edit pipeline.
//!
//! The free functions below are the surface the presentation layer calls.
//! [`store::ChartStore`] wraps them into the stateful edit pipeline.

pub mod cell_key;
pub mod chart;
pub mod debounce;
pub mod events;
pub mod navigation;
pub mod schema;
pub mod store;
pub mod summary;
pub mod validation;

pub use cell_key::CellKey;
pub use chart::{update, CellInput, Chart, MeasurementPatch, PartialChart, ToothData, ToothPatch};
pub use navigation::{navigate, CellIndex, Direction};
pub use schema::{Field, FieldKind, Measurement, ParseKeyError, Surface, ToothId, ALL_TEETH};
pub use store::{ChartStore, EditTimings, SubmitOutcome};
pub use summary::{summarize, ChartSummary, FormattedSummary};
pub use validation::{is_valid, Violation, ViolationMap};

/// Build a complete chart from partial initial values.
pub fn initialize(initial: &PartialChart) -> Chart {
    chart::build_chart(initial)
}

/// Per-surface violations of a chart.
pub fn validate(chart: &Chart) -> ViolationMap {
    validation::validate_chart(chart)
}
