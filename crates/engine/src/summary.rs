//! Chart summary statistics.
//!
//! Means run over every numeric site value the chart holds (three per
//! record, 64 records). Percentages run over the 64 tooth-surface records:
//! a record counts when any of its three flags is set. Field validity is not
//! considered.
//!
//! "Attachment level" here is the mean gingival margin alone. It is *not*
//! the clinical sum of gingival margin and probing depth; callers relying on
//! the reported number get the literal gingival-margin mean.

use serde::Serialize;

use crate::chart::Chart;
use crate::schema::{Field, Measurement};

/// Raw summary values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChartSummary {
    pub mean_probing_depth: f64,
    pub mean_attachment_level: f64,
    pub plaque_percent: f64,
    pub bleeding_percent: f64,
    /// Number of tooth-surface records the percentages are computed over.
    pub records: usize,
}

/// Summary formatted to reporting precision: 0.1 mm for means, whole
/// percent for percentages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedSummary {
    pub mean_probing_depth: String,
    pub mean_attachment_level: String,
    pub plaque_percent: String,
    pub bleeding_percent: String,
}

fn mean(values: impl Iterator<Item = i32>) -> f64 {
    let (sum, n) = values.fold((0i64, 0usize), |(sum, n), v| (sum + i64::from(v), n + 1));
    if n == 0 {
        0.0
    } else {
        sum as f64 / n as f64
    }
}

fn percent(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 * 100.0 / total as f64
    }
}

/// Round half away from zero to `places` decimals.
fn round_to(x: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (x * scale).round() / scale
}

fn site_values<'a>(
    records: &'a [&'a Measurement],
    fields: &'a [Field; 3],
) -> impl Iterator<Item = i32> + 'a {
    records
        .iter()
        .flat_map(move |m| fields.iter().filter_map(move |f| m.number(*f)))
}

/// Compute summary statistics for a chart.
pub fn summarize(chart: &Chart) -> ChartSummary {
    let records: Vec<&Measurement> = chart.sites().map(|(_, _, m)| m).collect();
    let total = records.len();

    ChartSummary {
        mean_probing_depth: mean(site_values(&records, &Field::PROBING_DEPTH)),
        mean_attachment_level: mean(site_values(&records, &Field::GINGIVAL_MARGIN)),
        plaque_percent: percent(records.iter().filter(|m| m.has_plaque()).count(), total),
        bleeding_percent: percent(records.iter().filter(|m| m.has_bleeding()).count(), total),
        records: total,
    }
}

impl ChartSummary {
    pub fn formatted(&self) -> FormattedSummary {
        // Normalise -0.0 so a tiny negative mean never prints as "-0.0".
        let one_decimal = |x: f64| format!("{:.1}", round_to(x, 1) + 0.0);
        let whole = |x: f64| format!("{}", round_to(x, 0) as i64);
        FormattedSummary {
            mean_probing_depth: one_decimal(self.mean_probing_depth),
            mean_attachment_level: one_decimal(self.mean_attachment_level),
            plaque_percent: whole(self.plaque_percent),
            bleeding_percent: whole(self.bleeding_percent),
        }
    }
}
