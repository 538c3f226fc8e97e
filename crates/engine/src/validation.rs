//! Validation of chart measurements.
//!
//! Each numeric field carries a fixed range rule. A measurement validates to
//! a set of [`Violation`]s; a chart validates to a map from site key
//! (`"18-buccal"`) to the non-empty violation set of that surface.
//!
//! ## Violation codes
//!
//! - `{field}_required`: a required value is absent (only reachable through
//!   malformed external input; built and edited charts always carry values).
//! - `{field}_range`: the value lies strictly outside `[min, max]`.
//!
//! Violations are data, never errors. Submission is allowed iff the chart
//! validates to an empty map.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::chart::{Chart, ToothData};
use crate::schema::{Field, Measurement, ParseKeyError, Surface, ToothId, ALL_TEETH, TOOTH_COUNT};

// ============================================================================
// Rules
// ============================================================================

/// Range rule for a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRule {
    pub field: Field,
    pub min: i32,
    pub max: i32,
    pub required: bool,
}

impl ValidationRule {
    const fn new(field: Field, min: i32, max: i32) -> Self {
        Self { field, min, max, required: true }
    }

    /// Inclusive range check.
    #[inline]
    pub fn contains(&self, value: i32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// The static rule set: exactly the eight numeric fields. Boolean and text
/// fields carry no rule.
pub const VALIDATION_RULES: [ValidationRule; 8] = [
    ValidationRule::new(Field::Mobility, 0, 3),
    ValidationRule::new(Field::Furcation, 0, 3),
    ValidationRule::new(Field::GingivalMarginDistal, -10, 10),
    ValidationRule::new(Field::GingivalMarginMid, -10, 10),
    ValidationRule::new(Field::GingivalMarginMesial, -10, 10),
    ValidationRule::new(Field::ProbingDepthDistal, 0, 15),
    ValidationRule::new(Field::ProbingDepthMid, 0, 15),
    ValidationRule::new(Field::ProbingDepthMesial, 0, 15),
];

/// Rule for a field, if it has one.
pub fn rule_for(field: Field) -> Option<&'static ValidationRule> {
    VALIDATION_RULES.iter().find(|r| r.field == field)
}

// ============================================================================
// Violations
// ============================================================================

/// A single rule violation on a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Violation {
    /// A required field has no value.
    RequiredFieldMissing(Field),
    /// A numeric value lies outside its declared domain.
    OutOfRangeValue(Field),
}

impl Violation {
    pub fn field(&self) -> Field {
        match self {
            Violation::RequiredFieldMissing(f) | Violation::OutOfRangeValue(f) => *f,
        }
    }

    /// Stable string code, e.g. `probing_depth_mid_range`.
    pub fn code(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::RequiredFieldMissing(field) => write!(f, "{field}_required"),
            Violation::OutOfRangeValue(field) => write!(f, "{field}_range"),
        }
    }
}

impl FromStr for Violation {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(field) = s.strip_suffix("_required") {
            return Ok(Violation::RequiredFieldMissing(field.parse()?));
        }
        if let Some(field) = s.strip_suffix("_range") {
            return Ok(Violation::OutOfRangeValue(field.parse()?));
        }
        Err(ParseKeyError::Malformed(s.to_string()))
    }
}

impl Serialize for Violation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Violation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Violations of one measurement. Membership only.
pub type ViolationSet = BTreeSet<Violation>;

/// Identifies one tooth surface: `"{tooth}-{surface}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteKey {
    pub tooth: ToothId,
    pub surface: Surface,
}

impl SiteKey {
    pub fn new(tooth: ToothId, surface: Surface) -> Self {
        Self { tooth, surface }
    }
}

impl fmt::Display for SiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.tooth, self.surface)
    }
}

impl FromStr for SiteKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tooth, surface) = s
            .split_once('-')
            .ok_or_else(|| ParseKeyError::Malformed(s.to_string()))?;
        Ok(Self { tooth: tooth.parse()?, surface: surface.parse()? })
    }
}

impl Serialize for SiteKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SiteKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Per-surface violations of a chart. Only surfaces with at least one
/// violation appear.
pub type ViolationMap = BTreeMap<SiteKey, ViolationSet>;

// ============================================================================
// Validation
// ============================================================================

/// Validate one measurement against the rule set.
pub fn validate_measurement(m: &Measurement) -> ViolationSet {
    let mut violations = ViolationSet::new();
    for rule in &VALIDATION_RULES {
        match m.number(rule.field) {
            None if rule.required => {
                violations.insert(Violation::RequiredFieldMissing(rule.field));
            }
            Some(value) if !rule.contains(value) => {
                violations.insert(Violation::OutOfRangeValue(rule.field));
            }
            _ => {}
        }
    }
    violations
}

fn validate_tooth(data: &ToothData) -> [ViolationSet; 2] {
    [validate_measurement(&data.buccal), validate_measurement(&data.palatal)]
}

fn collect_map<'a>(
    per_tooth: impl Iterator<Item = (ToothId, &'a [ViolationSet; 2])>,
) -> ViolationMap {
    let mut map = ViolationMap::new();
    for (tooth, sets) in per_tooth {
        for (surface, set) in Surface::ALL.iter().zip(sets.iter()) {
            if !set.is_empty() {
                map.insert(SiteKey::new(tooth, *surface), set.clone());
            }
        }
    }
    map
}

/// Validate every surface of a chart.
pub fn validate_chart(chart: &Chart) -> ViolationMap {
    let per_tooth: Vec<(ToothId, [ViolationSet; 2])> =
        chart.iter().map(|(tooth, data)| (tooth, validate_tooth(data))).collect();
    collect_map(per_tooth.iter().map(|(t, sets)| (*t, sets)))
}

/// True iff the chart has no violations and may be submitted.
#[inline]
pub fn is_valid(violations: &ViolationMap) -> bool {
    violations.is_empty()
}

/// Total number of individual violations across all surfaces.
pub fn violation_count(violations: &ViolationMap) -> usize {
    violations.values().map(|set| set.len()).sum()
}

// ============================================================================
// Memoized validator
// ============================================================================

/// Cached per-tooth result, keyed by the tooth's shared allocation.
#[derive(Debug, Clone)]
struct ToothEntry {
    data: Arc<ToothData>,
    sets: [ViolationSet; 2],
}

/// Validator that memoizes against the previous chart.
///
/// Returns the cached map when called again with the same chart allocation.
/// After an edit only the tooth whose `Arc<ToothData>` changed is
/// re-validated; the other 31 reuse their cached sets.
#[derive(Debug, Default)]
pub struct ChartValidator {
    chart: Option<Chart>,
    teeth: Vec<Option<ToothEntry>>,
    result: ViolationMap,
    /// Number of tooth validations performed (for tests and diagnostics).
    revalidated: usize,
}

impl ChartValidator {
    pub fn new() -> Self {
        Self {
            chart: None,
            teeth: vec![None; TOOTH_COUNT],
            result: ViolationMap::new(),
            revalidated: 0,
        }
    }

    /// Violations for `chart`, recomputed only for teeth that changed.
    pub fn validate(&mut self, chart: &Chart) -> &ViolationMap {
        if let Some(prev) = &self.chart {
            if Chart::ptr_eq(prev, chart) {
                return &self.result;
            }
        }
        if self.teeth.len() != TOOTH_COUNT {
            self.teeth = vec![None; TOOTH_COUNT];
        }

        for (i, tooth) in ALL_TEETH.iter().enumerate() {
            let current = chart.tooth_arc(*tooth);
            let fresh = match (&self.teeth[i], current) {
                (Some(entry), Some(arc)) => !Arc::ptr_eq(&entry.data, arc),
                _ => true,
            };
            if !fresh {
                continue;
            }
            self.revalidated += 1;
            // A missing tooth reads as the default, which always validates clean.
            self.teeth[i] = current.map(|arc| ToothEntry {
                data: Arc::clone(arc),
                sets: validate_tooth(arc),
            });
        }

        self.result = collect_map(
            ALL_TEETH
                .iter()
                .zip(self.teeth.iter())
                .filter_map(|(tooth, entry)| entry.as_ref().map(|e| (*tooth, &e.sets))),
        );
        self.chart = Some(chart.clone());
        &self.result
    }

    /// Number of per-tooth validations run since creation.
    pub fn revalidated(&self) -> usize {
        self.revalidated
    }
}

// ============================================================================
// Tests
// ============================================================================
