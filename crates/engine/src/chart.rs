//! Chart data: default/merge builder and immutable single-field updates.
//!
//! A [`Chart`] is an immutable value. Each tooth's [`ToothData`] sits behind
//! an `Arc`, so [`update`] copies 32 pointers and allocates exactly one new
//! `ToothData`. Untouched teeth keep their identity, which is what the
//! validation memo and change detection key on.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::schema::{Field, FieldKind, FieldValue, Measurement, Surface, ToothId, ALL_TEETH};

// ============================================================================
// Partial input
// ============================================================================

/// Distinguish a missing key (`None`) from an explicit `null` (`Some(None)`).
fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Field-wise override for one surface. Every field is optional; fields left
/// out keep the default.
///
/// For numeric fields an explicit JSON `null` is kept as an absent value,
/// which validation later reports as `*_required`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub present: Option<bool>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub mobility: Option<Option<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implant: Option<bool>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub furcation: Option<Option<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bleeding_distal: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bleeding_mid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bleeding_mesial: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plaque_distal: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plaque_mid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plaque_mesial: Option<bool>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub gingival_margin_distal: Option<Option<i32>>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub gingival_margin_mid: Option<Option<i32>>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub gingival_margin_mesial: Option<Option<i32>>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub probing_depth_distal: Option<Option<i32>>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub probing_depth_mid: Option<Option<i32>>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub probing_depth_mesial: Option<Option<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl MeasurementPatch {
    /// Set a numeric field in the patch (builder style).
    pub fn with_number(mut self, field: Field, value: i32) -> Self {
        if let Some(slot) = self.number_slot(field) {
            *slot = Some(Some(value));
        }
        self
    }

    /// Set a boolean field in the patch (builder style).
    pub fn with_flag(mut self, field: Field, value: bool) -> Self {
        let slot = match field {
            Field::Implant => &mut self.implant,
            Field::BleedingDistal => &mut self.bleeding_distal,
            Field::BleedingMid => &mut self.bleeding_mid,
            Field::BleedingMesial => &mut self.bleeding_mesial,
            Field::PlaqueDistal => &mut self.plaque_distal,
            Field::PlaqueMid => &mut self.plaque_mid,
            Field::PlaqueMesial => &mut self.plaque_mesial,
            _ => return self,
        };
        *slot = Some(value);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    fn number_slot(&mut self, field: Field) -> Option<&mut Option<Option<i32>>> {
        match field {
            Field::Mobility => Some(&mut self.mobility),
            Field::Furcation => Some(&mut self.furcation),
            Field::GingivalMarginDistal => Some(&mut self.gingival_margin_distal),
            Field::GingivalMarginMid => Some(&mut self.gingival_margin_mid),
            Field::GingivalMarginMesial => Some(&mut self.gingival_margin_mesial),
            Field::ProbingDepthDistal => Some(&mut self.probing_depth_distal),
            Field::ProbingDepthMid => Some(&mut self.probing_depth_mid),
            Field::ProbingDepthMesial => Some(&mut self.probing_depth_mesial),
            _ => None,
        }
    }

    /// Merge this patch over `base`. Values are stored as given, unclamped.
    pub fn apply_to(&self, base: &Measurement) -> Measurement {
        fn take<T: Clone>(over: &Option<T>, base: &T) -> T {
            over.clone().unwrap_or_else(|| base.clone())
        }

        Measurement {
            present: take(&self.present, &base.present),
            mobility: take(&self.mobility, &base.mobility),
            implant: take(&self.implant, &base.implant),
            furcation: take(&self.furcation, &base.furcation),
            bleeding_distal: take(&self.bleeding_distal, &base.bleeding_distal),
            bleeding_mid: take(&self.bleeding_mid, &base.bleeding_mid),
            bleeding_mesial: take(&self.bleeding_mesial, &base.bleeding_mesial),
            plaque_distal: take(&self.plaque_distal, &base.plaque_distal),
            plaque_mid: take(&self.plaque_mid, &base.plaque_mid),
            plaque_mesial: take(&self.plaque_mesial, &base.plaque_mesial),
            gingival_margin_distal: take(&self.gingival_margin_distal, &base.gingival_margin_distal),
            gingival_margin_mid: take(&self.gingival_margin_mid, &base.gingival_margin_mid),
            gingival_margin_mesial: take(&self.gingival_margin_mesial, &base.gingival_margin_mesial),
            probing_depth_distal: take(&self.probing_depth_distal, &base.probing_depth_distal),
            probing_depth_mid: take(&self.probing_depth_mid, &base.probing_depth_mid),
            probing_depth_mesial: take(&self.probing_depth_mesial, &base.probing_depth_mesial),
            notes: take(&self.notes, &base.notes),
        }
    }
}

/// Partial initial values for one tooth.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToothPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buccal: Option<MeasurementPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palatal: Option<MeasurementPatch>,
}

impl ToothPatch {
    pub fn surface(&self, surface: Surface) -> Option<&MeasurementPatch> {
        match surface {
            Surface::Buccal => self.buccal.as_ref(),
            Surface::Palatal => self.palatal.as_ref(),
        }
    }

    pub fn with_surface(mut self, surface: Surface, patch: MeasurementPatch) -> Self {
        match surface {
            Surface::Buccal => self.buccal = Some(patch),
            Surface::Palatal => self.palatal = Some(patch),
        }
        self
    }
}

/// Caller-supplied partial chart: any subset of teeth, any subset of fields.
pub type PartialChart = BTreeMap<ToothId, ToothPatch>;

// ============================================================================
// Tooth data and chart
// ============================================================================

/// Both surface measurements of one tooth.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToothData {
    pub buccal: Measurement,
    pub palatal: Measurement,
}

impl ToothData {
    pub fn surface(&self, surface: Surface) -> &Measurement {
        match surface {
            Surface::Buccal => &self.buccal,
            Surface::Palatal => &self.palatal,
        }
    }

    pub fn surface_mut(&mut self, surface: Surface) -> &mut Measurement {
        match surface {
            Surface::Buccal => &mut self.buccal,
            Surface::Palatal => &mut self.palatal,
        }
    }
}

fn default_tooth() -> &'static ToothData {
    static DEFAULT: OnceLock<ToothData> = OnceLock::new();
    DEFAULT.get_or_init(ToothData::default)
}

/// A complete periodontal chart.
///
/// Cloning is cheap (one `Arc` bump). Equality compares by value.
#[derive(Clone, PartialEq, Eq)]
pub struct Chart {
    teeth: Arc<BTreeMap<ToothId, Arc<ToothData>>>,
}

impl Chart {
    /// Look up a tooth. Falls back to the canonical default for a tooth the
    /// chart does not carry, which a built chart never lacks.
    pub fn tooth(&self, tooth: ToothId) -> &ToothData {
        self.teeth.get(&tooth).map(|t| t.as_ref()).unwrap_or_else(|| default_tooth())
    }

    /// Shared handle to a tooth's data, if present.
    pub fn tooth_arc(&self, tooth: ToothId) -> Option<&Arc<ToothData>> {
        self.teeth.get(&tooth)
    }

    pub fn measurement(&self, tooth: ToothId, surface: Surface) -> &Measurement {
        self.tooth(tooth).surface(surface)
    }

    pub fn value(&self, tooth: ToothId, surface: Surface, field: Field) -> FieldValue<'_> {
        self.measurement(tooth, surface).get(field)
    }

    pub fn contains(&self, tooth: ToothId) -> bool {
        self.teeth.contains_key(&tooth)
    }

    pub fn len(&self) -> usize {
        self.teeth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teeth.is_empty()
    }

    /// Iterate teeth in catalogue order.
    pub fn iter(&self) -> impl Iterator<Item = (ToothId, &ToothData)> + '_ {
        ALL_TEETH.iter().map(move |t| (*t, self.tooth(*t)))
    }

    /// Iterate every (tooth, surface) record in catalogue order, buccal first.
    pub fn sites(&self) -> impl Iterator<Item = (ToothId, Surface, &Measurement)> + '_ {
        self.iter().flat_map(|(tooth, data)| {
            Surface::ALL.into_iter().map(move |s| (tooth, s, data.surface(s)))
        })
    }

    /// True if both charts are the same allocation (no edit in between).
    pub fn ptr_eq(a: &Chart, b: &Chart) -> bool {
        Arc::ptr_eq(&a.teeth, &b.teeth)
    }

    /// True if `tooth` is the same shared allocation in both charts.
    pub fn shares_tooth(a: &Chart, b: &Chart, tooth: ToothId) -> bool {
        match (a.teeth.get(&tooth), b.teeth.get(&tooth)) {
            (Some(x), Some(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }

    fn from_map(teeth: BTreeMap<ToothId, Arc<ToothData>>) -> Self {
        Self { teeth: Arc::new(teeth) }
    }
}

impl Default for Chart {
    fn default() -> Self {
        build_chart(&PartialChart::new())
    }
}

impl fmt::Debug for Chart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.teeth.iter().map(|(k, v)| (k, v.as_ref()))).finish()
    }
}

/// Serializes as `{ "<tooth>": { "buccal": .., "palatal": .. } }` in catalogue order.
impl Serialize for Chart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ALL_TEETH.len()))?;
        for (tooth, data) in self.iter() {
            map.serialize_entry(&tooth, data)?;
        }
        map.end()
    }
}

/// Deserializes as partial input merged over defaults, so the result is
/// always fully populated.
impl<'de> Deserialize<'de> for Chart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let partial = PartialChart::deserialize(deserializer)?;
        Ok(build_chart(&partial))
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Build a complete chart from partial initial values.
///
/// Every catalogue tooth gets both surfaces: the canonical default with the
/// caller's override merged field by field. Nothing is validated or clamped
/// here; out-of-range input surfaces later through validation.
pub fn build_chart(initial: &PartialChart) -> Chart {
    let default = Measurement::default();
    let teeth = ALL_TEETH
        .iter()
        .map(|tooth| {
            let patch = initial.get(tooth);
            let merged = |surface: Surface| match patch.and_then(|p| p.surface(surface)) {
                Some(over) => over.apply_to(&default),
                None => default.clone(),
            };
            let data = ToothData {
                buccal: merged(Surface::Buccal),
                palatal: merged(Surface::Palatal),
            };
            (*tooth, Arc::new(data))
        })
        .collect();
    Chart::from_map(teeth)
}

// ============================================================================
// Edits
// ============================================================================

/// Raw input for a single cell edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellInput {
    /// Typed text. Parsed for numeric fields, truncated for notes.
    Text(String),
    /// Already-numeric input (clamped for numeric fields).
    Number(i64),
    /// A toggle.
    Flag(bool),
}

impl From<&str> for CellInput {
    fn from(s: &str) -> Self {
        CellInput::Text(s.to_string())
    }
}

impl From<String> for CellInput {
    fn from(s: String) -> Self {
        CellInput::Text(s)
    }
}

impl From<bool> for CellInput {
    fn from(b: bool) -> Self {
        CellInput::Flag(b)
    }
}

impl From<i64> for CellInput {
    fn from(n: i64) -> Self {
        CellInput::Number(n)
    }
}

/// Parse typed numeric input.
///
/// A plain decimal is floored (`"2.7"` → 2, `"-0.5"` → -1). Otherwise a
/// leading integer prefix is used (`"12mm"` → 12, `"1e3"` → 1). Anything
/// without digits is 0.
pub fn parse_numeric_input(raw: &str) -> i64 {
    let trimmed = raw.trim();

    if is_plain_decimal(trimmed) {
        if let Ok(n) = trimmed.parse::<f64>() {
            // `as` saturates at the i64 bounds
            return n.floor() as i64;
        }
    }

    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1i64, &trimmed[1..]),
        Some(b'+') => (1i64, &trimmed[1..]),
        _ => (1i64, trimmed),
    };
    let digits: &str = {
        let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        &rest[..end]
    };
    if digits.is_empty() {
        return 0;
    }
    digits
        .parse::<i64>()
        .map(|n| sign * n)
        .unwrap_or(if sign < 0 { i64::MIN } else { i64::MAX })
}

/// `[+-]digits[.digits]`, with digits on at least one side of the point.
/// No exponents, no `inf`/`NaN`.
fn is_plain_decimal(s: &str) -> bool {
    let body = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);
    let (int, frac) = body.split_once('.').unwrap_or((body, ""));
    (!int.is_empty() || !frac.is_empty())
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
}

fn parse_flag_input(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "x")
}

/// Truncate to at most `max_chars` characters (not bytes).
fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => s[..end].to_string(),
        None => s.to_string(),
    }
}

/// Apply coerced input to a single field of a measurement.
pub fn apply_input(measurement: &mut Measurement, field: Field, input: &CellInput) {
    match field.kind() {
        FieldKind::Numeric { min, max } => {
            let n = match input {
                CellInput::Text(s) => parse_numeric_input(s),
                CellInput::Number(n) => *n,
                CellInput::Flag(b) => i64::from(*b),
            };
            let clamped = n.clamp(i64::from(min), i64::from(max)) as i32;
            if let Some(slot) = measurement.number_mut(field) {
                *slot = Some(clamped);
            }
        }
        FieldKind::Boolean => {
            let b = match input {
                CellInput::Flag(b) => *b,
                CellInput::Number(n) => *n != 0,
                CellInput::Text(s) => parse_flag_input(s),
            };
            if let Some(slot) = measurement.flag_mut(field) {
                *slot = b;
            }
        }
        FieldKind::Text { max_chars } => {
            measurement.notes = match input {
                CellInput::Text(s) => truncate_chars(s, max_chars),
                CellInput::Number(n) => n.to_string(),
                CellInput::Flag(b) => b.to_string(),
            };
        }
    }
}

/// Apply a single-field edit, returning a new chart.
///
/// Only the targeted tooth is rebuilt; every other tooth keeps its shared
/// allocation. A tooth missing from the chart is created from defaults first.
pub fn update(chart: &Chart, tooth: ToothId, surface: Surface, field: Field, input: &CellInput) -> Chart {
    let mut data = chart
        .teeth
        .get(&tooth)
        .map(|t| ToothData::clone(t))
        .unwrap_or_default();
    apply_input(data.surface_mut(surface), field, input);

    let mut teeth = BTreeMap::clone(&chart.teeth);
    teeth.insert(tooth, Arc::new(data));
    Chart::from_map(teeth)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tooth(code: u8) -> ToothId {
        ToothId::new(code).unwrap()
    }

    #[test]
    fn test_padded_tooth_key_rejected() {
        let json = r#"{ "018": { "buccal": { "mobility": 9 } }, "18": { "buccal": { "mobility": 1 } } }"#;
        assert!(serde_json::from_str::<PartialChart>(json).is_err());

        let ok: PartialChart = serde_json::from_str(r#"{ "18": { "buccal": { "mobility": 1 } } }"#).unwrap();
        assert_eq!(build_chart(&ok).measurement(tooth(18), Surface::Buccal).mobility, Some(1));
    }

    #[test]
    fn test_empty_initial_is_all_default() {
        let chart = build_chart(&PartialChart::new());
        assert_eq!(chart.len(), 32);
        let default = Measurement::default();
        for (_, _, m) in chart.sites() {
            assert_eq!(*m, default);
        }
    }

    #[test]
    fn test_merge_single_field() {
        let mut initial = PartialChart::new();
        initial.insert(
            tooth(16),
            ToothPatch::default()
                .with_surface(Surface::Buccal, MeasurementPatch::default().with_number(Field::Mobility, 2)),
        );
        let chart = build_chart(&initial);

        let buccal = chart.measurement(tooth(16), Surface::Buccal);
        assert_eq!(buccal.mobility, Some(2));
        let expected = Measurement { mobility: Some(2), ..Measurement::default() };
        assert_eq!(*buccal, expected);
        assert_eq!(*chart.measurement(tooth(16), Surface::Palatal), Measurement::default());
        assert_eq!(*chart.tooth(tooth(17)), ToothData::default());
    }

    #[test]
    fn test_build_keeps_out_of_range_values() {
        let mut initial = PartialChart::new();
        initial.insert(
            tooth(11),
            ToothPatch::default().with_surface(
                Surface::Palatal,
                MeasurementPatch::default().with_number(Field::ProbingDepthMid, 20),
            ),
        );
        let chart = build_chart(&initial);
        assert_eq!(chart.measurement(tooth(11), Surface::Palatal).probing_depth_mid, Some(20));
    }

    #[test]
    fn test_partial_from_json_with_null() {
        let json = r#"{ "24": { "buccal": { "furcation": null, "notes": "crown" } } }"#;
        let partial: PartialChart = serde_json::from_str(json).unwrap();
        let chart = build_chart(&partial);
        let m = chart.measurement(tooth(24), Surface::Buccal);
        assert_eq!(m.furcation, None);
        assert_eq!(m.notes, "crown");
        assert_eq!(m.mobility, Some(0));
    }

    #[test]
    fn test_partial_rejects_unknown_tooth() {
        let json = r#"{ "19": { "buccal": { "mobility": 1 } } }"#;
        assert!(serde_json::from_str::<PartialChart>(json).is_err());
    }

    #[test]
    fn test_update_shares_untouched_teeth() {
        let chart = build_chart(&PartialChart::new());
        let next = update(&chart, tooth(36), Surface::Buccal, Field::Mobility, &"2".into());

        assert!(!Chart::ptr_eq(&chart, &next));
        assert!(!Chart::shares_tooth(&chart, &next, tooth(36)));
        for t in ALL_TEETH.iter().filter(|t| t.code() != 36) {
            assert!(Chart::shares_tooth(&chart, &next, *t), "tooth {t} was copied");
        }
        assert_eq!(next.measurement(tooth(36), Surface::Buccal).mobility, Some(2));
        assert_eq!(chart.measurement(tooth(36), Surface::Buccal).mobility, Some(0));
    }

    #[test]
    fn test_update_clamps_numeric() {
        let chart = Chart::default();
        let t = tooth(18);
        let c = update(&chart, t, Surface::Buccal, Field::ProbingDepthDistal, &"99".into());
        assert_eq!(c.measurement(t, Surface::Buccal).probing_depth_distal, Some(15));
        let c = update(&chart, t, Surface::Buccal, Field::Mobility, &"-5".into());
        assert_eq!(c.measurement(t, Surface::Buccal).mobility, Some(0));
        let c = update(&chart, t, Surface::Buccal, Field::GingivalMarginMid, &"-12".into());
        assert_eq!(c.measurement(t, Surface::Buccal).gingival_margin_mid, Some(-10));
        let c = update(&chart, t, Surface::Buccal, Field::Furcation, &"abc".into());
        assert_eq!(c.measurement(t, Surface::Buccal).furcation, Some(0));
    }

    #[test]
    fn test_update_boolean_and_notes() {
        let chart = Chart::default();
        let t = tooth(44);
        let c = update(&chart, t, Surface::Palatal, Field::PlaqueMid, &CellInput::Flag(true));
        assert!(c.measurement(t, Surface::Palatal).plaque_mid);

        let long = "x".repeat(150);
        let c = update(&c, t, Surface::Palatal, Field::Notes, &long.as_str().into());
        assert_eq!(c.measurement(t, Surface::Palatal).notes.chars().count(), 100);
        assert!(c.measurement(t, Surface::Palatal).plaque_mid);
    }

    #[test]
    fn test_update_idempotent() {
        let chart = Chart::default();
        let t = tooth(27);
        let once = update(&chart, t, Surface::Buccal, Field::ProbingDepthMid, &"4".into());
        let twice = update(&once, t, Surface::Buccal, Field::ProbingDepthMid, &"4".into());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_parse_numeric_input() {
        assert_eq!(parse_numeric_input("7"), 7);
        assert_eq!(parse_numeric_input(" 3 "), 3);
        assert_eq!(parse_numeric_input("2.7"), 2);
        assert_eq!(parse_numeric_input("-0.5"), -1);
        assert_eq!(parse_numeric_input("12mm"), 12);
        assert_eq!(parse_numeric_input("-4x"), -4);
        assert_eq!(parse_numeric_input(""), 0);
        assert_eq!(parse_numeric_input("-"), 0);
        assert_eq!(parse_numeric_input("abc"), 0);
        assert_eq!(parse_numeric_input("99999999999999999999999"), i64::MAX);
        assert_eq!(parse_numeric_input("1e3"), 1);
        assert_eq!(parse_numeric_input("inf"), 0);
        assert_eq!(parse_numeric_input("NaN"), 0);
        assert_eq!(parse_numeric_input(".5"), 0);
        assert_eq!(parse_numeric_input("4."), 4);
    }

    #[test]
    fn test_truncate_multibyte() {
        let s = "é".repeat(120);
        let out = truncate_chars(&s, 100);
        assert_eq!(out.chars().count(), 100);
    }

    #[test]
    fn test_chart_json_shape() {
        let chart = Chart::default();
        let value = serde_json::to_value(&chart).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 32);
        assert_eq!(obj["18"]["buccal"]["present"], true);
        assert_eq!(obj["41"]["palatal"]["probing_depth_mesial"], 0);

        let back: Chart = serde_json::from_value(value).unwrap();
        assert_eq!(back, chart);
    }
}
