//! Measurement schema: tooth catalogue, surfaces, and the fixed field list.
//!
//! The grid topology is fixed by domain. There are 32 teeth in four quadrant
//! groups, two surfaces per tooth, and 16 fields per surface. Everything that
//! walks the chart (navigation, validation, aggregation) uses the orders
//! defined here.
//!
//! ## Field domains
//!
//! | Field               | Kind    | Domain    |
//! |---------------------|---------|-----------|
//! | mobility, furcation | numeric | 0..=3     |
//! | gingival_margin_*   | numeric | -10..=10  |
//! | probing_depth_*     | numeric | 0..=15    |
//! | implant, bleeding_*, plaque_* | boolean | |
//! | notes               | text    | 100 chars |

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Maximum length of the free-text notes field, in characters.
pub const NOTES_MAX_CHARS: usize = 100;

/// Number of teeth in the catalogue.
pub const TOOTH_COUNT: usize = 32;

/// Number of fields per tooth surface.
pub const FIELD_COUNT: usize = 16;

// ============================================================================
// Errors
// ============================================================================

/// Error when parsing a tooth, surface, field, cell key, or direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseKeyError {
    /// Tooth code is not part of the catalogue.
    UnknownTooth(String),
    /// Surface name is not `buccal` or `palatal`.
    UnknownSurface(String),
    /// Field name is not one of the 16 chart fields.
    UnknownField(String),
    /// Direction is not one of next/prev/up/down.
    UnknownDirection(String),
    /// Key does not have the expected `tooth-surface[-field]` shape.
    Malformed(String),
}

impl fmt::Display for ParseKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTooth(s) => write!(f, "unknown tooth: {s:?}"),
            Self::UnknownSurface(s) => write!(f, "unknown surface: {s:?}"),
            Self::UnknownField(s) => write!(f, "unknown field: {s:?}"),
            Self::UnknownDirection(s) => write!(f, "unknown direction: {s:?}"),
            Self::Malformed(s) => write!(f, "malformed cell key: {s:?}"),
        }
    }
}

impl std::error::Error for ParseKeyError {}

// ============================================================================
// Tooth catalogue
// ============================================================================

/// Two-digit FDI tooth code drawn from the fixed catalogue.
///
/// Construct through [`ToothId::new`] or `FromStr`; both reject codes that
/// are not in [`ALL_TEETH`], so a `ToothId` always has a catalogue index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToothId(u8);

const fn t(code: u8) -> ToothId {
    ToothId(code)
}

/// Every tooth, flattened across quadrants. This is the canonical traversal
/// and aggregation order.
pub const ALL_TEETH: [ToothId; TOOTH_COUNT] = [
    // upper-right
    t(18), t(17), t(16), t(15), t(14), t(13), t(12), t(11),
    // upper-left
    t(21), t(22), t(23), t(24), t(25), t(26), t(27), t(28),
    // lower-left
    t(38), t(37), t(36), t(35), t(34), t(33), t(32), t(31),
    // lower-right
    t(48), t(47), t(46), t(45), t(44), t(43), t(42), t(41),
];

impl ToothId {
    /// Look up a tooth by its numeric code. Returns `None` for codes outside
    /// the catalogue.
    pub fn new(code: u8) -> Option<Self> {
        ALL_TEETH.iter().copied().find(|tooth| tooth.0 == code)
    }

    /// The numeric FDI code.
    #[inline]
    pub fn code(self) -> u8 {
        self.0
    }

    /// 0-based position in [`ALL_TEETH`].
    pub fn index(self) -> usize {
        ALL_TEETH
            .iter()
            .position(|tooth| *tooth == self)
            .unwrap_or(0)
    }

    /// Tooth at a catalogue position, wrapping modulo 32.
    #[inline]
    pub fn at(index: usize) -> Self {
        ALL_TEETH[index % TOOTH_COUNT]
    }
}

impl fmt::Display for ToothId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl FromStr for ToothId {
    type Err = ParseKeyError;

    /// Exactly two ASCII digits naming a catalogue tooth. No sign, padding,
    /// or whitespace, so each tooth has a single spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ParseKeyError::UnknownTooth(s.to_string());
        match s.as_bytes() {
            [tens @ b'0'..=b'9', ones @ b'0'..=b'9'] => {
                ToothId::new((tens - b'0') * 10 + (ones - b'0')).ok_or_else(unknown)
            }
            _ => Err(unknown()),
        }
    }
}

// Tooth ids are map keys in the serialized chart, so they travel as strings.
impl Serialize for ToothId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ToothId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ToothVisitor;

        impl Visitor<'_> for ToothVisitor {
            type Value = ToothId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a two-digit tooth code from the catalogue")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ToothId, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ToothId, E> {
                u8::try_from(v)
                    .ok()
                    .and_then(ToothId::new)
                    .ok_or_else(|| E::custom(ParseKeyError::UnknownTooth(v.to_string())))
            }
        }

        deserializer.deserialize_any(ToothVisitor)
    }
}

// ============================================================================
// Surfaces
// ============================================================================

/// Tooth surface. Each tooth carries exactly one measurement per surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Buccal,
    Palatal,
}

impl Surface {
    pub const ALL: [Surface; 2] = [Surface::Buccal, Surface::Palatal];

    pub fn as_str(self) -> &'static str {
        match self {
            Surface::Buccal => "buccal",
            Surface::Palatal => "palatal",
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Surface {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buccal" => Ok(Surface::Buccal),
            "palatal" => Ok(Surface::Palatal),
            _ => Err(ParseKeyError::UnknownSurface(s.to_string())),
        }
    }
}

// ============================================================================
// Fields
// ============================================================================

/// Sub-site of a surface for the three-way measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    Distal,
    Mid,
    Mesial,
}

impl Site {
    pub const ALL: [Site; 3] = [Site::Distal, Site::Mid, Site::Mesial];
}

/// How a field's raw input is interpreted and stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Integer clamped to the inclusive domain `[min, max]`.
    Numeric { min: i32, max: i32 },
    /// Toggle, committed immediately.
    Boolean,
    /// Free text capped at `max_chars` characters.
    Text { max_chars: usize },
}

/// One of the 16 editable fields of a tooth surface, in navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Mobility,
    Implant,
    Furcation,
    BleedingDistal,
    BleedingMid,
    BleedingMesial,
    PlaqueDistal,
    PlaqueMid,
    PlaqueMesial,
    GingivalMarginDistal,
    GingivalMarginMid,
    GingivalMarginMesial,
    ProbingDepthDistal,
    ProbingDepthMid,
    ProbingDepthMesial,
    Notes,
}

impl Field {
    /// Fields in navigation (top-to-bottom) order.
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::Mobility,
        Field::Implant,
        Field::Furcation,
        Field::BleedingDistal,
        Field::BleedingMid,
        Field::BleedingMesial,
        Field::PlaqueDistal,
        Field::PlaqueMid,
        Field::PlaqueMesial,
        Field::GingivalMarginDistal,
        Field::GingivalMarginMid,
        Field::GingivalMarginMesial,
        Field::ProbingDepthDistal,
        Field::ProbingDepthMid,
        Field::ProbingDepthMesial,
        Field::Notes,
    ];

    pub const BLEEDING: [Field; 3] = [Field::BleedingDistal, Field::BleedingMid, Field::BleedingMesial];
    pub const PLAQUE: [Field; 3] = [Field::PlaqueDistal, Field::PlaqueMid, Field::PlaqueMesial];
    pub const GINGIVAL_MARGIN: [Field; 3] = [
        Field::GingivalMarginDistal,
        Field::GingivalMarginMid,
        Field::GingivalMarginMesial,
    ];
    pub const PROBING_DEPTH: [Field; 3] = [
        Field::ProbingDepthDistal,
        Field::ProbingDepthMid,
        Field::ProbingDepthMesial,
    ];

    /// 0-based position in [`Field::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Field at a position, wrapping modulo 16.
    #[inline]
    pub fn at(index: usize) -> Self {
        Field::ALL[index % FIELD_COUNT]
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::Mobility => "mobility",
            Field::Implant => "implant",
            Field::Furcation => "furcation",
            Field::BleedingDistal => "bleeding_distal",
            Field::BleedingMid => "bleeding_mid",
            Field::BleedingMesial => "bleeding_mesial",
            Field::PlaqueDistal => "plaque_distal",
            Field::PlaqueMid => "plaque_mid",
            Field::PlaqueMesial => "plaque_mesial",
            Field::GingivalMarginDistal => "gingival_margin_distal",
            Field::GingivalMarginMid => "gingival_margin_mid",
            Field::GingivalMarginMesial => "gingival_margin_mesial",
            Field::ProbingDepthDistal => "probing_depth_distal",
            Field::ProbingDepthMid => "probing_depth_mid",
            Field::ProbingDepthMesial => "probing_depth_mesial",
            Field::Notes => "notes",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Mobility | Field::Furcation => FieldKind::Numeric { min: 0, max: 3 },
            Field::GingivalMarginDistal | Field::GingivalMarginMid | Field::GingivalMarginMesial => {
                FieldKind::Numeric { min: -10, max: 10 }
            }
            Field::ProbingDepthDistal | Field::ProbingDepthMid | Field::ProbingDepthMesial => {
                FieldKind::Numeric { min: 0, max: 15 }
            }
            Field::Notes => FieldKind::Text { max_chars: NOTES_MAX_CHARS },
            _ => FieldKind::Boolean,
        }
    }

    /// Inclusive domain for numeric fields.
    pub fn bounds(self) -> Option<(i32, i32)> {
        match self.kind() {
            FieldKind::Numeric { min, max } => Some((min, max)),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self.kind(), FieldKind::Numeric { .. })
    }

    /// The sub-site of a three-way field (`None` for per-surface fields).
    pub fn site(self) -> Option<Site> {
        match self {
            Field::BleedingDistal
            | Field::PlaqueDistal
            | Field::GingivalMarginDistal
            | Field::ProbingDepthDistal => Some(Site::Distal),
            Field::BleedingMid | Field::PlaqueMid | Field::GingivalMarginMid | Field::ProbingDepthMid => {
                Some(Site::Mid)
            }
            Field::BleedingMesial
            | Field::PlaqueMesial
            | Field::GingivalMarginMesial
            | Field::ProbingDepthMesial => Some(Site::Mesial),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.name() == s)
            .ok_or_else(|| ParseKeyError::UnknownField(s.to_string()))
    }
}

// ============================================================================
// Measurement
// ============================================================================

/// All recorded values for one tooth surface.
///
/// Serialized field order matches the chart export contract: `present`
/// first, then the 16 fields in navigation order.
///
/// Numeric values are `Option` because externally supplied data may leave a
/// required value out; validation reports those as `*_required`. Values
/// produced by the chart builder and by edits are always `Some`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Measurement {
    pub present: bool,
    pub mobility: Option<i32>,
    pub implant: bool,
    pub furcation: Option<i32>,
    pub bleeding_distal: bool,
    pub bleeding_mid: bool,
    pub bleeding_mesial: bool,
    pub plaque_distal: bool,
    pub plaque_mid: bool,
    pub plaque_mesial: bool,
    pub gingival_margin_distal: Option<i32>,
    pub gingival_margin_mid: Option<i32>,
    pub gingival_margin_mesial: Option<i32>,
    pub probing_depth_distal: Option<i32>,
    pub probing_depth_mid: Option<i32>,
    pub probing_depth_mesial: Option<i32>,
    pub notes: String,
}

impl Default for Measurement {
    /// The canonical default: present, every count 0, every flag off, no notes.
    fn default() -> Self {
        Self {
            present: true,
            mobility: Some(0),
            implant: false,
            furcation: Some(0),
            bleeding_distal: false,
            bleeding_mid: false,
            bleeding_mesial: false,
            plaque_distal: false,
            plaque_mid: false,
            plaque_mesial: false,
            gingival_margin_distal: Some(0),
            gingival_margin_mid: Some(0),
            gingival_margin_mesial: Some(0),
            probing_depth_distal: Some(0),
            probing_depth_mid: Some(0),
            probing_depth_mesial: Some(0),
            notes: String::new(),
        }
    }
}

/// A field's current value, as read from a [`Measurement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Number(Option<i32>),
    Flag(bool),
    Text(&'a str),
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(Some(n)) => write!(f, "{n}"),
            FieldValue::Number(None) => Ok(()),
            FieldValue::Flag(b) => write!(f, "{b}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl Measurement {
    /// Numeric value of a field. `None` for absent values and for non-numeric fields.
    pub fn number(&self, field: Field) -> Option<i32> {
        match field {
            Field::Mobility => self.mobility,
            Field::Furcation => self.furcation,
            Field::GingivalMarginDistal => self.gingival_margin_distal,
            Field::GingivalMarginMid => self.gingival_margin_mid,
            Field::GingivalMarginMesial => self.gingival_margin_mesial,
            Field::ProbingDepthDistal => self.probing_depth_distal,
            Field::ProbingDepthMid => self.probing_depth_mid,
            Field::ProbingDepthMesial => self.probing_depth_mesial,
            _ => None,
        }
    }

    /// Mutable slot for a numeric field.
    pub fn number_mut(&mut self, field: Field) -> Option<&mut Option<i32>> {
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

    /// Boolean value of a field. `false` for non-boolean fields.
    pub fn flag(&self, field: Field) -> bool {
        match field {
            Field::Implant => self.implant,
            Field::BleedingDistal => self.bleeding_distal,
            Field::BleedingMid => self.bleeding_mid,
            Field::BleedingMesial => self.bleeding_mesial,
            Field::PlaqueDistal => self.plaque_distal,
            Field::PlaqueMid => self.plaque_mid,
            Field::PlaqueMesial => self.plaque_mesial,
            _ => false,
        }
    }

    pub fn flag_mut(&mut self, field: Field) -> Option<&mut bool> {
        match field {
            Field::Implant => Some(&mut self.implant),
            Field::BleedingDistal => Some(&mut self.bleeding_distal),
            Field::BleedingMid => Some(&mut self.bleeding_mid),
            Field::BleedingMesial => Some(&mut self.bleeding_mesial),
            Field::PlaqueDistal => Some(&mut self.plaque_distal),
            Field::PlaqueMid => Some(&mut self.plaque_mid),
            Field::PlaqueMesial => Some(&mut self.plaque_mesial),
            _ => None,
        }
    }

    pub fn get(&self, field: Field) -> FieldValue<'_> {
        match field.kind() {
            FieldKind::Numeric { .. } => FieldValue::Number(self.number(field)),
            FieldKind::Boolean => FieldValue::Flag(self.flag(field)),
            FieldKind::Text { .. } => FieldValue::Text(&self.notes),
        }
    }

    /// True if any of the three plaque flags is set.
    pub fn has_plaque(&self) -> bool {
        Field::PLAQUE.iter().any(|f| self.flag(*f))
    }

    /// True if any of the three bleeding-on-probing flags is set.
    pub fn has_bleeding(&self) -> bool {
        Field::BLEEDING.iter().any(|f| self.flag(*f))
    }
}

// ============================================================================
// Tests
// ============================================================================
