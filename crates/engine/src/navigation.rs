//! Keyboard navigation graph over the chart grid.
//!
//! Every cell has four precomputed neighbours on its own surface:
//!
//! ```text
//! next / prev  →  same field, adjacent tooth   (wraps over all 32 teeth)
//! down / up    →  same tooth, adjacent field   (wraps over all 16 fields)
//! ```
//!
//! # Invariants
//!
//! 1. **Total:** every one of the 1,024 cells has an entry, so navigation
//!    never dead-ends.
//! 2. **Surface isolation:** no edge crosses from buccal to palatal or back.
//! 3. **Axis isolation:** next/prev never change the field, up/down never
//!    change the tooth.
//! 4. **Immutable:** the process-wide map is built once on first use and
//!    only read afterwards.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::OnceLock;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cell_key::CellKey;
use crate::schema::{Field, ParseKeyError, ToothId, FIELD_COUNT, TOOTH_COUNT};

// ============================================================================
// Direction
// ============================================================================

/// Direction of a focus move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Next,
    Prev,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Next, Direction::Prev, Direction::Up, Direction::Down];

    /// Resolve a key press to a direction.
    ///
    /// `key` uses DOM-style key names. Returns `None` for keys that do not
    /// move focus.
    pub fn from_key(key: &str, shift: bool) -> Option<Self> {
        match (key, shift) {
            ("ArrowRight", _) => Some(Direction::Next),
            ("ArrowLeft", _) => Some(Direction::Prev),
            ("ArrowUp", _) => Some(Direction::Up),
            ("ArrowDown", _) => Some(Direction::Down),
            ("Tab", false) => Some(Direction::Next),
            ("Tab", true) => Some(Direction::Prev),
            ("Enter", false) => Some(Direction::Down),
            ("Enter", true) => Some(Direction::Up),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Next => "next",
            Direction::Prev => "prev",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "next" => Ok(Direction::Next),
            "prev" => Ok(Direction::Prev),
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(ParseKeyError::UnknownDirection(s.to_string())),
        }
    }
}

// ============================================================================
// Graph
// ============================================================================

/// The four neighbours of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavEdges {
    pub next: CellKey,
    pub prev: CellKey,
    pub up: CellKey,
    pub down: CellKey,
}

impl NavEdges {
    #[inline]
    pub fn get(&self, direction: Direction) -> CellKey {
        match direction {
            Direction::Next => self.next,
            Direction::Prev => self.prev,
            Direction::Up => self.up,
            Direction::Down => self.down,
        }
    }
}

/// Precomputed neighbour table for every cell of the grid.
#[derive(Debug, Clone, Default)]
pub struct NavigationMap {
    edges: FxHashMap<CellKey, NavEdges>,
}

impl NavigationMap {
    pub fn get(&self, key: &CellKey) -> Option<&NavEdges> {
        self.edges.get(key)
    }

    /// Neighbour of `from` in `direction`, or `None` for a cell outside the grid.
    pub fn neighbor(&self, from: &CellKey, direction: Direction) -> Option<CellKey> {
        self.edges.get(from).map(|edges| edges.get(direction))
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellKey, &NavEdges)> {
        self.edges.iter()
    }
}

/// Build the neighbour table from catalogue order and field order.
pub fn build_navigation_map() -> NavigationMap {
    let mut edges = FxHashMap::default();
    edges.reserve(TOOTH_COUNT * 2 * FIELD_COUNT);

    for key in CellKey::all() {
        let i = key.tooth.index();
        let j = key.field.index();
        let at_tooth = |t: usize| CellKey::new(ToothId::at(t), key.surface, key.field);
        let at_field = |f: usize| CellKey::new(key.tooth, key.surface, Field::at(f));

        edges.insert(
            key,
            NavEdges {
                next: at_tooth(i + 1),
                prev: at_tooth(i + TOOTH_COUNT - 1),
                down: at_field(j + 1),
                up: at_field(j + FIELD_COUNT - 1),
            },
        );
    }

    NavigationMap { edges }
}

/// The process-wide navigation map, built on first use.
pub fn navigation_map() -> &'static NavigationMap {
    static MAP: OnceLock<NavigationMap> = OnceLock::new();
    MAP.get_or_init(build_navigation_map)
}

/// Resolve a move from a cell key string. Unknown or malformed keys yield
/// `None` (no move).
pub fn navigate(cell_key: &str, direction: Direction) -> Option<CellKey> {
    let key: CellKey = cell_key.parse().ok()?;
    navigation_map().neighbor(&key, direction)
}

// ============================================================================
// Addressable cell index
// ============================================================================

/// Index from cell key to a presentation-layer handle.
///
/// The presentation layer registers a handle (widget id, element ref, ...)
/// for each rendered cell. Navigation output then resolves to a handle with
/// a single lookup, without scanning the view tree.
#[derive(Debug, Clone)]
pub struct CellIndex<H> {
    handles: FxHashMap<CellKey, H>,
}

impl<H> Default for CellIndex<H> {
    fn default() -> Self {
        Self { handles: FxHashMap::default() }
    }
}

impl<H> CellIndex<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the handle for a cell. Returns the previous handle.
    pub fn register(&mut self, key: CellKey, handle: H) -> Option<H> {
        self.handles.insert(key, handle)
    }

    /// Remove a cell's handle, e.g. when the cell is unmounted.
    pub fn unregister(&mut self, key: &CellKey) -> Option<H> {
        self.handles.remove(key)
    }

    pub fn resolve(&self, key: &CellKey) -> Option<&H> {
        self.handles.get(key)
    }

    /// Handle of the cell focus should move to, if that cell is registered.
    pub fn focus_target(&self, from: &CellKey, direction: Direction) -> Option<&H> {
        let target = navigation_map().neighbor(from, direction)?;
        self.handles.get(&target)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn clear(&mut self) {
        self.handles.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Surface, ALL_TEETH};

    fn nav(key: &str, dir: &str) -> Option<String> {
        navigate(key, dir.parse().unwrap()).map(|k| k.to_string())
    }

    #[test]
    fn test_map_is_total() {
        let map = build_navigation_map();
        assert_eq!(map.len(), 1024);
        for key in CellKey::all() {
            assert!(map.get(&key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_prev_wraps_to_last_tooth() {
        assert_eq!(nav("18-buccal-mobility", "prev").as_deref(), Some("41-buccal-mobility"));
        assert_eq!(nav("41-buccal-mobility", "next").as_deref(), Some("18-buccal-mobility"));
    }

    #[test]
    fn test_down_wraps_to_first_field() {
        assert_eq!(nav("18-buccal-notes", "down").as_deref(), Some("18-buccal-mobility"));
        assert_eq!(nav("18-buccal-mobility", "up").as_deref(), Some("18-buccal-notes"));
    }

    #[test]
    fn test_quadrant_boundaries_are_not_walls() {
        assert_eq!(nav("11-palatal-furcation", "next").as_deref(), Some("21-palatal-furcation"));
        assert_eq!(nav("28-buccal-notes", "next").as_deref(), Some("38-buccal-notes"));
        assert_eq!(nav("48-palatal-implant", "prev").as_deref(), Some("31-palatal-implant"));
    }

    #[test]
    fn test_interior_moves() {
        assert_eq!(nav("16-buccal-plaque_mid", "down").as_deref(), Some("16-buccal-plaque_mesial"));
        assert_eq!(nav("16-buccal-plaque_mid", "up").as_deref(), Some("16-buccal-plaque_distal"));
        assert_eq!(nav("16-buccal-plaque_mid", "next").as_deref(), Some("15-buccal-plaque_mid"));
        assert_eq!(nav("16-buccal-plaque_mid", "prev").as_deref(), Some("17-buccal-plaque_mid"));
    }

    #[test]
    fn test_surfaces_are_disjoint() {
        let map = navigation_map();
        for (key, edges) in map.iter() {
            for dir in Direction::ALL {
                assert_eq!(edges.get(dir).surface, key.surface, "{key} {dir}");
            }
            assert_eq!(edges.next.field, key.field);
            assert_eq!(edges.prev.field, key.field);
            assert_eq!(edges.up.tooth, key.tooth);
            assert_eq!(edges.down.tooth, key.tooth);
        }
    }

    #[test]
    fn test_full_cycles() {
        let start: CellKey = "23-palatal-gingival_margin_mid".parse().unwrap();
        let map = navigation_map();

        let mut cur = start;
        for _ in 0..ALL_TEETH.len() {
            cur = map.neighbor(&cur, Direction::Next).unwrap();
        }
        assert_eq!(cur, start);

        for _ in 0..FIELD_COUNT {
            cur = map.neighbor(&cur, Direction::Up).unwrap();
        }
        assert_eq!(cur, start);
    }

    #[test]
    fn test_unknown_key_is_noop() {
        assert_eq!(navigate("99-buccal-mobility", Direction::Next), None);
        assert_eq!(navigate("garbage", Direction::Down), None);
        assert_eq!(navigate("", Direction::Up), None);
    }

    #[test]
    fn test_direction_from_key() {
        assert_eq!(Direction::from_key("ArrowRight", false), Some(Direction::Next));
        assert_eq!(Direction::from_key("Tab", true), Some(Direction::Prev));
        assert_eq!(Direction::from_key("Enter", false), Some(Direction::Down));
        assert_eq!(Direction::from_key("Enter", true), Some(Direction::Up));
        assert_eq!(Direction::from_key("a", false), None);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_cell_index_focus_target() {
        let mut index: CellIndex<u32> = CellIndex::new();
        let tooth = ALL_TEETH[0];
        for (n, field) in Field::ALL.iter().enumerate() {
            index.register(CellKey::new(tooth, Surface::Buccal, *field), n as u32);
        }
        let from = CellKey::new(tooth, Surface::Buccal, Field::Notes);

        assert_eq!(index.focus_target(&from, Direction::Down), Some(&0));
        assert_eq!(index.focus_target(&from, Direction::Up), Some(&14));
        // Neighbouring tooth was never registered.
        assert_eq!(index.focus_target(&from, Direction::Next), None);

        index.unregister(&CellKey::new(tooth, Surface::Buccal, Field::Mobility));
        assert_eq!(index.focus_target(&from, Direction::Down), None);
        assert_eq!(index.len(), 15);
    }
}
