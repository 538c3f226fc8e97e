// Property-based tests for chart edits, validation, and navigation.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;
use periochart_engine::chart::{build_chart, update, CellInput, Chart, PartialChart};
use periochart_engine::navigation::{navigation_map, Direction};
use periochart_engine::schema::{Field, Surface, ToothId, ALL_TEETH};
use periochart_engine::validation::{is_valid, validate_chart};
use periochart_engine::CellKey;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn arb_tooth() -> impl Strategy<Value = ToothId> {
    (0usize..32).prop_map(|i| ALL_TEETH[i])
}

fn arb_surface() -> impl Strategy<Value = Surface> {
    prop_oneof![Just(Surface::Buccal), Just(Surface::Palatal)]
}

fn arb_field() -> impl Strategy<Value = Field> {
    (0usize..16).prop_map(Field::at)
}

fn arb_numeric_field() -> impl Strategy<Value = Field> {
    prop::sample::select(Field::ALL.iter().copied().filter(|f| f.is_numeric()).collect::<Vec<_>>())
}

fn arb_cell() -> impl Strategy<Value = CellKey> {
    (arb_tooth(), arb_surface(), arb_field()).prop_map(|(t, s, f)| CellKey::new(t, s, f))
}

/// Arbitrary typed input: mostly numbers, sometimes junk, sometimes empty.
fn arb_input() -> impl Strategy<Value = CellInput> {
    prop_oneof![
        4 => (-1000i64..1000).prop_map(|n| CellInput::Text(n.to_string())),
        1 => r"[a-z ]{0,8}".prop_map(CellInput::Text),
        1 => any::<bool>().prop_map(CellInput::Flag),
        1 => (-1000i64..1000).prop_map(CellInput::Number),
    ]
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop::sample::select(Direction::ALL.to_vec())
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    /// Numeric input is floored and clamped into the field domain.
    #[test]
    fn numeric_update_clamps(
        tooth in arb_tooth(),
        surface in arb_surface(),
        field in arb_numeric_field(),
        v in -1000i64..1000,
    ) {
        let chart = Chart::default();
        let next = update(&chart, tooth, surface, field, &CellInput::Text(v.to_string()));
        let (min, max) = field.bounds().unwrap();
        let expected = v.clamp(i64::from(min), i64::from(max)) as i32;
        prop_assert_eq!(next.measurement(tooth, surface).number(field), Some(expected));
    }

    /// Applying the same edit twice equals applying it once.
    #[test]
    fn update_is_idempotent(cell in arb_cell(), input in arb_input()) {
        let chart = Chart::default();
        let once = update(&chart, cell.tooth, cell.surface, cell.field, &input);
        let twice = update(&once, cell.tooth, cell.surface, cell.field, &input);
        prop_assert_eq!(once, twice);
    }

    /// Interactive edits can never make a valid chart invalid.
    #[test]
    fn edits_keep_chart_valid(edits in prop::collection::vec((arb_cell(), arb_input()), 0..40)) {
        let mut chart = build_chart(&PartialChart::new());
        for (cell, input) in &edits {
            chart = update(&chart, cell.tooth, cell.surface, cell.field, input);
        }
        prop_assert!(is_valid(&validate_chart(&chart)));
    }

    /// Edits on different cells commute.
    #[test]
    fn different_cells_commute(a in arb_cell(), b in arb_cell(), x in arb_input(), y in arb_input()) {
        prop_assume!(a != b);
        let base = Chart::default();
        let ab = update(&update(&base, a.tooth, a.surface, a.field, &x), b.tooth, b.surface, b.field, &y);
        let ba = update(&update(&base, b.tooth, b.surface, b.field, &y), a.tooth, a.surface, a.field, &x);
        prop_assert_eq!(ab, ba);
    }

    /// Navigation never leaves the starting surface, and opposite moves undo each other.
    #[test]
    fn navigation_is_surface_isolated_and_reversible(cell in arb_cell(), dir in arb_direction()) {
        let map = navigation_map();
        let target = map.neighbor(&cell, dir).unwrap();
        prop_assert_eq!(target.surface, cell.surface);

        let back = match dir {
            Direction::Next => Direction::Prev,
            Direction::Prev => Direction::Next,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        };
        prop_assert_eq!(map.neighbor(&target, back), Some(cell));
    }
}
