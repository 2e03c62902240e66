//! Property-based invariant tests for `Rect`.
//!
//! 1. Intersection is commutative.
//! 2. Intersection result fits within both inputs.
//! 3. Union contains both inputs.
//! 4. `contains` agrees with intersection.
//! 5. Subtraction pieces are disjoint, avoid the hole, stay inside the source,
//!    and together with the overlap account for the full source area.
//! 6. No panics on extreme values.

use overtex_core::geometry::Rect;
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn small_rect_strategy() -> impl Strategy<Value = Rect> {
    (-50i32..=200, -50i32..=200, -10i32..=150, -10i32..=150)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn non_empty_rect_strategy() -> impl Strategy<Value = Rect> {
    (-50i32..=200, -50i32..=200, 1i32..=150, 1i32..=150)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn extreme_rect_strategy() -> impl Strategy<Value = Rect> {
    (any::<i32>(), any::<i32>(), any::<i32>(), any::<i32>())
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Intersection is commutative
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn intersection_commutative(a in small_rect_strategy(), b in small_rect_strategy()) {
        prop_assert_eq!(
            a.intersection(&b),
            b.intersection(&a),
            "intersection is not commutative: a={:?}, b={:?}",
            a, b
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Intersection result fits within both inputs
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn intersection_within_inputs(a in small_rect_strategy(), b in small_rect_strategy()) {
        if let Some(i) = a.intersection_opt(&b) {
            prop_assert!(a.contains_rect(&i), "{:?} not inside {:?}", i, a);
            prop_assert!(b.contains_rect(&i), "{:?} not inside {:?}", i, b);
        } else {
            prop_assert!(!a.intersects(&b));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Union contains both inputs
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn union_contains_inputs(a in non_empty_rect_strategy(), b in non_empty_rect_strategy()) {
        let u = a.union(&b);
        prop_assert!(u.contains_rect(&a));
        prop_assert!(u.contains_rect(&b));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Contains agrees with intersection
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn contains_agrees_with_intersection(
        a in small_rect_strategy(),
        b in small_rect_strategy(),
        px in -60i32..=360,
        py in -60i32..=360,
    ) {
        let i = a.intersection(&b);
        prop_assert_eq!(
            i.contains(px, py),
            a.contains(px, py) && b.contains(px, py),
            "point ({}, {}) a={:?} b={:?} i={:?}", px, py, a, b, i
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Subtraction
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn subtract_partitions_source(a in non_empty_rect_strategy(), hole in small_rect_strategy()) {
        let pieces = a.subtract(&hole);
        let slice = pieces.as_slice();

        for (i, p) in slice.iter().enumerate() {
            prop_assert!(!p.is_empty(), "empty piece {:?}", p);
            prop_assert!(a.contains_rect(p), "piece {:?} escapes {:?}", p, a);
            prop_assert!(!p.intersects(&hole), "piece {:?} overlaps hole {:?}", p, hole);
            for q in &slice[i + 1..] {
                prop_assert!(!p.intersects(q), "pieces {:?} and {:?} overlap", p, q);
            }
        }

        let pieces_area: i64 = slice.iter().map(Rect::area).sum();
        prop_assert_eq!(pieces_area + a.intersection(&hole).area(), a.area());
    }

    #[test]
    fn subtract_pointwise(
        a in non_empty_rect_strategy(),
        hole in small_rect_strategy(),
        px in -60i32..=360,
        py in -60i32..=360,
    ) {
        let pieces = a.subtract(&hole);
        let in_pieces = pieces.iter().any(|p| p.contains(px, py));
        prop_assert_eq!(in_pieces, a.contains(px, py) && !hole.contains(px, py));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. No panics on extreme values
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn extreme_values_do_not_panic(a in extreme_rect_strategy(), b in extreme_rect_strategy()) {
        let _ = a.right();
        let _ = a.bottom();
        let _ = a.area();
        let _ = a.intersection(&b);
        let _ = a.union(&b);
        let _ = a.contains_rect(&b);
        let _ = a.offset(i32::MAX, i32::MIN);
    }
}
