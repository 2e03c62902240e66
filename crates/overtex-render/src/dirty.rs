#![forbid(unsafe_code)]

//! Incremental dirty-rectangle tracking.
//!
//! The [`DirtyRegionTracker`] accumulates everything drawn since the last
//! drain as a list of rectangles. After every mutation:
//!
//! 1. **Coverage**: the union of the list equals the union of every rectangle
//!    submitted since the last drain.
//! 2. **Non-containment**: no rectangle in the list contains another.
//! 3. **Disjointness**: no two rectangles in the list overlap (this implies 2).
//!
//! # Algorithm
//!
//! A new rectangle is tested against each stored rectangle in turn:
//!
//! - covered by a stored rect: dropped;
//! - covering a stored rect: the stored rect is removed and testing
//!   continues;
//! - partially overlapping: the new rect is replaced by the (at most four)
//!   pieces of it lying outside the stored rect, see [`Rect::subtract`], and
//!   each piece resumes testing at the next stored rect.
//!
//! Whatever survives the whole list is appended. Pieces resume *after* the
//! rect that split them because every earlier stored rect was already
//! disjoint from (or removed by) their parent.
//!
//! # Forced full redraw
//!
//! A renderer may be multi-buffered, so a forced full redraw has to be
//! reported by every encode of the frame in which it is first observed. The
//! tracker latches the first frame index it is encoded at and keeps
//! reporting full redraws until an encode arrives with a different index.

use overtex_core::geometry::Rect;
use smallvec::SmallVec;

/// Latch state of a forced full redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ForcedRedraw {
    #[default]
    Idle,
    /// Requested, not yet reported by any encode.
    Pending,
    /// Reported for this frame index.
    Latched(u64),
}

/// Minimal non-overlapping set of rectangles covering all dirty area.
#[derive(Debug, Clone, Default)]
pub struct DirtyRegionTracker {
    rects: Vec<Rect>,
    forced: ForcedRedraw,
}

impl DirtyRegionTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rectangle to the region list.
    ///
    /// Empty rectangles are ignored. Callers are expected to have clipped the
    /// rectangle to the surface already (see
    /// [`Surface::mark_dirty`](crate::surface::Surface::mark_dirty)).
    pub fn add_dirty_rect(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }

        // (piece, first stored index still to test)
        let mut pending: SmallVec<[(Rect, usize); 8]> = SmallVec::new();
        let mut survivors: SmallVec<[Rect; 4]> = SmallVec::new();
        let mut removed = false;
        pending.push((rect, 0));

        'pieces: while let Some((piece, start)) = pending.pop() {
            for i in start..self.rects.len() {
                let stored = self.rects[i];
                // Tombstone left by an earlier removal in this call.
                if stored.is_empty() {
                    continue;
                }
                if stored.contains_rect(&piece) {
                    continue 'pieces;
                }
                if piece.contains_rect(&stored) {
                    self.rects[i] = Rect::EMPTY;
                    removed = true;
                    continue;
                }
                if piece.intersects(&stored) {
                    for sub in &piece.subtract(&stored) {
                        pending.push((*sub, i + 1));
                    }
                    continue 'pieces;
                }
            }
            survivors.push(piece);
        }

        if removed {
            self.rects.retain(|r| !r.is_empty());
        }

        if !survivors.is_empty() {
            overtex_core::trace!(
                left = rect.left,
                top = rect.top,
                width = rect.width,
                height = rect.height,
                pieces = survivors.len(),
                "dirty rect accepted"
            );
        }

        self.rects.extend(survivors);
    }

    /// Return the region list and empty the tracker.
    ///
    /// Does not touch the forced-redraw latch.
    pub fn drain(&mut self) -> Vec<Rect> {
        std::mem::take(&mut self.rects)
    }

    /// Empty the region list, keeping its allocation.
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Request that the next frame's encodes report the whole surface.
    pub fn force_full_redraw(&mut self) {
        if self.forced == ForcedRedraw::Idle {
            overtex_core::debug!("full redraw requested");
        }
        // A request made after a latch starts a fresh one.
        self.forced = ForcedRedraw::Pending;
    }

    /// Whether a forced full redraw is pending or latched.
    #[inline]
    pub fn is_full_redraw_forced(&self) -> bool {
        self.forced != ForcedRedraw::Idle
    }

    /// Resolve the forced-redraw latch for an encode at `frame_index`.
    ///
    /// Returns `true` if this encode must report a full redraw.
    pub(crate) fn take_full_redraw(&mut self, frame_index: u64) -> bool {
        match self.forced {
            ForcedRedraw::Idle => false,
            ForcedRedraw::Pending => {
                overtex_core::debug!(frame = frame_index, "full redraw latched");
                self.forced = ForcedRedraw::Latched(frame_index);
                true
            }
            ForcedRedraw::Latched(frame) if frame == frame_index => true,
            ForcedRedraw::Latched(_) => {
                overtex_core::debug!(frame = frame_index, "full redraw expired");
                self.forced = ForcedRedraw::Idle;
                false
            }
        }
    }

    /// Whether a full redraw would be reported at `frame_index`, without
    /// changing the latch.
    pub(crate) fn peek_full_redraw(&self, frame_index: u64) -> bool {
        match self.forced {
            ForcedRedraw::Idle => false,
            ForcedRedraw::Pending => true,
            ForcedRedraw::Latched(frame) => frame == frame_index,
        }
    }

    /// The current region list (unordered).
    #[inline]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Number of rectangles in the region list.
    #[inline]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// `true` when nothing is dirty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Sum of the areas in the region list.
    ///
    /// Equals the dirty area exactly, since the list is non-overlapping.
    pub fn total_area(&self) -> i64 {
        self.rects.iter().map(Rect::area).sum()
    }

    /// Smallest rectangle enclosing every dirty rectangle.
    pub fn bounds(&self) -> Option<Rect> {
        let mut it = self.rects.iter().copied();
        let first = it.next()?;
        Some(it.fold(first, |acc, r| acc.union(&r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_disjoint(rects: &[Rect]) {
        for (i, a) in rects.iter().enumerate() {
            assert!(!a.is_empty(), "empty rect stored: {a:?}");
            for b in &rects[i + 1..] {
                assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn new_tracker_is_empty() {
        let t = DirtyRegionTracker::new();
        assert!(t.is_empty());
        assert_eq!(t.total_area(), 0);
        assert!(t.bounds().is_none());
        assert!(!t.is_full_redraw_forced());
    }

    #[test]
    fn empty_rect_is_ignored() {
        let mut t = DirtyRegionTracker::new();
        t.add_dirty_rect(Rect::new(3, 3, 0, 5));
        t.add_dirty_rect(Rect::new(3, 3, 5, -1));
        assert!(t.is_empty());
    }

    #[test]
    fn adding_same_rect_twice_is_idempotent() {
        let mut t = DirtyRegionTracker::new();
        t.add_dirty_rect(Rect::new(1, 2, 3, 4));
        let once = t.rects().to_vec();
        t.add_dirty_rect(Rect::new(1, 2, 3, 4));
        assert_eq!(t.rects(), once.as_slice());
    }

    #[test]
    fn contained_rect_is_dropped() {
        let mut t = DirtyRegionTracker::new();
        t.add_dirty_rect(Rect::new(0, 0, 10, 10));
        t.add_dirty_rect(Rect::new(2, 2, 3, 3));
        assert_eq!(t.rects(), &[Rect::new(0, 0, 10, 10)]);
    }

    #[test]
    fn covering_rect_replaces_stored() {
        let mut t = DirtyRegionTracker::new();
        t.add_dirty_rect(Rect::new(2, 2, 3, 3));
        t.add_dirty_rect(Rect::new(20, 20, 3, 3));
        t.add_dirty_rect(Rect::new(0, 0, 10, 10));
        assert_eq!(t.len(), 2);
        assert!(t.rects().contains(&Rect::new(0, 0, 10, 10)));
        assert!(t.rects().contains(&Rect::new(20, 20, 3, 3)));
    }

    #[test]
    fn covering_rect_removes_several() {
        let mut t = DirtyRegionTracker::new();
        t.add_dirty_rect(Rect::new(0, 0, 2, 2));
        t.add_dirty_rect(Rect::new(5, 5, 2, 2));
        t.add_dirty_rect(Rect::new(8, 0, 2, 2));
        t.add_dirty_rect(Rect::new(0, 0, 10, 10));
        assert_eq!(t.rects(), &[Rect::new(0, 0, 10, 10)]);
    }

    #[test]
    fn scenario_a_overlapping_squares() {
        let mut t = DirtyRegionTracker::new();
        t.add_dirty_rect(Rect::new(0, 0, 10, 10));
        t.add_dirty_rect(Rect::new(5, 5, 10, 10));
        assert_eq!(t.total_area(), 100 + 100 - 25);
        assert_disjoint(t.rects());
    }

    #[test]
    fn piece_is_further_reduced_by_later_rect() {
        let mut t = DirtyRegionTracker::new();
        t.add_dirty_rect(Rect::new(0, 0, 4, 10));
        t.add_dirty_rect(Rect::new(6, 0, 4, 10));
        // Spans both, with only the middle gap uncovered.
        t.add_dirty_rect(Rect::new(0, 2, 10, 2));
        assert_eq!(t.total_area(), 40 + 40 + 4);
        assert!(t.rects().contains(&Rect::new(4, 2, 2, 2)));
        assert_disjoint(t.rects());
    }

    #[test]
    fn new_rect_both_splits_and_removes() {
        let mut t = DirtyRegionTracker::new();
        t.add_dirty_rect(Rect::new(0, 0, 10, 10)); // partially overlapped
        t.add_dirty_rect(Rect::new(12, 2, 2, 2)); // fully covered by a piece
        t.add_dirty_rect(Rect::new(5, 0, 10, 5));
        assert_eq!(t.total_area(), 100 + 25);
        assert!(!t.rects().contains(&Rect::new(12, 2, 2, 2)));
        assert_disjoint(t.rects());
    }

    #[test]
    fn drain_empties_and_returns() {
        let mut t = DirtyRegionTracker::new();
        t.add_dirty_rect(Rect::new(0, 0, 1, 1));
        t.add_dirty_rect(Rect::new(5, 5, 1, 1));
        let drained = t.drain();
        assert_eq!(drained.len(), 2);
        assert!(t.is_empty());
    }

    #[test]
    fn clear_empties() {
        let mut t = DirtyRegionTracker::new();
        t.add_dirty_rect(Rect::new(0, 0, 1, 1));
        t.clear();
        assert!(t.is_empty());
    }

    #[test]
    fn bounds_encloses_all() {
        let mut t = DirtyRegionTracker::new();
        t.add_dirty_rect(Rect::new(1, 1, 1, 1));
        t.add_dirty_rect(Rect::new(8, 4, 2, 2));
        assert_eq!(t.bounds(), Some(Rect::from_edges(1, 1, 10, 6)));
    }

    #[test]
    fn forced_redraw_latches_per_frame() {
        let mut t = DirtyRegionTracker::new();
        assert!(!t.take_full_redraw(1));

        t.force_full_redraw();
        assert!(t.is_full_redraw_forced());
        assert!(t.peek_full_redraw(7));
        assert!(t.take_full_redraw(7));
        assert!(t.take_full_redraw(7));
        assert!(t.is_full_redraw_forced());
        assert!(!t.peek_full_redraw(8));
        assert!(!t.take_full_redraw(8));
        assert!(!t.is_full_redraw_forced());
        assert!(!t.take_full_redraw(7));
    }

    #[test]
    fn force_after_latch_restarts() {
        let mut t = DirtyRegionTracker::new();
        t.force_full_redraw();
        assert!(t.take_full_redraw(3));
        t.force_full_redraw();
        assert!(t.take_full_redraw(4));
        assert!(t.take_full_redraw(4));
        assert!(!t.take_full_redraw(5));
    }

    // ====== Property tests (proptest) ======

    mod property {
        use super::*;
        use proptest::prelude::*;

        const W: i32 = 48;
        const H: i32 = 48;

        fn rect_strategy() -> impl Strategy<Value = Rect> {
            (0..W, 0..H, 1i32..24, 1i32..24).prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
        }

        fn coverage(rects: &[Rect]) -> Vec<bool> {
            let mut grid = vec![false; (W + 24) as usize * (H + 24) as usize];
            for r in rects {
                for y in r.top..r.bottom() {
                    for x in r.left..r.right() {
                        grid[y as usize * (W + 24) as usize + x as usize] = true;
                    }
                }
            }
            grid
        }

        proptest! {
            #[test]
            fn coverage_matches_inputs(rects in proptest::collection::vec(rect_strategy(), 1..24)) {
                let mut t = DirtyRegionTracker::new();
                for r in &rects {
                    t.add_dirty_rect(*r);
                }
                prop_assert_eq!(coverage(t.rects()), coverage(&rects));
            }

            #[test]
            fn stored_rects_are_disjoint_and_non_nested(
                rects in proptest::collection::vec(rect_strategy(), 1..24),
            ) {
                let mut t = DirtyRegionTracker::new();
                for r in &rects {
                    t.add_dirty_rect(*r);
                }
                let stored = t.rects();
                for (i, a) in stored.iter().enumerate() {
                    prop_assert!(!a.is_empty());
                    for (j, b) in stored.iter().enumerate() {
                        if i == j {
                            continue;
                        }
                        prop_assert!(!a.contains_rect(b), "{:?} contains {:?}", a, b);
                        prop_assert!(!a.intersects(b), "{:?} overlaps {:?}", a, b);
                    }
                }
            }

            #[test]
            fn area_sum_equals_covered_pixels(
                rects in proptest::collection::vec(rect_strategy(), 1..24),
            ) {
                let mut t = DirtyRegionTracker::new();
                for r in &rects {
                    t.add_dirty_rect(*r);
                }
                let covered = coverage(&rects).iter().filter(|&&c| c).count() as i64;
                prop_assert_eq!(t.total_area(), covered);
            }

            #[test]
            fn re_adding_any_input_keeps_coverage(
                rects in proptest::collection::vec(rect_strategy(), 1..16),
                pick in any::<prop::sample::Index>(),
            ) {
                let mut t = DirtyRegionTracker::new();
                for r in &rects {
                    t.add_dirty_rect(*r);
                }
                let area = t.total_area();
                let before = coverage(t.rects());
                // The list may be regrouped, never grown.
                t.add_dirty_rect(*pick.get(&rects));
                prop_assert_eq!(coverage(t.rects()), before);
                prop_assert_eq!(t.total_area(), area);
            }
        }
    }
}
