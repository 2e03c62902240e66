#![forbid(unsafe_code)]

//! Dirty-rectangle wire format.
//!
//! ```text
//! offset  size  field
//! 0       2     count: i16
//! 2+8k    2     left:   i16   \
//! 4+8k    2     top:    i16    | rect k, for k in 0..count
//! 6+8k    2     width:  i16    |
//! 8+8k    2     height: i16   /
//! ```
//!
//! While a forced full redraw is in effect the buffer holds exactly one
//! rect, `(0, 0, used_width, used_height)`.
//!
//! If the buffer cannot hold every pending rect, only a zero count is
//! written and the encoder returns the negated number of rects. Nothing
//! else in the buffer is touched, so the consumer never sees a partial
//! list. What happens to the pending rects then depends on the
//! [`OverflowPolicy`].

use overtex_core::config::OverflowPolicy;
use overtex_core::geometry::Rect;

use super::{get_i16, put_i16, wire_i16};
use crate::dirty::DirtyRegionTracker;
use crate::error::ProtocolError;
use crate::surface::Surface;

/// Size of the count header in bytes.
pub const DIRTY_HEADER_LEN: usize = 2;

/// Size of one encoded rect in bytes.
pub const DIRTY_RECT_LEN: usize = 8;

/// Buffer size needed for `max_rects` rects.
#[inline]
pub const fn dirty_buffer_len(max_rects: usize) -> usize {
    DIRTY_HEADER_LEN + max_rects * DIRTY_RECT_LEN
}

/// Drains a surface's dirty regions into the wire format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyRectEncoder {
    policy: OverflowPolicy,
}

impl DirtyRectEncoder {
    pub const fn new(policy: OverflowPolicy) -> Self {
        Self { policy }
    }

    #[inline]
    pub const fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Encode the dirty regions of `surface` for frame `frame_index`.
    ///
    /// Returns the number of rects written, or the negated number of
    /// pending rects if `buf` is too small.
    pub fn encode(&self, frame_index: u64, surface: &mut Surface, buf: &mut [u8]) -> i32 {
        let (width, height) = (surface.width(), surface.height());
        self.encode_tracker(frame_index, surface.dirty_mut(), width, height, buf)
    }

    /// Encode a tracker directly. `used_width` and `used_height` size the
    /// full-redraw rect.
    pub fn encode_tracker(
        &self,
        frame_index: u64,
        tracker: &mut DirtyRegionTracker,
        used_width: i32,
        used_height: i32,
        buf: &mut [u8],
    ) -> i32 {
        let _span = overtex_core::debug_span!(
            "dirty_encode",
            frame = frame_index,
            rects = tracker.len()
        );
        let _guard = _span.enter();

        if tracker.take_full_redraw(frame_index) {
            let full = [Rect::from_size(used_width, used_height)];
            return match write_rects(&full, buf) {
                Some(count) => {
                    tracker.clear();
                    count
                }
                None => self.overflow(tracker, 1, buf),
            };
        }

        let count = tracker.len();
        match write_rects(tracker.rects(), buf) {
            Some(written) => {
                tracker.clear();
                written
            }
            None => self.overflow(tracker, count, buf),
        }
    }

    fn overflow(&self, tracker: &mut DirtyRegionTracker, pending: usize, buf: &mut [u8]) -> i32 {
        if buf.len() >= DIRTY_HEADER_LEN {
            put_i16(buf, 0, 0);
        }

        overtex_core::warn!(
            pending,
            needed = dirty_buffer_len(pending),
            available = buf.len(),
            policy = ?self.policy,
            "dirty rect buffer overflow"
        );

        if self.policy == OverflowPolicy::Discard {
            tracker.clear();
        }
        -i32::try_from(pending).unwrap_or(i32::MAX)
    }
}

/// Write a full record, or nothing at all if it doesn't fit.
fn write_rects(rects: &[Rect], buf: &mut [u8]) -> Option<i32> {
    let count = i16::try_from(rects.len()).ok()?;
    if buf.len() < dirty_buffer_len(rects.len()) {
        return None;
    }
    put_i16(buf, 0, count);
    for (k, r) in rects.iter().enumerate() {
        let at = DIRTY_HEADER_LEN + k * DIRTY_RECT_LEN;
        put_i16(buf, at, wire_i16(r.left));
        put_i16(buf, at + 2, wire_i16(r.top));
        put_i16(buf, at + 4, wire_i16(r.width));
        put_i16(buf, at + 6, wire_i16(r.height));
    }
    Some(i32::from(count))
}

/// Read back a buffer written by [`DirtyRectEncoder`].
///
/// A zero count (including the overflow header) yields an empty list.
pub fn decode_dirty_rects(buf: &[u8]) -> Result<Vec<Rect>, ProtocolError> {
    if buf.len() < DIRTY_HEADER_LEN {
        return Err(ProtocolError::Truncated {
            needed: DIRTY_HEADER_LEN,
            available: buf.len(),
        });
    }
    let count = get_i16(buf, 0).max(0) as usize;
    let needed = dirty_buffer_len(count);
    if buf.len() < needed {
        return Err(ProtocolError::Truncated {
            needed,
            available: buf.len(),
        });
    }
    Ok((0..count)
        .map(|k| {
            let at = DIRTY_HEADER_LEN + k * DIRTY_RECT_LEN;
            Rect::new(
                get_i16(buf, at).into(),
                get_i16(buf, at + 2).into(),
                get_i16(buf, at + 4).into(),
                get_i16(buf, at + 6).into(),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_with(rects: &[Rect]) -> DirtyRegionTracker {
        let mut t = DirtyRegionTracker::new();
        for r in rects {
            t.add_dirty_rect(*r);
        }
        t
    }

    #[test]
    fn empty_tracker_writes_zero_count() {
        let enc = DirtyRectEncoder::default();
        let mut t = DirtyRegionTracker::new();
        let mut buf = [0xAAu8; 10];
        assert_eq!(enc.encode_tracker(1, &mut t, 10, 10, &mut buf), 0);
        assert_eq!(decode_dirty_rects(&buf), Ok(vec![]));
        // Only the header is written.
        assert_eq!(&buf[2..], &[0xAA; 8]);
    }

    #[test]
    fn writes_rects_in_native_order() {
        let enc = DirtyRectEncoder::default();
        let mut t = tracker_with(&[Rect::new(1, 2, 3, 4)]);
        let mut buf = [0u8; 10];
        assert_eq!(enc.encode_tracker(1, &mut t, 10, 10, &mut buf), 1);
        assert_eq!(&buf[0..2], &1i16.to_ne_bytes());
        assert_eq!(&buf[2..4], &1i16.to_ne_bytes());
        assert_eq!(&buf[4..6], &2i16.to_ne_bytes());
        assert_eq!(&buf[6..8], &3i16.to_ne_bytes());
        assert_eq!(&buf[8..10], &4i16.to_ne_bytes());
        assert!(t.is_empty());
    }

    #[test]
    fn exact_fit_succeeds() {
        let enc = DirtyRectEncoder::default();
        let rects = [Rect::new(0, 0, 1, 1), Rect::new(5, 5, 1, 1)];
        let mut t = tracker_with(&rects);
        let mut buf = vec![0u8; dirty_buffer_len(2)];
        assert_eq!(enc.encode_tracker(1, &mut t, 10, 10, &mut buf), 2);
        assert_eq!(decode_dirty_rects(&buf).expect("decode"), rects.to_vec());
    }

    #[test]
    fn overflow_discard_empties_tracker() {
        let enc = DirtyRectEncoder::new(OverflowPolicy::Discard);
        let mut t = tracker_with(&[
            Rect::new(0, 0, 1, 1),
            Rect::new(5, 5, 1, 1),
            Rect::new(9, 9, 1, 1),
        ]);
        let mut buf = [0xFFu8; 10];
        assert_eq!(enc.encode_tracker(1, &mut t, 10, 10, &mut buf), -3);
        assert_eq!(&buf[0..2], &[0, 0]);
        assert_eq!(&buf[2..], &[0xFF; 8]);
        assert!(t.is_empty());
    }

    #[test]
    fn overflow_retain_keeps_rects() {
        let enc = DirtyRectEncoder::new(OverflowPolicy::Retain);
        let mut t = tracker_with(&[Rect::new(0, 0, 1, 1), Rect::new(5, 5, 1, 1)]);
        let mut small = [0u8; 10];
        assert_eq!(enc.encode_tracker(1, &mut t, 10, 10, &mut small), -2);
        assert_eq!(t.len(), 2);

        let mut big = [0u8; 18];
        assert_eq!(enc.encode_tracker(2, &mut t, 10, 10, &mut big), 2);
        assert!(t.is_empty());
    }

    #[test]
    fn buffer_without_room_for_header() {
        let enc = DirtyRectEncoder::default();
        let mut t = tracker_with(&[Rect::new(0, 0, 1, 1)]);
        let mut buf = [7u8; 1];
        assert_eq!(enc.encode_tracker(1, &mut t, 10, 10, &mut buf), -1);
        assert_eq!(buf, [7]);
    }

    #[test]
    fn full_redraw_reports_used_bounds() {
        let enc = DirtyRectEncoder::default();
        let mut t = tracker_with(&[Rect::new(1, 1, 1, 1)]);
        t.force_full_redraw();
        let mut buf = [0u8; 26];
        assert_eq!(enc.encode_tracker(3, &mut t, 100, 60, &mut buf), 1);
        assert_eq!(
            decode_dirty_rects(&buf).expect("decode"),
            vec![Rect::new(0, 0, 100, 60)]
        );
        assert!(t.is_empty());
    }

    #[test]
    fn full_redraw_overflow() {
        let enc = DirtyRectEncoder::default();
        let mut t = DirtyRegionTracker::new();
        t.force_full_redraw();
        let mut buf = [0xFFu8; 4];
        assert_eq!(enc.encode_tracker(3, &mut t, 100, 60, &mut buf), -1);
        assert_eq!(&buf[0..2], &[0, 0]);
    }

    #[test]
    fn decode_rejects_truncated() {
        let mut buf = [0u8; 6];
        buf[0..2].copy_from_slice(&1i16.to_ne_bytes());
        assert_eq!(
            decode_dirty_rects(&buf),
            Err(ProtocolError::Truncated {
                needed: 10,
                available: 6
            })
        );
        assert!(decode_dirty_rects(&[0u8]).is_err());
    }

    // ====== Property tests (proptest) ======

    mod property {
        use super::*;
        use proptest::prelude::*;

        fn rect_strategy() -> impl Strategy<Value = Rect> {
            (0i32..500, 0i32..500, 1i32..200, 1i32..200)
                .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
        }

        proptest! {
            #[test]
            fn encode_decode_roundtrip(rects in proptest::collection::vec(rect_strategy(), 0..32)) {
                let mut t = tracker_with(&rects);
                let expected = t.rects().to_vec();
                let mut buf = vec![0u8; dirty_buffer_len(expected.len())];
                let n = DirtyRectEncoder::default().encode_tracker(1, &mut t, 700, 700, &mut buf);
                prop_assert_eq!(n as usize, expected.len());
                prop_assert_eq!(decode_dirty_rects(&buf).expect("decode"), expected);
            }

            #[test]
            fn short_buffer_never_partially_written(
                rects in proptest::collection::vec(rect_strategy(), 1..16),
                shortfall in 1usize..8,
            ) {
                let mut t = tracker_with(&rects);
                let pending = t.len();
                let len = dirty_buffer_len(pending) - shortfall;
                let mut buf = vec![0x5Au8; len];
                let n = DirtyRectEncoder::default().encode_tracker(1, &mut t, 700, 700, &mut buf);
                prop_assert_eq!(n, -(pending as i32));
                prop_assert_eq!(&buf[0..2], &[0u8, 0][..]);
                prop_assert!(buf[2..].iter().all(|&b| b == 0x5A));
            }
        }
    }
}
