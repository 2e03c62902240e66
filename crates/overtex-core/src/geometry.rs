#![forbid(unsafe_code)]

//! Geometric primitives.

/// An axis-aligned integer rectangle for clip regions, dirty regions, and
/// blit targets.
///
/// Uses surface pixel coordinates (origin at top-left). Right and bottom
/// edges are exclusive. A rectangle with `width <= 0` or `height <= 0` is
/// empty and never stored in a region list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// Left edge (inclusive).
    pub left: i32,
    /// Top edge (inclusive).
    pub top: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    /// The canonical empty rectangle.
    pub const EMPTY: Self = Self::new(0, 0, 0, 0);

    /// Create a new rectangle.
    #[inline]
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Create a rectangle from its edges (`right`/`bottom` exclusive).
    #[inline]
    pub const fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(
            left,
            top,
            right.saturating_sub(left),
            bottom.saturating_sub(top),
        )
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.left.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.top.saturating_add(self.height)
    }

    /// Area in pixels. Empty rectangles have zero area.
    #[inline]
    pub const fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width as i64 * self.height as i64
        }
    }

    /// Check if the rectangle has zero (or negative) area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    /// Check if `other` lies entirely inside this rectangle.
    ///
    /// An empty `other` is never considered contained.
    #[inline]
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && other.left >= self.left
            && other.top >= self.top
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Check whether the two rectangles share at least one pixel.
    #[inline]
    pub const fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.left < other.right()
            && other.left < self.right()
            && self.top < other.bottom()
            && other.top < self.bottom()
    }

    /// Compute the intersection with another rectangle.
    ///
    /// Returns [`Rect::EMPTY`] if the rectangles don't overlap.
    #[inline]
    pub fn intersection(&self, other: &Rect) -> Rect {
        self.intersection_opt(other).unwrap_or_default()
    }

    /// Compute the intersection with another rectangle, returning `None` if no overlap.
    #[inline]
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::from_edges(left, top, right, bottom))
    }

    /// Smallest rectangle that contains both.
    ///
    /// Empty operands are ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rect::from_edges(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Translate the rectangle by `(dx, dy)`.
    #[inline]
    pub const fn offset(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.left.saturating_add(dx),
            self.top.saturating_add(dy),
            self.width,
            self.height,
        )
    }

    /// The parts of `self` that lie outside `hole`.
    ///
    /// Produces at most four pairwise-disjoint pieces whose union is exactly
    /// `self \ hole`:
    ///
    /// ```text
    /// +---------------------+
    /// |        above        |
    /// +------+-------+------+
    /// | left | hole  | right|
    /// +------+-------+------+
    /// |        below        |
    /// +---------------------+
    /// ```
    ///
    /// The side bands span only the rows shared with `hole`. If the two
    /// rectangles don't overlap the result is `self` unchanged; if `hole`
    /// covers `self` the result is empty.
    pub fn subtract(&self, hole: &Rect) -> RectPieces {
        let mut out = RectPieces::default();
        if self.is_empty() {
            return out;
        }
        let Some(overlap) = self.intersection_opt(hole) else {
            out.push(*self);
            return out;
        };

        // Case table: one piece per edge of `self` that sticks out of `hole`.
        if overlap.top > self.top {
            out.push(Rect::from_edges(
                self.left,
                self.top,
                self.right(),
                overlap.top,
            ));
        }
        if overlap.bottom() < self.bottom() {
            out.push(Rect::from_edges(
                self.left,
                overlap.bottom(),
                self.right(),
                self.bottom(),
            ));
        }
        if overlap.left > self.left {
            out.push(Rect::from_edges(
                self.left,
                overlap.top,
                overlap.left,
                overlap.bottom(),
            ));
        }
        if overlap.right() < self.right() {
            out.push(Rect::from_edges(
                overlap.right(),
                overlap.top,
                self.right(),
                overlap.bottom(),
            ));
        }
        out
    }
}

/// Fixed-capacity result of [`Rect::subtract`] (at most four pieces).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RectPieces {
    pieces: [Rect; 4],
    len: u8,
}

impl RectPieces {
    #[inline]
    fn push(&mut self, rect: Rect) {
        debug_assert!((self.len as usize) < self.pieces.len(), "at most 4 pieces");
        debug_assert!(!rect.is_empty(), "pieces are never empty");
        self.pieces[self.len as usize] = rect;
        self.len += 1;
    }

    /// Number of pieces.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// `true` when the subtraction left nothing.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The pieces as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[Rect] {
        &self.pieces[..self.len as usize]
    }

    /// Iterate over the pieces.
    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, Rect> {
        self.as_slice().iter()
    }
}

impl<'a> IntoIterator for &'a RectPieces {
    type Item = &'a Rect;
    type IntoIter = core::slice::Iter<'a, Rect>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<(i32, i32, i32, i32)> for Rect {
    fn from((left, top, width, height): (i32, i32, i32, i32)) -> Self {
        Self::new(left, top, width, height)
    }
}
