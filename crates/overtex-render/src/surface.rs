#![forbid(unsafe_code)]

//! Off-screen raster surfaces.
//!
//! A [`Surface`] owns a pixel buffer with a fixed *physical* size (rounded up
//! to a power of two so the host can mirror it in a texture) and a *used*
//! size that can change through [`Surface::resize`] without reallocating.
//!
//! # Clipping
//!
//! Every write is limited to the effective clip rect, which is the user clip
//! intersected with the physical bounds. The user clip is saved and restored
//! by [`push_clip`](Surface::push_clip) / [`pop_clip`](Surface::pop_clip)
//! over a stack of at most [`MAX_CLIP_DEPTH`] entries. Overflowing the stack
//! is a programming error and panics.
//!
//! # Dirty tracking
//!
//! Every operation that changes pixels reports the region it touched to the
//! surface's [`DirtyRegionTracker`], clamped to the clip. Inside
//! [`draw_batched`](Surface::draw_batched) that reporting is suppressed and a
//! single outer region is reported instead.
//!
//! # Orientation
//!
//! With `bottom_up` set, logical row `y` is stored at physical row
//! `physical_height - 1 - y`. All coordinates in the API, dirty rects
//! included, stay logical.

use std::fmt;

use overtex_core::config::EngineConfig;
use overtex_core::geometry::Rect;
use overtex_core::pixel::{ChannelOrder, PixelFormat};
use smallvec::SmallVec;

use crate::color::PackedRgba;
use crate::compositor::{CompositeMode, Compositor};
use crate::dirty::DirtyRegionTracker;
use crate::error::RenderError;

/// Maximum depth of the clip stack.
pub const MAX_CLIP_DEPTH: usize = 32;

/// Largest physical dimension. Wire coordinates are `i16`, so this is the
/// largest power of two not exceeding `i16::MAX`.
pub const MAX_PHYSICAL_DIMENSION: i32 = 1 << 14;

/// Parameters for [`Surface::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceConfig {
    /// Used width in pixels.
    pub width: i32,
    /// Used height in pixels.
    pub height: i32,
    /// Minimum physical size, for headroom when the surface will grow.
    pub min_physical: Option<(i32, i32)>,
    /// Channel permutation shared with the consumer.
    pub channel_order: ChannelOrder,
    /// 3- or 4-byte pixels.
    pub pixel_format: PixelFormat,
    /// Store rows bottom-up.
    pub bottom_up: bool,
}

impl SurfaceConfig {
    /// A 4-byte RGBA, top-down surface of the given used size.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            min_physical: None,
            channel_order: ChannelOrder::RGBA,
            pixel_format: PixelFormat::Rgba,
            bottom_up: false,
        }
    }

    /// Take pixel layout settings from an engine config.
    pub fn from_engine(engine: &EngineConfig, width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            min_physical: None,
            channel_order: engine.channel_order,
            pixel_format: engine.pixel_format,
            bottom_up: engine.bottom_up,
        }
    }

    /// Reserve at least this physical size.
    #[must_use]
    pub fn with_min_physical_size(mut self, width: i32, height: i32) -> Self {
        self.min_physical = Some((width, height));
        self
    }

    #[must_use]
    pub fn with_channel_order(mut self, order: ChannelOrder) -> Self {
        self.channel_order = order;
        self
    }

    #[must_use]
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    #[must_use]
    pub fn with_bottom_up(mut self, bottom_up: bool) -> Self {
        self.bottom_up = bottom_up;
        self
    }

    /// Physical size the surface will allocate.
    pub fn physical_size(&self) -> (i32, i32) {
        let (min_w, min_h) = self.min_physical.unwrap_or((0, 0));
        (
            next_power_of_two(self.width.max(min_w)),
            next_power_of_two(self.height.max(min_h)),
        )
    }
}

fn next_power_of_two(n: i32) -> i32 {
    if n <= 1 {
        return 1;
    }
    (n as u32)
        .checked_next_power_of_two()
        .and_then(|p| i32::try_from(p).ok())
        .unwrap_or(i32::MAX)
}

/// A borrowed external pixel rectangle.
///
/// Uses the channel order of whichever surface it is drawn into.
#[derive(Debug, Clone, Copy)]
pub struct Bitmap<'a> {
    data: &'a [u8],
    width: i32,
    height: i32,
    stride: usize,
    format: PixelFormat,
}

impl<'a> Bitmap<'a> {
    /// Wrap tightly packed rows.
    pub fn new(
        data: &'a [u8],
        width: i32,
        height: i32,
        format: PixelFormat,
    ) -> Result<Self, RenderError> {
        let stride = width.max(0) as usize * format.bytes_per_pixel();
        Self::with_stride(data, width, height, stride, format)
    }

    /// Wrap rows that are `stride` bytes apart.
    pub fn with_stride(
        data: &'a [u8],
        width: i32,
        height: i32,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Self, RenderError> {
        if width <= 0 || height <= 0 {
            return Err(RenderError::InvalidSize { width, height });
        }
        let row_bytes = width as usize * format.bytes_per_pixel();
        if stride < row_bytes {
            return Err(RenderError::BitmapTooSmall {
                needed: row_bytes,
                available: stride,
            });
        }
        // A stride so large the extent overflows can never be backed by `data`.
        let needed = stride
            .checked_mul(height as usize - 1)
            .and_then(|n| n.checked_add(row_bytes))
            .unwrap_or(usize::MAX);
        if data.len() < needed {
            return Err(RenderError::BitmapTooSmall {
                needed,
                available: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
            format,
        })
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Pixel bytes of row `y`. Callers keep `y` in `0..height`.
    #[inline]
    pub(crate) fn row(&self, y: i32) -> &'a [u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * self.format.bytes_per_pixel()]
    }
}

/// What [`Surface::clear`] paints with.
#[derive(Debug, Clone, Copy)]
pub enum ClearSource<'a> {
    /// A solid color.
    Color(PackedRgba),
    /// The used area of another surface, tiled.
    Surface(&'a Surface),
    /// An external bitmap, tiled.
    Bitmap(Bitmap<'a>),
}

/// An off-screen raster with clipping and dirty-region tracking.
#[derive(Clone)]
pub struct Surface {
    physical_width: i32,
    physical_height: i32,
    width: i32,
    height: i32,
    format: PixelFormat,
    compositor: Compositor,
    bottom_up: bool,
    data: Vec<u8>,
    user_clip: Rect,
    clip: Rect,
    clip_stack: SmallVec<[Rect; 8]>,
    dirty: DirtyRegionTracker,
    batch_depth: u32,
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("physical", &(self.physical_width, self.physical_height))
            .field("used", &(self.width, self.height))
            .field("format", &self.format)
            .field("order", &self.compositor.order())
            .field("bottom_up", &self.bottom_up)
            .field("clip", &self.clip)
            .field("clip_depth", &self.clip_stack.len())
            .field("dirty", &self.dirty.len())
            .finish_non_exhaustive()
    }
}

impl Surface {
    /// Allocate a surface. Pixels start fully transparent (all zero bytes).
    pub fn new(config: SurfaceConfig) -> Result<Self, RenderError> {
        if config.width <= 0 || config.height <= 0 {
            return Err(RenderError::InvalidSize {
                width: config.width,
                height: config.height,
            });
        }
        let (physical_width, physical_height) = config.physical_size();
        if physical_width > MAX_PHYSICAL_DIMENSION || physical_height > MAX_PHYSICAL_DIMENSION {
            return Err(RenderError::SurfaceTooLarge {
                width: physical_width,
                height: physical_height,
            });
        }

        let len = physical_width as usize
            * physical_height as usize
            * config.pixel_format.bytes_per_pixel();
        let bounds = Rect::from_size(config.width, config.height);

        overtex_core::debug!(
            width = config.width,
            height = config.height,
            physical_width,
            physical_height,
            bytes = len,
            "surface allocated"
        );

        Ok(Self {
            physical_width,
            physical_height,
            width: config.width,
            height: config.height,
            format: config.pixel_format,
            compositor: Compositor::new(config.channel_order),
            bottom_up: config.bottom_up,
            data: vec![0; len],
            user_clip: bounds,
            clip: bounds,
            clip_stack: SmallVec::new(),
            dirty: DirtyRegionTracker::new(),
            batch_depth: 0,
        })
    }

    // ----- Dimensions -----

    /// Used width.
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Used height.
    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn physical_width(&self) -> i32 {
        self.physical_width
    }

    #[inline]
    pub fn physical_height(&self) -> i32 {
        self.physical_height
    }

    /// `(0, 0, width, height)`.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// `(0, 0, physical_width, physical_height)`.
    #[inline]
    pub fn physical_bounds(&self) -> Rect {
        Rect::from_size(self.physical_width, self.physical_height)
    }

    #[inline]
    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    pub fn channel_order(&self) -> ChannelOrder {
        self.compositor.order()
    }

    #[inline]
    pub fn compositor(&self) -> Compositor {
        self.compositor
    }

    /// Whether rows are stored bottom-up.
    #[inline]
    pub fn is_bottom_up(&self) -> bool {
        self.bottom_up
    }

    /// Bytes between the starts of two physical rows.
    #[inline]
    pub fn stride(&self) -> usize {
        self.physical_width as usize * self.format.bytes_per_pixel()
    }

    /// The whole physical pixel buffer, in storage order.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Change the used size within the physical allocation.
    ///
    /// Resets the user clip to the new bounds, drops the clip stack, and
    /// forces a full redraw.
    pub fn resize(&mut self, width: i32, height: i32) -> Result<(), RenderError> {
        if width <= 0 || height <= 0 {
            return Err(RenderError::InvalidSize { width, height });
        }
        if width > self.physical_width || height > self.physical_height {
            return Err(RenderError::SizeExceedsPhysical {
                width,
                height,
                physical_width: self.physical_width,
                physical_height: self.physical_height,
            });
        }

        overtex_core::debug!(
            from_width = self.width,
            from_height = self.height,
            width,
            height,
            "surface resized"
        );

        self.width = width;
        self.height = height;
        self.clip_stack.clear();
        self.user_clip = self.bounds();
        self.update_clip();
        self.dirty.clear();
        self.dirty.force_full_redraw();
        Ok(())
    }

    // ----- Pixel access -----

    #[inline]
    fn row_offset(&self, y: i32) -> usize {
        let row = if self.bottom_up {
            self.physical_height - 1 - y
        } else {
            y
        };
        row as usize * self.stride()
    }

    #[inline]
    fn run_range(&self, x: i32, y: i32, count: usize) -> std::ops::Range<usize> {
        let bpp = self.format.bytes_per_pixel();
        let start = self.row_offset(y) + x as usize * bpp;
        start..start + count * bpp
    }

    #[inline]
    fn run_in_bounds(&self, x: i32, y: i32, count: usize) -> bool {
        x >= 0
            && y >= 0
            && y < self.physical_height
            && (x as i64 + count as i64) <= self.physical_width as i64
    }

    /// Read one pixel. `None` outside the physical bounds.
    pub fn pixel(&self, x: i32, y: i32) -> Option<PackedRgba> {
        if !self.physical_bounds().contains(x, y) {
            return None;
        }
        let range = self.run_range(x, y, 1);
        Some(PackedRgba::read_from(
            &self.data[range],
            self.format,
            self.channel_order(),
        ))
    }

    /// Combine one pixel into the surface. No-op outside the clip.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: PackedRgba, mode: CompositeMode) {
        if !self.clip.contains(x, y) {
            return;
        }
        let range = self.run_range(x, y, 1);
        self.compositor
            .fill(color, &mut self.data[range], self.format, 1, mode);
        self.note_dirty(Rect::new(x, y, 1, 1));
    }

    /// Raw bytes of `count` pixels starting at `(x, y)`.
    ///
    /// `None` if the run leaves the physical bounds.
    pub fn row(&self, x: i32, y: i32, count: usize) -> Option<&[u8]> {
        if !self.run_in_bounds(x, y, count) {
            return None;
        }
        Some(&self.data[self.run_range(x, y, count)])
    }

    /// The used width of logical row `y`.
    fn used_row(&self, y: i32) -> &[u8] {
        &self.data[self.run_range(0, y, self.width as usize)]
    }

    /// Combine a row of source pixels into the surface starting at `(x, y)`.
    ///
    /// The run is clipped; returns the part actually written.
    pub fn set_row(
        &mut self,
        x: i32,
        y: i32,
        src: &[u8],
        src_format: PixelFormat,
        mode: CompositeMode,
    ) -> Option<Rect> {
        let sbpp = src_format.bytes_per_pixel();
        let count = i32::try_from(src.len() / sbpp).unwrap_or(i32::MAX);
        let written = Rect::new(x, y, count, 1).intersection_opt(&self.clip)?;

        let skip = (written.left - x) as usize;
        let n = written.width as usize;
        let from = &src[skip * sbpp..(skip + n) * sbpp];
        let range = self.run_range(written.left, y, n);
        self.compositor
            .combine(from, src_format, &mut self.data[range], self.format, n, mode);
        self.note_dirty(written);
        Some(written)
    }

    // ----- Clear / fill / copy -----

    /// Paint `target` from `source`, tiling surfaces and bitmaps that are
    /// smaller than the target.
    ///
    /// Everything is clamped to the clip. Returns the painted region, or
    /// `None` if nothing was inside the clip. With `mark_dirty` unset the
    /// region is returned but not reported to the tracker.
    pub fn clear(
        &mut self,
        source: ClearSource<'_>,
        target: Rect,
        mode: CompositeMode,
        mark_dirty: bool,
    ) -> Result<Option<Rect>, RenderError> {
        if let ClearSource::Surface(src) = source
            && src.channel_order() != self.channel_order()
        {
            return Err(RenderError::FormatMismatch);
        }
        Ok(self.paint(source, target, mode, mark_dirty))
    }

    /// Fill `rect` with a solid color.
    pub fn fill_rect(&mut self, rect: Rect, color: PackedRgba, mode: CompositeMode) -> Option<Rect> {
        self.paint(ClearSource::Color(color), rect, mode, true)
    }

    /// Draw `bitmap` into `target`, tiling when the target is larger.
    pub fn blit_bitmap(
        &mut self,
        bitmap: Bitmap<'_>,
        target: Rect,
        mode: CompositeMode,
    ) -> Option<Rect> {
        self.paint(ClearSource::Bitmap(bitmap), target, mode, true)
    }

    fn paint(
        &mut self,
        source: ClearSource<'_>,
        target: Rect,
        mode: CompositeMode,
        mark_dirty: bool,
    ) -> Option<Rect> {
        let region = target.intersection_opt(&self.clip)?;

        match source {
            ClearSource::Color(color) => {
                let n = region.width as usize;
                for y in region.top..region.bottom() {
                    let range = self.run_range(region.left, y, n);
                    self.compositor
                        .fill(color, &mut self.data[range], self.format, n, mode);
                }
            }
            ClearSource::Surface(src) => {
                self.tile(region, target, src.width, src.height, src.format, mode, move |sy| {
                    src.used_row(sy)
                });
            }
            ClearSource::Bitmap(bitmap) => {
                self.tile(
                    region,
                    target,
                    bitmap.width,
                    bitmap.height,
                    bitmap.format,
                    mode,
                    move |sy| bitmap.row(sy),
                );
            }
        }

        if mark_dirty {
            self.note_dirty(region);
        }
        Some(region)
    }

    /// Repeat a `src_width` x `src_height` source anchored at `origin`'s
    /// top-left over `region`.
    #[allow(clippy::too_many_arguments)]
    fn tile<'s>(
        &mut self,
        region: Rect,
        origin: Rect,
        src_width: i32,
        src_height: i32,
        src_format: PixelFormat,
        mode: CompositeMode,
        src_row: impl Fn(i32) -> &'s [u8],
    ) {
        let sbpp = src_format.bytes_per_pixel();
        for y in region.top..region.bottom() {
            let row = src_row((y - origin.top).rem_euclid(src_height));
            let mut x = region.left;
            while x < region.right() {
                let sx = (x - origin.left).rem_euclid(src_width);
                let run = (src_width - sx).min(region.right() - x);
                let from = &row[sx as usize * sbpp..(sx + run) as usize * sbpp];
                let range = self.run_range(x, y, run as usize);
                self.compositor.combine(
                    from,
                    src_format,
                    &mut self.data[range],
                    self.format,
                    run as usize,
                    mode,
                );
                x += run;
            }
        }
    }

    // ----- Clipping -----

    /// Effective clip: the user clip intersected with the physical bounds.
    #[inline]
    pub fn clip_rect(&self) -> Rect {
        self.clip
    }

    /// The clip as last set by the caller, before intersecting with the
    /// physical bounds.
    #[inline]
    pub fn user_clip_rect(&self) -> Rect {
        self.user_clip
    }

    /// Number of saved clips.
    #[inline]
    pub fn clip_depth(&self) -> usize {
        self.clip_stack.len()
    }

    /// Replace the user clip. Does not touch the stack.
    pub fn set_clip_rect(&mut self, rect: Rect) {
        self.user_clip = rect;
        self.update_clip();
    }

    /// Save the current clip and install `rect`, optionally intersected
    /// with the current clip.
    ///
    /// # Panics
    ///
    /// Panics if [`MAX_CLIP_DEPTH`] clips are already saved.
    pub fn push_clip(&mut self, rect: Rect, intersect_with_current: bool) {
        assert!(
            self.clip_stack.len() < MAX_CLIP_DEPTH,
            "clip stack overflow (max depth {MAX_CLIP_DEPTH})"
        );
        self.clip_stack.push(self.user_clip);
        self.user_clip = if intersect_with_current {
            self.user_clip.intersection(&rect)
        } else {
            rect
        };
        self.update_clip();
    }

    /// Restore the clip saved by the matching [`push_clip`](Self::push_clip).
    ///
    /// Does nothing if the stack is empty.
    pub fn pop_clip(&mut self) {
        match self.clip_stack.pop() {
            Some(previous) => {
                self.user_clip = previous;
                self.update_clip();
            }
            None => {
                overtex_core::warn!("pop_clip on empty clip stack");
            }
        }
    }

    fn update_clip(&mut self) {
        self.clip = self.user_clip.intersection(&self.physical_bounds());
    }

    // ----- Dirty tracking -----

    /// Report `rect` as changed.
    ///
    /// The rect is clamped to the clip first. A clamped result with no area
    /// is ignored and returns `Ok(None)`; a negative width or height is a
    /// caller bug and fails. Inside [`draw_batched`](Self::draw_batched) the
    /// rect is validated and clamped but not recorded.
    pub fn mark_dirty(&mut self, rect: Rect) -> Result<Option<Rect>, RenderError> {
        if rect.width < 0 || rect.height < 0 {
            return Err(RenderError::InvalidRegion { rect });
        }
        let Some(clamped) = rect.intersection_opt(&self.clip) else {
            return Ok(None);
        };
        if self.batch_depth == 0 {
            self.dirty.add_dirty_rect(clamped);
        }
        Ok(Some(clamped))
    }

    fn note_dirty(&mut self, rect: Rect) {
        if self.batch_depth > 0 {
            return;
        }
        if let Some(clamped) = rect.intersection_opt(&self.clip) {
            self.dirty.add_dirty_rect(clamped);
        }
    }

    /// Run several draw operations and report only `region` as dirty.
    ///
    /// Dirty reporting from inside `draw` is suppressed. `region` is
    /// reported (clamped to the clip in effect afterwards) only if `draw`
    /// returns `Ok`, so a failed draw leaves the dirty state as it was.
    pub fn draw_batched<T, E>(
        &mut self,
        region: Rect,
        draw: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        self.batch_depth += 1;
        let result = draw(self);
        self.batch_depth -= 1;
        if result.is_ok() {
            self.note_dirty(region);
        }
        result
    }

    /// Request a full redraw from the next frame's encodes.
    pub fn force_full_redraw(&mut self) {
        self.dirty.force_full_redraw();
    }

    #[inline]
    pub fn dirty(&self) -> &DirtyRegionTracker {
        &self.dirty
    }

    #[inline]
    pub fn dirty_mut(&mut self) -> &mut DirtyRegionTracker {
        &mut self.dirty
    }
}
