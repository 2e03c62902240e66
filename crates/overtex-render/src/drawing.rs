#![forbid(unsafe_code)]

//! Drawing primitives for surfaces.
//!
//! Thin helpers on top of [`Surface::fill_rect`] and
//! [`Surface::blit_bitmap`] so widgets can draw lines, boxes, and images
//! without repeating the clip and dirty bookkeeping.
//!
//! All operations respect the surface's clip and composite with
//! [`CompositeMode::Over`]. Primitives made of several fills report a single
//! dirty region covering the whole shape.

use overtex_core::geometry::Rect;

use crate::color::PackedRgba;
use crate::compositor::CompositeMode;
use crate::surface::{Bitmap, Surface};

/// Extension trait for drawing on a [`Surface`].
pub trait Draw {
    /// Draw a horizontal line of pixels.
    fn draw_horizontal_line(&mut self, x: i32, y: i32, width: i32, color: PackedRgba);

    /// Draw a vertical line of pixels.
    fn draw_vertical_line(&mut self, x: i32, y: i32, height: i32, color: PackedRgba);

    /// Draw a filled rectangle.
    fn draw_rect_filled(&mut self, rect: Rect, color: PackedRgba);

    /// Draw a one pixel wide rectangle outline.
    ///
    /// Corners are painted once, so translucent colors blend evenly.
    fn draw_rect_outline(&mut self, rect: Rect, color: PackedRgba);

    /// Draw a bitmap with its top-left corner at `(x, y)`.
    fn draw_bitmap(&mut self, bitmap: Bitmap<'_>, x: i32, y: i32);

    /// Fill `target` with repeated copies of a bitmap.
    fn draw_bitmap_tiled(&mut self, bitmap: Bitmap<'_>, target: Rect);
}

impl Draw for Surface {
    fn draw_horizontal_line(&mut self, x: i32, y: i32, width: i32, color: PackedRgba) {
        self.fill_rect(Rect::new(x, y, width, 1), color, CompositeMode::Over);
    }

    fn draw_vertical_line(&mut self, x: i32, y: i32, height: i32, color: PackedRgba) {
        self.fill_rect(Rect::new(x, y, 1, height), color, CompositeMode::Over);
    }

    fn draw_rect_filled(&mut self, rect: Rect, color: PackedRgba) {
        self.fill_rect(rect, color, CompositeMode::Over);
    }

    fn draw_rect_outline(&mut self, rect: Rect, color: PackedRgba) {
        if rect.is_empty() {
            return;
        }

        let _: Result<(), core::convert::Infallible> = self.draw_batched(rect, |s| {
            // Top
            s.draw_horizontal_line(rect.left, rect.top, rect.width, color);

            // Bottom
            if rect.height > 1 {
                s.draw_horizontal_line(rect.left, rect.bottom() - 1, rect.width, color);
            }

            // Left (excluding corners)
            if rect.height > 2 {
                s.draw_vertical_line(rect.left, rect.top + 1, rect.height - 2, color);
            }

            // Right (excluding corners)
            if rect.width > 1 && rect.height > 2 {
                s.draw_vertical_line(rect.right() - 1, rect.top + 1, rect.height - 2, color);
            }
            Ok(())
        });
    }

    fn draw_bitmap(&mut self, bitmap: Bitmap<'_>, x: i32, y: i32) {
        let target = Rect::new(x, y, bitmap.width(), bitmap.height());
        self.blit_bitmap(bitmap, target, CompositeMode::Over);
    }

    fn draw_bitmap_tiled(&mut self, bitmap: Bitmap<'_>, target: Rect) {
        self.blit_bitmap(bitmap, target, CompositeMode::Over);
    }
}
