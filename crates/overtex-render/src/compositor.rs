#![forbid(unsafe_code)]

//! Row compositing between 3- and 4-byte pixel formats.
//!
//! [`Compositor::combine`] blends a row of source pixels into a row of
//! destination pixels. Every channel access goes through the compositor's
//! [`ChannelOrder`]; the arithmetic itself never assumes a byte layout.
//!
//! # Rules
//!
//! | src  | dst  | mode   | result                                                   |
//! |------|------|--------|----------------------------------------------------------|
//! | 3    | 3    | any    | byte copy                                                |
//! | 3    | 4    | any    | copy RGB, alpha forced to 255                            |
//! | 4    | 3    | `Copy` | `c = s * a / 255`                                        |
//! | 4    | 3    | `Over` | `c = s * a / 255 + d * (255 - a) / 255`                  |
//! | 4    | 4    | `Copy` | byte copy                                                |
//! | 4    | 4    | `Over` | `rgb = rgb_s*a_s + rgb_d*a_d*(1-a_s)`, `a = a_s + a_d*(1-a_s)` |
//!
//! The 4→4 `Over` blend is computed in normalized `[0, 1]` space and rounded
//! back to a byte. A source alpha of 0 leaves the destination pixel
//! untouched and a source alpha of 255 copies the source pixel.

use overtex_core::pixel::{ChannelOrder, PixelFormat};

use crate::color::PackedRgba;

/// How source pixels combine with the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompositeMode {
    /// Overwrite the destination (no blending with existing pixels).
    Copy,
    /// Alpha-blend the source over the destination.
    #[default]
    Over,
}

impl CompositeMode {
    /// Mode for an `overwrite` flag.
    #[inline]
    pub const fn from_overwrite(overwrite: bool) -> Self {
        if overwrite { Self::Copy } else { Self::Over }
    }
}

/// Channel-order aware row blender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Compositor {
    order: ChannelOrder,
}

impl Compositor {
    /// Create a compositor for the given channel order.
    #[inline]
    pub const fn new(order: ChannelOrder) -> Self {
        Self { order }
    }

    /// The channel order used for every pixel access.
    #[inline]
    pub const fn order(&self) -> ChannelOrder {
        self.order
    }

    /// Combine `pixel_count` pixels of `src` into `dst`.
    ///
    /// # Panics
    ///
    /// Panics if either slice is shorter than `pixel_count` pixels of its
    /// format.
    pub fn combine(
        &self,
        src: &[u8],
        src_format: PixelFormat,
        dst: &mut [u8],
        dst_format: PixelFormat,
        pixel_count: usize,
        mode: CompositeMode,
    ) {
        let src = &src[..pixel_count * src_format.bytes_per_pixel()];
        let dst = &mut dst[..pixel_count * dst_format.bytes_per_pixel()];
        let order = self.order;

        match (src_format, dst_format, mode) {
            (PixelFormat::Rgb, PixelFormat::Rgb, _)
            | (PixelFormat::Rgba, PixelFormat::Rgba, CompositeMode::Copy) => {
                dst.copy_from_slice(src);
            }
            (PixelFormat::Rgb, PixelFormat::Rgba, _) => {
                for (s, d) in src.chunks_exact(3).zip(dst.chunks_exact_mut(4)) {
                    rgb_into_rgba(s, d, order);
                }
            }
            (PixelFormat::Rgba, PixelFormat::Rgb, mode) => {
                for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(3)) {
                    rgba_into_rgb(s, d, order, mode);
                }
            }
            (PixelFormat::Rgba, PixelFormat::Rgba, CompositeMode::Over) => {
                for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
                    rgba_over_rgba(s, d, order);
                }
            }
        }
    }

    /// Combine a single solid color into `pixel_count` destination pixels.
    ///
    /// Equivalent to [`combine`](Self::combine) with a source row made of
    /// `color` repeated, without materializing that row.
    pub fn fill(
        &self,
        color: PackedRgba,
        dst: &mut [u8],
        dst_format: PixelFormat,
        pixel_count: usize,
        mode: CompositeMode,
    ) {
        let dst = &mut dst[..pixel_count * dst_format.bytes_per_pixel()];
        let order = self.order;
        let mut src = [0u8; 4];
        color.write_to(&mut src, PixelFormat::Rgba, order);

        match (dst_format, mode) {
            (PixelFormat::Rgba, CompositeMode::Copy) => {
                for d in dst.chunks_exact_mut(4) {
                    d.copy_from_slice(&src);
                }
            }
            (PixelFormat::Rgba, CompositeMode::Over) => {
                if color.a() == 0 {
                    return;
                }
                for d in dst.chunks_exact_mut(4) {
                    rgba_over_rgba(&src, d, order);
                }
            }
            (PixelFormat::Rgb, mode) => {
                for d in dst.chunks_exact_mut(3) {
                    rgba_into_rgb(&src, d, order, mode);
                }
            }
        }
    }
}

#[inline]
fn rgb_into_rgba(s: &[u8], d: &mut [u8], order: ChannelOrder) {
    let [sr, sg, sb] = order.rgb_offsets();
    d[order.r()] = s[sr];
    d[order.g()] = s[sg];
    d[order.b()] = s[sb];
    d[order.a()] = 255;
}

#[inline]
fn rgba_into_rgb(s: &[u8], d: &mut [u8], order: ChannelOrder, mode: CompositeMode) {
    let alpha = s[order.a()] as u32;
    let inv = 255 - alpha;
    let [dr, dg, db] = order.rgb_offsets();
    for (src_off, dst_off) in [(order.r(), dr), (order.g(), dg), (order.b(), db)] {
        let premul = s[src_off] as u32 * alpha / 255;
        d[dst_off] = match mode {
            CompositeMode::Copy => premul as u8,
            CompositeMode::Over => (premul + d[dst_off] as u32 * inv / 255).min(255) as u8,
        };
    }
}

#[inline]
fn rgba_over_rgba(s: &[u8], d: &mut [u8], order: ChannelOrder) {
    let sa = s[order.a()];
    if sa == 0 {
        return;
    }
    if sa == 255 {
        d.copy_from_slice(&s[..4]);
        return;
    }

    let a_s = sa as f32 / 255.0;
    let a_d = d[order.a()] as f32 / 255.0;
    let inv = 1.0 - a_s;
    for off in [order.r(), order.g(), order.b()] {
        d[off] = to_byte(s[off] as f32 * a_s + d[off] as f32 * a_d * inv);
    }
    d[order.a()] = to_byte((a_s + a_d * inv) * 255.0);
}

#[inline]
fn to_byte(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
