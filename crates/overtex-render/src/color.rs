#![forbid(unsafe_code)]

//! Logical color values.

use overtex_core::pixel::{ChannelOrder, PixelFormat};

/// A compact RGBA color.
///
/// - **Size:** 4 bytes.
/// - **Layout:** `0xRRGGBBAA` (R in bits 31..24, A in bits 7..0).
///
/// This is the *logical* color. Its byte layout inside a surface is decided
/// by the surface's [`ChannelOrder`]; use [`PackedRgba::write_to`] and
/// [`PackedRgba::read_from`] to cross that boundary.
///
/// Straight alpha storage (RGB channels are not pre-multiplied).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(transparent)]
pub struct PackedRgba(pub u32);

impl PackedRgba {
    /// Fully transparent (alpha = 0).
    pub const TRANSPARENT: Self = Self(0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque red.
    pub const RED: Self = Self::rgb(255, 0, 0);
    /// Opaque green.
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    /// Opaque blue.
    pub const BLUE: Self = Self::rgb(0, 0, 255);

    /// Create an opaque RGB color (alpha = 255).
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Create an RGBA color with explicit alpha.
    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | (a as u32))
    }

    /// Red channel.
    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Green channel.
    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Blue channel.
    #[inline]
    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Alpha channel.
    #[inline]
    pub const fn a(self) -> u8 {
        self.0 as u8
    }

    /// `true` when alpha is 255.
    #[inline]
    pub const fn is_opaque(self) -> bool {
        self.a() == 255
    }

    /// Apply uniform opacity in `[0.0, 1.0]` by scaling alpha.
    #[inline]
    pub fn with_opacity(self, opacity: f32) -> Self {
        let opacity = opacity.clamp(0.0, 1.0);
        let a = ((self.a() as f32) * opacity).round().clamp(0.0, 255.0) as u8;
        Self::rgba(self.r(), self.g(), self.b(), a)
    }

    /// Write this color into one pixel of `format`, honoring `order`.
    ///
    /// 3-byte pixels drop the alpha channel.
    ///
    /// # Panics
    ///
    /// Panics if `pixel` is shorter than the format's pixel width.
    #[inline]
    pub fn write_to(self, pixel: &mut [u8], format: PixelFormat, order: ChannelOrder) {
        let [r, g, b] = order.color_offsets(format);
        pixel[r] = self.r();
        pixel[g] = self.g();
        pixel[b] = self.b();
        if format.has_alpha() {
            pixel[order.a()] = self.a();
        }
    }

    /// Read one pixel of `format`, honoring `order`.
    ///
    /// 3-byte pixels read back as opaque.
    #[inline]
    pub fn read_from(pixel: &[u8], format: PixelFormat, order: ChannelOrder) -> Self {
        let [r, g, b] = order.color_offsets(format);
        let a = if format.has_alpha() {
            pixel[order.a()]
        } else {
            255
        };
        Self::rgba(pixel[r], pixel[g], pixel[b], a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_unpack() {
        let c = PackedRgba::rgba(1, 2, 3, 4);
        assert_eq!((c.r(), c.g(), c.b(), c.a()), (1, 2, 3, 4));
        assert!(PackedRgba::RED.is_opaque());
        assert!(!PackedRgba::TRANSPARENT.is_opaque());
    }

    #[test]
    fn write_to_honors_bgra() {
        let mut px = [0u8; 4];
        PackedRgba::rgba(10, 20, 30, 40).write_to(&mut px, PixelFormat::Rgba, ChannelOrder::BGRA);
        assert_eq!(px, [30, 20, 10, 40]);
    }

    #[test]
    fn write_to_rgb_drops_alpha() {
        let mut px = [0u8; 3];
        PackedRgba::rgba(10, 20, 30, 40).write_to(&mut px, PixelFormat::Rgb, ChannelOrder::ARGB);
        assert_eq!(px, [10, 20, 30]);
    }

    #[test]
    fn read_from_inverts_write_to() {
        let c = PackedRgba::rgba(9, 8, 7, 6);
        let mut px = [0u8; 4];
        c.write_to(&mut px, PixelFormat::Rgba, ChannelOrder::ABGR);
        assert_eq!(
            PackedRgba::read_from(&px, PixelFormat::Rgba, ChannelOrder::ABGR),
            c
        );
    }

    #[test]
    fn read_from_rgb_is_opaque() {
        let px = [1u8, 2, 3];
        assert_eq!(
            PackedRgba::read_from(&px, PixelFormat::Rgb, ChannelOrder::RGBA),
            PackedRgba::rgb(1, 2, 3)
        );
    }

    #[test]
    fn with_opacity_scales_alpha() {
        let c = PackedRgba::rgba(100, 100, 100, 255).with_opacity(0.5);
        assert_eq!(c.a(), 128);
        assert_eq!(PackedRgba::WHITE.with_opacity(2.0).a(), 255);
    }
}
