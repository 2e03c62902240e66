#![forbid(unsafe_code)]

//! Pixel formats and the channel-order permutation.
//!
//! Every pixel read and write in the engine goes through a [`ChannelOrder`]:
//! a 4-entry table mapping the logical channels (R, G, B, A) to physical byte
//! offsets inside a 4-byte pixel. The table is negotiated with the consumer
//! once, before any surface exists, and then passed by value into every
//! surface and compositor.
//!
//! 3-byte pixels use the same table with the alpha slot removed: the
//! remaining three offsets keep their relative order and are compacted into
//! `0..3`. So `BGRA` stores 3-byte pixels as `B G R`, and `ARGB` stores them
//! as `R G B`.

use core::fmt;
use core::str::FromStr;

use crate::config::ConfigError;

/// Bytes-per-pixel layout of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PixelFormat {
    /// Three bytes per pixel, no alpha.
    Rgb,
    /// Four bytes per pixel, straight (non-premultiplied) alpha.
    #[default]
    Rgba,
}

impl PixelFormat {
    /// Bytes per pixel (3 or 4).
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Whether the format carries an alpha channel.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba)
    }

    /// Look up the format for a bytes-per-pixel value.
    pub const fn from_bytes_per_pixel(bytes: usize) -> Option<Self> {
        match bytes {
            3 => Some(Self::Rgb),
            4 => Some(Self::Rgba),
            _ => None,
        }
    }
}

/// Logical-channel to physical-byte-offset permutation.
///
/// Immutable once constructed. Construction validates that the four offsets
/// form a permutation of `0..4`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "[u8; 4]", into = "[u8; 4]"))]
pub struct ChannelOrder {
    offsets: [u8; 4],
}

impl ChannelOrder {
    /// `R G B A` in memory.
    pub const RGBA: Self = Self {
        offsets: [0, 1, 2, 3],
    };
    /// `B G R A` in memory (common for little-endian 32-bit ARGB words).
    pub const BGRA: Self = Self {
        offsets: [2, 1, 0, 3],
    };
    /// `A R G B` in memory.
    pub const ARGB: Self = Self {
        offsets: [1, 2, 3, 0],
    };
    /// `A B G R` in memory.
    pub const ABGR: Self = Self {
        offsets: [3, 2, 1, 0],
    };

    /// Build an order from `[r, g, b, a]` byte offsets.
    pub fn from_offsets(offsets: [u8; 4]) -> Result<Self, ConfigError> {
        let mut seen = [false; 4];
        for &offset in &offsets {
            let slot = seen
                .get_mut(offset as usize)
                .ok_or(ConfigError::InvalidChannelOffsets(offsets))?;
            if *slot {
                return Err(ConfigError::InvalidChannelOffsets(offsets));
            }
            *slot = true;
        }
        Ok(Self { offsets })
    }

    /// `[r, g, b, a]` byte offsets inside a 4-byte pixel.
    #[inline]
    pub const fn offsets(self) -> [u8; 4] {
        self.offsets
    }

    /// Offset of the red channel in a 4-byte pixel.
    #[inline]
    pub const fn r(self) -> usize {
        self.offsets[0] as usize
    }

    /// Offset of the green channel in a 4-byte pixel.
    #[inline]
    pub const fn g(self) -> usize {
        self.offsets[1] as usize
    }

    /// Offset of the blue channel in a 4-byte pixel.
    #[inline]
    pub const fn b(self) -> usize {
        self.offsets[2] as usize
    }

    /// Offset of the alpha channel in a 4-byte pixel.
    #[inline]
    pub const fn a(self) -> usize {
        self.offsets[3] as usize
    }

    /// `[r, g, b]` offsets inside a 3-byte pixel.
    #[inline]
    pub const fn rgb_offsets(self) -> [usize; 3] {
        let a = self.offsets[3];
        [
            compact_offset(self.offsets[0], a),
            compact_offset(self.offsets[1], a),
            compact_offset(self.offsets[2], a),
        ]
    }

    /// `[r, g, b]` offsets for a pixel of the given format.
    #[inline]
    pub const fn color_offsets(self, format: PixelFormat) -> [usize; 3] {
        match format {
            PixelFormat::Rgb => self.rgb_offsets(),
            PixelFormat::Rgba => [self.r(), self.g(), self.b()],
        }
    }

    /// Short lowercase name for the known presets.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::RGBA => Some("rgba"),
            Self::BGRA => Some("bgra"),
            Self::ARGB => Some("argb"),
            Self::ABGR => Some("abgr"),
            _ => None,
        }
    }
}

#[inline]
const fn compact_offset(offset: u8, alpha: u8) -> usize {
    if offset > alpha {
        (offset - 1) as usize
    } else {
        offset as usize
    }
}

impl Default for ChannelOrder {
    fn default() -> Self {
        Self::RGBA
    }
}

impl fmt::Debug for ChannelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "ChannelOrder({name})"),
            None => f
                .debug_struct("ChannelOrder")
                .field("offsets", &self.offsets)
                .finish(),
        }
    }
}

impl FromStr for ChannelOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rgba" => Ok(Self::RGBA),
            "bgra" => Ok(Self::BGRA),
            "argb" => Ok(Self::ARGB),
            "abgr" => Ok(Self::ABGR),
            other => Err(ConfigError::UnknownChannelOrder(other.to_string())),
        }
    }
}

impl TryFrom<[u8; 4]> for ChannelOrder {
    type Error = ConfigError;

    fn try_from(offsets: [u8; 4]) -> Result<Self, Self::Error> {
        Self::from_offsets(offsets)
    }
}

impl From<ChannelOrder> for [u8; 4] {
    fn from(order: ChannelOrder) -> Self {
        order.offsets
    }
}
