#![forbid(unsafe_code)]

//! Error types for surfaces and wire encoders.
//!
//! Neither error is transient: every variant describes a caller bug or a
//! buffer sized wrongly for the negotiated layout. Nothing here is retried.
//! The dirty-rect overflow is deliberately *not* an error; it is reported
//! through the negative count returned by the encoder.

use std::fmt;

use overtex_core::geometry::Rect;

/// Errors raised by [`Surface`](crate::surface::Surface) operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A dirty region with negative width or height.
    InvalidRegion {
        /// The rectangle as passed by the caller.
        rect: Rect,
    },
    /// Surface dimensions must be positive.
    InvalidSize {
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
    },
    /// A used size larger than the physical allocation.
    SizeExceedsPhysical {
        /// Requested used width.
        width: i32,
        /// Requested used height.
        height: i32,
        /// Physical width.
        physical_width: i32,
        /// Physical height.
        physical_height: i32,
    },
    /// Physical size does not fit the 16-bit wire coordinates.
    SurfaceTooLarge {
        /// Physical width.
        width: i32,
        /// Physical height.
        height: i32,
    },
    /// Bitmap slice shorter than `stride * height`.
    BitmapTooSmall {
        /// Bytes required.
        needed: usize,
        /// Bytes supplied.
        available: usize,
    },
    /// Surface-to-surface copy between different channel orders.
    FormatMismatch,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegion { rect } => write!(
                f,
                "invalid dirty region ({}, {}, {}x{}): negative extent",
                rect.left, rect.top, rect.width, rect.height
            ),
            Self::InvalidSize { width, height } => {
                write!(f, "surface size must be positive, got {width}x{height}")
            }
            Self::SizeExceedsPhysical {
                width,
                height,
                physical_width,
                physical_height,
            } => write!(
                f,
                "used size {width}x{height} exceeds physical {physical_width}x{physical_height}"
            ),
            Self::SurfaceTooLarge { width, height } => write!(
                f,
                "physical size {width}x{height} exceeds the 16-bit wire coordinate range"
            ),
            Self::BitmapTooSmall { needed, available } => write!(
                f,
                "bitmap too small: need {needed} bytes, have {available}"
            ),
            Self::FormatMismatch => write!(f, "source and target channel orders differ"),
        }
    }
}

impl std::error::Error for RenderError {}

/// Errors raised by the transform table and the wire encoders/decoders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Output buffer can't hold the record.
    BufferTooSmall {
        /// Bytes required.
        needed: usize,
        /// Bytes supplied.
        available: usize,
    },
    /// The transform table already holds the maximum number of slots.
    TooManySlots,
    /// A slot already holds the maximum number of sub-rectangles.
    TooManySubRects,
    /// No slot with this index.
    UnknownSlot(usize),
    /// Input ended before the declared content.
    Truncated {
        /// Bytes required.
        needed: usize,
        /// Bytes supplied.
        available: usize,
    },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall { needed, available } => write!(
                f,
                "output buffer too small: need {needed} bytes, have {available}"
            ),
            Self::TooManySlots => write!(f, "transform table is full"),
            Self::TooManySubRects => write!(f, "sub-rectangle list is full"),
            Self::UnknownSlot(index) => write!(f, "unknown transform slot {index}"),
            Self::Truncated { needed, available } => {
                write!(f, "truncated input: need {needed} bytes, have {available}")
            }
        }
    }
}

impl std::error::Error for ProtocolError {}
