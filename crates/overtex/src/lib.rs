#![forbid(unsafe_code)]

//! Overtex public facade crate.
//!
//! Re-exports the common types from the internal crates, a single
//! [`Error`] covering all of them, and a prelude for day-to-day usage.
//!
//! ```
//! use overtex::prelude::*;
//!
//! fn frame() -> overtex::Result<()> {
//!     let config = EngineConfig::from_env_with(|_| None)?;
//!     let mut surface = Surface::new(SurfaceConfig::from_engine(&config, 256, 128))?;
//!     let mut transforms = TransformTable::new();
//!     transforms.register("hud", 256, 128)?;
//!     let mut output = FrameOutput::new(&config);
//!
//!     surface.draw_rect_filled(Rect::new(8, 8, 32, 16), PackedRgba::rgba(255, 0, 0, 200));
//!     let report = output.encode_frame(1, &mut surface, &mut transforms)?;
//!     assert_eq!(report.dirty_count, 1);
//!     Ok(())
//! }
//! frame().unwrap();
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use overtex_core::config::{ConfigError, EngineConfig, OverflowPolicy};
pub use overtex_core::geometry::Rect;
pub use overtex_core::pixel::{ChannelOrder, PixelFormat};

// --- Render re-exports -----------------------------------------------------

pub use overtex_render::color::PackedRgba;
pub use overtex_render::compositor::{CompositeMode, Compositor};
pub use overtex_render::dirty::DirtyRegionTracker;
pub use overtex_render::drawing::Draw;
pub use overtex_render::error::{ProtocolError, RenderError};
pub use overtex_render::frame::{FrameOutput, FrameReport};
pub use overtex_render::protocol::{
    DirtyRectEncoder, SLOT_STRIDE, TransformEncoder, decode_dirty_rects, decode_slot,
};
pub use overtex_render::surface::{Bitmap, ClearSource, Surface, SurfaceConfig};
pub use overtex_render::transform::{
    MAX_SLOTS, MAX_SUB_RECTS, SlotId, TransformFlags, TransformSlot, TransformTable,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for overtex hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid engine configuration.
    Config(ConfigError),
    /// Surface operation failed.
    Render(RenderError),
    /// Transform table or wire buffer problem.
    Protocol(ProtocolError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "config: {err}"),
            Self::Render(err) => write!(f, "render: {err}"),
            Self::Protocol(err) => write!(f, "protocol: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Render(err) => Some(err),
            Self::Protocol(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<RenderError> for Error {
    fn from(err: RenderError) -> Self {
        Self::Render(err)
    }
}

impl From<ProtocolError> for Error {
    fn from(err: ProtocolError) -> Self {
        Self::Protocol(err)
    }
}

/// Standard result type for overtex APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ChannelOrder, CompositeMode, Draw, EngineConfig, Error, FrameOutput, PackedRgba,
        PixelFormat, Rect, Result, Surface, SurfaceConfig, TransformTable,
    };

    pub use crate::{core, render};
}

pub use overtex_core as core;
pub use overtex_render as render;
