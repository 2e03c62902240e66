#![forbid(unsafe_code)]

//! Render kernel: surfaces, compositing, dirty regions, and wire encoders.
//!
//! Widgets draw into a [`Surface`](surface::Surface). Every pixel change is
//! reported to the surface's [`DirtyRegionTracker`](dirty::DirtyRegionTracker),
//! and once per frame the [`protocol`] encoders serialize the dirty regions
//! and the [`transform`] slots for the native consumer.

pub mod color;
pub mod compositor;
pub mod dirty;
pub mod drawing;
pub mod error;
pub mod frame;
pub mod protocol;
pub mod surface;
pub mod transform;

pub use color::PackedRgba;
pub use compositor::{CompositeMode, Compositor};
pub use dirty::DirtyRegionTracker;
pub use error::{ProtocolError, RenderError};
pub use surface::{Bitmap, ClearSource, Surface, SurfaceConfig};
