#![forbid(unsafe_code)]

//! Core: geometry, pixel formats, engine configuration, and logging shims.

pub mod config;
pub mod geometry;
pub mod logging;
pub mod pixel;

// With tracing on, the macros are re-exported here; without it the no-op
// versions are `#[macro_export]`ed to the same paths.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, trace, trace_span, warn};
