#![forbid(unsafe_code)]

//! Per-frame output: the two wire buffers and the encode pass that fills
//! them.
//!
//! [`FrameOutput`] owns a dirty-rect buffer sized from
//! [`EngineConfig::max_dirty_rects`] and a transform buffer large enough for
//! a full [`TransformTable`]. The host calls
//! [`encode_frame`](FrameOutput::encode_frame) once per frame and hands both
//! buffers to the native side.
//!
//! When the dirty-rect buffer overflows, the surface is told to force a full
//! redraw so the next frame resynchronizes the consumer with one rect.
//!
//! # Usage
//!
//! ```
//! use overtex_core::config::EngineConfig;
//! use overtex_core::geometry::Rect;
//! use overtex_render::frame::FrameOutput;
//! use overtex_render::surface::{Surface, SurfaceConfig};
//! use overtex_render::transform::TransformTable;
//!
//! let config = EngineConfig::default();
//! let mut surface = Surface::new(SurfaceConfig::from_engine(&config, 320, 200)).unwrap();
//! let mut transforms = TransformTable::new();
//! transforms.register("hud", 320, 200).unwrap();
//! let mut output = FrameOutput::new(&config);
//!
//! surface.mark_dirty(Rect::new(10, 10, 20, 20)).unwrap();
//! let report = output.encode_frame(1, &mut surface, &mut transforms).unwrap();
//! assert_eq!(report.dirty_count, 1);
//! ```

use overtex_core::config::EngineConfig;

use crate::error::ProtocolError;
use crate::protocol::dirty_rects::{DirtyRectEncoder, dirty_buffer_len};
use crate::protocol::transform::{TRANSFORM_BUFFER_LEN, TransformEncoder};
use crate::surface::Surface;
use crate::transform::{SlotId, TransformTable};

/// What one [`FrameOutput::encode_frame`] call produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame index passed to the encode.
    pub frame_index: u64,
    /// Return value of the dirty-rect encoder (negative on overflow).
    pub dirty_count: i32,
    /// The dirty buffer holds a forced full-surface rect.
    pub full_redraw: bool,
    /// Bytes of the transform buffer in use.
    pub transform_len: usize,
}

impl FrameReport {
    /// Whether the dirty-rect buffer overflowed.
    #[inline]
    pub fn overflowed(&self) -> bool {
        self.dirty_count < 0
    }
}

/// Pre-allocated output buffers for one surface and its transform table.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    dirty_encoder: DirtyRectEncoder,
    transform_encoder: TransformEncoder,
    dirty_buf: Vec<u8>,
    transform_buf: Vec<u8>,
}

impl FrameOutput {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            dirty_encoder: DirtyRectEncoder::new(config.overflow_policy),
            transform_encoder: TransformEncoder::new(),
            dirty_buf: vec![0; dirty_buffer_len(config.max_dirty_rects.max(1))],
            transform_buf: vec![0; TRANSFORM_BUFFER_LEN],
        }
    }

    /// The dirty-rect buffer as last encoded.
    #[inline]
    pub fn dirty_buffer(&self) -> &[u8] {
        &self.dirty_buf
    }

    /// The transform buffer as last encoded.
    #[inline]
    pub fn transform_buffer(&self) -> &[u8] {
        &self.transform_buf
    }

    /// Encode the surface's dirty regions and every transform slot.
    pub fn encode_frame(
        &mut self,
        frame_index: u64,
        surface: &mut Surface,
        transforms: &mut TransformTable,
    ) -> Result<FrameReport, ProtocolError> {
        self.encode_frame_with(frame_index, surface, transforms, |_| None)
    }

    /// Like [`encode_frame`](Self::encode_frame), with a per-slot visibility
    /// override for this frame.
    pub fn encode_frame_with(
        &mut self,
        frame_index: u64,
        surface: &mut Surface,
        transforms: &mut TransformTable,
        visibility: impl Fn(SlotId) -> Option<bool>,
    ) -> Result<FrameReport, ProtocolError> {
        let full_redraw = surface.dirty().peek_full_redraw(frame_index);
        let dirty_count = self
            .dirty_encoder
            .encode(frame_index, surface, &mut self.dirty_buf);
        if dirty_count < 0 {
            surface.force_full_redraw();
        }

        let transform_len =
            self.transform_encoder
                .encode_all(transforms, visibility, &mut self.transform_buf)?;

        Ok(FrameReport {
            frame_index,
            dirty_count,
            full_redraw: full_redraw && dirty_count > 0,
            transform_len,
        })
    }
}
