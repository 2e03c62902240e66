#![forbid(unsafe_code)]

//! Per-texture transform and visibility state.
//!
//! Each sub-surface the host positions independently gets a
//! [`TransformSlot`] in the [`TransformTable`]. Setters record the change
//! and mark the slot dirty; the transform encoder rewrites a slot's bulk
//! fields only while it is dirty.
//!
//! The table holds at most [`MAX_SLOTS`] slots and each slot at most
//! [`MAX_SUB_RECTS`] sub-rectangles, matching the fixed wire layout.

use overtex_core::geometry::Rect;
use smallvec::SmallVec;

use crate::error::ProtocolError;

/// Maximum number of slots in a [`TransformTable`].
pub const MAX_SLOTS: usize = 16;

/// Maximum number of sub-rectangles per slot.
pub const MAX_SUB_RECTS: usize = 8;

bitflags::bitflags! {
    /// Which transform components are in effect for a slot.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TransformFlags: u8 {
        /// Non-zero translation.
        const TRANSLATE = 0b0000_0001;
        /// Non-zero rotation.
        const ROTATE    = 0b0000_0010;
        /// Scale other than 1.
        const SCALE     = 0b0000_0100;
    }
}

/// Index of a slot in its [`TransformTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u8);

impl SlotId {
    /// Position of the slot's record in the transform buffer.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A region of a shared physical surface belonging to one widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubRect {
    pub visible: bool,
    pub rect: Rect,
}

/// Wire-level view of one slot, as written by the encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotRecord {
    pub visible: bool,
    pub width: i32,
    pub height: i32,
    pub flags: TransformFlags,
    pub translation: (f32, f32),
    pub rotation_center: (i32, i32),
    pub rotation: f32,
    pub scale: (f32, f32),
    pub clip: Rect,
    pub sub_rects: SmallVec<[SubRect; MAX_SUB_RECTS]>,
}

/// Transform, visibility and clip state of one sub-surface.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformSlot {
    name: String,
    visible: bool,
    width: i32,
    height: i32,
    flags: TransformFlags,
    translation: (f32, f32),
    rotation_center: (i32, i32),
    rotation: f32,
    scale: (f32, f32),
    clip: Rect,
    sub_rects: SmallVec<[SubRect; MAX_SUB_RECTS]>,
    dirty: bool,
}

impl TransformSlot {
    fn new(name: &str, width: i32, height: i32) -> Self {
        Self {
            name: name.to_owned(),
            visible: true,
            width,
            height,
            flags: TransformFlags::empty(),
            translation: (0.0, 0.0),
            rotation_center: (0, 0),
            rotation: 0.0,
            scale: (1.0, 1.0),
            clip: Rect::from_size(width, height),
            sub_rects: SmallVec::new(),
            dirty: true,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Logical size in pixels.
    #[inline]
    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn flags(&self) -> TransformFlags {
        self.flags
    }

    #[inline]
    pub fn translation(&self) -> (f32, f32) {
        self.translation
    }

    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    #[inline]
    pub fn rotation_center(&self) -> (i32, i32) {
        self.rotation_center
    }

    #[inline]
    pub fn scale(&self) -> (f32, f32) {
        self.scale
    }

    #[inline]
    pub fn clip(&self) -> Rect {
        self.clip
    }

    #[inline]
    pub fn sub_rects(&self) -> &[SubRect] {
        &self.sub_rects
    }

    /// Whether the bulk fields changed since the last encode.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.dirty = true;
    }

    pub fn set_size(&mut self, width: i32, height: i32) {
        self.width = width;
        self.height = height;
        self.dirty = true;
    }

    /// Set the translation in pixels.
    pub fn set_translation(&mut self, x: f32, y: f32) {
        self.translation = (x, y);
        self.flags
            .set(TransformFlags::TRANSLATE, x != 0.0 || y != 0.0);
        self.dirty = true;
    }

    /// Set the rotation in radians around `center`.
    pub fn set_rotation(&mut self, radians: f32, center: (i32, i32)) {
        self.rotation = radians;
        self.rotation_center = center;
        self.flags.set(TransformFlags::ROTATE, radians != 0.0);
        self.dirty = true;
    }

    pub fn set_scale(&mut self, x: f32, y: f32) {
        self.scale = (x, y);
        self.flags.set(TransformFlags::SCALE, x != 1.0 || y != 1.0);
        self.dirty = true;
    }

    pub fn set_clip(&mut self, clip: Rect) {
        self.clip = clip;
        self.dirty = true;
    }

    /// Append a sub-rectangle and return its index.
    pub fn push_sub_rect(&mut self, rect: Rect, visible: bool) -> Result<usize, ProtocolError> {
        if self.sub_rects.len() >= MAX_SUB_RECTS {
            return Err(ProtocolError::TooManySubRects);
        }
        self.sub_rects.push(SubRect { visible, rect });
        self.dirty = true;
        Ok(self.sub_rects.len() - 1)
    }

    /// Show or hide one sub-rectangle. Returns `false` for an unknown index.
    pub fn set_sub_rect_visible(&mut self, index: usize, visible: bool) -> bool {
        let Some(sub) = self.sub_rects.get_mut(index) else {
            return false;
        };
        if sub.visible != visible {
            sub.visible = visible;
            self.dirty = true;
        }
        true
    }

    pub fn clear_sub_rects(&mut self) {
        if !self.sub_rects.is_empty() {
            self.sub_rects.clear();
            self.dirty = true;
        }
    }

    /// Force the next encode to rewrite the bulk fields.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Snapshot of the fields the encoder writes.
    pub fn record(&self) -> SlotRecord {
        SlotRecord {
            visible: self.visible,
            width: self.width,
            height: self.height,
            flags: self.flags,
            translation: self.translation,
            rotation_center: self.rotation_center,
            rotation: self.rotation,
            scale: self.scale,
            clip: self.clip,
            sub_rects: self.sub_rects.clone(),
        }
    }
}

/// Bounded, name-addressed set of transform slots.
#[derive(Debug, Clone, Default)]
pub struct TransformTable {
    slots: Vec<TransformSlot>,
}

impl TransformTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sub-surface, or return the id it already has.
    ///
    /// Slots are numbered in registration order.
    pub fn register(&mut self, name: &str, width: i32, height: i32) -> Result<SlotId, ProtocolError> {
        if let Some(id) = self.slot_id(name) {
            return Ok(id);
        }
        if self.slots.len() >= MAX_SLOTS {
            return Err(ProtocolError::TooManySlots);
        }
        self.slots.push(TransformSlot::new(name, width, height));
        Ok(SlotId((self.slots.len() - 1) as u8))
    }

    /// Look up a slot by name.
    pub fn slot_id(&self, name: &str) -> Option<SlotId> {
        self.slots
            .iter()
            .position(|s| s.name == name)
            .map(|i| SlotId(i as u8))
    }

    /// Id of the slot at `index`.
    pub fn id_at(&self, index: usize) -> Result<SlotId, ProtocolError> {
        if index < self.slots.len() {
            Ok(SlotId(index as u8))
        } else {
            Err(ProtocolError::UnknownSlot(index))
        }
    }

    pub fn get(&self, id: SlotId) -> Option<&TransformSlot> {
        self.slots.get(id.index())
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut TransformSlot> {
        self.slots.get_mut(id.index())
    }

    /// Number of registered slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &TransformSlot)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, s)| (SlotId(i as u8), s))
    }

    /// Force every slot to be rewritten on the next encode.
    pub fn mark_all_dirty(&mut self) {
        for slot in &mut self.slots {
            slot.dirty = true;
        }
    }
}
