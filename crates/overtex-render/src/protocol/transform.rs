#![forbid(unsafe_code)]

//! Transform and visibility wire format.
//!
//! Byte 0 holds the number of active slots. Slot `k` is a fixed-size record
//! of [`SLOT_STRIDE`] bytes at offset `1 + k * SLOT_STRIDE`:
//!
//! ```text
//! offset  size  field
//! 0       1     visible (0 | 1)
//! 1       2     width: i16
//! 3       2     height: i16
//! 5       1     flags: TransformFlags
//! 6       4     translation x: f32
//! 10      4     translation y: f32
//! 14      2     rotation center x: i16
//! 16      2     rotation center y: i16
//! 18      4     rotation: f32 (radians)
//! 22      4     scale x: f32
//! 26      4     scale y: f32
//! 30      8     clip: left, top, width, height (i16 each)
//! 38      1     sub-rect count
//! 39+9j   1     sub-rect j visible
//! 40+9j   8     sub-rect j: left, top, width, height (i16 each)
//! ```
//!
//! The buffer persists across frames. A slot's bulk fields are rewritten
//! only while the slot is dirty; the visibility byte is rewritten on every
//! encode.

use overtex_core::geometry::Rect;
use smallvec::SmallVec;

use super::{get_f32, get_i16, put_f32, put_i16, wire_i16};
use crate::error::ProtocolError;
use crate::transform::{
    MAX_SLOTS, MAX_SUB_RECTS, SlotId, SlotRecord, SubRect, TransformFlags, TransformSlot,
    TransformTable,
};

const VISIBLE: usize = 0;
const WIDTH: usize = 1;
const HEIGHT: usize = 3;
const FLAGS: usize = 5;
const TRANSLATE_X: usize = 6;
const TRANSLATE_Y: usize = 10;
const CENTER_X: usize = 14;
const CENTER_Y: usize = 16;
const ROTATION: usize = 18;
const SCALE_X: usize = 22;
const SCALE_Y: usize = 26;
const CLIP: usize = 30;
const SUB_COUNT: usize = 38;
const SUB_RECTS: usize = 39;
const SUB_RECT_LEN: usize = 9;

/// Size of one slot record in bytes.
pub const SLOT_STRIDE: usize = SUB_RECTS + SUB_RECT_LEN * MAX_SUB_RECTS;

/// Buffer size that holds a full table.
pub const TRANSFORM_BUFFER_LEN: usize = 1 + MAX_SLOTS * SLOT_STRIDE;

/// Writes transform slots into the shared transform buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformEncoder;

impl TransformEncoder {
    pub const fn new() -> Self {
        Self
    }

    /// Offset of a slot's record.
    #[inline]
    pub const fn slot_offset(id: SlotId) -> usize {
        1 + id.index() * SLOT_STRIDE
    }

    /// Write the active slot count.
    pub fn encode_header(&self, table: &TransformTable, buf: &mut [u8]) -> Result<usize, ProtocolError> {
        let Some(first) = buf.first_mut() else {
            return Err(ProtocolError::BufferTooSmall {
                needed: 1,
                available: 0,
            });
        };
        *first = table.len() as u8;
        Ok(1)
    }

    /// Write one slot record at `offset`.
    ///
    /// `visibility` overrides the slot's own visibility for this frame.
    ///
    /// Returns the write cursor for the next record: a byte offset into
    /// `buf`, equal to `offset + SLOT_STRIDE`, so passing it back as the next
    /// call's `offset` packs slots contiguously after the header.
    pub fn encode_slot(
        &self,
        table: &mut TransformTable,
        id: SlotId,
        visibility: Option<bool>,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<usize, ProtocolError> {
        let slot = table
            .get_mut(id)
            .ok_or(ProtocolError::UnknownSlot(id.index()))?;
        let end = offset + SLOT_STRIDE;
        if buf.len() < end {
            return Err(ProtocolError::BufferTooSmall {
                needed: end,
                available: buf.len(),
            });
        }

        let _span = overtex_core::trace_span!(
            "transform_encode",
            slot = id.index(),
            dirty = slot.is_dirty()
        );
        let _guard = _span.enter();

        let rec = &mut buf[offset..end];
        rec[VISIBLE] = u8::from(visibility.unwrap_or(slot.is_visible()));
        if slot.is_dirty() {
            write_bulk(slot, rec);
            slot.mark_clean();
        }
        Ok(end)
    }

    /// Write the header and every slot at its standard offset.
    ///
    /// Checks the buffer size up front, so nothing is written on error.
    /// Returns the number of bytes in use.
    pub fn encode_all(
        &self,
        table: &mut TransformTable,
        visibility: impl Fn(SlotId) -> Option<bool>,
        buf: &mut [u8],
    ) -> Result<usize, ProtocolError> {
        let needed = 1 + table.len() * SLOT_STRIDE;
        if buf.len() < needed {
            return Err(ProtocolError::BufferTooSmall {
                needed,
                available: buf.len(),
            });
        }
        let mut offset = self.encode_header(table, buf)?;
        for index in 0..table.len() {
            let id = table.id_at(index)?;
            offset = self.encode_slot(table, id, visibility(id), offset, buf)?;
        }
        Ok(offset)
    }
}

fn write_bulk(slot: &TransformSlot, rec: &mut [u8]) {
    let (width, height) = slot.size();
    put_i16(rec, WIDTH, wire_i16(width));
    put_i16(rec, HEIGHT, wire_i16(height));
    rec[FLAGS] = slot.flags().bits();

    let (tx, ty) = slot.translation();
    put_f32(rec, TRANSLATE_X, tx);
    put_f32(rec, TRANSLATE_Y, ty);
    let (cx, cy) = slot.rotation_center();
    put_i16(rec, CENTER_X, wire_i16(cx));
    put_i16(rec, CENTER_Y, wire_i16(cy));
    put_f32(rec, ROTATION, slot.rotation());
    let (sx, sy) = slot.scale();
    put_f32(rec, SCALE_X, sx);
    put_f32(rec, SCALE_Y, sy);
    put_rect(rec, CLIP, slot.clip());

    let subs = slot.sub_rects();
    rec[SUB_COUNT] = subs.len() as u8;
    for j in 0..MAX_SUB_RECTS {
        let at = SUB_RECTS + j * SUB_RECT_LEN;
        // Unused entries are zeroed so a shrinking list leaves nothing stale.
        let sub = subs.get(j).copied().unwrap_or_default();
        rec[at] = u8::from(sub.visible);
        put_rect(rec, at + 1, sub.rect);
    }
}

fn put_rect(buf: &mut [u8], at: usize, r: Rect) {
    put_i16(buf, at, wire_i16(r.left));
    put_i16(buf, at + 2, wire_i16(r.top));
    put_i16(buf, at + 4, wire_i16(r.width));
    put_i16(buf, at + 6, wire_i16(r.height));
}

fn get_rect(buf: &[u8], at: usize) -> Rect {
    Rect::new(
        get_i16(buf, at).into(),
        get_i16(buf, at + 2).into(),
        get_i16(buf, at + 4).into(),
        get_i16(buf, at + 6).into(),
    )
}

/// Read the active slot count from byte 0.
pub fn decode_slot_count(buf: &[u8]) -> Result<usize, ProtocolError> {
    buf.first()
        .map(|&n| n as usize)
        .ok_or(ProtocolError::Truncated {
            needed: 1,
            available: 0,
        })
}

/// Read the slot record at `offset`.
pub fn decode_slot(buf: &[u8], offset: usize) -> Result<SlotRecord, ProtocolError> {
    let end = offset + SLOT_STRIDE;
    let Some(rec) = buf.get(offset..end) else {
        return Err(ProtocolError::Truncated {
            needed: end,
            available: buf.len(),
        });
    };

    let count = rec[SUB_COUNT] as usize;
    if count > MAX_SUB_RECTS {
        return Err(ProtocolError::TooManySubRects);
    }
    let sub_rects: SmallVec<[SubRect; MAX_SUB_RECTS]> = (0..count)
        .map(|j| {
            let at = SUB_RECTS + j * SUB_RECT_LEN;
            SubRect {
                visible: rec[at] != 0,
                rect: get_rect(rec, at + 1),
            }
        })
        .collect();

    Ok(SlotRecord {
        visible: rec[VISIBLE] != 0,
        width: get_i16(rec, WIDTH).into(),
        height: get_i16(rec, HEIGHT).into(),
        flags: TransformFlags::from_bits_truncate(rec[FLAGS]),
        translation: (get_f32(rec, TRANSLATE_X), get_f32(rec, TRANSLATE_Y)),
        rotation_center: (get_i16(rec, CENTER_X).into(), get_i16(rec, CENTER_Y).into()),
        rotation: get_f32(rec, ROTATION),
        scale: (get_f32(rec, SCALE_X), get_f32(rec, SCALE_Y)),
        clip: get_rect(rec, CLIP),
        sub_rects,
    })
}
