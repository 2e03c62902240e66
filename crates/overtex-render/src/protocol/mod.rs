#![forbid(unsafe_code)]

//! Binary wire formats shared with the native consumer.
//!
//! Both formats use native byte order and unaligned fields; the consumer is
//! expected to run in the same process. Buffers are allocated by the caller
//! and reused every frame.
//!
//! - [`dirty_rects`]: the changed regions of one surface.
//! - [`transform`]: per-slot transform, visibility and clip state.

pub mod dirty_rects;
pub mod transform;

pub use dirty_rects::{
    DIRTY_HEADER_LEN, DIRTY_RECT_LEN, DirtyRectEncoder, decode_dirty_rects, dirty_buffer_len,
};
pub use transform::{
    SLOT_STRIDE, TRANSFORM_BUFFER_LEN, TransformEncoder, decode_slot, decode_slot_count,
};

/// Clamp a coordinate into the `i16` wire range.
#[inline]
pub(crate) fn wire_i16(v: i32) -> i16 {
    v.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

#[inline]
pub(crate) fn put_i16(buf: &mut [u8], at: usize, v: i16) {
    buf[at..at + 2].copy_from_slice(&v.to_ne_bytes());
}

#[inline]
pub(crate) fn put_f32(buf: &mut [u8], at: usize, v: f32) {
    buf[at..at + 4].copy_from_slice(&v.to_ne_bytes());
}

#[inline]
pub(crate) fn get_i16(buf: &[u8], at: usize) -> i16 {
    i16::from_ne_bytes([buf[at], buf[at + 1]])
}

#[inline]
pub(crate) fn get_f32(buf: &[u8], at: usize) -> f32 {
    f32::from_ne_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}
