//! CPU staging for the scene's fixed-capacity vertex buffers.
//!
//! Each [`VertexRegion`] mirrors one GPU vertex buffer slot-for-slot. Objects
//! write their vertices at `slot * stride`; the union of written ranges is
//! tracked so the renderer uploads only what changed.

use std::ops::Range;
use std::panic::Location;

use crate::vertex::FieldVertex;

/// Vertices per block or marker quad.
pub const QUAD_VERTICES: usize = 4;
/// Vertices per card: front, back and icon quads.
pub const CARD_VERTICES: usize = 12;

/// Slots in the field region: 2 × 17 blocks plus spare.
pub const FIELD_SLOTS: usize = 36;
pub const MISC_SLOTS: usize = 32;
pub const DEFAULT_CARD_CAPACITY: usize = 512;
/// Largest card capacity addressable with 16-bit indices.
pub const MAX_CARD_CAPACITY: usize = (u16::MAX as usize + 1) / CARD_VERTICES;

#[derive(Debug)]
pub struct VertexRegion {
    label: &'static str,
    stride: usize,
    slots: usize,
    data: Vec<FieldVertex>,
    dirty: Option<Range<usize>>,
}

impl VertexRegion {
    pub fn new(label: &'static str, stride: usize, slots: usize) -> Self {
        Self {
            label,
            stride,
            slots,
            data: vec![FieldVertex::default(); stride * slots],
            dirty: None,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Vertices per slot.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn byte_size(&self) -> u64 {
        self.data.len() as u64 * FieldVertex::SIZE
    }

    pub fn vertices(&self) -> &[FieldVertex] {
        &self.data
    }

    pub fn slot(&self, slot: usize) -> &[FieldVertex] {
        let start = (slot * self.stride).min(self.data.len());
        let end = (start + self.stride).min(self.data.len());
        &self.data[start..end]
    }

    /// Writes one slot. A write outside the region or of the wrong length is
    /// rejected and logged with the caller's location; no other slot is touched.
    #[track_caller]
    pub fn write(&mut self, slot: usize, vertices: &[FieldVertex]) -> bool {
        if slot >= self.slots || vertices.len() != self.stride {
            let at = Location::caller();
            log::error!(
                "{}: rejected write of {} vertices at slot {} (stride {}, {} slots) at {}:{}",
                self.label,
                vertices.len(),
                slot,
                self.stride,
                self.slots,
                at.file(),
                at.line()
            );
            return false;
        }

        let start = slot * self.stride;
        self.data[start..start + self.stride].copy_from_slice(vertices);
        self.mark_dirty(start..start + self.stride);
        true
    }

    /// Zeroes a slot so it draws as degenerate triangles.
    #[track_caller]
    pub fn clear_slot(&mut self, slot: usize) -> bool {
        let zeros = vec![FieldVertex::default(); self.stride];
        self.write(slot, &zeros)
    }

    pub fn clear_all(&mut self) {
        self.data.fill(FieldVertex::default());
        self.mark_all_dirty();
    }

    /// Flags the whole region for upload (after the GPU buffer was recreated).
    pub fn mark_all_dirty(&mut self) {
        self.dirty = Some(0..self.data.len());
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_some()
    }

    /// Takes the pending span as `(byte offset, bytes)` and clears it.
    pub fn take_dirty(&mut self) -> Option<(u64, &[u8])> {
        let range = self.dirty.take()?;
        let offset = range.start as u64 * FieldVertex::SIZE;
        Some((offset, bytemuck::cast_slice(&self.data[range])))
    }

    fn mark_dirty(&mut self, range: Range<usize>) {
        self.dirty = Some(match self.dirty.take() {
            Some(d) => d.start.min(range.start)..d.end.max(range.end),
            None => range,
        });
    }
}

/// The four regions a scene draws from.
#[derive(Debug)]
pub struct SceneBuffers {
    pub background: VertexRegion,
    pub field: VertexRegion,
    pub cards: VertexRegion,
    pub misc: VertexRegion,
}

impl SceneBuffers {
    pub fn new(card_capacity: usize) -> Self {
        let capacity = if card_capacity > MAX_CARD_CAPACITY {
            log::warn!("card capacity {card_capacity} exceeds {MAX_CARD_CAPACITY}; clamping");
            MAX_CARD_CAPACITY
        } else {
            card_capacity
        };

        Self {
            background: VertexRegion::new("background", QUAD_VERTICES, 1),
            field: VertexRegion::new("field", QUAD_VERTICES, FIELD_SLOTS),
            cards: VertexRegion::new("cards", CARD_VERTICES, capacity),
            misc: VertexRegion::new("misc", QUAD_VERTICES, MISC_SLOTS),
        }
    }

    pub fn regions_mut(&mut self) -> [&mut VertexRegion; 4] {
        [
            &mut self.background,
            &mut self.field,
            &mut self.cards,
            &mut self.misc,
        ]
    }
}
