use glam::{Vec2, Vec3};

use crate::assets::{AssetProvider, SheetKind, TextureRegion};
use crate::buffers::VertexRegion;
use crate::cards::Side;
use crate::layout::{BLOCK_NAMES, LayoutRect, LayoutSource, ZONE_BLOCKS};

use super::{FieldObject, ObjectState, ObjectStore, layout_rect_or_default};

/// Address of a zone block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BlockId {
    pub side: Side,
    pub index: usize,
}

impl BlockId {
    pub const fn new(side: Side, index: usize) -> Self {
        Self { side, index }
    }

    /// Slot in the field region: near blocks first, far blocks after them.
    pub fn slot(self) -> usize {
        self.side.index() * ZONE_BLOCKS + self.index
    }
}

/// A static zone slot: one textured quad.
#[derive(Debug, Clone)]
pub struct FieldBlock {
    state: ObjectState,
    /// Highlight restored when hover leaves the block.
    base_highlight: f32,
}

impl FieldBlock {
    pub fn new(vertex_index: usize, rect: &LayoutRect, region: TextureRegion) -> Self {
        let mut block = Self {
            state: ObjectState::new(vertex_index, 4),
            base_highlight: 0.0,
        };
        block.init(vertex_index, rect, region);
        block
    }

    /// Recomputes geometry and UVs. Animated scalars are left as they are.
    pub fn init(&mut self, vertex_index: usize, rect: &LayoutRect, region: TextureRegion) {
        self.state.vertex_index = vertex_index;
        self.state.vertex = rect.corners(0.0).to_vec();
        self.state.texcoord = region.uv.to_vec();
    }

    /// The opposing side's copy: every vertex negated, slot `vertex_index`.
    pub fn mirrored(&self, vertex_index: usize) -> Self {
        let mut state = self.state.clone();
        state.vertex_index = vertex_index;
        state.vertex.iter_mut().for_each(|v| *v = -*v);
        state.updating = false;
        Self {
            state,
            base_highlight: self.base_highlight,
        }
    }

    pub fn center(&self) -> Vec2 {
        let sum: Vec3 = self.state.vertex.iter().copied().sum();
        (sum / self.state.vertex.len().max(1) as f32).truncate()
    }

    /// Rectangle covered by the quad, in field coordinates.
    pub fn rect(&self) -> LayoutRect {
        let v = &self.state.vertex;
        LayoutRect {
            center: self.center(),
            size: Vec2::new((v[1].x - v[0].x).abs(), (v[0].y - v[2].y).abs()),
        }
    }

    pub fn base_highlight(&self) -> f32 {
        self.base_highlight
    }

    pub fn set_base_highlight(&mut self, value: f32) {
        self.base_highlight = value.clamp(0.0, 1.0);
    }
}

impl FieldObject for FieldBlock {
    fn state(&self) -> &ObjectState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ObjectState {
        &mut self.state
    }

    fn refresh_vertices(&self, region: &mut VertexRegion) {
        let vertices = self.state.pack(self.state.vertex.iter().copied());
        region.write(self.state.vertex_index, &vertices);
    }

    fn update_vertices(&mut self, now: f64, region: &mut VertexRegion) -> bool {
        let pending = self.state.advance(now);
        self.refresh_vertices(region);
        pending
    }
}

/// All zone blocks of both sides, fixed for the scene's lifetime.
pub struct FieldBlocks {
    sides: [[FieldBlock; ZONE_BLOCKS]; 2],
}

impl FieldBlocks {
    /// Builds the near side from `layout` and mirrors it onto the far side.
    pub fn new(layout: &dyn LayoutSource, assets: &dyn AssetProvider) -> Self {
        let near: [FieldBlock; ZONE_BLOCKS] = std::array::from_fn(|i| {
            let (layout_name, texture_name) = BLOCK_NAMES[i];
            FieldBlock::new(
                i,
                &layout_rect_or_default(layout, layout_name),
                assets.texture(SheetKind::Field, texture_name),
            )
        });
        let far = std::array::from_fn(|i| near[i].mirrored(i + ZONE_BLOCKS));
        log::debug!("initialized {} zone blocks", ZONE_BLOCKS * 2);
        Self { sides: [near, far] }
    }

    /// Re-geometries every block from `layout`, keeping animated state.
    pub fn relayout(&mut self, layout: &dyn LayoutSource, assets: &dyn AssetProvider) {
        let [near, far] = &mut self.sides;
        for (i, (block, mirror)) in near.iter_mut().zip(far.iter_mut()).enumerate() {
            let (layout_name, texture_name) = BLOCK_NAMES[i];
            let rect = layout_rect_or_default(layout, layout_name);
            let region = assets.texture(SheetKind::Field, texture_name);
            block.init(i, &rect, region);
            mirror.state.vertex = block.state.vertex.iter().map(|v| -*v).collect();
            mirror.state.texcoord = block.state.texcoord.clone();
        }
    }

    pub fn get(&self, id: BlockId) -> Option<&FieldBlock> {
        self.sides[id.side.index()].get(id.index)
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut FieldBlock> {
        self.sides[id.side.index()].get_mut(id.index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &FieldBlock)> {
        Side::BOTH.into_iter().flat_map(move |side| {
            self.sides[side.index()]
                .iter()
                .enumerate()
                .map(move |(i, block)| (BlockId::new(side, i), block))
        })
    }

    /// First block containing the field point, scanning near then far.
    pub fn hit(&self, point: Vec2) -> Option<BlockId> {
        self.iter()
            .find(|(_, block)| block.check_inside(point.x, point.y))
            .map(|(id, _)| id)
    }

    pub fn refresh_all(&self, region: &mut VertexRegion) {
        for (_, block) in self.iter() {
            block.refresh_vertices(region);
        }
    }
}

impl ObjectStore<BlockId> for FieldBlocks {
    fn resolve(&mut self, key: BlockId) -> Option<&mut dyn FieldObject> {
        self.get_mut(key).map(|b| b as &mut dyn FieldObject)
    }
}
