//! The duel scene: owns blocks, cards, camera and vertex regions, and drives
//! the per-frame command intake and animation update.

mod input;
mod pose;

use crate::animator::Easing;
use crate::assets::{
    AssetProvider, SheetKind, TextureFetcher, TextureRegion, TextureRequest, UNKNOWN_CARD,
};
use crate::buffers::{MISC_SLOTS, SceneBuffers};
use crate::camera::Camera;
use crate::cards::{CardArena, CardId, CardKey, CardPosition, CardZone, Side};
use crate::command::{CommandQueue, DuelCommand};
use crate::config::SceneConfig;
use crate::error::SceneError;
use crate::field::{
    BlockId, CardFaces, CardGeometry, FieldBlocks, FieldCard, FieldObject, RestPose, Worklist,
    layout_rect_or_default,
};
use crate::layout::{CARD_LAYOUT, HAND_LAYOUT, ICON_LAYOUT, LayoutRect, LayoutSource};
use crate::vertex::FieldVertex;

use self::input::PointerState;
use self::pose::{PoseContext, rest_pose};

pub const BACKGROUND_TEXTURE: &str = "background";
pub const ICON_TEXTURE: &str = "icon";
/// Card back per side, indexed by [`Side::index`].
pub const SLEEVE_TEXTURES: [&str; 2] = ["sleeve1", "sleeve2"];

/// Markers float just above the blocks they cover.
const MARKER_LIFT: f32 = 0.005;

/// Result of a hover query: 1-based side and block index, or `(0, 0)`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct HoverPos {
    pub side: u8,
    pub zone: u8,
}

impl HoverPos {
    pub const NONE: HoverPos = HoverPos { side: 0, zone: 0 };

    pub fn from_block(id: BlockId) -> Self {
        Self {
            side: id.side.number(),
            zone: id.index as u8,
        }
    }

    pub fn block(self) -> Option<BlockId> {
        Side::from_number(self.side).map(|side| BlockId::new(side, self.zone as usize))
    }

    pub fn is_hit(self) -> bool {
        self != Self::NONE
    }
}

#[derive(Debug, Clone)]
struct Marker {
    block: BlockId,
    texture: String,
}

pub struct DuelScene {
    config: SceneConfig,
    camera: Camera,

    layout: Box<dyn LayoutSource>,
    assets: Box<dyn AssetProvider>,
    fetcher: Option<TextureFetcher>,

    blocks: FieldBlocks,
    cards: CardArena,
    card_geometry: CardGeometry,
    hand_row: LayoutRect,
    markers: Vec<Option<Marker>>,

    buffers: SceneBuffers,
    block_work: Worklist<BlockId>,
    card_work: Worklist<CardId>,
    commands: CommandQueue,

    update_bg: bool,
    hovered: Option<BlockId>,
    pointer: PointerState,
    /// Timestamp of the latest `update`; input-driven animations start here.
    now: f64,
}

impl DuelScene {
    pub fn new(
        config: SceneConfig,
        layout: impl LayoutSource + 'static,
        assets: impl AssetProvider + 'static,
    ) -> Self {
        let layout: Box<dyn LayoutSource> = Box::new(layout);
        let assets: Box<dyn AssetProvider> = Box::new(assets);

        let (width, height) = config.scene_size;
        let camera = Camera::new(&config.camera, width, height);
        let blocks = FieldBlocks::new(layout.as_ref(), assets.as_ref());
        let buffers = SceneBuffers::new(config.card_capacity);
        let cards = CardArena::new(buffers.cards.slots());

        let mut scene = Self {
            config,
            camera,
            layout,
            assets,
            fetcher: None,
            blocks,
            cards,
            card_geometry: CardGeometry::default(),
            hand_row: LayoutRect::default(),
            markers: vec![None; MISC_SLOTS],
            buffers,
            block_work: Worklist::new(),
            card_work: Worklist::new(),
            commands: CommandQueue::new(),
            update_bg: true,
            hovered: None,
            pointer: PointerState::default(),
            now: 0.0,
        };
        scene.init_field();
        scene
    }

    /// Writes every block and reads card geometry from the layout.
    fn init_field(&mut self) {
        self.load_card_geometry();
        self.blocks.refresh_all(&mut self.buffers.field);
        self.buffers.misc.clear_all();
        self.update_bg = true;
        log::debug!(
            "duel field ready: {} card slots, scene {:?}",
            self.cards.capacity(),
            self.config.scene_size
        );
    }

    fn load_card_geometry(&mut self) {
        let layout = self.layout.as_ref();
        self.card_geometry = CardGeometry {
            card: layout_rect_or_default(layout, CARD_LAYOUT),
            icon: layout_rect_or_default(layout, ICON_LAYOUT),
        };
        self.hand_row = layout_rect_or_default(layout, HAND_LAYOUT);
    }

    /// Re-reads the layout: blocks keep their animated state, cards snap to
    /// their new rest poses.
    pub fn reload_layout(&mut self) {
        self.blocks.relayout(self.layout.as_ref(), self.assets.as_ref());
        self.blocks.refresh_all(&mut self.buffers.field);
        self.load_card_geometry();

        for id in self.cards.ids() {
            let pose = self.pose_for(id);
            if let Some(card) = self.cards.get_mut(id) {
                card.set_geometry(&self.card_geometry);
                card.snap_to(pose);
                card.refresh_vertices(&mut self.buffers.cards);
            }
        }
        for slot in 0..self.markers.len() {
            self.write_marker(slot);
        }
        log::debug!("layout reloaded");
    }

    /// Replaces the layout source and re-geometries everything from it.
    pub fn set_layout(&mut self, layout: impl LayoutSource + 'static) {
        self.layout = Box::new(layout);
        self.reload_layout();
    }

    pub fn set_scene_size(&mut self, width: f32, height: f32) {
        self.config.scene_size = (width, height);
        self.camera.set_viewport(width, height);
    }

    // ── per frame ────────────────────────────────────────────────────────

    /// Advances the scene to `now` (seconds on the game clock).
    ///
    /// Merges finished texture fetches, handles at most one command, refreshes
    /// the background if flagged, then updates every animating object.
    /// Camera-derived state is recomputed by each camera setter, so it is
    /// already current here.
    pub fn update(&mut self, now: f64) {
        self.now = now;
        self.merge_fetched();

        if let Some(mut command) = self.commands.pull()
            && !command.handle(self, now)
        {
            self.commands.restore(command);
        }

        if self.update_bg {
            self.refresh_background();
        }

        self.block_work
            .advance(&mut self.blocks, now, &mut self.buffers.field);
        self.card_work
            .advance(&mut self.cards, now, &mut self.buffers.cards);

        log::trace!(
            "frame {now:.3}: {} blocks, {} cards animating",
            self.block_work.len(),
            self.card_work.len()
        );
    }

    fn merge_fetched(&mut self) {
        let Some(fetcher) = self.fetcher.as_mut() else {
            return;
        };
        for fetched in fetcher.drain() {
            if fetched.sheet == SheetKind::Background {
                self.update_bg = true;
            }
            self.assets.apply_fetched(fetched);
        }
    }

    fn refresh_background(&mut self) {
        let region = self.assets.texture(SheetKind::Background, BACKGROUND_TEXTURE);
        // Full-screen quad in clip space.
        let corners = LayoutRect::new(0.0, 0.0, 2.0, 2.0).corners(0.0);
        let vertices: Vec<FieldVertex> = corners
            .into_iter()
            .zip(region.uv)
            .map(|(p, uv)| FieldVertex::new(p, uv, 1.0, 0.0))
            .collect();
        self.buffers.background.write(0, &vertices);
        self.update_bg = false;
    }

    /// Rewrites the background quad on the next update.
    pub fn invalidate_background(&mut self) {
        self.update_bg = true;
    }

    // ── cards ────────────────────────────────────────────────────────────

    /// Places a new card at `key`, fading it in. Fails without touching any
    /// existing card when the address is taken or every slot is live.
    pub fn add_card(&mut self, key: CardKey, code: u32, now: f64) -> Result<CardId, SceneError> {
        if self.cards.id(&key).is_some() {
            return Err(SceneError::Occupied(key));
        }
        if !is_placeable(&key) {
            return Err(SceneError::InvalidKey(key));
        }
        let slot = self.cards.allocate_slot().inspect_err(|e| {
            log::error!("cannot add card {code} at {key}: {e}");
        })?;

        let faces = self.card_faces(key.side, code);
        let position = CardPosition::default_for(&key);
        let mut card = FieldCard::new(slot, key, code, position, &self.card_geometry, &faces);
        card.state_mut().alpha.reset(0.0);
        card.state_mut()
            .alpha
            .set_target(1.0, now, self.config.fade_duration, Easing::Linear);

        let id = match self.cards.insert(card) {
            Ok(id) => id,
            Err(e) => {
                self.cards.release_slot(slot);
                return Err(e);
            }
        };

        let pose = self.pose_for(id);
        if let Some(card) = self.cards.get_mut(id) {
            card.snap_to(pose);
            card.refresh_vertices(&mut self.buffers.cards);
            self.card_work.enroll(id, card);
        }
        if key.zone == CardZone::Hand {
            self.repose_hand(key.side, now);
        }

        log::debug!("added card {code} at {key} (slot {slot})");
        Ok(id)
    }

    pub fn get_card(&self, key: &CardKey) -> Option<&FieldCard> {
        self.cards.by_key(key)
    }

    pub fn card_id(&self, key: &CardKey) -> Option<CardId> {
        self.cards.id(key)
    }

    pub fn card(&self, id: CardId) -> Option<&FieldCard> {
        self.cards.get(id)
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    /// Removes the card immediately, blanking its slot for reuse.
    pub fn remove_card(&mut self, key: &CardKey) -> Result<FieldCard, SceneError> {
        let card = self.cards.remove(key).ok_or(SceneError::NoCard(*key))?;
        self.buffers.cards.clear_slot(card.state().vertex_index);
        if key.zone == CardZone::Hand {
            self.repose_hand(key.side, self.now);
        }
        log::debug!("removed card {} from {key}", card.code());
        Ok(card)
    }

    /// Readdresses a card and animates it to the destination's rest pose.
    ///
    /// Crossing into another zone or side adopts the destination's default
    /// position; hands on either end are re-spread.
    pub fn move_card(
        &mut self,
        from: &CardKey,
        to: CardKey,
        now: f64,
    ) -> Result<CardId, SceneError> {
        if !is_placeable(&to) {
            return Err(SceneError::InvalidKey(to));
        }
        let id = self.cards.rekey(from, to)?;
        if (from.zone, from.side) != (to.zone, to.side)
            && let Some(card) = self.cards.get_mut(id)
        {
            card.set_position(CardPosition::default_for(&to));
        }

        self.animate_to_rest(id, now);
        if from.zone == CardZone::Hand {
            self.repose_hand(from.side, now);
        }
        if to.zone == CardZone::Hand && (to.side, to.zone) != (from.side, from.zone) {
            self.repose_hand(to.side, now);
        }

        log::debug!("moving card from {from} to {to}");
        Ok(id)
    }

    /// Turns a card to `position`, animating the flip and rotation.
    pub fn set_card_position(
        &mut self,
        key: &CardKey,
        position: CardPosition,
        now: f64,
    ) -> Result<(), SceneError> {
        let id = self.cards.id(key).ok_or(SceneError::NoCard(*key))?;
        if let Some(card) = self.cards.get_mut(id) {
            card.set_position(position);
        }
        self.animate_to_rest(id, now);
        Ok(())
    }

    /// Replaces a card's face, e.g. when a hidden card is revealed.
    pub fn set_card_code(&mut self, key: &CardKey, code: u32) -> Result<(), SceneError> {
        let id = self.cards.id(key).ok_or(SceneError::NoCard(*key))?;
        let front = self.front_face(code);
        if let Some(card) = self.cards.get_mut(id) {
            card.set_front(code, front);
            card.refresh_vertices(&mut self.buffers.cards);
        }
        Ok(())
    }

    /// Starts fading a card to transparent; the card stays until removed.
    pub fn fade_out_card(&mut self, key: &CardKey, now: f64) -> Result<CardId, SceneError> {
        let id = self.cards.id(key).ok_or(SceneError::NoCard(*key))?;
        if let Some(card) = self.cards.get_mut(id) {
            card.state_mut()
                .alpha
                .set_target(0.0, now, self.config.fade_duration, Easing::Linear);
            self.card_work.enroll(id, card);
        }
        Ok(id)
    }

    /// True while the card has unsettled animations. False for stale handles.
    pub fn is_card_animating(&self, id: CardId) -> bool {
        self.cards.get(id).is_some_and(|c| c.state().updating)
    }

    /// Drops every card and the provider's per-duel card textures. Blocks stay.
    pub fn clear_field(&mut self) {
        let count = self.cards.len();
        self.cards.clear();
        self.card_work.clear();
        self.buffers.cards.clear_all();
        self.clear_markers();
        self.assets.release_card_textures();
        log::debug!("field cleared ({count} cards)");
    }

    fn animate_to_rest(&mut self, id: CardId, now: f64) {
        let pose = self.pose_for(id);
        let duration = self.config.move_duration;
        if let Some(card) = self.cards.get_mut(id) {
            card.move_to(pose, now, duration);
            self.card_work.enroll(id, card);
        }
    }

    fn repose_hand(&mut self, side: Side, now: f64) {
        for id in self.cards.hand(side) {
            self.animate_to_rest(id, now);
        }
    }

    fn pose_for(&self, id: CardId) -> RestPose {
        let Some(card) = self.cards.get(id) else {
            return RestPose::default();
        };
        let key = card.key();
        let hand_slot = (key.zone == CardZone::Hand).then(|| {
            let hand = self.cards.hand(key.side);
            let index = hand.iter().position(|h| *h == id).unwrap_or(0);
            (index, hand.len())
        });
        let ctx = PoseContext {
            blocks: &self.blocks,
            hand: self.hand_row,
            card: self.card_geometry.card,
        };
        rest_pose(&ctx, &key, card.position(), hand_slot)
    }

    fn card_faces(&mut self, side: Side, code: u32) -> CardFaces {
        CardFaces {
            front: self.front_face(code),
            back: self
                .assets
                .texture(SheetKind::Card, SLEEVE_TEXTURES[side.index()]),
            icon: self.assets.texture(SheetKind::Card, ICON_TEXTURE),
        }
    }

    fn front_face(&mut self, code: u32) -> TextureRegion {
        if code == 0 {
            self.assets.texture(SheetKind::Card, UNKNOWN_CARD)
        } else {
            self.assets.card_texture(code)
        }
    }

    // ── blocks and markers ───────────────────────────────────────────────

    /// Sets a block's resting highlight. While hovered, the pulse wins until
    /// the pointer leaves.
    pub fn set_block_highlight(&mut self, id: BlockId, intensity: f32, now: f64) {
        let fade = self.config.fade_duration;
        let hovered = self.hovered == Some(id);
        let Some(block) = self.blocks.get_mut(id) else {
            return;
        };
        block.set_base_highlight(intensity);
        if !hovered {
            let target = block.base_highlight();
            block
                .state_mut()
                .hl
                .set_target(target, now, fade, Easing::Linear);
            self.block_work.enroll(id, block);
        }
    }

    /// Places a marker quad textured with `texture` (field sheet) over `block`.
    pub fn set_marker(&mut self, slot: usize, block: BlockId, texture: &str) -> bool {
        if slot >= self.markers.len() || self.blocks.get(block).is_none() {
            log::warn!("marker slot {slot} on {block:?} is out of range");
            return false;
        }
        self.markers[slot] = Some(Marker {
            block,
            texture: texture.to_string(),
        });
        self.write_marker(slot);
        true
    }

    pub fn clear_marker(&mut self, slot: usize) {
        if let Some(marker) = self.markers.get_mut(slot) {
            *marker = None;
            self.buffers.misc.clear_slot(slot);
        }
    }

    pub fn clear_markers(&mut self) {
        self.markers.fill(None);
        self.buffers.misc.clear_all();
    }

    pub fn marker_count(&self) -> usize {
        self.markers.iter().flatten().count()
    }

    fn write_marker(&mut self, slot: usize) {
        let Some(Some(marker)) = self.markers.get(slot) else {
            return;
        };
        let Some(block) = self.blocks.get(marker.block) else {
            return;
        };
        let region = self.assets.texture(SheetKind::Field, &marker.texture);
        let vertices: Vec<FieldVertex> = block
            .state()
            .vertex
            .iter()
            .zip(region.uv)
            .map(|(v, uv)| FieldVertex::new(v.truncate().extend(MARKER_LIFT), uv, 1.0, 0.0))
            .collect();
        self.buffers.misc.write(slot, &vertices);
    }

    // ── picking ──────────────────────────────────────────────────────────

    /// Block under pixel `(x, y)`, or [`HoverPos::NONE`].
    ///
    /// Cards are not hit-tested; callers resolve them from the zone.
    pub fn hover_pos(&self, x: f32, y: f32) -> HoverPos {
        self.camera
            .unproject_ground(x, y)
            .and_then(|point| self.blocks.hit(point))
            .map(HoverPos::from_block)
            .unwrap_or(HoverPos::NONE)
    }

    pub fn hovered(&self) -> Option<BlockId> {
        self.hovered
    }

    // ── collaborators ────────────────────────────────────────────────────

    pub fn commands(&self) -> &CommandQueue {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut CommandQueue {
        &mut self.commands
    }

    pub fn push_command(&mut self, command: impl DuelCommand + 'static) {
        self.commands.push(command);
    }

    pub fn assets(&self) -> &dyn AssetProvider {
        self.assets.as_ref()
    }

    pub fn assets_mut(&mut self) -> &mut dyn AssetProvider {
        self.assets.as_mut()
    }

    /// Routes texture fetches through `fetcher`; results merge at the next update.
    pub fn attach_fetcher(&mut self, fetcher: TextureFetcher) {
        self.fetcher = Some(fetcher);
    }

    pub fn request_texture(&mut self, request: TextureRequest) -> bool {
        match self.fetcher.as_mut() {
            Some(fetcher) => {
                fetcher.request(request);
                true
            }
            None => {
                log::warn!("no texture fetcher attached; {} stays as is", request.region);
                false
            }
        }
    }

    pub fn pending_textures(&self) -> usize {
        self.fetcher.as_ref().map_or(0, TextureFetcher::in_flight)
    }

    // ── state ────────────────────────────────────────────────────────────

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn blocks(&self) -> &FieldBlocks {
        &self.blocks
    }

    pub fn buffers(&self) -> &SceneBuffers {
        &self.buffers
    }

    pub fn buffers_mut(&mut self) -> &mut SceneBuffers {
        &mut self.buffers
    }

    /// Highest card slot handed out so far. Freed slots below it are blank.
    pub fn card_slots_in_use(&self) -> usize {
        self.cards.high_water()
    }

    /// Slots of live cards, back to front: lowest height above the field
    /// first, slot order among equals. Cards have no depth test, so this is
    /// the order they must be drawn in.
    pub fn card_draw_order(&self) -> Vec<usize> {
        let mut order: Vec<(f32, usize)> = self
            .cards
            .iter()
            .map(|(_, card)| (card.translation().z, card.state().vertex_index))
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        order.into_iter().map(|(_, slot)| slot).collect()
    }

    /// Nothing animating and no commands pending.
    pub fn is_idle(&self) -> bool {
        self.block_work.is_empty() && self.card_work.is_empty() && self.commands.is_empty()
    }
}

fn is_placeable(key: &CardKey) -> bool {
    key.zone == CardZone::Hand || key.zone.block_index(key.sequence).is_some()
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use glam::{Vec2, Vec3};

    use super::*;
    use crate::buffers::CARD_VERTICES;
    use crate::config::CameraConfig;
    use crate::layout::{FieldLayout, MONSTER_BLOCK, ZONE_BLOCKS};
    use crate::testing::StubAssets;

    fn scene_with(config: SceneConfig) -> (DuelScene, StubAssets) {
        let assets = StubAssets::default();
        let scene = DuelScene::new(config, FieldLayout::default(), assets.clone());
        (scene, assets)
    }

    fn scene() -> DuelScene {
        scene_with(SceneConfig::default()).0
    }

    fn monster(side: Side, seq: u32) -> CardKey {
        CardKey::new(side, CardZone::Monster, seq, 0)
    }

    fn settle(scene: &mut DuelScene, from: f64) -> f64 {
        let mut now = from;
        while !scene.is_idle() && now < from + 10.0 {
            now += 0.05;
            scene.update(now);
        }
        now
    }

    fn slot_of(scene: &DuelScene, key: &CardKey) -> usize {
        scene.get_card(key).unwrap().state().vertex_index
    }

    // ── picking ──────────────────────────────────────────────────────────

    #[test]
    fn top_down_pick_of_first_monster_zone() {
        let mut config = SceneConfig::default();
        config.scene_size = (1024.0, 640.0);
        config.camera = CameraConfig {
            radius: 10.0,
            angle: FRAC_PI_2,
            ..CameraConfig::default()
        };
        let (scene, _) = scene_with(config);

        let center = scene
            .blocks()
            .get(BlockId::new(Side::Near, MONSTER_BLOCK))
            .unwrap()
            .center();
        let pixel = scene.camera().project(center.extend(0.0)).unwrap();
        assert_eq!(
            scene.hover_pos(pixel.x, pixel.y),
            HoverPos { side: 1, zone: 0 }
        );
    }

    #[test]
    fn tilted_pick_round_trips_every_block() {
        let mut config = SceneConfig::default();
        config.camera.angle = 0.5;
        let (scene, _) = scene_with(config);

        for (id, block) in scene.blocks().iter() {
            let Some(pixel) = scene.camera().project(block.center().extend(0.0)) else {
                continue;
            };
            assert_eq!(scene.hover_pos(pixel.x, pixel.y), HoverPos::from_block(id));
        }
    }

    #[test]
    fn far_outside_is_no_hit() {
        let scene = scene();
        assert_eq!(scene.hover_pos(-50_000.0, 90_000.0), HoverPos::NONE);
        assert_eq!(scene.hover_pos(1e7, -1e7), HoverPos::NONE);
        assert!(HoverPos::NONE.block().is_none());
    }

    // ── cards ────────────────────────────────────────────────────────────

    #[test]
    fn add_writes_slot_and_fades_in() {
        let mut scene = scene();
        let key = monster(Side::Near, 1);
        scene.add_card(key, 77, 0.0).unwrap();

        let slot = scene.buffers().cards.slot(0).to_vec();
        assert_eq!(slot.len(), CARD_VERTICES);
        assert_eq!(slot[0].alpha(), 0.0);
        assert_ne!(slot[0].position, [0.0; 3]);

        settle(&mut scene, 0.0);
        assert_eq!(scene.buffers().cards.slot(0)[0].alpha(), 1.0);
        assert_eq!(
            scene.add_card(key, 1, 1.0),
            Err(SceneError::Occupied(key))
        );
    }

    #[test]
    fn removed_slot_is_reused_without_touching_others() {
        let mut scene = scene();
        let a = monster(Side::Near, 0);
        let b = monster(Side::Near, 1);
        let c = monster(Side::Far, 0);
        scene.add_card(a, 1, 0.0).unwrap();
        scene.add_card(b, 2, 0.0).unwrap();
        settle(&mut scene, 0.0);

        let b_slot = slot_of(&scene, &b);
        let b_before = scene.buffers().cards.slot(b_slot).to_vec();
        let a_slot = slot_of(&scene, &a);

        scene.remove_card(&a).unwrap();
        assert!(
            scene
                .buffers()
                .cards
                .slot(a_slot)
                .iter()
                .all(|v| *v == FieldVertex::default())
        );

        scene.add_card(c, 3, 1.0).unwrap();
        assert_eq!(slot_of(&scene, &c), a_slot);
        assert_eq!(scene.buffers().cards.slot(b_slot), &b_before[..]);
        assert_eq!(scene.card_slots_in_use(), 2);
    }

    #[test]
    fn overlays_draw_before_the_monster_they_sit_under() {
        let mut scene = scene();
        let monster_key = monster(Side::Near, 0);
        let overlay = CardKey::new(Side::Near, CardZone::Monster, 0, 1);
        let deck_top = CardKey::new(Side::Near, CardZone::Deck, 3, 0);
        scene.add_card(monster_key, 1, 0.0).unwrap();
        scene.add_card(overlay, 2, 0.0).unwrap();
        scene.add_card(deck_top, 3, 0.0).unwrap();

        let order = scene.card_draw_order();
        assert_eq!(
            order,
            vec![
                slot_of(&scene, &overlay),
                slot_of(&scene, &monster_key),
                slot_of(&scene, &deck_top),
            ]
        );

        scene.remove_card(&overlay).unwrap();
        assert_eq!(scene.card_draw_order().len(), 2);
    }

    #[test]
    fn capacity_exhaustion_leaves_cards_untouched() {
        let mut config = SceneConfig::default();
        config.card_capacity = 2;
        let (mut scene, _) = scene_with(config);
        scene.add_card(monster(Side::Near, 0), 1, 0.0).unwrap();
        scene.add_card(monster(Side::Near, 1), 2, 0.0).unwrap();
        settle(&mut scene, 0.0);
        let before = scene.buffers().cards.vertices().to_vec();

        let third = monster(Side::Near, 2);
        assert_eq!(
            scene.add_card(third, 3, 1.0),
            Err(SceneError::CardCapacity { capacity: 2 })
        );
        assert!(scene.get_card(&third).is_none());
        assert_eq!(scene.card_count(), 2);
        assert_eq!(scene.buffers().cards.vertices(), &before[..]);
    }

    #[test]
    fn invalid_addresses_are_rejected() {
        let mut scene = scene();
        let bad = monster(Side::Near, 7);
        assert_eq!(scene.add_card(bad, 1, 0.0), Err(SceneError::InvalidKey(bad)));
        assert_eq!(scene.card_slots_in_use(), 0);
    }

    #[test]
    fn move_animates_geometry_to_destination() {
        let mut scene = scene();
        let from = CardKey::new(Side::Near, CardZone::Deck, 0, 0);
        let to = monster(Side::Near, 4);
        scene.add_card(from, 5, 0.0).unwrap();
        settle(&mut scene, 0.0);

        let id = scene.move_card(&from, to, 1.0).unwrap();
        scene.update(1.0 + scene.config().move_duration * 0.5);
        assert!(scene.is_card_animating(id));
        settle(&mut scene, 1.2);

        let card = scene.get_card(&to).unwrap();
        let target = scene
            .blocks()
            .get(BlockId::new(Side::Near, MONSTER_BLOCK + 4))
            .unwrap()
            .center();
        assert_eq!(card.translation().truncate(), target);
        // Leaving the deck turns the card face up.
        assert_eq!(card.flip(), 0.0);
        assert!(card.position().is_face_up());

        let slot = card.state().vertex_index;
        let written: Vec3 = scene.buffers().cards.slot(slot)[..4]
            .iter()
            .map(|v| Vec3::from_array(v.position))
            .sum::<Vec3>()
            / 4.0;
        assert!((written.truncate() - target).length() < 1e-4);
    }

    #[test]
    fn hand_respreads_on_add_and_remove() {
        let mut scene = scene();
        let k0 = CardKey::new(Side::Near, CardZone::Hand, 0, 0);
        let k1 = CardKey::new(Side::Near, CardZone::Hand, 1, 0);
        scene.add_card(k0, 1, 0.0).unwrap();
        settle(&mut scene, 0.0);
        let alone = scene.get_card(&k0).unwrap().translation();

        scene.add_card(k1, 2, 1.0).unwrap();
        settle(&mut scene, 1.0);
        let shifted = scene.get_card(&k0).unwrap().translation();
        assert!(shifted.x < alone.x);

        scene.remove_card(&k1).unwrap();
        settle(&mut scene, 2.0);
        assert_eq!(scene.get_card(&k0).unwrap().translation(), alone);
    }

    #[test]
    fn clear_field_releases_textures_and_keeps_blocks() {
        let (mut scene, assets) = scene_with(SceneConfig::default());
        scene.add_card(monster(Side::Near, 0), 1, 0.0).unwrap();
        scene.set_marker(0, BlockId::new(Side::Near, 0), "target");
        let field_before = scene.buffers().field.vertices().to_vec();

        scene.clear_field();
        assert_eq!(scene.card_count(), 0);
        assert_eq!(scene.card_slots_in_use(), 0);
        assert_eq!(scene.marker_count(), 0);
        assert_eq!(assets.releases.get(), 1);
        assert_eq!(scene.buffers().field.vertices(), &field_before[..]);

        // A stale worklist entry must not resurrect anything.
        scene.update(0.1);
        assert!(scene.buffers().cards.vertices().iter().all(|v| *v == FieldVertex::default()));
    }

    #[test]
    fn unknown_code_uses_unknown_face_without_loading() {
        let (mut scene, assets) = scene_with(SceneConfig::default());
        scene.add_card(monster(Side::Near, 0), 0, 0.0).unwrap();
        assert_eq!(assets.card_requests.get(), 0);
        scene.set_card_code(&monster(Side::Near, 0), 12).unwrap();
        assert_eq!(assets.card_requests.get(), 1);
    }

    // ── blocks ───────────────────────────────────────────────────────────

    #[test]
    fn block_highlight_animates_field_slot() {
        let mut scene = scene();
        let id = BlockId::new(Side::Far, 3);
        scene.set_block_highlight(id, 1.0, 0.0);
        settle(&mut scene, 0.0);
        let slot = ZONE_BLOCKS + 3;
        assert_eq!(scene.buffers().field.slot(slot)[0].highlight(), 1.0);
        assert_eq!(scene.buffers().field.slot(3)[0].highlight(), 0.0);
    }

    #[test]
    fn markers_follow_their_block() {
        let mut scene = scene();
        let id = BlockId::new(Side::Near, 2);
        assert!(scene.set_marker(4, id, "target"));
        assert!(!scene.set_marker(MISC_SLOTS, id, "target"));

        let block = scene.blocks().get(id).unwrap().state().vertex.clone();
        let quad = scene.buffers().misc.slot(4);
        assert_eq!(quad[0].position[0], block[0].x);
        assert_eq!(quad[0].position[2], MARKER_LIFT);
    }

    #[test]
    fn background_is_written_on_first_update() {
        let mut scene = scene();
        assert_eq!(scene.buffers().background.slot(0)[0].position, [0.0; 3]);
        scene.update(0.0);
        assert_eq!(scene.buffers().background.slot(0)[0].position, [-1.0, 1.0, 0.0]);
        assert_eq!(
            scene.buffers().background.slot(0)[0].texcoord,
            StubAssets::region(SheetKind::Background).uv[0].to_array()
        );
    }

    #[test]
    fn reload_layout_moves_blocks_and_cards() {
        let mut scene = scene();
        let key = monster(Side::Near, 0);
        scene.add_card(key, 1, 0.0).unwrap();
        settle(&mut scene, 0.0);

        scene.set_layout(
            FieldLayout::default().with("mzone1", LayoutRect::new(-2.0, -1.0, 0.9, 1.1)),
        );
        let card = scene.get_card(&key).unwrap();
        assert!((card.translation().truncate() - Vec2::new(-2.0, -1.0)).length() < 1e-5);
    }
}
