use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec2, Vec3};

use crate::animator::{Animator, Easing};
use crate::assets::TextureRegion;
use crate::buffers::{CARD_VERTICES, VertexRegion};
use crate::cards::{CardKey, CardPosition};
use crate::layout::LayoutRect;

use super::{FieldObject, ObjectState};

/// Icon height above the card face, so it never z-fights the front quad.
const ICON_LIFT: f32 = 0.002;

/// Card and icon rectangles, both relative to the card's origin.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct CardGeometry {
    pub card: LayoutRect,
    pub icon: LayoutRect,
}

/// Texture regions for the three card quads.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct CardFaces {
    pub front: TextureRegion,
    pub back: TextureRegion,
    pub icon: TextureRegion,
}

/// Where a card settles: translation, rotation about the field normal, and
/// flip about the card's own vertical axis (`π` shows the back).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct RestPose {
    pub translation: Vec3,
    pub rotation: f32,
    pub flip: f32,
}

/// A card on the field: front, back and icon quads in card-local space,
/// placed in the world by animated translation, rotation and flip.
#[derive(Debug, Clone)]
pub struct FieldCard {
    state: ObjectState,
    key: CardKey,
    code: u32,
    position: CardPosition,
    translation: Animator<Vec3>,
    rotation: Animator<f32>,
    flip: Animator<f32>,
}

impl FieldCard {
    pub fn new(
        vertex_index: usize,
        key: CardKey,
        code: u32,
        position: CardPosition,
        geometry: &CardGeometry,
        faces: &CardFaces,
    ) -> Self {
        let mut card = Self {
            state: ObjectState::new(vertex_index, CARD_VERTICES),
            key,
            code,
            position,
            translation: Animator::new(Vec3::ZERO),
            rotation: Animator::new(0.0),
            flip: Animator::new(0.0),
        };
        card.init(geometry, faces);
        card
    }

    pub fn init(&mut self, geometry: &CardGeometry, faces: &CardFaces) {
        self.set_geometry(geometry);
        self.set_faces(faces);
    }

    /// Rebuilds the local quads; UVs are kept. The back quad lists its
    /// corners mirrored so it faces the other way, and with back-face culling
    /// exactly one face shows.
    pub fn set_geometry(&mut self, geometry: &CardGeometry) {
        let card = LayoutRect {
            center: Vec2::ZERO,
            size: geometry.card.size,
        };
        let [tl, tr, bl, br] = card.corners(0.0);
        let icon = geometry.icon.corners(ICON_LIFT);

        let vertex = &mut self.state.vertex;
        vertex.clear();
        vertex.extend([tl, tr, bl, br]);
        vertex.extend([tr, tl, br, bl]);
        vertex.extend(icon);
    }

    pub fn set_faces(&mut self, faces: &CardFaces) {
        let texcoord = &mut self.state.texcoord;
        texcoord.clear();
        texcoord.extend(faces.front.uv);
        texcoord.extend(faces.back.uv);
        texcoord.extend(faces.icon.uv);
    }

    /// Replaces the front face, e.g. when a face-down card is revealed.
    pub fn set_front(&mut self, code: u32, front: TextureRegion) {
        self.code = code;
        self.state.texcoord[..4].copy_from_slice(&front.uv);
    }

    pub fn key(&self) -> CardKey {
        self.key
    }

    pub(crate) fn set_key(&mut self, key: CardKey) {
        self.key = key;
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn position(&self) -> CardPosition {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: CardPosition) {
        self.position = position;
    }

    pub fn translation(&self) -> Vec3 {
        self.translation.get()
    }

    pub fn rotation(&self) -> f32 {
        self.rotation.get()
    }

    pub fn flip(&self) -> f32 {
        self.flip.get()
    }


    /// Starts travel toward `pose` at `now`. Rotation turns the short way
    /// round, so the stored angle may differ from `pose.rotation` by whole
    /// turns.
    pub fn move_to(&mut self, pose: RestPose, now: f64, duration: f64) {
        self.translation
            .set_target(pose.translation, now, duration, Easing::EaseOut);
        let from = self.rotation.get();
        let rotation = from + shortest_turn(from, pose.rotation);
        self.rotation
            .set_target(rotation, now, duration, Easing::EaseOut);
        self.flip.set_target(pose.flip, now, duration, Easing::EaseOut);
    }

    /// Jumps to `pose`, cancelling any travel.
    pub fn snap_to(&mut self, pose: RestPose) {
        self.translation.reset(pose.translation);
        self.rotation.reset(pose.rotation);
        self.flip.reset(pose.flip);
    }

    /// Local-to-field transform for the current animated pose.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_translation(self.translation.get())
            * Mat4::from_rotation_z(self.rotation.get())
            * Mat4::from_rotation_y(self.flip.get())
    }

    /// Vertices in field coordinates, in slot order.
    pub fn world_vertices(&self) -> Vec<Vec3> {
        let m = self.transform();
        self.state
            .vertex
            .iter()
            .map(|v| m.transform_point3(*v))
            .collect()
    }
}

/// Signed angle from `from` to `to`, in `(-π, π]`.
fn shortest_turn(from: f32, to: f32) -> f32 {
    let delta = (to - from).rem_euclid(TAU);
    if delta > PI { delta - TAU } else { delta }
}

impl FieldObject for FieldCard {
    fn state(&self) -> &ObjectState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ObjectState {
        &mut self.state
    }

    fn refresh_vertices(&self, region: &mut VertexRegion) {
        let vertices = self.state.pack(self.world_vertices());
        region.write(self.state.vertex_index, &vertices);
    }

    fn update_vertices(&mut self, now: f64, region: &mut VertexRegion) -> bool {
        let mut pending = self.state.advance(now);
        self.translation.update(now);
        self.rotation.update(now);
        self.flip.update(now);
        pending |= self.translation.needs_update()
            || self.rotation.needs_update()
            || self.flip.needs_update();
        self.refresh_vertices(region);
        pending
    }

    /// Tests against the front quad after undoing translation and rotation.
    fn check_inside(&self, x: f32, y: f32) -> bool {
        let local = Vec2::from_angle(-self.rotation.get())
            .rotate(Vec2::new(x, y) - self.translation.get().truncate());
        let v = &self.state.vertex;
        let (lo, hi) = (v[2].truncate(), v[1].truncate());
        local.x >= lo.x && local.x <= hi.x && local.y >= lo.y && local.y <= hi.y
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::cards::{CardZone, Side};

    fn geometry() -> CardGeometry {
        CardGeometry {
            card: LayoutRect::new(0.0, 0.0, 2.0, 4.0),
            icon: LayoutRect::new(0.5, -1.5, 0.5, 0.5),
        }
    }

    fn faces() -> CardFaces {
        CardFaces {
            front: TextureRegion::from_rect(0.0, 0.0, 0.5, 0.5),
            back: TextureRegion::from_rect(0.5, 0.0, 1.0, 0.5),
            icon: TextureRegion::from_rect(0.0, 0.5, 0.1, 0.6),
        }
    }

    fn card(slot: usize) -> FieldCard {
        FieldCard::new(
            slot,
            CardKey::new(Side::Near, CardZone::Monster, 0, 0),
            42,
            CardPosition::FaceUpAttack,
            &geometry(),
            &faces(),
        )
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    fn facing_up(a: Vec3, b: Vec3, c: Vec3) -> bool {
        (b - a).cross(c - a).z > 0.0
    }

    // ── geometry ─────────────────────────────────────────────────────────

    #[test]
    fn twelve_vertices_with_back_mirrored() {
        let c = card(0);
        let v = &c.state().vertex;
        assert_eq!(v.len(), CARD_VERTICES);
        assert_eq!(v[4], v[1]);
        assert_eq!(v[5], v[0]);
        assert!(v[8..].iter().all(|p| p.z == ICON_LIFT));
    }

    #[test]
    fn flip_swaps_which_face_points_up() {
        // Triangle (0, 2, 1) of each quad, matching the index buffer.
        let mut c = card(0);
        let w = c.world_vertices();
        assert!(facing_up(w[0], w[2], w[1]));
        assert!(!facing_up(w[4], w[6], w[5]));

        c.snap_to(RestPose {
            flip: PI,
            ..RestPose::default()
        });
        let w = c.world_vertices();
        assert!(!facing_up(w[0], w[2], w[1]));
        assert!(facing_up(w[4], w[6], w[5]));
    }

    // ── animation ────────────────────────────────────────────────────────

    #[test]
    fn movement_reaches_geometry() {
        let mut c = card(1);
        let mut region = VertexRegion::new("cards", CARD_VERTICES, 2);
        c.move_to(
            RestPose {
                translation: Vec3::new(3.0, 1.0, 0.0),
                rotation: FRAC_PI_2,
                flip: 0.0,
            },
            0.0,
            1.0,
        );

        assert!(c.update_vertices(0.5, &mut region));
        assert!(!c.update_vertices(1.0, &mut region));

        // Top-left (-1, 2) rotated a quarter turn lands at (-2, -1), then shifts.
        let written = Vec3::from_array(region.slot(1)[0].position);
        assert!(close(written, Vec3::new(1.0, 0.0, 0.0)), "{written:?}");
        assert!(region.slot(0).iter().all(|v| v.position == [0.0; 3]));
    }

    #[test]
    fn rotation_takes_the_short_way_round() {
        let mut c = card(0);
        let mut region = VertexRegion::new("cards", CARD_VERTICES, 1);
        c.snap_to(RestPose {
            rotation: 3.0 * FRAC_PI_2,
            ..RestPose::default()
        });
        c.move_to(RestPose::default(), 0.0, 1.0);

        // A quarter turn forward, never back through π.
        for step in 1..=10 {
            c.update_vertices(step as f64 / 10.0, &mut region);
            let r = c.rotation();
            assert!((3.0 * FRAC_PI_2..=TAU + 1e-5).contains(&r), "{r}");
        }
        assert!((c.rotation() - TAU).abs() < 1e-5);
    }

    #[test]
    fn shortest_turn_stays_within_half_a_turn() {
        assert!((shortest_turn(0.0, 3.0 * FRAC_PI_2) + FRAC_PI_2).abs() < 1e-5);
        assert!(shortest_turn(PI, -PI).abs() < 1e-5);
        assert!((shortest_turn(0.0, PI) - PI).abs() < 1e-5);
        assert!((shortest_turn(5.0 * TAU, 0.25) - 0.25).abs() < 1e-4);
    }

    #[test]
    fn check_inside_follows_the_card() {
        let mut c = card(0);
        c.snap_to(RestPose {
            translation: Vec3::new(5.0, 0.0, 0.0),
            rotation: FRAC_PI_2,
            flip: 0.0,
        });
        // Rotated, the card spans 4 wide and 2 tall around (5, 0).
        assert!(c.check_inside(6.9, 0.5));
        assert!(!c.check_inside(5.0, 1.5));
        assert!(!c.check_inside(0.0, 0.0));
    }

    #[test]
    fn reveal_replaces_only_the_front() {
        let mut c = card(0);
        let back = c.state().texcoord[4..8].to_vec();
        c.set_front(7, TextureRegion::from_rect(0.2, 0.2, 0.3, 0.3));
        assert_eq!(c.code(), 7);
        assert_eq!(c.state().texcoord[0], Vec2::new(0.2, 0.2));
        assert_eq!(c.state().texcoord[4..8], back[..]);
    }
}
