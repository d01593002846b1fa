//! Pointer and keyboard handling: camera pan, tilt and zoom plus hover.

use std::f32::consts::FRAC_PI_2;

use duel_engine::input::{ButtonState, InputEvent, Key, MouseButton};
use glam::Vec2;

use crate::field::{BlockId, FieldObject};

use super::DuelScene;

/// Touchpad pixels per wheel notch.
const PIXELS_PER_LINE: f32 = 40.0;

/// Last pointer position and which drag buttons are held.
#[derive(Debug, Copy, Clone, Default)]
pub(crate) struct PointerState {
    position: Vec2,
    panning: bool,
    tilting: bool,
}

impl DuelScene {
    /// Dispatches a platform input event. Returns whether the scene used it.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerMoved { x, y } => {
                self.mouse_move(*x, *y);
                true
            }
            InputEvent::PointerButton(e) => match e.state {
                ButtonState::Pressed => self.mouse_button_down(e.button, e.x, e.y),
                ButtonState::Released => self.mouse_button_up(e.button),
            },
            InputEvent::MouseWheel { delta, .. } => {
                self.mouse_wheel(delta.lines_y(PIXELS_PER_LINE));
                true
            }
            InputEvent::Key {
                key,
                state: ButtonState::Pressed,
                repeat: false,
                ..
            } => self.key_down(*key),
            InputEvent::Key {
                key,
                state: ButtonState::Released,
                ..
            } => self.key_up(*key),
            InputEvent::PointerLeft => {
                self.pointer_left();
                true
            }
            _ => false,
        }
    }

    /// Drags the camera while a button is held, then updates hover.
    pub fn mouse_move(&mut self, x: f32, y: f32) {
        let position = Vec2::new(x, y);
        let delta = position - self.pointer.position;
        self.pointer.position = position;

        let view = self.camera.viewport();
        if self.pointer.panning {
            self.camera.pan_by(delta.x / view.x, -delta.y / view.y);
        }
        if self.pointer.tilting {
            let angle = self.camera.angle() + FRAC_PI_2 * delta.y / view.y;
            self.camera.set_angle(angle);
        }

        let hit = self.hover_pos(x, y).block();
        self.set_hover(hit);
    }

    /// Left starts a pan, right starts a tilt.
    pub fn mouse_button_down(&mut self, button: MouseButton, x: f32, y: f32) -> bool {
        self.pointer.position = Vec2::new(x, y);
        match button {
            MouseButton::Left => self.pointer.panning = true,
            MouseButton::Right => self.pointer.tilting = true,
            _ => return false,
        }
        true
    }

    pub fn mouse_button_up(&mut self, button: MouseButton) -> bool {
        match button {
            MouseButton::Left => self.pointer.panning = false,
            MouseButton::Right => self.pointer.tilting = false,
            _ => return false,
        }
        true
    }

    /// Zooms by `lines` wheel notches; positive moves closer.
    pub fn mouse_wheel(&mut self, lines: f32) {
        let radius = self.camera.radius() - lines * self.config.zoom_step;
        self.camera.set_radius(radius);
    }

    /// `R` resets the camera to its configured pose.
    pub fn key_down(&mut self, key: Key) -> bool {
        match key {
            Key::Char('R') => {
                self.camera.apply(&self.config.camera);
                log::debug!("camera reset");
                true
            }
            _ => false,
        }
    }

    pub fn key_up(&mut self, _key: Key) -> bool {
        false
    }

    /// Ends drags and clears hover.
    pub fn pointer_left(&mut self) {
        self.pointer.panning = false;
        self.pointer.tilting = false;
        self.set_hover(None);
    }

    /// Moves the hover pulse to `hit`, restoring the previous block's resting
    /// highlight.
    fn set_hover(&mut self, hit: Option<BlockId>) {
        if hit == self.hovered {
            return;
        }
        let now = self.now;
        if let Some(previous) = self.hovered.take()
            && let Some(block) = self.blocks.get_mut(previous)
        {
            let base = block.base_highlight();
            block.state_mut().hl.reset(base);
            self.block_work.enroll(previous, block);
        }
        if let Some(id) = hit
            && let Some(block) = self.blocks.get_mut(id)
        {
            let pulse = self.config.hover;
            block
                .state_mut()
                .hl
                .pulse(pulse.low, pulse.high, now, pulse.period);
            self.block_work.enroll(id, block);
        }
        self.hovered = hit;
    }
}

#[cfg(test)]
mod tests {
    use duel_engine::input::{Modifiers, MouseWheelDelta, PointerButtonEvent};
    use glam::Vec3;

    use super::*;
    use crate::cards::{CardKey, CardZone, Side};
    use crate::config::SceneConfig;
    use crate::layout::{FieldLayout, ZONE_BLOCKS};
    use crate::scene::HoverPos;
    use crate::testing::StubAssets;

    fn scene() -> DuelScene {
        DuelScene::new(
            SceneConfig::default(),
            FieldLayout::default(),
            StubAssets::default(),
        )
    }

    fn pixel_of(scene: &DuelScene, id: BlockId) -> Vec2 {
        let center = scene.blocks().get(id).unwrap().center();
        scene.camera().project(center.extend(0.0)).unwrap()
    }

    fn button(button: MouseButton, state: ButtonState, x: f32, y: f32) -> InputEvent {
        InputEvent::PointerButton(PointerButtonEvent {
            button,
            state,
            x,
            y,
            modifiers: Modifiers::default(),
        })
    }

    // ── camera controls ──────────────────────────────────────────────────

    #[test]
    fn left_drag_pans_by_viewport_fraction() {
        let mut scene = scene();
        scene.handle_input(&button(MouseButton::Left, ButtonState::Pressed, 100.0, 100.0));
        scene.mouse_move(356.0, 260.0);
        let offset = scene.camera().offset();
        assert!((offset.x - 0.25).abs() < 1e-6);
        assert!((offset.y + 0.25).abs() < 1e-6);

        scene.handle_input(&button(MouseButton::Left, ButtonState::Released, 356.0, 260.0));
        scene.mouse_move(0.0, 0.0);
        assert_eq!(scene.camera().offset(), offset);
    }

    #[test]
    fn right_drag_tilts_within_bounds() {
        let mut scene = scene();
        let start = scene.camera().angle();
        scene.mouse_button_down(MouseButton::Right, 0.0, 0.0);
        scene.mouse_move(0.0, 64.0);
        let expected = start + FRAC_PI_2 * 0.1;
        assert!((scene.camera().angle() - expected).abs() < 1e-5);

        scene.mouse_move(0.0, 10_000.0);
        assert_eq!(scene.camera().angle(), FRAC_PI_2);
    }

    #[test]
    fn wheel_zooms_and_r_resets() {
        let mut scene = scene();
        let radius = scene.camera().radius();
        scene.handle_input(&InputEvent::MouseWheel {
            delta: MouseWheelDelta::Line { x: 0.0, y: 2.0 },
            modifiers: Modifiers::default(),
        });
        assert_eq!(scene.camera().radius(), radius - 2.0 * scene.config().zoom_step);

        scene.mouse_wheel(-1000.0);
        assert_eq!(scene.camera().radius(), crate::camera::MAX_RADIUS);

        assert!(scene.key_down(Key::Char('R')));
        assert_eq!(scene.camera().radius(), radius);
        assert!(!scene.key_down(Key::Char('Q')));
    }

    // ── hover ────────────────────────────────────────────────────────────

    #[test]
    fn hover_pulses_and_leaving_resets() {
        let mut scene = scene();
        let a = BlockId::new(Side::Near, 2);
        let b = BlockId::new(Side::Far, 2);

        let pa = pixel_of(&scene, a);
        scene.mouse_move(pa.x, pa.y);
        assert_eq!(scene.hovered(), Some(a));
        assert_eq!(scene.hover_pos(pa.x, pa.y), HoverPos { side: 1, zone: 2 });
        scene.update(0.25);
        let lit = scene.buffers().field.slot(2)[0].highlight();
        assert!(lit > scene.config().hover.low);

        let pb = pixel_of(&scene, b);
        scene.mouse_move(pb.x, pb.y);
        assert_eq!(scene.hovered(), Some(b));
        scene.update(0.3);
        assert_eq!(scene.buffers().field.slot(2)[0].highlight(), 0.0);
        assert!(scene.buffers().field.slot(ZONE_BLOCKS + 2)[0].highlight() > 0.0);

        scene.pointer_left();
        assert_eq!(scene.hovered(), None);
    }

    #[test]
    fn hover_leave_restores_legal_target_highlight() {
        let mut scene = scene();
        let id = BlockId::new(Side::Near, 0);
        scene.set_block_highlight(id, 0.6, 0.0);
        let p = pixel_of(&scene, id);
        scene.mouse_move(p.x, p.y);
        scene.update(0.1);
        scene.mouse_move(-10_000.0, -10_000.0);
        scene.update(0.2);

        let block = scene.blocks().get(id).unwrap();
        assert_eq!(block.state().hl.get(), 0.6);
        assert!(!block.state().updating);
    }

    #[test]
    fn card_vertices_ignore_hover() {
        let mut scene = scene();
        let key = CardKey::new(Side::Near, CardZone::Monster, 2, 0);
        scene.add_card(key, 4, 0.0).unwrap();
        let p = pixel_of(&scene, BlockId::new(Side::Near, 2));
        scene.mouse_move(p.x, p.y);
        scene.update(0.5);
        let card = scene.get_card(&key).unwrap();
        assert_eq!(card.state().hl.get(), 0.0);
        assert!(card.translation().z > 0.0);
        assert_ne!(card.translation(), Vec3::ZERO);
    }
}
