use duel_engine::core::{App, AppControl, FrameCtx};
use duel_engine::input::{ButtonState, InputEvent, InputState, Key};
use duel_scene::{DuelScene, FieldRenderer};

use crate::demo;

const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

/// Engine app that owns one scene and its renderer.
pub struct DuelApp {
    scene: DuelScene,
    renderer: FieldRenderer,
}

impl DuelApp {
    pub fn new(scene: DuelScene) -> Self {
        Self {
            scene,
            renderer: FieldRenderer::new(),
        }
    }
}

impl App for DuelApp {
    fn on_input(&mut self, event: &InputEvent, _input: &InputState) -> AppControl {
        if let InputEvent::Key {
            key,
            state: ButtonState::Pressed,
            repeat: false,
            ..
        } = event
        {
            match key {
                Key::Escape => return AppControl::Exit,
                Key::Char('N') => {
                    demo::replay(&mut self.scene);
                    return AppControl::Continue;
                }
                _ => {}
            }
        }
        self.scene.handle_input(event);
        AppControl::Continue
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        self.scene.set_scene_size(width as f32, height as f32);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        self.scene.update(ctx.time.game_time);

        let scene = &mut self.scene;
        let renderer = &mut self.renderer;
        ctx.render(CLEAR, |rctx, target| renderer.render(rctx, target, scene))
    }
}
