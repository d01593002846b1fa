mod app;
mod demo;
mod demo_assets;

use std::path::PathBuf;

use anyhow::Result;
use duel_engine::device::GpuInit;
use duel_engine::logging::{LoggingConfig, init_logging};
use duel_engine::window::{Runtime, RuntimeConfig};
use duel_scene::assets::{FileSource, TextureFetcher, TextureRequest};
use duel_scene::scene::{BACKGROUND_TEXTURE, SLEEVE_TEXTURES};
use duel_scene::{DuelScene, FieldLayout, SceneConfig, SheetKind};

use crate::app::DuelApp;

/// Directory with `bg.png`, `sleeve1.png`, `sleeve2.png` and `pics/<code>.jpg`.
const ASSET_DIR_VAR: &str = "DUEL_ASSET_DIR";

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let asset_dir = std::env::var_os(ASSET_DIR_VAR).map(PathBuf::from);
    let atlas = demo_assets::demo_atlas(asset_dir.clone());

    let config = RuntimeConfig {
        title: "duel".to_string(),
        ..RuntimeConfig::default()
    };
    let size = config.initial_size;
    let scene_config = SceneConfig {
        scene_size: (size.width as f32, size.height as f32),
        ..SceneConfig::default()
    };
    let mut scene = DuelScene::new(scene_config, FieldLayout::default(), atlas);

    if let Some(dir) = asset_dir {
        log::info!("loading textures from {}", dir.display());
        scene.attach_fetcher(TextureFetcher::spawn(FileSource::new(dir))?);
        request_textures(&mut scene);
    }

    demo::queue_opening(&mut scene);
    log::info!("press N to replay the opening, R to reset the camera, Esc to quit");

    Runtime::run(config, GpuInit::default(), DuelApp::new(scene))
}

/// Replaces the generated background and sleeves with files, once fetched.
fn request_textures(scene: &mut DuelScene) {
    scene.request_texture(TextureRequest {
        sheet: SheetKind::Background,
        region: BACKGROUND_TEXTURE.to_string(),
        location: "bg.png".to_string(),
    });
    for sleeve in SLEEVE_TEXTURES {
        scene.request_texture(TextureRequest {
            sheet: SheetKind::Card,
            region: sleeve.to_string(),
            location: format!("{sleeve}.png"),
        });
    }
}
