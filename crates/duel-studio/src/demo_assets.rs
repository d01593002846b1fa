//! Procedural sheets so the demo runs without any image files on disk.

use std::path::{Path, PathBuf};

use duel_scene::assets::{Sheet, UNKNOWN_CARD};
use duel_scene::layout::BLOCK_NAMES;
use duel_scene::scene::{BACKGROUND_TEXTURE, ICON_TEXTURE, SLEEVE_TEXTURES};
use duel_scene::TextureAtlas;
use image::{Rgba, RgbaImage};

/// Field-sheet texture the demo uses for target markers.
pub const TARGET_MARKER: &str = "target";

const CARD_W: u32 = 36;
const CARD_H: u32 = 50;

/// Builds the demo atlas. Card faces come from `<dir>/pics/<code>.jpg` when
/// `asset_dir` is set and the file exists, otherwise they are generated.
pub fn demo_atlas(asset_dir: Option<PathBuf>) -> TextureAtlas {
    let background = Sheet::new(64, 64).with(BACKGROUND_TEXTURE, &gradient(48, 48));

    let mut field = Sheet::new(256, 256);
    let mut seen = Vec::new();
    for (_, texture) in BLOCK_NAMES {
        if seen.contains(&texture) {
            continue;
        }
        seen.push(texture);
        field.insert(texture, &framed(28, 36, tint(texture)));
    }
    let field = field.with(TARGET_MARKER, &framed(28, 36, Rgba([230, 200, 40, 140])));

    let cards = Sheet::new(1024, 1024)
        .with(UNKNOWN_CARD, &framed(CARD_W, CARD_H, Rgba([90, 90, 90, 255])))
        .with(SLEEVE_TEXTURES[0], &framed(CARD_W, CARD_H, Rgba([120, 60, 30, 255])))
        .with(SLEEVE_TEXTURES[1], &framed(CARD_W, CARD_H, Rgba([30, 60, 120, 255])))
        .with(ICON_TEXTURE, &solid(8, 8, Rgba([255, 255, 255, 255])));

    TextureAtlas::new(background, field, cards, move |code: u32| {
        if code == 0 {
            return None;
        }
        asset_dir
            .as_deref()
            .and_then(|dir| load_face(dir, code))
            .or_else(|| Some(face(code)))
    })
}

fn load_face(dir: &Path, code: u32) -> Option<RgbaImage> {
    let path = dir.join("pics").join(format!("{code}.jpg"));
    match image::open(&path) {
        Ok(img) => Some(img.to_rgba8()),
        Err(e) => {
            log::debug!("{}: {e}", path.display());
            None
        }
    }
}

/// A generated face whose color is derived from the card code.
pub fn face(code: u32) -> RgbaImage {
    let h = code.wrapping_mul(2_654_435_761);
    let color = Rgba([
        64 + (h >> 24) as u8 / 2,
        64 + (h >> 16) as u8 / 2,
        64 + (h >> 8) as u8 / 2,
        255,
    ]);
    framed(CARD_W, CARD_H, color)
}

fn tint(texture: &str) -> Rgba<u8> {
    match texture {
        "mzone" => Rgba([180, 70, 50, 110]),
        "szone" => Rgba([40, 150, 120, 110]),
        "grave" | "banish" => Rgba([110, 110, 140, 110]),
        _ => Rgba([120, 120, 120, 110]),
    }
}

fn solid(w: u32, h: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(w, h, color)
}

/// Filled rectangle with a lighter one-pixel frame.
fn framed(w: u32, h: u32, fill: Rgba<u8>) -> RgbaImage {
    let Rgba([r, g, b, a]) = fill;
    let edge = Rgba([r.saturating_add(70), g.saturating_add(70), b.saturating_add(70), a.max(200)]);
    RgbaImage::from_fn(w, h, |x, y| {
        if x == 0 || y == 0 || x + 1 == w || y + 1 == h {
            edge
        } else {
            fill
        }
    })
}

fn gradient(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |_, y| {
        let t = y as f32 / h.max(1) as f32;
        let v = (18.0 + 30.0 * t) as u8;
        Rgba([v / 2, v / 2, v, 255])
    })
}

#[cfg(test)]
mod tests {
    use duel_scene::{AssetProvider, SheetKind};

    use super::*;

    #[test]
    fn every_block_texture_is_packed() {
        let atlas = demo_atlas(None);
        let placeholder = atlas.sheet_ref(SheetKind::Field).placeholder();
        for (_, texture) in BLOCK_NAMES {
            assert_ne!(atlas.texture(SheetKind::Field, texture), placeholder, "{texture}");
        }
        assert_ne!(atlas.texture(SheetKind::Field, TARGET_MARKER), placeholder);
    }

    #[test]
    fn generated_faces_differ_by_code() {
        let mut atlas = demo_atlas(None);
        assert_ne!(face(1), face(2));
        let a = atlas.card_texture(1);
        let b = atlas.card_texture(2);
        assert_ne!(a, b);
        assert_eq!(atlas.card_texture(0), atlas.texture(SheetKind::Card, UNKNOWN_CARD));
    }
}
