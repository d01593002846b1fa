//! Texture regions and the asset provider contract.
//!
//! The scene never touches pixels: it asks an [`AssetProvider`] for UV
//! regions and the renderer asks it for sheet images to upload. Unknown names
//! resolve to a placeholder region, so a missing asset never blocks a draw.

mod atlas;
mod fetch;

use glam::Vec2;
use image::RgbaImage;

pub use atlas::{CardImageSource, Sheet, TextureAtlas, UNKNOWN_CARD};
pub use fetch::{FetchedTexture, FileSource, ImageSource, TextureFetcher, TextureRequest};

/// The three sheets a scene samples from, one per draw pass.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SheetKind {
    Background,
    Field,
    Card,
}

impl SheetKind {
    pub const ALL: [SheetKind; 3] = [SheetKind::Background, SheetKind::Field, SheetKind::Card];

    pub fn index(self) -> usize {
        match self {
            SheetKind::Background => 0,
            SheetKind::Field => 1,
            SheetKind::Card => 2,
        }
    }
}

/// Four corner UVs, ordered top-left, top-right, bottom-left, bottom-right to
/// match quad vertex order.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct TextureRegion {
    pub uv: [Vec2; 4],
}

impl TextureRegion {
    pub fn from_rect(u0: f32, v0: f32, u1: f32, v1: f32) -> Self {
        Self {
            uv: [
                Vec2::new(u0, v0),
                Vec2::new(u1, v0),
                Vec2::new(u0, v1),
                Vec2::new(u1, v1),
            ],
        }
    }

    /// Region of a pixel rectangle within a `sheet_w × sheet_h` image.
    pub fn from_pixels(x: u32, y: u32, w: u32, h: u32, sheet_w: u32, sheet_h: u32) -> Self {
        let sw = sheet_w.max(1) as f32;
        let sh = sheet_h.max(1) as f32;
        Self::from_rect(
            x as f32 / sw,
            y as f32 / sh,
            (x + w) as f32 / sw,
            (y + h) as f32 / sh,
        )
    }
}

/// A sheet image plus a counter bumped whenever its pixels change.
pub struct SheetView<'a> {
    pub image: &'a RgbaImage,
    pub generation: u64,
}

/// Texture collaborator of the scene.
pub trait AssetProvider {
    /// Named region on `sheet`; the sheet's placeholder when unknown.
    fn texture(&self, sheet: SheetKind, name: &str) -> TextureRegion;

    /// Face region for a card code, loading it on first use. Codes without an
    /// image resolve to a stand-in region.
    fn card_texture(&mut self, code: u32) -> TextureRegion;

    /// Drops per-duel card face allocations.
    fn release_card_textures(&mut self);

    /// Image backing `sheet`, for upload.
    fn sheet(&self, sheet: SheetKind) -> Option<SheetView<'_>>;

    /// Writes a fetched image into the region it was requested for.
    fn apply_fetched(&mut self, fetched: FetchedTexture) {
        log::debug!("ignoring fetched texture for {}", fetched.region);
    }
}
