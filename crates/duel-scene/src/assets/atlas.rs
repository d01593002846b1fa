use std::collections::HashMap;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::{AssetProvider, FetchedTexture, SheetKind, SheetView, TextureRegion};

const PADDING: u32 = 1;
const PLACEHOLDER: u32 = 4;

/// Name of the card-sheet region used for faces that have no image.
pub const UNKNOWN_CARD: &str = "unknown";

#[derive(Debug, Copy, Clone)]
struct PixelRect {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

/// Shelf allocator position. Copied to rewind the sheet to an earlier state.
#[derive(Debug, Copy, Clone)]
struct Shelf {
    x: u32,
    y: u32,
    row_height: u32,
}

/// One RGBA image holding many named regions, packed row by row.
///
/// The top-left corner holds a small white patch every unknown name maps to.
pub struct Sheet {
    image: RgbaImage,
    regions: HashMap<String, PixelRect>,
    shelf: Shelf,
    generation: u64,
}

impl Sheet {
    pub fn new(width: u32, height: u32) -> Self {
        let mut image = RgbaImage::new(width.max(PLACEHOLDER + 2), height.max(PLACEHOLDER + 2));
        for y in PADDING..PADDING + PLACEHOLDER {
            for x in PADDING..PADDING + PLACEHOLDER {
                image.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }

        Self {
            image,
            regions: HashMap::new(),
            shelf: Shelf {
                x: PADDING * 2 + PLACEHOLDER,
                y: PADDING,
                row_height: PLACEHOLDER,
            },
            generation: 1,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Builder form of [`Sheet::insert`]; a region that does not fit is logged and skipped.
    pub fn with(mut self, name: &str, image: &RgbaImage) -> Self {
        if self.insert(name, image).is_none() {
            log::warn!("sheet full; dropped region {name}");
        }
        self
    }

    /// Packs `image` under `name`. `None` when the sheet has no room left.
    pub fn insert(&mut self, name: &str, image: &RgbaImage) -> Option<TextureRegion> {
        let (w, h) = image.dimensions();
        let (x, y) = self.place(w, h)?;
        imageops::replace(&mut self.image, image, x as i64, y as i64);
        let rect = PixelRect { x, y, w, h };
        self.regions.insert(name.to_string(), rect);
        self.generation += 1;
        Some(self.uv(rect))
    }

    pub fn region(&self, name: &str) -> Option<TextureRegion> {
        self.regions.get(name).map(|r| self.uv(*r))
    }

    /// Inner texels of the white patch, so filtering never reaches the border.
    pub fn placeholder(&self) -> TextureRegion {
        let inner = PixelRect {
            x: PADDING + 1,
            y: PADDING + 1,
            w: PLACEHOLDER - 2,
            h: PLACEHOLDER - 2,
        };
        self.uv(inner)
    }

    /// Overwrites an existing region's pixels, resizing `image` to fit.
    pub fn replace_pixels(&mut self, name: &str, image: &RgbaImage) -> bool {
        let Some(rect) = self.regions.get(name).copied() else {
            return false;
        };
        let resized;
        let src = if image.dimensions() == (rect.w, rect.h) {
            image
        } else {
            resized = imageops::resize(image, rect.w, rect.h, FilterType::Triangle);
            &resized
        };
        imageops::replace(&mut self.image, src, rect.x as i64, rect.y as i64);
        self.generation += 1;
        true
    }

    /// Reserves `w` x `h` texels. A failed placement leaves the shelf as it
    /// was, so a later smaller image can still use the open row.
    fn place(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        let (sw, sh) = self.image.dimensions();
        let mut shelf = self.shelf;
        if shelf.x + w + PADDING > sw {
            shelf.y += shelf.row_height + PADDING;
            shelf.x = PADDING;
            shelf.row_height = 0;
        }
        if shelf.x + w + PADDING > sw || shelf.y + h + PADDING > sh {
            return None;
        }

        let at = (shelf.x, shelf.y);
        shelf.x += w + PADDING;
        shelf.row_height = shelf.row_height.max(h);
        self.shelf = shelf;
        Some(at)
    }

    fn mark(&self) -> (Shelf, Vec<String>) {
        (self.shelf, self.regions.keys().cloned().collect())
    }

    fn rewind(&mut self, shelf: Shelf, keep: &[String]) {
        self.shelf = shelf;
        self.regions.retain(|name, _| keep.contains(name));
        self.generation += 1;
    }

    fn uv(&self, r: PixelRect) -> TextureRegion {
        TextureRegion::from_pixels(r.x, r.y, r.w, r.h, self.width(), self.height())
    }
}

/// Loads card face images by code.
pub trait CardImageSource {
    fn load_card(&mut self, code: u32) -> Option<RgbaImage>;
}

impl<F> CardImageSource for F
where
    F: FnMut(u32) -> Option<RgbaImage>,
{
    fn load_card(&mut self, code: u32) -> Option<RgbaImage> {
        self(code)
    }
}

/// [`AssetProvider`] over three in-memory sheets.
///
/// Card faces are packed into the card sheet on first request and dropped by
/// `release_card_textures`, which rewinds the sheet to the regions it had at
/// construction (sleeves, icons, the unknown face).
pub struct TextureAtlas {
    sheets: [Sheet; 3],
    card_source: Box<dyn CardImageSource>,
    card_regions: HashMap<u32, TextureRegion>,
    card_mark: (Shelf, Vec<String>),
}

impl TextureAtlas {
    pub fn new(
        background: Sheet,
        field: Sheet,
        cards: Sheet,
        card_source: impl CardImageSource + 'static,
    ) -> Self {
        let card_mark = cards.mark();
        Self {
            sheets: [background, field, cards],
            card_source: Box::new(card_source),
            card_regions: HashMap::new(),
            card_mark,
        }
    }

    pub fn sheet_ref(&self, kind: SheetKind) -> &Sheet {
        &self.sheets[kind.index()]
    }

    /// Card faces currently packed.
    pub fn loaded_cards(&self) -> usize {
        self.card_regions.len()
    }

    fn unknown_card(&self) -> TextureRegion {
        let cards = self.sheet_ref(SheetKind::Card);
        cards.region(UNKNOWN_CARD).unwrap_or_else(|| cards.placeholder())
    }
}

impl AssetProvider for TextureAtlas {
    fn texture(&self, sheet: SheetKind, name: &str) -> TextureRegion {
        let sheet = self.sheet_ref(sheet);
        sheet.region(name).unwrap_or_else(|| {
            log::warn!("no texture named {name}; using placeholder");
            sheet.placeholder()
        })
    }

    fn card_texture(&mut self, code: u32) -> TextureRegion {
        if let Some(region) = self.card_regions.get(&code) {
            return *region;
        }

        let region = match self.card_source.load_card(code) {
            Some(image) => {
                let name = format!("card:{code}");
                match self.sheets[SheetKind::Card.index()].insert(&name, &image) {
                    Some(region) => region,
                    None => {
                        log::warn!("card sheet full; card {code} uses the unknown face");
                        self.unknown_card()
                    }
                }
            }
            None => {
                log::debug!("no image for card {code}");
                self.unknown_card()
            }
        };

        self.card_regions.insert(code, region);
        region
    }

    fn release_card_textures(&mut self) {
        let (shelf, keep) = &self.card_mark;
        self.sheets[SheetKind::Card.index()].rewind(*shelf, keep);
        log::debug!("released {} card faces", self.card_regions.len());
        self.card_regions.clear();
    }

    fn sheet(&self, sheet: SheetKind) -> Option<SheetView<'_>> {
        let sheet = self.sheet_ref(sheet);
        Some(SheetView {
            image: sheet.image(),
            generation: sheet.generation(),
        })
    }

    fn apply_fetched(&mut self, fetched: FetchedTexture) {
        let sheet = &mut self.sheets[fetched.sheet.index()];
        if !sheet.replace_pixels(&fetched.region, &fetched.image) {
            log::warn!("fetched texture targets unknown region {}", fetched.region);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, v: u8) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([v, v, v, 255]))
    }

    fn atlas() -> TextureAtlas {
        let cards = Sheet::new(64, 64)
            .with(UNKNOWN_CARD, &solid(8, 8, 10))
            .with("sleeve1", &solid(8, 8, 20));
        TextureAtlas::new(
            Sheet::new(16, 16),
            Sheet::new(32, 32).with("mzone", &solid(8, 8, 30)),
            cards,
            |code: u32| (code != 0).then(|| solid(10, 10, code as u8)),
        )
    }

    // ── sheets ───────────────────────────────────────────────────────────

    #[test]
    fn insert_reports_uvs_and_copies_pixels() {
        let mut sheet = Sheet::new(32, 32);
        let region = sheet.insert("a", &solid(4, 4, 99)).unwrap();
        let [tl, _, _, br] = region.uv;
        let x = (tl.x * 32.0) as u32;
        let y = (tl.y * 32.0) as u32;
        assert_eq!(sheet.image().get_pixel(x, y).0[0], 99);
        assert!((br.x - tl.x) * 32.0 - 4.0 < 1e-4);
    }

    #[test]
    fn full_sheet_rejects_insert() {
        let mut sheet = Sheet::new(16, 16);
        assert!(sheet.insert("big", &solid(20, 20, 1)).is_none());
    }

    #[test]
    fn rejected_insert_keeps_the_open_row() {
        let mut sheet = Sheet::new(32, 32);
        sheet.insert("wide", &solid(20, 4, 1)).unwrap();
        // Would need a new row that the sheet is too short for.
        assert!(sheet.insert("tall", &solid(10, 40, 2)).is_none());

        let region = sheet.insert("small", &solid(4, 4, 3)).unwrap();
        let [tl, ..] = region.uv;
        let (x, y) = ((tl.x * 32.0) as u32, (tl.y * 32.0) as u32);
        assert_eq!(y, PADDING, "small image started a new row");
        assert_eq!(sheet.image().get_pixel(x, y).0[0], 3);
    }

    #[test]
    fn replace_pixels_resizes_into_region() {
        let mut sheet = Sheet::new(32, 32).with("s", &solid(8, 8, 1));
        let before = sheet.generation();
        assert!(sheet.replace_pixels("s", &solid(3, 5, 200)));
        assert!(sheet.generation() > before);
        assert!(!sheet.replace_pixels("missing", &solid(1, 1, 1)));
    }

    // ── provider ─────────────────────────────────────────────────────────

    #[test]
    fn unknown_name_yields_placeholder() {
        let atlas = atlas();
        let region = atlas.texture(SheetKind::Field, "nope");
        assert_eq!(region, atlas.sheet_ref(SheetKind::Field).placeholder());
        assert_ne!(atlas.texture(SheetKind::Field, "mzone"), region);
    }

    #[test]
    fn card_faces_are_cached_and_released() {
        let mut atlas = atlas();
        let a = atlas.card_texture(7);
        assert_eq!(atlas.card_texture(7), a);
        assert_eq!(atlas.loaded_cards(), 1);

        atlas.release_card_textures();
        assert_eq!(atlas.loaded_cards(), 0);
        // Rewound shelf hands out the same spot again.
        assert_eq!(atlas.card_texture(8), a);
        // Fixed regions survive the release.
        assert_ne!(
            atlas.texture(SheetKind::Card, "sleeve1"),
            atlas.sheet_ref(SheetKind::Card).placeholder()
        );
    }

    #[test]
    fn missing_card_image_uses_unknown_face() {
        let mut atlas = atlas();
        assert_eq!(atlas.card_texture(0), atlas.texture(SheetKind::Card, UNKNOWN_CARD));
    }
}
