//! Test doubles shared across modules.

use std::cell::Cell;
use std::rc::Rc;

use crate::assets::{AssetProvider, SheetKind, SheetView, TextureRegion};

/// Asset provider that hands out a fixed region per sheet and counts
/// card-texture releases.
#[derive(Debug, Default, Clone)]
pub struct StubAssets {
    pub releases: Rc<Cell<usize>>,
    pub card_requests: Rc<Cell<usize>>,
}

impl StubAssets {
    pub fn region(sheet: SheetKind) -> TextureRegion {
        let u = sheet.index() as f32 * 0.25;
        TextureRegion::from_rect(u, 0.0, u + 0.25, 0.25)
    }
}

impl AssetProvider for StubAssets {
    fn texture(&self, sheet: SheetKind, _name: &str) -> TextureRegion {
        Self::region(sheet)
    }

    fn card_texture(&mut self, code: u32) -> TextureRegion {
        self.card_requests.set(self.card_requests.get() + 1);
        let v = (code % 4) as f32 * 0.25;
        TextureRegion::from_rect(0.75, v, 1.0, v + 0.25)
    }

    fn release_card_textures(&mut self) {
        self.releases.set(self.releases.get() + 1);
    }

    fn sheet(&self, _sheet: SheetKind) -> Option<SheetView<'_>> {
        None
    }
}
