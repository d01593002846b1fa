//! Named field rectangles and the per-side zone block table.

use std::collections::HashMap;

use glam::{Vec2, Vec3};

/// Axis-aligned rectangle in field units, described by its center.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct LayoutRect {
    pub center: Vec2,
    pub size: Vec2,
}

impl LayoutRect {
    pub const fn new(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            center: Vec2::new(cx, cy),
            size: Vec2::new(width, height),
        }
    }

    /// Corners on the `z` plane, ordered top-left, top-right, bottom-left,
    /// bottom-right as seen from above with +y pointing away from the viewer.
    pub fn corners(&self, z: f32) -> [Vec3; 4] {
        let h = self.size * 0.5;
        let c = self.center;
        [
            Vec3::new(c.x - h.x, c.y + h.y, z),
            Vec3::new(c.x + h.x, c.y + h.y, z),
            Vec3::new(c.x - h.x, c.y - h.y, z),
            Vec3::new(c.x + h.x, c.y - h.y, z),
        ]
    }
}

/// Source of named layout rectangles, consulted at init and on relayout.
pub trait LayoutSource {
    fn layout_rect(&self, name: &str) -> Option<LayoutRect>;
}

/// Blocks per side.
pub const ZONE_BLOCKS: usize = 17;

/// `(layout name, texture name)` per block index, identical on both sides.
pub const BLOCK_NAMES: [(&str, &str); ZONE_BLOCKS] = [
    ("mzone1", "mzone"),
    ("mzone2", "mzone"),
    ("mzone3", "mzone"),
    ("mzone4", "mzone"),
    ("mzone5", "mzone"),
    ("szone1", "szone"),
    ("szone2", "szone"),
    ("szone3", "szone"),
    ("szone4", "szone"),
    ("szone5", "szone"),
    ("fdzone", "fdzone"),
    ("pzonel", "pzonel"),
    ("pzoner", "pzoner"),
    ("mdeck", "mdeck"),
    ("exdeck", "exdeck"),
    ("grave", "grave"),
    ("banish", "banish"),
];

pub const MONSTER_BLOCK: usize = 0;
pub const SPELL_BLOCK: usize = 5;
pub const FIELD_SPELL_BLOCK: usize = 10;
pub const PENDULUM_LEFT_BLOCK: usize = 11;
pub const PENDULUM_RIGHT_BLOCK: usize = 12;
pub const DECK_BLOCK: usize = 13;
pub const EXTRA_BLOCK: usize = 14;
pub const GRAVE_BLOCK: usize = 15;
pub const BANISH_BLOCK: usize = 16;

/// Card quad size, centered on the card origin.
pub const CARD_LAYOUT: &str = "card";
/// Icon quad, relative to the card center.
pub const ICON_LAYOUT: &str = "icon";
/// Near-side hand row; the far side uses its mirror image.
pub const HAND_LAYOUT: &str = "hand";

/// Name → rectangle table with the standard near-side arrangement.
#[derive(Debug, Clone)]
pub struct FieldLayout {
    rects: HashMap<String, LayoutRect>,
}

impl FieldLayout {
    pub fn empty() -> Self {
        Self {
            rects: HashMap::new(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, rect: LayoutRect) -> &mut Self {
        self.rects.insert(name.into(), rect);
        self
    }

    pub fn with(mut self, name: impl Into<String>, rect: LayoutRect) -> Self {
        self.set(name, rect);
        self
    }

    pub fn get(&self, name: &str) -> Option<LayoutRect> {
        self.rects.get(name).copied()
    }
}

impl Default for FieldLayout {
    fn default() -> Self {
        const W: f32 = 0.9;
        const H: f32 = 1.1;
        const MONSTER_ROW: f32 = -0.6;
        const SPELL_ROW: f32 = -1.8;

        let mut layout = Self::empty();
        for i in 0..5 {
            let x = -2.0 + i as f32;
            layout.set(format!("mzone{}", i + 1), LayoutRect::new(x, MONSTER_ROW, W, H));
            layout.set(format!("szone{}", i + 1), LayoutRect::new(x, SPELL_ROW, W, H));
        }
        layout
            .set("fdzone", LayoutRect::new(-3.1, MONSTER_ROW, W, H))
            .set("exdeck", LayoutRect::new(-3.1, SPELL_ROW, W, H))
            .set("pzonel", LayoutRect::new(-4.2, SPELL_ROW, W, H))
            .set("grave", LayoutRect::new(3.1, MONSTER_ROW, W, H))
            .set("mdeck", LayoutRect::new(3.1, SPELL_ROW, W, H))
            .set("banish", LayoutRect::new(4.2, MONSTER_ROW, W, H))
            .set("pzoner", LayoutRect::new(4.2, SPELL_ROW, W, H))
            .set(CARD_LAYOUT, LayoutRect::new(0.0, 0.0, 0.72, 1.0))
            .set(ICON_LAYOUT, LayoutRect::new(0.24, -0.38, 0.18, 0.18))
            .set(HAND_LAYOUT, LayoutRect::new(0.0, -3.2, 6.0, 1.0));
        layout
    }
}

impl LayoutSource for FieldLayout {
    fn layout_rect(&self, name: &str) -> Option<LayoutRect> {
        self.get(name)
    }
}
