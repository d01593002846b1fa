use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Vec2, Vec3};

use crate::cards::{CardKey, CardPosition, CardZone, Side};
use crate::field::{BlockId, FieldBlocks, RestPose};
use crate::layout::LayoutRect;

/// Height of a resting card above its block.
pub(crate) const CARD_LIFT: f32 = 0.01;
/// Extra height per card in a pile.
const PILE_STEP: f32 = 0.002;
/// Offset of each overlay material from the monster it sits under.
const OVERLAY_SHIFT: Vec2 = Vec2::new(0.06, 0.06);
/// Widest spacing between hand cards, in card widths.
const HAND_SPACING: f32 = 1.1;

/// Layout inputs a rest pose depends on.
pub(crate) struct PoseContext<'a> {
    pub blocks: &'a FieldBlocks,
    /// Near-side hand row.
    pub hand: LayoutRect,
    pub card: LayoutRect,
}

/// Pose for a card at `key`. `hand_slot` is `(index, count)` within the
/// side's hand and only consulted for hand cards.
pub(crate) fn rest_pose(
    ctx: &PoseContext<'_>,
    key: &CardKey,
    position: CardPosition,
    hand_slot: Option<(usize, usize)>,
) -> RestPose {
    let far = key.side == Side::Far;
    let mirror = if far { -1.0 } else { 1.0 };

    let translation = match (key.zone, key.zone.block_index(key.sequence)) {
        (CardZone::Hand, _) => {
            let (index, count) = hand_slot.unwrap_or((0, 1));
            (hand_point(ctx, index, count) * mirror).extend(CARD_LIFT)
        }
        (zone, Some(block)) => {
            let center = ctx
                .blocks
                .get(BlockId::new(key.side, block))
                .map(|b| b.center())
                .unwrap_or_default();
            if zone == CardZone::Monster && key.subsequence > 0 {
                let shift = OVERLAY_SHIFT * key.subsequence as f32 * mirror;
                (center + shift).extend(CARD_LIFT * 0.5)
            } else if zone.is_pile() {
                center.extend(CARD_LIFT + key.sequence as f32 * PILE_STEP)
            } else {
                center.extend(CARD_LIFT)
            }
        }
        (_, None) => {
            log::warn!("{key} has no zone block; placing at origin");
            Vec3::new(0.0, 0.0, CARD_LIFT)
        }
    };

    let mut rotation = if far { PI } else { 0.0 };
    if position.is_defense() {
        rotation += FRAC_PI_2;
    }
    let flip = if position.is_face_up() { 0.0 } else { PI };

    RestPose {
        translation,
        rotation,
        flip,
    }
}

/// Near-side hand position of card `index` out of `count`, spread evenly
/// around the row center and never wider apart than `HAND_SPACING`.
fn hand_point(ctx: &PoseContext<'_>, index: usize, count: usize) -> Vec2 {
    let row = ctx.hand;
    let count = count.max(1);
    let step = (row.size.x / count as f32).min(ctx.card.size.x * HAND_SPACING);
    let offset = index as f32 - (count - 1) as f32 * 0.5;
    Vec2::new(row.center.x + offset * step, row.center.y)
}
