//! A short scripted duel opening fed through the scene's command queue.

use duel_scene::command::{AddCard, ClearField, Highlight, MoveCard, RemoveCard, SetPosition, Wait};
use duel_scene::field::BlockId;
use duel_scene::layout::MONSTER_BLOCK;
use duel_scene::{CardKey, CardPosition, CardZone, DuelScene, Side};

use crate::demo_assets::TARGET_MARKER;

const DECK_SIZE: u32 = 20;
const OPENING_HAND: u32 = 5;

fn key(side: Side, zone: CardZone, sequence: u32) -> CardKey {
    CardKey::new(side, zone, sequence, 0)
}

fn code_for(side: Side, n: u32) -> u32 {
    1000 * side.number() as u32 + n + 1
}

/// Queues the opening: decks, five-card hands, a summon, a set card, a
/// target highlight and a monster sent to the graveyard.
pub fn queue_opening(scene: &mut DuelScene) {
    for side in Side::BOTH {
        for seq in 0..DECK_SIZE {
            scene.push_command(
                AddCard::new(key(side, CardZone::Deck, seq), 0)
                    .with_position(CardPosition::FaceDownAttack),
            );
        }
    }
    scene.push_command(Wait::new(0.4));

    // Draw from the top of each deck.
    for n in 0..OPENING_HAND {
        for side in Side::BOTH {
            let top = DECK_SIZE - 1 - n;
            scene.push_command(RemoveCard::new(key(side, CardZone::Deck, top)));
            let hand = key(side, CardZone::Hand, n);
            let code = match side {
                Side::Near => code_for(side, n),
                Side::Far => 0,
            };
            scene.push_command(AddCard::new(hand, code).with_position(match side {
                Side::Near => CardPosition::FaceUpAttack,
                Side::Far => CardPosition::FaceDownAttack,
            }));
        }
    }
    scene.push_command(Wait::new(0.5));

    // Near summons the last card in hand to the middle zone.
    let summoned = key(Side::Near, CardZone::Monster, 2);
    scene.push_command(MoveCard::new(
        key(Side::Near, CardZone::Hand, OPENING_HAND - 1),
        summoned,
    ));

    // Far sets a monster face-down in defense, then flips it.
    let set = key(Side::Far, CardZone::Monster, 1);
    scene.push_command(MoveCard::new(key(Side::Far, CardZone::Hand, 0), set));
    scene.push_command(SetPosition {
        key: set,
        position: CardPosition::FaceDownDefense,
    });
    scene.push_command(Wait::new(0.6));

    // Legal attack targets light up while the marker shows the chosen one.
    let target = BlockId::new(Side::Far, MONSTER_BLOCK + 1);
    scene.push_command(Highlight {
        block: target,
        intensity: 0.6,
    });
    scene.push_command(move |scene: &mut DuelScene, _now: f64| {
        scene.set_marker(0, target, TARGET_MARKER);
        true
    });
    scene.push_command(Wait::new(1.0));
    scene.push_command(SetPosition {
        key: set,
        position: CardPosition::FaceUpDefense,
    });
    scene.push_command(Wait::new(0.6));

    scene.push_command(move |scene: &mut DuelScene, _now: f64| {
        scene.clear_marker(0);
        true
    });
    scene.push_command(Highlight {
        block: target,
        intensity: 0.0,
    });
    scene.push_command(MoveCard::new(set, key(Side::Far, CardZone::Grave, 0)));
}

/// Clears the field and queues the opening again.
pub fn replay(scene: &mut DuelScene) {
    scene.commands_mut().clear();
    scene.push_command(ClearField);
    queue_opening(scene);
    log::info!("replaying opening ({} commands)", scene.commands().len());
}

#[cfg(test)]
mod tests {
    use duel_scene::{FieldLayout, SceneConfig};

    use super::*;
    use crate::demo_assets::demo_atlas;

    fn run_to_idle(scene: &mut DuelScene, mut now: f64) -> f64 {
        for _ in 0..10_000 {
            if scene.is_idle() {
                break;
            }
            now += 1.0 / 60.0;
            scene.update(now);
        }
        now
    }

    fn scene() -> DuelScene {
        DuelScene::new(SceneConfig::default(), FieldLayout::default(), demo_atlas(None))
    }

    #[test]
    fn opening_plays_to_completion() {
        let mut scene = scene();
        queue_opening(&mut scene);
        run_to_idle(&mut scene, 0.0);

        assert!(scene.is_idle());
        let near_deck = (DECK_SIZE - OPENING_HAND) as usize;
        // Decks, near hand minus the summon, far hand minus the set, and two
        // field cards.
        let expected = near_deck * 2 + (OPENING_HAND as usize - 1) * 2 + 2;
        assert_eq!(scene.card_count(), expected);

        let summoned = scene.get_card(&key(Side::Near, CardZone::Monster, 2)).unwrap();
        assert_eq!(summoned.code(), code_for(Side::Near, OPENING_HAND - 1));
        assert!(scene.get_card(&key(Side::Far, CardZone::Grave, 0)).is_some());
        assert_eq!(scene.marker_count(), 0);
    }

    #[test]
    fn replay_starts_from_an_empty_field() {
        let mut scene = scene();
        queue_opening(&mut scene);
        let now = run_to_idle(&mut scene, 0.0);
        let count = scene.card_count();

        replay(&mut scene);
        run_to_idle(&mut scene, now);
        assert_eq!(scene.card_count(), count);
    }
}
