//! Duel commands and the queue the scene drains one head at a time.
//!
//! A command's `handle` is called once per frame while it is at the head of
//! the queue. Returning `false` keeps it there (its effect is still playing
//! out); returning `true` pops it.

use std::collections::VecDeque;

use crate::cards::{CardId, CardKey, CardPosition};
use crate::field::BlockId;
use crate::scene::DuelScene;

pub trait DuelCommand {
    /// Applies the command; `true` once it is complete.
    fn handle(&mut self, scene: &mut DuelScene, now: f64) -> bool;
}

impl<F> DuelCommand for F
where
    F: FnMut(&mut DuelScene, f64) -> bool,
{
    fn handle(&mut self, scene: &mut DuelScene, now: f64) -> bool {
        self(scene, now)
    }
}

#[derive(Default)]
pub struct CommandQueue {
    pending: VecDeque<Box<dyn DuelCommand>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: impl DuelCommand + 'static) {
        self.pending.push_back(Box::new(command));
    }

    /// Takes the head command.
    pub fn pull(&mut self) -> Option<Box<dyn DuelCommand>> {
        self.pending.pop_front()
    }

    /// Puts an unfinished command back at the head.
    pub fn restore(&mut self, command: Box<dyn DuelCommand>) {
        self.pending.push_front(command);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Places a new card; completes immediately while it fades in.
#[derive(Debug, Clone)]
pub struct AddCard {
    pub key: CardKey,
    pub code: u32,
    pub position: Option<CardPosition>,
}

impl AddCard {
    pub fn new(key: CardKey, code: u32) -> Self {
        Self {
            key,
            code,
            position: None,
        }
    }

    pub fn with_position(mut self, position: CardPosition) -> Self {
        self.position = Some(position);
        self
    }
}

impl DuelCommand for AddCard {
    fn handle(&mut self, scene: &mut DuelScene, now: f64) -> bool {
        let added = scene.add_card(self.key, self.code, now).and_then(|_| match self.position {
            Some(position) => scene.set_card_position(&self.key, position, now),
            None => Ok(()),
        });
        if let Err(e) = added {
            log::warn!("add card {}: {e}", self.key);
        }
        true
    }
}

/// Moves a card and holds the queue until it arrives.
#[derive(Debug, Clone)]
pub struct MoveCard {
    pub from: CardKey,
    pub to: CardKey,
    moving: Option<CardId>,
}

impl MoveCard {
    pub fn new(from: CardKey, to: CardKey) -> Self {
        Self {
            from,
            to,
            moving: None,
        }
    }
}

impl DuelCommand for MoveCard {
    fn handle(&mut self, scene: &mut DuelScene, now: f64) -> bool {
        if let Some(id) = self.moving {
            return !scene.is_card_animating(id);
        }
        match scene.move_card(&self.from, self.to, now) {
            Ok(id) => {
                self.moving = Some(id);
                false
            }
            Err(e) => {
                log::warn!("move card: {e}");
                true
            }
        }
    }
}

/// Fades a card out, then removes it.
#[derive(Debug, Clone)]
pub struct RemoveCard {
    pub key: CardKey,
    fading: Option<CardId>,
}

impl RemoveCard {
    pub fn new(key: CardKey) -> Self {
        Self { key, fading: None }
    }
}

impl DuelCommand for RemoveCard {
    fn handle(&mut self, scene: &mut DuelScene, now: f64) -> bool {
        let Some(id) = self.fading else {
            return match scene.fade_out_card(&self.key, now) {
                Ok(id) => {
                    self.fading = Some(id);
                    false
                }
                Err(e) => {
                    log::warn!("remove card: {e}");
                    true
                }
            };
        };
        if scene.is_card_animating(id) {
            return false;
        }
        if let Err(e) = scene.remove_card(&self.key) {
            log::warn!("remove card: {e}");
        }
        true
    }
}

/// Turns a card to a new face/battle position.
#[derive(Debug, Clone)]
pub struct SetPosition {
    pub key: CardKey,
    pub position: CardPosition,
}

impl DuelCommand for SetPosition {
    fn handle(&mut self, scene: &mut DuelScene, now: f64) -> bool {
        if let Err(e) = scene.set_card_position(&self.key, self.position, now) {
            log::warn!("set position: {e}");
        }
        true
    }
}

/// Sets the resting highlight of a block, e.g. to mark legal targets.
#[derive(Debug, Clone)]
pub struct Highlight {
    pub block: BlockId,
    pub intensity: f32,
}

impl DuelCommand for Highlight {
    fn handle(&mut self, scene: &mut DuelScene, now: f64) -> bool {
        scene.set_block_highlight(self.block, self.intensity, now);
        true
    }
}

/// Holds the queue for a fixed time.
#[derive(Debug, Clone)]
pub struct Wait {
    pub seconds: f64,
    until: Option<f64>,
}

impl Wait {
    pub fn new(seconds: f64) -> Self {
        Self {
            seconds,
            until: None,
        }
    }
}

impl DuelCommand for Wait {
    fn handle(&mut self, _scene: &mut DuelScene, now: f64) -> bool {
        let until = *self.until.get_or_insert(now + self.seconds);
        now >= until
    }
}

/// Removes every card and releases per-duel textures.
#[derive(Debug, Clone, Default)]
pub struct ClearField;

impl DuelCommand for ClearField {
    fn handle(&mut self, scene: &mut DuelScene, _now: f64) -> bool {
        scene.clear_field();
        true
    }
}
