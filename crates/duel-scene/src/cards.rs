//! Card addressing and the card arena.
//!
//! Cards are addressed by [`CardKey`] (side, zone, sequence, subsequence) and
//! stored in a generational arena. Each live card owns one slot of the card
//! vertex buffer; freed slots are recycled before fresh ones are handed out.

use std::collections::HashMap;
use std::fmt;

use slotmap::SlotMap;

use crate::error::SceneError;
use crate::field::{FieldCard, FieldObject, ObjectStore};
use crate::layout::{
    BANISH_BLOCK, DECK_BLOCK, EXTRA_BLOCK, FIELD_SPELL_BLOCK, GRAVE_BLOCK, MONSTER_BLOCK,
    PENDULUM_LEFT_BLOCK, PENDULUM_RIGHT_BLOCK, SPELL_BLOCK,
};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Side {
    /// The local player, drawn on the near half of the field.
    Near,
    Far,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Near, Side::Far];

    pub fn index(self) -> usize {
        match self {
            Side::Near => 0,
            Side::Far => 1,
        }
    }

    /// 1-based side number reported by hover queries.
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn from_number(n: u8) -> Option<Side> {
        match n {
            1 => Some(Side::Near),
            2 => Some(Side::Far),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum CardZone {
    Deck,
    Hand,
    /// Subsequence 0 is the monster; higher subsequences are overlay
    /// materials stacked beneath it.
    Monster,
    /// Sequences 0..=4 are spell/trap zones, 5 the field zone, 6 and 7 the
    /// left and right pendulum zones.
    Spell,
    Grave,
    Banished,
    Extra,
}

impl CardZone {
    /// Zone block a card at `sequence` rests on. `None` for the hand.
    pub fn block_index(self, sequence: u32) -> Option<usize> {
        let seq = sequence as usize;
        match self {
            CardZone::Hand => None,
            CardZone::Monster if seq < 5 => Some(MONSTER_BLOCK + seq),
            CardZone::Monster => None,
            CardZone::Spell => match seq {
                0..=4 => Some(SPELL_BLOCK + seq),
                5 => Some(FIELD_SPELL_BLOCK),
                6 => Some(PENDULUM_LEFT_BLOCK),
                7 => Some(PENDULUM_RIGHT_BLOCK),
                _ => None,
            },
            CardZone::Deck => Some(DECK_BLOCK),
            CardZone::Extra => Some(EXTRA_BLOCK),
            CardZone::Grave => Some(GRAVE_BLOCK),
            CardZone::Banished => Some(BANISH_BLOCK),
        }
    }

    /// Zones where cards stack by sequence.
    pub fn is_pile(self) -> bool {
        matches!(
            self,
            CardZone::Deck | CardZone::Extra | CardZone::Grave | CardZone::Banished
        )
    }
}

/// Address of a card on the field.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct CardKey {
    pub side: Side,
    pub zone: CardZone,
    pub sequence: u32,
    pub subsequence: u32,
}

impl CardKey {
    pub const fn new(side: Side, zone: CardZone, sequence: u32, subsequence: u32) -> Self {
        Self {
            side,
            zone,
            sequence,
            subsequence,
        }
    }
}

impl fmt::Display for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {:?} #{}.{}",
            self.side, self.zone, self.sequence, self.subsequence
        )
    }
}

/// Face and battle orientation of a card.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CardPosition {
    FaceUpAttack,
    FaceDownAttack,
    FaceUpDefense,
    FaceDownDefense,
}

impl CardPosition {
    pub fn is_face_up(self) -> bool {
        matches!(self, CardPosition::FaceUpAttack | CardPosition::FaceUpDefense)
    }

    pub fn is_defense(self) -> bool {
        matches!(self, CardPosition::FaceUpDefense | CardPosition::FaceDownDefense)
    }

    /// Orientation a card takes when it arrives at `key` without an explicit one.
    pub fn default_for(key: &CardKey) -> Self {
        match key.zone {
            CardZone::Deck | CardZone::Extra => CardPosition::FaceDownAttack,
            CardZone::Hand if key.side == Side::Far => CardPosition::FaceDownAttack,
            _ => CardPosition::FaceUpAttack,
        }
    }
}

slotmap::new_key_type! {
    /// Generational handle to a live card. Stale after the card is removed.
    pub struct CardId;
}

/// Card storage with address lookup and vertex slot recycling.
pub struct CardArena {
    cards: SlotMap<CardId, FieldCard>,
    by_key: HashMap<CardKey, CardId>,
    free_slots: Vec<usize>,
    next_slot: usize,
    capacity: usize,
}

impl CardArena {
    pub fn new(capacity: usize) -> Self {
        Self {
            cards: SlotMap::with_capacity_and_key(capacity),
            by_key: HashMap::new(),
            free_slots: Vec::new(),
            next_slot: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// One past the highest slot ever handed out since the last clear.
    pub fn high_water(&self) -> usize {
        self.next_slot
    }

    /// Reserves a vertex slot, preferring the most recently freed one.
    pub fn allocate_slot(&mut self) -> Result<usize, SceneError> {
        if let Some(slot) = self.free_slots.pop() {
            return Ok(slot);
        }
        if self.next_slot >= self.capacity {
            return Err(SceneError::CardCapacity {
                capacity: self.capacity,
            });
        }
        let slot = self.next_slot;
        self.next_slot += 1;
        Ok(slot)
    }

    /// Returns an unused slot reservation.
    pub fn release_slot(&mut self, slot: usize) {
        debug_assert!(!self.free_slots.contains(&slot));
        self.free_slots.push(slot);
    }

    /// Stores a card under its key. The card must hold a slot from `allocate_slot`.
    pub fn insert(&mut self, card: FieldCard) -> Result<CardId, SceneError> {
        let key = card.key();
        if self.by_key.contains_key(&key) {
            return Err(SceneError::Occupied(key));
        }
        let id = self.cards.insert(card);
        self.by_key.insert(key, id);
        Ok(id)
    }

    pub fn id(&self, key: &CardKey) -> Option<CardId> {
        self.by_key.get(key).copied()
    }

    pub fn get(&self, id: CardId) -> Option<&FieldCard> {
        self.cards.get(id)
    }

    pub fn get_mut(&mut self, id: CardId) -> Option<&mut FieldCard> {
        self.cards.get_mut(id)
    }

    pub fn by_key(&self, key: &CardKey) -> Option<&FieldCard> {
        self.id(key).and_then(|id| self.cards.get(id))
    }

    /// Removes the card at `key` and frees its vertex slot.
    pub fn remove(&mut self, key: &CardKey) -> Option<FieldCard> {
        let id = self.by_key.remove(key)?;
        let card = self.cards.remove(id)?;
        self.free_slots.push(card.state().vertex_index);
        Some(card)
    }

    /// Moves the card at `from` to the address `to`, keeping its handle and slot.
    pub fn rekey(&mut self, from: &CardKey, to: CardKey) -> Result<CardId, SceneError> {
        if from == &to {
            return self.id(from).ok_or(SceneError::NoCard(*from));
        }
        if self.by_key.contains_key(&to) {
            return Err(SceneError::Occupied(to));
        }
        let id = self.by_key.remove(from).ok_or(SceneError::NoCard(*from))?;
        if let Some(card) = self.cards.get_mut(id) {
            card.set_key(to);
        }
        self.by_key.insert(to, id);
        Ok(id)
    }

    pub fn clear(&mut self) {
        self.cards.clear();
        self.by_key.clear();
        self.free_slots.clear();
        self.next_slot = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = (CardId, &FieldCard)> {
        self.cards.iter()
    }

    pub fn ids(&self) -> Vec<CardId> {
        self.cards.keys().collect()
    }

    /// Cards in `side`'s hand, in sequence order.
    pub fn hand(&self, side: Side) -> Vec<CardId> {
        let mut hand: Vec<(u32, CardId)> = self
            .by_key
            .iter()
            .filter(|(k, _)| k.side == side && k.zone == CardZone::Hand)
            .map(|(k, id)| (k.sequence, *id))
            .collect();
        hand.sort_unstable_by_key(|(seq, _)| *seq);
        hand.into_iter().map(|(_, id)| id).collect()
    }
}

impl ObjectStore<CardId> for CardArena {
    fn resolve(&mut self, key: CardId) -> Option<&mut dyn FieldObject> {
        self.cards.get_mut(key).map(|c| c as &mut dyn FieldObject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{CardFaces, CardGeometry};

    #[test]
    fn spell_sequences_cover_field_and_pendulum() {
        assert_eq!(CardZone::Spell.block_index(0), Some(SPELL_BLOCK));
        assert_eq!(CardZone::Spell.block_index(5), Some(FIELD_SPELL_BLOCK));
        assert_eq!(CardZone::Spell.block_index(7), Some(PENDULUM_RIGHT_BLOCK));
        assert_eq!(CardZone::Spell.block_index(8), None);
        assert_eq!(CardZone::Monster.block_index(4), Some(MONSTER_BLOCK + 4));
        assert_eq!(CardZone::Hand.block_index(0), None);
    }

    #[test]
    fn default_positions_hide_decks_and_far_hand() {
        let near_hand = CardKey::new(Side::Near, CardZone::Hand, 0, 0);
        let far_hand = CardKey::new(Side::Far, CardZone::Hand, 0, 0);
        let deck = CardKey::new(Side::Near, CardZone::Deck, 3, 0);
        assert!(CardPosition::default_for(&near_hand).is_face_up());
        assert!(!CardPosition::default_for(&far_hand).is_face_up());
        assert!(!CardPosition::default_for(&deck).is_face_up());
    }

    #[test]
    fn slots_recycle_most_recent_first() {
        let mut arena = CardArena::new(3);
        let a = arena.allocate_slot().unwrap();
        let b = arena.allocate_slot().unwrap();
        arena.release_slot(a);
        assert_eq!(arena.allocate_slot().unwrap(), a);
        assert_eq!(arena.allocate_slot().unwrap(), 2);
        assert_ne!(a, b);
        assert_eq!(
            arena.allocate_slot(),
            Err(SceneError::CardCapacity { capacity: 3 })
        );
    }

    fn place(arena: &mut CardArena, key: CardKey) -> CardId {
        let slot = arena.allocate_slot().unwrap();
        let card = FieldCard::new(
            slot,
            key,
            1,
            CardPosition::FaceUpAttack,
            &CardGeometry::default(),
            &CardFaces::default(),
        );
        arena.insert(card).unwrap()
    }

    #[test]
    fn rekey_keeps_handle_and_slot() {
        let mut arena = CardArena::new(4);
        let from = CardKey::new(Side::Near, CardZone::Hand, 0, 0);
        let to = CardKey::new(Side::Near, CardZone::Monster, 2, 0);
        let id = place(&mut arena, from);

        assert_eq!(arena.rekey(&from, to), Ok(id));
        assert_eq!(arena.id(&from), None);
        assert_eq!(arena.by_key(&to).unwrap().key(), to);
        assert_eq!(arena.rekey(&from, to), Err(SceneError::Occupied(to)));
    }

    #[test]
    fn remove_invalidates_handle_and_frees_slot() {
        let mut arena = CardArena::new(2);
        let key = CardKey::new(Side::Far, CardZone::Grave, 0, 0);
        let id = place(&mut arena, key);
        let slot = arena.get(id).unwrap().state().vertex_index;

        assert!(arena.remove(&key).is_some());
        assert!(arena.get(id).is_none());
        assert!(arena.resolve(id).is_none());
        assert_eq!(arena.allocate_slot(), Ok(slot));
    }

    #[test]
    fn hand_is_sorted_by_sequence() {
        let mut arena = CardArena::new(8);
        let ids: Vec<CardId> = [2, 0, 1]
            .into_iter()
            .map(|seq| place(&mut arena, CardKey::new(Side::Near, CardZone::Hand, seq, 0)))
            .collect();
        place(&mut arena, CardKey::new(Side::Far, CardZone::Hand, 0, 0));
        assert_eq!(arena.hand(Side::Near), vec![ids[1], ids[2], ids[0]]);
    }

    #[test]
    fn side_numbers_round_trip() {
        for side in Side::BOTH {
            assert_eq!(Side::from_number(side.number()), Some(side));
        }
        assert_eq!(Side::from_number(0), None);
    }
}
