//! Field objects: zone blocks and cards.
//!
//! Both variants share [`ObjectState`] (slot index, geometry, UVs, animated
//! opacity and highlight) and expose the same three capabilities through
//! [`FieldObject`]. Animating objects are tracked by [`Worklist`]s that hold
//! handles, never the objects themselves.

mod block;
mod card;

use glam::{Vec2, Vec3};

use crate::animator::Animator;
use crate::buffers::VertexRegion;
use crate::layout::{LayoutRect, LayoutSource};
use crate::vertex::FieldVertex;

pub use block::{BlockId, FieldBlock, FieldBlocks};
pub use card::{CardFaces, CardGeometry, FieldCard, RestPose};

/// State shared by every field object.
#[derive(Debug, Clone)]
pub struct ObjectState {
    /// Slot within the object's vertex region.
    pub vertex_index: usize,
    pub vertex: Vec<Vec3>,
    pub texcoord: Vec<Vec2>,
    pub alpha: Animator<f32>,
    pub hl: Animator<f32>,
    /// Enrolled in a worklist. Guards against double enrollment.
    pub updating: bool,
}

impl ObjectState {
    pub fn new(vertex_index: usize, vertices: usize) -> Self {
        Self {
            vertex_index,
            vertex: vec![Vec3::ZERO; vertices],
            texcoord: vec![Vec2::ZERO; vertices],
            alpha: Animator::new(1.0),
            hl: Animator::new(0.0),
            updating: false,
        }
    }

    /// Advances opacity and highlight; true while either is still moving.
    pub fn advance(&mut self, now: f64) -> bool {
        self.alpha.update(now);
        self.hl.update(now);
        self.alpha.needs_update() || self.hl.needs_update()
    }

    /// Packs `positions` with this object's UVs and current scalars.
    pub fn pack(&self, positions: impl IntoIterator<Item = Vec3>) -> Vec<FieldVertex> {
        let alpha = self.alpha.get();
        let hl = self.hl.get();
        positions
            .into_iter()
            .zip(&self.texcoord)
            .map(|(p, uv)| FieldVertex::new(p, *uv, alpha, hl))
            .collect()
    }
}

/// Capabilities the scene relies on, independent of the object kind.
pub trait FieldObject {
    fn state(&self) -> &ObjectState;
    fn state_mut(&mut self) -> &mut ObjectState;

    /// Writes the current geometry and scalars into this object's slot.
    fn refresh_vertices(&self, region: &mut VertexRegion);

    /// Advances every animator, refreshes, and reports whether the object
    /// still needs per-frame updates.
    fn update_vertices(&mut self, now: f64, region: &mut VertexRegion) -> bool;

    /// Point-in-quad test in field coordinates against the first quad.
    ///
    /// Vertices 0, 1 and 2 are the top-left, top-right and bottom-left
    /// corners; the quad is treated as two independent axis intervals.
    fn check_inside(&self, x: f32, y: f32) -> bool {
        let v = &self.state().vertex;
        if v.len() < 3 {
            return false;
        }
        within(x, v[0].x, v[1].x) && within(y, v[0].y, v[2].y)
    }
}

#[inline]
fn within(value: f32, a: f32, b: f32) -> bool {
    value >= a.min(b) && value <= a.max(b)
}

/// Resolves worklist handles to live objects.
pub trait ObjectStore<K> {
    /// `None` when the handle no longer refers to a live object.
    fn resolve(&mut self, key: K) -> Option<&mut dyn FieldObject>;
}

/// Handles of objects whose animations have not settled.
#[derive(Debug)]
pub struct Worklist<K> {
    entries: Vec<K>,
}

impl<K> Default for Worklist<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: Copy> Worklist<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds `key` unless `object` is already enrolled somewhere.
    pub fn enroll(&mut self, key: K, object: &mut dyn FieldObject) -> bool {
        let state = object.state_mut();
        if state.updating {
            return false;
        }
        state.updating = true;
        self.entries.push(key);
        true
    }

    /// Updates every enrolled object, dropping expired handles and objects
    /// that have settled.
    pub fn advance<S>(&mut self, store: &mut S, now: f64, region: &mut VertexRegion)
    where
        S: ObjectStore<K> + ?Sized,
    {
        self.entries.retain(|key| {
            let Some(object) = store.resolve(*key) else {
                return false;
            };
            if object.update_vertices(now, region) {
                true
            } else {
                object.state_mut().updating = false;
                false
            }
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Named rect from `layout`, or a zero-size rect at the origin.
pub(crate) fn layout_rect_or_default(layout: &dyn LayoutSource, name: &str) -> LayoutRect {
    layout.layout_rect(name).unwrap_or_else(|| {
        log::warn!("layout has no rect named {name}");
        LayoutRect::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::Easing;
    use crate::assets::TextureRegion;

    struct Store(Vec<Option<FieldBlock>>);

    impl ObjectStore<usize> for Store {
        fn resolve(&mut self, key: usize) -> Option<&mut dyn FieldObject> {
            self.0
                .get_mut(key)
                .and_then(Option::as_mut)
                .map(|b| b as &mut dyn FieldObject)
        }
    }

    fn block(slot: usize) -> FieldBlock {
        FieldBlock::new(
            slot,
            &LayoutRect::new(0.0, 0.0, 2.0, 2.0),
            TextureRegion::from_rect(0.0, 0.0, 1.0, 1.0),
        )
    }

    // ── check_inside ─────────────────────────────────────────────────────

    #[test]
    fn inside_test_is_inclusive_and_orientation_free() {
        let near = block(0);
        assert!(near.check_inside(1.0, -1.0));
        assert!(!near.check_inside(1.01, 0.0));

        let far = near.mirrored(17);
        assert!(far.check_inside(-0.5, 0.5));
        assert!(!far.check_inside(0.0, 1.5));
    }

    // ── worklists ────────────────────────────────────────────────────────

    #[test]
    fn enrollment_is_exclusive() {
        let mut store = Store(vec![Some(block(0))]);
        let mut list = Worklist::new();
        let object = store.resolve(0).unwrap();
        assert!(list.enroll(0, object));
        let object = store.resolve(0).unwrap();
        assert!(!list.enroll(0, object));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn settled_objects_leave_and_clear_flag() {
        let mut store = Store(vec![Some(block(0))]);
        let mut region = VertexRegion::new("t", 4, 1);
        let mut list = Worklist::new();
        {
            let object = store.resolve(0).unwrap();
            object.state_mut().hl.set_target(1.0, 0.0, 1.0, Easing::Linear);
            list.enroll(0, object);
        }

        list.advance(&mut store, 0.5, &mut region);
        assert_eq!(list.len(), 1);
        assert!((region.slot(0)[0].highlight() - 0.5).abs() < 0.01);

        list.advance(&mut store, 1.0, &mut region);
        assert!(list.is_empty());
        assert!(!store.resolve(0).unwrap().state().updating);
        assert_eq!(region.slot(0)[0].highlight(), 1.0);
    }

    #[test]
    fn expired_handles_are_pruned() {
        let mut store = Store(vec![Some(block(0)), Some(block(1))]);
        let mut region = VertexRegion::new("t", 4, 2);
        let mut list = Worklist::new();
        for key in 0..2 {
            let object = store.resolve(key).unwrap();
            object.state_mut().alpha.pulse(0.0, 1.0, 0.0, 1.0);
            list.enroll(key, object);
        }

        store.0[0] = None;
        list.advance(&mut store, 0.25, &mut region);
        assert_eq!(list.len(), 1);
    }
}
