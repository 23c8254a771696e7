//! Generational arena of rigid bodies.
//!
//! The arena is the substrate the tick phases dispatch over. Slots keep their
//! generation across reuse, so a [`BodyHandle`] held past a removal resolves
//! to `None` instead of aliasing whichever body claimed the slot next. A body
//! removed mid-step stays valid data; later phases simply skip the vacated
//! slot.

use dynamics_types::{BodyHandle, DynamicsError, Result};

use crate::rigid_body::RigidBody;

#[derive(Debug)]
struct Slot {
    generation: u32,
    body: Option<RigidBody>,
}

/// Storage for all bodies in a simulation space.
#[derive(Debug, Default)]
pub struct BodySet {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl BodySet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set with room for `capacity` bodies.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Number of live bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the set holds no bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a body, wiring its collidable back-reference to the new slot.
    #[allow(clippy::cast_possible_truncation)]
    pub fn insert(&mut self, mut body: RigidBody) -> BodyHandle {
        let handle = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            BodyHandle::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                body: None,
            });
            BodyHandle::new(index, 0)
        };

        body.collidable_mut().set_owner(Some(handle));
        self.slots[handle.index()].body = Some(body);
        self.len += 1;
        handle
    }

    /// Remove a body, bumping the slot generation so the handle goes stale.
    pub fn remove(&mut self, handle: BodyHandle) -> Result<RigidBody> {
        let slot = self
            .slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .ok_or(DynamicsError::InvalidBodyHandle(handle))?;
        let mut body = slot
            .body
            .take()
            .ok_or(DynamicsError::InvalidBodyHandle(handle))?;

        slot.generation = slot.generation.wrapping_add(1);
        #[allow(clippy::cast_possible_truncation)]
        self.free.push(handle.index() as u32);
        self.len -= 1;

        body.collidable_mut().set_owner(None);
        body.collidable_mut().clear_pairs();
        Ok(body)
    }

    /// Look up a body by handle.
    #[must_use]
    pub fn get(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.body.as_ref())
    }

    /// Look up a body mutably by handle.
    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.body.as_mut())
    }

    /// Look up a body by handle, failing on a stale handle.
    pub fn try_get(&self, handle: BodyHandle) -> Result<&RigidBody> {
        self.get(handle)
            .ok_or(DynamicsError::InvalidBodyHandle(handle))
    }

    /// Iterate over live bodies with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            #[allow(clippy::cast_possible_truncation)]
            let handle = BodyHandle::new(i as u32, slot.generation);
            slot.body.as_ref().map(|body| (handle, body))
        })
    }

    /// Iterate mutably over live bodies with their handles.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut RigidBody)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            #[allow(clippy::cast_possible_truncation)]
            let handle = BodyHandle::new(i as u32, slot.generation);
            slot.body.as_mut().map(|body| (handle, body))
        })
    }

    /// Number of slots, live or vacated. Slot indices are stable.
    #[must_use]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// The body occupying a raw slot index, live or not.
    #[must_use]
    pub(crate) fn body_at_slot(&self, index: usize) -> Option<&RigidBody> {
        self.slots.get(index).and_then(|slot| slot.body.as_ref())
    }

    /// Parallel mutable access to live bodies with their handles.
    pub(crate) fn par_iter_mut(
        &mut self,
    ) -> impl rayon::iter::ParallelIterator<Item = (BodyHandle, &mut RigidBody)> {
        use rayon::prelude::*;
        self.slots.par_iter_mut().enumerate().filter_map(|(i, slot)| {
            #[allow(clippy::cast_possible_truncation)]
            let handle = BodyHandle::new(i as u32, slot.generation);
            slot.body.as_mut().map(|body| (handle, body))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::shape::Shape;

    fn body() -> RigidBody {
        RigidBody::kinematic(Shape::sphere(1.0))
    }

    #[test]
    fn test_insert_get_remove() {
        let mut set = BodySet::new();
        let h = set.insert(body());
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(h).unwrap().collidable().owner(), Some(h));

        let removed = set.remove(h).unwrap();
        assert!(removed.collidable().owner().is_none());
        assert!(set.is_empty());
        assert!(set.get(h).is_none());
    }

    #[test]
    fn test_stale_handle_detection() {
        let mut set = BodySet::new();
        let h = set.insert(body());
        set.remove(h).unwrap();

        // The slot is reused with a newer generation.
        let h2 = set.insert(body());
        assert_eq!(h.index(), h2.index());
        assert_ne!(h.generation(), h2.generation());

        assert!(set.get(h).is_none());
        assert!(set.get(h2).is_some());
        assert!(matches!(
            set.try_get(h),
            Err(DynamicsError::InvalidBodyHandle(_))
        ));
        assert!(matches!(
            set.remove(h),
            Err(DynamicsError::InvalidBodyHandle(_))
        ));
    }

    #[test]
    fn test_iteration_skips_vacated_slots() {
        let mut set = BodySet::new();
        let a = set.insert(body());
        let b = set.insert(body());
        let c = set.insert(body());
        set.remove(b).unwrap();

        let handles: Vec<_> = set.iter().map(|(h, _)| h).collect();
        assert_eq!(handles, vec![a, c]);
        assert_eq!(set.slot_count(), 3);
    }
}
