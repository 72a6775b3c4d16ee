use crate::core::{BodyHandle, JointHandle};
use crate::error::PhysicsError;
use crate::Result;

/// Generic storage trait for physics objects
pub trait Storage<T, H> {
    /// Creates a new empty storage
    fn new() -> Self;

    /// Adds an item to the storage and returns its handle
    fn add(&mut self, item: T) -> H;

    /// Gets a reference to an item by its handle
    fn get(&self, handle: H) -> Option<&T>;

    /// Gets a mutable reference to an item by its handle
    fn get_mut(&mut self, handle: H) -> Option<&mut T>;

    /// Removes an item from the storage
    fn remove(&mut self, handle: H) -> Option<T>;

    /// Returns the number of items in the storage
    fn len(&self) -> usize;

    /// Returns whether the storage is empty
    fn is_empty(&self) -> bool;

    /// Clears all items from the storage
    fn clear(&mut self);

    /// Returns all live handles in insertion order
    fn handles(&self) -> Vec<H>;

    /// Returns an iterator over all items in insertion order
    fn iter<'a>(&'a self) -> impl Iterator<Item = (H, &'a T)> + 'a where T: 'a;

    /// Returns a mutable iterator over all items in insertion order
    fn iter_mut<'a>(&'a mut self) -> impl Iterator<Item = (H, &'a mut T)> + 'a where T: 'a;
}

/// Dense entries sorted by id. Ids come from a monotonic counter and are never
/// reused, so sorted order is insertion order and lookups are binary searches.
#[derive(Debug)]
struct Slots<T> {
    entries: Vec<(u32, T)>,
    next_id: u32,
}

impl<T> Slots<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1, // Start at 1, so 0 can represent invalid handle
        }
    }

    fn push(&mut self, item: T) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, item));
        id
    }

    #[inline]
    fn index(&self, id: u32) -> Option<usize> {
        self.entries.binary_search_by_key(&id, |(entry_id, _)| *entry_id).ok()
    }

    fn get(&self, id: u32) -> Option<&T> {
        self.index(id).map(|i| &self.entries[i].1)
    }

    fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        self.index(id).map(|i| &mut self.entries[i].1)
    }

    fn take(&mut self, id: u32) -> Option<T> {
        self.index(id).map(|i| self.entries.remove(i).1)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        // Keep the counter so handles handed out earlier are never reissued
        self.entries.clear();
    }

    fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.entries.iter().map(|(id, item)| (*id, item))
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> {
        self.entries.iter_mut().map(|(id, item)| (*id, item))
    }

    fn pair_mut(&mut self, a: u32, b: u32) -> Option<(&mut T, &mut T)> {
        let ia = self.index(a)?;
        let ib = self.index(b)?;
        if ia == ib {
            return None;
        }

        let (lo, hi) = (ia.min(ib), ia.max(ib));
        let (left, right) = self.entries.split_at_mut(hi);
        let lo_item = &mut left[lo].1;
        let hi_item = &mut right[0].1;

        if ia < ib {
            Some((lo_item, hi_item))
        } else {
            Some((hi_item, lo_item))
        }
    }
}

/// Storage for physics bodies
#[derive(Debug)]
pub struct BodyStorage<T> {
    slots: Slots<T>,
}

impl<T> Storage<T, BodyHandle> for BodyStorage<T> {
    fn new() -> Self {
        Self { slots: Slots::new() }
    }

    fn add(&mut self, item: T) -> BodyHandle {
        BodyHandle(self.slots.push(item))
    }

    fn get(&self, handle: BodyHandle) -> Option<&T> {
        self.slots.get(handle.0)
    }

    fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut T> {
        self.slots.get_mut(handle.0)
    }

    fn remove(&mut self, handle: BodyHandle) -> Option<T> {
        self.slots.take(handle.0)
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn is_empty(&self) -> bool {
        self.slots.len() == 0
    }

    fn clear(&mut self) {
        self.slots.clear();
    }

    fn handles(&self) -> Vec<BodyHandle> {
        self.slots.iter().map(|(id, _)| BodyHandle(id)).collect()
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = (BodyHandle, &'a T)> + 'a where T: 'a {
        self.slots.iter().map(|(id, item)| (BodyHandle(id), item))
    }

    fn iter_mut<'a>(&'a mut self) -> impl Iterator<Item = (BodyHandle, &'a mut T)> + 'a where T: 'a {
        self.slots.iter_mut().map(|(id, item)| (BodyHandle(id), item))
    }
}

impl<T> BodyStorage<T> {
    /// Gets a body by its handle, returning an error if not found
    pub fn get_body(&self, handle: BodyHandle) -> Result<&T> {
        self.get(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Body with handle {:?} not found", handle)))
    }

    /// Gets a mutable reference to a body by its handle, returning an error if not found
    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Result<&mut T> {
        self.get_mut(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Body with handle {:?} not found", handle)))
    }

    /// Borrows two distinct bodies mutably at once, in argument order
    pub fn get_pair_mut(&mut self, a: BodyHandle, b: BodyHandle) -> Result<(&mut T, &mut T)> {
        if a == b {
            return Err(PhysicsError::InvalidParameter(format!(
                "Cannot borrow body {:?} twice",
                a
            )));
        }
        self.slots.pair_mut(a.0, b.0).ok_or_else(|| {
            PhysicsError::ResourceNotFound(format!("Body pair {:?}/{:?} not found", a, b))
        })
    }
}

/// Storage for joints
#[derive(Debug)]
pub struct JointStorage<T> {
    slots: Slots<T>,
}

impl<T> Storage<T, JointHandle> for JointStorage<T> {
    fn new() -> Self {
        Self { slots: Slots::new() }
    }

    fn add(&mut self, item: T) -> JointHandle {
        JointHandle(self.slots.push(item))
    }

    fn get(&self, handle: JointHandle) -> Option<&T> {
        self.slots.get(handle.0)
    }

    fn get_mut(&mut self, handle: JointHandle) -> Option<&mut T> {
        self.slots.get_mut(handle.0)
    }

    fn remove(&mut self, handle: JointHandle) -> Option<T> {
        self.slots.take(handle.0)
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn is_empty(&self) -> bool {
        self.slots.len() == 0
    }

    fn clear(&mut self) {
        self.slots.clear();
    }

    fn handles(&self) -> Vec<JointHandle> {
        self.slots.iter().map(|(id, _)| JointHandle(id)).collect()
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = (JointHandle, &'a T)> + 'a where T: 'a {
        self.slots.iter().map(|(id, item)| (JointHandle(id), item))
    }

    fn iter_mut<'a>(&'a mut self) -> impl Iterator<Item = (JointHandle, &'a mut T)> + 'a where T: 'a {
        self.slots.iter_mut().map(|(id, item)| (JointHandle(id), item))
    }
}

impl<T> JointStorage<T> {
    /// Gets a joint by its handle, returning an error if not found
    pub fn get_joint(&self, handle: JointHandle) -> Result<&T> {
        self.get(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Joint with handle {:?} not found", handle)))
    }

    /// Gets a mutable reference to a joint by its handle, returning an error if not found
    pub fn get_joint_mut(&mut self, handle: JointHandle) -> Result<&mut T> {
        self.get_mut(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Joint with handle {:?} not found", handle)))
    }
}
