//! Object Pool for Agent Reuse
//!
//! Drones are recalled and redeployed many times per encounter. Instead of
//! dropping a recalled drone, its slot keeps the object parked so the next
//! deployment resets it in place.
//!
//! # Example
//!
//! ```ignore
//! let mut pool: Pool<Drone> = Pool::with_capacity(4);
//!
//! let slot = pool.acquire(|| Drone::new(cfg), |drone| drone.redeploy(position));
//! // ... drone flies home ...
//! pool.release(slot); // parked, not dropped
//! ```

// ============================================================================
// Pool Index
// ============================================================================

/// Index of a pool slot. Valid until the slot is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolIndex(usize);

impl PoolIndex {
    /// Get the raw index value.
    #[must_use]
    #[inline]
    pub const fn raw(self) -> usize {
        self.0
    }
}

// ============================================================================
// Pool Slot
// ============================================================================

#[derive(Debug)]
enum Slot<T> {
    /// Slot contains an active object
    Occupied(T),
    /// Slot is free; `next` links the free list, `parked` keeps the old object
    Vacant { next: usize, parked: Option<T> },
}

// ============================================================================
// Object Pool
// ============================================================================

/// A free-list pool that parks released objects for reuse.
///
/// | Operation | Time Complexity |
/// |-----------|-----------------|
/// | `acquire` | O(1) amortized  |
/// | `release` | O(1)            |
/// | `get`     | O(1)            |
#[derive(Debug)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free_head: usize,
    active_count: usize,
}

impl<T> Pool<T> {
    /// Sentinel value indicating end of free list.
    const NONE: usize = usize::MAX;

    /// Create a new empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a pool with pre-allocated slot capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: Self::NONE,
            active_count: 0,
        }
    }

    /// Take a slot.
    ///
    /// A parked object is revived with `reset`; otherwise `init` builds a
    /// new one.
    pub fn acquire(&mut self, init: impl FnOnce() -> T, reset: impl FnOnce(&mut T)) -> PoolIndex {
        self.active_count += 1;

        if self.free_head == Self::NONE {
            let index = self.slots.len();
            self.slots.push(Slot::Occupied(init()));
            return PoolIndex(index);
        }

        let index = self.free_head;
        let vacated = std::mem::replace(
            &mut self.slots[index],
            Slot::Vacant {
                next: Self::NONE,
                parked: None,
            },
        );

        let object = match vacated {
            Slot::Vacant { next, parked } => {
                self.free_head = next;
                match parked {
                    Some(mut object) => {
                        reset(&mut object);
                        object
                    }
                    None => init(),
                }
            }
            Slot::Occupied(_) => {
                debug_assert!(false, "free list points at an occupied slot");
                self.free_head = Self::NONE;
                init()
            }
        };

        self.slots[index] = Slot::Occupied(object);
        PoolIndex(index)
    }

    /// Park an object and free its slot.
    ///
    /// Returns `false` if the index was invalid or already free.
    pub fn release(&mut self, index: PoolIndex) -> bool {
        let idx = index.0;
        if !self.is_active(index) {
            return false;
        }

        let vacant = Slot::Vacant {
            next: self.free_head,
            parked: None,
        };
        if let Slot::Occupied(object) = std::mem::replace(&mut self.slots[idx], vacant) {
            self.slots[idx] = Slot::Vacant {
                next: self.free_head,
                parked: Some(object),
            };
        }

        self.free_head = idx;
        self.active_count -= 1;
        true
    }

    /// Get a reference to an active object.
    #[must_use]
    #[inline]
    pub fn get(&self, index: PoolIndex) -> Option<&T> {
        self.slots.get(index.0).and_then(|slot| match slot {
            Slot::Occupied(obj) => Some(obj),
            Slot::Vacant { .. } => None,
        })
    }

    /// Get a mutable reference to an active object.
    #[inline]
    pub fn get_mut(&mut self, index: PoolIndex) -> Option<&mut T> {
        self.slots.get_mut(index.0).and_then(|slot| match slot {
            Slot::Occupied(obj) => Some(obj),
            Slot::Vacant { .. } => None,
        })
    }

    /// Check if an index refers to an active object.
    #[must_use]
    #[inline]
    pub fn is_active(&self, index: PoolIndex) -> bool {
        self.slots
            .get(index.0)
            .is_some_and(|slot| matches!(slot, Slot::Occupied(_)))
    }

    /// Number of active objects.
    #[must_use]
    #[inline]
    pub const fn active_count(&self) -> usize {
        self.active_count
    }

    /// Number of parked objects waiting for reuse.
    #[must_use]
    pub fn parked_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Vacant { parked: Some(_), .. }))
            .count()
    }

    /// Check if the pool has no active objects.
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.active_count == 0
    }

    /// Indices of all active objects.
    pub fn indices(&self) -> impl Iterator<Item = PoolIndex> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot, Slot::Occupied(_)))
            .map(|(idx, _)| PoolIndex(idx))
    }

    /// Iterate over all active objects.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied(obj) => Some(obj),
            Slot::Vacant { .. } => None,
        })
    }
}

// ============================================================================
// Split Borrows
// ============================================================================

/// Mutable view of a pool's active objects, minus one that was split off.
#[derive(Debug)]
pub struct PoolRest<'a, T> {
    head: &'a mut [Slot<T>],
    tail: &'a mut [Slot<T>],
}

impl<T> PoolRest<'_, T> {
    /// Iterate over the active objects in the view.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.head
            .iter_mut()
            .chain(self.tail.iter_mut())
            .filter_map(|slot| match slot {
                Slot::Occupied(obj) => Some(obj),
                Slot::Vacant { .. } => None,
            })
    }
}

impl<T> Pool<T> {
    /// Borrow every active object through a [`PoolRest`].
    pub fn rest_mut(&mut self) -> PoolRest<'_, T> {
        PoolRest {
            head: &mut self.slots,
            tail: &mut [],
        }
    }

    /// Borrow one active object and, separately, all the others.
    ///
    /// Returns `None` if `index` is not active.
    pub fn split_mut(&mut self, index: PoolIndex) -> Option<(&mut T, PoolRest<'_, T>)> {
        if index.0 >= self.slots.len() {
            return None;
        }
        let (head, rest) = self.slots.split_at_mut(index.0);
        let (slot, tail) = rest.split_first_mut()?;
        match slot {
            Slot::Occupied(obj) => Some((obj, PoolRest { head, tail })),
            Slot::Vacant { .. } => None,
        }
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
