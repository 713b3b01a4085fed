//! Collision layers
//!
//! Each collider lives on exactly one layer; queries pass a mask of the
//! layers they care about.

use std::ops::BitOr;

use rapier3d::prelude::{Group, InteractionGroups};

/// A set of collision layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layer(u32);

impl Layer {
    /// No layer
    pub const NONE: Self = Self(0);
    /// The player
    pub const PLAYER: Self = Self(1 << 0);
    /// Ground monsters
    pub const MONSTER: Self = Self(1 << 1);
    /// Support drones
    pub const DRONE: Self = Self(1 << 2);
    /// Destructible props
    pub const PROP: Self = Self(1 << 3);
    /// Static level geometry
    pub const ENVIRONMENT: Self = Self(1 << 4);
    /// Every layer
    pub const ALL: Self = Self(u32::MAX);

    /// Raw bits
    #[must_use]
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check if any layer of `other` is in this set.
    #[must_use]
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Both sets combined
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Everything except `other`
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Groups for a collider living on this layer.
    pub(crate) fn membership(self) -> InteractionGroups {
        InteractionGroups::new(Group::from_bits_truncate(self.0), Group::ALL)
    }

    /// Groups for a query that only sees this mask.
    pub(crate) fn query_mask(self) -> InteractionGroups {
        InteractionGroups::new(Group::ALL, Group::from_bits_truncate(self.0))
    }
}

impl BitOr for Layer {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::ENVIRONMENT
    }
}
