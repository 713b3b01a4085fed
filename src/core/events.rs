//! AI Event Queue
//!
//! Agents never call into animation, audio or UI code. They push
//! fire-and-forget notifications here and whoever presents the game reads
//! them after the frame.
//!
//! # Design Principles
//!
//! - **Type Safety**: All notifications are variants of `AiEvent`
//! - **Double Buffering**: Events pushed during a frame become readable once
//!   the frame boundary is crossed
//! - **Zero Allocation**: Pre-allocated `VecDeque`s are reused every frame
//!
//! # Example
//!
//! ```ignore
//! // Inside an agent
//! ctx.emit(AiEvent::AttackFired { agent, target });
//!
//! // After Simulation::tick
//! for event in sim.events().iter() {
//!     if let AiEvent::AttackFired { agent, .. } = event {
//!         play_swing_animation(*agent);
//!     }
//! }
//! ```

use std::collections::VecDeque;

use glam::Vec3;
use hecs::Entity;

use crate::sim::GameState;

// ============================================================================
// Event Types
// ============================================================================

/// Notifications emitted by agents and the simulation.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AiEvent {
    // -------------------------------------------------------------------------
    // State Machine
    // -------------------------------------------------------------------------
    /// An agent entered a state.
    StateEntered {
        /// Agent entity
        agent: Entity,
        /// State name
        state: &'static str,
    },

    /// An agent left a state.
    StateExited {
        /// Agent entity
        agent: Entity,
        /// State name
        state: &'static str,
    },

    // -------------------------------------------------------------------------
    // Combat
    // -------------------------------------------------------------------------
    /// A melee swing landed on its cadence.
    AttackFired {
        /// Attacking agent
        agent: Entity,
        /// Victim
        target: Entity,
    },

    /// Something took damage (drives damage numbers and hit flashes).
    Damaged {
        /// Victim
        entity: Entity,
        /// Health removed
        amount: f32,
        /// Attacker, if known
        source: Option<Entity>,
        /// Critical flag
        critical: bool,
    },

    /// Something reached zero health.
    Killed {
        /// Victim
        entity: Entity,
        /// Attacker, if known
        killer: Option<Entity>,
    },

    /// A destroyed prop blew up.
    Exploded {
        /// Prop entity
        entity: Entity,
        /// Blast center
        point: Vec3,
        /// Blast reach
        radius: f32,
    },

    /// The elite started telegraphing its rush.
    ChargeTelegraph {
        /// Elite entity
        agent: Entity,
        /// Line start
        from: Vec3,
        /// Line end
        to: Vec3,
    },

    /// The elite's rush connected.
    DashHit {
        /// Elite entity
        agent: Entity,
        /// Victim
        target: Entity,
    },

    /// A drone fired a hit-scan round.
    ShotFired {
        /// Drone entity
        agent: Entity,
        /// Muzzle position
        origin: Vec3,
        /// Where the round stopped
        end: Vec3,
        /// Entity hit, if any
        hit: Option<Entity>,
    },

    /// A round hit a surface (spawn impact particles).
    HitEffect {
        /// Impact point
        point: Vec3,
        /// Surface normal
        normal: Vec3,
    },

    /// An agent started a jump across a traversal link.
    JumpStarted {
        /// Agent entity
        agent: Entity,
        /// Link start
        from: Vec3,
        /// Link end
        to: Vec3,
    },

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------
    /// A dead monster finished its death delay and left the world.
    Despawned {
        /// Agent entity
        agent: Entity,
    },

    /// A drone deactivated (recalled home or destroyed).
    DroneDeactivated {
        /// Drone entity
        agent: Entity,
    },

    /// Game state transition.
    GameStateChanged {
        /// New state
        state: GameState,
    },
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered event queue for frame-consistent event processing.
///
/// Events pushed during frame N are readable after the frame-N boundary
/// (`swap()`), until the next boundary.
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this frame
    pending: VecDeque<AiEvent>,
    /// Events from the last finished frame
    processing: VecDeque<AiEvent>,
}

impl EventQueue {
    /// Default initial capacity for event queues.
    const DEFAULT_CAPACITY: usize = 64;

    /// Create a new event queue with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a new event queue with specified initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an event for the current frame.
    #[inline]
    pub fn push(&mut self, event: AiEvent) {
        self.pending.push_back(event);
    }

    /// Cross the frame boundary: the current frame's events become readable
    /// and the previous frame's are dropped.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over events of the last finished frame.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &AiEvent> {
        self.processing.iter()
    }

    /// Drain events of the last finished frame.
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = AiEvent> + '_ {
        self.processing.drain(..)
    }

    /// Check if there are any readable events.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Number of readable events.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Number of events written during the current frame.
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Clear both buffers.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
