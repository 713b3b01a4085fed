//! World wrapper around hecs

use hecs::Entity;

use super::{Body, Cover, Transform, Vitals};
use crate::ai::BodySnapshot;

/// Encounter world containing every body the agents can perceive
pub struct World {
    /// The underlying hecs world
    pub inner: hecs::World,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn an entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Despawn an entity
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Get a reference to a component
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a mutable reference to a component
    pub fn get_mut<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Check if an entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Get the number of entities
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    /// Check if the world is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Query for entities with specific components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query::<Q>()
    }

    /// Query for entities with specific components (mutable)
    pub fn query_mut<Q: hecs::Query>(&mut self) -> hecs::QueryMut<'_, Q> {
        self.inner.query_mut::<Q>()
    }

    /// Read what perception needs to know about a body.
    ///
    /// Returns `None` for despawned entities and entities without a body.
    pub fn snapshot(&self, entity: Entity) -> Option<BodySnapshot> {
        let transform = *self.get::<Transform>(entity).ok()?;
        let body = *self.get::<Body>(entity).ok()?;
        let dead = self
            .get::<Vitals>(entity)
            .map(|vitals| vitals.is_dead())
            .unwrap_or(false);
        let in_cover = self
            .get::<Cover>(entity)
            .map(|cover| cover.0)
            .unwrap_or(false);

        Some(BodySnapshot {
            entity,
            position: transform.position,
            rotation: transform.rotation,
            active: body.active,
            dead,
            in_cover,
        })
    }

    /// Copy an agent-owned transform into the world.
    pub fn write_transform(&mut self, entity: Entity, transform: Transform) {
        if let Ok(mut stored) = self.get_mut::<Transform>(entity) {
            *stored = transform;
        }
    }

    /// Mark a body active or inactive.
    pub fn set_active(&mut self, entity: Entity, active: bool) {
        if let Ok(mut body) = self.get_mut::<Body>(entity) {
            body.active = active;
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
