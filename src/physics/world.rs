//! Spatial queries using rapier3d
//!
//! Agents never integrate rigid bodies; movement is kinematic and owned by
//! the navigator. Rapier is used purely as a query world: every body gets a
//! parentless collider tagged with its entity, positions are mirrored each
//! tick, and ray tests / sphere overlaps are answered from the query
//! pipeline.

use glam::Vec3;
use hecs::Entity;
use rapier3d::prelude::*;
use rustc_hash::FxHashMap;

use super::Layer;

/// Handle to a collider in the query world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle(pub rapier3d::geometry::ColliderHandle);

const NO_ENTITY: u128 = 0;

fn entity_tag(entity: Option<Entity>) -> u128 {
    entity.map_or(NO_ENTITY, |e| u128::from(e.to_bits().get()))
}

fn tagged_entity(user_data: u128) -> Option<Entity> {
    if user_data == NO_ENTITY {
        return None;
    }
    u64::try_from(user_data).ok().and_then(Entity::from_bits)
}

/// Query world manager
pub struct Physics {
    /// Always empty; the query API needs one
    rigid_body_set: RigidBodySet,
    /// Collider set
    collider_set: ColliderSet,
    /// Query pipeline for ray tests and overlaps
    query_pipeline: QueryPipeline,
    /// Collider of each entity
    by_entity: FxHashMap<Entity, ColliderHandle>,
}

impl Physics {
    /// Create an empty query world
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            query_pipeline: QueryPipeline::new(),
            by_entity: FxHashMap::default(),
        }
    }

    fn insert(
        &mut self,
        entity: Option<Entity>,
        builder: ColliderBuilder,
        position: Vec3,
        layer: Layer,
    ) -> ColliderHandle {
        let collider = builder
            .translation(vector![position.x, position.y, position.z])
            .collision_groups(layer.membership())
            .user_data(entity_tag(entity))
            .build();

        let handle = ColliderHandle(self.collider_set.insert(collider));
        if let Some(entity) = entity {
            self.by_entity.insert(entity, handle);
        }
        handle
    }

    /// Add a sphere collider for an entity
    pub fn add_sphere(
        &mut self,
        entity: Entity,
        position: Vec3,
        radius: f32,
        layer: Layer,
    ) -> ColliderHandle {
        self.insert(Some(entity), ColliderBuilder::ball(radius), position, layer)
    }

    /// Add an upright capsule collider for an entity; `position` is its feet
    pub fn add_capsule(
        &mut self,
        entity: Entity,
        position: Vec3,
        height: f32,
        radius: f32,
        layer: Layer,
    ) -> ColliderHandle {
        let half_height = (height * 0.5 - radius).max(0.0);
        let builder = ColliderBuilder::capsule_y(half_height, radius);
        let center = position + Vec3::Y * height * 0.5;
        self.insert(Some(entity), builder, center, layer)
    }

    /// Add a static box that belongs to no entity (walls, cover)
    pub fn add_static_box(&mut self, center: Vec3, half_extents: Vec3) -> ColliderHandle {
        let builder = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z);
        self.insert(None, builder, center, Layer::ENVIRONMENT)
    }

    /// Move an entity's collider; capsules keep their feet at `position`
    pub fn set_position(&mut self, entity: Entity, position: Vec3) {
        let Some(handle) = self.by_entity.get(&entity) else {
            return;
        };
        if let Some(collider) = self.collider_set.get_mut(handle.0) {
            let lift = collider
                .shape()
                .as_capsule()
                .map_or(0.0, |capsule| capsule.half_height() + capsule.radius);
            collider.set_translation(vector![position.x, position.y + lift, position.z]);
        }
    }

    /// Enable or disable an entity's collider
    pub fn set_enabled(&mut self, entity: Entity, enabled: bool) {
        if let Some(handle) = self.by_entity.get(&entity) {
            if let Some(collider) = self.collider_set.get_mut(handle.0) {
                collider.set_enabled(enabled);
            }
        }
    }

    /// Remove an entity's collider
    pub fn remove(&mut self, entity: Entity) {
        if let Some(handle) = self.by_entity.remove(&entity) {
            let mut islands = IslandManager::new();
            self.collider_set
                .remove(handle.0, &mut islands, &mut self.rigid_body_set, false);
        }
    }

    /// Rebuild the acceleration structure after colliders moved
    pub fn update(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Check if an entity has a collider
    pub fn contains(&self, entity: Entity) -> bool {
        self.by_entity.contains_key(&entity)
    }

    /// Number of colliders
    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }

    fn filter(&self, mask: Layer, exclude: Option<Entity>) -> QueryFilter<'_> {
        let mut filter = QueryFilter::default().groups(mask.query_mask());
        if let Some(handle) = exclude.and_then(|entity| self.by_entity.get(&entity)) {
            filter = filter.exclude_collider(handle.0);
        }
        filter
    }

    /// Cast a ray and return the first hit on `mask`
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: Layer,
        exclude: Option<Entity>,
    ) -> Option<RayHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }
        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            vector![direction.x, direction.y, direction.z],
        );

        self.query_pipeline
            .cast_ray(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                self.filter(mask, exclude),
            )
            .map(|(handle, distance)| {
                let point = ray.point_at(distance);
                let entity = self
                    .collider_set
                    .get(handle)
                    .and_then(|collider| tagged_entity(collider.user_data));
                RayHit {
                    entity,
                    point: Vec3::new(point.x, point.y, point.z),
                    normal: -direction,
                    distance,
                }
            })
    }

    /// Collect entities whose colliders overlap a sphere
    pub fn overlap_sphere(
        &self,
        center: Vec3,
        radius: f32,
        mask: Layer,
        exclude: Option<Entity>,
        mut visit: impl FnMut(Entity) -> bool,
    ) {
        let shape = Ball::new(radius);
        let position = Isometry::translation(center.x, center.y, center.z);

        self.query_pipeline.intersections_with_shape(
            &self.rigid_body_set,
            &self.collider_set,
            &position,
            &shape,
            self.filter(mask, exclude),
            |handle| {
                match self
                    .collider_set
                    .get(handle)
                    .and_then(|collider| tagged_entity(collider.user_data))
                {
                    Some(entity) => visit(entity),
                    None => true,
                }
            },
        );
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a ray test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Entity owning the collider, `None` for level geometry
    pub entity: Option<Entity>,
    /// The point of intersection
    pub point: Vec3,
    /// Surface normal facing the ray origin
    pub normal: Vec3,
    /// Distance from ray origin
    pub distance: f32,
}
