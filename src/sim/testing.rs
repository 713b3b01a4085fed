//! Scripted fakes shared by agent tests

use fastrand::Rng;
use glam::{Quat, Vec3};
use hecs::Entity;
use rustc_hash::FxHashMap;

use super::{GameState, SimContext};
use crate::ai::{BodySnapshot, NavigationPort, ScanBuffer, TraversalLink};
use crate::combat::{Damage, Stat};
use crate::core::AiEvent;
use crate::physics::{Layer, RayHit};

/// A body living in a [`TestContext`]
#[derive(Debug, Clone)]
pub struct TestBody {
    pub snapshot: BodySnapshot,
    pub layer: Layer,
    pub radius: f32,
    pub health: Stat,
}

/// In-memory world with recorded side effects
pub struct TestContext {
    pub state: GameState,
    pub rng: Rng,
    pub events: Vec<AiEvent>,
    pub bodies: FxHashMap<Entity, TestBody>,
    pub primary: Option<Entity>,
    pub hits: Vec<(Entity, Damage)>,
    pub pushes: Vec<(Entity, Vec3, f32)>,
    ids: hecs::World,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            state: GameState::Playing,
            rng: Rng::with_seed(7),
            events: Vec::new(),
            bodies: FxHashMap::default(),
            primary: None,
            hits: Vec::new(),
            pushes: Vec::new(),
            ids: hecs::World::new(),
        }
    }

    /// Fresh entity id with no body
    pub fn entity(&mut self) -> Entity {
        self.ids.spawn(())
    }

    /// Add a body and return its entity
    pub fn add_body(&mut self, position: Vec3, layer: Layer, health: f32) -> Entity {
        let entity = self.entity();
        self.bodies.insert(
            entity,
            TestBody {
                snapshot: BodySnapshot {
                    entity,
                    position,
                    rotation: Quat::IDENTITY,
                    active: true,
                    dead: false,
                    in_cover: false,
                },
                layer,
                radius: 0.5,
                health: Stat::new(health),
            },
        );
        entity
    }

    /// Add the player and make it the primary target
    pub fn add_player(&mut self, position: Vec3) -> Entity {
        let player = self.add_body(position, Layer::PLAYER, 100.0);
        self.primary = Some(player);
        player
    }

    pub fn move_body(&mut self, entity: Entity, position: Vec3) {
        if let Some(body) = self.bodies.get_mut(&entity) {
            body.snapshot.position = position;
        }
    }

    pub fn health(&self, entity: Entity) -> f32 {
        self.bodies.get(&entity).map_or(0.0, |b| b.health.value())
    }

    pub fn count(&self, matches: impl Fn(&AiEvent) -> bool) -> usize {
        self.events.iter().filter(|e| matches(e)).count()
    }

    pub fn entered(&self, state: &'static str) -> usize {
        self.count(|e| match e {
            AiEvent::StateEntered { state: entered, .. } => *entered == state,
            _ => false,
        })
    }
}

impl SimContext for TestContext {
    fn game_state(&self) -> GameState {
        self.state
    }

    fn rng(&mut self) -> &mut Rng {
        &mut self.rng
    }

    fn emit(&mut self, event: AiEvent) {
        self.events.push(event);
    }

    fn primary_target(&self) -> Option<Entity> {
        self.primary
    }

    fn locate(&self, entity: Entity) -> Option<BodySnapshot> {
        self.bodies.get(&entity).map(|b| b.snapshot)
    }

    fn apply_damage(&mut self, target: Entity, damage: &Damage) -> bool {
        let Some(body) = self.bodies.get_mut(&target) else {
            return false;
        };
        if body.snapshot.dead || !body.snapshot.active {
            return false;
        }
        body.health.decrease(damage.value);
        body.snapshot.dead = body.health.is_depleted();
        self.hits.push((target, *damage));
        true
    }

    fn push_body(&mut self, target: Entity, direction: Vec3, force: f32) {
        self.pushes.push((target, direction, force));
    }

    fn scan(
        &self,
        center: Vec3,
        radius: f32,
        mask: Layer,
        exclude: Option<Entity>,
        out: &mut ScanBuffer,
    ) {
        out.clear();
        for (entity, body) in &self.bodies {
            if Some(*entity) == exclude || !body.layer.intersects(mask) || !body.snapshot.active {
                continue;
            }
            if body.snapshot.position.distance(center) <= radius + body.radius
                && !out.push(*entity)
            {
                break;
            }
        }
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: Layer,
        exclude: Option<Entity>,
    ) -> Option<RayHit> {
        let direction = direction.normalize_or_zero();
        let mut best: Option<RayHit> = None;
        for (entity, body) in &self.bodies {
            if Some(*entity) == exclude || !body.layer.intersects(mask) || !body.snapshot.active {
                continue;
            }
            // Ray against a sphere around the body
            let to_center = body.snapshot.position - origin;
            let along = to_center.dot(direction);
            if along < 0.0 {
                continue;
            }
            let miss_sq = to_center.length_squared() - along * along;
            let r_sq = body.radius * body.radius;
            if miss_sq > r_sq {
                continue;
            }
            let distance = along - (r_sq - miss_sq).sqrt();
            if distance > max_distance || best.is_some_and(|b| b.distance <= distance) {
                continue;
            }
            best = Some(RayHit {
                entity: Some(*entity),
                point: origin + direction * distance,
                normal: -direction,
                distance,
            });
        }
        best
    }
}

/// Navigator whose answers are set by the test
#[derive(Debug, Clone)]
pub struct ScriptedNav {
    pub position: Vec3,
    pub destination: Option<Vec3>,
    pub pending: bool,
    pub remaining: f32,
    pub stopping: f32,
    pub link: Option<TraversalLink>,
    pub walkable: bool,
    pub resets: usize,
    pub speed: f32,
    /// Move straight toward the destination while advancing
    pub drive: bool,
}

impl ScriptedNav {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            destination: None,
            pending: false,
            remaining: 0.0,
            stopping: 0.0,
            link: None,
            walkable: true,
            resets: 0,
            speed: 0.0,
            drive: false,
        }
    }
}

impl NavigationPort for ScriptedNav {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn warp(&mut self, position: Vec3) {
        self.position = position;
    }

    fn set_destination(&mut self, target: Vec3) {
        self.destination = Some(target);
        if self.drive {
            self.remaining = self.position.distance(target);
        }
    }

    fn reset_path(&mut self) {
        self.destination = None;
        self.resets += 1;
    }

    fn is_path_pending(&self) -> bool {
        self.pending
    }

    fn remaining_distance(&self) -> f32 {
        self.remaining
    }

    fn stopping_distance(&self) -> f32 {
        self.stopping
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    fn traversal_link(&self) -> Option<TraversalLink> {
        self.link
    }

    fn complete_traversal_link(&mut self) {
        if let Some(link) = self.link.take() {
            self.position = link.end;
        }
    }

    fn sample_position(&self, point: Vec3, _max_distance: f32) -> Option<Vec3> {
        self.walkable.then_some(point)
    }

    fn advance(&mut self, dt: f32) {
        if !self.drive {
            return;
        }
        if let Some(target) = self.destination {
            self.position = crate::ai::move_towards(self.position, target, self.speed * dt);
            self.remaining = self.position.distance(target);
        }
    }

    fn nudge(&mut self, delta: Vec3) -> Vec3 {
        self.position += delta;
        delta
    }

    fn velocity(&self) -> Vec3 {
        Vec3::ZERO
    }
}
