//! Encounter simulation
//!
//! Owns the world, the query world, the navigation grid and every agent,
//! and steps them in a fixed order:
//!
//! 1. Game flow (`Ready` counts down into `Playing`)
//! 2. Player regeneration and knockback
//! 3. Collider positions mirrored into the query world
//! 4. Monsters, then drones, each writing its transform and health back
//! 5. Game over check
//! 6. Despawned monsters removed, deactivated drones parked in the pool
//! 7. Event buffer swap
//!
//! An agent ticks against a frame: the shared stage plus mutable views
//! of every *other* agent, so a hit on a monster or drone goes through that
//! agent's own damage interface.

use std::sync::Arc;

use fastrand::Rng;
use glam::{Quat, Vec3};
use hecs::Entity;
use smallvec::SmallVec;

use super::{GameState, SimContext};
use crate::ai::{BodySnapshot, Drone, Grid, GridNavigator, Monster, ScanBuffer};
use crate::combat::{Damage, Damageable, Stat};
use crate::core::{
    AiConfig, AiEvent, ConfigError, EventQueue, MonsterConfig, Pool, PoolIndex, PoolRest,
    PropConfig,
};
use crate::ecs::{Body, BodyKind, Cover, Explosive, Impact, Name, Transform, Vitals, World};
use crate::physics::{Layer, Physics, RayHit};

type GroundMonster = Monster<GridNavigator>;

/// Layers a blast can reach
const BLAST_MASK: Layer = Layer::PLAYER
    .union(Layer::MONSTER)
    .union(Layer::DRONE)
    .union(Layer::PROP);

/// A destroyed prop's blast waiting to be dealt out
#[derive(Debug, Clone, Copy)]
struct Blast {
    source: Entity,
    center: Vec3,
    explosive: Explosive,
}

// ============================================================================
// Stage
// ============================================================================

/// Everything except the agents themselves.
struct Stage {
    world: World,
    physics: Physics,
    rng: Rng,
    state: GameState,
    player: Option<Entity>,
    events: EventQueue,
    blasts: SmallVec<[Blast; 4]>,
}

impl Stage {
    fn set_state(&mut self, state: GameState) {
        if self.state == state {
            return;
        }
        log::info!("Game state {:?} -> {:?}", self.state, state);
        self.state = state;
        self.events.push(AiEvent::GameStateChanged { state });
    }

    fn mirror_monster(&mut self, monster: &GroundMonster) {
        let entity = monster.entity();
        self.world.write_transform(entity, monster.transform());
        if let Ok(mut vitals) = self.world.get_mut::<Vitals>(entity) {
            vitals.health = *monster.health();
        }
        self.world.set_active(entity, monster.is_active());
    }

    fn mirror_drone(&mut self, drone: &Drone) {
        let entity = drone.entity();
        self.world.write_transform(entity, drone.transform());
        if let Ok(mut vitals) = self.world.get_mut::<Vitals>(entity) {
            vitals.health = *drone.health();
        }
        self.world.set_active(entity, drone.is_active());
    }

    fn step_player(&mut self, dt: f32, decay: f32) {
        let Some(player) = self.player else {
            return;
        };
        if let Ok(mut vitals) = self.world.get_mut::<Vitals>(player) {
            vitals.regenerate(dt);
        }
        let shift = match self.world.get_mut::<Impact>(player) {
            Ok(mut impact) => impact.step(dt, decay),
            Err(_) => Vec3::ZERO,
        };
        if shift != Vec3::ZERO {
            if let Ok(mut transform) = self.world.get_mut::<Transform>(player) {
                transform.translate(shift);
            }
        }
    }

    fn sync_colliders(&mut self) {
        for (entity, (transform, body)) in self.world.query::<(&Transform, &Body)>().iter() {
            self.physics.set_position(entity, transform.position);
            self.physics.set_enabled(entity, body.active);
        }
        self.physics.update();
    }

    fn destroy_prop(&mut self, prop: Entity) {
        log::debug!("Prop {prop:?} destroyed");
        self.world.set_active(prop, false);
        self.physics.set_enabled(prop, false);

        let explosive = self.world.get::<Explosive>(prop).ok().map(|e| *e);
        let center = self.world.get::<Transform>(prop).ok().map(|t| t.position);
        if let (Some(explosive), Some(center)) = (explosive, center) {
            self.events.push(AiEvent::Exploded {
                entity: prop,
                point: center,
                radius: explosive.radius,
            });
            self.blasts.push(Blast {
                source: prop,
                center,
                explosive,
            });
        }
    }

    fn player_dead(&self) -> bool {
        self.player
            .and_then(|player| self.world.snapshot(player))
            .is_some_and(|snapshot| snapshot.dead)
    }
}

/// Damage for bodies that carry plain [`Vitals`]: the player and props.
///
/// A destroyed explosive prop queues its blast; the frame deals it out.
impl SimContext for Stage {
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
        self.player
    }

    fn locate(&self, entity: Entity) -> Option<BodySnapshot> {
        self.world.snapshot(entity)
    }

    fn apply_damage(&mut self, target: Entity, damage: &Damage) -> bool {
        let Some(body) = self.world.get::<Body>(target).ok().map(|body| *body) else {
            return false;
        };
        // Agents take hits through their own damage interface
        if !body.active || matches!(body.kind, BodyKind::Monster | BodyKind::Drone) {
            return false;
        }

        let killed = {
            let Ok(mut vitals) = self.world.get_mut::<Vitals>(target) else {
                return false;
            };
            if !vitals.try_take_damage(damage, &mut ()) {
                return false;
            }
            vitals.is_dead()
        };

        self.events.push(AiEvent::Damaged {
            entity: target,
            amount: damage.value,
            source: damage.source,
            critical: damage.critical,
        });
        if killed {
            self.events.push(AiEvent::Killed {
                entity: target,
                killer: damage.source,
            });
            if body.kind == BodyKind::Prop {
                self.destroy_prop(target);
            }
        }
        true
    }

    fn push_body(&mut self, target: Entity, direction: Vec3, force: f32) {
        if let Ok(mut impact) = self.world.get_mut::<Impact>(target) {
            impact.add(direction, force);
        }
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
        self.physics
            .overlap_sphere(center, radius, mask, exclude, |entity| out.push(entity));
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: Layer,
        exclude: Option<Entity>,
    ) -> Option<RayHit> {
        self.physics
            .raycast(origin, direction, max_distance, mask, exclude)
    }
}

// ============================================================================
// Frame
// ============================================================================

/// Context handed to one agent: the stage plus every other agent.
struct Frame<'a> {
    stage: &'a mut Stage,
    monsters: [&'a mut [GroundMonster]; 2],
    drones: PoolRest<'a, Drone>,
}

impl SimContext for Frame<'_> {
    fn game_state(&self) -> GameState {
        self.stage.state
    }

    fn rng(&mut self) -> &mut Rng {
        &mut self.stage.rng
    }

    fn emit(&mut self, event: AiEvent) {
        self.stage.emit(event);
    }

    fn primary_target(&self) -> Option<Entity> {
        self.stage.player
    }

    fn locate(&self, entity: Entity) -> Option<BodySnapshot> {
        self.stage.locate(entity)
    }

    fn apply_damage(&mut self, target: Entity, damage: &Damage) -> bool {
        let landed = self.route_damage(target, damage);
        self.detonate();
        landed
    }

    fn push_body(&mut self, target: Entity, direction: Vec3, force: f32) {
        self.stage.push_body(target, direction, force);
    }

    fn scan(
        &self,
        center: Vec3,
        radius: f32,
        mask: Layer,
        exclude: Option<Entity>,
        out: &mut ScanBuffer,
    ) {
        self.stage.scan(center, radius, mask, exclude, out);
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: Layer,
        exclude: Option<Entity>,
    ) -> Option<RayHit> {
        self.stage
            .raycast(origin, direction, max_distance, mask, exclude)
    }
}

impl Frame<'_> {
    /// Hand a hit to whoever owns the target's health.
    fn route_damage(&mut self, target: Entity, damage: &Damage) -> bool {
        let [before, after] = &mut self.monsters;
        if let Some(monster) = before
            .iter_mut()
            .chain(after.iter_mut())
            .find(|monster| monster.entity() == target)
        {
            let landed = monster.try_take_damage(damage, &mut *self.stage);
            self.stage.mirror_monster(monster);
            return landed;
        }

        if let Some(drone) = self.drones.iter_mut().find(|d| d.entity() == target) {
            let landed = drone.try_take_damage(damage, &mut *self.stage);
            self.stage.mirror_drone(drone);
            return landed;
        }

        self.stage.apply_damage(target, damage)
    }

    /// Deal out queued blasts. Props destroyed by a blast queue their own,
    /// so chains run until no prop in reach is left standing.
    fn detonate(&mut self) {
        while let Some(blast) = self.stage.blasts.pop() {
            let mut victims: SmallVec<[Entity; 8]> = SmallVec::new();
            self.stage.physics.overlap_sphere(
                blast.center,
                blast.explosive.radius,
                BLAST_MASK,
                Some(blast.source),
                |entity| {
                    victims.push(entity);
                    true
                },
            );
            log::debug!(
                "Prop {:?} blast reached {} bodies",
                blast.source,
                victims.len()
            );

            for victim in victims {
                let point = self
                    .stage
                    .locate(victim)
                    .map_or(blast.center, |snapshot| snapshot.position);
                let damage = Damage::new(blast.explosive.damage)
                    .with_direction(point - blast.center)
                    .at(point)
                    .with_source(blast.source);
                self.route_damage(victim, &damage);
            }
        }
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// One encounter: a player, the monsters hunting them and their drones.
pub struct Simulation {
    config: AiConfig,
    grid: Arc<Grid>,
    stage: Stage,
    monsters: Vec<GroundMonster>,
    drones: Pool<Drone>,
    ready_timer: f32,
    time: f32,
}

impl Simulation {
    /// Create an empty encounter.
    ///
    /// # Errors
    ///
    /// Returns an error if the tuning fails validation
    pub fn new(config: AiConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = Arc::new(Grid::from_config(&config.simulation.grid));
        log::info!(
            "Simulation created ({}x{} grid, seed {:#x})",
            grid.width,
            grid.height,
            config.simulation.seed
        );

        Ok(Self {
            grid,
            stage: Stage {
                world: World::new(),
                physics: Physics::new(),
                rng: Rng::with_seed(config.simulation.seed),
                state: GameState::Ready,
                player: None,
                events: EventQueue::new(),
                blasts: SmallVec::new(),
            },
            monsters: Vec::new(),
            drones: Pool::new(),
            ready_timer: 0.0,
            time: 0.0,
            config,
        })
    }

    // ------------------------------------------------------------------------
    // Level setup
    // ------------------------------------------------------------------------

    /// Spawn the player. Only one player exists; later calls return it.
    pub fn spawn_player(&mut self, position: Vec3) -> Entity {
        if let Some(player) = self.stage.player {
            log::warn!("Player already spawned as {player:?}");
            return player;
        }

        let settings = &self.config.simulation;
        let vitals = Vitals::new(
            Stat::new(settings.player_max_health).with_regen(settings.player_health_regen),
        )
        .with_stamina(
            Stat::new(settings.player_max_stamina).with_regen(settings.player_stamina_regen),
        );
        let (radius, height) = (settings.player_radius, settings.player_height);

        let entity = self.stage.world.spawn((
            Transform::from_position(position),
            Body::new(BodyKind::Player, Layer::PLAYER, radius, height),
            vitals,
            Impact::default(),
            Cover(false),
            Name::new("player"),
        ));
        self.stage
            .physics
            .add_capsule(entity, position, height, radius, Layer::PLAYER);
        self.stage.player = Some(entity);
        log::info!("Player spawned at {position}");
        entity
    }

    /// Spawn a destructible prop with the configured defaults.
    pub fn spawn_default_prop(&mut self, position: Vec3) -> Entity {
        let prop = self.config.prop.clone();
        self.spawn_prop(position, &prop)
    }

    /// Spawn a destructible prop. Props with a blast damage everything in
    /// reach when destroyed, other props included.
    pub fn spawn_prop(&mut self, position: Vec3, prop: &PropConfig) -> Entity {
        let mut builder = hecs::EntityBuilder::new();
        builder
            .add(Transform::from_position(position))
            .add(Body::new(BodyKind::Prop, Layer::PROP, prop.radius, 0.0))
            .add(Vitals::new(Stat::new(prop.max_health)))
            .add(Name::new("prop"));
        if prop.explodes() {
            builder.add(Explosive {
                radius: prop.explosion_radius,
                damage: prop.explosion_damage,
            });
        }
        let entity = self.stage.world.spawn(builder.build());
        self.stage
            .physics
            .add_sphere(entity, position, prop.radius, Layer::PROP);
        entity
    }

    /// Block an axis-aligned box: unwalkable cells plus level geometry.
    ///
    /// Monsters spawned before the call keep navigating the old grid.
    pub fn block_area(&mut self, min: Vec3, max: Vec3) {
        Arc::make_mut(&mut self.grid).block_rect(min, max);
        let center = (min + max) * 0.5;
        let half_extents = ((max - min) * 0.5).abs();
        self.stage.physics.add_static_box(center, half_extents);
    }

    /// Connect two walkable points with a jump link in both directions.
    ///
    /// Returns `false` if either end is off the grid or blocked.
    pub fn add_traversal_link(&mut self, start: Vec3, end: Vec3) -> bool {
        let added = Arc::make_mut(&mut self.grid).add_link(start, end);
        if !added {
            log::warn!("Traversal link {start} -> {end} rejected");
        }
        added
    }

    // ------------------------------------------------------------------------
    // Agents
    // ------------------------------------------------------------------------

    /// Spawn a melee monster.
    pub fn spawn_monster(&mut self, position: Vec3) -> Entity {
        let config = self.config.monster.clone();
        self.insert_monster(position, &config, |entity, nav| {
            Monster::new(entity, config.clone(), nav)
        })
    }

    /// Spawn an elite monster.
    pub fn spawn_elite(&mut self, position: Vec3) -> Entity {
        let base = self.config.monster.clone();
        let elite = self.config.elite.clone();
        let scaled = elite.apply_to(&base);
        self.insert_monster(position, &scaled, |entity, nav| {
            Monster::elite(entity, &base, elite, nav)
        })
    }

    fn insert_monster(
        &mut self,
        position: Vec3,
        config: &MonsterConfig,
        build: impl FnOnce(Entity, GridNavigator) -> GroundMonster,
    ) -> Entity {
        let (radius, height) = (config.body_radius, config.body_height);
        let entity = self.stage.world.spawn((
            Transform::from_position(position),
            Body::new(BodyKind::Monster, Layer::MONSTER, radius, height),
            Vitals::new(Stat::new(config.max_health)),
            Name::new("monster"),
        ));
        self.stage
            .physics
            .add_capsule(entity, position, height, radius, Layer::MONSTER);

        let nav = GridNavigator::new(Arc::clone(&self.grid), position);
        let monster = build(entity, nav);
        if let Some(player) = self.stage.player {
            log::debug!("Monster {entity:?} spawned, hunting {player:?}");
        }
        self.stage.mirror_monster(&monster);
        self.monsters.push(monster);
        entity
    }

    /// Deploy a drone escorting the player, reusing a parked one if possible.
    ///
    /// Returns `None` if there is no player to escort.
    pub fn deploy_drone(&mut self, position: Vec3) -> Option<Entity> {
        let Some(owner) = self.stage.player else {
            log::warn!("Cannot deploy a drone without a player");
            return None;
        };

        let config = &self.config.drone;
        let world = &mut self.stage.world;
        let index = self.drones.acquire(
            || {
                let entity = world.spawn((
                    Transform::from_position(position),
                    Body::new(BodyKind::Drone, Layer::DRONE, config.body_radius, 0.0),
                    Vitals::new(Stat::new(config.max_health)),
                    Name::new("drone"),
                ));
                Drone::new(entity, owner, config.clone(), position)
            },
            |drone| drone.redeploy(owner, position),
        );

        let drone = self.drones.get(index)?;
        let entity = drone.entity();
        if !self.stage.physics.contains(entity) {
            self.stage
                .physics
                .add_sphere(entity, position, config.body_radius, Layer::DRONE);
        }
        self.stage.mirror_drone(drone);
        self.stage.physics.set_position(entity, position);
        self.stage.physics.set_enabled(entity, true);
        log::info!("Drone {entity:?} deployed at {position}");
        Some(entity)
    }

    fn drone_index(&self, entity: Entity) -> Option<PoolIndex> {
        self.drones.indices().find(|&index| {
            self.drones
                .get(index)
                .is_some_and(|drone| drone.entity() == entity)
        })
    }

    /// Send a drone home. Returns `false` for unknown drones.
    pub fn recall_drone(&mut self, entity: Entity) -> bool {
        let Some(drone) = self
            .drone_index(entity)
            .and_then(|index| self.drones.get_mut(index))
        else {
            return false;
        };
        drone.recall(&mut self.stage);
        true
    }

    /// Point a drone at a specific enemy. Returns `false` for unknown drones.
    pub fn set_drone_target(&mut self, entity: Entity, target: Entity) -> bool {
        let Some(drone) = self
            .drone_index(entity)
            .and_then(|index| self.drones.get_mut(index))
        else {
            return false;
        };
        drone.set_target(Some(target), &mut self.stage);
        true
    }

    // ------------------------------------------------------------------------
    // Player input
    // ------------------------------------------------------------------------

    /// Move the player.
    pub fn move_player(&mut self, position: Vec3, rotation: Quat) {
        if let Some(player) = self.stage.player {
            let transform = Transform::from_position_rotation(position, rotation);
            self.stage.world.write_transform(player, transform);
        }
    }

    /// Enter or leave cover.
    pub fn set_player_cover(&mut self, in_cover: bool) {
        let Some(player) = self.stage.player else {
            return;
        };
        if let Ok(mut cover) = self.stage.world.get_mut::<Cover>(player) {
            cover.0 = in_cover;
        }
    }

    /// Hit any body from outside the agents (player weapons, hazards).
    pub fn apply_damage(&mut self, target: Entity, damage: &Damage) -> bool {
        let mut frame = Frame {
            stage: &mut self.stage,
            monsters: [&mut self.monsters[..], &mut []],
            drones: self.drones.rest_mut(),
        };
        frame.apply_damage(target, damage)
    }

    // ------------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------------

    /// Advance the encounter by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.time += dt;
        if self.stage.state == GameState::Ready {
            self.ready_timer += dt;
            if self.ready_timer >= self.config.simulation.ready_delay {
                self.stage.set_state(GameState::Playing);
            }
        }

        let decay = self.config.simulation.impact_decay;
        self.stage.step_player(dt, decay);
        self.stage.sync_colliders();

        self.tick_monsters(dt);
        self.tick_drones(dt);

        if self.stage.state == GameState::Playing && self.stage.player_dead() {
            self.stage.set_state(GameState::GameOver);
        }

        self.cleanup();
        self.stage.events.swap();
    }

    fn tick_monsters(&mut self, dt: f32) {
        for i in 0..self.monsters.len() {
            let (before, rest) = self.monsters.split_at_mut(i);
            let Some((monster, after)) = rest.split_first_mut() else {
                break;
            };
            let mut frame = Frame {
                stage: &mut self.stage,
                monsters: [before, after],
                drones: self.drones.rest_mut(),
            };
            monster.tick(dt, &mut frame);
            self.stage.mirror_monster(monster);
        }
    }

    fn tick_drones(&mut self, dt: f32) {
        let indices: SmallVec<[PoolIndex; 8]> = self.drones.indices().collect();
        for index in indices {
            let Some((drone, drones)) = self.drones.split_mut(index) else {
                continue;
            };
            let mut frame = Frame {
                stage: &mut self.stage,
                monsters: [&mut self.monsters[..], &mut []],
                drones,
            };
            drone.tick(dt, &mut frame);
            self.stage.mirror_drone(drone);
        }
    }

    fn cleanup(&mut self) {
        let stage = &mut self.stage;
        self.monsters.retain(|monster| {
            if monster.is_active() {
                return true;
            }
            let entity = monster.entity();
            stage.physics.remove(entity);
            if stage.world.despawn(entity).is_err() {
                log::warn!("Monster {entity:?} was already gone from the world");
            }
            log::debug!("Monster {entity:?} removed");
            false
        });

        let parked: SmallVec<[PoolIndex; 4]> = self
            .drones
            .indices()
            .filter(|&index| !self.drones.get(index).is_none_or(Drone::is_active))
            .collect();
        for index in parked {
            if let Some(drone) = self.drones.get(index) {
                stage.world.set_active(drone.entity(), false);
                stage.physics.set_enabled(drone.entity(), false);
            }
            self.drones.release(index);
            log::debug!("Drone slot {} parked", index.raw());
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Tuning in use
    #[must_use]
    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Current game flow state
    #[must_use]
    pub fn state(&self) -> GameState {
        self.stage.state
    }

    /// Seconds simulated so far
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// The player entity
    #[must_use]
    pub fn player(&self) -> Option<Entity> {
        self.stage.player
    }

    /// Entity storage
    #[must_use]
    pub fn world(&self) -> &World {
        &self.stage.world
    }

    /// Query world
    #[must_use]
    pub fn physics(&self) -> &Physics {
        &self.stage.physics
    }

    /// Navigation grid new monsters are given
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Events of the last finished tick
    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.stage.events
    }

    /// Live monsters (dead ones stay until their despawn delay ends)
    #[must_use]
    pub fn monsters(&self) -> &[GroundMonster] {
        &self.monsters
    }

    /// Look up a monster by entity.
    #[must_use]
    pub fn monster(&self, entity: Entity) -> Option<&GroundMonster> {
        self.monsters.iter().find(|m| m.entity() == entity)
    }

    /// Deployed drones
    pub fn drones(&self) -> impl Iterator<Item = &Drone> {
        self.drones.iter()
    }

    /// Look up a deployed drone by entity.
    #[must_use]
    pub fn drone(&self, entity: Entity) -> Option<&Drone> {
        self.drones().find(|drone| drone.entity() == entity)
    }

    /// Number of parked drones ready for reuse
    #[must_use]
    pub fn parked_drones(&self) -> usize {
        self.drones.parked_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MonsterState;

    fn playing_config() -> AiConfig {
        let mut config = AiConfig::default();
        config.simulation.ready_delay = 0.0;
        config
    }

    fn run(
        sim: &mut Simulation,
        dt: f32,
        ticks: usize,
        mut watch: impl FnMut(&Simulation) -> bool,
    ) -> bool {
        for _ in 0..ticks {
            sim.tick(dt);
            if watch(sim) {
                return true;
            }
        }
        false
    }

    #[test]
    fn test_ready_counts_down_into_playing() {
        let mut sim = Simulation::new(AiConfig::default()).unwrap();
        for _ in 0..4 {
            sim.tick(0.5);
        }
        assert_eq!(sim.state(), GameState::Ready);

        sim.tick(0.5);
        assert_eq!(sim.state(), GameState::Playing);
        let changes: Vec<GameState> = sim
            .events()
            .iter()
            .filter_map(|event| match event {
                AiEvent::GameStateChanged { state } => Some(*state),
                _ => None,
            })
            .collect();
        assert_eq!(changes, vec![GameState::Playing]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = AiConfig::default();
        config.simulation.player_max_health = 0.0;
        assert!(Simulation::new(config).is_err());
    }

    #[test]
    fn test_monster_kills_player_and_ends_game() {
        let mut config = playing_config();
        config.monster = config.monster.with_attack(0.5, 100.0);
        let mut sim = Simulation::new(config).unwrap();
        let player = sim.spawn_player(Vec3::new(0.5, 0.0, 0.5));
        sim.spawn_monster(Vec3::new(1.5, 0.0, 0.5));

        let mut killed = false;
        let over = run(&mut sim, 0.1, 50, |sim| {
            killed |= sim.events().iter().any(|event| {
                matches!(event, AiEvent::Killed { entity, .. } if *entity == player)
            });
            sim.state() == GameState::GameOver
        });

        assert!(over);
        assert!(killed);
        assert!(sim.world().snapshot(player).unwrap().dead);
    }

    #[test]
    fn test_monster_despawns_after_death() {
        let mut sim = Simulation::new(playing_config()).unwrap();
        let monster = sim.spawn_monster(Vec3::new(5.5, 0.0, 5.5));
        sim.tick(0.1);

        assert!(sim.apply_damage(monster, &Damage::new(1000.0)));
        assert_eq!(sim.monster(monster).unwrap().state(), MonsterState::Death);
        assert!(!sim.apply_damage(monster, &Damage::new(1.0)));

        let gone = run(&mut sim, 0.5, 10, |sim| sim.monsters().is_empty());
        assert!(gone);
        assert!(!sim.world().contains(monster));
        assert!(!sim.physics().contains(monster));
    }

    #[test]
    fn test_prop_destroyed_by_damage() {
        let mut sim = Simulation::new(playing_config()).unwrap();
        let prop = sim.spawn_prop(Vec3::new(2.0, 0.5, 2.0), &PropConfig::inert(0.5, 20.0));

        assert!(sim.apply_damage(prop, &Damage::new(25.0)));
        let snapshot = sim.world().snapshot(prop).unwrap();
        assert!(snapshot.dead);
        assert!(!snapshot.active);
        assert!(!sim.apply_damage(prop, &Damage::new(5.0)));
    }

    #[test]
    fn test_prop_explosion_chains_through_props_and_monster() {
        let mut sim = Simulation::new(playing_config()).unwrap();
        let first = sim.spawn_prop(
            Vec3::new(0.5, 0.5, 0.5),
            &PropConfig::inert(0.5, 10.0).with_explosion(2.5, 50.0),
        );
        let second = sim.spawn_prop(
            Vec3::new(2.5, 0.5, 0.5),
            &PropConfig::inert(0.5, 20.0).with_explosion(2.5, 500.0),
        );
        // Only the second blast reaches the monster
        let monster = sim.spawn_monster(Vec3::new(4.5, 0.0, 0.5));
        sim.tick(0.01);

        assert!(sim.apply_damage(first, &Damage::new(15.0)));
        for prop in [first, second] {
            let snapshot = sim.world().snapshot(prop).unwrap();
            assert!(
                snapshot.dead && !snapshot.active,
                "{prop:?} should be destroyed"
            );
        }
        assert_eq!(sim.monster(monster).unwrap().state(), MonsterState::Death);
        assert!(!sim.monster(monster).unwrap().is_alive());

        sim.tick(0.01);
        let exploded = sim
            .events()
            .iter()
            .filter(|event| matches!(event, AiEvent::Exploded { .. }))
            .count();
        assert_eq!(exploded, 2);
        let monster_killer = sim.events().iter().find_map(|event| match event {
            AiEvent::Killed { entity, killer } if *entity == monster => Some(*killer),
            _ => None,
        });
        assert_eq!(monster_killer, Some(Some(second)));
    }

    #[test]
    fn test_inert_prop_does_not_explode() {
        let mut sim = Simulation::new(playing_config()).unwrap();
        let prop = sim.spawn_prop(Vec3::new(0.5, 0.5, 0.5), &PropConfig::inert(0.5, 10.0));
        let monster = sim.spawn_monster(Vec3::new(1.5, 0.0, 0.5));
        sim.tick(0.01);

        assert!(sim.apply_damage(prop, &Damage::new(15.0)));
        let health = sim.monster(monster).unwrap().health().value();
        assert_eq!(health, sim.config().monster.max_health);
    }

    #[test]
    fn test_push_moves_player_and_fades() {
        let mut sim = Simulation::new(playing_config()).unwrap();
        let player = sim.spawn_player(Vec3::ZERO);
        sim.stage.push_body(player, Vec3::new(1.0, 3.0, 0.0), 10.0);

        sim.tick(0.1);
        let moved = sim.world().snapshot(player).unwrap().position;
        assert!((moved.x - 1.0).abs() < 1e-4);
        assert_eq!(moved.y, 0.0, "pushes are horizontal");

        run(&mut sim, 0.1, 60, |_| false);
        let impact = *sim.world().get::<Impact>(player).unwrap();
        assert_eq!(impact.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_drone_needs_a_player() {
        let mut sim = Simulation::new(playing_config()).unwrap();
        assert!(sim.deploy_drone(Vec3::Y).is_none());
    }

    #[test]
    fn test_recalled_drone_is_parked_and_reused() {
        let mut sim = Simulation::new(playing_config()).unwrap();
        sim.spawn_player(Vec3::ZERO);
        let drone = sim.deploy_drone(Vec3::new(0.0, 2.0, 0.0)).unwrap();
        assert_eq!(sim.drones().count(), 1);

        assert!(sim.recall_drone(drone));
        let parked = run(&mut sim, 0.05, 200, |sim| sim.parked_drones() == 1);
        assert!(parked);
        assert_eq!(sim.drones().count(), 0);
        assert!(!sim.world().snapshot(drone).unwrap().active);

        let again = sim.deploy_drone(Vec3::new(1.0, 2.0, 0.0)).unwrap();
        assert_eq!(again, drone, "parked drone is revived");
        assert!(sim.world().snapshot(again).unwrap().active);
        assert!(!sim.drone(again).unwrap().is_recalled());
        assert_eq!(sim.parked_drones(), 0);
    }

    #[test]
    fn test_drone_shoots_monster_down() {
        let mut config = playing_config();
        config.monster.max_health = 10.0;
        let mut sim = Simulation::new(config).unwrap();
        sim.spawn_player(Vec3::new(0.5, 0.0, 0.5));
        let monster = sim.spawn_monster(Vec3::new(0.5, 0.0, -7.5));
        sim.deploy_drone(Vec3::new(0.5, 2.0, 0.5)).unwrap();

        let down = run(&mut sim, 0.05, 400, |sim| {
            sim.monster(monster).is_none_or(|m| !m.is_alive())
        });
        assert!(down);

        let gone = run(&mut sim, 0.05, 100, |sim| sim.monsters().is_empty());
        assert!(gone);
        assert!(!sim.world().contains(monster));
    }
}
