//! Escort drone
//!
//! Flies at the owner's shoulder, sweeps for enemies on an interval, closes
//! in to hover above the nearest one and shoots it with hit-scan rounds.
//! The turret aims faster than the body turns. A recalled drone drops
//! everything, flies home and deactivates so its pool slot can be reused.

mod tracer;

pub use tracer::{Tracer, TracerPool};

use glam::{Quat, Vec3};
use hecs::Entity;

use super::fsm::{StateMachine, StateTag, Stateful, Transition};
use super::perception::{BodySnapshot, ScanBuffer, beyond_range, nearest_valid, within_range};
use super::steering::{look_rotation, rotate_towards, slerp_towards, smooth_damp};
use crate::combat::{Damage, Damageable, HitOutcome, Posture, Stat, resolve_hit};
use crate::core::{AiEvent, DroneConfig};
use crate::ecs::Transform;
use crate::physics::Layer;
use crate::sim::SimContext;

/// Slack on the fire clock so summed frame times that land on a cadence
/// boundary still fire on that frame
const CADENCE_TOLERANCE: f32 = 1e-4;

/// Drone states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DroneState {
    /// Following the owner
    Idle,
    /// Picking the nearest enemy
    AcquireTarget,
    /// Closing in on the target
    Approach,
    /// Shooting
    Attack,
    /// Recalled; flying home
    Return,
}

impl StateTag for DroneState {
    fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::AcquireTarget => "AcquireTarget",
            Self::Approach => "Approach",
            Self::Attack => "Attack",
            Self::Return => "Return",
        }
    }
}

/// A support drone bound to an owner.
#[derive(Debug, Clone)]
pub struct Drone {
    entity: Entity,
    owner: Entity,
    config: DroneConfig,
    machine: StateMachine<DroneState>,
    transform: Transform,
    /// World rotation of the turret head
    turret: Quat,
    /// Smoothing state for the active movement
    velocity: Vec3,
    health: Stat,
    /// Weak handle; re-resolved every tick
    target: Option<Entity>,
    enemy_mask: Layer,
    recalled: bool,
    active: bool,
    scan_timer: f32,
    fire_clock: f32,
    scan: ScanBuffer,
    tracers: TracerPool,
}

impl Drone {
    /// Create a drone at `position` escorting `owner`.
    pub fn new(entity: Entity, owner: Entity, config: DroneConfig, position: Vec3) -> Self {
        let health = Stat::new(config.max_health);
        let scan = ScanBuffer::new(config.scan_capacity);
        let tracers = TracerPool::new(
            config.tracer_pool_size,
            config.tracer_speed,
            config.tracer_length,
        );

        Self {
            entity,
            owner,
            config,
            machine: StateMachine::new(DroneState::Idle),
            transform: Transform::from_position(position),
            turret: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            health,
            target: None,
            enemy_mask: Layer::MONSTER,
            recalled: false,
            active: true,
            scan_timer: 0.0,
            fire_clock: 0.0,
            scan,
            tracers,
        }
    }

    /// Layers the drone scans and shoots at
    #[must_use]
    pub fn with_enemy_mask(mut self, mask: Layer) -> Self {
        self.enemy_mask = mask;
        self
    }

    /// Reset a parked drone for another deployment.
    pub fn redeploy(&mut self, owner: Entity, position: Vec3) {
        self.owner = owner;
        self.machine.reset(DroneState::Idle);
        self.transform = Transform::from_position(position);
        self.turret = Quat::IDENTITY;
        self.velocity = Vec3::ZERO;
        self.health.initialize();
        self.target = None;
        self.recalled = false;
        self.active = true;
        self.scan_timer = 0.0;
        self.fire_clock = 0.0;
        self.scan.clear();
        self.tracers.clear();
    }

    /// Entity this drone drives
    #[must_use]
    #[inline]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Body the drone escorts
    #[must_use]
    #[inline]
    pub fn owner(&self) -> Entity {
        self.owner
    }

    /// Active state
    #[must_use]
    #[inline]
    pub fn state(&self) -> DroneState {
        self.machine.current()
    }

    /// Tracked enemy handle, if any
    #[must_use]
    #[inline]
    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    /// Body transform
    #[must_use]
    #[inline]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Body position
    #[must_use]
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// World rotation of the turret head
    #[must_use]
    pub fn turret_rotation(&self) -> Quat {
        self.turret
    }

    /// Health
    #[must_use]
    pub fn health(&self) -> &Stat {
        &self.health
    }

    /// Tuning in use
    #[must_use]
    pub fn config(&self) -> &DroneConfig {
        &self.config
    }

    /// Tracer ring, for drawing
    #[must_use]
    pub fn tracers(&self) -> &TracerPool {
        &self.tracers
    }

    /// Check if the drone was sent home
    #[must_use]
    #[inline]
    pub fn is_recalled(&self) -> bool {
        self.recalled
    }

    /// False once recalled home or destroyed
    #[must_use]
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Assign a target from outside; ignored while recalled.
    pub fn set_target<C: SimContext + ?Sized>(&mut self, target: Option<Entity>, ctx: &mut C) {
        if self.recalled || !self.active {
            return;
        }
        self.target = target;
        if target.is_some() {
            self.change_state(DroneState::Approach, ctx);
        }
    }

    /// Send the drone home.
    pub fn recall<C: SimContext + ?Sized>(&mut self, ctx: &mut C) {
        if !self.active {
            return;
        }
        log::info!("drone {:?} recalled", self.entity);
        self.recalled = true;
        self.change_state(DroneState::Return, ctx);
    }

    /// Advance the drone by one frame.
    pub fn tick<C: SimContext + ?Sized>(&mut self, dt: f32, ctx: &mut C) {
        if !self.active {
            return;
        }
        self.tracers.advance(dt);
        self.run_state(dt, ctx);
    }

    fn current_target<C: SimContext + ?Sized>(&mut self, ctx: &C) -> Option<BodySnapshot> {
        let entity = self.target?;
        match ctx.locate(entity) {
            Some(snapshot) if snapshot.is_valid() => Some(snapshot),
            _ => {
                log::debug!("drone {:?} lost target {entity:?}", self.entity);
                self.target = None;
                None
            }
        }
    }

    fn muzzle(&self) -> Vec3 {
        self.transform.position + self.turret * self.config.fire_point
    }

    fn deactivate<C: SimContext + ?Sized>(&mut self, ctx: &mut C) {
        self.active = false;
        self.target = None;
        self.velocity = Vec3::ZERO;
        log::info!("drone {:?} deactivated", self.entity);
        ctx.emit(AiEvent::DroneDeactivated { agent: self.entity });
    }

    fn sweep<C: SimContext + ?Sized>(&mut self, ctx: &C) -> Option<BodySnapshot> {
        ctx.scan(
            self.transform.position,
            self.config.scan_radius,
            self.enemy_mask,
            Some(self.entity),
            &mut self.scan,
        );
        nearest_valid(
            self.transform.position,
            self.scan.iter().filter_map(|entity| ctx.locate(entity)),
        )
    }

    fn hover_towards(&mut self, target: &BodySnapshot, dt: f32) {
        let hover = target.position + Vec3::Y * self.config.combat_hover_height;
        self.transform.position = smooth_damp(
            self.transform.position,
            hover,
            &mut self.velocity,
            self.config.move_smooth_time,
            self.config.move_speed,
            dt,
        );
    }

    fn turn_body_towards(&mut self, point: Vec3, rate: f32, dt: f32) {
        if let Some(look) = look_rotation(point - self.transform.position) {
            self.transform.rotation = slerp_towards(self.transform.rotation, look, rate, dt);
        }
    }

    // ------------------------------------------------------------------------
    // State bodies
    // ------------------------------------------------------------------------

    fn execute_idle<C: SimContext + ?Sized>(
        &mut self,
        dt: f32,
        ctx: &mut C,
    ) -> Transition<DroneState> {
        let Some(owner) = ctx.locate(self.owner) else {
            return Transition::None;
        };

        let offset = if owner.in_cover {
            self.config.cover_offset
        } else {
            self.config.idle_offset
        };
        let anchor = owner.position + owner.rotation * offset;
        self.transform.position = smooth_damp(
            self.transform.position,
            anchor,
            &mut self.velocity,
            self.config.follow_smooth_time,
            f32::INFINITY,
            dt,
        );
        self.transform.rotation = slerp_towards(
            self.transform.rotation,
            owner.rotation,
            self.config.attack_body_rate,
            dt,
        );

        if self.recalled || self.target.is_some() {
            return Transition::None;
        }
        self.scan_timer += dt;
        if self.scan_timer < self.config.scan_interval {
            return Transition::None;
        }
        self.scan_timer = 0.0;
        match self.sweep(ctx) {
            Some(_) => Transition::To(DroneState::AcquireTarget),
            None => Transition::None,
        }
    }

    fn execute_acquire<C: SimContext + ?Sized>(&mut self, ctx: &mut C) -> Transition<DroneState> {
        if self.recalled {
            return Transition::None;
        }
        match self.sweep(ctx) {
            Some(nearest) => {
                log::debug!("drone {:?} acquired {:?}", self.entity, nearest.entity);
                self.target = Some(nearest.entity);
                Transition::To(DroneState::Approach)
            }
            None => Transition::To(DroneState::Idle),
        }
    }

    fn execute_approach<C: SimContext + ?Sized>(
        &mut self,
        dt: f32,
        ctx: &mut C,
    ) -> Transition<DroneState> {
        let Some(target) = self.current_target(ctx) else {
            return Transition::To(DroneState::Idle);
        };

        self.hover_towards(&target, dt);
        self.turn_body_towards(target.position, self.config.body_rotation_speed, dt);

        if within_range(
            self.transform.position,
            target.position,
            self.config.attack_range,
        ) {
            Transition::To(DroneState::Attack)
        } else {
            Transition::None
        }
    }

    fn execute_attack<C: SimContext + ?Sized>(
        &mut self,
        dt: f32,
        ctx: &mut C,
    ) -> Transition<DroneState> {
        let Some(target) = self.current_target(ctx) else {
            return Transition::To(DroneState::Idle);
        };

        self.hover_towards(&target, dt);
        self.turn_body_towards(target.position, self.config.attack_body_rate, dt);
        if let Some(aim) = look_rotation(target.position - self.muzzle()) {
            self.turret = rotate_towards(self.turret, aim, self.config.turret_turn_rate() * dt);
        }

        self.fire_clock += dt;
        while self.fire_clock + CADENCE_TOLERANCE >= self.config.fire_rate {
            self.fire_clock -= self.config.fire_rate;
            if ctx.game_state().is_playing() {
                self.fire(ctx);
            }
        }

        let reach = self.config.attack_range * self.config.attack_exit_buffer;
        if beyond_range(self.transform.position, target.position, reach) {
            Transition::To(DroneState::Approach)
        } else {
            Transition::None
        }
    }

    /// One hit-scan round along the turret's forward axis.
    fn fire<C: SimContext + ?Sized>(&mut self, ctx: &mut C) {
        let origin = self.muzzle();
        let direction = self.turret * Vec3::NEG_Z;
        let mask = self.enemy_mask | Layer::PROP | Layer::ENVIRONMENT;

        let hit = ctx.raycast(
            origin,
            direction,
            self.config.max_shoot_range,
            mask,
            Some(self.entity),
        );
        let (end, victim) = match hit {
            Some(hit) => {
                if let Some(entity) = hit.entity {
                    let damage = Damage::new(self.config.damage)
                        .with_direction(direction)
                        .at(hit.point)
                        .with_source(self.entity);
                    ctx.apply_damage(entity, &damage);
                }
                ctx.emit(AiEvent::HitEffect {
                    point: hit.point,
                    normal: hit.normal,
                });
                (hit.point, hit.entity)
            }
            None => (origin + direction * self.config.max_shoot_range, None),
        };

        ctx.emit(AiEvent::ShotFired {
            agent: self.entity,
            origin,
            end,
            hit: victim,
        });
        self.tracers.spawn(origin, end);
    }

    fn execute_return<C: SimContext + ?Sized>(
        &mut self,
        dt: f32,
        ctx: &mut C,
    ) -> Transition<DroneState> {
        let Some(owner) = ctx.locate(self.owner) else {
            log::warn!("drone {:?} has no owner to return to", self.entity);
            self.deactivate(ctx);
            return Transition::None;
        };

        let dock = owner.position + Vec3::Y * self.config.return_height;
        if within_range(
            self.transform.position,
            dock,
            self.config.return_arrival_radius,
        ) {
            self.deactivate(ctx);
            return Transition::None;
        }

        self.transform.position = smooth_damp(
            self.transform.position,
            dock,
            &mut self.velocity,
            self.config.follow_smooth_time,
            self.config.move_speed * self.config.return_speed_multiplier,
            dt,
        );
        Transition::None
    }
}

impl<C: SimContext + ?Sized> Stateful<C> for Drone {
    type State = DroneState;
    type Task = ();

    fn machine(&self) -> &StateMachine<DroneState> {
        &self.machine
    }

    fn machine_mut(&mut self) -> &mut StateMachine<DroneState> {
        &mut self.machine
    }

    fn on_enter(&mut self, state: DroneState, ctx: &mut C) {
        ctx.emit(AiEvent::StateEntered {
            agent: self.entity,
            state: state.name(),
        });

        match state {
            // First sweep happens on the first idle tick
            DroneState::Idle => self.scan_timer = self.config.scan_interval,
            DroneState::Approach => self.velocity = Vec3::ZERO,
            DroneState::Attack => self.fire_clock = 0.0,
            DroneState::Return => {
                self.target = None;
                self.velocity = Vec3::ZERO;
            }
            DroneState::AcquireTarget => {}
        }
    }

    fn on_execute(&mut self, state: DroneState, dt: f32, ctx: &mut C) -> Transition<DroneState> {
        match state {
            DroneState::Idle => self.execute_idle(dt, ctx),
            DroneState::AcquireTarget => self.execute_acquire(ctx),
            DroneState::Approach => self.execute_approach(dt, ctx),
            DroneState::Attack => self.execute_attack(dt, ctx),
            DroneState::Return => self.execute_return(dt, ctx),
        }
    }

    fn on_exit(&mut self, state: DroneState, ctx: &mut C) {
        ctx.emit(AiEvent::StateExited {
            agent: self.entity,
            state: state.name(),
        });
    }

    fn on_task(&mut self, _task: (), _ctx: &mut C) -> Transition<DroneState> {
        Transition::None
    }
}

impl<C: SimContext + ?Sized> Damageable<C> for Drone {
    fn try_take_damage(&mut self, damage: &Damage, ctx: &mut C) -> bool {
        let posture = if self.active {
            Posture::Normal
        } else {
            Posture::Down
        };
        let outcome = resolve_hit(&mut self.health, damage, posture);
        if !outcome.landed() {
            return false;
        }

        ctx.emit(AiEvent::Damaged {
            entity: self.entity,
            amount: damage.value,
            source: damage.source,
            critical: damage.critical,
        });
        if outcome == HitOutcome::Killed {
            ctx.emit(AiEvent::Killed {
                entity: self.entity,
                killer: damage.source,
            });
            self.deactivate(ctx);
        }
        true
    }
}
