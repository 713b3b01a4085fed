//! Ground melee monster
//!
//! A navmesh-style agent that idles and patrols around its spawn point,
//! chases the player once it comes close, swings at it on a fixed cadence,
//! staggers when hit and gives up the chase past a comeback range that is
//! deliberately wider than the detection range.
//!
//! ```text
//!            detect                 attack range
//!   Idle ───────────▶ Trace ──────────────────────▶ Attack
//!    ▲ │ dwell          │ ▲  beyond comeback          │ beyond attack × buffer
//!    │ ▼                ▼ │                           ▼
//!   Patrol           Comeback ◀──────────────────── Trace
//!
//!   any ──hit──▶ Hit ──knockback done──▶ Trace | Idle
//!   any ──hp 0──▶ Death (terminal, despawns after a delay)
//! ```
//!
//! Elites add Charging and Dash on top of this machine (see [`elite`]).

mod elite;

pub use elite::EliteSkill;

use glam::Vec3;
use hecs::Entity;

use super::fsm::{StateMachine, StateTag, Stateful, Transition};
use super::navigation::NavigationPort;
use super::pathfinding::TraversalLink;
use super::perception::{BodySnapshot, beyond_range, flat_direction, within_range};
use super::random_range;
use super::steering::yaw_rotation;
use crate::combat::{Damage, Damageable, HitOutcome, Knockback, Posture, Stat, resolve_hit};
use crate::core::{AiEvent, EliteConfig, MonsterConfig};
use crate::ecs::Transform;
use crate::sim::SimContext;

// ============================================================================
// States
// ============================================================================

/// Monster states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonsterState {
    /// Waiting at the current spot
    Idle,
    /// Walking to a random point near spawn
    Patrol,
    /// Chasing the target
    Trace,
    /// Walking back to spawn
    Comeback,
    /// Swinging at the target
    Attack,
    /// Being knocked back
    Hit,
    /// Crossing a traversal link
    Jump,
    /// Dead; terminal
    Death,
    /// Elite only: telegraphing a rush
    Charging,
    /// Elite only: rushing
    Dash,
}

impl StateTag for MonsterState {
    fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Patrol => "Patrol",
            Self::Trace => "Trace",
            Self::Comeback => "Comeback",
            Self::Attack => "Attack",
            Self::Hit => "Hit",
            Self::Jump => "Jump",
            Self::Death => "Death",
            Self::Charging => "Charging",
            Self::Dash => "Dash",
        }
    }

    fn is_terminal(self) -> bool {
        self == Self::Death
    }
}

/// Delayed actions a monster state can schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonsterTask {
    /// Idle dwell elapsed; try to start a patrol
    IdleDwell,
    /// Patrol took too long
    PatrolTimeout,
    /// Death delay elapsed
    Despawn,
    /// Telegraph finished; rush
    ChargeRelease,
}

/// Parabolic hop across a traversal link
#[derive(Debug, Clone, Copy)]
struct JumpArc {
    link: TraversalLink,
    elapsed: f32,
}

impl JumpArc {
    fn position(&self, t: f32, height: f32) -> Vec3 {
        self.link.start.lerp(self.link.end, t) + Vec3::Y * (4.0 * height * (t - t * t))
    }
}

// ============================================================================
// Monster
// ============================================================================

/// A ground monster driven by its own state machine.
#[derive(Debug)]
pub struct Monster<N> {
    entity: Entity,
    config: MonsterConfig,
    machine: StateMachine<MonsterState, MonsterTask>,
    nav: N,
    transform: Transform,
    health: Stat,
    spawn: Vec3,
    /// Weak handle; re-resolved every tick
    target: Option<Entity>,
    patrol_point: Vec3,
    attack_timer: f32,
    knockback: Option<Knockback>,
    jump: Option<JumpArc>,
    /// Locomotion state to return to after a jump
    resume: MonsterState,
    active: bool,
    elite: Option<EliteSkill>,
}

impl<N: NavigationPort> Monster<N> {
    /// Create a monster standing at the navigator's position.
    pub fn new(entity: Entity, config: MonsterConfig, mut nav: N) -> Self {
        nav.set_speed(config.move_speed);
        let spawn = nav.position();
        let health = Stat::new(config.max_health).with_regen(config.health_regen);

        Self {
            entity,
            config,
            machine: StateMachine::new(MonsterState::Idle),
            nav,
            transform: Transform::from_position(spawn),
            health,
            spawn,
            target: None,
            patrol_point: spawn,
            attack_timer: 0.0,
            knockback: None,
            jump: None,
            resume: MonsterState::Trace,
            active: true,
            elite: None,
        }
    }

    /// Create an elite: base tuning scaled by `elite`, plus the rush skill.
    pub fn elite(entity: Entity, base: &MonsterConfig, elite: EliteConfig, nav: N) -> Self {
        let mut monster = Self::new(entity, elite.apply_to(base), nav);
        monster.elite = Some(EliteSkill::new(elite));
        monster
    }

    /// Entity this monster drives
    #[must_use]
    #[inline]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Active state
    #[must_use]
    #[inline]
    pub fn state(&self) -> MonsterState {
        self.machine.current()
    }

    /// Health stat
    #[must_use]
    #[inline]
    pub fn health(&self) -> &Stat {
        &self.health
    }

    /// Current transform
    #[must_use]
    #[inline]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Current position
    #[must_use]
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Where the monster spawned
    #[must_use]
    #[inline]
    pub fn spawn_position(&self) -> Vec3 {
        self.spawn
    }

    /// Tracked target, if any
    #[must_use]
    #[inline]
    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    /// Set or clear the tracked target
    pub fn set_target(&mut self, target: Option<Entity>) {
        self.target = target;
    }

    /// False once the death delay elapsed
    #[must_use]
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Check if health is above zero
    #[must_use]
    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.health.is_depleted()
    }

    /// Check if this monster has the rush skill
    #[must_use]
    #[inline]
    pub fn is_elite(&self) -> bool {
        self.elite.is_some()
    }

    /// Rush skill state, for elites
    #[must_use]
    pub fn elite_skill(&self) -> Option<&EliteSkill> {
        self.elite.as_ref()
    }

    /// Effective tuning
    #[must_use]
    pub fn config(&self) -> &MonsterConfig {
        &self.config
    }

    /// Navigator
    #[must_use]
    pub fn nav(&self) -> &N {
        &self.nav
    }

    /// Navigator (mutable)
    pub fn nav_mut(&mut self) -> &mut N {
        &mut self.nav
    }

    /// How incoming hits are treated right now.
    #[must_use]
    pub fn posture(&self) -> Posture {
        if !self.active {
            return Posture::Down;
        }
        match self.machine.current() {
            MonsterState::Death => Posture::Down,
            MonsterState::Charging | MonsterState::Dash | MonsterState::Jump => {
                Posture::HyperArmor
            }
            _ => Posture::Normal,
        }
    }

    /// Advance the monster by one frame.
    pub fn tick<C: SimContext + ?Sized>(&mut self, dt: f32, ctx: &mut C) {
        if !self.active {
            return;
        }
        if self.is_alive() {
            self.health.regenerate(dt);
        }
        if let Some(skill) = self.elite.as_mut() {
            if self.machine.current() != MonsterState::Dash {
                skill.cool_down(dt);
            }
        }

        self.nav.advance(dt);
        self.follow_nav();
        self.run_state(dt, ctx);
        self.transform.position = self.nav.position();
    }

    fn follow_nav(&mut self) {
        self.transform.position = self.nav.position();
        let moving = matches!(
            self.machine.current(),
            MonsterState::Patrol | MonsterState::Trace | MonsterState::Comeback
        );
        if moving {
            if let Some(rotation) = yaw_rotation(self.nav.velocity()) {
                self.transform.rotation = rotation;
            }
        }
    }

    fn face(&mut self, point: Vec3) {
        if let Some(rotation) = yaw_rotation(point - self.transform.position) {
            self.transform.rotation = rotation;
        }
    }

    // ------------------------------------------------------------------------
    // Target handling
    // ------------------------------------------------------------------------

    /// Resolve the tracked handle; clears it once invalid.
    fn current_target<C: SimContext + ?Sized>(&mut self, ctx: &C) -> Option<BodySnapshot> {
        let entity = self.target?;
        match ctx.locate(entity) {
            Some(snapshot) if snapshot.is_valid() => Some(snapshot),
            _ => {
                log::debug!("monster {entity:?} target lost");
                self.target = None;
                None
            }
        }
    }

    /// Resolve the tracked handle or pick up the primary target.
    fn acquire_target<C: SimContext + ?Sized>(&mut self, ctx: &C) -> Option<BodySnapshot> {
        if let Some(snapshot) = self.current_target(ctx) {
            return Some(snapshot);
        }
        let candidate = ctx.primary_target()?;
        let snapshot = ctx.locate(candidate).filter(BodySnapshot::is_valid)?;
        self.target = Some(candidate);
        Some(snapshot)
    }

    fn detects(&self, target: &BodySnapshot) -> bool {
        within_range(self.position(), target.position, self.config.detect_range)
    }

    // ------------------------------------------------------------------------
    // Patrol sampling
    // ------------------------------------------------------------------------

    fn sample_patrol_point<C: SimContext + ?Sized>(&self, ctx: &mut C) -> Option<Vec3> {
        let radius = self.config.patrol_radius;
        for _ in 0..self.config.patrol_sample_attempts {
            let offset = Vec3::new(
                random_range(ctx.rng(), -radius, radius),
                0.0,
                random_range(ctx.rng(), -radius, radius),
            );
            let candidate = self.spawn + offset;
            if let Some(point) = self
                .nav
                .sample_position(candidate, self.config.patrol_sample_distance)
            {
                return Some(point);
            }
        }
        None
    }

    fn schedule_dwell<C: SimContext + ?Sized>(&mut self, ctx: &mut C) {
        let dwell = random_range(ctx.rng(), self.config.idle_min, self.config.idle_max);
        self.machine.schedule(dwell, MonsterTask::IdleDwell);
    }

    // ------------------------------------------------------------------------
    // State bodies
    // ------------------------------------------------------------------------

    fn execute_idle<C: SimContext + ?Sized>(&mut self, ctx: &mut C) -> Transition<MonsterState> {
        match self.acquire_target(ctx) {
            Some(target) if self.detects(&target) => Transition::To(MonsterState::Trace),
            _ => Transition::None,
        }
    }

    fn execute_patrol<C: SimContext + ?Sized>(&mut self, ctx: &mut C) -> Transition<MonsterState> {
        if let Some(target) = self.acquire_target(ctx) {
            if self.detects(&target) {
                return Transition::To(MonsterState::Trace);
            }
        }
        if let Some(jump) = self.jump_if_on_link(MonsterState::Patrol) {
            return jump;
        }
        if self.nav.has_arrived() {
            return Transition::To(MonsterState::Idle);
        }
        Transition::None
    }

    fn execute_trace<C: SimContext + ?Sized>(&mut self, ctx: &mut C) -> Transition<MonsterState> {
        let Some(target) = self.current_target(ctx) else {
            return Transition::To(MonsterState::Idle);
        };
        if let Some(next) = self.elite_trace_override(&target) {
            return Transition::To(next);
        }

        let position = self.position();
        if within_range(position, target.position, self.config.attack_range) {
            return Transition::To(MonsterState::Attack);
        }
        if beyond_range(position, target.position, self.config.comeback_range) {
            return Transition::To(MonsterState::Comeback);
        }
        if let Some(jump) = self.jump_if_on_link(MonsterState::Trace) {
            return jump;
        }

        self.nav.set_destination(target.position);
        Transition::None
    }

    fn execute_comeback<C: SimContext + ?Sized>(
        &mut self,
        ctx: &mut C,
    ) -> Transition<MonsterState> {
        if let Some(target) = self.acquire_target(ctx) {
            if self.detects(&target) {
                return Transition::To(MonsterState::Trace);
            }
        }
        if let Some(jump) = self.jump_if_on_link(MonsterState::Comeback) {
            return jump;
        }

        let stopping = self.nav.stopping_distance();
        let tolerance = stopping.max(self.config.arrival_tolerance);
        let settled = !self.nav.is_path_pending() && self.nav.remaining_distance() <= tolerance;
        if settled || within_range(self.position(), self.spawn, self.config.arrival_tolerance) {
            return Transition::To(MonsterState::Idle);
        }
        Transition::None
    }

    fn execute_attack<C: SimContext + ?Sized>(
        &mut self,
        dt: f32,
        ctx: &mut C,
    ) -> Transition<MonsterState> {
        let Some(target) = self.current_target(ctx) else {
            return Transition::To(MonsterState::Idle);
        };
        self.face(target.position);

        let reach = self.config.attack_range * self.config.attack_exit_buffer;
        if beyond_range(self.position(), target.position, reach) {
            return Transition::To(MonsterState::Trace);
        }

        self.attack_timer += dt;
        if self.attack_timer >= self.config.attack_interval {
            self.attack_timer = 0.0;
            if ctx.game_state().is_playing() {
                let damage = Damage::new(self.config.attack_damage)
                    .with_direction(flat_direction(self.position(), target.position))
                    .at(target.position + Vec3::Y)
                    .with_source(self.entity);
                ctx.emit(AiEvent::AttackFired {
                    agent: self.entity,
                    target: target.entity,
                });
                ctx.apply_damage(target.entity, &damage);
            }
        }
        Transition::None
    }

    fn execute_hit<C: SimContext + ?Sized>(
        &mut self,
        dt: f32,
        ctx: &mut C,
    ) -> Transition<MonsterState> {
        if let Some(knockback) = self.knockback.as_mut() {
            let delta = knockback.step(dt);
            let finished = knockback.is_finished();
            self.nav.nudge(delta);
            if !finished {
                return Transition::None;
            }
            self.knockback = None;
        }

        match self.acquire_target(ctx) {
            Some(target) if self.detects(&target) => Transition::To(MonsterState::Trace),
            _ => Transition::To(MonsterState::Idle),
        }
    }

    fn jump_if_on_link(&mut self, from: MonsterState) -> Option<Transition<MonsterState>> {
        if !self.nav.is_on_traversal_link() {
            return None;
        }
        self.resume = from;
        Some(Transition::To(MonsterState::Jump))
    }

    fn enter_jump<C: SimContext + ?Sized>(&mut self, ctx: &mut C) {
        let Some(link) = self.nav.traversal_link() else {
            self.jump = None;
            return;
        };
        self.face(link.end);
        self.jump = Some(JumpArc { link, elapsed: 0.0 });
        ctx.emit(AiEvent::JumpStarted {
            agent: self.entity,
            from: link.start,
            to: link.end,
        });
    }

    fn execute_jump(&mut self, dt: f32) -> Transition<MonsterState> {
        let Some(arc) = self.jump.as_mut() else {
            return Transition::To(self.resume);
        };
        arc.elapsed += dt;
        let t = (arc.elapsed / self.config.jump_duration).min(1.0);
        let position = arc.position(t, self.config.jump_height);
        self.nav.warp(position);

        if t >= 1.0 {
            self.jump = None;
            self.nav.complete_traversal_link();
            return Transition::To(self.resume);
        }
        Transition::None
    }

    fn exit_jump(&mut self) {
        // Interrupted mid-air: land on the far side
        if self.jump.take().is_some() {
            self.nav.complete_traversal_link();
        }
    }

    fn despawn<C: SimContext + ?Sized>(&mut self, ctx: &mut C) {
        self.active = false;
        log::info!("monster {:?} despawned", self.entity);
        ctx.emit(AiEvent::Despawned { agent: self.entity });
    }
}

// ============================================================================
// State machine wiring
// ============================================================================

impl<N: NavigationPort, C: SimContext + ?Sized> Stateful<C> for Monster<N> {
    type State = MonsterState;
    type Task = MonsterTask;

    fn machine(&self) -> &StateMachine<MonsterState, MonsterTask> {
        &self.machine
    }

    fn machine_mut(&mut self) -> &mut StateMachine<MonsterState, MonsterTask> {
        &mut self.machine
    }

    fn on_enter(&mut self, state: MonsterState, ctx: &mut C) {
        ctx.emit(AiEvent::StateEntered {
            agent: self.entity,
            state: state.name(),
        });

        match state {
            MonsterState::Idle => {
                self.nav.reset_path();
                self.schedule_dwell(ctx);
            }
            MonsterState::Patrol => {
                self.nav.set_destination(self.patrol_point);
                let limit = random_range(
                    ctx.rng(),
                    self.config.patrol_min_time,
                    self.config.patrol_max_time,
                );
                self.machine.schedule(limit, MonsterTask::PatrolTimeout);
            }
            MonsterState::Trace => {}
            MonsterState::Comeback => self.nav.set_destination(self.spawn),
            MonsterState::Attack => {
                self.nav.reset_path();
                self.attack_timer = 0.0;
            }
            MonsterState::Hit => self.nav.reset_path(),
            MonsterState::Jump => self.enter_jump(ctx),
            MonsterState::Death => {
                self.nav.reset_path();
                self.knockback = None;
                log::info!("monster {:?} died", self.entity);
                self.machine
                    .schedule(self.config.death_delay, MonsterTask::Despawn);
            }
            MonsterState::Charging => self.enter_charging(ctx),
            MonsterState::Dash => self.enter_dash(),
        }
    }

    fn on_execute(
        &mut self,
        state: MonsterState,
        dt: f32,
        ctx: &mut C,
    ) -> Transition<MonsterState> {
        match state {
            MonsterState::Idle => self.execute_idle(ctx),
            MonsterState::Patrol => self.execute_patrol(ctx),
            MonsterState::Trace => self.execute_trace(ctx),
            MonsterState::Comeback => self.execute_comeback(ctx),
            MonsterState::Attack => self.execute_attack(dt, ctx),
            MonsterState::Hit => self.execute_hit(dt, ctx),
            MonsterState::Jump => self.execute_jump(dt),
            MonsterState::Death => Transition::None,
            MonsterState::Charging => self.execute_charging(ctx),
            MonsterState::Dash => self.execute_dash(dt, ctx),
        }
    }

    fn on_exit(&mut self, state: MonsterState, ctx: &mut C) {
        match state {
            MonsterState::Attack => self.attack_timer = 0.0,
            MonsterState::Hit => self.knockback = None,
            MonsterState::Jump => self.exit_jump(),
            MonsterState::Dash => self.exit_dash(),
            _ => {}
        }

        ctx.emit(AiEvent::StateExited {
            agent: self.entity,
            state: state.name(),
        });
    }

    fn on_task(&mut self, task: MonsterTask, ctx: &mut C) -> Transition<MonsterState> {
        match task {
            MonsterTask::IdleDwell => match self.sample_patrol_point(ctx) {
                Some(point) => {
                    self.patrol_point = point;
                    Transition::To(MonsterState::Patrol)
                }
                None => {
                    log::warn!(
                        "monster {:?} found no patrol point near {}",
                        self.entity,
                        self.spawn
                    );
                    self.schedule_dwell(ctx);
                    Transition::None
                }
            },
            MonsterTask::PatrolTimeout => Transition::To(MonsterState::Idle),
            MonsterTask::Despawn => {
                self.despawn(ctx);
                Transition::None
            }
            MonsterTask::ChargeRelease => Transition::To(MonsterState::Dash),
        }
    }
}

impl<N: NavigationPort, C: SimContext + ?Sized> Damageable<C> for Monster<N> {
    fn try_take_damage(&mut self, damage: &Damage, ctx: &mut C) -> bool {
        let posture = self.posture();
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

        match outcome {
            HitOutcome::Killed => {
                ctx.emit(AiEvent::Killed {
                    entity: self.entity,
                    killer: damage.source,
                });
                self.change_state(MonsterState::Death, ctx);
            }
            HitOutcome::Absorbed => {
                log::debug!(
                    "monster {:?} absorbed {} in {}",
                    self.entity,
                    damage.value,
                    self.machine.current().name()
                );
            }
            HitOutcome::Staggered => {
                self.knockback = Some(Knockback::new(
                    damage.horizontal_direction(),
                    self.config.knockback_force,
                    self.config.knockback_duration,
                ));
                self.change_state(MonsterState::Hit, ctx);
            }
            HitOutcome::Rejected => {}
        }
        true
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests;
