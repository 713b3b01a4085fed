//! Elite rush skill
//!
//! An elite telegraphs a rush (Charging), then commits to it (Dash): the
//! direction is captured once when the telegraph starts and never re-aimed,
//! so the player can sidestep. Both states are hyper-armored: hits still
//! cost health but do not interrupt.

use glam::Vec3;

use super::{Monster, MonsterState, MonsterTask};
use crate::ai::fsm::Transition;
use crate::ai::navigation::NavigationPort;
use crate::ai::perception::{BodySnapshot, ScanBuffer, flat_direction, within_range};
use crate::combat::Damage;
use crate::core::{AiEvent, EliteConfig};
use crate::physics::Layer;
use crate::sim::SimContext;

/// Runtime state of the rush skill
#[derive(Debug, Clone)]
pub struct EliteSkill {
    config: EliteConfig,
    /// Seconds until the next charge is allowed
    cooldown: f32,
    direction: Vec3,
    travelled: f32,
    elapsed: f32,
    hit_landed: bool,
    victims: ScanBuffer,
}

impl EliteSkill {
    /// Ready-to-use skill
    #[must_use]
    pub fn new(config: EliteConfig) -> Self {
        Self {
            config,
            cooldown: 0.0,
            direction: Vec3::NEG_Z,
            travelled: 0.0,
            elapsed: 0.0,
            hit_landed: false,
            victims: ScanBuffer::new(4),
        }
    }

    /// Skill tuning
    #[must_use]
    pub fn config(&self) -> &EliteConfig {
        &self.config
    }

    /// Seconds until the rush can be used again
    #[must_use]
    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown
    }

    /// Check if the rush can be used
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cooldown <= 0.0
    }

    /// Locked rush direction
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Check if the current rush already connected
    #[must_use]
    pub fn hit_landed(&self) -> bool {
        self.hit_landed
    }

    pub(super) fn cool_down(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
    }
}

impl<N: NavigationPort> Monster<N> {
    /// Trace checks an elite makes before the base chase rules.
    pub(super) fn elite_trace_override(&self, target: &BodySnapshot) -> Option<MonsterState> {
        let skill = self.elite.as_ref()?;
        let position = self.position();

        if within_range(position, target.position, skill.config.push_distance) {
            return Some(MonsterState::Attack);
        }
        if skill.is_ready() && within_range(position, target.position, skill.config.charge_distance)
        {
            return Some(MonsterState::Charging);
        }
        None
    }

    pub(super) fn enter_charging<C: SimContext + ?Sized>(&mut self, ctx: &mut C) {
        self.nav.reset_path();

        let position = self.position();
        let aimed = self
            .current_target(ctx)
            .map(|target| flat_direction(position, target.position))
            .filter(|direction| *direction != Vec3::ZERO);
        let direction = aimed.unwrap_or_else(|| {
            let forward = self.transform.forward();
            Vec3::new(forward.x, 0.0, forward.z).normalize_or(Vec3::NEG_Z)
        });

        let Some(skill) = self.elite.as_mut() else {
            debug_assert!(false, "Charging entered by a non-elite monster");
            return;
        };
        skill.direction = direction;
        let travel = skill.config.dash_travel();
        let duration = skill.config.charge_duration;

        self.face(position + direction);
        ctx.emit(AiEvent::ChargeTelegraph {
            agent: self.entity,
            from: position,
            to: position + direction * travel,
        });
        self.machine.schedule(duration, MonsterTask::ChargeRelease);
    }

    pub(super) fn execute_charging<C: SimContext + ?Sized>(
        &mut self,
        ctx: &mut C,
    ) -> Transition<MonsterState> {
        if self.elite.is_none() {
            debug_assert!(false, "Charging entered by a non-elite monster");
            return Transition::To(MonsterState::Trace);
        }
        if self.current_target(ctx).is_none() {
            return Transition::To(MonsterState::Idle);
        }
        Transition::None
    }

    pub(super) fn enter_dash(&mut self) {
        self.nav.reset_path();
        if let Some(skill) = self.elite.as_mut() {
            skill.travelled = 0.0;
            skill.elapsed = 0.0;
            skill.hit_landed = false;
        }
    }

    pub(super) fn execute_dash<C: SimContext + ?Sized>(
        &mut self,
        dt: f32,
        ctx: &mut C,
    ) -> Transition<MonsterState> {
        let entity = self.entity;
        let Some(skill) = self.elite.as_mut() else {
            debug_assert!(false, "Dash entered by a non-elite monster");
            return Transition::To(MonsterState::Trace);
        };
        let config = skill.config.clone();
        let travel = config.dash_travel();
        skill.elapsed += dt;

        // Never step past the end so the arrival window cannot be skipped
        let remaining = travel - skill.travelled;
        let step = (config.dash_speed * dt).min(remaining.max(0.0));
        let direction = skill.direction;
        let applied = self.nav.nudge(direction * step);
        skill.travelled += applied.length();
        let position = self.nav.position();

        if !skill.hit_landed && ctx.game_state().is_playing() {
            ctx.scan(
                position + Vec3::Y,
                config.dash_hit_radius,
                Layer::PLAYER,
                Some(entity),
                &mut skill.victims,
            );
            let damage = Damage::new(config.dash_damage)
                .with_direction(direction)
                .at(position + Vec3::Y)
                .with_source(entity);
            for victim in skill.victims.iter() {
                let valid = ctx.locate(victim).is_some_and(|body| body.is_valid());
                if valid && ctx.apply_damage(victim, &damage) {
                    skill.hit_landed = true;
                    ctx.push_body(victim, direction, config.dash_knockback);
                    ctx.emit(AiEvent::DashHit {
                        agent: entity,
                        target: victim,
                    });
                    break;
                }
            }
        }

        let arrived = travel - skill.travelled <= config.dash_arrival_threshold;
        let timed_out = skill.elapsed >= travel / config.dash_speed * config.dash_timeout_factor;
        if timed_out && !arrived {
            log::debug!(
                "elite {entity:?} rush blocked after {:.2}m",
                skill.travelled
            );
        }

        self.transform.position = position;
        self.face(position + direction);

        if arrived || timed_out {
            Transition::To(MonsterState::Trace)
        } else {
            Transition::None
        }
    }

    pub(super) fn exit_dash(&mut self) {
        if let Some(skill) = self.elite.as_mut() {
            skill.cooldown = skill.config.charge_cooldown;
        }
    }
}
