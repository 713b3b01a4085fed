//! Tuning configuration
//!
//! Every tunable the agents read lives here, grouped per agent type.
//! Configs round-trip through RON (the preferred on-disk format) and JSON.

use std::fs;
use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
    /// A value violates a tuning invariant
    #[error("invalid `{field}`: {reason}")]
    Invalid {
        /// Dotted field path
        field: &'static str,
        /// What is wrong with it
        reason: &'static str,
    },
}

fn ensure(ok: bool, field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason })
    }
}

// ============================================================================
// Monster
// ============================================================================

/// Melee monster tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterConfig {
    /// Maximum health
    pub max_health: f32,
    /// Health regenerated per second while alive
    pub health_regen: f32,
    /// Distance at which the target is noticed
    pub detect_range: f32,
    /// Distance at which melee attacks start
    pub attack_range: f32,
    /// Chase is abandoned beyond this distance; must exceed `detect_range`
    pub comeback_range: f32,
    /// Attack keeps going until the target is beyond `attack_range * attack_exit_buffer`
    pub attack_exit_buffer: f32,
    /// Navigation speed
    pub move_speed: f32,
    /// Seconds between melee hits
    pub attack_interval: f32,
    /// Damage per melee hit
    pub attack_damage: f32,
    /// Knockback speed when hit
    pub knockback_force: f32,
    /// Knockback duration in seconds
    pub knockback_duration: f32,
    /// Half-size of the patrol square around spawn
    pub patrol_radius: f32,
    /// Minimum patrol leg duration
    pub patrol_min_time: f32,
    /// Maximum patrol leg duration
    pub patrol_max_time: f32,
    /// Patrol point samples before giving up
    pub patrol_sample_attempts: u32,
    /// Maximum snap distance onto the navigable surface
    pub patrol_sample_distance: f32,
    /// Minimum idle dwell
    pub idle_min: f32,
    /// Maximum idle dwell
    pub idle_max: f32,
    /// Distance to spawn that counts as home
    pub arrival_tolerance: f32,
    /// Seconds between death and despawn
    pub death_delay: f32,
    /// Apex height of traversal-link jumps
    pub jump_height: f32,
    /// Duration of traversal-link jumps
    pub jump_duration: f32,
    /// Collider radius
    pub body_radius: f32,
    /// Collider height
    pub body_height: f32,
}

impl Default for MonsterConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            health_regen: 0.0,
            detect_range: 4.0,
            attack_range: 1.2,
            comeback_range: 8.0,
            attack_exit_buffer: 1.2,
            move_speed: 5.0,
            attack_interval: 2.0,
            attack_damage: 10.0,
            knockback_force: 5.0,
            knockback_duration: 0.2,
            patrol_radius: 3.0,
            patrol_min_time: 2.0,
            patrol_max_time: 10.0,
            patrol_sample_attempts: 10,
            patrol_sample_distance: 1.0,
            idle_min: 2.0,
            idle_max: 5.0,
            arrival_tolerance: 0.1,
            death_delay: 2.0,
            jump_height: 2.0,
            jump_duration: 1.0,
            body_radius: 0.4,
            body_height: 1.8,
        }
    }
}

impl MonsterConfig {
    /// Set detection and comeback ranges together.
    #[must_use]
    pub fn with_ranges(mut self, detect: f32, attack: f32, comeback: f32) -> Self {
        self.detect_range = detect;
        self.attack_range = attack;
        self.comeback_range = comeback;
        self
    }

    /// Set the idle dwell window.
    #[must_use]
    pub fn with_idle(mut self, min: f32, max: f32) -> Self {
        self.idle_min = min;
        self.idle_max = max;
        self
    }

    /// Set melee cadence and damage.
    #[must_use]
    pub fn with_attack(mut self, interval: f32, damage: f32) -> Self {
        self.attack_interval = interval;
        self.attack_damage = damage;
        self
    }

    /// Set maximum health.
    #[must_use]
    pub fn with_health(mut self, max_health: f32) -> Self {
        self.max_health = max_health;
        self
    }

    /// Check tuning invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.max_health > 0.0,
            "monster.max_health",
            "must be positive",
        )?;
        ensure(
            self.detect_range > 0.0,
            "monster.detect_range",
            "must be positive",
        )?;
        ensure(
            self.attack_range > 0.0 && self.attack_range <= self.detect_range,
            "monster.attack_range",
            "must be positive and not exceed detect_range",
        )?;
        ensure(
            self.comeback_range > self.detect_range,
            "monster.comeback_range",
            "must be strictly greater than detect_range",
        )?;
        ensure(
            self.attack_exit_buffer >= 1.0,
            "monster.attack_exit_buffer",
            "must be at least 1",
        )?;
        ensure(
            self.move_speed > 0.0,
            "monster.move_speed",
            "must be positive",
        )?;
        ensure(
            self.attack_interval > 0.0,
            "monster.attack_interval",
            "must be positive",
        )?;
        ensure(
            self.knockback_duration >= 0.0,
            "monster.knockback_duration",
            "must not be negative",
        )?;
        ensure(
            self.idle_min >= 0.0 && self.idle_min <= self.idle_max,
            "monster.idle_min",
            "must be non-negative and not exceed idle_max",
        )?;
        ensure(
            self.patrol_min_time > 0.0 && self.patrol_min_time <= self.patrol_max_time,
            "monster.patrol_min_time",
            "must be positive and not exceed patrol_max_time",
        )?;
        ensure(
            self.patrol_sample_attempts > 0,
            "monster.patrol_sample_attempts",
            "must be at least 1",
        )?;
        ensure(
            self.death_delay >= 0.0,
            "monster.death_delay",
            "must not be negative",
        )?;
        ensure(
            self.jump_duration > 0.0,
            "monster.jump_duration",
            "must be positive",
        )?;
        Ok(())
    }
}

// ============================================================================
// Elite
// ============================================================================

/// Charge-and-rush skill tuning layered on top of [`MonsterConfig`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EliteConfig {
    /// Maximum health of an elite
    pub max_health: f32,
    /// Detect and comeback ranges are multiplied by this
    pub detect_multiplier: f32,
    /// Targets closer than this are meleed instead of rushed
    pub push_distance: f32,
    /// Rush triggers when the target is within this distance
    pub charge_distance: f32,
    /// Telegraph duration before the rush
    pub charge_duration: f32,
    /// Seconds after a rush before the next charge
    pub charge_cooldown: f32,
    /// Rush speed
    pub dash_speed: f32,
    /// Rush damage
    pub dash_damage: f32,
    /// Knockback applied to the rush victim
    pub dash_knockback: f32,
    /// Hit-check radius during the rush
    pub dash_hit_radius: f32,
    /// Rush overshoots the charge distance by this much
    pub dash_extra_distance: f32,
    /// Distance to the rush end point that counts as arrived
    pub dash_arrival_threshold: f32,
    /// A blocked rush gives up after `travel / speed * dash_timeout_factor`
    pub dash_timeout_factor: f32,
}

impl Default for EliteConfig {
    fn default() -> Self {
        Self {
            max_health: 300.0,
            detect_multiplier: 2.0,
            push_distance: 2.0,
            charge_distance: 10.0,
            charge_duration: 2.5,
            charge_cooldown: 10.0,
            dash_speed: 15.0,
            dash_damage: 20.0,
            dash_knockback: 15.0,
            dash_hit_radius: 2.0,
            dash_extra_distance: 2.0,
            dash_arrival_threshold: 0.5,
            dash_timeout_factor: 1.5,
        }
    }
}

impl EliteConfig {
    /// Travel distance of one rush.
    #[must_use]
    pub fn dash_travel(&self) -> f32 {
        self.charge_distance + self.dash_extra_distance
    }

    /// Derive the base monster tuning an elite runs with.
    #[must_use]
    pub fn apply_to(&self, base: &MonsterConfig) -> MonsterConfig {
        MonsterConfig {
            max_health: self.max_health,
            detect_range: base.detect_range * self.detect_multiplier,
            comeback_range: base.comeback_range * self.detect_multiplier,
            attack_range: base.attack_range.max(self.push_distance),
            ..base.clone()
        }
    }

    /// Check tuning invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.max_health > 0.0,
            "elite.max_health",
            "must be positive",
        )?;
        ensure(
            self.detect_multiplier >= 1.0,
            "elite.detect_multiplier",
            "must be at least 1",
        )?;
        ensure(
            self.charge_distance > 0.0,
            "elite.charge_distance",
            "must be positive",
        )?;
        ensure(
            self.charge_duration > 0.0,
            "elite.charge_duration",
            "must be positive",
        )?;
        ensure(
            self.charge_cooldown >= 0.0,
            "elite.charge_cooldown",
            "must not be negative",
        )?;
        ensure(
            self.dash_speed > 0.0,
            "elite.dash_speed",
            "must be positive",
        )?;
        ensure(
            self.dash_arrival_threshold > 0.0,
            "elite.dash_arrival_threshold",
            "must be positive",
        )?;
        ensure(
            self.dash_timeout_factor >= 1.0,
            "elite.dash_timeout_factor",
            "must be at least 1",
        )?;
        Ok(())
    }
}

// ============================================================================
// Drone
// ============================================================================

/// Support drone tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DroneConfig {
    /// Maximum health
    pub max_health: f32,
    /// Top travel speed
    pub move_speed: f32,
    /// Base rotation speed; the turret turns at ten times this in degrees/s
    pub rotation_speed: f32,
    /// Follow offset in the owner's local frame
    pub idle_offset: Vec3,
    /// Follow offset while the owner is in cover
    pub cover_offset: Vec3,
    /// Smoothing time while following the owner
    pub follow_smooth_time: f32,
    /// Hover height above the target in combat
    pub combat_hover_height: f32,
    /// Smoothing time while approaching
    pub move_smooth_time: f32,
    /// Body slerp rate while approaching
    pub body_rotation_speed: f32,
    /// Body slerp rate while following the owner or attacking
    pub attack_body_rate: f32,
    /// Engagement range
    pub attack_range: f32,
    /// Re-approach once the target is beyond `attack_range * attack_exit_buffer`
    pub attack_exit_buffer: f32,
    /// Seconds between shots
    pub fire_rate: f32,
    /// Enemy scan radius
    pub scan_radius: f32,
    /// Seconds between scans while idle
    pub scan_interval: f32,
    /// Maximum enemies considered per scan
    pub scan_capacity: usize,
    /// Damage per shot
    pub damage: f32,
    /// Hit-scan range
    pub max_shoot_range: f32,
    /// Muzzle offset in the turret frame
    pub fire_point: Vec3,
    /// Number of recycled tracers
    pub tracer_pool_size: usize,
    /// Tracer travel speed
    pub tracer_speed: f32,
    /// Tracer segment length
    pub tracer_length: f32,
    /// Return flight speed multiplier
    pub return_speed_multiplier: f32,
    /// Height above the owner the drone docks at
    pub return_height: f32,
    /// Docking radius
    pub return_arrival_radius: f32,
    /// Collider radius
    pub body_radius: f32,
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            max_health: 50.0,
            move_speed: 8.0,
            rotation_speed: 5.0,
            idle_offset: Vec3::new(1.5, 2.5, -1.0),
            cover_offset: Vec3::new(1.5, 1.0, -0.5),
            follow_smooth_time: 0.5,
            combat_hover_height: 1.5,
            move_smooth_time: 0.3,
            body_rotation_speed: 5.0,
            attack_body_rate: 2.0,
            attack_range: 15.0,
            attack_exit_buffer: 1.2,
            fire_rate: 0.1,
            scan_radius: 20.0,
            scan_interval: 0.2,
            scan_capacity: 10,
            damage: 5.0,
            max_shoot_range: 50.0,
            fire_point: Vec3::new(0.0, 0.0, -0.3),
            tracer_pool_size: 5,
            tracer_speed: 80.0,
            tracer_length: 1.0,
            return_speed_multiplier: 1.5,
            return_height: 1.5,
            return_arrival_radius: 0.5,
            body_radius: 0.3,
        }
    }
}

impl DroneConfig {
    /// Turret turn rate in radians per second.
    #[must_use]
    pub fn turret_turn_rate(&self) -> f32 {
        (self.rotation_speed * 10.0).to_radians()
    }

    /// Set the fire cadence.
    #[must_use]
    pub fn with_fire_rate(mut self, fire_rate: f32) -> Self {
        self.fire_rate = fire_rate;
        self
    }

    /// Check tuning invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.max_health > 0.0,
            "drone.max_health",
            "must be positive",
        )?;
        ensure(
            self.move_speed > 0.0,
            "drone.move_speed",
            "must be positive",
        )?;
        ensure(self.fire_rate > 0.0, "drone.fire_rate", "must be positive")?;
        ensure(
            self.attack_range > 0.0,
            "drone.attack_range",
            "must be positive",
        )?;
        ensure(
            self.attack_exit_buffer >= 1.0,
            "drone.attack_exit_buffer",
            "must be at least 1",
        )?;
        ensure(
            self.scan_radius > 0.0,
            "drone.scan_radius",
            "must be positive",
        )?;
        ensure(
            self.scan_capacity > 0,
            "drone.scan_capacity",
            "must be at least 1",
        )?;
        ensure(
            self.follow_smooth_time > 0.0 && self.move_smooth_time > 0.0,
            "drone.move_smooth_time",
            "smoothing times must be positive",
        )?;
        ensure(
            self.tracer_pool_size > 0,
            "drone.tracer_pool_size",
            "must be at least 1",
        )?;
        ensure(
            self.tracer_speed > 0.0,
            "drone.tracer_speed",
            "must be positive",
        )?;
        Ok(())
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// Navigation grid layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Width in cells
    pub width: usize,
    /// Depth in cells
    pub height: usize,
    /// Cell edge in world units
    pub cell_size: f32,
    /// World XZ position of cell (0, 0)'s corner
    pub origin: Vec2,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            cell_size: 1.0,
            origin: Vec2::new(-32.0, -32.0),
        }
    }
}

/// World-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// RNG seed
    pub seed: u64,
    /// Seconds in `Ready` before `Playing`
    pub ready_delay: f32,
    /// Player maximum health
    pub player_max_health: f32,
    /// Player health regeneration per second
    pub player_health_regen: f32,
    /// Player maximum stamina
    pub player_max_stamina: f32,
    /// Player stamina regeneration per second
    pub player_stamina_regen: f32,
    /// Exponential decay rate of knockback impacts on bodies
    pub impact_decay: f32,
    /// Player collider radius
    pub player_radius: f32,
    /// Player collider height
    pub player_height: f32,
    /// Navigation grid
    pub grid: GridConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            ready_delay: 2.5,
            player_max_health: 100.0,
            player_health_regen: 0.0,
            player_max_stamina: 100.0,
            player_stamina_regen: 10.0,
            impact_decay: 5.0,
            player_radius: 0.4,
            player_height: 1.8,
            grid: GridConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Check invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.ready_delay >= 0.0,
            "simulation.ready_delay",
            "must not be negative",
        )?;
        ensure(
            self.player_max_health > 0.0,
            "simulation.player_max_health",
            "must be positive",
        )?;
        ensure(
            self.grid.width > 0 && self.grid.height > 0,
            "simulation.grid",
            "must have at least one cell",
        )?;
        ensure(
            self.grid.cell_size > 0.0,
            "simulation.grid.cell_size",
            "must be positive",
        )?;
        Ok(())
    }
}

// ============================================================================
// Props
// ============================================================================

/// Destructible prop spawned into the level
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PropConfig {
    /// Collider radius
    pub radius: f32,
    /// Health
    pub max_health: f32,
    /// Reach of the blast when destroyed; 0 for props that just break
    pub explosion_radius: f32,
    /// Damage dealt to everything the blast reaches
    pub explosion_damage: f32,
}

impl Default for PropConfig {
    fn default() -> Self {
        Self {
            radius: 0.5,
            max_health: 30.0,
            explosion_radius: 3.0,
            explosion_damage: 60.0,
        }
    }
}

impl PropConfig {
    /// A prop that breaks without exploding
    #[must_use]
    pub fn inert(radius: f32, max_health: f32) -> Self {
        Self {
            radius,
            max_health,
            explosion_radius: 0.0,
            explosion_damage: 0.0,
        }
    }

    /// Set the blast.
    #[must_use]
    pub fn with_explosion(mut self, radius: f32, damage: f32) -> Self {
        self.explosion_radius = radius;
        self.explosion_damage = damage;
        self
    }

    /// Check if destroying the prop sets off a blast
    #[must_use]
    pub fn explodes(&self) -> bool {
        self.explosion_radius > 0.0 && self.explosion_damage > 0.0
    }

    /// Check invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(self.radius > 0.0, "prop.radius", "must be positive")?;
        ensure(self.max_health > 0.0, "prop.max_health", "must be positive")?;
        ensure(
            self.explosion_radius >= 0.0,
            "prop.explosion_radius",
            "must not be negative",
        )?;
        ensure(
            self.explosion_damage >= 0.0,
            "prop.explosion_damage",
            "must not be negative",
        )?;
        Ok(())
    }
}

// ============================================================================
// Root
// ============================================================================

/// Complete AI tuning
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// World settings
    pub simulation: SimulationConfig,
    /// Melee monster
    pub monster: MonsterConfig,
    /// Elite skill layer
    pub elite: EliteConfig,
    /// Support drone
    pub drone: DroneConfig,
    /// Default destructible prop
    pub prop: PropConfig,
}

impl AiConfig {
    /// Check every section.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.monster.validate()?;
        self.elite.validate()?;
        self.elite.apply_to(&self.monster).validate()?;
        self.drone.validate()?;
        self.prop.validate()
    }

    /// Parse and validate a RON document.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or validation fails
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or validation fails
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a RON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Save as a RON file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, ron_string)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_field(err: &ConfigError) -> Option<&'static str> {
        match err {
            ConfigError::Invalid { field, .. } => Some(*field),
            _ => None,
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        AiConfig::default().validate().unwrap();
    }

    #[test]
    fn test_comeback_must_exceed_detect() {
        let monster = MonsterConfig::default().with_ranges(4.0, 1.2, 4.0);
        let err = monster.validate().unwrap_err();
        assert_eq!(invalid_field(&err), Some("monster.comeback_range"));
    }

    #[test]
    fn test_elite_scales_ranges() {
        let elite = EliteConfig::default();
        let derived = elite.apply_to(&MonsterConfig::default());

        assert_eq!(derived.detect_range, 8.0);
        assert_eq!(derived.comeback_range, 16.0);
        assert_eq!(
            derived.attack_range, 2.0,
            "melee reach matches push distance"
        );
        assert_eq!(derived.max_health, 300.0);
        derived.validate().unwrap();
    }

    #[test]
    fn test_ron_partial_document_uses_defaults() {
        let config = AiConfig::from_ron_str(
            "(monster: (detect_range: 6.0, comeback_range: 12.0), drone: (fire_rate: 0.25))",
        )
        .unwrap();

        assert_eq!(config.monster.detect_range, 6.0);
        assert_eq!(config.monster.attack_range, 1.2);
        assert_eq!(config.drone.fire_rate, 0.25);
        assert_eq!(config.elite.charge_duration, 2.5);
    }

    #[test]
    fn test_ron_round_trip_through_string() {
        let config = AiConfig::default();
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let loaded = AiConfig::from_ron_str(&text).unwrap();
        assert_eq!(loaded.drone.idle_offset, config.drone.idle_offset);
    }

    #[test]
    fn test_json_rejects_invalid_values() {
        let err = AiConfig::from_json_str(r#"{"drone": {"fire_rate": 0.0}}"#).unwrap_err();
        assert_eq!(invalid_field(&err), Some("drone.fire_rate"));
    }

    #[test]
    fn test_prop_blast_must_not_be_negative() {
        let mut config = AiConfig::default();
        config.prop = PropConfig::default().with_explosion(-1.0, 10.0);
        let err = config.validate().unwrap_err();
        assert_eq!(invalid_field(&err), Some("prop.explosion_radius"));

        assert!(!PropConfig::inert(0.5, 20.0).explodes());
        assert!(PropConfig::default().explodes());
    }

    #[test]
    fn test_malformed_ron_is_parse_error() {
        let err = AiConfig::from_ron_str("(monster: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
