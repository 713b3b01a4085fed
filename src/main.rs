//! Headless encounter demonstrating the monster and drone AI
//!
//! Usage: `monster_ai [config.ron]`

use monster_ai::prelude::*;

/// Fixed step of the demo loop
const STEP: f32 = 1.0 / 60.0;
/// Encounter length in seconds
const DURATION: f32 = 30.0;
/// When the drone is called back
const RECALL_AT: f32 = 20.0;

/// Running totals printed at the end
#[derive(Debug, Default)]
struct Tally {
    swings: u32,
    shots: u32,
    dashes: u32,
    kills: u32,
    jumps: u32,
}

impl Tally {
    fn record(&mut self, event: &AiEvent) {
        match event {
            AiEvent::AttackFired { .. } => self.swings += 1,
            AiEvent::ShotFired { .. } => self.shots += 1,
            AiEvent::DashHit { .. } => self.dashes += 1,
            AiEvent::Killed { entity, .. } => {
                self.kills += 1;
                log::info!("{entity:?} killed");
            }
            AiEvent::JumpStarted { agent, .. } => {
                self.jumps += 1;
                log::debug!("{agent:?} jumping");
            }
            AiEvent::ChargeTelegraph { agent, to, .. } => {
                log::info!("{agent:?} is charging towards {to}");
            }
            AiEvent::Exploded { entity, radius, .. } => {
                log::info!("{entity:?} exploded ({radius} reach)");
            }
            AiEvent::GameStateChanged { state } => log::info!("Game state: {state:?}"),
            _ => {}
        }
    }
}

fn load_config() -> Result<AiConfig, ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading tuning from {path}");
            AiConfig::load_ron(path)
        }
        None => Ok(AiConfig::default()),
    }
}

fn main() -> Result<(), ConfigError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let mut sim = Simulation::new(config)?;

    // A wall with a jump link over it
    sim.block_area(Vec3::new(-4.0, 0.0, -6.0), Vec3::new(4.0, 2.0, -5.0));
    sim.add_traversal_link(Vec3::new(0.5, 0.0, -7.5), Vec3::new(0.5, 0.0, -3.5));

    let player = sim.spawn_player(Vec3::new(0.5, 0.0, 0.5));
    sim.spawn_monster(Vec3::new(3.5, 0.0, 2.5));
    sim.spawn_monster(Vec3::new(0.5, 0.0, -9.5));
    let elite = sim.spawn_elite(Vec3::new(-6.5, 0.0, 6.5));
    let crate_prop = sim.spawn_default_prop(Vec3::new(2.0, 0.5, -2.0));

    let drone = sim.deploy_drone(Vec3::new(0.5, 2.0, 1.5));
    if let Some(drone) = drone {
        sim.set_drone_target(drone, elite);
    }

    let mut tally = Tally::default();
    let mut recalled = false;
    while sim.time() < DURATION && sim.state() != GameState::GameOver {
        // The player strafes and shoots the crate once things are underway
        let t = sim.time();
        let strafe = Vec3::new((t * 0.5).sin() * 2.0, 0.0, 0.5);
        sim.move_player(strafe, Quat::IDENTITY);
        sim.set_player_cover(t > 10.0 && t < 15.0);
        if (t - 5.0).abs() < STEP * 0.5 {
            sim.apply_damage(crate_prop, &Damage::new(30.0).with_source(player));
        }

        if !recalled && t >= RECALL_AT {
            if let Some(drone) = drone {
                sim.recall_drone(drone);
            }
            recalled = true;
        }

        sim.tick(STEP);
        for event in sim.events().iter() {
            tally.record(event);
        }
    }

    let health = sim
        .world()
        .get::<monster_ai::ecs::Vitals>(player)
        .map(|vitals| vitals.health.value())
        .unwrap_or(0.0);
    log::info!(
        "Encounter ended after {:.1}s in {:?}: player health {:.0}",
        sim.time(),
        sim.state(),
        health
    );
    log::info!(
        "{} monsters left, {} drones out",
        sim.monsters().len(),
        sim.drones().count()
    );
    log::info!("{tally:?}");
    Ok(())
}
