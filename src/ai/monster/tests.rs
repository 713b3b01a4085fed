use super::*;
use crate::sim::testing::{ScriptedNav, TestContext};

fn spawn_monster(ctx: &mut TestContext, config: MonsterConfig) -> Monster<ScriptedNav> {
    let entity = ctx.entity();
    Monster::new(entity, config, ScriptedNav::at(Vec3::ZERO))
}

fn tick_n(monster: &mut Monster<ScriptedNav>, ctx: &mut TestContext, dt: f32, n: usize) {
    for _ in 0..n {
        monster.tick(dt, ctx);
    }
}

#[test]
fn test_lethal_hit_enters_death_and_rejects_further_hits() {
    let mut ctx = TestContext::new();
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());

    assert!(monster.try_take_damage(&Damage::new(150.0), &mut ctx));
    assert_eq!(monster.health().value(), 0.0);
    assert_eq!(monster.state(), MonsterState::Death);

    let before = ctx.events.len();
    assert!(!monster.try_take_damage(&Damage::new(10.0), &mut ctx));
    assert_eq!(ctx.events.len(), before, "rejected hit must not emit");
    assert_eq!(ctx.count(|e| matches!(e, AiEvent::Killed { .. })), 1);
}

#[test]
fn test_idle_detects_target_in_range() {
    let mut ctx = TestContext::new();
    let player = ctx.add_player(Vec3::new(3.0, 0.0, 0.0));
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());

    monster.tick(0.1, &mut ctx);

    assert_eq!(monster.state(), MonsterState::Trace);
    assert_eq!(monster.target(), Some(player));
}

#[test]
fn test_idle_ignores_target_outside_detect_range() {
    let mut ctx = TestContext::new();
    ctx.add_player(Vec3::new(4.5, 0.0, 0.0));
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());

    tick_n(&mut monster, &mut ctx, 0.1, 5);

    assert_eq!(monster.state(), MonsterState::Idle);
}

#[test]
fn test_trace_gives_up_and_comes_back() {
    let mut ctx = TestContext::new();
    let player = ctx.add_player(Vec3::new(30.0, 0.0, 0.0));
    let config = MonsterConfig::default().with_ranges(4.0, 1.2, 15.0);
    let mut monster = spawn_monster(&mut ctx, config);
    monster.nav_mut().position = Vec3::new(10.0, 0.0, 0.0);
    monster.nav_mut().stopping = 0.5;

    monster.set_target(Some(player));
    assert!(monster.change_state(MonsterState::Trace, &mut ctx));
    monster.tick(0.1, &mut ctx);

    assert_eq!(monster.state(), MonsterState::Comeback);
    assert_eq!(monster.nav().destination, Some(Vec3::ZERO));

    monster.nav_mut().remaining = 3.0;
    monster.tick(0.1, &mut ctx);
    assert_eq!(monster.state(), MonsterState::Comeback);

    monster.nav_mut().remaining = 0.4;
    monster.tick(0.1, &mut ctx);
    assert_eq!(monster.state(), MonsterState::Idle);
}

#[test]
fn test_comeback_waits_for_pending_path() {
    let mut ctx = TestContext::new();
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());
    monster.nav_mut().position = Vec3::new(6.0, 0.0, 0.0);
    monster.change_state(MonsterState::Comeback, &mut ctx);

    monster.nav_mut().pending = true;
    monster.tick(0.1, &mut ctx);
    assert_eq!(monster.state(), MonsterState::Comeback);

    monster.nav_mut().pending = false;
    monster.tick(0.1, &mut ctx);
    assert_eq!(monster.state(), MonsterState::Idle);
}

#[test]
fn test_idle_dwell_starts_patrol_near_spawn() {
    let mut ctx = TestContext::new();
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());
    monster.nav_mut().remaining = 5.0;

    for _ in 0..6 {
        monster.tick(1.0, &mut ctx);
        if monster.state() == MonsterState::Patrol {
            break;
        }
    }

    assert_eq!(monster.state(), MonsterState::Patrol);
    let destination = monster.nav().destination.expect("patrol destination");
    assert!(destination.x.abs() <= 3.0 && destination.z.abs() <= 3.0);
    assert!(
        monster.machine.has_pending_task(),
        "patrol timeout scheduled"
    );
}

#[test]
fn test_pending_dwell_does_not_fire_after_state_change() {
    let mut ctx = TestContext::new();
    let player = ctx.add_player(Vec3::new(50.0, 0.0, 0.0));
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());
    monster.nav_mut().remaining = 5.0;

    monster.tick(0.5, &mut ctx);
    assert!(monster.machine.has_pending_task());

    ctx.move_body(player, Vec3::new(3.0, 0.0, 0.0));
    monster.tick(0.1, &mut ctx);
    assert_eq!(monster.state(), MonsterState::Trace);

    // Keep the target between attack and comeback range
    ctx.move_body(player, Vec3::new(6.0, 0.0, 0.0));
    tick_n(&mut monster, &mut ctx, 1.0, 10);

    assert_eq!(monster.state(), MonsterState::Trace);
    assert_eq!(ctx.entered("Patrol"), 0);
}

#[test]
fn test_patrol_sampling_failure_stays_idle() {
    let mut ctx = TestContext::new();
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());
    monster.nav_mut().walkable = false;

    tick_n(&mut monster, &mut ctx, 1.0, 20);

    assert_eq!(monster.state(), MonsterState::Idle);
    assert_eq!(ctx.entered("Patrol"), 0);
    assert!(monster.machine.has_pending_task(), "dwell rescheduled");
}

#[test]
fn test_attack_cadence() {
    let mut ctx = TestContext::new();
    let player = ctx.add_player(Vec3::new(1.0, 0.0, 0.0));
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());

    monster.tick(0.5, &mut ctx);
    monster.tick(0.5, &mut ctx);
    assert_eq!(monster.state(), MonsterState::Attack);

    // First swing lands one full interval after entry
    tick_n(&mut monster, &mut ctx, 0.5, 3);
    assert!(ctx.hits.is_empty());

    monster.tick(0.5, &mut ctx);
    assert_eq!(ctx.hits.len(), 1);
    assert_eq!(ctx.health(player), 90.0);
    assert_eq!(ctx.count(|e| matches!(e, AiEvent::AttackFired { .. })), 1);

    tick_n(&mut monster, &mut ctx, 0.5, 4);
    assert_eq!(ctx.hits.len(), 2);
}

#[test]
fn test_attack_deals_no_damage_outside_play() {
    let mut ctx = TestContext::new();
    ctx.state = crate::sim::GameState::Ready;
    let player = ctx.add_player(Vec3::new(1.0, 0.0, 0.0));
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());

    tick_n(&mut monster, &mut ctx, 0.5, 20);

    assert_eq!(monster.state(), MonsterState::Attack);
    assert!(ctx.hits.is_empty());
    assert_eq!(ctx.health(player), 100.0);
}

#[test]
fn test_attack_exit_uses_buffer() {
    let mut ctx = TestContext::new();
    let player = ctx.add_player(Vec3::new(1.0, 0.0, 0.0));
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());
    tick_n(&mut monster, &mut ctx, 0.1, 2);
    assert_eq!(monster.state(), MonsterState::Attack);

    // 1.2 * 1.2 = 1.44
    ctx.move_body(player, Vec3::new(1.4, 0.0, 0.0));
    monster.tick(0.1, &mut ctx);
    assert_eq!(monster.state(), MonsterState::Attack);

    ctx.move_body(player, Vec3::new(1.6, 0.0, 0.0));
    monster.tick(0.1, &mut ctx);
    assert_eq!(monster.state(), MonsterState::Trace);
}

#[test]
fn test_lost_target_falls_back_to_idle() {
    let mut ctx = TestContext::new();
    let player = ctx.add_player(Vec3::new(3.0, 0.0, 0.0));
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());
    monster.tick(0.1, &mut ctx);
    assert_eq!(monster.state(), MonsterState::Trace);

    ctx.bodies.remove(&player);
    ctx.primary = None;
    monster.tick(0.1, &mut ctx);

    assert_eq!(monster.state(), MonsterState::Idle);
    assert_eq!(monster.target(), None);
}

#[test]
fn test_dead_target_stops_attack() {
    let mut ctx = TestContext::new();
    let player = ctx.add_player(Vec3::new(1.0, 0.0, 0.0));
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());
    tick_n(&mut monster, &mut ctx, 0.1, 2);
    assert_eq!(monster.state(), MonsterState::Attack);

    if let Some(body) = ctx.bodies.get_mut(&player) {
        body.snapshot.dead = true;
    }
    monster.tick(0.1, &mut ctx);

    assert_eq!(monster.state(), MonsterState::Idle);
}

#[test]
fn test_hit_knockback_then_recover() {
    let mut ctx = TestContext::new();
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());
    monster.tick(0.1, &mut ctx);

    let hit = Damage::new(10.0).with_direction(Vec3::X);
    assert!(monster.try_take_damage(&hit, &mut ctx));
    assert_eq!(monster.state(), MonsterState::Hit);
    assert_eq!(monster.health().value(), 90.0);

    tick_n(&mut monster, &mut ctx, 0.1, 2);

    assert_eq!(monster.state(), MonsterState::Idle);
    let pushed = monster.nav().position;
    assert!((pushed.x - 1.0).abs() < 1e-4, "pushed {pushed}");
    assert!(pushed.z.abs() < 1e-6);
}

#[test]
fn test_hit_recovers_into_trace_when_target_close() {
    let mut ctx = TestContext::new();
    ctx.add_player(Vec3::new(0.0, 0.0, 3.0));
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());

    monster.try_take_damage(&Damage::new(5.0).with_direction(Vec3::NEG_X), &mut ctx);
    tick_n(&mut monster, &mut ctx, 0.1, 2);

    assert_eq!(monster.state(), MonsterState::Trace);
}

#[test]
fn test_hit_while_in_hit_restarts_knockback() {
    let mut ctx = TestContext::new();
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());

    monster.try_take_damage(&Damage::new(10.0).with_direction(Vec3::X), &mut ctx);
    monster.tick(0.1, &mut ctx);
    monster.try_take_damage(&Damage::new(10.0).with_direction(Vec3::Z), &mut ctx);

    assert_eq!(monster.state(), MonsterState::Hit);
    assert_eq!(ctx.entered("Hit"), 1, "no re-entry while already in Hit");

    monster.tick(0.1, &mut ctx);
    assert_eq!(
        monster.state(),
        MonsterState::Hit,
        "restarted push still running"
    );
    monster.tick(0.1, &mut ctx);
    assert_eq!(monster.state(), MonsterState::Idle);

    let pushed = monster.nav().position;
    assert!(
        (pushed.x - 0.5).abs() < 1e-4,
        "first push cut short: {pushed}"
    );
    assert!(
        (pushed.z - 1.0).abs() < 1e-4,
        "second push applied fully: {pushed}"
    );
}

#[test]
fn test_death_despawns_after_delay() {
    let mut ctx = TestContext::new();
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());
    monster.try_take_damage(&Damage::new(100.0), &mut ctx);

    monster.tick(1.0, &mut ctx);
    assert!(monster.is_active());

    monster.tick(1.0, &mut ctx);
    assert!(!monster.is_active());
    assert_eq!(ctx.count(|e| matches!(e, AiEvent::Despawned { .. })), 1);
    assert_eq!(monster.posture(), Posture::Down);

    tick_n(&mut monster, &mut ctx, 1.0, 3);
    assert_eq!(ctx.count(|e| matches!(e, AiEvent::Despawned { .. })), 1);
}

#[test]
fn test_death_cancels_pending_dwell() {
    let mut ctx = TestContext::new();
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());
    monster.tick(0.1, &mut ctx);

    monster.try_take_damage(&Damage::new(200.0), &mut ctx);
    tick_n(&mut monster, &mut ctx, 1.0, 6);

    assert_eq!(ctx.entered("Patrol"), 0);
    assert_eq!(ctx.entered("Idle"), 1);
}

#[test]
fn test_jump_across_traversal_link() {
    let mut ctx = TestContext::new();
    ctx.add_player(Vec3::new(3.5, 0.0, 0.0));
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());
    monster.nav_mut().link = Some(TraversalLink::new(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)));

    monster.tick(0.5, &mut ctx);
    assert_eq!(monster.state(), MonsterState::Trace);
    monster.tick(0.5, &mut ctx);
    assert_eq!(monster.state(), MonsterState::Jump);
    assert_eq!(ctx.count(|e| matches!(e, AiEvent::JumpStarted { .. })), 1);

    monster.tick(0.5, &mut ctx);
    let apex = monster.position();
    assert!(
        (apex - Vec3::new(2.0, 2.0, 0.0)).length() < 1e-4,
        "apex {apex}"
    );

    monster.tick(0.5, &mut ctx);
    assert_eq!(monster.state(), MonsterState::Trace);
    assert_eq!(monster.nav().position, Vec3::new(4.0, 0.0, 0.0));
    assert!(monster.nav().link.is_none());
}

#[test]
fn test_damage_mid_jump_does_not_stagger() {
    let mut ctx = TestContext::new();
    ctx.add_player(Vec3::new(3.5, 0.0, 0.0));
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());
    monster.nav_mut().link = Some(TraversalLink::new(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)));
    tick_n(&mut monster, &mut ctx, 0.5, 2);
    assert_eq!(monster.state(), MonsterState::Jump);

    let hit = Damage::new(10.0).with_direction(Vec3::X);
    assert!(monster.try_take_damage(&hit, &mut ctx));

    assert_eq!(monster.state(), MonsterState::Jump);
    assert_eq!(monster.health().value(), 90.0);
}

#[test]
fn test_enter_exit_stay_paired() {
    let mut ctx = TestContext::new();
    let player = ctx.add_player(Vec3::new(3.0, 0.0, 0.0));
    let mut monster = spawn_monster(&mut ctx, MonsterConfig::default());

    let path = [
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(6.0, 0.0, 0.0),
        Vec3::new(30.0, 0.0, 0.0),
        Vec3::new(2.0, 0.0, 0.0),
    ];
    for point in path {
        ctx.move_body(player, point);
        tick_n(&mut monster, &mut ctx, 0.25, 4);
    }
    monster.try_take_damage(&Damage::new(5.0).with_direction(Vec3::X), &mut ctx);
    tick_n(&mut monster, &mut ctx, 0.1, 3);

    for state in ["Idle", "Trace", "Attack", "Comeback", "Hit"] {
        let entered = ctx.entered(state) as i64;
        let exited = ctx.count(
            |e| matches!(e, AiEvent::StateExited { state: s, .. } if *s == state),
        ) as i64;
        let active = i64::from(monster.state().name() == state);
        assert_eq!(entered - exited, active, "{state} enter/exit mismatch");
    }
}
