//! Headless tests for level outcome signals.
//!
//! Covered scenarios:
//! 1. The first pass reports `LevelStarted`; spawned enemies are announced
//!    and counted.
//! 2. Killing the last enemy reports `LevelComplete` exactly once.
//! 3. Player damage is relayed and the player's death reports
//!    `PlayerDefeated` exactly once.
//! 4. An enemy killed on the frame it first appears still leaves the
//!    level completable.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use skirmish::config::GameplayConfig;
use skirmish::death::DeathRequested;
use skirmish::enemy::{enemy_body, handle_enemy_deaths};
use skirmish::health::{apply_damage_requests, DamageRequest, Damaged, Died, Health};
use skirmish::level::{
    announce_spawned_enemies, track_player_outcome, track_roster, LevelProgress, LevelSignal,
    RosterEvent,
};
use skirmish::player::Player;
use skirmish::timers::TimerElapsed;
use std::time::Duration;

// ── Helpers ───────────────────────────────────────────────────────────────────

#[derive(Resource, Default)]
struct Signals(Vec<LevelSignal>);

fn collect_signals(mut reader: MessageReader<LevelSignal>, mut seen: ResMut<Signals>) {
    seen.0.extend(reader.read().copied());
}

fn level_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)));
    app.init_resource::<LevelProgress>();
    app.init_resource::<Signals>();
    app.add_message::<DamageRequest>()
        .add_message::<Damaged>()
        .add_message::<Died>()
        .add_message::<DeathRequested>()
        .add_message::<TimerElapsed>()
        .add_message::<RosterEvent>()
        .add_message::<LevelSignal>();
    app.add_systems(
        Update,
        (
            announce_spawned_enemies,
            apply_damage_requests,
            handle_enemy_deaths,
            track_roster,
            track_player_outcome,
            collect_signals,
        )
            .chain(),
    );
    app
}

fn spawn_enemy(app: &mut App, x: f32) -> Entity {
    let config = GameplayConfig::default();
    app.world_mut().spawn(enemy_body(&config, Vec2::new(x, 0.0))).id()
}

fn hit(app: &mut App, target: Entity, amount: i32) {
    app.world_mut().write_message(DamageRequest { target, amount });
    app.update();
}

fn take_signals(app: &mut App) -> Vec<LevelSignal> {
    std::mem::take(&mut app.world_mut().resource_mut::<Signals>().0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn start_and_roster_count() {
    let mut app = level_test_app();
    spawn_enemy(&mut app, 0.0);
    spawn_enemy(&mut app, 2.0);

    app.update();

    assert_eq!(
        take_signals(&mut app),
        vec![
            LevelSignal::LevelStarted,
            LevelSignal::EnemiesRemaining(1),
            LevelSignal::EnemiesRemaining(2),
        ]
    );
    assert_eq!(app.world().resource::<LevelProgress>().remaining(), 2);

    app.update();
    assert!(take_signals(&mut app).is_empty(), "started is reported once");
}

#[test]
fn last_death_completes_level_once() {
    let mut app = level_test_app();
    let a = spawn_enemy(&mut app, 0.0);
    let b = spawn_enemy(&mut app, 2.0);
    app.update();
    take_signals(&mut app);

    hit(&mut app, a, 100);
    assert_eq!(take_signals(&mut app), vec![LevelSignal::EnemiesRemaining(1)]);

    hit(&mut app, b, 100);
    assert_eq!(
        take_signals(&mut app),
        vec![LevelSignal::EnemiesRemaining(0), LevelSignal::LevelComplete]
    );
    assert!(app.world().resource::<LevelProgress>().is_complete());

    app.world_mut().write_message(RosterEvent::Died(b));
    app.update();
    assert!(take_signals(&mut app).is_empty());
}

#[test]
fn player_damage_and_defeat() {
    let mut app = level_test_app();
    let player = app.world_mut().spawn((Player, Health::new(2))).id();
    app.update();
    take_signals(&mut app);

    hit(&mut app, player, 1);
    assert_eq!(
        take_signals(&mut app),
        vec![LevelSignal::PlayerDamaged { current: 1, max: 2 }]
    );

    hit(&mut app, player, 5);
    assert_eq!(
        take_signals(&mut app),
        vec![
            LevelSignal::PlayerDamaged { current: 0, max: 2 },
            LevelSignal::PlayerDefeated,
        ]
    );

    app.world_mut().write_message(Died { entity: player });
    app.update();
    assert!(take_signals(&mut app).is_empty());
}

#[test]
fn enemy_killed_on_first_frame_is_counted() {
    let mut app = level_test_app();
    let b = spawn_enemy(&mut app, 2.0);
    app.update();
    take_signals(&mut app);

    let a = spawn_enemy(&mut app, 0.0);
    hit(&mut app, a, 100);
    assert_eq!(
        take_signals(&mut app),
        vec![
            LevelSignal::EnemiesRemaining(2),
            LevelSignal::EnemiesRemaining(1),
        ]
    );
    assert!(!app.world().resource::<LevelProgress>().is_tracking(a));

    hit(&mut app, b, 100);
    assert!(app.world().resource::<LevelProgress>().is_complete());
}

#[test]
fn late_spawn_notice_for_dead_enemy_is_ignored() {
    let mut app = level_test_app();
    let b = spawn_enemy(&mut app, 2.0);
    app.update();
    let a = app.world_mut().spawn_empty().id();

    app.world_mut().write_message(RosterEvent::Died(a));
    app.world_mut().write_message(RosterEvent::Spawned(a));
    app.update();
    assert_eq!(app.world().resource::<LevelProgress>().remaining(), 1);

    hit(&mut app, b, 100);
    assert!(app.world().resource::<LevelProgress>().is_complete());
}
