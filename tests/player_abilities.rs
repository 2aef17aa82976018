//! Headless tests for player abilities and stairs zones.
//!
//! Covered scenarios:
//! 1. Shoot releases one owned projectile after the shoot delay.
//! 2. Quickshot and CircleShot release their full volleys over time.
//! 3. Cancelling the player's timers (death) drops queued shots.
//! 4. Entering and leaving a stairs zone switches the heading set.
//! 5. The area effect appears after its delay and is removed after its
//!    lifetime.
//! 6. The C key toggles crouching and the 3 key asks for the area effect.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy_rapier2d::prelude::*;
use bevy_rapier2d::rapier::geometry::CollisionEventFlags;
use skirmish::animation::ActorAnimationState;
use skirmish::config::GameplayConfig;
use skirmish::player::{
    deploy_area_effects, expire_area_effects, fire_player_shots, keyboard_to_intent_system,
    spawn_player, spawn_stairs_zone, stairs_zone_system, trigger_abilities, Ability,
    AbilityTriggered, AreaEffect, PlayerController,
};
use skirmish::projectile::{launch_projectiles, Projectile};
use skirmish::timers::{dispatch_due_timers, ScheduledTimers, TimerElapsed};
use std::time::Duration;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn player_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(50)));
    app.insert_resource(GameplayConfig::default());
    app.add_message::<AbilityTriggered>()
        .add_message::<TimerElapsed>()
        .add_message::<CollisionEvent>();
    app.add_systems(
        Update,
        (
            trigger_abilities,
            dispatch_due_timers,
            (fire_player_shots, deploy_area_effects, expire_area_effects),
            launch_projectiles,
        )
            .chain(),
    );
    app.add_systems(PostUpdate, stairs_zone_system);
    app
}

fn spawn(app: &mut App) -> Entity {
    let config = GameplayConfig::default();
    let world = app.world_mut();
    let player = {
        let mut commands = world.commands();
        spawn_player(&mut commands, &config, Vec2::ZERO)
    };
    world.flush();
    player
}

fn trigger(app: &mut App, player: Entity, ability: Ability) {
    app.world_mut()
        .write_message(AbilityTriggered { player, ability });
}

fn projectiles(app: &mut App) -> Vec<Projectile> {
    let world = app.world_mut();
    world
        .query::<&Projectile>()
        .iter(world)
        .cloned()
        .collect()
}

fn step(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn shoot_fires_after_delay() {
    let mut app = player_test_app();
    app.update();
    let player = spawn(&mut app);
    app.world_mut()
        .get_mut::<PlayerController>(player)
        .unwrap()
        .set_movement_input(Vec2::Y);

    trigger(&mut app, player, Ability::Shoot);
    step(&mut app, 5);
    assert!(projectiles(&mut app).is_empty(), "still winding up");

    step(&mut app, 8);
    let fired = projectiles(&mut app);
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].owner(), Some(player));
    assert!((fired[0].direction() - Vec2::Y).length() < 1e-5);
}

#[test]
fn quickshot_fires_full_volley() {
    let mut app = player_test_app();
    app.update();
    let player = spawn(&mut app);

    trigger(&mut app, player, Ability::Quickshot);
    step(&mut app, 30);

    let fired = projectiles(&mut app);
    assert_eq!(fired.len(), 5);
    assert!(fired.iter().all(|p| (p.direction() - Vec2::X).length() < 1e-5));
}

#[test]
fn circle_shot_covers_every_direction() {
    let mut app = player_test_app();
    app.update();
    let player = spawn(&mut app);

    trigger(&mut app, player, Ability::CircleShot);
    step(&mut app, 30);

    let fired = projectiles(&mut app);
    assert_eq!(fired.len(), 8);
    let sum: Vec2 = fired.iter().map(|p| p.direction()).sum();
    assert!(sum.length() < 1e-4, "eight shots 45° apart cancel out");
}

#[test]
fn cancelled_timers_drop_queued_shots() {
    let mut app = player_test_app();
    app.update();
    let player = spawn(&mut app);

    trigger(&mut app, player, Ability::Quickshot);
    app.update();
    app.world_mut()
        .get_mut::<ScheduledTimers>(player)
        .unwrap()
        .cancel_all();
    step(&mut app, 30);

    assert!(projectiles(&mut app).is_empty());
}

#[test]
fn stairs_zone_switches_heading_set() {
    let mut app = player_test_app();
    app.update();
    let player = spawn(&mut app);
    let zone = {
        let world = app.world_mut();
        let zone = {
            let mut commands = world.commands();
            spawn_stairs_zone(&mut commands, Vec2::ZERO, Vec2::ONE)
        };
        world.flush();
        zone
    };

    app.world_mut().write_message(CollisionEvent::Started(
        zone,
        player,
        CollisionEventFlags::SENSOR,
    ));
    app.update();
    assert!(app.world().get::<PlayerController>(player).unwrap().on_stairs);
    assert!(app.world().get::<ActorAnimationState>(player).unwrap().stairs);

    app.world_mut()
        .get_mut::<PlayerController>(player)
        .unwrap()
        .set_movement_input(Vec2::new(1.0, 1.0));
    let heading = app.world().get::<PlayerController>(player).unwrap().heading();
    assert!((heading - 60.0).abs() < 1e-4);

    app.world_mut().write_message(CollisionEvent::Stopped(
        player,
        zone,
        CollisionEventFlags::SENSOR,
    ));
    app.update();
    assert!(!app.world().get::<PlayerController>(player).unwrap().on_stairs);
}

#[test]
fn area_effect_deploys_then_expires() {
    let mut app = player_test_app();
    app.update();
    let player = spawn(&mut app);
    app.world_mut()
        .get_mut::<Transform>(player)
        .unwrap()
        .translation = Vec3::new(2.0, 1.0, 0.0);

    trigger(&mut app, player, Ability::AreaEffect);
    step(&mut app, 3);
    let effects = |app: &mut App| {
        let world = app.world_mut();
        world
            .query::<(&AreaEffect, &Transform)>()
            .iter(world)
            .map(|(effect, transform)| (*effect, transform.translation.truncate()))
            .collect::<Vec<_>>()
    };
    assert!(effects(&mut app).is_empty(), "still winding up");

    step(&mut app, 5);
    assert_eq!(
        effects(&mut app),
        vec![(AreaEffect { owner: player }, Vec2::new(2.0, 1.0))]
    );
    assert!(projectiles(&mut app).is_empty());

    step(&mut app, 12);
    assert!(effects(&mut app).is_empty());
}

#[derive(Resource, Default)]
struct SeenAbilities(Vec<AbilityTriggered>);

fn collect_abilities(mut reader: MessageReader<AbilityTriggered>, mut seen: ResMut<SeenAbilities>) {
    seen.0.extend(reader.read().copied());
}

#[test]
fn keys_toggle_crouch_and_request_area_effect() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.init_resource::<ButtonInput<KeyCode>>();
    app.init_resource::<SeenAbilities>();
    app.add_message::<AbilityTriggered>();
    app.add_systems(Update, (keyboard_to_intent_system, collect_abilities).chain());
    let player = spawn(&mut app);

    {
        let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
        keys.press(KeyCode::KeyC);
        keys.press(KeyCode::Digit3);
        keys.press(KeyCode::KeyD);
    }
    app.update();

    let controller = app.world().get::<PlayerController>(player).unwrap();
    assert!(controller.is_crouching());
    assert_eq!(controller.velocity(), Vec2::new(controller.crouch_speed, 0.0));
    assert_eq!(
        app.world().resource::<SeenAbilities>().0,
        vec![AbilityTriggered {
            player,
            ability: Ability::AreaEffect
        }]
    );
}
