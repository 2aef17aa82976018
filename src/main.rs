use bevy::prelude::*;
use bevy::window::WindowResolution;
use bevy_rapier2d::prelude::*;
use skirmish::config::{load_gameplay_config, GameplayConfig};
use skirmish::enemy::{spawn_melee_enemy, spawn_ranged_enemy, PatrolRoute};
use skirmish::level::LevelSignal;
use skirmish::physics::OBSTACLE_LAYER;
use skirmish::player::{spawn_player, spawn_stairs_zone};
use skirmish::simulation::SkirmishPlugin;

/// World units per screen pixel.
const CAMERA_SCALE: f32 = 0.02;

fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        Projection::Orthographic(OrthographicProjection {
            scale: CAMERA_SCALE,
            ..OrthographicProjection::default_2d()
        }),
    ));
}

/// Zero gravity: the scene is viewed from above.
fn setup_physics_config(mut config: Query<&mut RapierConfiguration>) {
    for mut cfg in config.iter_mut() {
        cfg.gravity = Vec2::ZERO;
    }
}

fn spawn_scene(mut commands: Commands, config: Res<GameplayConfig>) {
    spawn_player(&mut commands, &config, Vec2::new(-4.0, 0.0));

    let melee = spawn_melee_enemy(&mut commands, &config, Vec2::new(4.0, 2.0));
    commands.entity(melee).insert(PatrolRoute(vec![
        Vec2::new(4.0, 2.0),
        Vec2::new(4.0, -2.0),
        Vec2::new(7.0, -2.0),
    ]));
    spawn_ranged_enemy(&mut commands, &config, Vec2::new(6.0, 4.0));

    commands.spawn((
        Name::new("Wall"),
        Transform::from_translation(Vec3::new(1.0, 2.5, 0.0)),
        Collider::cuboid(0.25, 1.5),
        CollisionGroups::new(OBSTACLE_LAYER, Group::ALL),
    ));
    spawn_stairs_zone(&mut commands, Vec2::new(-4.0, -4.0), Vec2::new(1.5, 1.0));
}

fn log_level_signals(mut signals: MessageReader<LevelSignal>) {
    for signal in signals.read() {
        info!("{signal:?}");
    }
}

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Skirmish".into(),
                resolution: WindowResolution::new(1200, 680),
                ..Default::default()
            }),
            ..Default::default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.08, 0.09, 0.1)))
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::pixels_per_meter(1.0))
        .add_plugins(RapierDebugRenderPlugin::default())
        .add_plugins(SkirmishPlugin)
        .add_systems(
            Startup,
            (
                setup_camera,
                setup_physics_config,
                spawn_scene.after(load_gameplay_config),
            ),
        )
        .add_systems(Update, log_level_signals)
        .run();
}
