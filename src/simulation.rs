//! Gameplay plugin: messages, resources and system ordering.
//!
//! ## Schedule
//!
//! | Schedule      | Systems (in order)                                                      |
//! |---------------|-------------------------------------------------------------------------|
//! | `Startup`     | config load                                                             |
//! | `FixedUpdate` | enemy decisions → target masks → attack resolution; player movement    |
//! | `Update`      | input → abilities → roster announce → damage → deaths → timers → timer consumers → launch → animation → level |
//! | `PostUpdate`  | projectile collisions, stairs zones                                     |
//!
//! New enemies are announced before any damage is applied, so an enemy
//! killed on its first frame reaches the roster as `Spawned` then `Died`.
//!
//! Physics itself comes from `RapierPhysicsPlugin`, which the binary adds;
//! this plugin only registers `CollisionEvent` so it can run headless.

use crate::animation::{reset_attack_poses, update_actor_animation};
use crate::config::{load_gameplay_config, GameplayConfig};
use crate::death::{begin_death_sequences, despawn_dead, DeathRequested};
use crate::enemy::{
    apply_target_masks, enemy_decision_system, handle_enemy_deaths, resolve_enemy_attacks,
    AttackRequested, TargetAcquired,
};
use crate::health::{apply_damage_requests, DamageRequest, Damaged, Died};
use crate::level::{
    announce_spawned_enemies, track_player_outcome, track_roster, LevelProgress, LevelSignal,
    RosterEvent,
};
use crate::player::{
    deploy_area_effects, expire_area_effects, fire_player_shots, keyboard_to_intent_system,
    player_movement_system, stairs_zone_system, trigger_abilities, AbilityTriggered,
};
use crate::projectile::{expire_projectiles, launch_projectiles, projectile_collisions};
use crate::timers::{dispatch_due_timers, TimerElapsed};
use bevy::prelude::*;
use bevy_rapier2d::prelude::CollisionEvent;

pub struct SkirmishPlugin;

impl Plugin for SkirmishPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameplayConfig>()
            .init_resource::<LevelProgress>()
            .add_message::<CollisionEvent>()
            .add_message::<DamageRequest>()
            .add_message::<Damaged>()
            .add_message::<Died>()
            .add_message::<DeathRequested>()
            .add_message::<TimerElapsed>()
            .add_message::<TargetAcquired>()
            .add_message::<AttackRequested>()
            .add_message::<AbilityTriggered>()
            .add_message::<RosterEvent>()
            .add_message::<LevelSignal>()
            .add_systems(Startup, load_gameplay_config)
            .add_systems(
                FixedUpdate,
                (
                    (enemy_decision_system, apply_target_masks, resolve_enemy_attacks).chain(),
                    player_movement_system,
                ),
            )
            .add_systems(
                Update,
                (
                    keyboard_to_intent_system.run_if(resource_exists::<ButtonInput<KeyCode>>),
                    trigger_abilities,
                    announce_spawned_enemies,
                    apply_damage_requests,
                    handle_enemy_deaths,
                    begin_death_sequences,
                    dispatch_due_timers,
                    (
                        reset_attack_poses,
                        despawn_dead,
                        expire_projectiles,
                        fire_player_shots,
                        deploy_area_effects,
                        expire_area_effects,
                    ),
                    launch_projectiles,
                    update_actor_animation,
                    track_roster,
                    track_player_outcome,
                )
                    .chain(),
            )
            .add_systems(PostUpdate, (projectile_collisions, stairs_zone_system));
    }
}
