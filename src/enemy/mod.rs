//! Non-player combatants.
//!
//! | Module   | Responsibility                                            |
//! |----------|-----------------------------------------------------------|
//! | `brain`  | Target acquisition, patrol/chase/attack decision per step |
//! | `attack` | Strategy trait, attack resolution system                  |
//! | `melee`  | Overlap-circle swing                                      |
//! | `ranged` | Line-of-sight check and arrow launch                      |
//! | `death`  | Stop, announce to the roster, sequence or fall back       |
//!
//! ## Spawning
//!
//! [`spawn_melee_enemy`] and [`spawn_ranged_enemy`] build a complete enemy
//! from [`GameplayConfig`]; callers add a [`PatrolRoute`] when the enemy
//! should walk one.

pub mod attack;
pub mod brain;
pub mod death;
pub mod melee;
pub mod ranged;

pub use attack::{
    apply_target_masks, resolve_enemy_attacks, resolve_enemy_attacks_in, AttackContext,
    AttackEffects, AttackOutcome, AttackRequested, AttackResolver, AttackStrategy, EnemyAttack,
};
pub use brain::{
    enemy_decision_system, BehaviorSettings, BehaviorState, Decision, Enemy, EnemyBrain,
    PatrolRoute, TargetAcquired,
};
pub use death::handle_enemy_deaths;
pub use melee::MeleeStrike;
pub use ranged::RangedVolley;

use crate::animation::attack::DEFAULT_ATTACK_PREFIXES;
use crate::animation::{ActorAnimationState, AnimatorParameters, AttackAnimation, LocomotionSettings};
use crate::config::GameplayConfig;
use crate::death::DeathSequencer;
use crate::health::Health;
use crate::physics::ENEMY_LAYER;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

/// Body, brain, health and locomotion shared by every enemy.
pub fn enemy_body(config: &GameplayConfig, position: Vec2) -> impl Bundle {
    (
        Enemy,
        EnemyBrain::new(BehaviorSettings::from(config)),
        Health::new(config.default_max_health),
        ActorAnimationState::new(LocomotionSettings::from(config)),
        Transform::from_translation(position.extend(0.0)),
        (
            RigidBody::Dynamic,
            Collider::ball(config.enemy_collider_radius),
            CollisionGroups::new(ENEMY_LAYER, Group::ALL),
            LockedAxes::ROTATION_LOCKED,
            GravityScale(0.0),
            Velocity::zero(),
        ),
    )
}

/// Sword enemy with a full death sequence.
pub fn spawn_melee_enemy(commands: &mut Commands, config: &GameplayConfig, position: Vec2) -> Entity {
    let attack = AttackAnimation::melee().with_reset_delay(config.melee_attack_reset_delay);
    let params = AnimatorParameters::character(attack.trigger.as_deref(), &DEFAULT_ATTACK_PREFIXES);
    commands
        .spawn((
            Name::new("Melee Enemy"),
            enemy_body(config, position),
            EnemyAttack::Melee(MeleeStrike::from(config)),
            attack,
            params,
            DeathSequencer::default().with_delay(config.death_despawn_delay),
        ))
        .id()
}

/// Archer enemy.  Carries no death sequencer and dies through the generic
/// fallback path.
pub fn spawn_ranged_enemy(commands: &mut Commands, config: &GameplayConfig, position: Vec2) -> Entity {
    let attack = AttackAnimation::ranged().with_reset_delay(config.ranged_attack_reset_delay);
    let params = AnimatorParameters::character(attack.trigger.as_deref(), &DEFAULT_ATTACK_PREFIXES);
    commands
        .spawn((
            Name::new("Ranged Enemy"),
            enemy_body(config, position),
            EnemyAttack::Ranged(RangedVolley::from(config)),
            attack,
            params,
        ))
        .id()
}
