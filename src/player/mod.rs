//! Player module: the archer the enemies hunt.
//!
//! ## Sub-module layout
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`control`] | Keyboard intent, eight-heading snapping, fixed-step movement, stairs zones |
//! | [`abilities`] | Shoot, Quickshot, CircleShot and the area effect, released through deferred timers |
//!
//! All public items are re-exported at this level so the rest of the crate
//! can use flat `crate::player::*` imports.

pub mod abilities;
pub mod control;

pub use abilities::{
    deploy_area_effects, expire_area_effects, fire_player_shots, trigger_abilities, Ability,
    AbilityTriggered, AreaEffect, PlayerVolley,
};
pub use control::{
    keyboard_to_intent_system, player_movement_system, stairs_zone_system,
};

use crate::animation::{ActorAnimationState, AnimatorParameters, LocomotionSettings};
use crate::config::GameplayConfig;
use crate::death::{DeathProcess, DeathSequencer};
use crate::direction::{snap_heading, vector_degrees, DirectionVariant};
use crate::health::Health;
use crate::physics::{CollisionSuppression, ENEMY_LAYER, OBSTACLE_LAYER, PLAYER_LAYER, TRIGGER_LAYER};
use crate::projectile::ProjectileTemplate;
use crate::timers::ScheduledTimers;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

// ── Components ─────────────────────────────────────────────────────────────────

/// Marker component for the player entity.
#[derive(Component, Debug, Default, Clone, Copy)]
#[require(ScheduledTimers, DeathProcess, CollisionSuppression)]
pub struct Player;

/// Movement and shooting state driven by input.
///
/// Input only ever sets [`PlayerController::movement`]; the fixed-step
/// movement system turns it into a velocity.  `heading` is the last snapped
/// heading in degrees and is also the direction every shot leaves in.
#[derive(Component, Debug, Clone)]
pub struct PlayerController {
    /// Cleared on death; a disabled controller ignores input and stands still.
    pub enabled: bool,
    pub speed: f32,
    /// Replaces `speed` while crouching.
    pub crouch_speed: f32,
    pub projectile_speed: f32,
    pub shoot_delay: f32,
    pub on_stairs: bool,
    pub template: ProjectileTemplate,
    movement: Vec2,
    heading: f32,
    crouching: bool,
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::from(&GameplayConfig::default())
    }
}

impl From<&GameplayConfig> for PlayerController {
    fn from(config: &GameplayConfig) -> Self {
        Self {
            enabled: true,
            speed: config.player_speed,
            crouch_speed: config.player_crouch_speed,
            projectile_speed: config.player_projectile_speed,
            shoot_delay: config.player_shoot_delay,
            on_stairs: false,
            template: ProjectileTemplate {
                mask: ENEMY_LAYER | OBSTACLE_LAYER,
                ..ProjectileTemplate::from(config)
            },
            movement: Vec2::ZERO,
            heading: 0.0,
            crouching: false,
        }
    }
}

impl PlayerController {
    pub fn variant(&self) -> DirectionVariant {
        DirectionVariant::for_stairs(self.on_stairs)
    }

    /// Unit movement direction, or zero when idle.
    pub fn movement(&self) -> Vec2 {
        self.movement
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn is_crouching(&self) -> bool {
        self.crouching
    }

    /// Flips between standing and crouching.  Returns the new state.
    pub fn toggle_crouch(&mut self) -> bool {
        self.crouching = !self.crouching;
        self.crouching
    }

    pub fn current_speed(&self) -> f32 {
        if self.crouching {
            self.crouch_speed
        } else {
            self.speed
        }
    }

    pub fn aim(&self) -> Vec2 {
        Vec2::from_angle(self.heading.to_radians())
    }

    /// Snaps raw input to one of the eight headings of the current variant.
    /// Zero (or non-finite) input stops movement and keeps the heading.
    pub fn set_movement_input(&mut self, input: Vec2) {
        if !self.enabled {
            self.movement = Vec2::ZERO;
            return;
        }
        match vector_degrees(input) {
            Some(angle) => {
                self.heading = snap_heading(angle, self.variant());
                self.movement = self.aim();
            }
            None => self.movement = Vec2::ZERO,
        }
    }

    pub fn velocity(&self) -> Vec2 {
        if self.enabled {
            self.movement * self.current_speed()
        } else {
            Vec2::ZERO
        }
    }
}

/// Trigger volume that switches the player to the stairs heading set while
/// overlapped.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct StairsZone;

// ── Spawning ───────────────────────────────────────────────────────────────────

pub fn spawn_player(commands: &mut Commands, config: &GameplayConfig, position: Vec2) -> Entity {
    commands
        .spawn((
            Name::new("Player"),
            Player,
            PlayerController::from(config),
            PlayerVolley::default(),
            Health::new(config.default_max_health),
            ActorAnimationState::new(LocomotionSettings::from(config)),
            AnimatorParameters::character(None, &[]),
            DeathSequencer::default().with_delay(config.death_despawn_delay),
            Transform::from_translation(position.extend(0.0)),
            (
                RigidBody::Dynamic,
                Collider::ball(config.player_collider_radius),
                CollisionGroups::new(PLAYER_LAYER, Group::ALL),
                LockedAxes::ROTATION_LOCKED,
                GravityScale(0.0),
                Velocity::zero(),
            ),
        ))
        .id()
}

/// Spawns a rectangular stairs trigger centred on `position`.
pub fn spawn_stairs_zone(commands: &mut Commands, position: Vec2, half_extents: Vec2) -> Entity {
    commands
        .spawn((
            Name::new("Stairs"),
            StairsZone,
            Transform::from_translation(position.extend(0.0)),
            Collider::cuboid(half_extents.x, half_extents.y),
            Sensor,
            ActiveEvents::COLLISION_EVENTS,
            CollisionGroups::new(TRIGGER_LAYER, PLAYER_LAYER),
        ))
        .id()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_heading(c: &PlayerController, degrees: f32) {
        assert!(
            (c.heading() - degrees).abs() < 1e-4,
            "heading {} != {degrees}",
            c.heading()
        );
    }

    #[test]
    fn diagonal_input_snaps_to_narrow_heading() {
        let mut c = PlayerController::default();
        c.set_movement_input(Vec2::new(1.0, 1.0));
        assert_heading(&c, 35.0);
        assert!((c.movement().length() - 1.0).abs() < 1e-5);
        assert!((c.velocity().length() - c.speed).abs() < 1e-5);
    }

    #[test]
    fn stairs_use_their_own_headings() {
        let mut c = PlayerController {
            on_stairs: true,
            ..Default::default()
        };
        c.set_movement_input(Vec2::new(1.0, 1.0));
        assert_heading(&c, 60.0);
        c.set_movement_input(Vec2::new(-1.0, -1.0));
        assert_heading(&c, 240.0);
        // 28° is still east on the stairs, though it is past the even split.
        c.set_movement_input(Vec2::from_angle(28f32.to_radians()));
        assert_heading(&c, 0.0);
        c.set_movement_input(Vec2::from_angle(70f32.to_radians()));
        assert_heading(&c, 60.0);
    }

    #[test]
    fn idle_input_keeps_heading() {
        let mut c = PlayerController::default();
        c.set_movement_input(Vec2::NEG_Y);
        assert_heading(&c, 270.0);
        c.set_movement_input(Vec2::ZERO);
        assert_eq!(c.movement(), Vec2::ZERO);
        assert_heading(&c, 270.0);
    }

    #[test]
    fn disabled_controller_stands_still() {
        let mut c = PlayerController::default();
        c.set_movement_input(Vec2::X);
        c.enabled = false;
        assert_eq!(c.velocity(), Vec2::ZERO);
        c.set_movement_input(Vec2::Y);
        assert_eq!(c.movement(), Vec2::ZERO);
    }

    #[test]
    fn crouching_halves_speed_until_toggled_back() {
        let mut c = PlayerController::default();
        c.set_movement_input(Vec2::X);
        assert!(c.toggle_crouch());
        assert_eq!(c.velocity(), Vec2::new(1.0, 0.0));
        assert!(!c.toggle_crouch());
        assert_eq!(c.velocity(), Vec2::new(2.0, 0.0));
    }

    #[test]
    fn player_arrows_hit_enemies_and_walls() {
        let c = PlayerController::default();
        assert_eq!(c.template.mask, ENEMY_LAYER | OBSTACLE_LAYER);
    }
}
