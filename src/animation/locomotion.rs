//! Facing and locomotion state derived from velocity.
//!
//! ## Per-frame algorithm
//!
//! 1. The actor is moving when `|velocity| > velocity_threshold`.
//! 2. The move vector is the normalised velocity while moving, otherwise the
//!    last move vector (initially +X), so facing is sticky at rest.
//! 3. The move vector is classified into a [`Direction8`] with the actor's
//!    [`DirectionVariant`] (`Stairs` while `stairs` is set).
//! 4. The move vector is projected on the facing's unit vector (forward) and
//!    on its clockwise perpendicular (right):
//!
//! | Condition                 | Mode           | Outputs                              |
//! |---------------------------|----------------|--------------------------------------|
//! | not moving                | `Idle`         | none                                 |
//! | forward > t               | `Run`          | `Move{Dir}`, `isRunning`             |
//! | forward < −t              | `RunBackward`  | `RunBackwards{Dir}`, `isRunningBackwards` |
//! | right < −t                | `StrafeLeft`   | `StrafeLeft{Dir}`, `isStrafingLeft`  |
//! | right > t                 | `StrafeRight`  | `StrafeRight{Dir}`, `isStrafingRight`|
//! | moving, none of the above | `Run`          | `Move{Dir}`, `isRunning`             |
//!
//! `Walk{Dir}` and `isWalking` belong to the output vocabulary and are reset
//! with the rest, but the classifier never picks [`LocomotionMode::Walk`].
//!
//! Outputs are written reset-then-set and only when facing or mode changed,
//! so exactly one direction flag and at most one locomotion output are ever
//! raised.

use super::params::{AnimatorParameters, LOCOMOTION_FLAGS, LOCOMOTION_PREFIXES};
use crate::config::GameplayConfig;
use crate::constants::{MOVEMENT_DOT_THRESHOLD, VELOCITY_THRESHOLD};
use crate::direction::{Direction8, DirectionVariant};
use bevy::prelude::*;
use bevy_rapier2d::prelude::Velocity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum LocomotionMode {
    #[default]
    Idle,
    Walk,
    Run,
    RunBackward,
    StrafeLeft,
    StrafeRight,
}

impl LocomotionMode {
    /// `(per-direction prefix, exclusive flag)` raised for this mode.
    pub fn outputs(self) -> Option<(&'static str, &'static str)> {
        match self {
            LocomotionMode::Idle => None,
            LocomotionMode::Walk => Some(("Walk", "isWalking")),
            LocomotionMode::Run => Some(("Move", "isRunning")),
            LocomotionMode::RunBackward => Some(("RunBackwards", "isRunningBackwards")),
            LocomotionMode::StrafeLeft => Some(("StrafeLeft", "isStrafingLeft")),
            LocomotionMode::StrafeRight => Some(("StrafeRight", "isStrafingRight")),
        }
    }
}

/// Thresholds for one actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionSettings {
    pub velocity_threshold: f32,
    pub movement_dot_threshold: f32,
}

impl Default for LocomotionSettings {
    fn default() -> Self {
        Self {
            velocity_threshold: VELOCITY_THRESHOLD,
            movement_dot_threshold: MOVEMENT_DOT_THRESHOLD,
        }
    }
}

impl From<&GameplayConfig> for LocomotionSettings {
    fn from(config: &GameplayConfig) -> Self {
        Self {
            velocity_threshold: config.velocity_threshold,
            movement_dot_threshold: config.movement_dot_threshold,
        }
    }
}

/// Which outputs a state change invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimationChange {
    pub facing_changed: bool,
    pub locomotion_changed: bool,
}

impl AnimationChange {
    pub fn any(self) -> bool {
        self.facing_changed || self.locomotion_changed
    }
}

/// Classifies the movement category for a unit `move_dir` at `speed`.
pub fn classify_locomotion(
    move_dir: Vec2,
    speed: f32,
    facing: Direction8,
    settings: &LocomotionSettings,
) -> LocomotionMode {
    if speed <= settings.velocity_threshold {
        return LocomotionMode::Idle;
    }
    let forward = facing.unit_vector();
    let right = Vec2::new(forward.y, -forward.x);
    let forward_dot = move_dir.dot(forward);
    let right_dot = move_dir.dot(right);
    let t = settings.movement_dot_threshold;

    if forward_dot > t {
        LocomotionMode::Run
    } else if forward_dot < -t {
        LocomotionMode::RunBackward
    } else if right_dot < -t {
        LocomotionMode::StrafeLeft
    } else if right_dot > t {
        LocomotionMode::StrafeRight
    } else {
        LocomotionMode::Run
    }
}

/// Facing + locomotion state machine of one animated actor.
#[derive(Component, Debug, Clone)]
pub struct ActorAnimationState {
    /// Cleared by the death sequence; a disabled state is never stepped.
    pub enabled: bool,
    /// Selects [`DirectionVariant::Stairs`] for classification.
    pub stairs: bool,
    pub settings: LocomotionSettings,
    facing: Direction8,
    locomotion: LocomotionMode,
    last_move: Vec2,
    synced: bool,
}

impl Default for ActorAnimationState {
    fn default() -> Self {
        Self::new(LocomotionSettings::default())
    }
}

impl ActorAnimationState {
    pub fn new(settings: LocomotionSettings) -> Self {
        Self {
            enabled: true,
            stairs: false,
            settings,
            facing: Direction8::East,
            locomotion: LocomotionMode::Idle,
            last_move: Vec2::X,
            synced: false,
        }
    }

    pub fn facing(&self) -> Direction8 {
        self.facing
    }

    pub fn locomotion(&self) -> LocomotionMode {
        self.locomotion
    }

    pub fn last_move(&self) -> Vec2 {
        self.last_move
    }

    pub fn variant(&self) -> DirectionVariant {
        DirectionVariant::for_stairs(self.stairs)
    }

    /// Advances the state machine by one frame.
    pub fn step(&mut self, velocity: Vec2) -> AnimationChange {
        let speed = velocity.length();
        let moving = speed > self.settings.velocity_threshold;
        if moving {
            self.last_move = velocity / speed;
        }
        let move_dir = self.last_move;

        let new_facing =
            Direction8::from_vector(move_dir, self.variant()).unwrap_or(self.facing);
        let new_mode = if moving {
            classify_locomotion(move_dir, speed, new_facing, &self.settings)
        } else {
            LocomotionMode::Idle
        };

        let mut change = AnimationChange {
            facing_changed: new_facing != self.facing,
            locomotion_changed: new_mode != self.locomotion,
        };
        self.facing = new_facing;
        self.locomotion = new_mode;

        if !self.synced {
            self.synced = true;
            change = AnimationChange {
                facing_changed: true,
                locomotion_changed: true,
            };
        }
        change
    }

    /// Forces the facing (used when aiming).  The direction also becomes the
    /// remembered move vector so it survives the next idle frame.
    pub fn face_toward(&mut self, direction: Vec2) -> AnimationChange {
        let Some(new_facing) = Direction8::from_vector(direction, self.variant()) else {
            return AnimationChange::default();
        };
        self.last_move = direction.normalize();
        let changed = new_facing != self.facing || !self.synced;
        self.facing = new_facing;
        AnimationChange {
            facing_changed: changed,
            locomotion_changed: changed,
        }
    }

    /// Writes the outputs invalidated by `change`.
    pub fn apply_outputs(&self, change: AnimationChange, params: &mut AnimatorParameters) {
        if change.facing_changed {
            for dir in Direction8::ALL {
                params.try_set_bool(&dir.flag_name(), false);
            }
            params.try_set_bool(&self.facing.flag_name(), true);
        }
        if change.any() {
            for prefix in LOCOMOTION_PREFIXES {
                for dir in Direction8::ALL {
                    params.try_set_bool(&format!("{prefix}{}", dir.name()), false);
                }
            }
            for flag in LOCOMOTION_FLAGS {
                params.try_set_bool(flag, false);
            }
            if let Some((prefix, flag)) = self.locomotion.outputs() {
                params.try_set_bool(&format!("{prefix}{}", self.facing.name()), true);
                params.try_set_bool(flag, true);
            }
        }
    }
}

/// Frame system: steps every enabled animation state from its velocity.
pub fn update_actor_animation(
    mut q: Query<(
        &Velocity,
        &mut ActorAnimationState,
        Option<&mut AnimatorParameters>,
    )>,
) {
    for (velocity, mut state, params) in q.iter_mut() {
        if !state.enabled {
            continue;
        }
        let change = state.step(velocity.linvel);
        if let Some(mut params) = params {
            if change.any() {
                state.apply_outputs(change, &mut params);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> AnimatorParameters {
        AnimatorParameters::character(None, &[])
    }

    fn stepped(state: &mut ActorAnimationState, params: &mut AnimatorParameters, v: Vec2) {
        let change = state.step(v);
        state.apply_outputs(change, params);
    }

    #[test]
    fn starts_idle_facing_east() {
        let mut state = ActorAnimationState::default();
        let mut params = rig();
        stepped(&mut state, &mut params, Vec2::ZERO);
        assert_eq!(state.facing(), Direction8::East);
        assert_eq!(state.locomotion(), LocomotionMode::Idle);
        assert_eq!(params.active_bools(), vec!["isEast"]);
    }

    #[test]
    fn moving_north_runs_north() {
        let mut state = ActorAnimationState::default();
        let mut params = rig();
        stepped(&mut state, &mut params, Vec2::new(0.0, 2.0));
        assert_eq!(state.facing(), Direction8::North);
        assert_eq!(state.locomotion(), LocomotionMode::Run);
        assert_eq!(params.active_bools(), vec!["MoveNorth", "isNorth", "isRunning"]);
    }

    #[test]
    fn facing_is_sticky_below_threshold() {
        let mut state = ActorAnimationState::default();
        let mut params = rig();
        stepped(&mut state, &mut params, Vec2::new(-1.0, 0.0));
        stepped(&mut state, &mut params, Vec2::new(0.0, 0.04));
        assert_eq!(state.facing(), Direction8::West);
        assert_eq!(state.locomotion(), LocomotionMode::Idle);
        assert_eq!(params.active_bools(), vec!["isWest"]);
    }

    #[test]
    fn direction_change_leaves_one_flag() {
        let mut state = ActorAnimationState::default();
        let mut params = rig();
        for v in [Vec2::X, Vec2::Y, Vec2::NEG_X, Vec2::new(1.0, -1.0)] {
            stepped(&mut state, &mut params, v);
            let flags: Vec<_> = Direction8::ALL
                .iter()
                .filter(|d| params.bool_value(&d.flag_name()))
                .collect();
            assert_eq!(flags.len(), 1);
        }
        assert_eq!(state.facing(), Direction8::SouthEast);
    }

    #[test]
    fn classify_against_fixed_facing() {
        let s = LocomotionSettings::default();
        let f = Direction8::North;
        assert_eq!(classify_locomotion(Vec2::Y, 2.0, f, &s), LocomotionMode::Run);
        assert_eq!(classify_locomotion(Vec2::NEG_Y, 2.0, f, &s), LocomotionMode::RunBackward);
        assert_eq!(classify_locomotion(Vec2::NEG_X, 2.0, f, &s), LocomotionMode::StrafeLeft);
        assert_eq!(classify_locomotion(Vec2::X, 2.0, f, &s), LocomotionMode::StrafeRight);
        assert_eq!(classify_locomotion(Vec2::X, 0.01, f, &s), LocomotionMode::Idle);
    }

    #[test]
    fn slow_forward_movement_still_runs() {
        let s = LocomotionSettings::default();
        assert_eq!(classify_locomotion(Vec2::X, 0.1, Direction8::East, &s), LocomotionMode::Run);
        assert_eq!(classify_locomotion(Vec2::X, 5.0, Direction8::East, &s), LocomotionMode::Run);
    }

    #[test]
    fn strafe_after_aiming() {
        let mut state = ActorAnimationState::default();
        let mut params = rig();
        stepped(&mut state, &mut params, Vec2::ZERO);
        let change = state.face_toward(Vec2::Y);
        state.apply_outputs(change, &mut params);
        assert_eq!(state.facing(), Direction8::North);

        // A step classifies from velocity again; this one keeps north facing
        // only because it is exactly along the aim.
        stepped(&mut state, &mut params, Vec2::new(0.0, 1.0));
        assert_eq!(params.active_bools(), vec!["MoveNorth", "isNorth", "isRunning"]);
    }

    #[test]
    fn aim_survives_idle_frame() {
        let mut state = ActorAnimationState::default();
        state.step(Vec2::X);
        state.face_toward(Vec2::new(-1.0, -1.0));
        state.step(Vec2::ZERO);
        assert_eq!(state.facing(), Direction8::SouthWest);
    }

    #[test]
    fn stairs_flag_switches_partition() {
        let mut state = ActorAnimationState::default();
        let v = Vec2::from_angle(20f32.to_radians());
        state.step(v);
        assert_eq!(state.facing(), Direction8::NorthEast);
        state.stairs = true;
        state.step(v);
        assert_eq!(state.facing(), Direction8::East);
    }

    #[test]
    fn unchanged_frames_report_no_change() {
        let mut state = ActorAnimationState::default();
        state.step(Vec2::X);
        assert!(!state.step(Vec2::X * 1.5).any());
    }
}
