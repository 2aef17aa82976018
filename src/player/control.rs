//! Player input and movement systems.
//!
//! ## Pipeline
//!
//! 1. [`keyboard_to_intent_system`] (`Update`): WASD into a snapped movement
//!    direction, C into a crouch toggle, ability keys into
//!    [`AbilityTriggered`] messages.
//! 2. [`player_movement_system`] (`FixedUpdate`): movement direction into
//!    `Velocity`.
//! 3. [`stairs_zone_system`] (`PostUpdate`): sensor enter/exit on a
//!    [`StairsZone`] switches the heading set of both the controller and the
//!    animation state.
//!
//! Tests skip step 1 and call [`PlayerController::set_movement_input`]
//! directly.

use super::abilities::{Ability, AbilityTriggered};
use super::{Player, PlayerController, StairsZone};
use crate::animation::ActorAnimationState;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

/// Translate keyboard (and right mouse button) input.
///
/// - **W/A/S/D** → movement input, summed and snapped
/// - **C** → crouch toggle
/// - **Space** / **right mouse** → [`Ability::Shoot`]
/// - **3** → [`Ability::AreaEffect`]
/// - **5** → [`Ability::Quickshot`]
/// - **6** → [`Ability::CircleShot`]
pub fn keyboard_to_intent_system(
    keys: Res<ButtonInput<KeyCode>>,
    mouse: Option<Res<ButtonInput<MouseButton>>>,
    mut players: Query<(Entity, &mut PlayerController), With<Player>>,
    mut abilities: MessageWriter<AbilityTriggered>,
) {
    let mut input = Vec2::ZERO;
    if keys.pressed(KeyCode::KeyW) {
        input.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) {
        input.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) {
        input.x += 1.0;
    }
    if keys.pressed(KeyCode::KeyA) {
        input.x -= 1.0;
    }

    let shoot = keys.just_pressed(KeyCode::Space)
        || mouse.is_some_and(|m| m.just_pressed(MouseButton::Right));
    let requested = [
        (shoot, Ability::Shoot),
        (keys.just_pressed(KeyCode::Digit3), Ability::AreaEffect),
        (keys.just_pressed(KeyCode::Digit5), Ability::Quickshot),
        (keys.just_pressed(KeyCode::Digit6), Ability::CircleShot),
    ];

    let crouch = keys.just_pressed(KeyCode::KeyC);

    for (player, mut controller) in players.iter_mut() {
        controller.set_movement_input(input);
        if !controller.enabled {
            continue;
        }
        if crouch {
            let crouching = controller.toggle_crouch();
            debug!("{player:?} crouching: {crouching}");
        }
        abilities.write_batch(
            requested
                .iter()
                .filter(|(pressed, _)| *pressed)
                .map(|&(_, ability)| AbilityTriggered { player, ability }),
        );
    }
}

/// Fixed-step: apply the controller's velocity.
pub fn player_movement_system(mut q: Query<(&PlayerController, &mut Velocity), With<Player>>) {
    for (controller, mut velocity) in q.iter_mut() {
        if !controller.enabled {
            continue;
        }
        velocity.linvel = controller.velocity();
    }
}

/// Toggle the stairs heading set on sensor enter/exit.
pub fn stairs_zone_system(
    mut collisions: MessageReader<CollisionEvent>,
    zones: Query<(), With<StairsZone>>,
    mut players: Query<(&mut PlayerController, Option<&mut ActorAnimationState>), With<Player>>,
) {
    for event in collisions.read() {
        let (a, b, on_stairs) = match *event {
            CollisionEvent::Started(a, b, _) => (a, b, true),
            CollisionEvent::Stopped(a, b, _) => (a, b, false),
        };
        for (zone, other) in [(a, b), (b, a)] {
            if !zones.contains(zone) {
                continue;
            }
            let Ok((mut controller, animation)) = players.get_mut(other) else {
                continue;
            };
            if controller.on_stairs != on_stairs {
                debug!("{other:?} on stairs: {on_stairs}");
            }
            controller.on_stairs = on_stairs;
            if let Some(mut animation) = animation {
                animation.stairs = on_stairs;
            }
        }
    }
}
