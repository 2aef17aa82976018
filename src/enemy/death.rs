//! Enemy side of dying: stop, announce, then sequence or fall back.

use super::brain::Enemy;
use crate::constants::FALLBACK_DEATH_DELAY;
use crate::death::DeathEffects;
use crate::health::Died;
use crate::level::RosterEvent;
use bevy::prelude::*;

/// Handles [`Died`] for enemies.
///
/// The roster hears about the death once per `Died` (health only reports
/// death once).  The body then goes through its [`crate::death::DeathSequencer`]
/// when it has one, otherwise through the generic fallback; both paths share
/// the same once-only guard.
pub fn handle_enemy_deaths(
    mut died: MessageReader<Died>,
    enemies: Query<(), With<Enemy>>,
    mut effects: DeathEffects,
    mut roster: MessageWriter<RosterEvent>,
) {
    for event in died.read() {
        if !enemies.contains(event.entity) {
            continue;
        }
        let fallback_delay = effects
            .brain_settings(event.entity)
            .map(|s| s.fallback_death_delay)
            .unwrap_or(FALLBACK_DEATH_DELAY);
        effects.halt(event.entity);
        roster.write(RosterEvent::Died(event.entity));

        if effects.has_sequencer(event.entity) {
            effects.run_sequence(event.entity);
        } else {
            effects.run_fallback(event.entity, fallback_delay);
        }
    }
}
