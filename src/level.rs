//! Level outcome bookkeeping: who is still standing, and did anyone win.
//!
//! The coordinator listens to the enemy roster broadcast ([`RosterEvent`])
//! and to the player's health messages, and reports outcomes as
//! [`LevelSignal`]s.  It never touches combat state.
//!
//! ## Signals
//!
//! | Signal                 | When                                           |
//! |------------------------|------------------------------------------------|
//! | `LevelStarted`         | first bookkeeping pass                         |
//! | `EnemiesRemaining(n)`  | the roster size changed                        |
//! | `PlayerDamaged`        | the player took damage                         |
//! | `LevelComplete`        | roster became empty after a death, once        |
//! | `PlayerDefeated`       | the player died, once                          |

use crate::enemy::Enemy;
use crate::health::{Damaged, Died};
use crate::player::Player;
use bevy::prelude::*;
use std::collections::HashSet;

// ── Messages ──────────────────────────────────────────────────────────────────

/// Broadcast about enemy presence.  Every reader sees every event in write
/// order.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterEvent {
    Spawned(Entity),
    Died(Entity),
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSignal {
    LevelStarted,
    EnemiesRemaining(usize),
    PlayerDamaged { current: i32, max: i32 },
    LevelComplete,
    PlayerDefeated,
}

// ── Resource ──────────────────────────────────────────────────────────────────

#[derive(Resource, Debug, Default)]
pub struct LevelProgress {
    alive: HashSet<Entity>,
    /// Enemies whose death was recorded; a late spawn notice for one of
    /// them is ignored.
    fallen: HashSet<Entity>,
    level_complete_fired: bool,
    player_defeated_fired: bool,
    started: bool,
}

impl LevelProgress {
    pub fn remaining(&self) -> usize {
        self.alive.len()
    }

    pub fn is_tracking(&self, enemy: Entity) -> bool {
        self.alive.contains(&enemy)
    }

    pub fn is_complete(&self) -> bool {
        self.level_complete_fired
    }

    pub fn is_defeated(&self) -> bool {
        self.player_defeated_fired
    }

    /// Returns `true` when the enemy was not tracked yet.  Enemies already
    /// recorded as dead are never tracked again.
    pub fn register_enemy(&mut self, enemy: Entity) -> bool {
        if self.fallen.contains(&enemy) {
            return false;
        }
        self.alive.insert(enemy)
    }

    /// Removes the enemy.  Returns `true` exactly once: when the roster is
    /// empty and completion has not been reported before.
    ///
    /// Unknown enemies still count toward completion, so a death reported
    /// before any spawn completes an empty level.
    pub fn record_enemy_death(&mut self, enemy: Entity) -> bool {
        self.alive.remove(&enemy);
        self.fallen.insert(enemy);
        if self.level_complete_fired || !self.alive.is_empty() {
            return false;
        }
        self.level_complete_fired = true;
        true
    }

    /// Returns `true` on the first call only.
    pub fn record_player_death(&mut self) -> bool {
        !std::mem::replace(&mut self.player_defeated_fired, true)
    }
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Announces freshly spawned enemies on the roster broadcast.
pub fn announce_spawned_enemies(
    added: Query<Entity, Added<Enemy>>,
    mut roster: MessageWriter<RosterEvent>,
) {
    roster.write_batch(added.iter().map(RosterEvent::Spawned));
}

/// Consumes the roster broadcast and reports started / remaining / complete.
pub fn track_roster(
    mut progress: ResMut<LevelProgress>,
    mut roster: MessageReader<RosterEvent>,
    mut signals: MessageWriter<LevelSignal>,
) {
    if !progress.started {
        progress.started = true;
        signals.write(LevelSignal::LevelStarted);
    }

    for event in roster.read() {
        match *event {
            RosterEvent::Spawned(enemy) => {
                if progress.register_enemy(enemy) {
                    signals.write(LevelSignal::EnemiesRemaining(progress.remaining()));
                }
            }
            RosterEvent::Died(enemy) => {
                let before = progress.remaining();
                let complete = progress.record_enemy_death(enemy);
                if progress.remaining() != before {
                    signals.write(LevelSignal::EnemiesRemaining(progress.remaining()));
                }
                if complete {
                    info!("Level complete");
                    signals.write(LevelSignal::LevelComplete);
                }
            }
        }
    }
}

/// Relays player damage and reports defeat once.
pub fn track_player_outcome(
    mut progress: ResMut<LevelProgress>,
    mut damaged: MessageReader<Damaged>,
    mut died: MessageReader<Died>,
    players: Query<(), With<Player>>,
    mut signals: MessageWriter<LevelSignal>,
) {
    for event in damaged.read() {
        if players.contains(event.entity) {
            signals.write(LevelSignal::PlayerDamaged {
                current: event.current,
                max: event.max,
            });
        }
    }
    for event in died.read() {
        if players.contains(event.entity) && progress.record_player_death() {
            info!("Player defeated");
            signals.write(LevelSignal::PlayerDefeated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..n).map(|_| world.spawn_empty().id()).collect()
    }

    #[test]
    fn completes_once_when_last_enemy_dies() {
        let e = ids(2);
        let mut p = LevelProgress::default();
        assert!(p.register_enemy(e[0]));
        assert!(p.register_enemy(e[1]));
        assert!(!p.register_enemy(e[1]));
        assert!(!p.record_enemy_death(e[0]));
        assert!(p.record_enemy_death(e[1]));
        assert!(p.is_complete());
        assert!(!p.record_enemy_death(e[1]));
    }

    #[test]
    fn unknown_death_on_empty_roster_completes() {
        let e = ids(1);
        let mut p = LevelProgress::default();
        assert!(p.record_enemy_death(e[0]));
    }

    #[test]
    fn spawn_notice_after_death_is_ignored() {
        let e = ids(2);
        let mut p = LevelProgress::default();
        p.register_enemy(e[0]);
        assert!(!p.record_enemy_death(e[1]));
        assert!(!p.register_enemy(e[1]));
        assert_eq!(p.remaining(), 1);
        assert!(p.record_enemy_death(e[0]));
    }

    #[test]
    fn player_defeat_reported_once() {
        let mut p = LevelProgress::default();
        assert!(p.record_player_death());
        assert!(!p.record_player_death());
        assert!(p.is_defeated());
    }
}
