//! Per-entity deferred callbacks.
//!
//! Delayed effects (clear an attack pose, despawn a corpse, expire an arrow,
//! release a queued player shot) are stored as deadlines on the entity that
//! owns them instead of as detached tasks.  That keeps two properties cheap
//! to guarantee:
//!
//! - one pending deadline per purpose: scheduling again replaces it;
//! - everything pending dies with the entity, and [`ScheduledTimers::cancel_all`]
//!   clears the table when a death sequence starts.
//!
//! [`dispatch_due_timers`] runs once per frame and turns every due deadline
//! into a [`TimerElapsed`] message; the owning module reacts to the purposes it
//! cares about.  Deadlines are absolute `Time::elapsed_secs` values.

use bevy::prelude::*;
use std::collections::BTreeMap;

/// What a deadline is for.  The ordering is only used to make dispatch order
/// deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerPurpose {
    /// Clear the attack pose raised by [`crate::animation::AttackAnimation`].
    AttackReset,
    /// Despawn after a death sequence.
    DeathDespawn,
    /// Dispose a projectile whose lifetime ran out.
    ProjectileExpiry,
    /// Release the delayed single player shot.
    PlayerShot,
    /// Release the next arrow of a player volley.
    PlayerVolley,
    /// Deploy the player's delayed area effect.
    AreaEffectDeploy,
    /// Remove a deployed area effect.
    AreaEffectExpiry,
}

/// Table of pending deadlines for one entity.
#[derive(Component, Debug, Default, Clone)]
pub struct ScheduledTimers {
    deadlines: BTreeMap<TimerPurpose, f32>,
}

impl ScheduledTimers {
    /// Schedules `purpose` at `now + delay`, replacing any pending deadline
    /// for the same purpose.
    pub fn schedule(&mut self, purpose: TimerPurpose, now: f32, delay: f32) {
        self.deadlines.insert(purpose, now + delay.max(0.0));
    }

    /// Removes the deadline for `purpose`.  Returns whether one was pending.
    pub fn cancel(&mut self, purpose: TimerPurpose) -> bool {
        self.deadlines.remove(&purpose).is_some()
    }

    /// Drops every pending deadline.
    pub fn cancel_all(&mut self) {
        self.deadlines.clear();
    }

    pub fn is_pending(&self, purpose: TimerPurpose) -> bool {
        self.deadlines.contains_key(&purpose)
    }

    pub fn deadline(&self, purpose: TimerPurpose) -> Option<f32> {
        self.deadlines.get(&purpose).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// Removes and returns every purpose whose deadline is `<= now`.
    pub fn take_due(&mut self, now: f32) -> Vec<TimerPurpose> {
        let due: Vec<TimerPurpose> = self
            .deadlines
            .iter()
            .filter(|(_, &deadline)| deadline <= now)
            .map(|(&purpose, _)| purpose)
            .collect();
        for purpose in &due {
            self.deadlines.remove(purpose);
        }
        due
    }
}

/// A deadline on `entity` came due this frame.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerElapsed {
    pub entity: Entity,
    pub purpose: TimerPurpose,
}

/// Emits a [`TimerElapsed`] for every due deadline.
pub fn dispatch_due_timers(
    time: Res<Time>,
    mut q: Query<(Entity, &mut ScheduledTimers)>,
    mut elapsed: MessageWriter<TimerElapsed>,
) {
    let now = time.elapsed_secs();
    for (entity, mut timers) in q.iter_mut() {
        if timers.is_empty() {
            continue;
        }
        for purpose in timers.take_due(now) {
            elapsed.write(TimerElapsed { entity, purpose });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduling_replaces_pending_deadline() {
        let mut t = ScheduledTimers::default();
        t.schedule(TimerPurpose::AttackReset, 1.0, 0.75);
        t.schedule(TimerPurpose::AttackReset, 1.5, 0.75);
        assert_eq!(t.deadline(TimerPurpose::AttackReset), Some(2.25));
        assert!(t.take_due(2.0).is_empty());
        assert_eq!(t.take_due(2.25), vec![TimerPurpose::AttackReset]);
        assert!(t.is_empty());
    }

    #[test]
    fn purposes_are_independent() {
        let mut t = ScheduledTimers::default();
        t.schedule(TimerPurpose::AttackReset, 0.0, 0.5);
        t.schedule(TimerPurpose::DeathDespawn, 0.0, 1.25);
        assert_eq!(t.take_due(1.0), vec![TimerPurpose::AttackReset]);
        assert!(t.is_pending(TimerPurpose::DeathDespawn));
    }

    #[test]
    fn cancel_and_cancel_all() {
        let mut t = ScheduledTimers::default();
        t.schedule(TimerPurpose::ProjectileExpiry, 0.0, 5.0);
        assert!(t.cancel(TimerPurpose::ProjectileExpiry));
        assert!(!t.cancel(TimerPurpose::ProjectileExpiry));

        t.schedule(TimerPurpose::AttackReset, 0.0, 1.0);
        t.schedule(TimerPurpose::PlayerVolley, 0.0, 1.0);
        t.cancel_all();
        assert!(t.take_due(10.0).is_empty());
    }

    #[test]
    fn negative_delay_is_due_immediately() {
        let mut t = ScheduledTimers::default();
        t.schedule(TimerPurpose::DeathDespawn, 3.0, -1.0);
        assert_eq!(t.take_due(3.0), vec![TimerPurpose::DeathDespawn]);
    }
}
