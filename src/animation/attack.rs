//! Attack pose for attack-capable actors.
//!
//! Playing an attack fires the attack trigger (when the rig declares it) and
//! raises the first declared `{prefix}{Facing}` bool together with
//! `isAttackAttacking`.  A [`TimerPurpose::AttackReset`] deadline lowers both
//! again; replaying before it elapses restarts the countdown.

use super::params::{AnimatorParameters, ATTACKING_FLAG};
use crate::constants::{MELEE_ATTACK_RESET_DELAY, RANGED_ATTACK_RESET_DELAY};
use crate::direction::Direction8;
use crate::timers::{ScheduledTimers, TimerElapsed, TimerPurpose};
use bevy::prelude::*;

pub const DEFAULT_ATTACK_PREFIXES: [&str; 2] = ["AttackAttack", "Attack2"];

#[derive(Component, Debug, Clone)]
pub struct AttackAnimation {
    pub trigger: Option<String>,
    pub prefixes: Vec<String>,
    pub reset_delay: f32,
    active_pose: Option<String>,
}

impl AttackAnimation {
    pub fn new(trigger: Option<&str>, prefixes: &[&str], reset_delay: f32) -> Self {
        Self {
            trigger: trigger.map(str::to_string),
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            reset_delay,
            active_pose: None,
        }
    }

    /// Sword swing: `Melee` trigger, 0.75 s pose.
    pub fn melee() -> Self {
        Self::new(Some("Melee"), &DEFAULT_ATTACK_PREFIXES, MELEE_ATTACK_RESET_DELAY)
    }

    /// Bow draw: `Shoot` trigger, 0.6 s pose.
    pub fn ranged() -> Self {
        Self::new(Some("Shoot"), &DEFAULT_ATTACK_PREFIXES, RANGED_ATTACK_RESET_DELAY)
    }

    pub fn with_reset_delay(mut self, delay: f32) -> Self {
        self.reset_delay = delay;
        self
    }

    /// The pose bool currently raised, if any.
    pub fn active_pose(&self) -> Option<&str> {
        self.active_pose.as_deref()
    }

    /// Plays the attack facing `facing`.  Returns the pose bool raised, if
    /// the rig declares one.
    pub fn play(
        &mut self,
        facing: Direction8,
        params: &mut AnimatorParameters,
        timers: &mut ScheduledTimers,
        now: f32,
    ) -> Option<String> {
        if let Some(trigger) = &self.trigger {
            params.try_trigger(trigger);
        }

        let pose = self
            .prefixes
            .iter()
            .filter(|prefix| !prefix.is_empty())
            .map(|prefix| format!("{prefix}{}", facing.name()))
            .find(|candidate| params.try_set_bool(candidate, true))?;

        // A previous pose in another facing must not stay raised.
        if let Some(previous) = self.active_pose.take() {
            if previous != pose {
                params.try_set_bool(&previous, false);
            }
        }
        params.try_set_bool(ATTACKING_FLAG, true);
        timers.schedule(TimerPurpose::AttackReset, now, self.reset_delay);
        self.active_pose = Some(pose.clone());
        Some(pose)
    }

    /// Lowers the pose bool and `isAttackAttacking`.
    pub fn clear(&mut self, params: &mut AnimatorParameters) {
        if let Some(pose) = self.active_pose.take() {
            params.try_set_bool(&pose, false);
        }
        params.try_set_bool(ATTACKING_FLAG, false);
    }
}

/// Lowers attack poses whose reset deadline elapsed.
pub fn reset_attack_poses(
    mut elapsed: MessageReader<TimerElapsed>,
    mut q: Query<(&mut AttackAnimation, &mut AnimatorParameters)>,
) {
    for event in elapsed.read() {
        if event.purpose != TimerPurpose::AttackReset {
            continue;
        }
        if let Ok((mut attack, mut params)) = q.get_mut(event.entity) {
            attack.clear(&mut params);
        }
    }
}
