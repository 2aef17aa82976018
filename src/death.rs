//! Death sequencing: halt, go inert, present, despawn.
//!
//! ## Phases
//!
//! ```text
//! Alive ──try_begin──► Processing ──despawn──► Disposed
//!                         ▲   │
//!                         └───┘ every later try_begin → AlreadyHandled
//! ```
//!
//! The first successful [`DeathProcess::try_begin`] runs, in order:
//!
//! 1. disable the decision logic (`EnemyBrain`, `PlayerController`) and the
//!    animation-state driver, and cancel every pending deferred callback;
//! 2. disable colliders: the explicit list when one is configured, otherwise
//!    the entity and all of its descendants;
//! 3. zero linear and angular velocity and disable the rigid body;
//! 4. raise the `Die` trigger and the `isDead` bool, each independently;
//! 5. schedule the despawn (`delay <= 0` despawns this frame).
//!
//! Destruction proceeds whether or not the rig declared any death output.

use crate::animation::params::{DEAD_FLAG, DIE_TRIGGER};
use crate::animation::{ActorAnimationState, AnimatorParameters};
use crate::constants::DEATH_DESPAWN_DELAY;
use crate::enemy::{BehaviorSettings, EnemyBrain};
use crate::health::Died;
use crate::player::PlayerController;
use crate::timers::{ScheduledTimers, TimerElapsed, TimerPurpose};
use bevy::ecs::query::QueryData;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier2d::prelude::{Collider, ColliderDisabled, RigidBodyDisabled, Velocity};

// ── Components ────────────────────────────────────────────────────────────────

/// Idempotence guard of the death sequence.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeathProcess {
    #[default]
    Alive,
    Processing,
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathHandling {
    Started,
    AlreadyHandled,
}

impl DeathProcess {
    pub fn try_begin(&mut self) -> DeathHandling {
        if *self == DeathProcess::Alive {
            *self = DeathProcess::Processing;
            DeathHandling::Started
        } else {
            DeathHandling::AlreadyHandled
        }
    }

    pub fn is_alive(self) -> bool {
        self == DeathProcess::Alive
    }
}

/// Configured death sequence of an actor.
#[derive(Component, Debug, Clone)]
#[require(DeathProcess, ScheduledTimers)]
pub struct DeathSequencer {
    /// Colliders to disable.  Empty means "self and all descendants".
    pub colliders: Vec<Entity>,
    pub despawn_delay: f32,
    pub trigger: Option<String>,
    pub flag: Option<String>,
    pub disable_rigid_body: bool,
    /// Start automatically on this entity's [`Died`].
    pub auto_handle: bool,
}

impl Default for DeathSequencer {
    fn default() -> Self {
        Self {
            colliders: Vec::new(),
            despawn_delay: DEATH_DESPAWN_DELAY,
            trigger: Some(DIE_TRIGGER.to_string()),
            flag: Some(DEAD_FLAG.to_string()),
            disable_rigid_body: true,
            auto_handle: true,
        }
    }
}

impl DeathSequencer {
    pub fn with_delay(mut self, delay: f32) -> Self {
        self.despawn_delay = delay;
        self
    }
}

/// Start the death sequence of `entity` regardless of its health.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeathRequested {
    pub entity: Entity,
}

// ── Effects ───────────────────────────────────────────────────────────────────

#[derive(QueryData)]
#[query_data(mutable)]
pub struct DeathActor {
    pub process: &'static mut DeathProcess,
    pub sequencer: Option<&'static DeathSequencer>,
    pub brain: Option<&'static mut EnemyBrain>,
    pub controller: Option<&'static mut PlayerController>,
    pub animation: Option<&'static mut ActorAnimationState>,
    pub timers: Option<&'static mut ScheduledTimers>,
    pub velocity: Option<&'static mut Velocity>,
    pub params: Option<&'static mut AnimatorParameters>,
}

/// Everything a death sequence touches.
#[derive(SystemParam)]
pub struct DeathEffects<'w, 's> {
    commands: Commands<'w, 's>,
    time: Res<'w, Time>,
    actors: Query<'w, 's, DeathActor>,
    colliders: Query<'w, 's, (), With<Collider>>,
    children: Query<'w, 's, &'static Children>,
}

/// How the despawn is presented.
struct Presentation<'a> {
    colliders: &'a [Entity],
    trigger: Option<&'a str>,
    flag: Option<&'a str>,
    disable_rigid_body: bool,
    delay: f32,
    /// Despawn immediately when no presentation output matched.
    skip_delay_without_presentation: bool,
}

impl DeathEffects<'_, '_> {
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.actors
            .get(entity)
            .map(|actor| actor.process.is_alive())
            .unwrap_or(false)
    }

    pub fn brain_settings(&self, entity: Entity) -> Option<BehaviorSettings> {
        let actor = self.actors.get(entity).ok()?;
        actor.brain.map(|brain| brain.settings)
    }

    /// Stops an enemy's decisions and movement without starting a sequence.
    pub fn halt(&mut self, entity: Entity) {
        let Ok(mut actor) = self.actors.get_mut(entity) else {
            return;
        };
        if let Some(brain) = actor.brain.as_mut() {
            brain.enabled = false;
        }
        if let Some(velocity) = actor.velocity.as_mut() {
            velocity.linvel = Vec2::ZERO;
            velocity.angvel = 0.0;
        }
    }

    pub fn has_sequencer(&self, entity: Entity) -> bool {
        self.actors
            .get(entity)
            .map(|actor| actor.sequencer.is_some())
            .unwrap_or(false)
    }

    /// Runs the configured [`DeathSequencer`] of `entity`.
    pub fn run_sequence(&mut self, entity: Entity) -> DeathHandling {
        let Ok(actor) = self.actors.get(entity) else {
            return DeathHandling::AlreadyHandled;
        };
        let Some(sequencer) = actor.sequencer.cloned() else {
            return DeathHandling::AlreadyHandled;
        };
        self.run(
            entity,
            Presentation {
                colliders: &sequencer.colliders,
                trigger: sequencer.trigger.as_deref(),
                flag: sequencer.flag.as_deref(),
                disable_rigid_body: sequencer.disable_rigid_body,
                delay: sequencer.despawn_delay,
                skip_delay_without_presentation: false,
            },
        )
    }

    /// Generic death for actors without a sequencer: the delay only applies
    /// when the rig has a death output to show during it.
    pub fn run_fallback(&mut self, entity: Entity, delay: f32) -> DeathHandling {
        self.run(
            entity,
            Presentation {
                colliders: &[],
                trigger: Some(DIE_TRIGGER),
                flag: Some(DEAD_FLAG),
                disable_rigid_body: true,
                delay,
                skip_delay_without_presentation: true,
            },
        )
    }

    fn run(&mut self, entity: Entity, presentation: Presentation) -> DeathHandling {
        let now = self.time.elapsed_secs();
        let Ok(mut actor) = self.actors.get_mut(entity) else {
            return DeathHandling::AlreadyHandled;
        };
        if actor.process.try_begin() == DeathHandling::AlreadyHandled {
            return DeathHandling::AlreadyHandled;
        }

        if let Some(brain) = actor.brain.as_mut() {
            brain.enabled = false;
        }
        if let Some(controller) = actor.controller.as_mut() {
            controller.enabled = false;
        }
        if let Some(animation) = actor.animation.as_mut() {
            animation.enabled = false;
        }
        if let Some(timers) = actor.timers.as_mut() {
            timers.cancel_all();
        }

        if presentation.disable_rigid_body {
            if let Some(velocity) = actor.velocity.as_mut() {
                velocity.linvel = Vec2::ZERO;
                velocity.angvel = 0.0;
            }
        }

        let mut presented = false;
        if let Some(params) = actor.params.as_mut() {
            if let Some(trigger) = presentation.trigger {
                params.try_reset_trigger(trigger);
                presented |= params.try_trigger(trigger);
            }
            if let Some(flag) = presentation.flag {
                presented |= params.try_set_bool(flag, true);
            }
        }

        let delay = if presentation.skip_delay_without_presentation && !presented {
            0.0
        } else {
            presentation.delay
        };
        let despawn_now = delay <= 0.0;
        if despawn_now {
            *actor.process = DeathProcess::Disposed;
        } else if let Some(timers) = actor.timers.as_mut() {
            timers.schedule(TimerPurpose::DeathDespawn, now, delay);
        }
        let has_timers = actor.timers.is_some();

        self.disable_colliders(entity, presentation.colliders);
        if presentation.disable_rigid_body {
            self.commands.entity(entity).try_insert(RigidBodyDisabled);
        }

        if despawn_now {
            self.commands.entity(entity).try_despawn();
        } else if !has_timers {
            let mut timers = ScheduledTimers::default();
            timers.schedule(TimerPurpose::DeathDespawn, now, delay);
            self.commands.entity(entity).try_insert(timers);
        }
        debug!("{entity:?} death sequence started (despawn in {delay}s)");
        DeathHandling::Started
    }

    fn disable_colliders(&mut self, root: Entity, explicit: &[Entity]) {
        if !explicit.is_empty() {
            for &collider in explicit {
                self.commands.entity(collider).try_insert(ColliderDisabled);
            }
            return;
        }
        let mut stack = vec![root];
        while let Some(entity) = stack.pop() {
            if self.colliders.contains(entity) {
                self.commands.entity(entity).try_insert(ColliderDisabled);
            }
            if let Ok(children) = self.children.get(entity) {
                stack.extend(children.iter());
            }
        }
    }
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Starts sequences on explicit requests and on `Died` for auto-handling
/// sequencers.
pub fn begin_death_sequences(
    mut died: MessageReader<Died>,
    mut requested: MessageReader<DeathRequested>,
    auto: Query<&DeathSequencer>,
    mut effects: DeathEffects,
) {
    let from_health = died
        .read()
        .map(|d| d.entity)
        .filter(|&e| auto.get(e).map(|s| s.auto_handle).unwrap_or(false));
    let entities: Vec<Entity> = from_health
        .chain(requested.read().map(|r| r.entity))
        .collect();
    for entity in entities {
        if effects.has_sequencer(entity) {
            effects.run_sequence(entity);
        }
    }
}

/// Despawns actors whose death delay elapsed.
pub fn despawn_dead(
    mut commands: Commands,
    mut elapsed: MessageReader<TimerElapsed>,
    mut q: Query<&mut DeathProcess>,
) {
    for event in elapsed.read() {
        if event.purpose != TimerPurpose::DeathDespawn {
            continue;
        }
        let Ok(mut process) = q.get_mut(event.entity) else {
            continue;
        };
        if *process == DeathProcess::Disposed {
            continue;
        }
        *process = DeathProcess::Disposed;
        commands.entity(event.entity).try_despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_is_idempotent() {
        let mut p = DeathProcess::default();
        assert_eq!(p.try_begin(), DeathHandling::Started);
        assert_eq!(p.try_begin(), DeathHandling::AlreadyHandled);
        p = DeathProcess::Disposed;
        assert_eq!(p.try_begin(), DeathHandling::AlreadyHandled);
    }

    #[test]
    fn default_sequencer_uses_die_outputs() {
        let s = DeathSequencer::default();
        assert_eq!(s.trigger.as_deref(), Some("Die"));
        assert_eq!(s.flag.as_deref(), Some("isDead"));
        assert_eq!(s.despawn_delay, DEATH_DESPAWN_DELAY);
        assert!(s.auto_handle);
    }
}
