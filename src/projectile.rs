//! Arrows: spawn, launch, hit or expire, dispose.
//!
//! ## Lifecycle
//!
//! ```text
//! spawn (unarmed) ─initialize─► armed ─launch pass─► flying
//!                                                     │
//!                        first qualifying collision ──┤── lifetime expiry
//!                        (damage + dispose)           │   (dispose only)
//!                                                     ▼
//!                                                  disposed
//! ```
//!
//! A collision qualifies when the other collider is in the projectile's mask
//! and is neither the owner, one of the owner's colliders, nor suppressed.
//! Dispose is idempotent: it cancels the pending expiry, lifts the owner's
//! collision suppression, forgets the owner and despawns.

use crate::config::GameplayConfig;
use crate::constants::{
    PROJECTILE_COLLIDER_RADIUS, PROJECTILE_DAMAGE, PROJECTILE_LIFETIME, PROJECTILE_SPEED,
};
use crate::health::{DamageRequest, Damageables};
use crate::physics::{in_mask, layer_of, CollisionSuppression, PROJECTILE_LAYER};
use crate::timers::{ScheduledTimers, TimerElapsed, TimerPurpose};
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

// ── Components ────────────────────────────────────────────────────────────────

/// Projectile stats before launch.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileTemplate {
    pub speed: f32,
    pub damage: i32,
    /// Seconds before self-disposal; `0.0` never expires.
    pub lifetime: f32,
    pub radius: f32,
    pub mask: Group,
}

impl Default for ProjectileTemplate {
    fn default() -> Self {
        Self {
            speed: PROJECTILE_SPEED,
            damage: PROJECTILE_DAMAGE,
            lifetime: PROJECTILE_LIFETIME,
            radius: PROJECTILE_COLLIDER_RADIUS,
            mask: Group::ALL,
        }
    }
}

impl From<&GameplayConfig> for ProjectileTemplate {
    fn from(config: &GameplayConfig) -> Self {
        Self {
            speed: config.projectile_speed,
            damage: config.projectile_damage,
            lifetime: config.projectile_lifetime,
            radius: config.projectile_collider_radius,
            mask: Group::ALL,
        }
    }
}

/// Where and how to fire one projectile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileLaunch {
    pub origin: Vec2,
    pub direction: Vec2,
    /// Replaces the template speed when positive.
    pub speed: Option<f32>,
    /// Replaces the template mask.
    pub mask: Option<Group>,
}

#[derive(Component, Debug, Clone)]
#[require(ScheduledTimers)]
pub struct Projectile {
    direction: Vec2,
    speed: f32,
    damage: i32,
    lifetime: f32,
    mask: Group,
    owner: Option<Entity>,
    armed: bool,
    launch_pending: bool,
    disposed: bool,
}

impl Projectile {
    pub fn from_template(template: &ProjectileTemplate) -> Self {
        Self {
            direction: Vec2::X,
            speed: template.speed,
            damage: template.damage,
            lifetime: template.lifetime,
            mask: template.mask,
            owner: None,
            armed: false,
            launch_pending: false,
            disposed: false,
        }
    }

    /// Arms the projectile.  A (near) zero direction falls back to +X; a
    /// positive `speed` replaces the template speed.
    pub fn initialize(&mut self, direction: Vec2, speed: Option<f32>) {
        self.direction = direction.try_normalize().unwrap_or(Vec2::X);
        if let Some(speed) = speed.filter(|s| *s > 0.0) {
            self.speed = speed;
        }
        self.armed = true;
        self.launch_pending = true;
    }

    pub fn set_mask(&mut self, mask: Group) {
        self.mask = mask;
    }

    pub fn set_owner(&mut self, owner: Option<Entity>) {
        self.owner = owner;
    }

    pub fn owner(&self) -> Option<Entity> {
        self.owner
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn damage(&self) -> i32 {
        self.damage
    }

    pub fn mask(&self) -> Group {
        self.mask
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn velocity(&self) -> Vec2 {
        self.direction * self.speed
    }

    /// Marks the projectile disposed.  Returns the owner whose suppression
    /// must be lifted, or `None` when it was already disposed.
    fn begin_dispose(&mut self) -> Option<Option<Entity>> {
        if self.disposed {
            return None;
        }
        self.disposed = true;
        self.armed = false;
        Some(self.owner.take())
    }
}

// ── Spawning ──────────────────────────────────────────────────────────────────

/// Spawns and arms a projectile.  The owner (if any) stops colliding with it
/// until it is disposed.
pub fn spawn_projectile(
    commands: &mut Commands,
    template: &ProjectileTemplate,
    launch: ProjectileLaunch,
    owner: Option<(Entity, &mut CollisionSuppression)>,
) -> Entity {
    let mut projectile = Projectile::from_template(template);
    if let Some(mask) = launch.mask {
        projectile.set_mask(mask);
    }
    projectile.initialize(launch.direction, launch.speed);
    projectile.set_owner(owner.as_ref().map(|(e, _)| *e));

    let entity = commands
        .spawn((
            Name::new("Projectile"),
            projectile,
            Transform::from_translation(launch.origin.extend(0.0)),
            RigidBody::KinematicVelocityBased,
            Collider::ball(template.radius),
            Sensor,
            ActiveEvents::COLLISION_EVENTS,
            ActiveCollisionTypes::all(),
            CollisionGroups::new(PROJECTILE_LAYER, Group::ALL),
            Velocity::zero(),
        ))
        .id();

    if let Some((_, suppression)) = owner {
        suppression.ignore(entity);
    }
    entity
}

/// `entity` is `owner` or one of its descendants.
fn is_owned_by(entity: Entity, owner: Entity, parents: &Query<&ChildOf>) -> bool {
    std::iter::successors(Some(entity), |&e| parents.get(e).ok().map(|c| c.parent()))
        .any(|e| e == owner)
}

/// Disposes `entity`.  No-op when it is already disposed.
fn dispose(
    commands: &mut Commands,
    entity: Entity,
    projectile: &mut Projectile,
    timers: &mut ScheduledTimers,
    suppressions: &mut Query<&mut CollisionSuppression>,
) {
    let Some(owner) = projectile.begin_dispose() else {
        return;
    };
    timers.cancel(TimerPurpose::ProjectileExpiry);
    if let Some(mut suppression) = owner.and_then(|o| suppressions.get_mut(o).ok()) {
        suppression.restore(entity);
    }
    commands.entity(entity).try_despawn();
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Gives freshly armed projectiles their velocity and (re)starts the
/// lifetime countdown.
pub fn launch_projectiles(
    time: Res<Time>,
    mut q: Query<(&mut Projectile, &mut Velocity, &mut ScheduledTimers)>,
) {
    let now = time.elapsed_secs();
    for (mut projectile, mut velocity, mut timers) in q.iter_mut() {
        if !projectile.launch_pending || projectile.disposed {
            continue;
        }
        projectile.launch_pending = false;
        velocity.linvel = projectile.velocity();
        if projectile.lifetime > 0.0 {
            timers.schedule(TimerPurpose::ProjectileExpiry, now, projectile.lifetime);
        }
    }
}

/// Resolves projectile collision starts: damage the first qualifying
/// collider's damageable and dispose.
#[allow(clippy::too_many_arguments)]
pub fn projectile_collisions(
    mut commands: Commands,
    mut collisions: MessageReader<CollisionEvent>,
    mut projectiles: Query<(&mut Projectile, &mut ScheduledTimers)>,
    mut suppressions: Query<&mut CollisionSuppression>,
    groups: Query<&CollisionGroups>,
    parents: Query<&ChildOf>,
    damageables: Damageables,
    mut damage: MessageWriter<DamageRequest>,
) {
    for event in collisions.read() {
        let CollisionEvent::Started(a, b, _) = *event else {
            continue;
        };
        for (this, other) in [(a, b), (b, a)] {
            let Ok((mut projectile, mut timers)) = projectiles.get_mut(this) else {
                continue;
            };
            if !projectile.armed || projectile.disposed {
                continue;
            }
            if projectile
                .owner
                .is_some_and(|owner| is_owned_by(other, owner, &parents))
            {
                continue;
            }
            if suppressions.get(other).is_ok_and(|s| s.ignores(this)) {
                continue;
            }
            if !in_mask(layer_of(groups.get(other).ok()), projectile.mask) {
                continue;
            }
            if let Some(target) = damageables.resolve(other) {
                damage.write(DamageRequest {
                    target,
                    amount: projectile.damage,
                });
            }
            dispose(&mut commands, this, &mut projectile, &mut timers, &mut suppressions);
        }
    }
}

/// Disposes projectiles whose lifetime ran out.  No damage is dealt.
pub fn expire_projectiles(
    mut commands: Commands,
    mut elapsed: MessageReader<TimerElapsed>,
    mut projectiles: Query<(&mut Projectile, &mut ScheduledTimers)>,
    mut suppressions: Query<&mut CollisionSuppression>,
) {
    for event in elapsed.read() {
        if event.purpose != TimerPurpose::ProjectileExpiry {
            continue;
        }
        let Ok((mut projectile, mut timers)) = projectiles.get_mut(event.entity) else {
            continue;
        };
        dispose(
            &mut commands,
            event.entity,
            &mut projectile,
            &mut timers,
            &mut suppressions,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_normalises_and_overrides_speed() {
        let mut p = Projectile::from_template(&ProjectileTemplate::default());
        assert!(!p.is_armed());
        p.initialize(Vec2::new(0.0, 3.0), Some(8.0));
        assert!(p.is_armed());
        assert_eq!(p.direction(), Vec2::Y);
        assert_eq!(p.velocity(), Vec2::new(0.0, 8.0));
    }

    #[test]
    fn zero_direction_falls_back_to_east() {
        let mut p = Projectile::from_template(&ProjectileTemplate::default());
        p.initialize(Vec2::ZERO, Some(-1.0));
        assert_eq!(p.direction(), Vec2::X);
        assert_eq!(p.speed(), PROJECTILE_SPEED);
    }

    #[test]
    fn dispose_happens_once_and_forgets_owner() {
        let mut world = World::new();
        let owner = world.spawn_empty().id();
        let mut p = Projectile::from_template(&ProjectileTemplate::default());
        p.set_owner(Some(owner));
        p.initialize(Vec2::X, None);
        assert_eq!(p.begin_dispose(), Some(Some(owner)));
        assert_eq!(p.owner(), None);
        assert!(p.is_disposed());
        assert_eq!(p.begin_dispose(), None);
    }
}
