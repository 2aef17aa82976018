//! Hit points, damage routing and the damaged/died notifications.
//!
//! ## Damage flow
//!
//! ```text
//! melee swing / projectile hit
//!        │  DamageRequest { target: <collider entity>, amount }
//!        ▼
//! apply_damage_requests ── Damageables::resolve ──► entity with Health
//!        │
//!        ├─► Damaged { entity, current, max }
//!        └─► Died { entity }            (exactly once, when current hits 0)
//! ```
//!
//! The damageable capability of a collider is found on the collider itself,
//! then on its ancestors, then on its immediate children; the first match
//! wins.  A [`DamageRelay`] counts as damageable and forwards to another
//! entity's [`Health`].  A collider with no damageable anywhere takes no
//! damage and raises no error.

use crate::constants::DEFAULT_MAX_HEALTH;
use crate::death::DeathProcess;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

// ── Components ────────────────────────────────────────────────────────────────

/// Integer hit points.  `max` is fixed at construction.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
#[require(DeathProcess)]
pub struct Health {
    current: i32,
    max: i32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HEALTH)
    }
}

/// Result of a damage application that changed hit points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthChange {
    pub current: i32,
    pub max: i32,
    /// `true` only on the application that brought `current` to zero.
    pub died: bool,
}

impl Health {
    /// Full health.  A non-positive `max` is raised to 1.
    pub fn new(max: i32) -> Self {
        let max = max.max(1);
        Self { current: max, max }
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Subtracts `amount`, saturating at zero.
    ///
    /// Non-positive amounts and damage to an already dead actor change
    /// nothing and return `None`.
    pub fn apply_damage(&mut self, amount: i32) -> Option<HealthChange> {
        if amount <= 0 || self.current <= 0 {
            return None;
        }
        self.current = self.current.saturating_sub(amount).max(0);
        Some(HealthChange {
            current: self.current,
            max: self.max,
            died: self.current == 0,
        })
    }

    /// Restores full health without any notification.
    pub fn reset(&mut self) {
        self.current = self.max;
    }
}

/// Hit box that forwards damage to another entity's [`Health`].
///
/// With `target: None` the nearest ancestor carrying `Health` receives it.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct DamageRelay {
    pub target: Option<Entity>,
}

impl DamageRelay {
    pub fn to(target: Entity) -> Self {
        Self {
            target: Some(target),
        }
    }
}

// ── Messages ──────────────────────────────────────────────────────────────────

/// Deal `amount` damage to whatever damageable `target` resolves to.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageRequest {
    pub target: Entity,
    pub amount: i32,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Damaged {
    pub entity: Entity,
    pub current: i32,
    pub max: i32,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Died {
    pub entity: Entity,
}

// ── Resolution ────────────────────────────────────────────────────────────────

/// Finds the [`Health`] entity that damage aimed at a collider lands on.
#[derive(SystemParam)]
pub struct Damageables<'w, 's> {
    healths: Query<'w, 's, (), With<Health>>,
    relays: Query<'w, 's, &'static DamageRelay>,
    parents: Query<'w, 's, &'static ChildOf>,
    children: Query<'w, 's, &'static Children>,
}

impl Damageables<'_, '_> {
    /// Entity whose `Health` should take damage aimed at `hit`, if any.
    pub fn resolve(&self, hit: Entity) -> Option<Entity> {
        if let Some(found) = self.capability(hit) {
            return found;
        }
        let mut current = hit;
        while let Ok(child_of) = self.parents.get(current) {
            current = child_of.parent();
            if let Some(found) = self.capability(current) {
                return found;
            }
        }
        if let Ok(children) = self.children.get(hit) {
            for child in children.iter() {
                if let Some(found) = self.capability(child) {
                    return found;
                }
            }
        }
        None
    }

    /// `Some(_)` when `entity` carries a damageable capability; the inner
    /// value is where the damage lands (a relay may lead nowhere).
    fn capability(&self, entity: Entity) -> Option<Option<Entity>> {
        if self.healths.contains(entity) {
            return Some(Some(entity));
        }
        let relay = self.relays.get(entity).ok()?;
        Some(match relay.target {
            Some(target) => self.healths.contains(target).then_some(target),
            None => self.nearest_health_ancestor(entity),
        })
    }

    fn nearest_health_ancestor(&self, entity: Entity) -> Option<Entity> {
        let mut current = entity;
        while let Ok(child_of) = self.parents.get(current) {
            current = child_of.parent();
            if self.healths.contains(current) {
                return Some(current);
            }
        }
        None
    }

    pub fn is_damageable(&self, hit: Entity) -> bool {
        self.resolve(hit).is_some()
    }
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Applies queued [`DamageRequest`]s in order and reports the outcome.
pub fn apply_damage_requests(
    mut requests: MessageReader<DamageRequest>,
    damageables: Damageables,
    mut healths: Query<&mut Health>,
    mut damaged: MessageWriter<Damaged>,
    mut died: MessageWriter<Died>,
) {
    for request in requests.read() {
        let Some(entity) = damageables.resolve(request.target) else {
            continue;
        };
        let Ok(mut health) = healths.get_mut(entity) else {
            continue;
        };
        let Some(change) = health.apply_damage(request.amount) else {
            continue;
        };
        damaged.write(Damaged {
            entity,
            current: change.current,
            max: change.max,
        });
        if change.died {
            debug!("{entity:?} died");
            died.write(Died { entity });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_saturates_and_dies_once() {
        let mut h = Health::new(5);
        assert_eq!(
            h.apply_damage(3),
            Some(HealthChange {
                current: 2,
                max: 5,
                died: false
            })
        );
        assert_eq!(h.apply_damage(10).map(|c| c.died), Some(true));
        assert_eq!(h.current(), 0);
        assert_eq!(h.apply_damage(1), None);
    }

    #[test]
    fn non_positive_damage_is_ignored() {
        let mut h = Health::new(5);
        assert_eq!(h.apply_damage(0), None);
        assert_eq!(h.apply_damage(-3), None);
        assert_eq!(h.current(), 5);
    }

    #[test]
    fn reset_restores_max() {
        let mut h = Health::new(3);
        h.apply_damage(3);
        assert!(h.is_dead());
        h.reset();
        assert_eq!(h.current(), 3);
        assert!(h.apply_damage(1).is_some());
    }

    #[test]
    fn max_is_at_least_one() {
        assert_eq!(Health::new(0).max(), 1);
        assert_eq!(Health::default().max(), DEFAULT_MAX_HEALTH);
    }
}
