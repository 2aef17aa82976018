//! Close-range swing: an overlap circle around the attack origin.

use super::attack::{mask_or_default, AttackContext, AttackEffects, AttackOutcome, AttackStrategy};
use crate::config::GameplayConfig;
use crate::constants::{MELEE_ATTACK_RADIUS, MELEE_DAMAGE};
use crate::health::DamageRequest;
use crate::physics::CollisionQueries;
use bevy::prelude::*;
use bevy_rapier2d::prelude::Group;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct MeleeStrike {
    pub damage: i32,
    pub radius: f32,
    /// Offset of the circle centre from the attacker's position.
    pub origin_offset: Vec2,
    /// Layers that can be hit.  Empty until derived from the target.
    pub damage_mask: Group,
    /// Extra animator trigger fired on every swing.
    pub trigger: Option<String>,
    missing_trigger_warned: bool,
}

impl Default for MeleeStrike {
    fn default() -> Self {
        Self {
            damage: MELEE_DAMAGE,
            radius: MELEE_ATTACK_RADIUS,
            origin_offset: Vec2::ZERO,
            damage_mask: Group::NONE,
            trigger: None,
            missing_trigger_warned: false,
        }
    }
}

impl From<&GameplayConfig> for MeleeStrike {
    fn from(config: &GameplayConfig) -> Self {
        Self {
            damage: config.melee_damage,
            radius: config.melee_attack_radius,
            ..Default::default()
        }
    }
}

impl MeleeStrike {
    pub(crate) fn take_missing_trigger_warning(&mut self) -> bool {
        !std::mem::replace(&mut self.missing_trigger_warned, true)
    }
}

impl AttackStrategy for MeleeStrike {
    fn on_target_acquired(&mut self, target_layer: Group) {
        if self.damage_mask.is_empty() {
            self.damage_mask = target_layer;
        }
    }

    /// Damages every damageable in reach once.  A swing always counts, even
    /// when it hits nothing.
    fn try_attack(
        &mut self,
        ctx: &AttackContext,
        world: &dyn CollisionQueries,
        resolve: &dyn Fn(Entity) -> Option<Entity>,
    ) -> AttackOutcome {
        let mask = mask_or_default(self.damage_mask, "damage", ctx.attacker);
        let origin = ctx.position + self.origin_offset;

        let mut seen = HashSet::new();
        let mut damage = Vec::new();
        for hit in world.overlap_circle(origin, self.radius, mask) {
            if ctx.own_colliders.contains(&hit) {
                continue;
            }
            let Some(target) = resolve(hit) else {
                continue;
            };
            if target == ctx.attacker || !seen.insert(target) {
                continue;
            }
            damage.push(DamageRequest {
                target,
                amount: self.damage,
            });
        }

        AttackOutcome::Success(AttackEffects {
            damage,
            projectiles: Vec::new(),
            aim: None,
            trigger: self.trigger.clone(),
        })
    }
}
