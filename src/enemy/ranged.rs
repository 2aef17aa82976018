//! Bow attack: line-of-sight check, then one arrow toward the target.
//!
//! ## Line of sight
//!
//! A ray starts at the fire point pushed `muzzle_offset` along the aim and
//! runs `attack_range + line_of_sight_padding` against the LOS mask.  Hits on
//! the shooter's own colliders are skipped; the first remaining hit decides:
//! one of the target's colliders means clear, anything else means blocked.
//! A ray that hits nothing is clear.  A blocked shot fails and leaves the
//! cooldown untouched.

use super::attack::{mask_or_default, AttackContext, AttackEffects, AttackOutcome, AttackStrategy};
use crate::config::GameplayConfig;
use crate::constants::{LINE_OF_SIGHT_PADDING, MUZZLE_OFFSET, RANGED_PROJECTILE_SPEED};
use crate::physics::CollisionQueries;
use crate::projectile::{ProjectileLaunch, ProjectileTemplate};
use bevy::prelude::*;
use bevy_rapier2d::prelude::Group;

#[derive(Debug, Clone)]
pub struct RangedVolley {
    pub projectile_speed: f32,
    /// Fire point relative to the shooter's position.
    pub fire_point: Vec2,
    pub muzzle_offset: f32,
    pub line_of_sight_padding: f32,
    /// Layers the LOS ray considers.  Empty until derived from the target.
    pub line_of_sight_mask: Group,
    /// Layers the arrow may hit.  Empty until derived from the target.
    pub projectile_mask: Group,
    /// Shoot along the current facing instead of straight at the target.
    pub lock_to_facing: bool,
    pub trigger: Option<String>,
    pub template: ProjectileTemplate,
}

impl Default for RangedVolley {
    fn default() -> Self {
        Self {
            projectile_speed: RANGED_PROJECTILE_SPEED,
            fire_point: Vec2::ZERO,
            muzzle_offset: MUZZLE_OFFSET,
            line_of_sight_padding: LINE_OF_SIGHT_PADDING,
            line_of_sight_mask: Group::NONE,
            projectile_mask: Group::NONE,
            lock_to_facing: false,
            trigger: Some("Shoot".to_string()),
            template: ProjectileTemplate::default(),
        }
    }
}

impl From<&GameplayConfig> for RangedVolley {
    fn from(config: &GameplayConfig) -> Self {
        Self {
            projectile_speed: config.ranged_projectile_speed,
            muzzle_offset: config.muzzle_offset,
            line_of_sight_padding: config.line_of_sight_padding,
            template: ProjectileTemplate::from(config),
            ..Default::default()
        }
    }
}

impl RangedVolley {
    /// First non-self hit along the ray is the target, or nothing was hit.
    pub fn has_line_of_sight(
        &self,
        ctx: &AttackContext,
        origin: Vec2,
        direction: Vec2,
        world: &dyn CollisionQueries,
    ) -> bool {
        let mask = mask_or_default(self.line_of_sight_mask, "line-of-sight", ctx.attacker);
        let max_distance = ctx.attack_range + self.line_of_sight_padding;
        world
            .raycast_all(origin, direction, max_distance, mask)
            .into_iter()
            .find(|hit| !ctx.own_colliders.contains(&hit.entity))
            .is_none_or(|hit| hit.entity == ctx.target || ctx.target_colliders.contains(&hit.entity))
    }
}

impl AttackStrategy for RangedVolley {
    fn on_target_acquired(&mut self, target_layer: Group) {
        if self.line_of_sight_mask.is_empty() {
            self.line_of_sight_mask = target_layer;
        }
        if self.projectile_mask.is_empty() {
            self.projectile_mask = target_layer;
        }
    }

    fn try_attack(
        &mut self,
        ctx: &AttackContext,
        world: &dyn CollisionQueries,
        _resolve: &dyn Fn(Entity) -> Option<Entity>,
    ) -> AttackOutcome {
        let fire_point = ctx.position + self.fire_point;
        let aim = (ctx.target_position - fire_point)
            .try_normalize()
            .unwrap_or_else(|| ctx.facing.unit_vector());
        let origin = fire_point + aim * self.muzzle_offset;

        if !self.has_line_of_sight(ctx, origin, aim, world) {
            return AttackOutcome::Failed;
        }

        let direction = if self.lock_to_facing {
            ctx.facing.unit_vector()
        } else {
            aim
        };
        let mask = (!self.projectile_mask.is_empty()).then_some(self.projectile_mask);

        AttackOutcome::Success(AttackEffects {
            damage: Vec::new(),
            projectiles: vec![ProjectileLaunch {
                origin,
                direction,
                speed: Some(self.projectile_speed),
                mask,
            }],
            aim: (!self.lock_to_facing).then_some(aim),
            trigger: self.trigger.clone(),
        })
    }
}
