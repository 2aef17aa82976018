//! Attack strategies and the system that resolves attack requests.
//!
//! A strategy only decides; it reads the physics world through
//! [`CollisionQueries`] and returns an [`AttackOutcome`] describing the
//! effects.  [`AttackResolver`] applies them: damage requests, projectiles,
//! aim, attack pose and trigger, and the cooldown stamp.  In the game it runs
//! against the rapier world ([`resolve_enemy_attacks`]); any other
//! [`CollisionQueries`] resource can stand in ([`resolve_enemy_attacks_in`]).

use super::brain::{Enemy, EnemyBrain, TargetAcquired};
use super::melee::MeleeStrike;
use super::ranged::RangedVolley;
use crate::animation::{ActorAnimationState, AnimatorParameters, AttackAnimation};
use crate::direction::Direction8;
use crate::health::{DamageRequest, Damageables};
use crate::physics::{layer_of, CollisionQueries, CollisionSuppression};
use crate::projectile::{spawn_projectile, ProjectileLaunch};
use crate::timers::ScheduledTimers;
use bevy::ecs::query::QueryData;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier2d::prelude::{Collider, CollisionGroups, Group, ReadRapierContext};

/// The decision step wants `enemy` to attack `target` now.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackRequested {
    pub enemy: Entity,
    pub target: Entity,
}

/// What a strategy knows about the attacker and its target.
#[derive(Debug, Clone)]
pub struct AttackContext {
    pub attacker: Entity,
    pub position: Vec2,
    pub facing: Direction8,
    pub attack_range: f32,
    pub target: Entity,
    pub target_position: Vec2,
    /// Colliders of the attacker (itself and descendants).
    pub own_colliders: Vec<Entity>,
    /// Colliders of the target (itself and descendants).
    pub target_colliders: Vec<Entity>,
}

/// Effects of a successful attack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttackEffects {
    /// Already-resolved damageables and the damage each takes.
    pub damage: Vec<DamageRequest>,
    pub projectiles: Vec<ProjectileLaunch>,
    /// Direction the attacker should face while attacking.
    pub aim: Option<Vec2>,
    pub trigger: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttackOutcome {
    Success(AttackEffects),
    /// Nothing happened; the cooldown is not consumed.
    Failed,
}

impl AttackOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, AttackOutcome::Success(_))
    }
}

pub trait AttackStrategy {
    /// Fill in masks the actor left empty from the target's layer.
    fn on_target_acquired(&mut self, target_layer: Group);

    fn try_attack(
        &mut self,
        ctx: &AttackContext,
        world: &dyn CollisionQueries,
        resolve: &dyn Fn(Entity) -> Option<Entity>,
    ) -> AttackOutcome;
}

/// The attack an enemy carries.
#[derive(Component, Debug, Clone)]
pub enum EnemyAttack {
    Melee(MeleeStrike),
    Ranged(RangedVolley),
}

impl EnemyAttack {
    /// `true` the first time a configured trigger is found missing.
    fn warn_missing_trigger_once(&mut self) -> bool {
        match self {
            EnemyAttack::Melee(strike) => strike.take_missing_trigger_warning(),
            EnemyAttack::Ranged(_) => false,
        }
    }
}

impl AttackStrategy for EnemyAttack {
    fn on_target_acquired(&mut self, target_layer: Group) {
        match self {
            EnemyAttack::Melee(strike) => strike.on_target_acquired(target_layer),
            EnemyAttack::Ranged(volley) => volley.on_target_acquired(target_layer),
        }
    }

    fn try_attack(
        &mut self,
        ctx: &AttackContext,
        world: &dyn CollisionQueries,
        resolve: &dyn Fn(Entity) -> Option<Entity>,
    ) -> AttackOutcome {
        match self {
            EnemyAttack::Melee(strike) => strike.try_attack(ctx, world, resolve),
            EnemyAttack::Ranged(volley) => volley.try_attack(ctx, world, resolve),
        }
    }
}

/// Returns `mask`, or every layer with a warning when it is still empty.
pub(crate) fn mask_or_default(mask: Group, what: &str, attacker: Entity) -> Group {
    if mask.is_empty() {
        warn!("{attacker:?} has no {what} mask set; using all layers");
        Group::ALL
    } else {
        mask
    }
}

/// `root` and every descendant that carries a collider.
pub fn collider_tree(
    root: Entity,
    colliders: &Query<(), With<Collider>>,
    children: &Query<&Children>,
) -> Vec<Entity> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(entity) = stack.pop() {
        if colliders.contains(entity) {
            out.push(entity);
        }
        if let Ok(kids) = children.get(entity) {
            stack.extend(kids.iter());
        }
    }
    out
}

/// Layer set of `root` and all of its descendant colliders.
pub fn tree_layer(
    root: Entity,
    groups: &Query<&CollisionGroups>,
    colliders: &Query<(), With<Collider>>,
    children: &Query<&Children>,
) -> Group {
    let mut layer = layer_of(groups.get(root).ok());
    for collider in collider_tree(root, colliders, children) {
        layer |= layer_of(groups.get(collider).ok());
    }
    layer
}

/// Derives empty masks when a brain picks up a target.
pub fn apply_target_masks(
    mut acquired: MessageReader<TargetAcquired>,
    mut attacks: Query<&mut EnemyAttack>,
    groups: Query<&CollisionGroups>,
    colliders: Query<(), With<Collider>>,
    children: Query<&Children>,
) {
    for event in acquired.read() {
        let Ok(mut attack) = attacks.get_mut(event.enemy) else {
            continue;
        };
        let layer = tree_layer(event.target, &groups, &colliders, &children);
        attack.on_target_acquired(layer);
    }
}

/// Attacker-side components [`AttackResolver`] reads and writes.
#[derive(QueryData)]
#[query_data(mutable)]
pub struct Attacker {
    pub transform: &'static Transform,
    pub brain: &'static mut EnemyBrain,
    pub attack: &'static mut EnemyAttack,
    pub suppression: &'static mut CollisionSuppression,
    pub animation: Option<&'static mut ActorAnimationState>,
    pub attack_animation: Option<&'static mut AttackAnimation>,
    pub params: Option<&'static mut AnimatorParameters>,
    pub timers: Option<&'static mut ScheduledTimers>,
}

/// Everything resolving an attack request touches, apart from the physics
/// world.
#[derive(SystemParam)]
pub struct AttackResolver<'w, 's> {
    commands: Commands<'w, 's>,
    time: Res<'w, Time>,
    requests: MessageReader<'w, 's, AttackRequested>,
    damageables: Damageables<'w, 's>,
    enemies: Query<'w, 's, Attacker, With<Enemy>>,
    positions: Query<'w, 's, &'static Transform, Without<Enemy>>,
    colliders: Query<'w, 's, (), With<Collider>>,
    children: Query<'w, 's, &'static Children>,
    damage: MessageWriter<'w, DamageRequest>,
}

impl AttackResolver<'_, '_> {
    /// Runs the strategy of every pending request against `world`.
    ///
    /// Only a successful attempt stamps the brain's cooldown and applies
    /// effects; a failed one leaves the enemy free to try again next step.
    pub fn resolve_all(&mut self, world: &dyn CollisionQueries) {
        let Self {
            commands,
            time,
            requests,
            damageables,
            enemies,
            positions,
            colliders,
            children,
            damage,
        } = self;
        let now = time.elapsed_secs();
        let resolve = |hit: Entity| damageables.resolve(hit);

        for request in requests.read() {
            let Ok(attacker) = enemies.get_mut(request.enemy) else {
                continue;
            };
            let AttackerItem {
                transform,
                mut brain,
                mut attack,
                mut suppression,
                mut animation,
                attack_animation,
                mut params,
                timers,
            } = attacker;
            if !brain.enabled {
                continue;
            }
            let Ok(target_transform) = positions.get(request.target) else {
                continue;
            };

            let ctx = AttackContext {
                attacker: request.enemy,
                position: transform.translation.truncate(),
                facing: animation
                    .as_ref()
                    .map(|a| a.facing())
                    .unwrap_or_default(),
                attack_range: brain.settings.attack_range,
                target: request.target,
                target_position: target_transform.translation.truncate(),
                own_colliders: collider_tree(request.enemy, colliders, children),
                target_colliders: collider_tree(request.target, colliders, children),
            };

            let AttackOutcome::Success(effects) = attack.try_attack(&ctx, world, &resolve) else {
                continue;
            };
            brain.record_attack(now);

            damage.write_batch(effects.damage.iter().copied());
            if let EnemyAttack::Ranged(volley) = &*attack {
                for launch in effects.projectiles.iter().cloned() {
                    spawn_projectile(
                        commands,
                        &volley.template,
                        launch,
                        Some((request.enemy, &mut *suppression)),
                    );
                }
            }

            if let (Some(aim), Some(state)) = (effects.aim, animation.as_mut()) {
                let change = state.face_toward(aim);
                if let Some(p) = params.as_mut() {
                    state.apply_outputs(change, p);
                }
            }
            if let Some(trigger) = effects.trigger.as_deref() {
                let found = params
                    .as_mut()
                    .map(|p| p.try_trigger(trigger))
                    .unwrap_or(false);
                if !found && attack.warn_missing_trigger_once() {
                    warn!(
                        "{:?} animator does not declare trigger '{trigger}'",
                        request.enemy
                    );
                }
            }
            if let (Some(mut attack_animation), Some(p), Some(mut t)) =
                (attack_animation, params.as_mut(), timers)
            {
                let facing = animation.as_ref().map(|a| a.facing()).unwrap_or_default();
                attack_animation.play(facing, p, &mut t, now);
            }
        }
    }
}

/// Fixed-step system: resolves attack requests against the rapier world.
pub fn resolve_enemy_attacks(rapier: ReadRapierContext, mut resolver: AttackResolver) {
    let Ok(world) = rapier.single() else {
        return;
    };
    resolver.resolve_all(&world);
}

/// Resolves attack requests against a spatial-query resource, for worlds
/// that are not driven by rapier (scripted scenes, headless runs).
pub fn resolve_enemy_attacks_in<W: CollisionQueries + Resource>(
    world: Res<W>,
    mut resolver: AttackResolver,
) {
    resolver.resolve_all(&*world);
}
