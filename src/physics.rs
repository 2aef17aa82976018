//! Collision layers and the spatial-query seam.
//!
//! Combat code never talks to the physics world directly; it asks a
//! [`CollisionQueries`] implementation for overlaps and ray hits.  The
//! production implementation wraps bevy_rapier2d's [`RapierContext`]; tests
//! drive combat with a scripted implementation instead.
//!
//! ## Layers
//!
//! | Layer        | Group      | Members                         |
//! |--------------|------------|---------------------------------|
//! | `PLAYER`     | `GROUP_1`  | player body and hit boxes       |
//! | `ENEMY`      | `GROUP_2`  | enemy bodies and hit boxes      |
//! | `PROJECTILE` | `GROUP_3`  | arrows                          |
//! | `OBSTACLE`   | `GROUP_4`  | walls, props                    |
//! | `TRIGGER`    | `GROUP_5`  | sensor zones (stairs, …)        |
//!
//! A collider's layer is the membership set of its [`CollisionGroups`]; a
//! collider without groups belongs to every layer, matching rapier's own
//! default.

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use std::collections::HashSet;

pub const PLAYER_LAYER: Group = Group::GROUP_1;
pub const ENEMY_LAYER: Group = Group::GROUP_2;
pub const PROJECTILE_LAYER: Group = Group::GROUP_3;
pub const OBSTACLE_LAYER: Group = Group::GROUP_4;
pub const TRIGGER_LAYER: Group = Group::GROUP_5;

/// Layer set of a collider.
pub fn layer_of(groups: Option<&CollisionGroups>) -> Group {
    groups.map(|g| g.memberships).unwrap_or(Group::ALL)
}

/// `true` when any of `layer`'s bits is in `mask`.
pub fn in_mask(layer: Group, mask: Group) -> bool {
    layer.intersects(mask)
}

/// One hit along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: Entity,
    pub distance: f32,
}

/// Spatial queries combat needs from the physics world.
pub trait CollisionQueries {
    /// Colliders in `mask` overlapping the circle.
    fn overlap_circle(&self, center: Vec2, radius: f32, mask: Group) -> Vec<Entity>;

    /// Colliders in `mask` crossed by the ray, nearest first.  `direction`
    /// must be a unit vector.
    fn raycast_all(&self, origin: Vec2, direction: Vec2, max_distance: f32, mask: Group)
        -> Vec<RayHit>;
}

fn mask_filter(mask: Group) -> QueryFilter<'static> {
    QueryFilter::new()
        .exclude_sensors()
        .groups(CollisionGroups::new(Group::ALL, mask))
}

impl CollisionQueries for RapierContext<'_> {
    fn overlap_circle(&self, center: Vec2, radius: f32, mask: Group) -> Vec<Entity> {
        let shape = Collider::ball(radius);
        self.with_query_pipeline(mask_filter(mask), |pipeline| {
            pipeline
                .intersect_shape(center, 0.0, &*shape.raw)
                .collect()
        })
    }

    fn raycast_all(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: Group,
    ) -> Vec<RayHit> {
        let mut hits: Vec<RayHit> = self.with_query_pipeline(mask_filter(mask), |pipeline| {
            pipeline
                .intersect_ray(origin, direction, max_distance, true)
                .map(|(entity, intersection)| RayHit {
                    entity,
                    distance: intersection.time_of_impact,
                })
                .collect()
        });
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

/// Colliders an owner must not be hit by (its own projectiles in flight).
#[derive(Component, Debug, Clone, Default)]
pub struct CollisionSuppression {
    ignored: HashSet<Entity>,
}

impl CollisionSuppression {
    pub fn ignore(&mut self, other: Entity) {
        self.ignored.insert(other);
    }

    /// Lifts the suppression.  Returns whether it was in place.
    pub fn restore(&mut self, other: Entity) -> bool {
        self.ignored.remove(&other)
    }

    pub fn ignores(&self, other: Entity) -> bool {
        self.ignored.contains(&other)
    }

    pub fn is_empty(&self) -> bool {
        self.ignored.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::fake::{self, FakeWorld};
    use super::*;

    #[test]
    fn missing_groups_is_every_layer() {
        assert_eq!(layer_of(None), Group::ALL);
        let groups = CollisionGroups::new(ENEMY_LAYER, Group::ALL);
        assert_eq!(layer_of(Some(&groups)), ENEMY_LAYER);
        assert!(in_mask(ENEMY_LAYER, ENEMY_LAYER | PLAYER_LAYER));
        assert!(!in_mask(ENEMY_LAYER, PLAYER_LAYER));
    }

    #[test]
    fn suppression_restores_once() {
        let mut s = CollisionSuppression::default();
        let e = fake::entities(1)[0];
        s.ignore(e);
        assert!(s.ignores(e));
        assert!(s.restore(e));
        assert!(!s.restore(e));
        assert!(s.is_empty());
    }

    #[test]
    fn fake_ray_orders_by_distance() {
        let ids = fake::entities(2);
        let (near, far) = (ids[0], ids[1]);
        let world = FakeWorld {
            bodies: vec![
                (far, Vec2::new(4.0, 0.0), 0.5, OBSTACLE_LAYER),
                (near, Vec2::new(2.0, 0.0), 0.5, PLAYER_LAYER),
            ],
        };
        let hits = world.raycast_all(Vec2::ZERO, Vec2::X, 10.0, Group::ALL);
        assert_eq!(hits.iter().map(|h| h.entity).collect::<Vec<_>>(), vec![near, far]);
        assert!((hits[0].distance - 1.5).abs() < 1e-5);
    }
}
