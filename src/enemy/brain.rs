//! Per-step enemy decisions: patrol, chase, attack.
//!
//! ## Decision table
//!
//! | Distance to target `d`          | State    | Velocity                    |
//! |---------------------------------|----------|-----------------------------|
//! | no target                       | NoTarget | zero                        |
//! | `d > chase_range`               | Patrol   | toward current waypoint     |
//! | `attack_range < d ≤ chase_range`| Chase    | toward target               |
//! | `d ≤ attack_range`              | Attack   | zero; attack if cooled down |
//!
//! Patrol routes are cyclic.  A waypoint counts as reached when the enemy is
//! within `patrol_point_tolerance` of it before this step's move; the index
//! then advances modulo the route length.

use super::attack::AttackRequested;
use crate::config::GameplayConfig;
use crate::constants::{
    ENEMY_ATTACK_COOLDOWN, ENEMY_ATTACK_RANGE, ENEMY_CHASE_RANGE, ENEMY_MOVE_SPEED,
    FALLBACK_DEATH_DELAY, PATROL_POINT_TOLERANCE,
};
use crate::death::DeathProcess;
use crate::physics::CollisionSuppression;
use crate::player::Player;
use crate::timers::ScheduledTimers;
use bevy::prelude::*;
use bevy_rapier2d::prelude::Velocity;

/// Marker for non-player combatants.
#[derive(Component, Debug, Default, Clone, Copy)]
#[require(ScheduledTimers, DeathProcess, CollisionSuppression)]
pub struct Enemy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum BehaviorState {
    #[default]
    NoTarget,
    Patrol,
    Chase,
    Attack,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorSettings {
    pub move_speed: f32,
    pub chase_range: f32,
    pub attack_range: f32,
    pub patrol_point_tolerance: f32,
    pub attack_cooldown: f32,
    /// Despawn delay of the generic death path.
    pub fallback_death_delay: f32,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            move_speed: ENEMY_MOVE_SPEED,
            chase_range: ENEMY_CHASE_RANGE,
            attack_range: ENEMY_ATTACK_RANGE,
            patrol_point_tolerance: PATROL_POINT_TOLERANCE,
            attack_cooldown: ENEMY_ATTACK_COOLDOWN,
            fallback_death_delay: FALLBACK_DEATH_DELAY,
        }
    }
}

impl From<&GameplayConfig> for BehaviorSettings {
    fn from(config: &GameplayConfig) -> Self {
        Self {
            move_speed: config.enemy_move_speed,
            chase_range: config.enemy_chase_range,
            attack_range: config.enemy_attack_range,
            patrol_point_tolerance: config.patrol_point_tolerance,
            attack_cooldown: config.enemy_attack_cooldown,
            fallback_death_delay: config.fallback_death_delay,
        }
    }
}

/// Cyclic list of world-space waypoints.
#[derive(Component, Debug, Clone, Default)]
pub struct PatrolRoute(pub Vec<Vec2>);

/// What one evaluation decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub state: BehaviorState,
    pub velocity: Vec2,
    /// In range and cooled down: the attack strategy should be tried.
    pub attack: bool,
}

#[derive(Component, Debug, Clone)]
pub struct EnemyBrain {
    /// Cleared on death; a disabled brain makes no decisions.
    pub enabled: bool,
    pub settings: BehaviorSettings,
    state: BehaviorState,
    target: Option<Entity>,
    last_attack_at: Option<f32>,
    patrol_index: usize,
}

impl Default for EnemyBrain {
    fn default() -> Self {
        Self::new(BehaviorSettings::default())
    }
}

impl EnemyBrain {
    pub fn new(settings: BehaviorSettings) -> Self {
        Self {
            enabled: true,
            settings,
            state: BehaviorState::NoTarget,
            target: None,
            last_attack_at: None,
            patrol_index: 0,
        }
    }

    pub fn state(&self) -> BehaviorState {
        self.state
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn patrol_index(&self) -> usize {
        self.patrol_index
    }

    pub fn last_attack_at(&self) -> Option<f32> {
        self.last_attack_at
    }

    /// Sets the target.  Returns `true` when it differs from the current one.
    pub fn set_target(&mut self, target: Option<Entity>) -> bool {
        let changed = self.target != target;
        self.target = target;
        changed
    }

    pub fn classify(&self, distance: f32) -> BehaviorState {
        if distance > self.settings.chase_range {
            BehaviorState::Patrol
        } else if distance > self.settings.attack_range {
            BehaviorState::Chase
        } else {
            BehaviorState::Attack
        }
    }

    /// The first attack is always allowed.
    pub fn can_attack(&self, now: f32) -> bool {
        self.last_attack_at
            .is_none_or(|last| now >= last + self.settings.attack_cooldown)
    }

    pub fn record_attack(&mut self, now: f32) {
        self.last_attack_at = Some(now);
    }

    /// Decides this step's state and velocity.
    pub fn evaluate(
        &mut self,
        position: Vec2,
        target_position: Option<Vec2>,
        route: &[Vec2],
        now: f32,
    ) -> Decision {
        let Some(target_position) = target_position else {
            self.state = BehaviorState::NoTarget;
            return Decision {
                state: self.state,
                velocity: Vec2::ZERO,
                attack: false,
            };
        };

        let distance = position.distance(target_position);
        self.state = self.classify(distance);
        let (velocity, attack) = match self.state {
            BehaviorState::Patrol => (self.patrol_velocity(position, route), false),
            BehaviorState::Chase => (
                (target_position - position).normalize_or_zero() * self.settings.move_speed,
                false,
            ),
            BehaviorState::Attack => (Vec2::ZERO, self.can_attack(now)),
            BehaviorState::NoTarget => (Vec2::ZERO, false),
        };
        Decision {
            state: self.state,
            velocity,
            attack,
        }
    }

    fn patrol_velocity(&mut self, position: Vec2, route: &[Vec2]) -> Vec2 {
        if route.is_empty() {
            return Vec2::ZERO;
        }
        if self.patrol_index >= route.len() {
            self.patrol_index = 0;
        }
        let waypoint = route[self.patrol_index];
        let velocity = (waypoint - position).normalize_or_zero() * self.settings.move_speed;
        if position.distance(waypoint) <= self.settings.patrol_point_tolerance {
            self.patrol_index = (self.patrol_index + 1) % route.len();
        }
        velocity
    }
}

/// The brain picked up a (new) target.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetAcquired {
    pub enemy: Entity,
    pub target: Entity,
}

/// Fixed-step system: acquire targets, steer, and request attacks.
#[allow(clippy::type_complexity)]
pub fn enemy_decision_system(
    time: Res<Time>,
    mut enemies: Query<
        (
            Entity,
            &Transform,
            &mut EnemyBrain,
            &mut Velocity,
            Option<&PatrolRoute>,
        ),
        With<Enemy>,
    >,
    players: Query<Entity, With<Player>>,
    positions: Query<&Transform, Without<Enemy>>,
    mut acquired: MessageWriter<TargetAcquired>,
    mut attacks: MessageWriter<AttackRequested>,
) {
    let now = time.elapsed_secs();
    let player = players.iter().next();

    for (entity, transform, mut brain, mut velocity, route) in enemies.iter_mut() {
        if !brain.enabled {
            continue;
        }
        if brain.target().is_some_and(|t| positions.get(t).is_err()) {
            brain.set_target(None);
        }
        if brain.target().is_none() {
            if let Some(player) = player {
                brain.set_target(Some(player));
                acquired.write(TargetAcquired {
                    enemy: entity,
                    target: player,
                });
            }
        }

        let target_position = brain
            .target()
            .and_then(|t| positions.get(t).ok())
            .map(|t| t.translation.truncate());
        let route = route.map(|r| r.0.as_slice()).unwrap_or(&[]);
        let previous = brain.state();
        let decision = brain.evaluate(transform.translation.truncate(), target_position, route, now);
        if decision.state != previous {
            debug!("{entity:?} {:?} → {:?}", previous, decision.state);
        }
        velocity.linvel = decision.velocity;

        if decision.attack {
            if let Some(target) = brain.target() {
                attacks.write(AttackRequested {
                    enemy: entity,
                    target,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brain() -> EnemyBrain {
        EnemyBrain::default()
    }

    #[test]
    fn classify_by_range() {
        let b = brain();
        assert_eq!(b.classify(10.0), BehaviorState::Patrol);
        assert_eq!(b.classify(6.0), BehaviorState::Chase);
        assert_eq!(b.classify(1.26), BehaviorState::Chase);
        assert_eq!(b.classify(1.25), BehaviorState::Attack);
        assert_eq!(b.classify(0.0), BehaviorState::Attack);
    }

    #[test]
    fn no_target_stops() {
        let mut b = brain();
        let d = b.evaluate(Vec2::ZERO, None, &[Vec2::X], 0.0);
        assert_eq!(d.state, BehaviorState::NoTarget);
        assert_eq!(d.velocity, Vec2::ZERO);
        assert!(!d.attack);
    }

    #[test]
    fn chase_moves_at_move_speed_toward_target() {
        let mut b = brain();
        let d = b.evaluate(Vec2::ZERO, Some(Vec2::new(3.0, 4.0)), &[], 0.0);
        assert_eq!(d.state, BehaviorState::Chase);
        assert!((d.velocity.length() - ENEMY_MOVE_SPEED).abs() < 1e-5);
        assert!((d.velocity.normalize() - Vec2::new(0.6, 0.8)).length() < 1e-5);
    }

    #[test]
    fn attack_respects_cooldown() {
        let mut b = brain();
        let target = Some(Vec2::new(1.0, 0.0));
        assert!(b.evaluate(Vec2::ZERO, target, &[], 0.0).attack);
        b.record_attack(0.0);
        let d = b.evaluate(Vec2::ZERO, target, &[], 1.0);
        assert_eq!(d.state, BehaviorState::Attack);
        assert_eq!(d.velocity, Vec2::ZERO);
        assert!(!d.attack);
        assert!(b.evaluate(Vec2::ZERO, target, &[], 1.25).attack);
    }

    #[test]
    fn failed_attack_keeps_cooldown_available() {
        let mut b = brain();
        let target = Some(Vec2::new(1.0, 0.0));
        assert!(b.evaluate(Vec2::ZERO, target, &[], 0.0).attack);
        // No record_attack: the next step may try again.
        assert!(b.evaluate(Vec2::ZERO, target, &[], 0.02).attack);
    }

    #[test]
    fn patrol_advances_cyclically() {
        let mut b = brain();
        let far = Some(Vec2::new(100.0, 0.0));
        let route = [Vec2::new(0.0, 0.0), Vec2::new(5.0, 0.0)];

        // Standing on waypoint 0: advance to 1 while still heading for 0.
        b.evaluate(Vec2::new(0.05, 0.0), far, &route, 0.0);
        assert_eq!(b.patrol_index(), 1);

        let d = b.evaluate(Vec2::new(1.0, 0.0), far, &route, 0.0);
        assert_eq!(d.state, BehaviorState::Patrol);
        assert!(d.velocity.x > 0.0);
        assert_eq!(b.patrol_index(), 1);

        b.evaluate(Vec2::new(5.0, 0.0), far, &route, 0.0);
        assert_eq!(b.patrol_index(), 0);
    }

    #[test]
    fn patrol_without_route_stands_still() {
        let mut b = brain();
        let d = b.evaluate(Vec2::ZERO, Some(Vec2::new(50.0, 0.0)), &[], 0.0);
        assert_eq!(d.state, BehaviorState::Patrol);
        assert_eq!(d.velocity, Vec2::ZERO);
    }
}
