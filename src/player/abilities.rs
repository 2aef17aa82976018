//! Player ranged abilities.
//!
//! | Ability      | Wind-up            | Shots                                     |
//! |--------------|--------------------|-------------------------------------------|
//! | `Shoot`      | `shoot_delay`      | one, along the heading                    |
//! | `Quickshot`  | `volley_wind_up`   | `quickshot_count`, `quickshot_interval` apart |
//! | `CircleShot` | `volley_wind_up`   | `circle_shot_count` at 45° steps over `circle_shot_duration` |
//! | `AreaEffect` | `area_effect_delay` | none; an [`AreaEffect`] zone at the player's feet for `area_effect_lifetime` |
//!
//! Every shot is released by a [`TimerPurpose::PlayerShot`] or
//! [`TimerPurpose::PlayerVolley`] deadline and the area effect by
//! [`TimerPurpose::AreaEffectDeploy`], so a death sequence (which cancels all
//! timers) also cancels anything queued.  Shots read the heading at release
//! time, not at trigger time.  Starting a volley replaces the running one.

use super::{Player, PlayerController};
use crate::config::GameplayConfig;
use crate::physics::{CollisionSuppression, ENEMY_LAYER, TRIGGER_LAYER};
use crate::projectile::{spawn_projectile, ProjectileLaunch};
use crate::timers::{ScheduledTimers, TimerElapsed, TimerPurpose};
use bevy::prelude::*;
use bevy_rapier2d::prelude::{Collider, CollisionGroups, Sensor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ability {
    Shoot,
    Quickshot,
    CircleShot,
    AreaEffect,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilityTriggered {
    pub player: Entity,
    pub ability: Ability,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct VolleyPlan {
    fired: u32,
    count: u32,
    interval: f32,
    /// Added to the heading for each successive shot.
    step_degrees: f32,
}

impl VolleyPlan {
    fn angle_of_next(&self, heading: f32) -> f32 {
        heading + self.fired as f32 * self.step_degrees
    }
}

/// The volley in flight, if any.
#[derive(Component, Debug, Clone, Default)]
pub struct PlayerVolley {
    plan: Option<VolleyPlan>,
}

impl PlayerVolley {
    pub fn is_active(&self) -> bool {
        self.plan.is_some()
    }

    pub fn shots_fired(&self) -> u32 {
        self.plan.map(|p| p.fired).unwrap_or(0)
    }

    fn start(&mut self, ability: Ability, config: &GameplayConfig) {
        self.plan = match ability {
            Ability::Shoot | Ability::AreaEffect => None,
            Ability::Quickshot => Some(VolleyPlan {
                fired: 0,
                count: config.quickshot_count,
                interval: config.quickshot_interval,
                step_degrees: 0.0,
            }),
            Ability::CircleShot => Some(VolleyPlan {
                fired: 0,
                count: config.circle_shot_count,
                interval: config.circle_shot_duration / config.circle_shot_count.max(1) as f32,
                step_degrees: 45.0,
            }),
        };
    }

    /// Consumes one shot.  Returns its angle offset from the heading and the
    /// delay until the next one, if any remains.
    fn release(&mut self, heading: f32) -> Option<(f32, Option<f32>)> {
        let plan = self.plan.as_mut()?;
        if plan.fired >= plan.count {
            self.plan = None;
            return None;
        }
        let angle = plan.angle_of_next(heading);
        plan.fired += 1;
        if plan.fired < plan.count {
            Some((angle, Some(plan.interval)))
        } else {
            self.plan = None;
            Some((angle, None))
        }
    }
}

/// Queues the requested abilities.
pub fn trigger_abilities(
    time: Res<Time>,
    config: Res<GameplayConfig>,
    mut triggered: MessageReader<AbilityTriggered>,
    mut players: Query<(&PlayerController, &mut PlayerVolley, &mut ScheduledTimers), With<Player>>,
) {
    let now = time.elapsed_secs();
    for event in triggered.read() {
        let Ok((controller, mut volley, mut timers)) = players.get_mut(event.player) else {
            continue;
        };
        if !controller.enabled {
            continue;
        }
        match event.ability {
            Ability::Shoot => {
                timers.schedule(TimerPurpose::PlayerShot, now, controller.shoot_delay);
            }
            Ability::Quickshot | Ability::CircleShot => {
                volley.start(event.ability, &config);
                timers.schedule(TimerPurpose::PlayerVolley, now, config.volley_wind_up);
            }
            Ability::AreaEffect => {
                timers.schedule(TimerPurpose::AreaEffectDeploy, now, config.area_effect_delay);
            }
        }
        debug!("{:?} triggered {:?}", event.player, event.ability);
    }
}

/// Releases due player shots.
pub fn fire_player_shots(
    mut commands: Commands,
    time: Res<Time>,
    mut elapsed: MessageReader<TimerElapsed>,
    mut players: Query<
        (
            &Transform,
            &PlayerController,
            &mut PlayerVolley,
            &mut ScheduledTimers,
            &mut CollisionSuppression,
        ),
        With<Player>,
    >,
) {
    let now = time.elapsed_secs();
    for event in elapsed.read() {
        let Ok((transform, controller, mut volley, mut timers, mut suppression)) =
            players.get_mut(event.entity)
        else {
            continue;
        };
        if !controller.enabled {
            continue;
        }
        let angle = match event.purpose {
            TimerPurpose::PlayerShot => controller.heading(),
            TimerPurpose::PlayerVolley => {
                let Some((angle, next)) = volley.release(controller.heading()) else {
                    continue;
                };
                if let Some(delay) = next {
                    timers.schedule(TimerPurpose::PlayerVolley, now, delay);
                }
                angle
            }
            _ => continue,
        };

        spawn_projectile(
            &mut commands,
            &controller.template,
            ProjectileLaunch {
                origin: transform.translation.truncate(),
                direction: Vec2::from_angle(angle.to_radians()),
                speed: Some(controller.projectile_speed),
                mask: None,
            },
            Some((event.entity, &mut *suppression)),
        );
    }
}

/// Short-lived sensor zone dropped by [`Ability::AreaEffect`].
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
#[require(ScheduledTimers)]
pub struct AreaEffect {
    pub owner: Entity,
}

/// Places due area effects at the player's position.
pub fn deploy_area_effects(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameplayConfig>,
    mut elapsed: MessageReader<TimerElapsed>,
    players: Query<(&Transform, &PlayerController), With<Player>>,
) {
    let now = time.elapsed_secs();
    for event in elapsed.read() {
        if event.purpose != TimerPurpose::AreaEffectDeploy {
            continue;
        }
        let Ok((transform, controller)) = players.get(event.entity) else {
            continue;
        };
        if !controller.enabled {
            continue;
        }
        let mut timers = ScheduledTimers::default();
        timers.schedule(TimerPurpose::AreaEffectExpiry, now, config.area_effect_lifetime);
        commands.spawn((
            Name::new("Area Effect"),
            AreaEffect {
                owner: event.entity,
            },
            timers,
            Transform::from_translation(transform.translation),
            Collider::ball(config.area_effect_radius),
            Sensor,
            CollisionGroups::new(TRIGGER_LAYER, ENEMY_LAYER),
        ));
    }
}

/// Removes area effects whose lifetime ran out.
pub fn expire_area_effects(
    mut commands: Commands,
    mut elapsed: MessageReader<TimerElapsed>,
    effects: Query<(), With<AreaEffect>>,
) {
    for event in elapsed.read() {
        if event.purpose == TimerPurpose::AreaEffectExpiry && effects.contains(event.entity) {
            commands.entity(event.entity).try_despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(volley: &mut PlayerVolley, heading: f32) -> Vec<(f32, Option<f32>)> {
        std::iter::from_fn(|| volley.release(heading)).collect()
    }

    #[test]
    fn quickshot_fires_five_along_heading() {
        let config = GameplayConfig::default();
        let mut v = PlayerVolley::default();
        v.start(Ability::Quickshot, &config);
        let shots = drain(&mut v, 90.0);
        assert_eq!(shots.len(), 5);
        assert!(shots.iter().all(|(angle, _)| *angle == 90.0));
        assert_eq!(shots[0].1, Some(config.quickshot_interval));
        assert_eq!(shots[4].1, None);
        assert!(!v.is_active());
    }

    #[test]
    fn circle_shot_spreads_eight_over_duration() {
        let config = GameplayConfig::default();
        let mut v = PlayerVolley::default();
        v.start(Ability::CircleShot, &config);
        let shots = drain(&mut v, 0.0);
        let angles: Vec<f32> = shots.iter().map(|(a, _)| *a).collect();
        assert_eq!(angles, vec![0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0]);
        let interval = shots[0].1.unwrap();
        assert!((interval * 8.0 - config.circle_shot_duration).abs() < 1e-5);
    }

    #[test]
    fn restarting_replaces_running_volley() {
        let config = GameplayConfig::default();
        let mut v = PlayerVolley::default();
        v.start(Ability::Quickshot, &config);
        v.release(0.0);
        v.release(0.0);
        assert_eq!(v.shots_fired(), 2);
        v.start(Ability::Quickshot, &config);
        assert_eq!(v.shots_fired(), 0);
    }

    #[test]
    fn area_effect_starts_no_volley() {
        let mut v = PlayerVolley::default();
        v.start(Ability::AreaEffect, &GameplayConfig::default());
        assert!(!v.is_active());
    }

    #[test]
    fn idle_volley_releases_nothing() {
        let mut v = PlayerVolley::default();
        assert_eq!(v.release(0.0), None);
    }
}
