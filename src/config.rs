//! Runtime gameplay configuration loaded from `assets/gameplay.toml`.
//!
//! [`GameplayConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`].  At startup, [`load_gameplay_config`] reads
//! `assets/gameplay.toml` and overwrites the defaults with any values present
//! in the file.  Missing keys fall back to the compile-time defaults, so a
//! minimal TOML can override just the values you care about.
//!
//! ## Usage
//!
//! Spawn helpers (`spawn_melee_enemy`, `spawn_player`, …) take `&GameplayConfig` and
//! copy the relevant values into the per-actor settings components, so a
//! single actor can still be tuned after it is spawned without touching the
//! global resource.
//!
//! ## Tuning workflow
//!
//! 1. Edit `assets/gameplay.toml`.
//! 2. Restart the game; no recompilation required.
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `GameplayConfig::default()`.

use crate::constants::*;
use crate::error::{
    validate_non_negative, validate_positive, validate_ranges, CoreError, CoreResult,
};
use bevy::prelude::*;
use serde::Deserialize;

/// Path the startup loader reads from.
pub const GAMEPLAY_CONFIG_PATH: &str = "assets/gameplay.toml";

/// Runtime-tunable gameplay configuration.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    // ── Animation ─────────────────────────────────────────────────────────────
    pub velocity_threshold: f32,
    pub movement_dot_threshold: f32,
    pub melee_attack_reset_delay: f32,
    pub ranged_attack_reset_delay: f32,

    // ── Health / Death ────────────────────────────────────────────────────────
    pub default_max_health: i32,
    pub death_despawn_delay: f32,
    pub fallback_death_delay: f32,

    // ── Enemy ─────────────────────────────────────────────────────────────────
    pub enemy_move_speed: f32,
    pub enemy_chase_range: f32,
    pub enemy_attack_range: f32,
    pub patrol_point_tolerance: f32,
    pub enemy_attack_cooldown: f32,
    pub melee_damage: i32,
    pub melee_attack_radius: f32,
    pub ranged_projectile_speed: f32,
    pub muzzle_offset: f32,
    pub line_of_sight_padding: f32,
    pub enemy_collider_radius: f32,

    // ── Projectile ────────────────────────────────────────────────────────────
    pub projectile_speed: f32,
    pub projectile_damage: i32,
    pub projectile_lifetime: f32,
    pub projectile_collider_radius: f32,

    // ── Player ────────────────────────────────────────────────────────────────
    pub player_speed: f32,
    pub player_crouch_speed: f32,
    pub player_projectile_speed: f32,
    pub player_shoot_delay: f32,
    pub volley_wind_up: f32,
    pub quickshot_count: u32,
    pub quickshot_interval: f32,
    pub circle_shot_count: u32,
    pub circle_shot_duration: f32,
    pub area_effect_delay: f32,
    pub area_effect_lifetime: f32,
    pub area_effect_radius: f32,
    pub player_collider_radius: f32,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            // Animation
            velocity_threshold: VELOCITY_THRESHOLD,
            movement_dot_threshold: MOVEMENT_DOT_THRESHOLD,
            melee_attack_reset_delay: MELEE_ATTACK_RESET_DELAY,
            ranged_attack_reset_delay: RANGED_ATTACK_RESET_DELAY,
            // Health / Death
            default_max_health: DEFAULT_MAX_HEALTH,
            death_despawn_delay: DEATH_DESPAWN_DELAY,
            fallback_death_delay: FALLBACK_DEATH_DELAY,
            // Enemy
            enemy_move_speed: ENEMY_MOVE_SPEED,
            enemy_chase_range: ENEMY_CHASE_RANGE,
            enemy_attack_range: ENEMY_ATTACK_RANGE,
            patrol_point_tolerance: PATROL_POINT_TOLERANCE,
            enemy_attack_cooldown: ENEMY_ATTACK_COOLDOWN,
            melee_damage: MELEE_DAMAGE,
            melee_attack_radius: MELEE_ATTACK_RADIUS,
            ranged_projectile_speed: RANGED_PROJECTILE_SPEED,
            muzzle_offset: MUZZLE_OFFSET,
            line_of_sight_padding: LINE_OF_SIGHT_PADDING,
            enemy_collider_radius: ENEMY_COLLIDER_RADIUS,
            // Projectile
            projectile_speed: PROJECTILE_SPEED,
            projectile_damage: PROJECTILE_DAMAGE,
            projectile_lifetime: PROJECTILE_LIFETIME,
            projectile_collider_radius: PROJECTILE_COLLIDER_RADIUS,
            // Player
            player_speed: PLAYER_SPEED,
            player_crouch_speed: PLAYER_CROUCH_SPEED,
            player_projectile_speed: PLAYER_PROJECTILE_SPEED,
            player_shoot_delay: PLAYER_SHOOT_DELAY,
            volley_wind_up: VOLLEY_WIND_UP,
            quickshot_count: QUICKSHOT_COUNT,
            quickshot_interval: QUICKSHOT_INTERVAL,
            circle_shot_count: CIRCLE_SHOT_COUNT,
            circle_shot_duration: CIRCLE_SHOT_DURATION,
            area_effect_delay: AREA_EFFECT_DELAY,
            area_effect_lifetime: AREA_EFFECT_LIFETIME,
            area_effect_radius: AREA_EFFECT_RADIUS,
            player_collider_radius: PLAYER_COLLIDER_RADIUS,
        }
    }
}

impl GameplayConfig {
    /// Rejects values that would leave an actor stuck or a timer negative.
    pub fn validate(&self) -> CoreResult<()> {
        validate_positive("velocity_threshold", self.velocity_threshold)?;
        validate_positive("movement_dot_threshold", self.movement_dot_threshold)?;
        validate_non_negative("melee_attack_reset_delay", self.melee_attack_reset_delay)?;
        validate_non_negative("ranged_attack_reset_delay", self.ranged_attack_reset_delay)?;
        if self.default_max_health <= 0 {
            return Err(CoreError::UnsafeValue {
                name: "default_max_health",
                value: self.default_max_health as f32,
                safe_range: "[1, ∞)",
            });
        }
        validate_non_negative("death_despawn_delay", self.death_despawn_delay)?;
        validate_non_negative("fallback_death_delay", self.fallback_death_delay)?;
        validate_positive("enemy_move_speed", self.enemy_move_speed)?;
        validate_ranges(self.enemy_chase_range, self.enemy_attack_range)?;
        validate_non_negative("patrol_point_tolerance", self.patrol_point_tolerance)?;
        validate_non_negative("enemy_attack_cooldown", self.enemy_attack_cooldown)?;
        validate_positive("melee_attack_radius", self.melee_attack_radius)?;
        validate_positive("ranged_projectile_speed", self.ranged_projectile_speed)?;
        validate_positive("projectile_speed", self.projectile_speed)?;
        validate_non_negative("projectile_lifetime", self.projectile_lifetime)?;
        validate_positive("player_speed", self.player_speed)?;
        validate_positive("player_crouch_speed", self.player_crouch_speed)?;
        validate_positive("player_projectile_speed", self.player_projectile_speed)?;
        validate_non_negative("player_shoot_delay", self.player_shoot_delay)?;
        validate_non_negative("quickshot_interval", self.quickshot_interval)?;
        validate_non_negative("circle_shot_duration", self.circle_shot_duration)?;
        validate_non_negative("area_effect_delay", self.area_effect_delay)?;
        validate_non_negative("area_effect_lifetime", self.area_effect_lifetime)?;
        validate_positive("area_effect_radius", self.area_effect_radius)?;
        Ok(())
    }
}

/// Parses and validates a TOML document.  `path` is only used for messages.
pub fn parse_gameplay_config(path: &str, contents: &str) -> CoreResult<GameplayConfig> {
    let config =
        toml::from_str::<GameplayConfig>(contents).map_err(|e| CoreError::ConfigParse {
            path: path.to_string(),
            message: e.to_string(),
        })?;
    config.validate()?;
    Ok(config)
}

/// Reads `path` and parses it.  `Ok(None)` when the file does not exist.
pub fn read_gameplay_config(path: &str) -> CoreResult<Option<GameplayConfig>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_gameplay_config(path, &contents).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CoreError::ConfigRead {
            path: path.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Startup system: attempt to load `assets/gameplay.toml` and overwrite the
/// `GameplayConfig` resource with any values present in the file.
///
/// Read, parse and validation errors are logged and the compiled defaults
/// stay in place.
pub fn load_gameplay_config(mut config: ResMut<GameplayConfig>) {
    match read_gameplay_config(GAMEPLAY_CONFIG_PATH) {
        Ok(Some(loaded)) => {
            *config = loaded;
            info!("Loaded gameplay config from {GAMEPLAY_CONFIG_PATH}");
        }
        Ok(None) => {
            info!("No {GAMEPLAY_CONFIG_PATH} found; using compiled defaults");
        }
        Err(e) => {
            warn!("{e}; using compiled defaults");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GameplayConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = parse_gameplay_config("test.toml", "enemy_move_speed = 3.0\n").unwrap();
        assert_eq!(cfg.enemy_move_speed, 3.0);
        assert_eq!(cfg.enemy_chase_range, ENEMY_CHASE_RANGE);
        assert_eq!(cfg.quickshot_count, QUICKSHOT_COUNT);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = parse_gameplay_config("test.toml", "").unwrap();
        assert_eq!(cfg, GameplayConfig::default());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = parse_gameplay_config("bad.toml", "enemy_move_speed = ").unwrap_err();
        assert!(matches!(err, CoreError::ConfigParse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn attack_range_beyond_chase_range_is_rejected() {
        let err = parse_gameplay_config(
            "test.toml",
            "enemy_chase_range = 1.0\nenemy_attack_range = 2.0\n",
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::UnsafeValue { .. }));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let result = read_gameplay_config("definitely/not/here/gameplay.toml").unwrap();
        assert!(result.is_none());
    }
}
