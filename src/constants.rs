//! Centralised gameplay and behaviour constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place without source-diving across multiple modules.
//!
//! [`crate::config::GameplayConfig`] mirrors every value below and may override
//! any of them from `assets/gameplay.toml`; these constants stay the
//! authoritative defaults.
//!
//! World units are "tiles": one unit is one floor tile of the top-down map.

// ── Animation: Locomotion ─────────────────────────────────────────────────────

/// Speed (u/s) below which an actor counts as standing still.
///
/// Below this the facing direction is not recomputed; the last movement
/// vector is reused so the actor keeps looking where it last walked.
pub const VELOCITY_THRESHOLD: f32 = 0.05;

/// Dot-product magnitude a movement vector needs against the facing axis (or
/// its perpendicular) to be labelled run / run-backward / strafe.
pub const MOVEMENT_DOT_THRESHOLD: f32 = 0.45;

/// Squared length under which a vector is treated as "no direction".
pub const DIRECTION_EPSILON_SQ: f32 = 1e-6;

// ── Animation: Attack ─────────────────────────────────────────────────────────

/// Seconds a melee attack pose stays raised before it is cleared.
pub const MELEE_ATTACK_RESET_DELAY: f32 = 0.75;

/// Seconds a ranged attack pose stays raised before it is cleared.
pub const RANGED_ATTACK_RESET_DELAY: f32 = 0.6;

// ── Health ────────────────────────────────────────────────────────────────────

/// Default hit points for any damageable actor.
pub const DEFAULT_MAX_HEALTH: i32 = 5;

// ── Death ─────────────────────────────────────────────────────────────────────

/// Seconds between the start of a death sequence and the despawn.
///
/// Long enough for a typical death clip to play out.  `0.0` despawns in the
/// same frame the sequence starts.
pub const DEATH_DESPAWN_DELAY: f32 = 1.25;

/// Despawn delay used by enemies that carry no death sequencer and fall back
/// to the generic death path.
pub const FALLBACK_DEATH_DELAY: f32 = 1.25;

// ── Enemy: Movement ───────────────────────────────────────────────────────────

/// Enemy walk/chase speed (u/s).
pub const ENEMY_MOVE_SPEED: f32 = 1.75;

/// Distance at which an enemy stops patrolling and starts chasing its target.
pub const ENEMY_CHASE_RANGE: f32 = 6.0;

/// Distance at which an enemy stops and attacks.  Must stay below
/// [`ENEMY_CHASE_RANGE`].
pub const ENEMY_ATTACK_RANGE: f32 = 1.25;

/// Distance to a patrol waypoint that counts as "arrived".
pub const PATROL_POINT_TOLERANCE: f32 = 0.1;

// ── Enemy: Combat ─────────────────────────────────────────────────────────────

/// Minimum seconds between two successful enemy attacks.
pub const ENEMY_ATTACK_COOLDOWN: f32 = 1.25;

/// Damage dealt by one melee swing to each damageable in reach.
pub const MELEE_DAMAGE: i32 = 1;

/// Radius of the melee hit circle around the attack origin.
pub const MELEE_ATTACK_RADIUS: f32 = 1.0;

/// Speed of arrows fired by ranged enemies (u/s).
pub const RANGED_PROJECTILE_SPEED: f32 = 8.0;

/// Distance the firing point is pushed along the aim before the
/// line-of-sight ray and the projectile start, so neither begins inside the
/// shooter's own collider.
pub const MUZZLE_OFFSET: f32 = 0.1;

/// Extra ray length beyond the attack range for line-of-sight checks.
pub const LINE_OF_SIGHT_PADDING: f32 = 0.5;

// ── Projectile ────────────────────────────────────────────────────────────────

/// Base projectile speed when no override is given at initialisation (u/s).
pub const PROJECTILE_SPEED: f32 = 6.0;

/// Damage a projectile delivers on its first qualifying hit.
pub const PROJECTILE_DAMAGE: i32 = 1;

/// Seconds a projectile lives without hitting anything.  `0.0` means the
/// projectile never expires on its own.
pub const PROJECTILE_LIFETIME: f32 = 5.0;

/// Collider radius of a projectile.
pub const PROJECTILE_COLLIDER_RADIUS: f32 = 0.08;

// ── Player ────────────────────────────────────────────────────────────────────

/// Player walking speed (u/s).
pub const PLAYER_SPEED: f32 = 2.0;

/// Player speed while crouching (u/s).
pub const PLAYER_CROUCH_SPEED: f32 = 1.0;

/// Player projectile speed (u/s).
pub const PLAYER_PROJECTILE_SPEED: f32 = 10.0;

/// Delay between the shoot input and the arrow leaving the bow.
pub const PLAYER_SHOOT_DELAY: f32 = 0.5;

/// Wind-up before a quickshot or circle-shot volley starts.
pub const VOLLEY_WIND_UP: f32 = 0.1;

/// Arrows in one quickshot volley.
pub const QUICKSHOT_COUNT: u32 = 5;

/// Seconds between quickshot arrows.
pub const QUICKSHOT_INTERVAL: f32 = 0.18;

/// Arrows in one circle-shot volley (one per compass point).
pub const CIRCLE_SHOT_COUNT: u32 = 8;

/// Total seconds a circle-shot volley takes to complete.
pub const CIRCLE_SHOT_DURATION: f32 = 0.9;

/// Delay between the area-effect input and the effect appearing.
pub const AREA_EFFECT_DELAY: f32 = 0.3;

/// Seconds a deployed area effect stays before it is removed.
pub const AREA_EFFECT_LIFETIME: f32 = 0.5;

/// Radius of a deployed area effect.
pub const AREA_EFFECT_RADIUS: f32 = 1.0;

/// Player collider radius.
pub const PLAYER_COLLIDER_RADIUS: f32 = 0.3;

/// Enemy collider radius.
pub const ENEMY_COLLIDER_RADIUS: f32 = 0.3;
