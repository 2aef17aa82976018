//! Top-down skirmish gameplay library
//!
//! Eight-way animated actors, enemies that patrol, chase and attack (melee
//! swings or line-of-sight-checked arrows), health with death sequencing,
//! projectiles, and level outcome bookkeeping.  Everything runs as Bevy
//! systems on top of bevy_rapier2d; [`simulation::SkirmishPlugin`] wires it up.

pub mod animation;
pub mod config;
pub mod constants;
pub mod death;
pub mod direction;
pub mod enemy;
pub mod error;
pub mod health;
pub mod level;
pub mod physics;
pub mod player;
pub mod projectile;
pub mod simulation;
pub mod timers;
