//! Core error types.
//!
//! Nothing in the behaviour core is fatal: a misconfigured actor must never
//! stall the simulation for everyone else.  Errors therefore only surface from
//! configuration loading and validation, where the caller logs them and keeps
//! the compiled defaults.
//!
//! ## Usage
//!
//! ```rust
//! use skirmish::error::{validate_ranges, CoreResult};
//!
//! fn check(chase: f32, attack: f32) -> CoreResult<()> {
//!     validate_ranges(chase, attack)?;
//!     Ok(())
//! }
//! # assert!(check(6.0, 1.25).is_ok());
//! ```

use std::fmt;

/// Top-level error enum for the skirmish core.
#[derive(Debug)]
pub enum CoreError {
    /// The configuration file exists but could not be read.
    ConfigRead {
        /// Path that was attempted.
        path: String,
        /// Underlying I/O failure, rendered.
        message: String,
    },

    /// The configuration file is not valid TOML for [`crate::config::GameplayConfig`].
    ConfigParse {
        /// Path of the offending file.
        path: String,
        /// Parser diagnostic.
        message: String,
    },

    /// A tunable is outside its safe operating range.
    UnsafeValue {
        /// Name of the value (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the safe range.
        safe_range: &'static str,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::ConfigRead { path, message } => {
                write!(f, "could not read '{}': {}", path, message)
            }
            CoreError::ConfigParse { path, message } => {
                write!(f, "could not parse '{}': {}", path, message)
            }
            CoreError::UnsafeValue {
                name,
                value,
                safe_range,
            } => write!(
                f,
                "value '{}' = {} is outside safe range {}",
                name, value, safe_range
            ),
        }
    }
}

impl std::error::Error for CoreError {}

/// Convenience alias: a `Result` using `CoreError` as the error type.
pub type CoreResult<T> = Result<T, CoreError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Returns an error if `value` is not strictly positive.
pub fn validate_positive(name: &'static str, value: f32) -> CoreResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CoreError::UnsafeValue {
            name,
            value,
            safe_range: "(0.0, ∞)",
        })
    }
}

/// Returns an error if `value` is negative (zero is allowed).
pub fn validate_non_negative(name: &'static str, value: f32) -> CoreResult<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CoreError::UnsafeValue {
            name,
            value,
            safe_range: "[0.0, ∞)",
        })
    }
}

/// Returns an error unless `0 < attack_range < chase_range`.
///
/// With the attack range at or beyond the chase range an enemy would never
/// chase: it would flip straight from patrol to attack.
pub fn validate_ranges(chase_range: f32, attack_range: f32) -> CoreResult<()> {
    validate_positive("attack_range", attack_range)?;
    if attack_range < chase_range {
        Ok(())
    } else {
        Err(CoreError::UnsafeValue {
            name: "chase_range",
            value: chase_range,
            safe_range: "(attack_range, ∞)",
        })
    }
}
