//! Eight-way direction classification.
//!
//! Maps a 2-D vector or an angle to one of eight compass facings.  The plane
//! is split into eight non-overlapping arcs; every arc includes its low
//! boundary and excludes its high one, so each angle in `[0, 360)` belongs to
//! exactly one facing.
//!
//! | Facing | `Narrow` arc       | `Stairs` arc      |
//! |--------|--------------------|-------------------|
//! | E      | `[345, 360) ∪ [0, 15)` | `[337.5, 360) ∪ [0, 22.5)` |
//! | NE     | `[15, 60)`         | `[22.5, 67.5)`    |
//! | N      | `[60, 120)`        | `[67.5, 112.5)`   |
//! | NW     | `[120, 165)`       | `[112.5, 157.5)`  |
//! | W      | `[165, 195)`       | `[157.5, 202.5)`  |
//! | SW     | `[195, 240)`       | `[202.5, 247.5)`  |
//! | S      | `[240, 300)`       | `[247.5, 292.5)`  |
//! | SE     | `[300, 345)`       | `[292.5, 337.5)`  |
//!
//! `Narrow` squeezes the horizontal facings so a top-down character reads as
//! walking up or down more often than sideways; `Stairs` is the even split
//! used on staircases.  Angles are counter-clockwise from +X (east).
//!
//! ## Heading snap
//!
//! Player input is snapped to a fixed heading by [`snap_heading`].  Off the
//! stairs the snap arcs are the `Narrow` arcs above.  On the stairs they are
//! not the even split but their own uneven arcs:
//!
//! | Arc                        | Heading |
//! |----------------------------|---------|
//! | `[330, 360) ∪ [0, 30)`     | 0       |
//! | `[30, 75)`                 | 60      |
//! | `[75, 105)`                | 90      |
//! | `[105, 150)`               | 120     |
//! | `[150, 210)`               | 180     |
//! | `[210, 255)`               | 240     |
//! | `[255, 285)`               | 270     |
//! | `[285, 330)`               | 300     |

use crate::constants::DIRECTION_EPSILON_SQ;
use bevy::prelude::*;
use std::f32::consts::FRAC_1_SQRT_2;

/// One of the eight compass facings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum Direction8 {
    #[default]
    East,
    NorthEast,
    North,
    NorthWest,
    West,
    SouthWest,
    South,
    SouthEast,
}

/// Which arc partition the classifier uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum DirectionVariant {
    #[default]
    Narrow,
    Stairs,
}

/// Upper (exclusive) bound of each arc for the narrow partition, in the order
/// E, NE, N, NW, W, SW, S, SE.  East wraps: it also owns `[345, 360)`.
const NARROW_UPPER: [f32; 8] = [15.0, 60.0, 120.0, 165.0, 195.0, 240.0, 300.0, 345.0];

/// Snapped player headings per arc.
const NARROW_HEADINGS: [f32; 8] = [0.0, 35.0, 90.0, 145.0, 180.0, 215.0, 270.0, 330.0];
const STAIRS_HEADINGS: [f32; 8] = [0.0, 60.0, 90.0, 120.0, 180.0, 240.0, 270.0, 300.0];

/// Upper bounds of the stairs snap arcs, same wrap rule as [`NARROW_UPPER`].
const STAIRS_SNAP_UPPER: [f32; 8] = [30.0, 75.0, 105.0, 150.0, 210.0, 255.0, 285.0, 330.0];

/// Index of the arc holding `angle` (already in `[0, 360)`); the first arc
/// also owns everything at or above the last bound.
fn arc_index(angle: f32, upper: &[f32; 8]) -> usize {
    if angle >= upper[7] {
        return 0;
    }
    upper.iter().position(|&u| angle < u).unwrap_or(0)
}

impl Direction8 {
    /// All facings in counter-clockwise order starting at east.
    pub const ALL: [Direction8; 8] = [
        Direction8::East,
        Direction8::NorthEast,
        Direction8::North,
        Direction8::NorthWest,
        Direction8::West,
        Direction8::SouthWest,
        Direction8::South,
        Direction8::SouthEast,
    ];

    /// Classifies an angle in degrees.  Any finite value is accepted and
    /// normalised into `[0, 360)` first.
    pub fn from_angle(degrees: f32, variant: DirectionVariant) -> Direction8 {
        let angle = normalize_degrees(degrees);
        match variant {
            DirectionVariant::Narrow => Direction8::ALL[arc_index(angle, &NARROW_UPPER)],
            DirectionVariant::Stairs => {
                // Shift by half a sector so east starts at 0.
                let sector = ((angle + 22.5) / 45.0).floor() as usize % 8;
                Direction8::ALL[sector]
            }
        }
    }

    /// Classifies a vector.  Returns `None` for a (near) zero vector so the
    /// caller decides the fallback.
    pub fn from_vector(v: Vec2, variant: DirectionVariant) -> Option<Direction8> {
        vector_degrees(v).map(|angle| Self::from_angle(angle, variant))
    }

    /// Unit vector pointing along this facing.  Diagonals are normalised.
    pub fn unit_vector(self) -> Vec2 {
        match self {
            Direction8::East => Vec2::X,
            Direction8::NorthEast => Vec2::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2),
            Direction8::North => Vec2::Y,
            Direction8::NorthWest => Vec2::new(-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
            Direction8::West => Vec2::NEG_X,
            Direction8::SouthWest => Vec2::new(-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
            Direction8::South => Vec2::NEG_Y,
            Direction8::SouthEast => Vec2::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
        }
    }

    /// Name used to build animator parameter names (`"Move" + name`).
    pub fn name(self) -> &'static str {
        match self {
            Direction8::East => "East",
            Direction8::NorthEast => "NorthEast",
            Direction8::North => "North",
            Direction8::NorthWest => "NorthWest",
            Direction8::West => "West",
            Direction8::SouthWest => "SouthWest",
            Direction8::South => "South",
            Direction8::SouthEast => "SouthEast",
        }
    }

    /// Direction flag parameter name, e.g. `"isNorthEast"`.
    pub fn flag_name(self) -> String {
        format!("is{}", self.name())
    }
}

impl DirectionVariant {
    /// `Stairs` when `on_stairs`, `Narrow` otherwise.
    pub fn for_stairs(on_stairs: bool) -> Self {
        if on_stairs {
            DirectionVariant::Stairs
        } else {
            DirectionVariant::Narrow
        }
    }
}

/// Angle of `v` in degrees, or `None` for a (near) zero or non-finite
/// vector.
pub fn vector_degrees(v: Vec2) -> Option<f32> {
    if !v.is_finite() || v.length_squared() < DIRECTION_EPSILON_SQ {
        return None;
    }
    Some(v.y.atan2(v.x).to_degrees())
}

/// Heading (degrees) that player input at `degrees` snaps to.
pub fn snap_heading(degrees: f32, variant: DirectionVariant) -> f32 {
    let angle = normalize_degrees(degrees);
    match variant {
        DirectionVariant::Narrow => NARROW_HEADINGS[arc_index(angle, &NARROW_UPPER)],
        DirectionVariant::Stairs => STAIRS_HEADINGS[arc_index(angle, &STAIRS_SNAP_UPPER)],
    }
}

/// Wraps any finite angle into `[0, 360)`.
pub fn normalize_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
