//! Animation state exposed to the presentation layer.
//!
//! | Module        | Responsibility                                          |
//! |---------------|---------------------------------------------------------|
//! | `params`      | Named bool/trigger table the sprite animator reads      |
//! | `locomotion`  | Facing + movement category from velocity, per frame     |
//! | `attack`      | Attack pose with timed reset                            |

pub mod attack;
pub mod locomotion;
pub mod params;

pub use attack::{reset_attack_poses, AttackAnimation};
pub use locomotion::{
    update_actor_animation, ActorAnimationState, AnimationChange, LocomotionMode,
    LocomotionSettings,
};
pub use params::{AnimatorParameters, ParamKind};
