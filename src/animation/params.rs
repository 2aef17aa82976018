//! Named animator parameters.
//!
//! The presentation side (sprite sheets, blend trees) is driven through a flat
//! set of named booleans and triggers, declared once when the actor is built.
//! Writers never fail on an unknown name: they report "not found" and move on,
//! so one rig can leave out the outputs it has no clips for.

use crate::direction::Direction8;
use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Bool,
    Trigger,
}

/// Locomotion output prefixes, one bool per (prefix × facing).
pub const LOCOMOTION_PREFIXES: [&str; 5] =
    ["Move", "Walk", "RunBackwards", "StrafeLeft", "StrafeRight"];

/// Mutually exclusive locomotion flags.
pub const LOCOMOTION_FLAGS: [&str; 5] = [
    "isWalking",
    "isRunning",
    "isRunningBackwards",
    "isStrafingLeft",
    "isStrafingRight",
];

pub const ATTACKING_FLAG: &str = "isAttackAttacking";
pub const DIE_TRIGGER: &str = "Die";
pub const DEAD_FLAG: &str = "isDead";

/// Parameter table attached to an animated actor.
#[derive(Component, Debug, Default, Clone)]
pub struct AnimatorParameters {
    declared: HashMap<String, ParamKind>,
    bools: HashMap<String, bool>,
    pending_triggers: HashSet<String>,
}

impl AnimatorParameters {
    pub fn new<I, S>(params: I) -> Self
    where
        I: IntoIterator<Item = (S, ParamKind)>,
        S: Into<String>,
    {
        let mut out = Self::default();
        for (name, kind) in params {
            out.declare(name, kind);
        }
        out
    }

    /// The parameter set of a standard eight-way character rig: every
    /// locomotion output, every direction flag, the death outputs, plus the
    /// given attack trigger and prefixes.
    pub fn character(attack_trigger: Option<&str>, attack_prefixes: &[&str]) -> Self {
        let mut out = Self::default();
        for dir in Direction8::ALL {
            out.declare(dir.flag_name(), ParamKind::Bool);
            for prefix in LOCOMOTION_PREFIXES.iter().chain(attack_prefixes) {
                out.declare(format!("{prefix}{}", dir.name()), ParamKind::Bool);
            }
        }
        for flag in LOCOMOTION_FLAGS {
            out.declare(flag, ParamKind::Bool);
        }
        if !attack_prefixes.is_empty() {
            out.declare(ATTACKING_FLAG, ParamKind::Bool);
        }
        if let Some(trigger) = attack_trigger {
            out.declare(trigger, ParamKind::Trigger);
        }
        out.declare(DIE_TRIGGER, ParamKind::Trigger);
        out.declare(DEAD_FLAG, ParamKind::Bool);
        out
    }

    pub fn declare(&mut self, name: impl Into<String>, kind: ParamKind) {
        let name = name.into();
        if kind == ParamKind::Bool {
            self.bools.entry(name.clone()).or_insert(false);
        }
        self.declared.insert(name, kind);
    }

    pub fn declares(&self, name: &str, kind: ParamKind) -> bool {
        self.declared.get(name) == Some(&kind)
    }

    /// Sets a declared bool.  Returns `false` (and does nothing) when `name`
    /// is not a declared bool.
    pub fn try_set_bool(&mut self, name: &str, value: bool) -> bool {
        if !self.declares(name, ParamKind::Bool) {
            return false;
        }
        self.bools.insert(name.to_string(), value);
        true
    }

    /// Current value of a bool; `false` when undeclared.
    pub fn bool_value(&self, name: &str) -> bool {
        self.bools.get(name).copied().unwrap_or(false)
    }

    /// Fires a declared trigger.  Returns `false` when `name` is not one.
    pub fn try_trigger(&mut self, name: &str) -> bool {
        if !self.declares(name, ParamKind::Trigger) {
            return false;
        }
        self.pending_triggers.insert(name.to_string());
        true
    }

    pub fn try_reset_trigger(&mut self, name: &str) -> bool {
        if !self.declares(name, ParamKind::Trigger) {
            return false;
        }
        self.pending_triggers.remove(name);
        true
    }

    pub fn is_triggered(&self, name: &str) -> bool {
        self.pending_triggers.contains(name)
    }

    /// Hands the fired triggers to the presentation side and clears them.
    pub fn take_triggers(&mut self) -> Vec<String> {
        let mut fired: Vec<String> = self.pending_triggers.drain().collect();
        fired.sort();
        fired
    }

    /// Names of all bools currently `true`, sorted.
    pub fn active_bools(&self) -> Vec<&str> {
        let mut on: Vec<&str> = self
            .bools
            .iter()
            .filter(|(_, &v)| v)
            .map(|(k, _)| k.as_str())
            .collect();
        on.sort_unstable();
        on
    }
}
