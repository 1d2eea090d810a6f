use bitflags::bitflags;

use crate::action::{ActionCategory, ActionEffect};
use crate::boost::BoostDefinition;
use crate::stats::Ability;

bitflags! {
    /// Behavioural flags of a status.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct StatusFlags: u8 {
        /// No actions, bonus actions or reactions.
        const INCAPACITATED = 1 << 0;
        const BUFF = 1 << 1;
        const DEBUFF = 1 << 2;
        /// Taking damage forces a repeat save against the status.
        const BREAKS_ON_DAMAGE_SAVE = 1 << 3;
    }
}

/// When a status ticks (duration decrement and tick effects).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TickTiming {
    StartOfTurn,
    #[default]
    EndOfTurn,
}

/// Events that end a status early.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RemovalTrigger {
    OnDamageTaken,
    /// The owner makes an attack roll.
    OnAttack,
    /// The owner succeeds on any saving throw.
    OnSaveSuccess,
    /// The owner moves voluntarily.
    OnMove,
    OnHeal,
}

/// Rule applied when a status lands on an occupied stack group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StackPolicy {
    Reject,
    #[default]
    Refresh,
    Stack {
        max: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RepeatSave {
    pub ability: Ability,
    #[cfg_attr(feature = "serde", serde(default))]
    pub timing: TickTiming,
}

/// Catalog entry for a status. Immutable at runtime.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusDefinition {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub boosts: Vec<BoostDefinition>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub flags: StatusFlags,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tick_timing: TickTiming,
    /// Effects run on the owner at each tick, before the duration decrements.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tick_effects: Vec<ActionEffect>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub removal_triggers: Vec<RemovalTrigger>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub repeat_save: Option<RepeatSave>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub blocked_actions: Vec<ActionCategory>,
    /// Mutual-exclusion group; defaults to the status id.
    #[cfg_attr(feature = "serde", serde(default))]
    pub stack_group: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stack_policy: StackPolicy,
    /// Duration in ticks when the applying effect does not give one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub default_duration: Option<u32>,
}

impl StatusDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            boosts: Vec::new(),
            flags: StatusFlags::empty(),
            tick_timing: TickTiming::EndOfTurn,
            tick_effects: Vec::new(),
            removal_triggers: Vec::new(),
            repeat_save: None,
            blocked_actions: Vec::new(),
            stack_group: None,
            stack_policy: StackPolicy::Refresh,
            default_duration: None,
        }
    }

    pub fn group(&self) -> &str {
        self.stack_group.as_deref().unwrap_or(&self.id)
    }

    pub fn removed_by(&self, trigger: RemovalTrigger) -> bool {
        self.removal_triggers.contains(&trigger)
    }

    pub fn blocks(&self, category: ActionCategory) -> bool {
        self.blocked_actions.contains(&category)
    }
}
