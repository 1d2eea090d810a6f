//! Decision point for offered reactions.
//!
//! A human prompt is modelled as a blocking call that returns the player's
//! choice (or a default after a timeout); AI policies answer immediately.

use crate::state::{CombatState, CombatantId};

use super::definition::{ReactionDefinition, ReactionTrigger};

/// One eligible reaction offered to its owner.
#[derive(Clone, Copy, Debug)]
pub struct ReactionOffer<'a> {
    pub reactor: CombatantId,
    pub reaction: &'a ReactionDefinition,
    pub trigger: ReactionTrigger,
    /// Combatant whose action set off the trigger.
    pub source: CombatantId,
    /// Combatant the triggering event happened to.
    pub subject: CombatantId,
}

pub trait ReactionDecider {
    /// Whether the reactor takes the offered reaction.
    fn decide(&mut self, state: &CombatState, offer: &ReactionOffer<'_>) -> bool;
}

/// Takes every eligible reaction.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysReact;

impl ReactionDecider for AlwaysReact {
    fn decide(&mut self, _state: &CombatState, _offer: &ReactionOffer<'_>) -> bool {
        true
    }
}

/// Declines everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverReact;

impl ReactionDecider for NeverReact {
    fn decide(&mut self, _state: &CombatState, _offer: &ReactionOffer<'_>) -> bool {
        false
    }
}
