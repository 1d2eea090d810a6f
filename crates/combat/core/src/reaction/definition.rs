//! Catalog entries for reactions.

use crate::boost::Predicate;
use crate::dice::DiceFormula;

/// Pipeline points at which reactions are offered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReactionTrigger {
    /// A hostile combatant within range starts casting a spell.
    SpellCast,
    /// An attack roll is about to hit the reactor.
    AttackHitting,
    /// An attack has hit the reactor and its effects have landed.
    Hit,
    /// A creature on the reactor's side took damage from a hostile source.
    AllyDamaged,
    /// A hostile combatant is about to leave the reactor's melee reach.
    LeavesReach,
}

/// What a fired reaction does to the triggering event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReactionResponse {
    #[default]
    None,
    /// Abort the triggering action; its cost stays spent.
    CancelTrigger,
    /// Raise the reactor's AC against the attack being resolved.
    ArmorClassBonus(i32),
    /// Roll this formula and subtract it from the attack roll.
    AttackRollPenalty(DiceFormula),
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReactionDefinition {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    pub trigger: ReactionTrigger,
    /// Extra condition, evaluated with the reactor as subject, the trigger's
    /// source as source and its subject as target.
    #[cfg_attr(feature = "serde", serde(default))]
    pub eligibility: Option<Predicate>,
    /// Feet between the reactor and the triggering combatant, where the
    /// trigger has no fixed range of its own.
    #[cfg_attr(feature = "serde", serde(default = "default_range"))]
    pub range: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub response: ReactionResponse,
    /// Action run as the reaction, aimed at the trigger's source. Without
    /// one the reaction only spends the reaction charge.
    #[cfg_attr(feature = "serde", serde(default))]
    pub action: Option<String>,
}

#[cfg(feature = "serde")]
fn default_range() -> u32 {
    crate::config::CombatConfig::DEFAULT_MELEE_REACH
}

impl ReactionDefinition {
    pub fn new(id: impl Into<String>, trigger: ReactionTrigger) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            trigger,
            eligibility: None,
            range: crate::config::CombatConfig::DEFAULT_MELEE_REACH,
            response: ReactionResponse::None,
            action: None,
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_response(mut self, response: ReactionResponse) -> Self {
        self.response = response;
        self
    }

    pub fn with_eligibility(mut self, predicate: Predicate) -> Self {
        self.eligibility = Some(predicate);
        self
    }

    pub fn with_range(mut self, range: u32) -> Self {
        self.range = range;
        self
    }
}
