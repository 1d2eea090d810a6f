//! Read-only content registry resolved once at combat start.

use std::collections::BTreeMap;

use crate::action::{ActionDefinition, ActionEffect, TargetShape};
use crate::error::{CombatError, ErrorSeverity};
use crate::passive::PassiveDefinition;
use crate::reaction::ReactionDefinition;
use crate::state::Combatant;
use crate::status::StatusDefinition;

/// Content errors. Raised while a catalog is built, never during execution.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    #[error("{owner} references unknown status '{status}'")]
    UnknownStatus { owner: String, status: String },

    #[error("{owner} references unknown action '{action}'")]
    UnknownAction { owner: String, action: String },

    #[error("{owner} references unknown reaction '{reaction}'")]
    UnknownReaction { owner: String, reaction: String },

    #[error("{owner} references unknown passive '{passive}'")]
    UnknownPassive { owner: String, passive: String },

    #[error("invalid definition '{id}': {reason}")]
    InvalidDefinition { id: String, reason: &'static str },
}

impl CombatError for CatalogError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateId { .. } => "CATALOG_DUPLICATE_ID",
            Self::UnknownStatus { .. } => "CATALOG_UNKNOWN_STATUS",
            Self::UnknownAction { .. } => "CATALOG_UNKNOWN_ACTION",
            Self::UnknownReaction { .. } => "CATALOG_UNKNOWN_REACTION",
            Self::UnknownPassive { .. } => "CATALOG_UNKNOWN_PASSIVE",
            Self::InvalidDefinition { .. } => "CATALOG_INVALID_DEFINITION",
        }
    }
}

/// Actions, statuses, reactions and passives keyed by stable string ids.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    actions: BTreeMap<String, ActionDefinition>,
    statuses: BTreeMap<String, StatusDefinition>,
    reactions: BTreeMap<String, ReactionDefinition>,
    passives: BTreeMap<String, PassiveDefinition>,
}

fn insert_unique<T>(
    map: &mut BTreeMap<String, T>,
    kind: &'static str,
    id: &str,
    value: T,
) -> Result<(), CatalogError> {
    if map.contains_key(id) {
        return Err(CatalogError::DuplicateId {
            kind,
            id: id.to_string(),
        });
    }
    map.insert(id.to_string(), value);
    Ok(())
}

impl Catalog {
    /// Build and cross-validate a catalog.
    pub fn new(
        actions: impl IntoIterator<Item = ActionDefinition>,
        statuses: impl IntoIterator<Item = StatusDefinition>,
        reactions: impl IntoIterator<Item = ReactionDefinition>,
        passives: impl IntoIterator<Item = PassiveDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Catalog::default();
        for action in actions {
            let id = action.id.clone();
            insert_unique(&mut catalog.actions, "action", &id, action)?;
        }
        for status in statuses {
            let id = status.id.clone();
            insert_unique(&mut catalog.statuses, "status", &id, status)?;
        }
        for reaction in reactions {
            let id = reaction.id.clone();
            insert_unique(&mut catalog.reactions, "reaction", &id, reaction)?;
        }
        for passive in passives {
            let id = passive.id.clone();
            insert_unique(&mut catalog.passives, "passive", &id, passive)?;
        }
        catalog.validate()?;
        tracing::debug!(
            actions = catalog.actions.len(),
            statuses = catalog.statuses.len(),
            reactions = catalog.reactions.len(),
            passives = catalog.passives.len(),
            "catalog built"
        );
        Ok(catalog)
    }

    pub fn action(&self, id: &str) -> Option<&ActionDefinition> {
        self.actions.get(id)
    }

    pub fn status(&self, id: &str) -> Option<&StatusDefinition> {
        self.statuses.get(id)
    }

    pub fn reaction(&self, id: &str) -> Option<&ReactionDefinition> {
        self.reactions.get(id)
    }

    pub fn passive(&self, id: &str) -> Option<&PassiveDefinition> {
        self.passives.get(id)
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionDefinition> {
        self.actions.values()
    }

    pub fn statuses(&self) -> impl Iterator<Item = &StatusDefinition> {
        self.statuses.values()
    }

    pub fn reactions(&self) -> impl Iterator<Item = &ReactionDefinition> {
        self.reactions.values()
    }

    pub fn passives(&self) -> impl Iterator<Item = &PassiveDefinition> {
        self.passives.values()
    }

    // ========================================================================
    // Cross-reference validation
    // ========================================================================

    fn check_effects(&self, owner: &str, effects: &[ActionEffect]) -> Result<(), CatalogError> {
        for effect in effects {
            if let Some(status) = effect.kind.referenced_status()
                && !self.statuses.contains_key(status)
            {
                return Err(CatalogError::UnknownStatus {
                    owner: owner.to_string(),
                    status: status.to_string(),
                });
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for action in self.actions.values() {
            self.check_effects(&action.id, &action.effects)?;
            if let TargetShape::Multiple { max: 0 } = action.targeting.shape {
                return Err(CatalogError::InvalidDefinition {
                    id: action.id.clone(),
                    reason: "multi-target action with a maximum of zero",
                });
            }
        }
        for status in self.statuses.values() {
            self.check_effects(&status.id, &status.tick_effects)?;
        }
        for reaction in self.reactions.values() {
            if let Some(action) = &reaction.action
                && !self.actions.contains_key(action)
            {
                return Err(CatalogError::UnknownAction {
                    owner: reaction.id.clone(),
                    action: action.clone(),
                });
            }
            if let Some(predicate) = &reaction.eligibility {
                for call in predicate.unrecognized() {
                    tracing::warn!(reaction = %reaction.id, predicate = %call, "unrecognized eligibility predicate");
                }
            }
        }
        for passive in self.passives.values() {
            for trigger in &passive.triggers {
                self.check_effects(&passive.id, &trigger.effects)?;
            }
        }
        Ok(())
    }

    /// Every id a combatant sheet refers to must exist.
    pub fn check_combatant(&self, combatant: &Combatant) -> Result<(), CatalogError> {
        let owner = || combatant.name.clone();
        if let Some(action) = combatant.actions.iter().find(|a| !self.actions.contains_key(*a)) {
            return Err(CatalogError::UnknownAction {
                owner: owner(),
                action: action.clone(),
            });
        }
        if let Some(reaction) = combatant
            .reactions
            .iter()
            .find(|r| !self.reactions.contains_key(*r))
        {
            return Err(CatalogError::UnknownReaction {
                owner: owner(),
                reaction: reaction.clone(),
            });
        }
        if let Some(passive) = combatant
            .passives
            .iter()
            .find(|p| !self.passives.contains_key(*p))
        {
            return Err(CatalogError::UnknownPassive {
                owner: owner(),
                passive: passive.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionCategory, ApplyStatusEffect, EffectKind};
    use crate::testing::CombatantBuilder;

    fn bless() -> ActionDefinition {
        ActionDefinition::new("bless", ActionCategory::Spell).with_effect(ActionEffect::new(
            EffectKind::ApplyStatus(ApplyStatusEffect::new("BLESSED", Some(10))),
        ))
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Catalog::new([bless(), bless()], [StatusDefinition::new("BLESSED")], [], [])
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId { kind: "action", .. }));
    }

    #[test]
    fn dangling_status_reference_fails_at_load() {
        let err = Catalog::new([bless()], [], [], []).unwrap_err();
        assert_eq!(
            err,
            CatalogError::UnknownStatus {
                owner: "bless".into(),
                status: "BLESSED".into()
            }
        );
    }

    #[test]
    fn combatant_references_are_checked() {
        let catalog = Catalog::new([bless()], [StatusDefinition::new("BLESSED")], [], []).unwrap();
        let cleric = CombatantBuilder::new(1, "Cleric").actions(["bless"]).build();
        assert!(catalog.check_combatant(&cleric).is_ok());
        let wizard = CombatantBuilder::new(2, "Wizard").actions(["fireball"]).build();
        assert!(matches!(
            catalog.check_combatant(&wizard),
            Err(CatalogError::UnknownAction { .. })
        ));
    }
}
