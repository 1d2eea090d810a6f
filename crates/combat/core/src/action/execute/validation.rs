//! Read-only validation run before an action spends anything.

use crate::action::definition::{ActionDefinition, EffectScope};
use crate::action::error::ActionError;
use crate::action::targeting::resolve_targets;
use crate::action::types::ActionInput;
use crate::budget::ActionCost;
use crate::env::CombatEnv;
use crate::state::{CombatState, Combatant, CombatantId};

use super::context::ValidationContext;

/// How an action's economy cost is paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payment {
    /// On the actor's own turn, from the turn budget.
    Turn,
    /// As a reaction: the action and bonus-action parts become one reaction.
    Reaction,
    /// Nothing is paid (scripted or system-triggered actions).
    Free,
}

impl Payment {
    /// Cost actually charged for `cost` under this payment.
    pub fn convert(self, cost: &ActionCost) -> ActionCost {
        match self {
            Payment::Turn => cost.clone(),
            Payment::Reaction => ActionCost {
                action: 0,
                bonus_action: 0,
                reaction: 1,
                movement: 0,
                resources: cost.resources.clone(),
            },
            Payment::Free => ActionCost::free(),
        }
    }
}

/// Validate an action against the current state and return its targets.
///
/// Checks, in order: the actor can act, knows the action, is not blocked by
/// a status, can pay, the targets resolve, and every effect accepts every
/// target it would apply to.
pub fn validate_action(
    state: &CombatState,
    env: CombatEnv<'_>,
    actor: &Combatant,
    action: &ActionDefinition,
    input: &ActionInput,
    payment: Payment,
) -> Result<Vec<CombatantId>, ActionError> {
    if actor.is_incapacitated() {
        return Err(ActionError::ActorIncapacitated(actor.id));
    }
    if payment == Payment::Turn && !actor.knows_action(&action.id) {
        return Err(ActionError::ActionNotKnown {
            actor: actor.id,
            action: action.id.clone(),
        });
    }
    for instance in &actor.statuses {
        if env
            .catalog
            .status(&instance.status_id)
            .is_some_and(|def| def.blocks(action.category))
        {
            return Err(ActionError::ActionBlocked {
                status: instance.status_id.clone(),
            });
        }
    }

    check_cost(actor, action, payment)?;

    let targets = resolve_targets(state, env.sight, actor, &action.targeting, input)?;

    for effect in &action.effects {
        let recipients: &[CombatantId] = match effect.scope {
            EffectScope::Caster => std::slice::from_ref(&actor.id),
            EffectScope::Targets => &targets,
        };
        for &id in recipients {
            let target = state
                .combatant(id)
                .ok_or(ActionError::UnknownCombatant(id))?;
            let ctx = ValidationContext {
                state,
                env,
                caster: actor,
                target,
                action: Some(action),
            };
            effect.kind.pre_validate(&ctx)?;
        }
    }
    Ok(targets)
}

fn check_cost(actor: &Combatant, action: &ActionDefinition, payment: Payment) -> Result<(), ActionError> {
    let blocked = actor.blocked_resources();
    match payment {
        Payment::Turn => {
            // An extra-attack charge stands in for the action itself.
            if actor
                .budget
                .covers_with_charge(&action.cost, action.is_weapon_attack())
            {
                actor.budget.check(&action.cost.without_action(), blocked)?;
            } else {
                actor.budget.check(&action.cost, blocked)?;
            }
        }
        Payment::Reaction => actor.budget.check(&payment.convert(&action.cost), blocked)?,
        Payment::Free => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionCategory, TargetSpec};
    use crate::config::CombatConfig;
    use crate::state::Position;
    use crate::status::{StatusDefinition, StatusFlags};
    use crate::testing::{CatalogBuilder, CombatantBuilder};

    fn setup() -> (CombatState, crate::env::Catalog) {
        let catalog = CatalogBuilder::new()
            .action(ActionDefinition::new("slash", ActionCategory::MeleeWeapon))
            .action(
                ActionDefinition::new("rebuke", ActionCategory::RangedSpell)
                    .with_cost(ActionCost::reaction())
                    .with_targeting(TargetSpec::ranged(60)),
            )
            .status({
                let mut def = StatusDefinition::new("SILENCED");
                def.blocked_actions = vec![ActionCategory::RangedSpell, ActionCategory::Spell];
                def
            })
            .status({
                let mut def = StatusDefinition::new("STUNNED");
                def.flags = StatusFlags::INCAPACITATED;
                def
            })
            .build()
            .unwrap();
        let state = CombatState::with_combatants(
            3,
            [
                CombatantBuilder::new(1, "Fighter")
                    .actions(["slash", "rebuke"])
                    .build(),
                CombatantBuilder::new(2, "Goblin")
                    .hostile()
                    .at(Position::new(1, 0))
                    .build(),
            ],
        );
        (state, catalog)
    }

    fn validate(
        state: &CombatState,
        catalog: &crate::env::Catalog,
        action: &str,
        payment: Payment,
    ) -> Result<Vec<CombatantId>, ActionError> {
        let config = CombatConfig::default();
        let env = CombatEnv::open(catalog, &config);
        let actor = state.combatant(CombatantId(1)).unwrap();
        let action = catalog.action(action).unwrap();
        validate_action(
            state,
            env,
            actor,
            action,
            &ActionInput::target(CombatantId(2)),
            payment,
        )
    }

    #[test]
    fn valid_action_returns_targets() {
        let (state, catalog) = setup();
        assert_eq!(
            validate(&state, &catalog, "slash", Payment::Turn).unwrap(),
            vec![CombatantId(2)]
        );
    }

    #[test]
    fn spent_action_is_refused() {
        let (mut state, catalog) = setup();
        let fighter = state.combatant_mut(CombatantId(1)).unwrap();
        fighter
            .budget
            .spend(&ActionCost::action(), Default::default())
            .unwrap();
        assert!(matches!(
            validate(&state, &catalog, "slash", Payment::Turn),
            Err(ActionError::InsufficientResource { .. })
        ));
    }

    #[test]
    fn reaction_payment_needs_a_reaction() {
        let (mut state, catalog) = setup();
        assert!(validate(&state, &catalog, "rebuke", Payment::Reaction).is_ok());
        let fighter = state.combatant_mut(CombatantId(1)).unwrap();
        fighter
            .budget
            .spend(&ActionCost::reaction(), Default::default())
            .unwrap();
        assert!(validate(&state, &catalog, "rebuke", Payment::Reaction).is_err());
    }

    #[test]
    fn blocking_status_refuses_category() {
        let (mut state, catalog) = setup();
        let silenced = catalog.status("SILENCED").unwrap().clone();
        let fighter = state.combatant_mut(CombatantId(1)).unwrap();
        crate::status::apply_status(
            fighter,
            &silenced,
            crate::status::NewStatus {
                id: crate::state::StatusInstanceId(1),
                source: None,
                duration: Some(2),
                save_dc: None,
            },
        );
        assert!(matches!(
            validate(&state, &catalog, "rebuke", Payment::Turn),
            Err(ActionError::ActionBlocked { .. })
        ));
        assert!(validate(&state, &catalog, "slash", Payment::Turn).is_ok());
    }

    #[test]
    fn incapacitated_actor_cannot_act() {
        let (mut state, catalog) = setup();
        let stunned = catalog.status("STUNNED").unwrap().clone();
        let fighter = state.combatant_mut(CombatantId(1)).unwrap();
        crate::status::apply_status(
            fighter,
            &stunned,
            crate::status::NewStatus {
                id: crate::state::StatusInstanceId(1),
                source: None,
                duration: Some(1),
                save_dc: None,
            },
        );
        assert_eq!(
            validate(&state, &catalog, "slash", Payment::Turn),
            Err(ActionError::ActorIncapacitated(CombatantId(1)))
        );
    }

    #[test]
    fn unknown_action_is_refused_on_turn() {
        let (mut state, catalog) = setup();
        state.combatant_mut(CombatantId(1)).unwrap().actions.clear();
        assert!(matches!(
            validate(&state, &catalog, "slash", Payment::Turn),
            Err(ActionError::ActionNotKnown { .. })
        ));
        assert!(validate(&state, &catalog, "slash", Payment::Free).is_ok());
    }
}
