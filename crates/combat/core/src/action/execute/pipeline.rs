//! The effect pipeline: one action from validation to on-hit triggers.
//!
//! Order for one action use:
//! 1. validate (read-only) and spend the cost
//! 2. offer spell-cast reactions; a cancel stops here, cost stays spent
//! 3. start concentration
//! 4. roll against every target (attack, save or contest)
//! 5. run effects in declared order, each against every eligible target
//! 6. on-hit passives, then hit reactions, per landed attack
//!
//! Reactions re-enter [`Pipeline::run_action`] with `depth + 1`.

use crate::action::definition::{
    ActionDefinition, ActionEffect, ActionRoll, AttackAbility, EffectScope, EffectWhen, SavePolicy,
};
use crate::action::error::ActionError;
use crate::action::types::{ActionInput, CombatEvent};
use crate::budget::ActionCost;
use crate::config::CombatConfig;
use crate::env::CombatEnv;
use crate::passive::PassiveWindow;
use crate::reaction::{ReactionDecider, ReactionTrigger, TriggerEvent};
use crate::rules::{
    AttackRequest, SaveRequest, attack_bonus, compute_save_dc, resolve_attack, resolve_contest,
};
use crate::state::{CombatState, CombatantId};
use crate::status::RemovalTrigger;

use super::context::{EffectContext, ValidationContext, apply_effect};
use super::validation::{Payment, validate_action};

/// What a completed (or cancelled) action use paid and targeted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionRun {
    pub spent: ActionCost,
    pub targets: Vec<CombatantId>,
    pub cancelled: bool,
}

/// Result of the action's roll against one target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TargetOutcome {
    target: CombatantId,
    /// Hit, failed save, won contest, or no roll at all.
    landed: bool,
    critical: bool,
    /// The target rolled a successful save.
    saved: bool,
}

impl TargetOutcome {
    fn landed(target: CombatantId) -> Self {
        Self {
            target,
            landed: true,
            critical: false,
            saved: false,
        }
    }
}

/// Whether an effect runs against an outcome, and whether it is halved.
fn gate(effect: &ActionEffect, outcome: &TargetOutcome) -> Option<bool> {
    match effect.when {
        EffectWhen::Always => Some(outcome.saved && effect.save == SavePolicy::Half),
        EffectWhen::OnFailure => (!outcome.landed).then_some(false),
        EffectWhen::OnSuccess if outcome.landed => Some(false),
        EffectWhen::OnSuccess if outcome.saved => match effect.save {
            SavePolicy::Negate => None,
            SavePolicy::Half => Some(true),
            SavePolicy::Ignore => Some(false),
        },
        EffectWhen::OnSuccess => None,
    }
}

/// Mutable execution context shared by an action and its nested reactions.
pub struct Pipeline<'a> {
    pub(crate) state: &'a mut CombatState,
    pub(crate) env: CombatEnv<'a>,
    pub(crate) decider: &'a mut dyn ReactionDecider,
    pub(crate) events: Vec<CombatEvent>,
    /// Reaction nesting level; 0 for the top-level action.
    pub(crate) depth: u32,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        state: &'a mut CombatState,
        env: CombatEnv<'a>,
        decider: &'a mut dyn ReactionDecider,
    ) -> Self {
        Self {
            state,
            env,
            decider,
            events: Vec::new(),
            depth: 0,
        }
    }

    pub fn state(&self) -> &CombatState {
        self.state
    }

    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<CombatEvent> {
        self.events
    }

    pub(crate) fn push(&mut self, event: CombatEvent) {
        self.events.push(event);
    }

    pub(crate) fn is_conscious(&self, id: CombatantId) -> bool {
        self.state.combatant(id).is_some_and(|c| c.is_conscious())
    }

    // ========================================================================
    // Action Execution
    // ========================================================================

    /// Validate, pay for and resolve one action use.
    ///
    /// Errors are only returned from validation and from effect
    /// post-conditions; validation failures leave the state untouched.
    pub fn run_action(
        &mut self,
        actor: CombatantId,
        action: &'a ActionDefinition,
        input: &ActionInput,
        payment: Payment,
    ) -> Result<ActionRun, ActionError> {
        let span = tracing::debug_span!("combat.action", actor = %actor, action = %action.id);
        let _enter = span.enter();

        let env = self.env;
        let targets = {
            let caster = self
                .state
                .combatant(actor)
                .ok_or(ActionError::UnknownCombatant(actor))?;
            validate_action(&*self.state, env, caster, action, input, payment)?
        };

        let spent = self.spend(actor, action, payment)?;
        tracing::debug!(targets = ?targets, spent = ?spent, "action declared");
        self.push(CombatEvent::ActionDeclared {
            actor,
            action: action.id.clone(),
            targets: targets.clone(),
            spent: spent.clone(),
        });

        if action.category.is_spell() {
            let outcome = self.offer_reactions(TriggerEvent::new(
                ReactionTrigger::SpellCast,
                actor,
                actor,
                Some(action.category),
            ));
            if let Some(by) = outcome.cancelled_by {
                tracing::info!(by = %by, "action cancelled by reaction");
                self.push(CombatEvent::ActionCancelled {
                    actor,
                    action: action.id.clone(),
                    by,
                });
                return Ok(ActionRun {
                    spent,
                    targets,
                    cancelled: true,
                });
            }
        }

        if action.concentration {
            self.start_concentration(actor, &action.id);
        }

        let roll_dc = self.roll_dc(actor, action);
        let mut outcomes = Vec::with_capacity(targets.len());
        for &target in &targets {
            outcomes.push(self.roll_target(actor, target, action, roll_dc)?);
        }
        if action.is_attack() {
            self.trigger_removal(actor, RemovalTrigger::OnAttack);
        }

        let effect_dc = roll_dc.or_else(|| self.caster_dc(actor));
        self.run_effects(actor, action, &outcomes, effect_dc)?;

        // A concentration action that attached nothing holds nothing.
        if action.concentration
            && self
                .state
                .combatant(actor)
                .and_then(|c| c.concentration.as_ref())
                .is_some_and(|c| c.action == action.id && c.links.is_empty())
        {
            self.end_concentration(actor);
        }

        if action.is_attack() {
            for outcome in outcomes.iter().filter(|o| o.landed) {
                self.run_passives(actor, PassiveWindow::OnHit, Some(outcome.target))?;
                if outcome.critical {
                    self.run_passives(actor, PassiveWindow::OnCriticalHit, Some(outcome.target))?;
                }
                self.offer_reactions(TriggerEvent::new(
                    ReactionTrigger::Hit,
                    actor,
                    outcome.target,
                    Some(action.category),
                ));
            }
        }

        Ok(ActionRun {
            spent,
            targets,
            cancelled: false,
        })
    }

    fn spend(
        &mut self,
        actor: CombatantId,
        action: &ActionDefinition,
        payment: Payment,
    ) -> Result<ActionCost, ActionError> {
        let caster = self
            .state
            .combatant_mut(actor)
            .ok_or(ActionError::UnknownCombatant(actor))?;
        let blocked = caster.blocked_resources();
        let extra_attacks = caster.extra_attacks;
        let paid = match payment {
            Payment::Turn => caster.budget.spend_for_action(
                &action.cost,
                action.is_weapon_attack(),
                extra_attacks,
                blocked,
            )?,
            Payment::Reaction => {
                let cost = payment.convert(&action.cost);
                caster.budget.spend(&cost, blocked)?;
                cost
            }
            Payment::Free => ActionCost::free(),
        };
        Ok(paid)
    }

    fn run_effects(
        &mut self,
        actor: CombatantId,
        action: &'a ActionDefinition,
        outcomes: &[TargetOutcome],
        save_dc: Option<i32>,
    ) -> Result<(), ActionError> {
        let caster_outcome = TargetOutcome {
            landed: matches!(action.roll, ActionRoll::None) || outcomes.iter().any(|o| o.landed),
            ..TargetOutcome::landed(actor)
        };

        for (index, effect) in action.effects.iter().enumerate() {
            let scoped: &[TargetOutcome] = match effect.scope {
                EffectScope::Caster => std::slice::from_ref(&caster_outcome),
                EffectScope::Targets => outcomes,
            };
            for outcome in scoped {
                if !self.is_conscious(actor) {
                    tracing::debug!(actor = %actor, "actor fell mid-action, remaining effects skipped");
                    return Ok(());
                }
                let Some(halved) = gate(effect, outcome) else {
                    continue;
                };
                let mut ctx = EffectContext {
                    action: Some(action),
                    effect_index: index,
                    critical: outcome.critical,
                    halved,
                    save_dc,
                    ..EffectContext::new(self, actor, outcome.target)
                };
                apply_effect(&effect.kind, &mut ctx)?;
            }
        }
        Ok(())
    }

    /// Run effects outside an action (status ticks, passive triggers).
    ///
    /// Effects whose preconditions fail against the current state are
    /// skipped rather than treated as errors.
    pub(crate) fn run_side_effects(
        &mut self,
        caster: CombatantId,
        target: CombatantId,
        effects: &[ActionEffect],
        critical: bool,
        save_dc: Option<i32>,
    ) -> Result<(), ActionError> {
        let env = self.env;
        for (index, effect) in effects.iter().enumerate() {
            let recipient = match effect.scope {
                EffectScope::Caster => caster,
                EffectScope::Targets => target,
            };
            let accepted = {
                let (Some(source), Some(subject)) =
                    (self.state.combatant(caster), self.state.combatant(recipient))
                else {
                    continue;
                };
                let ctx = ValidationContext {
                    state: &*self.state,
                    env,
                    caster: source,
                    target: subject,
                    action: None,
                };
                effect.kind.pre_validate(&ctx)
            };
            if let Err(err) = accepted {
                tracing::debug!(effect = effect.kind.name(), %err, "side effect skipped");
                continue;
            }
            let mut ctx = EffectContext {
                effect_index: index,
                critical,
                save_dc,
                ..EffectContext::new(self, caster, recipient)
            };
            apply_effect(&effect.kind, &mut ctx)?;
        }
        Ok(())
    }

    // ========================================================================
    // Rolls
    // ========================================================================

    /// DC of the action's own saving throw, computed once per action use.
    fn roll_dc(&self, actor: CombatantId, action: &ActionDefinition) -> Option<i32> {
        let ActionRoll::Save { dc, .. } = &action.roll else {
            return None;
        };
        let caster = self.state.combatant(actor)?;
        Some(dc.resolve(caster))
    }

    /// DC recorded on statuses applied by actions without a save roll.
    pub(crate) fn caster_dc(&self, actor: CombatantId) -> Option<i32> {
        let caster = self.state.combatant(actor)?;
        Some(match caster.spellcasting {
            Some(ability) => compute_save_dc(caster, ability),
            None => CombatConfig::FALLBACK_SAVE_DC,
        })
    }

    fn roll_target(
        &mut self,
        actor: CombatantId,
        target: CombatantId,
        action: &ActionDefinition,
        dc: Option<i32>,
    ) -> Result<TargetOutcome, ActionError> {
        match &action.roll {
            ActionRoll::None => Ok(TargetOutcome::landed(target)),
            ActionRoll::Attack {
                ability,
                proficient,
                bonus,
            } => self.roll_attack(actor, target, action, *ability, *proficient, *bonus),
            ActionRoll::Save { ability, .. } => {
                let request = SaveRequest::new(
                    *ability,
                    dc.unwrap_or(CombatConfig::FALLBACK_SAVE_DC),
                )
                .against(action.category);
                let save = self.roll_save(target, Some(actor), request)?;
                Ok(TargetOutcome {
                    target,
                    landed: !save.success,
                    critical: false,
                    saved: save.success,
                })
            }
            ActionRoll::Contest { skill, against } => {
                let contest = {
                    let (initiator, defender, rolls) = self
                        .state
                        .pair_with_rolls(actor, target)
                        .ok_or(ActionError::UnknownCombatant(target))?;
                    resolve_contest(initiator, *skill, defender, against, rolls)
                };
                let landed = contest.initiator_wins;
                self.push(CombatEvent::Contest {
                    initiator: actor,
                    defender: target,
                    contest,
                });
                Ok(TargetOutcome {
                    target,
                    landed,
                    critical: false,
                    saved: false,
                })
            }
        }
    }

    fn roll_attack(
        &mut self,
        actor: CombatantId,
        target: CombatantId,
        action: &ActionDefinition,
        ability: AttackAbility,
        proficient: bool,
        bonus: i32,
    ) -> Result<TargetOutcome, ActionError> {
        let config = self.env.config;
        let mut attack = {
            let (attacker, defender, rolls) = self
                .state
                .pair_with_rolls(actor, target)
                .ok_or(ActionError::UnknownCombatant(target))?;
            let ability = ability.resolve(attacker);
            let request = AttackRequest {
                category: Some(action.category),
                attack_bonus: attack_bonus(attacker, ability, proficient) + bonus,
                ..AttackRequest::default()
            };
            resolve_attack(attacker, defender, &request, config, rolls)
        };

        if attack.hit {
            let outcome = self.offer_reactions(TriggerEvent::new(
                ReactionTrigger::AttackHitting,
                actor,
                target,
                Some(action.category),
            ));
            outcome.fold_into(&mut attack);
        }

        let outcome = TargetOutcome {
            target,
            landed: attack.hit,
            critical: attack.critical,
            saved: false,
        };
        self.push(CombatEvent::AttackRolled {
            attacker: actor,
            target,
            attack,
        });
        Ok(outcome)
    }
}
