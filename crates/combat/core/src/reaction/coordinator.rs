//! Offering reactions at trigger points and folding their responses back.

use crate::action::{ActionCategory, ActionInput, CombatEvent, Payment, Pipeline, validate_action};
use crate::boost::QueryContext;
use crate::budget::{ActionCost, ResourceKind};
use crate::rules::AttackResolution;
use crate::state::{CombatantId, Position};

use super::decider::ReactionOffer;
use super::definition::{ReactionDefinition, ReactionResponse, ReactionTrigger};

/// A trigger occurrence raised by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriggerEvent {
    pub kind: ReactionTrigger,
    /// Combatant whose action set off the trigger (attacker, caster, mover).
    pub source: CombatantId,
    /// Combatant the event happened to (the one hit or damaged).
    pub subject: CombatantId,
    pub action: Option<ActionCategory>,
    /// Where a mover is heading, for `LeavesReach`.
    pub destination: Option<Position>,
}

impl TriggerEvent {
    pub fn new(
        kind: ReactionTrigger,
        source: CombatantId,
        subject: CombatantId,
        action: Option<ActionCategory>,
    ) -> Self {
        Self {
            kind,
            source,
            subject,
            action,
            destination: None,
        }
    }

    /// `mover` is about to step onto `destination`.
    pub fn leaving(mover: CombatantId, destination: Position) -> Self {
        Self {
            destination: Some(destination),
            ..Self::new(ReactionTrigger::LeavesReach, mover, mover, None)
        }
    }
}

/// Combined responses of every reaction fired for one trigger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReactionOutcome {
    /// First reactor whose reaction cancelled the trigger.
    pub cancelled_by: Option<CombatantId>,
    pub ac_bonus: i32,
    /// Rolled attack penalties, labelled with the reaction id.
    pub penalties: Vec<(String, i32)>,
    pub fired: Vec<(CombatantId, String)>,
}

impl ReactionOutcome {
    /// Apply the responses to an attack being resolved.
    pub fn fold_into(&self, attack: &mut AttackResolution) {
        if self.ac_bonus != 0 {
            attack.raise_ac(self.ac_bonus);
        }
        for (label, penalty) in &self.penalties {
            attack.penalise(label.clone(), *penalty);
        }
        if self.cancelled_by.is_some() {
            attack.cancel();
        }
    }
}

impl<'a> Pipeline<'a> {
    /// Offer every eligible reaction for `event`, in initiative order.
    ///
    /// Each reactor fires at most one reaction per occurrence. Offering stops
    /// once a reaction cancels the trigger. Beyond the configured depth no
    /// reactions are offered.
    pub fn offer_reactions(&mut self, event: TriggerEvent) -> ReactionOutcome {
        let mut outcome = ReactionOutcome::default();
        if self.depth >= self.env.config.max_reaction_depth {
            tracing::debug!(trigger = %event.kind, depth = self.depth, "reaction depth reached");
            return outcome;
        }
        let catalog = self.env.catalog;

        let mut reactors = self.state.ids();
        reactors.sort_by_key(|id| (self.state.turn.rank(*id), *id));

        for reactor in reactors {
            if outcome.cancelled_by.is_some() {
                break;
            }
            let known = self
                .state
                .combatant(reactor)
                .map(|c| c.reactions.clone())
                .unwrap_or_default();
            for id in known {
                let Some(reaction) = catalog.reaction(&id) else {
                    continue;
                };
                if reaction.trigger != event.kind || !self.is_eligible(reactor, reaction, &event) {
                    continue;
                }
                let offer = ReactionOffer {
                    reactor,
                    reaction,
                    trigger: event.kind,
                    source: event.source,
                    subject: event.subject,
                };
                if !self.decider.decide(&*self.state, &offer) {
                    continue;
                }
                self.fire_reaction(reactor, reaction, &event, &mut outcome);
                break;
            }
        }
        outcome
    }

    fn is_eligible(
        &self,
        reactor: CombatantId,
        reaction: &ReactionDefinition,
        event: &TriggerEvent,
    ) -> bool {
        let env = self.env;
        let (Some(me), Some(source), Some(subject)) = (
            self.state.combatant(reactor),
            self.state.combatant(event.source),
            self.state.combatant(event.subject),
        ) else {
            return false;
        };
        if me.is_incapacitated() || me.available(ResourceKind::Reaction) == 0 {
            return false;
        }

        let reach = env.config.melee_reach;
        let positioned = match event.kind {
            ReactionTrigger::AttackHitting | ReactionTrigger::Hit => {
                me.id == subject.id && me.id != source.id
            }
            ReactionTrigger::AllyDamaged => {
                me.id != subject.id
                    && me.faction.side() == subject.faction.side()
                    && me.faction.is_hostile_to(source.faction)
                    && me.position.distance_to(subject.position) <= reaction.range
            }
            ReactionTrigger::LeavesReach => {
                me.id != source.id
                    && me.faction.is_hostile_to(source.faction)
                    && me.position.distance_to(source.position) <= reach
                    && event
                        .destination
                        .is_some_and(|to| me.position.distance_to(to) > reach)
            }
            ReactionTrigger::SpellCast => {
                me.faction.is_hostile_to(source.faction)
                    && me.position.distance_to(source.position) <= env.config.spell_reaction_radius
            }
        };
        if !positioned {
            return false;
        }

        let ctx = QueryContext {
            subject: me,
            source: Some(source),
            target: Some(subject),
            action: event.action,
            critical: None,
        };
        if reaction
            .eligibility
            .as_ref()
            .is_some_and(|predicate| !predicate.evaluate(&ctx))
        {
            return false;
        }

        match reaction.action.as_deref() {
            Some(action_id) => env.catalog.action(action_id).is_some_and(|action| {
                validate_action(
                    &*self.state,
                    env,
                    me,
                    action,
                    &ActionInput::target(event.source),
                    Payment::Reaction,
                )
                .is_ok()
            }),
            None => true,
        }
    }

    fn fire_reaction(
        &mut self,
        reactor: CombatantId,
        reaction: &'a ReactionDefinition,
        event: &TriggerEvent,
        outcome: &mut ReactionOutcome,
    ) {
        let span = tracing::info_span!(
            "combat.reaction",
            reactor = %reactor,
            reaction = %reaction.id,
            depth = self.depth + 1
        );
        let _enter = span.enter();
        tracing::info!(trigger = %event.kind, source = %event.source, "reaction taken");
        self.push(CombatEvent::ReactionTriggered {
            reactor,
            reaction: reaction.id.clone(),
            trigger: event.kind,
            source: event.source,
        });

        let catalog = self.env.catalog;
        match reaction.action.as_deref().and_then(|id| catalog.action(id)) {
            Some(action) => {
                self.depth += 1;
                let run = self.run_action(
                    reactor,
                    action,
                    &ActionInput::target(event.source),
                    Payment::Reaction,
                );
                self.depth -= 1;
                if let Err(err) = run {
                    tracing::warn!(%err, "reaction action failed");
                    return;
                }
            }
            None => {
                let Some(me) = self.state.combatant_mut(reactor) else {
                    return;
                };
                let blocked = me.blocked_resources();
                if let Err(err) = me.budget.spend(&ActionCost::reaction(), blocked) {
                    tracing::warn!(%err, "reaction could not be paid");
                    return;
                }
            }
        }
        outcome.fired.push((reactor, reaction.id.clone()));

        match &reaction.response {
            ReactionResponse::None => {}
            ReactionResponse::CancelTrigger => {
                outcome.cancelled_by.get_or_insert(reactor);
            }
            ReactionResponse::ArmorClassBonus(bonus) => outcome.ac_bonus += bonus,
            ReactionResponse::AttackRollPenalty(formula) => {
                if let Some((me, rolls)) = self.state.with_rolls(reactor) {
                    let penalty = formula.roll(me, rolls, false).total;
                    outcome.penalties.push((reaction.id.clone(), penalty));
                }
            }
        }
    }
}
