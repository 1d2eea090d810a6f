//! Turn scheduling: initiative, turn boundaries, rounds and termination.

use std::cmp::Ordering;

use crate::action::{ActionError, CombatEvent, Pipeline};
use crate::passive::{PassiveWindow, install_passives};
use crate::rules::roll_initiative;
use crate::state::{CombatOutcome, CombatPhase, Combatant, CombatantId, TurnState};
use crate::stats::Ability;
use crate::status::{self, TickTiming};

/// Initiative order: value, tiebreaker and DEX score descending, then id.
pub(crate) fn initiative_order(a: &Combatant, b: &Combatant) -> Ordering {
    b.initiative
        .cmp(&a.initiative)
        .then(b.initiative_tiebreaker.cmp(&a.initiative_tiebreaker))
        .then(
            b.ability_score(Ability::Dexterity)
                .cmp(&a.ability_score(Ability::Dexterity)),
        )
        .then(a.id.cmp(&b.id))
}

impl Pipeline<'_> {
    /// Install passives, roll initiative and open the first turn.
    pub(super) fn start(&mut self) -> Result<(), ActionError> {
        let catalog = self.env.catalog;
        for combatant in &mut self.state.combatants {
            install_passives(combatant, catalog);
        }

        for id in self.state.ids() {
            let Some((combatant, rolls)) = self.state.with_rolls(id) else {
                continue;
            };
            let (value, rolled) = match combatant.initiative {
                Some(fixed) => (fixed, false),
                None => (roll_initiative(combatant, rolls).total, true),
            };
            if let Some(combatant) = self.state.combatant_mut(id) {
                combatant.initiative = Some(value);
            }
            self.push(CombatEvent::Initiative {
                combatant: id,
                value,
                rolled,
            });
        }

        let mut sorted: Vec<&Combatant> = self.state.combatants.iter().collect();
        sorted.sort_by(|a, b| initiative_order(a, b));
        let order: Vec<CombatantId> = sorted.into_iter().map(|c| c.id).collect();

        for combatant in &mut self.state.combatants {
            let allowance = combatant.turn_allowance();
            combatant.budget.reset_for_round(allowance);
        }
        self.state.turn = TurnState {
            round: 1,
            order: order.clone(),
            index: 0,
            phase: CombatPhase::InProgress,
        };
        tracing::info!(?order, "combat started");
        self.push(CombatEvent::CombatStarted { order });
        self.push(CombatEvent::RoundStarted { round: 1 });

        if self.check_end() {
            return Ok(());
        }
        self.open_turn()
    }

    /// Begin the current combatant's turn. Dead combatants are skipped and
    /// turns of combatants who cannot act end on their own.
    pub(super) fn open_turn(&mut self) -> Result<(), ActionError> {
        while let Some(id) = self.state.turn.current() {
            if self.state.combatant(id).is_none_or(|c| c.is_dead()) {
                self.advance();
                continue;
            }
            self.begin_turn(id)?;
            if self.check_end() || self.is_conscious(id) {
                return Ok(());
            }
            self.finish_turn(id)?;
        }
        Ok(())
    }

    fn begin_turn(&mut self, id: CombatantId) -> Result<(), ActionError> {
        if let Some(combatant) = self.state.combatant_mut(id) {
            combatant.passive_uses.clear();
            let allowance = combatant.turn_allowance();
            combatant.budget.reset_for_turn(allowance);
        }
        let round = self.state.round();
        tracing::info!(combatant = %id, round, "turn started");
        self.push(CombatEvent::TurnStarted {
            combatant: id,
            round,
        });

        self.tick_statuses(id, TickTiming::StartOfTurn)?;
        self.repeat_saves(id, TickTiming::StartOfTurn)?;
        self.run_passives(id, PassiveWindow::TurnStart, None)?;
        if self.state.combatant(id).is_some_and(|c| c.is_downed()) {
            self.death_save(id);
        }
        Ok(())
    }

    /// End-of-turn processing for `id`, then hand over to the next combatant
    /// in order. Does not open the next turn.
    pub(super) fn finish_turn(&mut self, id: CombatantId) -> Result<(), ActionError> {
        self.tick_statuses(id, TickTiming::EndOfTurn)?;
        self.repeat_saves(id, TickTiming::EndOfTurn)?;
        self.run_passives(id, PassiveWindow::TurnEnd, None)?;
        tracing::debug!(combatant = %id, "turn ended");
        self.push(CombatEvent::TurnEnded { combatant: id });
        if !self.check_end() {
            self.advance();
        }
        Ok(())
    }

    /// Run tick effects and decrement durations of statuses ticking at `timing`.
    fn tick_statuses(&mut self, owner: CombatantId, timing: TickTiming) -> Result<(), ActionError> {
        let catalog = self.env.catalog;
        let due = self
            .state
            .combatant(owner)
            .map(|c| status::ticking(c, catalog, timing))
            .unwrap_or_default();
        for instance in due {
            let Some((status_id, source, save_dc)) = self
                .state
                .combatant(owner)
                .and_then(|c| c.status_instance(instance))
                .map(|s| (s.status_id.clone(), s.source, s.save_dc))
            else {
                continue;
            };
            if let Some(definition) = catalog.status(&status_id)
                && !definition.tick_effects.is_empty()
            {
                self.run_side_effects(
                    source.unwrap_or(owner),
                    owner,
                    &definition.tick_effects,
                    false,
                    save_dc,
                )?;
            }
            self.tick_status(owner, instance);
        }
        Ok(())
    }

    /// Move to the next slot in the order. Wrapping starts a new round.
    fn advance(&mut self) {
        let max_rounds = self.env.config.max_rounds;
        let turn = &mut self.state.turn;
        if !turn.is_active() {
            return;
        }
        turn.index += 1;
        if turn.index < turn.order.len() {
            return;
        }
        turn.index = 0;
        turn.round += 1;
        let round = turn.round;
        if round > max_rounds {
            tracing::info!(max_rounds, "round cap reached");
            self.finish(CombatOutcome::Draw);
            return;
        }

        for combatant in &mut self.state.combatants {
            let allowance = combatant.turn_allowance();
            combatant.budget.reset_for_round(allowance);
        }
        tracing::info!(round, "round started");
        self.push(CombatEvent::RoundStarted { round });
    }

    /// End combat once at most one side has a conscious member.
    pub(super) fn check_end(&mut self) -> bool {
        if !self.state.turn.is_active() {
            return true;
        }
        let sides = self.state.standing_sides();
        if sides.len() > 1 {
            return false;
        }
        let outcome = sides
            .first()
            .map_or(CombatOutcome::Draw, |side| CombatOutcome::Victory(*side));
        self.finish(outcome);
        true
    }

    fn finish(&mut self, outcome: CombatOutcome) {
        self.state.turn.phase = CombatPhase::Finished(outcome);
        tracing::info!(?outcome, round = self.state.round(), "combat ended");
        self.push(CombatEvent::CombatEnded { outcome });
    }
}
