//! Turn scheduling and the action entry points.
//!
//! The [`CombatEngine`] is the authoritative driver for [`CombatState`]. Every
//! mutation (combat start, actions, movement, turn ends) runs inside a
//! transaction: the state is checkpointed first, and restored if the step
//! fails validation or leaves the ledger inconsistent.

mod errors;
mod movement;
mod turns;

pub use errors::EngineError;
pub use movement::{hostile_at, path, validate_move};

use crate::action::{ActionError, ActionInput, ActionResult, CombatEvent, Payment, Pipeline};
use crate::budget::RestKind;
use crate::env::CombatEnv;
use crate::error::ErrorContext;
use crate::preview::{self, ActionPreview};
use crate::reaction::ReactionDecider;
use crate::state::{CombatOutcome, CombatPhase, CombatState, CombatantId, Position};

/// Drives one combat over borrowed state and content.
pub struct CombatEngine<'a> {
    state: &'a mut CombatState,
    env: CombatEnv<'a>,
}

impl<'a> CombatEngine<'a> {
    pub fn new(state: &'a mut CombatState, env: CombatEnv<'a>) -> Self {
        Self { state, env }
    }

    pub fn state(&self) -> &CombatState {
        self.state
    }

    pub fn env(&self) -> CombatEnv<'a> {
        self.env
    }

    pub fn outcome(&self) -> Option<CombatOutcome> {
        self.state.turn.outcome()
    }

    /// Whose turn it is, while combat is in progress.
    pub fn current(&self) -> Option<CombatantId> {
        self.state.turn.current()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Validate every sheet against the catalog, roll initiative and open the
    /// first turn.
    pub fn start_combat(
        &mut self,
        decider: &mut dyn ReactionDecider,
    ) -> Result<Vec<CombatEvent>, EngineError> {
        if self.state.turn.phase != CombatPhase::Setup {
            return Err(EngineError::AlreadyStarted);
        }
        for combatant in &self.state.combatants {
            self.env.catalog.check_combatant(combatant)?;
        }
        let ((), events) = self.transact(None, decider, |pipe| pipe.start())?;
        Ok(events)
    }

    /// Execute one action for the combatant whose turn it is.
    ///
    /// Combat ends as soon as one side is left standing. If the actor is no
    /// longer conscious afterwards (a reaction downed it), its turn ends and
    /// the next one opens.
    pub fn execute_action(
        &mut self,
        actor: CombatantId,
        action: &str,
        input: &ActionInput,
        decider: &mut dyn ReactionDecider,
    ) -> Result<ActionResult, EngineError> {
        self.check_turn(actor)?;
        let (run, events) = self.transact(Some(actor), decider, |pipe| {
            let catalog = pipe.env.catalog;
            let definition = catalog
                .action(action)
                .ok_or_else(|| ActionError::UnknownAction(action.to_string()))?;
            let run = pipe.run_action(actor, definition, input, Payment::Turn)?;
            pipe.settle(actor)?;
            Ok(run)
        })?;
        self.state.nonce += 1;

        Ok(ActionResult {
            actor,
            action: action.to_string(),
            spent: run.spent,
            cancelled: run.cancelled,
            events,
        })
    }

    /// Walk the current combatant to `destination`, paying movement per tile.
    pub fn move_actor(
        &mut self,
        actor: CombatantId,
        destination: Position,
        decider: &mut dyn ReactionDecider,
    ) -> Result<Vec<CombatEvent>, EngineError> {
        self.check_turn(actor)?;
        {
            let mover = self
                .state
                .combatant(actor)
                .ok_or(ActionError::UnknownCombatant(actor))?;
            validate_move(self.state, self.env, mover, destination)?;
        }
        let (_, events) = self.transact(Some(actor), decider, |pipe| {
            let feet = pipe.move_along(actor, destination)?;
            pipe.settle(actor)?;
            Ok(feet)
        })?;
        self.state.nonce += 1;
        Ok(events)
    }

    /// End the current turn and open the next one.
    pub fn end_turn(
        &mut self,
        decider: &mut dyn ReactionDecider,
    ) -> Result<Vec<CombatEvent>, EngineError> {
        let current = self
            .state
            .turn
            .current()
            .ok_or(ActionError::CombatNotActive)?;
        let ((), events) = self.transact(Some(current), decider, |pipe| {
            pipe.finish_turn(current)?;
            if pipe.state.turn.is_active() {
                pipe.open_turn()?;
            }
            Ok(())
        })?;
        Ok(events)
    }

    pub fn short_rest(&mut self) -> Result<(), EngineError> {
        self.rest(RestKind::Short)
    }

    /// Restore resource pools and HP of everyone still alive.
    pub fn long_rest(&mut self) -> Result<(), EngineError> {
        self.rest(RestKind::Long)
    }

    fn rest(&mut self, kind: RestKind) -> Result<(), EngineError> {
        if self.state.turn.is_active() {
            return Err(EngineError::CombatInProgress);
        }
        for combatant in &mut self.state.combatants {
            combatant.budget.rest(kind);
            if kind == RestKind::Long && !combatant.is_dead() {
                combatant.hp = combatant.max_hp();
            }
        }
        tracing::info!(?kind, "rest taken");
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Expected outcome of an action, without rolling or mutating anything.
    pub fn preview_action(
        &self,
        actor: CombatantId,
        action: &str,
        input: &ActionInput,
    ) -> Result<ActionPreview, EngineError> {
        let definition = self
            .env
            .catalog
            .action(action)
            .ok_or_else(|| ActionError::UnknownAction(action.to_string()))?;
        Ok(preview::preview_action(
            self.state, self.env, actor, definition, input,
        )?)
    }

    /// Validate an action without spending or rolling anything.
    pub fn can_execute(&self, actor: CombatantId, action: &str, input: &ActionInput) -> bool {
        self.check_turn(actor).is_ok() && self.preview_action(actor, action, input).is_ok()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn check_turn(&self, actor: CombatantId) -> Result<(), ActionError> {
        match self.state.turn.current() {
            Some(current) if current == actor => Ok(()),
            Some(current) => Err(ActionError::NotActorsTurn(current)),
            None => Err(ActionError::CombatNotActive),
        }
    }

    /// Run `step` against a checkpoint of the state.
    ///
    /// A refused step restores the checkpoint. A step that breaks a ledger
    /// invariant also restores it and reports the violation as fatal.
    fn transact<T>(
        &mut self,
        actor: Option<CombatantId>,
        decider: &mut dyn ReactionDecider,
        step: impl FnOnce(&mut Pipeline<'_>) -> Result<T, ActionError>,
    ) -> Result<(T, Vec<CombatEvent>), EngineError> {
        let checkpoint = self.state.clone();
        let result = {
            let mut pipe = Pipeline::new(&mut *self.state, self.env, decider);
            step(&mut pipe).map(|value| (value, pipe.into_events()))
        };

        let (value, events) = match result {
            Ok(done) => done,
            Err(err) => {
                tracing::debug!(%err, "step refused, state restored");
                *self.state = checkpoint;
                return Err(err.into());
            }
        };

        if let Err(violation) = self.state.check_invariants() {
            tracing::error!(%violation, "invariant violated, state restored");
            #[cfg(feature = "serde")]
            let snapshot = crate::snapshot::encode(&checkpoint).ok();
            #[cfg(not(feature = "serde"))]
            let snapshot = None;

            let mut context = ErrorContext::new(self.state.round(), self.state.nonce);
            if let Some(actor) = actor {
                context = context.with_actor(actor);
            }
            *self.state = checkpoint;
            return Err(EngineError::invariant(violation, snapshot, context));
        }

        Ok((value, events))
    }
}

impl Pipeline<'_> {
    /// Close out a step: end combat if one side is left, and end the turn of
    /// an actor that fell during its own step.
    fn settle(&mut self, actor: CombatantId) -> Result<(), ActionError> {
        if self.check_end() || self.is_conscious(actor) {
            return Ok(());
        }
        tracing::info!(combatant = %actor, "actor fell on its own turn");
        self.finish_turn(actor)?;
        if self.state.turn.is_active() {
            self.open_turn()?;
        }
        Ok(())
    }
}
