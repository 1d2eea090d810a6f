//! Turn policies for simulated combatants.
//!
//! A policy looks at the engine read-only and names one step for the acting
//! combatant. The runner executes the step through the engine exactly like a
//! human-chosen action, then asks again until the policy ends the turn.

use combat_core::engine::{hostile_at, path};
use combat_core::{
    ActionInput, ActionPreview, CombatEngine, CombatState, Combatant, CombatantId, CombatConfig,
    Position, ResourceKind, TargetShape,
};

/// One step of a turn.
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    Act { action: String, input: ActionInput },
    Move(Position),
    EndTurn,
}

/// Chooses steps for the combatant whose turn it is.
pub trait TurnPolicy {
    fn decide(&mut self, engine: &CombatEngine<'_>, actor: CombatantId) -> Decision;
}

/// Ends every turn immediately.
pub struct PassPolicy;

impl TurnPolicy for PassPolicy {
    fn decide(&mut self, _engine: &CombatEngine<'_>, _actor: CombatantId) -> Decision {
        Decision::EndTurn
    }
}

/// Picks the candidate with the best previewed value, or closes in on the
/// nearest enemy when nothing scores.
///
/// Value is expected damage dealt to enemies, minus expected damage to
/// friends, plus expected healing of friends, plus a fixed weight per likely
/// new status.
#[derive(Clone, Debug)]
pub struct GreedyPolicy {
    pub status_weight: f64,
}

impl Default for GreedyPolicy {
    fn default() -> Self {
        Self { status_weight: 2.0 }
    }
}

impl GreedyPolicy {
    /// Every action/selection pair worth previewing.
    pub fn candidates(engine: &CombatEngine<'_>, actor: &Combatant) -> Vec<(String, ActionInput)> {
        let state = engine.state();
        let catalog = engine.env().catalog;
        let mut candidates = Vec::new();
        for id in &actor.actions {
            let Some(action) = catalog.action(id) else {
                continue;
            };
            match action.targeting.shape {
                TargetShape::SelfOnly | TargetShape::Aura { .. } => {
                    candidates.push((id.clone(), ActionInput::none()));
                }
                TargetShape::Single | TargetShape::Multiple { .. } => {
                    for other in state.combatants.iter().filter(|c| !c.is_dead()) {
                        candidates.push((id.clone(), ActionInput::target(other.id)));
                    }
                }
                TargetShape::Circle { .. } => {
                    let others = state
                        .combatants
                        .iter()
                        .filter(|c| c.id != actor.id && c.is_conscious());
                    for other in others {
                        candidates.push((id.clone(), ActionInput::at(other.position)));
                    }
                }
            }
        }
        candidates
    }

    pub fn score(&self, state: &CombatState, actor: &Combatant, preview: &ActionPreview) -> f64 {
        let mut value = preview.self_healing;
        for entry in &preview.targets {
            let Some(target) = state.combatant(entry.target) else {
                continue;
            };
            if actor.faction.is_hostile_to(target.faction) {
                value += entry.expected_damage;
            } else {
                value += entry.expected_healing - entry.expected_damage;
            }
            value += entry
                .statuses
                .iter()
                .filter(|(status, _)| !target.has_status(status))
                .map(|(_, chance)| chance * self.status_weight)
                .sum::<f64>();
        }
        value
    }

    fn best_action(
        &self,
        engine: &CombatEngine<'_>,
        actor: &Combatant,
    ) -> Option<(String, ActionInput, f64)> {
        let state = engine.state();
        let mut best: Option<(String, ActionInput, f64)> = None;
        for (action, input) in Self::candidates(engine, actor) {
            let Ok(preview) = engine.preview_action(actor.id, &action, &input) else {
                continue;
            };
            let value = self.score(state, actor, &preview);
            if value > 0.0 && best.as_ref().is_none_or(|(_, _, top)| value > *top) {
                best = Some((action, input, value));
            }
        }
        best
    }

    /// Farthest reachable free tile on the way to the nearest enemy, short of
    /// any hostile standing in the way.
    fn approach(state: &CombatState, actor: &Combatant) -> Option<Position> {
        let enemy = state
            .combatants
            .iter()
            .filter(|c| c.is_conscious() && actor.faction.is_hostile_to(c.faction))
            .min_by_key(|c| (actor.position.tiles_to(c.position), c.id))?;

        let steps =
            (actor.available(ResourceKind::Movement) / CombatConfig::FEET_PER_TILE) as usize;
        let route = path(actor.position, enemy.position);
        // The last tile of the route is the enemy itself.
        let reachable = route.len().saturating_sub(1).min(steps);
        let open = route[..reachable]
            .iter()
            .take_while(|tile| !hostile_at(state, actor, **tile))
            .count();
        route[..open]
            .iter()
            .rev()
            .copied()
            .find(|tile| !state.is_occupied(*tile, actor.id))
    }
}

impl TurnPolicy for GreedyPolicy {
    fn decide(&mut self, engine: &CombatEngine<'_>, actor: CombatantId) -> Decision {
        let Some(combatant) = engine.state().combatant(actor) else {
            return Decision::EndTurn;
        };

        if let Some((action, input, value)) = self.best_action(engine, combatant) {
            tracing::debug!(actor = %actor, action = %action, value, "greedy pick");
            return Decision::Act { action, input };
        }
        match Self::approach(engine.state(), combatant) {
            Some(tile) => Decision::Move(tile),
            None => Decision::EndTurn,
        }
    }
}
