//! Voluntary movement on the grid, with leave-reach reactions per step.

use crate::action::{ActionError, CombatEvent, Pipeline};
use crate::budget::{ActionCost, ResourceKind};
use crate::config::CombatConfig;
use crate::env::CombatEnv;
use crate::reaction::TriggerEvent;
use crate::state::{CombatState, Combatant, CombatantId, Position};
use crate::status::RemovalTrigger;

/// Tiles visited walking from `from` to `to`, excluding `from`.
///
/// Each step moves one tile along both axes while they differ, so the path
/// length equals the Chebyshev distance.
pub fn path(from: Position, to: Position) -> Vec<Position> {
    let mut tiles = Vec::with_capacity(from.tiles_to(to) as usize);
    let mut at = from;
    while at != to {
        at = at.step_relative_to(to, false);
        tiles.push(at);
    }
    tiles
}

/// Whether a living combatant hostile to `mover` stands on `tile`.
pub fn hostile_at(state: &CombatState, mover: &Combatant, tile: Position) -> bool {
    state.combatants.iter().any(|c| {
        c.id != mover.id
            && !c.is_dead()
            && c.position == tile
            && mover.faction.is_hostile_to(c.faction)
    })
}

/// Check a move without touching state. Returns its cost in feet.
///
/// The walk may pass through friendly combatants but not hostile ones, and
/// must end on a free tile.
pub fn validate_move(
    state: &CombatState,
    env: CombatEnv<'_>,
    actor: &Combatant,
    destination: Position,
) -> Result<u32, ActionError> {
    if actor.is_incapacitated() {
        return Err(ActionError::ActorIncapacitated(actor.id));
    }
    if destination == actor.position {
        return Err(ActionError::InvalidTarget {
            reason: "already at destination",
        });
    }
    let route = path(actor.position, destination);
    if route.iter().any(|tile| !env.sight.is_passable(*tile)) {
        return Err(ActionError::InvalidTarget {
            reason: "path is blocked",
        });
    }
    if let Some(tile) = route.into_iter().find(|tile| hostile_at(state, actor, *tile)) {
        return Err(ActionError::Occupied(tile));
    }
    if state.is_occupied(destination, actor.id) {
        return Err(ActionError::Occupied(destination));
    }

    let feet = actor.position.distance_to(destination);
    let blocked = actor.blocked_resources();
    if blocked.has(ResourceKind::Movement) {
        return Err(ActionError::ResourceBlocked(ResourceKind::Movement));
    }
    let cost = ActionCost {
        movement: feet,
        ..ActionCost::default()
    };
    actor.budget.check(&cost, blocked)?;
    Ok(feet)
}

impl Pipeline<'_> {
    /// Walk `actor` to `destination` one tile at a time. Returns feet moved.
    ///
    /// Each step is paid before leave-reach reactions resolve. A mover that
    /// stops being conscious halts where it stands.
    pub(super) fn move_along(
        &mut self,
        actor: CombatantId,
        destination: Position,
    ) -> Result<u32, ActionError> {
        let start = self
            .state
            .combatant(actor)
            .map(|c| c.position)
            .ok_or(ActionError::UnknownCombatant(actor))?;

        let mut at = start;
        let mut moved = 0;
        for step in path(start, destination) {
            {
                let mover = self
                    .state
                    .combatant_mut(actor)
                    .ok_or(ActionError::UnknownCombatant(actor))?;
                let blocked = mover.blocked_resources();
                mover
                    .budget
                    .spend_movement(CombatConfig::FEET_PER_TILE, blocked)?;
            }

            self.offer_reactions(TriggerEvent::leaving(actor, step));
            if !self.is_conscious(actor) {
                tracing::info!(combatant = %actor, at = %at, "movement interrupted");
                break;
            }
            if let Some(mover) = self.state.combatant_mut(actor) {
                mover.position = step;
            }
            at = step;
            moved += CombatConfig::FEET_PER_TILE;
        }

        if moved > 0 {
            tracing::debug!(combatant = %actor, from = %start, to = %at, feet = moved, "moved");
            self.push(CombatEvent::Moved {
                combatant: actor,
                from: start,
                to: at,
                feet: moved,
            });
            self.trigger_removal(actor, RemovalTrigger::OnMove);
        }
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{BlockedTiles, Catalog};
    use crate::testing::CombatantBuilder;

    #[test]
    fn path_length_is_chebyshev() {
        let tiles = path(Position::new(0, 0), Position::new(3, 1));
        assert_eq!(
            tiles,
            vec![Position::new(1, 1), Position::new(2, 1), Position::new(3, 1)]
        );
    }

    #[test]
    fn move_checks_budget_and_occupancy() {
        let catalog = Catalog::default();
        let config = CombatConfig::default();
        let env = CombatEnv::open(&catalog, &config);
        let mut state = CombatState::with_combatants(
            1,
            [
                CombatantBuilder::new(1, "Fighter").build(),
                CombatantBuilder::new(2, "Goblin")
                    .hostile()
                    .at(Position::new(2, 0))
                    .build(),
                CombatantBuilder::new(3, "Squire")
                    .at(Position::new(1, 1))
                    .build(),
            ],
        );
        state.combatants[0].budget.movement = 30;
        let fighter = &state.combatants[0];

        // Through the squire's tile is fine.
        assert_eq!(validate_move(&state, env, fighter, Position::new(4, 1)), Ok(20));
        assert_eq!(
            validate_move(&state, env, fighter, Position::new(1, 1)),
            Err(ActionError::Occupied(Position::new(1, 1)))
        );
        assert_eq!(
            validate_move(&state, env, fighter, Position::new(2, 0)),
            Err(ActionError::Occupied(Position::new(2, 0)))
        );
        assert!(matches!(
            validate_move(&state, env, fighter, Position::new(7, 1)),
            Err(ActionError::InsufficientResource { .. })
        ));
    }

    #[test]
    fn hostiles_block_the_way_through() {
        let catalog = Catalog::default();
        let config = CombatConfig::default();
        let env = CombatEnv::open(&catalog, &config);
        let mut state = CombatState::with_combatants(
            1,
            [
                CombatantBuilder::new(1, "Fighter").build(),
                CombatantBuilder::new(2, "Goblin")
                    .hostile()
                    .at(Position::new(2, 0))
                    .build(),
            ],
        );
        state.combatants[0].budget.movement = 30;
        assert_eq!(
            validate_move(&state, env, &state.combatants[0], Position::new(4, 0)),
            Err(ActionError::Occupied(Position::new(2, 0)))
        );

        // A dead goblin is no obstacle.
        state.combatants[1].life = crate::state::LifeState::Dead;
        assert_eq!(
            validate_move(&state, env, &state.combatants[0], Position::new(4, 0)),
            Ok(20)
        );
    }

    #[test]
    fn walls_block_the_path() {
        let catalog = Catalog::default();
        let config = CombatConfig::default();
        let walls = BlockedTiles::new([Position::new(1, 0)]);
        let env = CombatEnv::new(&catalog, &config, &walls);
        let mut state =
            CombatState::with_combatants(1, [CombatantBuilder::new(1, "Fighter").build()]);
        state.combatants[0].budget.movement = 30;

        assert_eq!(
            validate_move(&state, env, &state.combatants[0], Position::new(2, 0)),
            Err(ActionError::InvalidTarget {
                reason: "path is blocked"
            })
        );
    }
}
