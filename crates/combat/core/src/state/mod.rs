//! Mutable combat state.
//!
//! [`CombatState`] is the complete persisted state: combatants with their
//! statuses, boosts and budgets, the turn/round counters, and the RNG stream.
//! Content catalogs are not part of it.

mod combatant;
mod common;
mod turn;

pub use combatant::{Combatant, Concentration, ConcentrationLink, EquippedItem, LifeState};
pub use common::{CombatantId, Faction, Position, StatusInstanceId};
pub use turn::{CombatOutcome, CombatPhase, TurnState};

use crate::dice::RollStream;
use crate::error::InvariantViolation;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatState {
    pub combatants: Vec<Combatant>,
    pub turn: TurnState,
    pub rolls: RollStream,
    /// Next status instance id to allocate.
    pub next_status_instance: u64,
    /// Number of actions executed so far.
    pub nonce: u64,
}

impl CombatState {
    pub fn new(seed: u64) -> Self {
        Self {
            combatants: Vec::new(),
            turn: TurnState::default(),
            rolls: RollStream::new(seed),
            next_status_instance: 1,
            nonce: 0,
        }
    }

    pub fn with_combatants(seed: u64, combatants: impl IntoIterator<Item = Combatant>) -> Self {
        let mut state = Self::new(seed);
        state.combatants.extend(combatants);
        state
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.iter_mut().find(|c| c.id == id)
    }

    /// A combatant together with the roll stream, for rolls made by one sheet.
    pub fn with_rolls(&mut self, id: CombatantId) -> Option<(&Combatant, &mut RollStream)> {
        let Self {
            combatants, rolls, ..
        } = self;
        let combatant = combatants.iter().find(|c| c.id == id)?;
        Some((combatant, rolls))
    }

    /// Two combatants (possibly the same one) together with the roll stream.
    pub fn pair_with_rolls(
        &mut self,
        first: CombatantId,
        second: CombatantId,
    ) -> Option<(&Combatant, &Combatant, &mut RollStream)> {
        let Self {
            combatants, rolls, ..
        } = self;
        let a = combatants.iter().find(|c| c.id == first)?;
        let b = combatants.iter().find(|c| c.id == second)?;
        Some((a, b, rolls))
    }

    pub fn ids(&self) -> Vec<CombatantId> {
        self.combatants.iter().map(|c| c.id).collect()
    }

    pub fn allocate_status_instance(&mut self) -> StatusInstanceId {
        let id = StatusInstanceId(self.next_status_instance);
        self.next_status_instance += 1;
        id
    }

    pub fn round(&self) -> u32 {
        self.turn.round
    }

    /// Whether a living combatant other than `except` stands on `position`.
    pub fn is_occupied(&self, position: Position, except: CombatantId) -> bool {
        self.combatants
            .iter()
            .any(|c| c.id != except && !c.is_dead() && c.position == position)
    }

    /// Sides that still have a conscious member, deduplicated.
    pub fn standing_sides(&self) -> Vec<Faction> {
        let mut sides: Vec<Faction> = Vec::new();
        for combatant in self.combatants.iter().filter(|c| c.is_conscious()) {
            let side = combatant.faction.side();
            if side != Faction::Neutral && !sides.contains(&side) {
                sides.push(side);
            }
        }
        sides
    }

    /// Check ledger invariants that must hold after every committed step.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for combatant in &self.combatants {
            let maximum = combatant.max_hp();
            if combatant.hp > maximum {
                return Err(InvariantViolation::HpAboveMaximum {
                    combatant: combatant.id,
                    current: combatant.hp,
                    maximum,
                });
            }
            for boost in combatant.boosts.iter() {
                let owned = match &boost.source {
                    crate::boost::BoostSource::Status { instance, .. } => {
                        combatant.status_instance(*instance).is_some()
                    }
                    crate::boost::BoostSource::Equipment { slot, item } => combatant
                        .equipment
                        .iter()
                        .any(|e| &e.slot == slot && &e.item == item),
                    crate::boost::BoostSource::Passive { id } => combatant.passives.contains(id),
                };
                if !owned {
                    return Err(InvariantViolation::OrphanBoost {
                        combatant: combatant.id,
                        source_tag: boost.source.to_string(),
                    });
                }
            }
            for status in &combatant.statuses {
                let count = combatant
                    .statuses
                    .iter()
                    .filter(|s| s.group == status.group)
                    .count();
                if count > 1 {
                    return Err(InvariantViolation::StackGroupOverflow {
                        combatant: combatant.id,
                        group: status.group.clone(),
                        count,
                    });
                }
            }
        }
        Ok(())
    }
}
