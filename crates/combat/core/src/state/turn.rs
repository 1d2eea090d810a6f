use super::common::{CombatantId, Faction};

/// How a finished combat ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatOutcome {
    /// Only this side has conscious members.
    Victory(Faction),
    /// Nobody is left standing, or the round cap was reached.
    Draw,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatPhase {
    #[default]
    Setup,
    InProgress,
    Finished(CombatOutcome),
}

/// Turn and round bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnState {
    /// Current round, starting at 1 once combat begins.
    pub round: u32,
    /// Initiative order, highest first.
    pub order: Vec<CombatantId>,
    /// Index into `order` of the active combatant.
    pub index: usize,
    pub phase: CombatPhase,
}

impl TurnState {
    pub fn current(&self) -> Option<CombatantId> {
        match self.phase {
            CombatPhase::InProgress => self.order.get(self.index).copied(),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase == CombatPhase::InProgress
    }

    pub fn outcome(&self) -> Option<CombatOutcome> {
        match self.phase {
            CombatPhase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Position in the initiative order; combatants outside it sort last.
    pub fn rank(&self, id: CombatantId) -> usize {
        self.order
            .iter()
            .position(|c| *c == id)
            .unwrap_or(self.order.len())
    }
}
