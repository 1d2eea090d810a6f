//! JSON result records, one per line of simulator output.

use std::io::Write;

use combat_content::Scenario;
use combat_core::{
    ActionResult, CombatEvent, CombatOutcome, CombatState, Combatant, CombatantId, Faction,
};
use serde::{Deserialize, Serialize};

/// A combatant as it stands when a record is written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub combatant: CombatantId,
    /// Scenario unit id.
    pub unit: String,
    pub name: String,
    pub faction: Faction,
    pub hp: u32,
    pub max_hp: u32,
}

impl UnitRecord {
    pub fn of(scenario: &Scenario, combatant: &Combatant) -> Self {
        Self {
            combatant: combatant.id,
            unit: scenario.unit_id(combatant.id).unwrap_or_default().to_string(),
            name: combatant.name.clone(),
            faction: combatant.faction,
            hp: combatant.hp,
            max_hp: combatant.max_hp(),
        }
    }

    pub fn all(scenario: &Scenario, state: &CombatState) -> Vec<Self> {
        state
            .combatants
            .iter()
            .map(|combatant| Self::of(scenario, combatant))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum Record {
    Started {
        scenario: String,
        seed: u64,
        units: Vec<UnitRecord>,
        events: Vec<CombatEvent>,
    },
    Action {
        round: u32,
        result: ActionResult,
    },
    Moved {
        round: u32,
        actor: CombatantId,
        events: Vec<CombatEvent>,
    },
    /// The engine turned a step down; the actor's turn ends.
    Refused {
        round: u32,
        actor: CombatantId,
        step: String,
        reason: String,
    },
    TurnEnded {
        round: u32,
        actor: CombatantId,
        events: Vec<CombatEvent>,
    },
    Finished {
        outcome: Option<CombatOutcome>,
        rounds: u32,
        /// Hex SHA-256 of the final state snapshot.
        state_hash: String,
        units: Vec<UnitRecord>,
    },
}

/// Write records as JSON lines.
pub fn write_records<W: Write>(out: &mut W, records: &[Record]) -> anyhow::Result<()> {
    for record in records {
        serde_json::to_writer(&mut *out, record)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}
