//! Battle scenario loader.
//!
//! Scenarios are JSON documents listing the units of one battle:
//!
//! ```json
//! {
//!   "id": "random_2v2_seed_7",
//!   "name": "Random 2v2 (Seed 7)",
//!   "seed": 7,
//!   "units": [
//!     { "id": "player_1", "name": "Aldric", "faction": "player",
//!       "hp": 52, "maxHp": 52, "initiative": 14, "initiativeTiebreaker": 61,
//!       "x": -4.2, "y": 0, "z": 1.3,
//!       "abilities": ["main_hand_attack", "second_wind"], "tags": [] }
//!   ]
//! }
//! ```
//!
//! `abilities` lists catalog action ids. Sheet fields the document leaves out
//! take the defaults of a fresh level 1 combatant. Coordinates are rounded to
//! grid tiles on the `x`/`z` plane.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, bail};
use combat_core::{
    Ability, AbilityScores, ActionBudget, Catalog, CombatState, Combatant, CombatantId, Faction,
    Position, Recharge, ResourcePool,
};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, ResourceTable, read_file};

/// One battle: a seed and its units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub seed: u64,
    pub units: Vec<ScenarioUnit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioUnit {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub faction: Faction,
    pub hp: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hp: Option<u32>,
    /// Fixed initiative; rolled at combat start when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiative: Option<i32>,
    #[serde(default)]
    pub initiative_tiebreaker: i32,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    /// Known action ids.
    #[serde(default)]
    pub abilities: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,

    // ===== optional sheet fields =====
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ability_scores: Option<AbilityScores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ac: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spellcasting: Option<Ability>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub save_proficiencies: Vec<Ability>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub extra_attacks: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub passives: Vec<String>,
    /// Known reaction ids. When absent, every catalog reaction whose action
    /// the unit knows is granted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactions: Option<Vec<String>>,
    /// Pool maximums overriding the resource table.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<String, u32>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl ScenarioUnit {
    /// A unit at the origin with no abilities and a default sheet.
    pub fn new(id: impl Into<String>, name: impl Into<String>, faction: Faction, hp: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            faction,
            hp,
            max_hp: Some(hp),
            initiative: None,
            initiative_tiebreaker: 0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            abilities: Vec::new(),
            tags: Vec::new(),
            ability_scores: None,
            level: None,
            ac: None,
            speed: None,
            spellcasting: None,
            save_proficiencies: Vec::new(),
            extra_attacks: 0,
            passives: Vec::new(),
            reactions: None,
            resources: BTreeMap::new(),
        }
    }

    /// Grid tile the unit starts on.
    pub fn tile(&self) -> Position {
        Position::new(self.x.round() as i32, self.z.round() as i32)
    }

    fn to_combatant(
        &self,
        id: CombatantId,
        position: Position,
        catalog: &Catalog,
        resources: &ResourceTable,
    ) -> LoadResult<Combatant> {
        let name = if self.name.is_empty() { &self.id } else { &self.name };
        let max_hp = self.max_hp.unwrap_or(self.hp);
        if self.hp > max_hp {
            bail!("hp {} exceeds maxHp {}", self.hp, max_hp);
        }

        let mut combatant = Combatant::new(id, name.as_str(), self.faction);
        combatant.hp = self.hp;
        combatant.base_max_hp = max_hp;
        combatant.position = position;
        combatant.initiative = self.initiative;
        combatant.initiative_tiebreaker = self.initiative_tiebreaker;
        combatant.actions = self.abilities.clone();
        combatant.tags = self.tags.clone();
        combatant.passives = self.passives.clone();
        combatant.extra_attacks = self.extra_attacks;
        combatant.spellcasting = self.spellcasting;
        combatant.save_proficiencies = self.save_proficiencies.iter().copied().collect();
        if let Some(scores) = &self.ability_scores {
            combatant.abilities = *scores;
        }
        if let Some(level) = self.level {
            combatant.level = level;
        }
        if let Some(ac) = self.ac {
            combatant.base_ac = ac;
        }
        if let Some(speed) = self.speed {
            combatant.base_speed = speed;
        }
        combatant.reactions = match &self.reactions {
            Some(reactions) => reactions.clone(),
            None => catalog
                .reactions()
                .filter(|r| r.action.as_ref().is_some_and(|a| self.abilities.contains(a)))
                .map(|r| r.id.clone())
                .collect(),
        };

        let mut budget = ActionBudget::new(combatant.turn_allowance());
        for (pool, max) in self.pools(&combatant, catalog, resources)? {
            budget = budget.with_pool(pool, max);
        }
        combatant.budget = budget;

        catalog
            .check_combatant(&combatant)
            .with_context(|| format!("unit '{}'", self.id))?;
        Ok(combatant)
    }

    /// Pools needed by the unit's actions and reaction actions, plus any the
    /// unit lists explicitly.
    fn pools(
        &self,
        combatant: &Combatant,
        catalog: &Catalog,
        resources: &ResourceTable,
    ) -> LoadResult<Vec<(String, ResourcePool)>> {
        let reaction_actions = combatant
            .reactions
            .iter()
            .filter_map(|id| catalog.reaction(id))
            .filter_map(|r| r.action.as_deref());
        let mut needed: BTreeSet<&str> = combatant
            .actions
            .iter()
            .map(String::as_str)
            .chain(reaction_actions)
            .filter_map(|id| catalog.action(id))
            .flat_map(|action| action.cost.resources.keys().map(String::as_str))
            .collect();
        needed.extend(self.resources.keys().map(String::as_str));

        let mut pools = Vec::with_capacity(needed.len());
        for name in needed {
            let template = resources.get(name);
            let pool = match (self.resources.get(name), template) {
                (Some(&max), Some(template)) => ResourcePool::full(max, template.recharge),
                (Some(&max), None) => ResourcePool::full(max, Recharge::LongRest),
                (None, Some(template)) => template.full(),
                (None, None) => bail!("unit '{}' needs pool '{}' with no default size", self.id, name),
            };
            pools.push((name.to_string(), pool));
        }
        Ok(pools)
    }
}

impl Scenario {
    /// Build the initial combat state.
    ///
    /// Units get ids `#1`, `#2`, ... in document order. Units rounding onto
    /// an occupied tile are moved to the nearest free one.
    pub fn build(&self, catalog: &Catalog, resources: &ResourceTable) -> LoadResult<CombatState> {
        let mut seen = BTreeSet::new();
        let mut occupied = BTreeSet::new();
        let mut combatants = Vec::with_capacity(self.units.len());

        for (index, unit) in self.units.iter().enumerate() {
            if !seen.insert(unit.id.as_str()) {
                bail!("scenario '{}' has duplicate unit id '{}'", self.id, unit.id);
            }
            let position = nearest_free(&occupied, unit.tile());
            occupied.insert(position);
            let id = CombatantId(index as u32 + 1);
            let combatant = unit
                .to_combatant(id, position, catalog, resources)
                .with_context(|| format!("Failed to build scenario '{}'", self.id))?;
            combatants.push(combatant);
        }

        tracing::info!(scenario = %self.id, units = combatants.len(), seed = self.seed, "scenario built");
        Ok(CombatState::with_combatants(self.seed, combatants))
    }

    /// Scenario id of the unit behind a combatant.
    pub fn unit_id(&self, combatant: CombatantId) -> Option<&str> {
        let index = (combatant.0 as usize).checked_sub(1)?;
        self.units.get(index).map(|unit| unit.id.as_str())
    }
}

/// Closest unoccupied tile, searching outward ring by ring.
fn nearest_free(occupied: &BTreeSet<Position>, wanted: Position) -> Position {
    if !occupied.contains(&wanted) {
        return wanted;
    }
    for radius in 1i32.. {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx.abs().max(dy.abs()) != radius {
                    continue;
                }
                let candidate = Position::new(wanted.x + dx, wanted.y + dy);
                if !occupied.contains(&candidate) {
                    return candidate;
                }
            }
        }
    }
    wanted
}

/// Loader for scenarios from JSON files.
pub struct ScenarioLoader;

impl ScenarioLoader {
    pub fn parse(text: &str) -> LoadResult<Scenario> {
        serde_json::from_str(text).map_err(|e| anyhow::anyhow!("Failed to parse scenario JSON: {}", e))
    }

    pub fn load(path: &Path) -> LoadResult<Scenario> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("scenario {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack;

    const DUEL: &str = r#"{
        "id": "duel",
        "name": "Duel",
        "seed": 11,
        "units": [
            { "id": "player_1", "name": "Aldric", "faction": "player", "hp": 40, "maxHp": 44,
              "initiative": 12, "initiativeTiebreaker": 3, "x": -0.4, "y": 0, "z": 0.3,
              "abilities": ["main_hand_attack", "second_wind", "cure_wounds"], "tags": ["melee"] },
            { "id": "hostile_1", "name": "Vex", "faction": "hostile", "hp": 30,
              "x": 0.2, "y": 0, "z": -0.1,
              "abilities": ["main_hand_attack"], "abilityScores": { "strength": 16 }, "ac": 13 }
        ]
    }"#;

    fn build(text: &str) -> LoadResult<CombatState> {
        let scenario = ScenarioLoader::parse(text)?;
        scenario.build(&pack::catalog()?, &pack::resources()?)
    }

    #[test]
    fn builds_sheets_from_units() {
        let state = build(DUEL).unwrap();
        assert_eq!(state.rolls.seed(), 11);

        let aldric = state.combatant(CombatantId(1)).unwrap();
        assert_eq!((aldric.hp, aldric.base_max_hp), (40, 44));
        assert_eq!(aldric.initiative, Some(12));
        assert_eq!(aldric.position, Position::new(0, 0));
        assert_eq!(aldric.reactions, vec!["opportunity_attack".to_string()]);
        assert_eq!(aldric.budget.pool("second_wind").map(|p| p.max), Some(1));
        assert_eq!(aldric.budget.pool("spell_slot_1").map(|p| p.max), Some(2));

        let vex = state.combatant(CombatantId(2)).unwrap();
        assert_eq!(vex.faction, Faction::Hostile);
        assert_eq!(vex.base_ac, 13);
        assert_eq!(vex.abilities.strength, 16);
        assert_eq!(vex.abilities.dexterity, 10);
        assert_eq!(vex.initiative, None);
        // Both units round onto (0, 0); the second is nudged.
        assert_ne!(vex.position, aldric.position);
        assert_eq!(vex.position.tiles_to(aldric.position), 1);
    }

    #[test]
    fn unknown_action_is_rejected() {
        let text = DUEL.replace("second_wind", "meteor_swarm");
        let err = build(&text).unwrap_err();
        assert!(format!("{err:#}").contains("meteor_swarm"));
    }

    #[test]
    fn hp_above_max_is_rejected() {
        let text = DUEL.replace("\"maxHp\": 44", "\"maxHp\": 20");
        assert!(build(&text).is_err());
    }

    #[test]
    fn duplicate_unit_ids_are_rejected() {
        let text = DUEL.replace("hostile_1", "player_1");
        let err = build(&text).unwrap_err();
        assert!(err.to_string().contains("duplicate unit id"));
    }

    #[test]
    fn unit_ids_follow_document_order() {
        let scenario = ScenarioLoader::parse(DUEL).unwrap();
        assert_eq!(scenario.unit_id(CombatantId(2)), Some("hostile_1"));
        assert_eq!(scenario.unit_id(CombatantId(0)), None);
        assert_eq!(scenario.unit_id(CombatantId(3)), None);
    }

    #[test]
    fn nearest_free_walks_rings() {
        let mut occupied = BTreeSet::new();
        occupied.insert(Position::new(0, 0));
        assert_eq!(nearest_free(&occupied, Position::new(0, 0)), Position::new(-1, -1));
        assert_eq!(nearest_free(&occupied, Position::new(2, 2)), Position::new(2, 2));
    }
}
