//! The combatant sheet: identity, stats, and everything it owns.

use crate::boost::{BoostDefinition, BoostSource, BoostStore, QueryContext};
use crate::budget::{ActionBudget, ResourceKind, ResourceSet, TurnAllowance};
use crate::dice::FormulaSource;
use crate::status::StatusInstance;
use crate::stats::{
    Ability, AbilityScores, AbilitySet, Skill, ability_modifier, proficiency_bonus,
};

use super::common::{CombatantId, Faction, Position, StatusInstanceId};

/// Consciousness of a combatant. A combatant is never removed from combat;
/// downed and dead sheets stay targetable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LifeState {
    #[default]
    Conscious,
    Downed {
        successes: u8,
        failures: u8,
        stable: bool,
    },
    Dead,
}

impl LifeState {
    pub const fn downed() -> Self {
        LifeState::Downed {
            successes: 0,
            failures: 0,
            stable: false,
        }
    }
}

/// A status instance held on some combatant under this caster's concentration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConcentrationLink {
    pub target: CombatantId,
    pub instance: StatusInstanceId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Concentration {
    pub action: String,
    pub links: Vec<ConcentrationLink>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquippedItem {
    pub slot: String,
    pub item: String,
}

/// A combatant sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub faction: Faction,
    pub level: u32,
    pub abilities: AbilityScores,
    pub save_proficiencies: AbilitySet,
    pub skill_proficiencies: Vec<Skill>,
    pub spellcasting: Option<Ability>,

    pub hp: u32,
    pub base_max_hp: u32,
    pub temp_hp: u32,
    pub base_ac: i32,
    /// Walking speed in feet.
    pub base_speed: u32,
    /// Additional attacks granted by a weapon Attack action.
    pub extra_attacks: u32,

    pub position: Position,
    /// Rolled (or fixed) initiative; `None` until combat starts.
    pub initiative: Option<i32>,
    pub initiative_tiebreaker: i32,
    pub life: LifeState,

    pub boosts: BoostStore,
    pub statuses: Vec<StatusInstance>,
    pub budget: ActionBudget,
    pub concentration: Option<Concentration>,
    pub equipment: Vec<EquippedItem>,

    /// Catalog ids of the actions, reactions and passives this sheet knows.
    pub actions: Vec<String>,
    pub reactions: Vec<String>,
    pub passives: Vec<String>,
    pub tags: Vec<String>,
    /// Once-per-turn passive triggers already used this turn.
    pub passive_uses: Vec<String>,
}

impl Combatant {
    pub fn new(id: CombatantId, name: impl Into<String>, faction: Faction) -> Self {
        Self {
            id,
            name: name.into(),
            faction,
            level: 1,
            abilities: AbilityScores::default(),
            save_proficiencies: AbilitySet::empty(),
            skill_proficiencies: Vec::new(),
            spellcasting: None,
            hp: 10,
            base_max_hp: 10,
            temp_hp: 0,
            base_ac: 10,
            base_speed: 30,
            extra_attacks: 0,
            position: Position::ORIGIN,
            initiative: None,
            initiative_tiebreaker: 0,
            life: LifeState::Conscious,
            boosts: BoostStore::new(),
            statuses: Vec::new(),
            budget: ActionBudget::new(TurnAllowance::default()),
            concentration: None,
            equipment: Vec::new(),
            actions: Vec::new(),
            reactions: Vec::new(),
            passives: Vec::new(),
            tags: Vec::new(),
            passive_uses: Vec::new(),
        }
    }

    // ===== derived stats =====

    pub fn proficiency(&self) -> i32 {
        proficiency_bonus(self.level)
    }

    pub fn ability_score(&self, ability: Ability) -> i32 {
        let ctx = QueryContext::of(self);
        self.abilities.get(ability) + self.boosts.ability_bonus(ability, &ctx)
    }

    pub fn ability_mod(&self, ability: Ability) -> i32 {
        ability_modifier(self.ability_score(ability))
    }

    pub fn max_hp(&self) -> u32 {
        let bonus = self.boosts.max_hp_bonus(&QueryContext::of(self));
        (self.base_max_hp as i64 + bonus as i64).max(1) as u32
    }

    /// Armor class as seen in `ctx` (the counterpart matters for conditional boosts).
    pub fn armor_class(&self, ctx: &QueryContext<'_>) -> i32 {
        self.base_ac + self.boosts.ac_bonus(&ctx.for_subject(self))
    }

    pub fn speed(&self) -> u32 {
        let bonus = self.boosts.speed_bonus(&QueryContext::of(self));
        (self.base_speed as i64 + bonus as i64).max(0) as u32
    }

    pub fn save_proficient(&self, ability: Ability) -> bool {
        self.save_proficiencies.has(ability)
    }

    pub fn skill_proficient(&self, skill: Skill) -> bool {
        self.skill_proficiencies.contains(&skill)
    }

    /// Counters granted at turn start, including boost adjustments.
    pub fn turn_allowance(&self) -> TurnAllowance {
        let ctx = QueryContext::of(self);
        let counter = |kind: ResourceKind| {
            (1 + self.boosts.resource_bonus(kind, &ctx)).max(0) as u32
        };
        let multiplier = self.boosts.resource_multiplier(ResourceKind::Movement, &ctx);
        let bonus = self.boosts.resource_bonus(ResourceKind::Movement, &ctx);
        let movement = (self.speed() as i64 * multiplier as i64 / 100 + bonus as i64).max(0);
        TurnAllowance {
            action: counter(ResourceKind::Action),
            bonus_action: counter(ResourceKind::BonusAction),
            reaction: counter(ResourceKind::Reaction),
            movement: movement as u32,
        }
    }

    /// Economy counters currently unusable. Blocked counters read as zero.
    pub fn blocked_resources(&self) -> ResourceSet {
        if !self.is_conscious() {
            return ResourceSet::all();
        }
        let ctx = QueryContext::of(self);
        let mut blocked = ResourceSet::empty();
        for kind in [
            ResourceKind::Action,
            ResourceKind::BonusAction,
            ResourceKind::Reaction,
            ResourceKind::Movement,
        ] {
            if self.boosts.is_resource_blocked(kind, &ctx) {
                blocked |= kind.flag();
            }
        }
        if self.statuses.iter().any(StatusInstance::is_incapacitating) {
            blocked |= ResourceSet::ACTION | ResourceSet::BONUS_ACTION | ResourceSet::REACTION;
        }
        blocked
    }

    pub fn available(&self, kind: ResourceKind) -> u32 {
        self.budget.available(kind, self.blocked_resources())
    }

    // ===== life state =====

    pub fn is_conscious(&self) -> bool {
        self.life == LifeState::Conscious
    }

    pub fn is_dead(&self) -> bool {
        self.life == LifeState::Dead
    }

    pub fn is_downed(&self) -> bool {
        matches!(self.life, LifeState::Downed { .. })
    }

    pub fn is_incapacitated(&self) -> bool {
        !self.is_conscious() || self.statuses.iter().any(StatusInstance::is_incapacitating)
    }

    /// Player and Ally combatants go down at 0 HP instead of dying.
    pub fn is_player_side(&self) -> bool {
        self.faction.side() == Faction::Player
    }

    // ===== statuses =====

    pub fn has_status(&self, status_id: &str) -> bool {
        self.statuses.iter().any(|s| s.status_id == status_id)
    }

    pub fn status(&self, status_id: &str) -> Option<&StatusInstance> {
        self.statuses.iter().find(|s| s.status_id == status_id)
    }

    pub fn status_instance(&self, id: StatusInstanceId) -> Option<&StatusInstance> {
        self.statuses.iter().find(|s| s.id == id)
    }

    // ===== boosts =====

    pub fn add_boost(&mut self, definition: BoostDefinition, source: BoostSource) {
        self.boosts.add(definition, source);
    }

    /// Remove every boost owned by `source`, clamping HP to the new maximum.
    pub fn remove_boosts_from(&mut self, source: &BoostSource) -> usize {
        let removed = self.boosts.remove_from(source);
        self.hp = self.hp.min(self.max_hp());
        removed
    }

    pub fn equip(&mut self, slot: impl Into<String>, item: impl Into<String>, boosts: &[BoostDefinition]) {
        let slot = slot.into();
        self.unequip(&slot);
        let item = item.into();
        let source = BoostSource::Equipment {
            slot: slot.clone(),
            item: item.clone(),
        };
        self.boosts.add_all(boosts, &source);
        self.equipment.push(EquippedItem { slot, item });
    }

    pub fn unequip(&mut self, slot: &str) -> Option<EquippedItem> {
        let index = self.equipment.iter().position(|e| e.slot == slot)?;
        let item = self.equipment.remove(index);
        self.remove_boosts_from(&BoostSource::Equipment {
            slot: item.slot.clone(),
            item: item.item.clone(),
        });
        Some(item)
    }

    pub fn knows_action(&self, action_id: &str) -> bool {
        self.actions.iter().any(|a| a == action_id)
    }
}

impl FormulaSource for Combatant {
    fn ability_modifier(&self, ability: Ability) -> i32 {
        self.ability_mod(ability)
    }

    fn proficiency_bonus(&self) -> i32 {
        self.proficiency()
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn spellcasting_modifier(&self) -> i32 {
        self.spellcasting.map_or(0, |ability| self.ability_mod(ability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boost::parse_boosts;
    use crate::testing::CombatantBuilder;

    #[test]
    fn boosts_feed_derived_stats() {
        let mut c = CombatantBuilder::new(1, "Paladin")
            .abilities(AbilityScores::new(16, 10, 14, 8, 10, 14))
            .hp(30)
            .ac(18)
            .build();
        assert_eq!(c.ability_mod(Ability::Strength), 3);

        let source = BoostSource::Passive { id: "belt".into() };
        for boost in parse_boosts("Ability(Strength,4);MaximumHP(10);Speed(10)").unwrap() {
            c.add_boost(boost, source.clone());
        }
        assert_eq!(c.ability_mod(Ability::Strength), 5);
        assert_eq!(c.max_hp(), 40);
        assert_eq!(c.speed(), 40);
    }

    #[test]
    fn removing_max_hp_boost_clamps_hp() {
        let mut c = CombatantBuilder::new(1, "Cleric").hp(20).build();
        let source = BoostSource::Passive { id: "aid".into() };
        c.add_boost("MaximumHP(5)".parse().unwrap(), source.clone());
        c.hp = 25;
        c.remove_boosts_from(&source);
        assert_eq!(c.hp, 20);
    }

    #[test]
    fn equipment_boosts_follow_the_slot() {
        let mut c = CombatantBuilder::new(1, "Wizard").ac(12).build();
        let ring = parse_boosts("AC(1)").unwrap();
        c.equip("ring", "RING_OF_PROTECTION", &ring);
        assert_eq!(c.armor_class(&QueryContext::of(&c)), 13);
        c.unequip("ring");
        assert_eq!(c.armor_class(&QueryContext::of(&c)), 12);
        assert!(c.boosts.is_empty());
    }

    #[test]
    fn movement_allowance_scales_and_blocks() {
        let mut c = CombatantBuilder::new(1, "Monk").speed(40).build();
        c.add_boost(
            "ActionResourceMultiplier(Movement,200)".parse().unwrap(),
            BoostSource::Passive { id: "haste".into() },
        );
        assert_eq!(c.turn_allowance().movement, 80);

        c.add_boost(
            "ActionResourceBlock(Movement)".parse().unwrap(),
            BoostSource::Passive { id: "web".into() },
        );
        assert!(c.blocked_resources().has(ResourceKind::Movement));
        assert_eq!(c.available(ResourceKind::Movement), 0);
    }

    #[test]
    fn downed_combatants_have_everything_blocked() {
        let mut c = CombatantBuilder::new(1, "Rogue").build();
        c.life = LifeState::downed();
        assert_eq!(c.blocked_resources(), ResourceSet::all());
        assert!(c.is_incapacitated());
    }
}
