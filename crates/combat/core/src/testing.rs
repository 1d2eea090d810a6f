//! Fixture builders for tests and tooling.

use std::collections::{BTreeMap, VecDeque};

use crate::action::ActionDefinition;
use crate::budget::{ActionBudget, ResourcePool};
use crate::env::{Catalog, CatalogError};
use crate::passive::PassiveDefinition;
use crate::reaction::{ReactionDecider, ReactionDefinition, ReactionOffer};
use crate::state::{CombatState, Combatant, CombatantId, Faction, Position};
use crate::stats::{Ability, AbilityScores};
use crate::status::StatusDefinition;

/// Builder for combatant sheets with sensible defaults: a level 1 player-side
/// combatant at the origin with 10 HP, AC 10 and 30 ft of speed.
#[derive(Clone, Debug)]
pub struct CombatantBuilder {
    combatant: Combatant,
    pools: Vec<(String, ResourcePool)>,
}

impl CombatantBuilder {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            combatant: Combatant::new(CombatantId(id), name, Faction::Player),
            pools: Vec::new(),
        }
    }

    pub fn faction(mut self, faction: Faction) -> Self {
        self.combatant.faction = faction;
        self
    }

    pub fn hostile(self) -> Self {
        self.faction(Faction::Hostile)
    }

    pub fn at(mut self, position: Position) -> Self {
        self.combatant.position = position;
        self
    }

    /// Current and maximum HP.
    pub fn hp(mut self, hp: u32) -> Self {
        self.combatant.hp = hp;
        self.combatant.base_max_hp = hp;
        self
    }

    pub fn ac(mut self, ac: i32) -> Self {
        self.combatant.base_ac = ac;
        self
    }

    pub fn speed(mut self, feet: u32) -> Self {
        self.combatant.base_speed = feet;
        self
    }

    pub fn level(mut self, level: u32) -> Self {
        self.combatant.level = level;
        self
    }

    pub fn abilities(mut self, abilities: AbilityScores) -> Self {
        self.combatant.abilities = abilities;
        self
    }

    pub fn saves(mut self, abilities: impl IntoIterator<Item = Ability>) -> Self {
        self.combatant.save_proficiencies = abilities.into_iter().collect();
        self
    }

    pub fn spellcasting(mut self, ability: Ability) -> Self {
        self.combatant.spellcasting = Some(ability);
        self
    }

    pub fn extra_attacks(mut self, count: u32) -> Self {
        self.combatant.extra_attacks = count;
        self
    }

    /// Skip the initiative roll and use this value.
    pub fn initiative(mut self, value: i32) -> Self {
        self.combatant.initiative = Some(value);
        self
    }

    pub fn actions<'s>(mut self, ids: impl IntoIterator<Item = &'s str>) -> Self {
        self.combatant.actions = ids.into_iter().map(str::to_string).collect();
        self
    }

    pub fn reactions<'s>(mut self, ids: impl IntoIterator<Item = &'s str>) -> Self {
        self.combatant.reactions = ids.into_iter().map(str::to_string).collect();
        self
    }

    pub fn passives<'s>(mut self, ids: impl IntoIterator<Item = &'s str>) -> Self {
        self.combatant.passives = ids.into_iter().map(str::to_string).collect();
        self
    }

    pub fn pool(mut self, name: &str, pool: ResourcePool) -> Self {
        self.pools.push((name.to_string(), pool));
        self
    }

    /// Finish the sheet with a full budget derived from its final stats.
    pub fn build(self) -> Combatant {
        let mut combatant = self.combatant;
        let budget = self
            .pools
            .into_iter()
            .fold(ActionBudget::new(combatant.turn_allowance()), |budget, (name, pool)| {
                budget.with_pool(name, pool)
            });
        combatant.budget = budget;
        combatant
    }
}

/// Collects definitions and builds a validated [`Catalog`].
#[derive(Clone, Debug, Default)]
pub struct CatalogBuilder {
    actions: Vec<ActionDefinition>,
    statuses: Vec<StatusDefinition>,
    reactions: Vec<ReactionDefinition>,
    passives: Vec<PassiveDefinition>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(mut self, action: ActionDefinition) -> Self {
        self.actions.push(action);
        self
    }

    pub fn status(mut self, status: StatusDefinition) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn reaction(mut self, reaction: ReactionDefinition) -> Self {
        self.reactions.push(reaction);
        self
    }

    pub fn passive(mut self, passive: PassiveDefinition) -> Self {
        self.passives.push(passive);
        self
    }

    pub fn build(self) -> Result<Catalog, CatalogError> {
        Catalog::new(self.actions, self.statuses, self.reactions, self.passives)
    }
}

/// Reaction decider answering from a script.
///
/// Per-reaction policies win over the queue; once the queue runs dry the
/// fallback answer is used. Every offer is recorded for assertions.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDecider {
    answers: VecDeque<bool>,
    policies: BTreeMap<String, bool>,
    fallback: bool,
    offers: Vec<(CombatantId, String)>,
}

impl ScriptedDecider {
    /// Answer offers in order from `answers`, then decline.
    pub fn answers(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn always(answer: bool) -> Self {
        Self {
            fallback: answer,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, reaction: &str, answer: bool) -> Self {
        self.policies.insert(reaction.to_string(), answer);
        self
    }

    /// Offers seen so far as `(reactor, reaction id)`.
    pub fn offers(&self) -> &[(CombatantId, String)] {
        &self.offers
    }
}

impl ReactionDecider for ScriptedDecider {
    fn decide(&mut self, _state: &CombatState, offer: &ReactionOffer<'_>) -> bool {
        self.offers.push((offer.reactor, offer.reaction.id.clone()));
        if let Some(answer) = self.policies.get(&offer.reaction.id) {
            return *answer;
        }
        self.answers.pop_front().unwrap_or(self.fallback)
    }
}
