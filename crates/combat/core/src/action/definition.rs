//! Immutable action catalog entries.

use crate::budget::ActionCost;
use crate::rules::compute_save_dc;
use crate::state::Combatant;
use crate::stats::{Ability, Skill};

use super::effect::EffectKind;
use super::targeting::TargetSpec;

/// Broad category of an action, used by boost predicates and status blocks.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionCategory {
    MeleeWeapon,
    RangedWeapon,
    MeleeSpell,
    RangedSpell,
    /// A spell with no attack roll (saves, buffs, healing).
    Spell,
    /// Class features, shoves, dashes and the like.
    Ability,
}

impl ActionCategory {
    pub fn is_melee(self) -> bool {
        matches!(self, Self::MeleeWeapon | Self::MeleeSpell)
    }

    pub fn is_ranged(self) -> bool {
        matches!(self, Self::RangedWeapon | Self::RangedSpell)
    }

    pub fn is_spell(self) -> bool {
        matches!(self, Self::MeleeSpell | Self::RangedSpell | Self::Spell)
    }

    pub fn is_weapon(self) -> bool {
        matches!(self, Self::MeleeWeapon | Self::RangedWeapon)
    }
}

/// Ability used for an attack roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttackAbility {
    Fixed(Ability),
    /// Better of Strength and Dexterity.
    Finesse,
    /// The attacker's spellcasting ability.
    Spellcasting,
}

impl AttackAbility {
    /// Concrete ability for `attacker`. Spellcasting falls back to Intelligence.
    pub fn resolve(self, attacker: &Combatant) -> Ability {
        match self {
            AttackAbility::Fixed(ability) => ability,
            AttackAbility::Finesse => {
                if attacker.ability_mod(Ability::Strength) >= attacker.ability_mod(Ability::Dexterity) {
                    Ability::Strength
                } else {
                    Ability::Dexterity
                }
            }
            AttackAbility::Spellcasting => attacker.spellcasting.unwrap_or(Ability::Intelligence),
        }
    }
}

/// How a forced save's DC is computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SaveDc {
    /// `8 + proficiency + modifier` of the caster's ability.
    Caster(Ability),
    /// Same, with the caster's spellcasting ability.
    Spellcasting,
    Fixed(i32),
}

impl SaveDc {
    pub fn resolve(self, caster: &Combatant) -> i32 {
        match self {
            SaveDc::Fixed(value) => value,
            SaveDc::Caster(ability) => compute_save_dc(caster, ability),
            SaveDc::Spellcasting => {
                compute_save_dc(caster, caster.spellcasting.unwrap_or(Ability::Intelligence))
            }
        }
    }
}

/// The roll an action makes against each target.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionRoll {
    /// Effects land unconditionally.
    #[default]
    None,
    Attack {
        ability: AttackAbility,
        #[cfg_attr(feature = "serde", serde(default = "proficient_default"))]
        proficient: bool,
        #[cfg_attr(feature = "serde", serde(default))]
        bonus: i32,
    },
    Save {
        ability: Ability,
        dc: SaveDc,
    },
    /// Opposed skill check; the defender uses the best of `against`.
    Contest {
        skill: Skill,
        against: Vec<Skill>,
    },
}

#[cfg(feature = "serde")]
fn proficient_default() -> bool {
    true
}

/// Which combatants an effect applies to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectScope {
    #[default]
    Targets,
    /// The actor, once per action.
    Caster,
}

/// Outcome of the action's roll that an effect requires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectWhen {
    /// The attack hit, the target failed its save or the contest was won.
    #[default]
    OnSuccess,
    Always,
    /// The attack missed, the target saved or the contest was lost.
    OnFailure,
}

/// What a successful save does to an effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SavePolicy {
    /// No effect on a successful save.
    #[default]
    Negate,
    /// Damage is halved on a successful save.
    Half,
    /// Applies regardless of the save.
    Ignore,
}

/// One entry of an action's ordered effect list.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionEffect {
    pub kind: EffectKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub scope: EffectScope,
    #[cfg_attr(feature = "serde", serde(default))]
    pub when: EffectWhen,
    #[cfg_attr(feature = "serde", serde(default))]
    pub save: SavePolicy,
}

impl ActionEffect {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            scope: EffectScope::Targets,
            when: EffectWhen::OnSuccess,
            save: SavePolicy::Negate,
        }
    }

    /// Builder: apply to the caster instead of the targets.
    pub fn on_caster(mut self) -> Self {
        self.scope = EffectScope::Caster;
        self
    }

    pub fn when(mut self, when: EffectWhen) -> Self {
        self.when = when;
        self
    }

    pub fn save(mut self, policy: SavePolicy) -> Self {
        self.save = policy;
        self
    }
}

/// Catalog entry for an action. Shared and never mutated at runtime.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionDefinition {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    pub category: ActionCategory,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: ActionCost,
    #[cfg_attr(feature = "serde", serde(default))]
    pub targeting: TargetSpec,
    #[cfg_attr(feature = "serde", serde(default))]
    pub roll: ActionRoll,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effects: Vec<ActionEffect>,
    /// Statuses applied by this action are held under the caster's concentration.
    #[cfg_attr(feature = "serde", serde(default))]
    pub concentration: bool,
}

impl ActionDefinition {
    pub fn new(id: impl Into<String>, category: ActionCategory) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            category,
            cost: ActionCost::action(),
            targeting: TargetSpec::default(),
            roll: ActionRoll::None,
            effects: Vec::new(),
            concentration: false,
        }
    }

    pub fn with_cost(mut self, cost: ActionCost) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_targeting(mut self, targeting: TargetSpec) -> Self {
        self.targeting = targeting;
        self
    }

    pub fn with_roll(mut self, roll: ActionRoll) -> Self {
        self.roll = roll;
        self
    }

    pub fn with_effect(mut self, effect: ActionEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn concentration(mut self) -> Self {
        self.concentration = true;
        self
    }

    pub fn is_attack(&self) -> bool {
        matches!(self.roll, ActionRoll::Attack { .. })
    }

    /// Weapon attacks may be paid with extra-attack charges.
    pub fn is_weapon_attack(&self) -> bool {
        self.is_attack() && self.category.is_weapon()
    }
}
