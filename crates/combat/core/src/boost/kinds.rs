//! Closed set of boost kinds and their stacking policies.

use std::fmt;

use crate::budget::ResourceKind;
use crate::dice::DiceFormula;
use crate::stats::{Ability, DamageType, ResistanceLevel};

/// Which d20 roll a boost applies to.
///
/// `AttackTarget` applies to attack rolls made *against* the boost owner.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RollType {
    AttackRoll,
    AttackTarget,
    SavingThrow,
    AbilityCheck,
    SkillCheck,
    DeathSave,
    Initiative,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CriticalPolicy {
    /// Every hit is a critical hit.
    Always,
    /// Critical hits are downgraded to normal hits.
    Never,
}

/// How several active boosts of one kind combine into a single value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackingPolicy {
    Sum,
    /// Each boost is one advantage or disadvantage source.
    Count,
    /// Resistance collapse: Immune wins, Resistant and Vulnerable cancel.
    Collapse,
    /// Present if any boost is active.
    Any,
    Max,
}

/// A typed stat or roll modifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoostKind {
    ArmorClass(i32),
    Ability {
        ability: Ability,
        amount: i32,
    },
    RollBonus {
        roll: RollType,
        formula: DiceFormula,
    },
    Advantage {
        roll: RollType,
        ability: Option<Ability>,
    },
    Disadvantage {
        roll: RollType,
        ability: Option<Ability>,
    },
    Resistance {
        damage_type: DamageType,
        level: ResistanceLevel,
    },
    DamageBonus {
        formula: DiceFormula,
        damage_type: Option<DamageType>,
    },
    CriticalHit {
        roll: RollType,
        policy: CriticalPolicy,
    },
    ReduceCriticalAttackThreshold(u32),
    ActionResourceBlock(ResourceKind),
    ActionResourceMultiplier {
        resource: ResourceKind,
        percent: u32,
    },
    ActionResource {
        resource: ResourceKind,
        amount: i32,
    },
    Speed(i32),
    MaximumHp(i32),
    Initiative(i32),
    SpellSaveDc(i32),
    StatusImmunity(String),
    AutoFail(Ability),
}

impl BoostKind {
    /// DSL name of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            BoostKind::ArmorClass(_) => "AC",
            BoostKind::Ability { .. } => "Ability",
            BoostKind::RollBonus { .. } => "RollBonus",
            BoostKind::Advantage { .. } => "Advantage",
            BoostKind::Disadvantage { .. } => "Disadvantage",
            BoostKind::Resistance { .. } => "Resistance",
            BoostKind::DamageBonus { .. } => "DamageBonus",
            BoostKind::CriticalHit { .. } => "CriticalHit",
            BoostKind::ReduceCriticalAttackThreshold(_) => "ReduceCriticalAttackThreshold",
            BoostKind::ActionResourceBlock(_) => "ActionResourceBlock",
            BoostKind::ActionResourceMultiplier { .. } => "ActionResourceMultiplier",
            BoostKind::ActionResource { .. } => "ActionResource",
            BoostKind::Speed(_) => "Speed",
            BoostKind::MaximumHp(_) => "MaximumHP",
            BoostKind::Initiative(_) => "Initiative",
            BoostKind::SpellSaveDc(_) => "SpellSaveDC",
            BoostKind::StatusImmunity(_) => "StatusImmunity",
            BoostKind::AutoFail(_) => "AutoFail",
        }
    }

    /// Fixed combination rule for this kind.
    pub fn stacking(&self) -> StackingPolicy {
        match self {
            BoostKind::ArmorClass(_)
            | BoostKind::Ability { .. }
            | BoostKind::RollBonus { .. }
            | BoostKind::DamageBonus { .. }
            | BoostKind::ActionResource { .. }
            | BoostKind::Speed(_)
            | BoostKind::MaximumHp(_)
            | BoostKind::Initiative(_)
            | BoostKind::SpellSaveDc(_) => StackingPolicy::Sum,
            BoostKind::Advantage { .. } | BoostKind::Disadvantage { .. } => StackingPolicy::Count,
            BoostKind::Resistance { .. } => StackingPolicy::Collapse,
            BoostKind::CriticalHit { .. }
            | BoostKind::ActionResourceBlock(_)
            | BoostKind::StatusImmunity(_)
            | BoostKind::AutoFail(_) => StackingPolicy::Any,
            BoostKind::ReduceCriticalAttackThreshold(_)
            | BoostKind::ActionResourceMultiplier { .. } => StackingPolicy::Max,
        }
    }
}

impl fmt::Display for BoostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            BoostKind::ArmorClass(n)
            | BoostKind::Speed(n)
            | BoostKind::MaximumHp(n)
            | BoostKind::Initiative(n)
            | BoostKind::SpellSaveDc(n) => write!(f, "{name}({n})"),
            BoostKind::Ability { ability, amount } => write!(f, "{name}({ability},{amount})"),
            BoostKind::RollBonus { roll, formula } => write!(f, "{name}({roll},{formula})"),
            BoostKind::Advantage { roll, ability } | BoostKind::Disadvantage { roll, ability } => {
                match ability {
                    Some(ability) => write!(f, "{name}({roll},{ability})"),
                    None => write!(f, "{name}({roll})"),
                }
            }
            BoostKind::Resistance { damage_type, level } => {
                write!(f, "{name}({damage_type},{level})")
            }
            BoostKind::DamageBonus {
                formula,
                damage_type,
            } => match damage_type {
                Some(damage_type) => write!(f, "{name}({formula},{damage_type})"),
                None => write!(f, "{name}({formula})"),
            },
            BoostKind::CriticalHit { roll, policy } => write!(f, "{name}({roll},{policy})"),
            BoostKind::ReduceCriticalAttackThreshold(n) => write!(f, "{name}({n})"),
            BoostKind::ActionResourceBlock(resource) => write!(f, "{name}({resource})"),
            BoostKind::ActionResourceMultiplier { resource, percent } => {
                write!(f, "{name}({resource},{percent})")
            }
            BoostKind::ActionResource { resource, amount } => {
                write!(f, "{name}({resource},{amount})")
            }
            BoostKind::StatusImmunity(status) => write!(f, "{name}({status})"),
            BoostKind::AutoFail(ability) => write!(f, "{name}({ability})"),
        }
    }
}

/// One parsed boost: an optional condition and the modifier it grants.
///
/// Serialized as its DSL text (`IF(IsMeleeAttack()):Advantage(AttackRoll)`).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct BoostDefinition {
    pub condition: Option<super::Predicate>,
    pub kind: BoostKind,
}

impl BoostDefinition {
    pub fn new(kind: BoostKind) -> Self {
        Self {
            condition: None,
            kind,
        }
    }

    pub fn when(mut self, condition: super::Predicate) -> Self {
        self.condition = Some(condition);
        self
    }
}

impl fmt::Display for BoostDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(condition) = &self.condition {
            write!(f, "IF({condition}):")?;
        }
        write!(f, "{}", self.kind)
    }
}

impl From<BoostDefinition> for String {
    fn from(value: BoostDefinition) -> Self {
        value.to_string()
    }
}
