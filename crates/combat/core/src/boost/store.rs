//! Per-combatant boost storage and typed queries.
//!
//! Conditional boosts are filtered at query time against the
//! [`QueryContext`]; nothing here caches an evaluated condition.

use std::fmt;

use crate::budget::ResourceKind;
use crate::dice::{AdvantageSources, DiceFormula};
use crate::state::StatusInstanceId;
use crate::stats::{Ability, DamageType, ResistanceLevel};

use super::kinds::{BoostDefinition, BoostKind, CriticalPolicy, RollType};
use super::predicate::QueryContext;

/// Owner of an active boost. Removing the owner removes every boost it added.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoostSource {
    Status {
        instance: StatusInstanceId,
        status: String,
    },
    Equipment {
        slot: String,
        item: String,
    },
    Passive {
        id: String,
    },
}

impl fmt::Display for BoostSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoostSource::Status { instance, status } => write!(f, "Status/{status}@{instance}"),
            BoostSource::Equipment { slot, item } => write!(f, "Equipment/{slot}/{item}"),
            BoostSource::Passive { id } => write!(f, "Passive/{id}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveBoost {
    pub definition: BoostDefinition,
    pub source: BoostSource,
}

/// All boosts currently held by one combatant, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoostStore {
    boosts: Vec<ActiveBoost>,
}

impl BoostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, definition: BoostDefinition, source: BoostSource) {
        self.boosts.push(ActiveBoost { definition, source });
    }

    pub fn add_all<'a>(
        &mut self,
        definitions: impl IntoIterator<Item = &'a BoostDefinition>,
        source: &BoostSource,
    ) {
        for definition in definitions {
            self.add(definition.clone(), source.clone());
        }
    }

    /// Remove every boost owned by `source`; returns how many were removed.
    pub fn remove_from(&mut self, source: &BoostSource) -> usize {
        let before = self.boosts.len();
        self.boosts.retain(|boost| &boost.source != source);
        before - self.boosts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveBoost> {
        self.boosts.iter()
    }

    pub fn len(&self) -> usize {
        self.boosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boosts.is_empty()
    }

    pub fn has_source(&self, source: &BoostSource) -> bool {
        self.boosts.iter().any(|boost| &boost.source == source)
    }

    /// Boost kinds whose condition holds in `ctx`.
    pub fn active<'s>(&'s self, ctx: &'s QueryContext<'_>) -> impl Iterator<Item = &'s BoostKind> {
        self.boosts.iter().filter_map(move |boost| {
            let holds = boost
                .definition
                .condition
                .as_ref()
                .is_none_or(|condition| condition.evaluate(ctx));
            holds.then_some(&boost.definition.kind)
        })
    }

    fn sum(&self, ctx: &QueryContext<'_>, pick: impl Fn(&BoostKind) -> Option<i32>) -> i32 {
        self.active(ctx).filter_map(pick).sum()
    }

    // ===== typed queries =====

    pub fn ac_bonus(&self, ctx: &QueryContext<'_>) -> i32 {
        self.sum(ctx, |kind| match kind {
            BoostKind::ArmorClass(n) => Some(*n),
            _ => None,
        })
    }

    pub fn ability_bonus(&self, ability: Ability, ctx: &QueryContext<'_>) -> i32 {
        self.sum(ctx, |kind| match kind {
            BoostKind::Ability { ability: a, amount } if *a == ability => Some(*amount),
            _ => None,
        })
    }

    /// Every `RollBonus` formula for this roll type. Each is rolled separately.
    pub fn roll_bonuses(&self, roll: RollType, ctx: &QueryContext<'_>) -> Vec<DiceFormula> {
        self.active(ctx)
            .filter_map(|kind| match kind {
                BoostKind::RollBonus { roll: r, formula } if *r == roll => Some(formula.clone()),
                _ => None,
            })
            .collect()
    }

    /// Count advantage and disadvantage sources for a roll. A boost scoped to
    /// an ability only counts when `ability` matches.
    pub fn advantage_sources(
        &self,
        roll: RollType,
        ability: Option<Ability>,
        ctx: &QueryContext<'_>,
    ) -> AdvantageSources {
        let applies = |r: &RollType, scoped: &Option<Ability>| {
            *r == roll && scoped.is_none_or(|s| Some(s) == ability)
        };
        let mut sources = AdvantageSources::NONE;
        for kind in self.active(ctx) {
            match kind {
                BoostKind::Advantage { roll: r, ability: a } if applies(r, a) => {
                    sources.add_advantage(1)
                }
                BoostKind::Disadvantage { roll: r, ability: a } if applies(r, a) => {
                    sources.add_disadvantage(1)
                }
                _ => {}
            }
        }
        sources
    }

    pub fn has_advantage(&self, roll: RollType, ctx: &QueryContext<'_>) -> bool {
        self.advantage_sources(roll, None, ctx).advantage > 0
    }

    pub fn has_disadvantage(&self, roll: RollType, ctx: &QueryContext<'_>) -> bool {
        self.advantage_sources(roll, None, ctx).disadvantage > 0
    }

    /// Net resistance against one damage type, collapsed across all sources.
    pub fn resistance_level(&self, damage_type: DamageType, ctx: &QueryContext<'_>) -> ResistanceLevel {
        ResistanceLevel::collapse(self.active(ctx).filter_map(|kind| match kind {
            BoostKind::Resistance {
                damage_type: t,
                level,
            } if *t == damage_type => Some(*level),
            _ => None,
        }))
    }

    /// Damage bonus formulas. Untyped bonuses use the damage type of the hit.
    pub fn damage_bonuses(&self, ctx: &QueryContext<'_>) -> Vec<(DiceFormula, Option<DamageType>)> {
        self.active(ctx)
            .filter_map(|kind| match kind {
                BoostKind::DamageBonus {
                    formula,
                    damage_type,
                } => Some((formula.clone(), *damage_type)),
                _ => None,
            })
            .collect()
    }

    /// Flat part of the damage bonuses; dice terms are ignored.
    pub fn damage_bonus(&self, ctx: &QueryContext<'_>) -> i32 {
        self.damage_bonuses(ctx)
            .iter()
            .filter(|(formula, _)| formula.is_fixed())
            .map(|(formula, _)| formula.mean(&(), false) as i32)
            .sum()
    }

    pub fn critical_policy(&self, roll: RollType, ctx: &QueryContext<'_>) -> Option<CriticalPolicy> {
        let mut policy = None;
        for kind in self.active(ctx) {
            if let BoostKind::CriticalHit { roll: r, policy: p } = kind
                && *r == roll
            {
                // Never beats Always.
                if *p == CriticalPolicy::Never {
                    return Some(CriticalPolicy::Never);
                }
                policy = Some(*p);
            }
        }
        policy
    }

    pub fn critical_threshold_reduction(&self, ctx: &QueryContext<'_>) -> u32 {
        self.active(ctx)
            .filter_map(|kind| match kind {
                BoostKind::ReduceCriticalAttackThreshold(n) => Some(*n),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    pub fn is_resource_blocked(&self, resource: ResourceKind, ctx: &QueryContext<'_>) -> bool {
        self.active(ctx)
            .any(|kind| matches!(kind, BoostKind::ActionResourceBlock(r) if *r == resource))
    }

    /// Largest multiplier in percent; 100 when none is active.
    pub fn resource_multiplier(&self, resource: ResourceKind, ctx: &QueryContext<'_>) -> u32 {
        self.active(ctx)
            .filter_map(|kind| match kind {
                BoostKind::ActionResourceMultiplier {
                    resource: r,
                    percent,
                } if *r == resource => Some(*percent),
                _ => None,
            })
            .max()
            .unwrap_or(100)
    }

    pub fn resource_bonus(&self, resource: ResourceKind, ctx: &QueryContext<'_>) -> i32 {
        self.sum(ctx, |kind| match kind {
            BoostKind::ActionResource {
                resource: r,
                amount,
            } if *r == resource => Some(*amount),
            _ => None,
        })
    }

    pub fn speed_bonus(&self, ctx: &QueryContext<'_>) -> i32 {
        self.sum(ctx, |kind| match kind {
            BoostKind::Speed(n) => Some(*n),
            _ => None,
        })
    }

    pub fn max_hp_bonus(&self, ctx: &QueryContext<'_>) -> i32 {
        self.sum(ctx, |kind| match kind {
            BoostKind::MaximumHp(n) => Some(*n),
            _ => None,
        })
    }

    pub fn initiative_bonus(&self, ctx: &QueryContext<'_>) -> i32 {
        self.sum(ctx, |kind| match kind {
            BoostKind::Initiative(n) => Some(*n),
            _ => None,
        })
    }

    pub fn spell_save_dc_bonus(&self, ctx: &QueryContext<'_>) -> i32 {
        self.sum(ctx, |kind| match kind {
            BoostKind::SpellSaveDc(n) => Some(*n),
            _ => None,
        })
    }

    pub fn is_immune_to_status(&self, status: &str, ctx: &QueryContext<'_>) -> bool {
        self.active(ctx)
            .any(|kind| matches!(kind, BoostKind::StatusImmunity(id) if id == status))
    }

    pub fn auto_fails(&self, ability: Ability, ctx: &QueryContext<'_>) -> bool {
        self.active(ctx)
            .any(|kind| matches!(kind, BoostKind::AutoFail(a) if *a == ability))
    }
}
