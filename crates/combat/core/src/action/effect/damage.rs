//! Damage effect implementation.

use crate::action::error::ActionError;
use crate::action::execute::{DamageHit, EffectContext, ValidationContext};
use crate::action::types::AppliedValue;
use crate::boost::QueryContext;
use crate::dice::DiceFormula;
use crate::stats::DamageType;

/// Deal typed damage to the target.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DealDamageEffect {
    pub formula: DiceFormula,
    pub damage_type: DamageType,
}

impl DealDamageEffect {
    pub fn new(formula: DiceFormula, damage_type: DamageType) -> Self {
        Self {
            formula,
            damage_type,
        }
    }

    /// Pre-validate: No additional validation needed.
    pub fn pre_validate(&self, _ctx: &ValidationContext<'_>) -> Result<(), ActionError> {
        Ok(())
    }

    /// Roll the formula (dice doubled on a critical), add `DamageBonus` boosts
    /// when this is the attack's primary damage, then commit.
    ///
    /// Bonuses of another damage type are committed as separate instances so
    /// each meets its own resistance.
    pub fn apply(&self, ctx: &mut EffectContext<'_, '_>) -> Result<AppliedValue, ActionError> {
        let critical = ctx.critical;
        let category = ctx.category();
        let with_bonus = ctx.is_primary_attack_damage();

        let state = &mut *ctx.pipe.state;
        let (caster, target, rolls) = state
            .pair_with_rolls(ctx.caster, ctx.target)
            .ok_or(ActionError::UnknownCombatant(ctx.target))?;

        let mut raw = self.formula.roll(caster, rolls, critical).total;
        let mut separate = Vec::new();
        if with_bonus {
            let query = QueryContext::roll(caster, Some(target), category).with_critical(critical);
            for (formula, damage_type) in caster.boosts.damage_bonuses(&query) {
                let value = formula.roll(caster, rolls, critical).total;
                match damage_type {
                    Some(other) if other != self.damage_type => separate.push((value, other)),
                    _ => raw += value,
                }
            }
        }

        let planned = raw.max(0) as u32;
        let mut hit = DamageHit {
            source: Some(ctx.caster),
            target: ctx.target,
            raw: planned,
            damage_type: self.damage_type,
            critical,
            halved: ctx.halved,
            category,
        };
        let breakdown = ctx.pipe.commit_damage(&hit)?;
        let mut actual = breakdown.hp_loss + breakdown.absorbed_by_temp_hp;
        let mut planned_total = planned;

        for (value, damage_type) in separate {
            hit.raw = value.max(0) as u32;
            hit.damage_type = damage_type;
            planned_total += hit.raw;
            let breakdown = ctx.pipe.commit_damage(&hit)?;
            actual += breakdown.hp_loss + breakdown.absorbed_by_temp_hp;
        }

        Ok(AppliedValue::Damage {
            planned: planned_total,
            actual,
        })
    }

    /// Post-validate: No additional validation needed.
    pub fn post_validate(&self, _ctx: &EffectContext<'_, '_>) -> Result<(), ActionError> {
        Ok(())
    }
}
