//! Healing and temporary hit points.

use crate::action::error::ActionError;
use crate::action::execute::{EffectContext, ValidationContext};
use crate::action::types::{AppliedValue, CombatEvent};
use crate::dice::DiceFormula;

/// Restore HP up to the maximum. Healing a downed target brings it back up.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealEffect {
    pub formula: DiceFormula,
}

impl HealEffect {
    pub fn new(formula: DiceFormula) -> Self {
        Self { formula }
    }

    pub fn pre_validate(&self, _ctx: &ValidationContext<'_>) -> Result<(), ActionError> {
        Ok(())
    }

    pub fn apply(&self, ctx: &mut EffectContext<'_, '_>) -> Result<AppliedValue, ActionError> {
        let planned = ctx.roll_formula(&self.formula)?.max(0) as u32;
        let actual = ctx.pipe.heal(Some(ctx.caster), ctx.target, planned)?;
        Ok(AppliedValue::Healing { planned, actual })
    }

    /// Post-validate: HP never exceeds the maximum.
    pub fn post_validate(&self, ctx: &EffectContext<'_, '_>) -> Result<(), ActionError> {
        match ctx.pipe.state.combatant(ctx.target) {
            Some(target) if target.hp > target.max_hp() => {
                Err(ActionError::EffectFailed("healing exceeded maximum HP"))
            }
            _ => Ok(()),
        }
    }
}

/// Grant temporary HP. Temporary HP never stacks: the higher value is kept.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TemporaryHpEffect {
    pub formula: DiceFormula,
}

impl TemporaryHpEffect {
    pub fn new(formula: DiceFormula) -> Self {
        Self { formula }
    }

    pub fn pre_validate(&self, _ctx: &ValidationContext<'_>) -> Result<(), ActionError> {
        Ok(())
    }

    pub fn apply(&self, ctx: &mut EffectContext<'_, '_>) -> Result<AppliedValue, ActionError> {
        let amount = ctx.roll_formula(&self.formula)?.max(0) as u32;
        let target = ctx
            .pipe
            .state
            .combatant_mut(ctx.target)
            .ok_or(ActionError::UnknownCombatant(ctx.target))?;
        if target.is_dead() || amount <= target.temp_hp {
            return Ok(AppliedValue::TemporaryHp { granted: 0 });
        }
        let granted = amount - target.temp_hp;
        target.temp_hp = amount;
        ctx.pipe.events.push(CombatEvent::TemporaryHp {
            target: ctx.target,
            amount,
        });
        Ok(AppliedValue::TemporaryHp { granted })
    }

    pub fn post_validate(&self, _ctx: &EffectContext<'_, '_>) -> Result<(), ActionError> {
        Ok(())
    }
}
