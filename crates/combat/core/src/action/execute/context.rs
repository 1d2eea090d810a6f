//! Effect execution contexts and the effect dispatcher.

use crate::action::definition::{ActionCategory, ActionDefinition};
use crate::action::effect::EffectKind;
use crate::action::error::ActionError;
use crate::action::types::AppliedValue;
use crate::dice::DiceFormula;
use crate::env::CombatEnv;
use crate::state::{CombatState, Combatant, CombatantId};

use super::pipeline::Pipeline;

// ============================================================================
// Validation Context
// ============================================================================

/// Read-only view used by `pre_validate`, before anything is spent.
pub struct ValidationContext<'s> {
    pub state: &'s CombatState,
    pub env: CombatEnv<'s>,
    pub caster: &'s Combatant,
    pub target: &'s Combatant,
    pub action: Option<&'s ActionDefinition>,
}

// ============================================================================
// Effect Context
// ============================================================================

/// Context for one effect applied to one target.
///
/// Built fresh for every (effect, target) pair. Tick and passive effects run
/// with `action: None`.
pub struct EffectContext<'p, 'a> {
    pub(crate) pipe: &'p mut Pipeline<'a>,
    pub caster: CombatantId,
    pub target: CombatantId,
    pub action: Option<&'a ActionDefinition>,
    /// Position of the effect in the action's list.
    pub effect_index: usize,
    pub critical: bool,
    /// The target saved against a half-damage effect.
    pub halved: bool,
    /// DC recorded on statuses for their repeat saves.
    pub save_dc: Option<i32>,
}

impl<'p, 'a> EffectContext<'p, 'a> {
    pub(crate) fn new(pipe: &'p mut Pipeline<'a>, caster: CombatantId, target: CombatantId) -> Self {
        Self {
            pipe,
            caster,
            target,
            action: None,
            effect_index: 0,
            critical: false,
            halved: false,
            save_dc: None,
        }
    }

    pub fn category(&self) -> Option<ActionCategory> {
        self.action.map(|a| a.category)
    }

    /// `DamageBonus` boosts ride on the first damage effect of an attack only.
    pub fn is_primary_attack_damage(&self) -> bool {
        self.action.is_some_and(|action| {
            action.is_attack()
                && action
                    .effects
                    .iter()
                    .position(|e| matches!(e.kind, EffectKind::DealDamage(_)))
                    == Some(self.effect_index)
        })
    }

    /// Roll a non-damage formula against the caster's sheet.
    pub(crate) fn roll_formula(&mut self, formula: &DiceFormula) -> Result<i32, ActionError> {
        let (caster, rolls) = self
            .pipe
            .state
            .with_rolls(self.caster)
            .ok_or(ActionError::UnknownCombatant(self.caster))?;
        Ok(formula.roll(caster, rolls, false).total)
    }
}

// ============================================================================
// Effect Dispatcher
// ============================================================================

/// Apply one effect and verify its post-conditions.
pub(crate) fn apply_effect(
    kind: &EffectKind,
    ctx: &mut EffectContext<'_, '_>,
) -> Result<AppliedValue, ActionError> {
    let value = kind.apply(ctx)?;
    kind.post_validate(ctx)?;
    tracing::debug!(
        effect = kind.name(),
        caster = %ctx.caster,
        target = %ctx.target,
        ?value,
        "effect applied"
    );
    Ok(value)
}
