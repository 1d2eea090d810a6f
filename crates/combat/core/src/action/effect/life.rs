//! Effects on the life state: stabilising the dying, raising the dead.

use crate::action::error::ActionError;
use crate::action::execute::{EffectContext, ValidationContext};
use crate::action::types::{AppliedValue, CombatEvent};
use crate::state::LifeState;

/// Stop a downed target from rolling death saves.
pub fn stabilize(ctx: &mut EffectContext<'_, '_>) -> Result<AppliedValue, ActionError> {
    let target = ctx
        .pipe
        .state
        .combatant_mut(ctx.target)
        .ok_or(ActionError::UnknownCombatant(ctx.target))?;
    match target.life {
        LifeState::Downed {
            successes,
            failures,
            stable: false,
        } => {
            target.life = LifeState::Downed {
                successes,
                failures,
                stable: true,
            };
            ctx.pipe.events.push(CombatEvent::Stabilized {
                combatant: ctx.target,
            });
            Ok(AppliedValue::Stabilized)
        }
        _ => Ok(AppliedValue::None),
    }
}

/// Bring a dead target back with a fixed amount of HP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReviveEffect {
    pub hp: u32,
}

impl ReviveEffect {
    pub fn new(hp: u32) -> Self {
        Self { hp }
    }

    /// Pre-validate: only the dead can be revived.
    pub fn pre_validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ActionError> {
        if !ctx.target.is_dead() {
            return Err(ActionError::InvalidTarget {
                reason: "target is not dead",
            });
        }
        Ok(())
    }

    pub fn apply(&self, ctx: &mut EffectContext<'_, '_>) -> Result<AppliedValue, ActionError> {
        let target = ctx
            .pipe
            .state
            .combatant_mut(ctx.target)
            .ok_or(ActionError::UnknownCombatant(ctx.target))?;
        if !target.is_dead() {
            return Ok(AppliedValue::None);
        }
        let hp = self.hp.clamp(1, target.max_hp());
        target.life = LifeState::Conscious;
        target.hp = hp;
        tracing::info!(combatant = %ctx.target, hp, "revived");
        ctx.pipe.events.push(CombatEvent::Revived {
            combatant: ctx.target,
            hp,
        });
        Ok(AppliedValue::Revived { hp })
    }

    pub fn post_validate(&self, _ctx: &EffectContext<'_, '_>) -> Result<(), ActionError> {
        Ok(())
    }
}
