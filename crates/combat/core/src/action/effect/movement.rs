//! Forced movement (shoves, pulls).

use crate::action::error::ActionError;
use crate::action::execute::{EffectContext, ValidationContext};
use crate::action::types::{AppliedValue, CombatEvent};
use crate::config::CombatConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ForcedDirection {
    /// Away from the caster.
    #[default]
    Push,
    /// Towards the caster, stopping adjacent.
    Pull,
}

/// Move the target tile by tile. Movement stops early at an occupied or
/// impassable tile. Forced movement spends no budget and provokes nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForcedMoveEffect {
    /// Feet.
    pub distance: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub direction: ForcedDirection,
}

impl ForcedMoveEffect {
    pub fn push(distance: u32) -> Self {
        Self {
            distance,
            direction: ForcedDirection::Push,
        }
    }

    pub fn pull(distance: u32) -> Self {
        Self {
            distance,
            direction: ForcedDirection::Pull,
        }
    }

    /// Pre-validate: a combatant cannot shove itself.
    pub fn pre_validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ActionError> {
        if ctx.caster.id == ctx.target.id {
            return Err(ActionError::InvalidTarget {
                reason: "forced movement on self",
            });
        }
        Ok(())
    }

    pub fn apply(&self, ctx: &mut EffectContext<'_, '_>) -> Result<AppliedValue, ActionError> {
        let origin = ctx
            .pipe
            .state
            .combatant(ctx.caster)
            .ok_or(ActionError::UnknownCombatant(ctx.caster))?
            .position;
        let from = ctx
            .pipe
            .state
            .combatant(ctx.target)
            .ok_or(ActionError::UnknownCombatant(ctx.target))?
            .position;

        let away = self.direction == ForcedDirection::Push;
        let mut current = from;
        for _ in 0..self.distance / CombatConfig::FEET_PER_TILE {
            let next = current.step_relative_to(origin, away);
            if next == origin
                || ctx.pipe.state.is_occupied(next, ctx.target)
                || !ctx.pipe.env.sight.is_passable(next)
            {
                break;
            }
            current = next;
        }

        if current != from {
            if let Some(target) = ctx.pipe.state.combatant_mut(ctx.target) {
                target.position = current;
            }
            ctx.pipe.events.push(CombatEvent::ForcedMove {
                target: ctx.target,
                from,
                to: current,
            });
        }
        Ok(AppliedValue::Movement { from, to: current })
    }

    pub fn post_validate(&self, _ctx: &EffectContext<'_, '_>) -> Result<(), ActionError> {
        Ok(())
    }
}
