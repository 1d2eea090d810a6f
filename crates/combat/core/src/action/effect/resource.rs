//! Resource manipulation effects.

use crate::action::error::ActionError;
use crate::action::execute::{EffectContext, ValidationContext};
use crate::action::types::{AppliedValue, CombatEvent};
use crate::budget::ResourceKind;

/// Economy counter or named pool.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceTarget {
    Budget(ResourceKind),
    Pool(String),
}

impl ResourceTarget {
    fn label(&self) -> String {
        match self {
            ResourceTarget::Budget(kind) => kind.to_string(),
            ResourceTarget::Pool(name) => name.clone(),
        }
    }
}

/// Add to (or drain) a resource. Pools clamp to `[0, max]`; counters stop at 0.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifyResourceEffect {
    pub resource: ResourceTarget,
    pub amount: i32,
}

impl ModifyResourceEffect {
    /// Pre-validate: a named pool must exist on the target.
    pub fn pre_validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ActionError> {
        match &self.resource {
            ResourceTarget::Pool(name) if ctx.target.budget.pool(name).is_none() => {
                Err(ActionError::UnknownResource(name.clone()))
            }
            _ => Ok(()),
        }
    }

    pub fn apply(&self, ctx: &mut EffectContext<'_, '_>) -> Result<AppliedValue, ActionError> {
        let target = ctx
            .pipe
            .state
            .combatant_mut(ctx.target)
            .ok_or(ActionError::UnknownCombatant(ctx.target))?;
        let delta = match &self.resource {
            ResourceTarget::Budget(kind) if self.amount >= 0 => {
                target.budget.grant(*kind, self.amount as u32);
                self.amount
            }
            ResourceTarget::Budget(kind) => {
                -(target.budget.drain(*kind, self.amount.unsigned_abs()) as i32)
            }
            ResourceTarget::Pool(name) => target.budget.adjust_pool(name, self.amount)?,
        };
        let resource = self.resource.label();
        if delta != 0 {
            ctx.pipe.events.push(CombatEvent::ResourceChanged {
                combatant: ctx.target,
                resource: resource.clone(),
                delta,
            });
        }
        Ok(AppliedValue::ResourceChange { resource, delta })
    }

    pub fn post_validate(&self, _ctx: &EffectContext<'_, '_>) -> Result<(), ActionError> {
        Ok(())
    }
}

/// Grant extra economy: Action Surge grants an Action, Dash grants movement
/// equal to the target's speed per count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GrantActionEffect {
    pub resource: ResourceKind,
    #[cfg_attr(feature = "serde", serde(default = "one"))]
    pub count: u32,
}

#[cfg(feature = "serde")]
fn one() -> u32 {
    1
}

impl GrantActionEffect {
    pub fn new(resource: ResourceKind, count: u32) -> Self {
        Self { resource, count }
    }

    pub fn pre_validate(&self, _ctx: &ValidationContext<'_>) -> Result<(), ActionError> {
        Ok(())
    }

    pub fn apply(&self, ctx: &mut EffectContext<'_, '_>) -> Result<AppliedValue, ActionError> {
        let target = ctx
            .pipe
            .state
            .combatant_mut(ctx.target)
            .ok_or(ActionError::UnknownCombatant(ctx.target))?;
        let amount = match self.resource {
            ResourceKind::Movement => target.speed() * self.count,
            _ => self.count,
        };
        target.budget.grant(self.resource, amount);
        ctx.pipe.events.push(CombatEvent::ResourceChanged {
            combatant: ctx.target,
            resource: self.resource.to_string(),
            delta: amount as i32,
        });
        Ok(AppliedValue::ResourceChange {
            resource: self.resource.to_string(),
            delta: amount as i32,
        })
    }

    pub fn post_validate(&self, _ctx: &EffectContext<'_, '_>) -> Result<(), ActionError> {
        Ok(())
    }
}
