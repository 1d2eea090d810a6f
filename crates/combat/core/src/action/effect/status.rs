//! Status application and removal effects.

use crate::action::error::ActionError;
use crate::action::execute::{EffectContext, StatusRequest, ValidationContext};
use crate::action::types::AppliedValue;
use crate::status::RemovalReason;

/// Apply a status from the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApplyStatusEffect {
    pub status: String,
    /// Ticks; `None` falls back to the definition's default duration.
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration: Option<u32>,
}

impl ApplyStatusEffect {
    pub fn new(status: impl Into<String>, duration: Option<u32>) -> Self {
        Self {
            status: status.into(),
            duration,
        }
    }

    /// Pre-validate: the status must exist.
    pub fn pre_validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ActionError> {
        match ctx.env.catalog.status(&self.status) {
            Some(_) => Ok(()),
            None => Err(ActionError::EffectFailed("unknown status")),
        }
    }

    pub fn apply(&self, ctx: &mut EffectContext<'_, '_>) -> Result<AppliedValue, ActionError> {
        let concentration = ctx.action.filter(|a| a.concentration).map(|a| a.id.clone());
        let application = ctx.pipe.apply_status(StatusRequest {
            source: Some(ctx.caster),
            target: ctx.target,
            status: &self.status,
            duration: self.duration,
            save_dc: ctx.save_dc,
            concentration,
        })?;
        Ok(AppliedValue::Status {
            applied: application.instance().is_some(),
        })
    }

    /// Post-validate: the stack group holds at most one instance.
    pub fn post_validate(&self, ctx: &EffectContext<'_, '_>) -> Result<(), ActionError> {
        let Some(target) = ctx.pipe.state.combatant(ctx.target) else {
            return Ok(());
        };
        let Some(definition) = ctx.pipe.env.catalog.status(&self.status) else {
            return Ok(());
        };
        let group = definition.group();
        if target.statuses.iter().filter(|s| s.group == group).count() > 1 {
            return Err(ActionError::EffectFailed("stack group holds several instances"));
        }
        Ok(())
    }
}

/// Remove every instance of a status from the target.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemoveStatusEffect {
    pub status: String,
}

impl RemoveStatusEffect {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }

    pub fn pre_validate(&self, _ctx: &ValidationContext<'_>) -> Result<(), ActionError> {
        Ok(())
    }

    pub fn apply(&self, ctx: &mut EffectContext<'_, '_>) -> Result<AppliedValue, ActionError> {
        let count = ctx
            .pipe
            .remove_status(ctx.target, &self.status, RemovalReason::Explicit);
        Ok(AppliedValue::StatusRemoved { count })
    }

    /// Post-validate: no instance of the status remains.
    pub fn post_validate(&self, ctx: &EffectContext<'_, '_>) -> Result<(), ActionError> {
        match ctx.pipe.state.combatant(ctx.target) {
            Some(target) if target.has_status(&self.status) => {
                Err(ActionError::EffectFailed("status survived removal"))
            }
            _ => Ok(()),
        }
    }
}
