//! Effect kind enum and dispatcher.
//!
//! Every effect the pipeline can run is one variant here. There is no
//! catch-all: a kind the loader does not know is a deserialization error.

use crate::action::error::ActionError;
use crate::action::execute::{EffectContext, ValidationContext};
use crate::action::types::AppliedValue;

use super::damage::DealDamageEffect;
use super::heal::{HealEffect, TemporaryHpEffect};
use super::life::{ReviveEffect, stabilize};
use super::movement::ForcedMoveEffect;
use super::resource::{GrantActionEffect, ModifyResourceEffect};
use super::status::{ApplyStatusEffect, RemoveStatusEffect};

#[derive(Clone, Debug, PartialEq, Eq, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectKind {
    // ========================================================================
    // Hit points
    // ========================================================================
    DealDamage(DealDamageEffect),
    Heal(HealEffect),
    GainTemporaryHp(TemporaryHpEffect),

    // ========================================================================
    // Status effects
    // ========================================================================
    ApplyStatus(ApplyStatusEffect),
    RemoveStatus(RemoveStatusEffect),

    // ========================================================================
    // Movement
    // ========================================================================
    ForcedMove(ForcedMoveEffect),

    // ========================================================================
    // Resources
    // ========================================================================
    ModifyResource(ModifyResourceEffect),
    GrantAction(GrantActionEffect),

    // ========================================================================
    // Life state
    // ========================================================================
    Stabilize,
    Revive(ReviveEffect),
}

impl EffectKind {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Status id this effect depends on, checked when the catalog is built.
    pub fn referenced_status(&self) -> Option<&str> {
        match self {
            Self::ApplyStatus(e) => Some(&e.status),
            Self::RemoveStatus(e) => Some(&e.status),
            _ => None,
        }
    }
}

// ============================================================================
// Three-Phase Execution (Dispatcher)
// ============================================================================

impl EffectKind {
    /// Check requirements before any state changes.
    pub fn pre_validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ActionError> {
        match self {
            Self::DealDamage(e) => e.pre_validate(ctx),
            Self::Heal(e) => e.pre_validate(ctx),
            Self::GainTemporaryHp(e) => e.pre_validate(ctx),
            Self::ApplyStatus(e) => e.pre_validate(ctx),
            Self::RemoveStatus(e) => e.pre_validate(ctx),
            Self::ForcedMove(e) => e.pre_validate(ctx),
            Self::ModifyResource(e) => e.pre_validate(ctx),
            Self::GrantAction(e) => e.pre_validate(ctx),
            Self::Stabilize => Ok(()),
            Self::Revive(e) => e.pre_validate(ctx),
        }
    }

    pub fn apply(&self, ctx: &mut EffectContext<'_, '_>) -> Result<AppliedValue, ActionError> {
        match self {
            Self::DealDamage(e) => e.apply(ctx),
            Self::Heal(e) => e.apply(ctx),
            Self::GainTemporaryHp(e) => e.apply(ctx),
            Self::ApplyStatus(e) => e.apply(ctx),
            Self::RemoveStatus(e) => e.apply(ctx),
            Self::ForcedMove(e) => e.apply(ctx),
            Self::ModifyResource(e) => e.apply(ctx),
            Self::GrantAction(e) => e.apply(ctx),
            Self::Stabilize => stabilize(ctx),
            Self::Revive(e) => e.apply(ctx),
        }
    }

    /// Check invariants after applying.
    pub fn post_validate(&self, ctx: &EffectContext<'_, '_>) -> Result<(), ActionError> {
        match self {
            Self::DealDamage(e) => e.post_validate(ctx),
            Self::Heal(e) => e.post_validate(ctx),
            Self::GainTemporaryHp(e) => e.post_validate(ctx),
            Self::ApplyStatus(e) => e.post_validate(ctx),
            Self::RemoveStatus(e) => e.post_validate(ctx),
            Self::ForcedMove(e) => e.post_validate(ctx),
            Self::ModifyResource(e) => e.post_validate(ctx),
            Self::GrantAction(e) => e.post_validate(ctx),
            Self::Stabilize => Ok(()),
            Self::Revive(e) => e.post_validate(ctx),
        }
    }
}
