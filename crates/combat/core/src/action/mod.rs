//! Action domain - data-driven action definitions and their execution.
//!
//! # Module Structure
//!
//! - `definition`: Catalog entries (ActionDefinition, rolls, effect gating)
//! - `effect`: Effect kinds (Damage, Heal, Status, Movement, Resources, Life)
//! - `targeting`: Target shapes, filters and resolution
//! - `types`: Inputs, applied values, combat events and action results
//! - `execute`: Validation, the effect pipeline and state commits
//! - `error`: Typed refusals

pub mod definition;
pub mod effect;
pub mod error;
pub mod execute;
pub mod targeting;
pub mod types;

pub use definition::{
    ActionCategory, ActionDefinition, ActionEffect, ActionRoll, AttackAbility, EffectScope,
    EffectWhen, SaveDc, SavePolicy,
};
pub use effect::{
    ApplyStatusEffect, DealDamageEffect, EffectKind, ForcedDirection, ForcedMoveEffect,
    GrantActionEffect, HealEffect, ModifyResourceEffect, RemoveStatusEffect, ResourceTarget,
    ReviveEffect, TemporaryHpEffect,
};
pub use error::ActionError;
pub use execute::{
    ActionRun, DamageHit, EffectContext, Payment, Pipeline, StatusRequest, ValidationContext,
    validate_action,
};
pub use targeting::{TargetFilter, TargetShape, TargetSpec, resolve_targets};
pub use types::{ActionInput, ActionResult, AppliedValue, CombatEvent};
