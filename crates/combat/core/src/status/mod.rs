//! Condition/status lifecycle.
//!
//! `Applied -> (ticks) -> Expired | Removed-by-trigger | Removed-explicitly`.
//! Stacking follows one rule driven by the definition's [`StackPolicy`].

mod definition;
mod instance;
pub mod lifecycle;

pub use definition::{
    RemovalTrigger, RepeatSave, StackPolicy, StatusDefinition, StatusFlags, TickTiming,
};
pub use instance::{RemovalReason, StatusInstance};
pub use lifecycle::{
    NewStatus, RejectReason, StatusApplication, TickOutcome, apply_status, remove_instance,
    removed_by, tick_duration, ticking,
};
