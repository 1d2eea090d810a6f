//! Action execution: validation, the effect pipeline and state commits.
//!
//! All mutation during an action flows through [`Pipeline`]. Effects never
//! touch HP, life state, statuses or concentration directly; they call the
//! commit helpers, which emit events and fire follow-up triggers.

mod commit;
mod context;
mod pipeline;
mod validation;

pub use commit::{DamageHit, StatusRequest};
pub use context::{EffectContext, ValidationContext};
pub(crate) use context::apply_effect;
pub use pipeline::{ActionRun, Pipeline};
pub use validation::{Payment, validate_action};
