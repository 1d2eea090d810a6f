//! Action effects: the atomic operations an action is made of.
//!
//! Individual effects are structs with a three-phase contract:
//! - `pre_validate`: read-only check against the targets, run for every
//!   effect before anything is spent
//! - `apply`: mutate state through the pipeline and report an [`AppliedValue`]
//! - `post_validate`: verify invariants after the change
//!
//! [`EffectKind`] wraps them for serialization and static dispatch.
//!
//! [`AppliedValue`]: crate::action::AppliedValue

mod damage;
mod heal;
mod kinds;
mod life;
mod movement;
mod resource;
mod status;

pub use damage::DealDamageEffect;
pub use heal::{HealEffect, TemporaryHpEffect};
pub use kinds::EffectKind;
pub use life::ReviveEffect;
pub use movement::{ForcedDirection, ForcedMoveEffect};
pub use resource::{GrantActionEffect, ModifyResourceEffect, ResourceTarget};
pub use status::{ApplyStatusEffect, RemoveStatusEffect};
