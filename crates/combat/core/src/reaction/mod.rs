//! Reaction/interrupt coordination.
//!
//! The pipeline calls [`Pipeline::offer_reactions`] synchronously at fixed
//! trigger points. Eligible reactors are asked through a
//! [`ReactionDecider`]; a taken reaction runs as a nested pipeline
//! invocation and its response is folded back into the triggering event.
//!
//! [`Pipeline::offer_reactions`]: crate::action::Pipeline::offer_reactions

mod coordinator;
mod decider;
mod definition;

pub use coordinator::{ReactionOutcome, TriggerEvent};
pub use decider::{AlwaysReact, NeverReact, ReactionDecider, ReactionOffer};
pub use definition::{ReactionDefinition, ReactionResponse, ReactionTrigger};
