//! Deterministic combat resolution for a d20 tactical ruleset.
//!
//! `combat-core` owns the rules kernel: dice and advantage resolution, the
//! boost store, status lifecycles, the action economy, the effect pipeline,
//! reactions and the turn/round state machine. It performs no I/O; content
//! arrives as a validated [`env::Catalog`] and every roll is drawn from the
//! seeded stream inside [`state::CombatState`]. All mutation flows through
//! [`engine::CombatEngine`].
pub mod action;
pub mod boost;
pub mod budget;
pub mod config;
pub mod dice;
pub mod engine;
pub mod env;
pub mod error;
pub mod passive;
pub mod preview;
pub mod reaction;
pub mod rules;
#[cfg(feature = "serde")]
pub mod snapshot;
pub mod state;
pub mod stats;
pub mod status;
pub mod testing;

pub use action::{
    ActionCategory, ActionDefinition, ActionEffect, ActionError, ActionInput, ActionResult,
    ActionRoll, AppliedValue, AttackAbility, CombatEvent, EffectKind, EffectScope, EffectWhen,
    Payment, SaveDc, SavePolicy, TargetFilter, TargetShape, TargetSpec,
};
pub use boost::{BoostDefinition, BoostKind, BoostSource, Predicate, QueryContext, RollType};
pub use budget::{
    ActionBudget, ActionCost, Recharge, ResourceKind, ResourcePool, ResourceSet, RestKind,
};
pub use config::CombatConfig;
pub use dice::{AdvantageSources, AdvantageState, DiceFormula, RollResult, RollStream};
pub use engine::{CombatEngine, EngineError};
pub use env::{BlockedTiles, Catalog, CatalogError, CombatEnv, OpenField, SightOracle};
pub use error::{CombatError, ErrorContext, ErrorSeverity, InvariantViolation};
pub use passive::{PassiveDefinition, PassiveTrigger, PassiveWindow};
pub use preview::{ActionPreview, TargetPreview};
pub use reaction::{
    AlwaysReact, NeverReact, ReactionDecider, ReactionDefinition, ReactionOffer,
    ReactionResponse, ReactionTrigger,
};
#[cfg(feature = "serde")]
pub use snapshot::SnapshotError;
pub use state::{
    CombatOutcome, CombatPhase, CombatState, Combatant, CombatantId, Faction, LifeState, Position,
    StatusInstanceId, TurnState,
};
pub use stats::{Ability, AbilityScores, DamageType, ResistanceLevel, Skill};
pub use status::{RemovalTrigger, StackPolicy, StatusDefinition, StatusFlags, TickTiming};
