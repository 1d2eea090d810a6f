//! Action execution errors.
//!
//! Every variant is a typed refusal returned before any state is mutated.

use crate::budget::{BudgetError, ResourceKind};
use crate::error::{CombatError, ErrorSeverity};
use crate::state::CombatantId;

// ============================================================================
// Action Execution Errors
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("unknown combatant {0}")]
    UnknownCombatant(CombatantId),

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("{actor} does not know action '{action}'")]
    ActionNotKnown { actor: CombatantId, action: String },

    #[error("combat is not in progress")]
    CombatNotActive,

    #[error("not {0}'s turn")]
    NotActorsTurn(CombatantId),

    #[error("{0} is incapacitated")]
    ActorIncapacitated(CombatantId),

    #[error("action blocked by status '{status}'")]
    ActionBlocked { status: String },

    #[error("insufficient {resource}: requires {required}, has {available}")]
    InsufficientResource {
        resource: String,
        required: u32,
        available: u32,
    },

    #[error("{0} is blocked")]
    ResourceBlocked(ResourceKind),

    #[error("unknown resource pool '{0}'")]
    UnknownResource(String),

    #[error("invalid target: {reason}")]
    InvalidTarget { reason: &'static str },

    #[error("out of range: {distance} ft > {range} ft")]
    OutOfRange { distance: u32, range: u32 },

    #[error("no line of sight")]
    NoLineOfSight,

    #[error("destination {0} is occupied")]
    Occupied(crate::state::Position),

    #[error("effect precondition failed: {0}")]
    EffectFailed(&'static str),
}

impl From<BudgetError> for ActionError {
    fn from(err: BudgetError) -> Self {
        match err {
            BudgetError::InsufficientResource {
                resource,
                required,
                available,
            } => ActionError::InsufficientResource {
                resource,
                required,
                available,
            },
            BudgetError::Blocked { resource } => ActionError::ResourceBlocked(resource),
            BudgetError::UnknownResource { name } => ActionError::UnknownResource(name),
        }
    }
}

impl CombatError for ActionError {
    fn severity(&self) -> ErrorSeverity {
        use ActionError::*;
        match self {
            UnknownCombatant(_) | UnknownAction(_) | UnknownResource(_) => ErrorSeverity::Validation,
            ActionNotKnown { .. } | InvalidTarget { .. } => ErrorSeverity::Validation,
            CombatNotActive | NotActorsTurn(_) | ActorIncapacitated(_) => ErrorSeverity::Recoverable,
            ActionBlocked { .. } | InsufficientResource { .. } | ResourceBlocked(_) => {
                ErrorSeverity::Recoverable
            }
            OutOfRange { .. } | NoLineOfSight | Occupied(_) => ErrorSeverity::Recoverable,
            EffectFailed(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        use ActionError::*;
        match self {
            UnknownCombatant(_) => "ACTION_UNKNOWN_COMBATANT",
            UnknownAction(_) => "ACTION_UNKNOWN_ACTION",
            ActionNotKnown { .. } => "ACTION_NOT_KNOWN",
            CombatNotActive => "ACTION_COMBAT_NOT_ACTIVE",
            NotActorsTurn(_) => "ACTION_NOT_ACTORS_TURN",
            ActorIncapacitated(_) => "ACTION_ACTOR_INCAPACITATED",
            ActionBlocked { .. } => "ACTION_BLOCKED",
            InsufficientResource { .. } => "ACTION_INSUFFICIENT_RESOURCE",
            ResourceBlocked(_) => "ACTION_RESOURCE_BLOCKED",
            UnknownResource(_) => "ACTION_UNKNOWN_RESOURCE",
            InvalidTarget { .. } => "ACTION_INVALID_TARGET",
            OutOfRange { .. } => "ACTION_OUT_OF_RANGE",
            NoLineOfSight => "ACTION_NO_LINE_OF_SIGHT",
            Occupied(_) => "ACTION_OCCUPIED",
            EffectFailed(_) => "ACTION_EFFECT_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_errors_convert() {
        let err: ActionError = BudgetError::Blocked {
            resource: ResourceKind::Movement,
        }
        .into();
        assert_eq!(err, ActionError::ResourceBlocked(ResourceKind::Movement));
        assert!(err.severity().is_recoverable());
    }
}
