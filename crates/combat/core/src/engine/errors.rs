//! Error types surfaced by the combat engine.

use crate::action::ActionError;
use crate::env::CatalogError;
use crate::error::{CombatError, ErrorContext, ErrorSeverity, InvariantViolation};

/// Errors surfaced while driving combat through the engine.
#[derive(Clone, Debug, thiserror::Error)]
pub enum EngineError {
    #[error("action refused: {0}")]
    Action(#[from] ActionError),

    #[error("content error: {0}")]
    Catalog(#[from] CatalogError),

    /// The ledger broke after an effect committed. The state was rolled back
    /// to the checkpoint, which is attached in snapshot form when available.
    #[error("invariant violated: {violation}")]
    Invariant {
        violation: InvariantViolation,
        checkpoint: Option<Vec<u8>>,
        context: ErrorContext,
    },

    #[error("combat has already started")]
    AlreadyStarted,

    #[error("combat is in progress")]
    CombatInProgress,
}

impl EngineError {
    pub fn invariant(
        violation: InvariantViolation,
        checkpoint: Option<Vec<u8>>,
        context: ErrorContext,
    ) -> Self {
        Self::Invariant {
            violation,
            checkpoint,
            context,
        }
    }

    /// The underlying action refusal, if that is what this is.
    pub fn as_action(&self) -> Option<&ActionError> {
        match self {
            Self::Action(err) => Some(err),
            _ => None,
        }
    }
}

impl CombatError for EngineError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Action(err) => err.severity(),
            Self::Catalog(err) => err.severity(),
            Self::Invariant { .. } => ErrorSeverity::Fatal,
            Self::AlreadyStarted | Self::CombatInProgress => ErrorSeverity::Validation,
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::Invariant { context, .. } => Some(context),
            _ => None,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Action(err) => err.error_code(),
            Self::Catalog(err) => err.error_code(),
            Self::Invariant { violation, .. } => violation.error_code(),
            Self::AlreadyStarted => "ENGINE_ALREADY_STARTED",
            Self::CombatInProgress => "ENGINE_COMBAT_IN_PROGRESS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CombatantId;

    #[test]
    fn action_errors_keep_their_classification() {
        let err: EngineError = ActionError::NotActorsTurn(CombatantId(2)).into();
        assert_eq!(err.severity(), ErrorSeverity::Recoverable);
        assert_eq!(err.error_code(), "ACTION_NOT_ACTORS_TURN");
        assert!(err.as_action().is_some());
    }

    #[test]
    fn invariant_errors_are_fatal_with_context() {
        let err = EngineError::invariant(
            InvariantViolation::HpAboveMaximum {
                combatant: CombatantId(1),
                current: 12,
                maximum: 10,
            },
            None,
            ErrorContext::new(2, 7).with_actor(CombatantId(1)),
        );
        assert_eq!(err.severity(), ErrorSeverity::Fatal);
        assert_eq!(err.context().map(|c| c.nonce), Some(7));
    }
}
