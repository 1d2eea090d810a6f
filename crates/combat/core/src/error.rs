//! Common error infrastructure for combat-core.
//!
//! Domain-specific errors (e.g. [`ActionError`](crate::action::ActionError),
//! [`CatalogError`](crate::env::CatalogError)) live next to the code that
//! raises them. This module provides the classification shared by all of them.
//!
//! # Taxonomy
//!
//! - **Content** errors surface while a catalog is built and never at execution time.
//! - **Validation** errors are typed refusals returned before any state mutation.
//! - **Evaluation gaps** are not errors at all: they fail open and are logged.
//! - **Fatal** errors are invariant violations; the engine snapshots state first.

use crate::state::CombatantId;

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - the caller may pick another action.
    ///
    /// Examples: insufficient movement, target out of range
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: unknown combatant, invalid target selection
    Validation,

    /// Internal error - unexpected state inconsistency.
    ///
    /// Examples: catalog cross-reference missing at runtime
    Internal,

    /// Fatal error - combat state corrupted, cannot continue.
    ///
    /// Examples: HP ledger over maximum, negative budget counter
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Contextual information attached to errors for diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Combatant that triggered the error (if applicable).
    pub actor: Option<CombatantId>,

    /// Combat round at the time of error.
    pub round: u32,

    /// Action sequence number at the time of error.
    pub nonce: u64,

    /// Optional static message providing additional context.
    pub message: Option<&'static str>,
}

impl ErrorContext {
    /// Creates a new error context at the given round and nonce.
    #[must_use]
    pub const fn new(round: u32, nonce: u64) -> Self {
        Self {
            actor: None,
            round,
            nonce,
            message: None,
        }
    }

    /// Attaches an actor to this context (builder pattern).
    #[must_use]
    pub const fn with_actor(mut self, actor: CombatantId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Attaches a static message to this context (builder pattern).
    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

/// Common trait for all combat-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait CombatError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns the context information for this error, if available.
    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Unrecoverable ledger corruption detected after an effect committed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InvariantViolation {
    #[error("combatant {combatant} has {current} HP above maximum {maximum}")]
    HpAboveMaximum {
        combatant: CombatantId,
        current: u32,
        maximum: u32,
    },

    #[error("combatant {combatant} holds a boost from {source_tag} with no owning source")]
    OrphanBoost {
        combatant: CombatantId,
        source_tag: String,
    },

    #[error("stack group '{group}' on combatant {combatant} holds {count} instances")]
    StackGroupOverflow {
        combatant: CombatantId,
        group: String,
        count: usize,
    },
}

impl CombatError for InvariantViolation {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::HpAboveMaximum { .. } => "INVARIANT_HP_ABOVE_MAXIMUM",
            Self::OrphanBoost { .. } => "INVARIANT_ORPHAN_BOOST",
            Self::StackGroupOverflow { .. } => "INVARIANT_STACK_GROUP_OVERFLOW",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_classification() {
        assert!(ErrorSeverity::Recoverable.is_recoverable());
        assert!(!ErrorSeverity::Validation.is_internal());
        assert!(ErrorSeverity::Fatal.is_internal());
        assert_eq!(ErrorSeverity::Internal.as_str(), "internal");
    }

    #[test]
    fn invariant_violations_are_fatal() {
        let err = InvariantViolation::HpAboveMaximum {
            combatant: CombatantId(3),
            current: 40,
            maximum: 30,
        };
        assert_eq!(err.severity(), ErrorSeverity::Fatal);
        assert_eq!(err.error_code(), "INVARIANT_HP_ABOVE_MAXIMUM");
        assert!(err.to_string().contains("40"));
    }
}
