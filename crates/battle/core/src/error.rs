//! Common error infrastructure for battle-core.
//!
//! Domain-specific errors (e.g. `AlgorithmError`, `ActionError`) live next to
//! the modules that produce them. This module provides the classification
//! shared by all of them so the scene can decide, per failure, whether to skip
//! the current target, fall back to defaults, or end the battle.
//!
//! No error ever crosses a frame boundary: the scene logs it, records a
//! skip event, and leaves the state machine in a valid state.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the target is skipped and the battle carries on
/// - **Validation**: the request was malformed and is rejected without effect
/// - **Internal**: unexpected roster inconsistency, still skipped but logged loudly
/// - **Fatal**: the battle cannot continue and is resolved immediately
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an engine or collaborator bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all battle-core errors.
///
/// - All error enums implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait BattleError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Logs an error at a level matching its severity.
pub(crate) fn log_error<E: BattleError>(error: &E, what: &str) {
    let severity = error.severity();
    if severity.is_internal() {
        tracing::error!(code = error.error_code(), severity = severity.as_str(), "{what}: {error}");
    } else if severity.is_recoverable() {
        tracing::debug!(code = error.error_code(), severity = severity.as_str(), "{what}: {error}");
    } else {
        tracing::warn!(code = error.error_code(), severity = severity.as_str(), "{what}: {error}");
    }
}
