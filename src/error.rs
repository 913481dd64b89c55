//! Error types for store construction and transform calls.

use thiserror::Error;

/// Errors produced while building a store or invoking its actions.
///
/// Construction failures (`NamingViolation`, `DuplicateName`) abort
/// `Store::new` before any store exists. Every call-time failure leaves the
/// state exactly as it was before the call.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A slice, action or selector name is not allowed.
    #[error("Invalid name '{name}': {reason}")]
    NamingViolation { name: String, reason: &'static str },

    /// Two entries on the same level of the definitions share a name.
    #[error("Duplicate name '{name}' in definitions")]
    DuplicateName { name: String },

    /// A transform returned `Outcome::Absent` instead of a value.
    #[error("Action '{action}' returned an undefined result")]
    UndefinedResult { action: String },

    /// The deferred value of an action failed; nothing was committed.
    #[error("Deferred result of action '{action}' was rejected: {source}")]
    Rejected {
        action: String,
        #[source]
        source: anyhow::Error,
    },

    /// No action is registered under the given path.
    #[error("Unknown action '{path}'")]
    UnknownAction { path: String },

    /// No selector is registered under the given path.
    #[error("Unknown selector '{path}'")]
    UnknownSelector { path: String },

    /// A bound action or selector was called after its store was dropped.
    #[error("Store has been dropped")]
    StoreDropped,

    /// Failure raised by user code inside a higher-order action.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
