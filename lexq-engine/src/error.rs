//! Error types for lexq-engine
//!
//! Action errors (purchase, claim) are recoverable and leave state untouched.
//! Remote and identity errors never block local progress.

use thiserror::Error;

/// Shop purchase rejected; state is unchanged
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("Insufficient funds: need {needed} coins, have {available}")]
    InsufficientFunds { needed: u32, available: u32 },

    /// Streak shield already active
    #[error("Item already active")]
    AlreadyActive,
}

/// Quest claim rejected; state is unchanged
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("Quest not found: {0}")]
    NotFound(String),

    /// Quest not yet at target, or already claimed
    #[error("Quest not eligible for claim: {0}")]
    NotEligible(String),
}

/// Remote profile store failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote store returned {0}: {1}")]
    Status(u16, String),

    #[error("Could not decode remote profile: {0}")]
    Decode(String),

    #[error("Remote store unavailable: {0}")]
    Unavailable(String),
}

/// Identity provider failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Anonymous sign-in failed: {0}")]
    AnonymousSignInFailed(String),
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Persisted blob could not be parsed
    #[error("Malformed persisted state: {0}")]
    MalformedPersistedState(String),

    #[error(transparent)]
    Purchase(#[from] PurchaseError),

    #[error(transparent)]
    Claim(#[from] ClaimError),

    /// Local store or config failure from the shared layer
    #[error(transparent)]
    Common(#[from] lexq_common::Error),

    /// Manual sync requested without a signed-in, non-anonymous user
    #[error("Remote sync unavailable: {0}")]
    SyncUnavailable(String),

    /// Engine task has stopped; the handle is no longer usable
    #[error("Engine stopped")]
    EngineStopped,
}

/// Convenience Result type using lexq-engine EngineError
pub type Result<T> = std::result::Result<T, EngineError>;
