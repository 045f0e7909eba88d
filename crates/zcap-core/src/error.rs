//! The capability error taxonomy.
//!
//! One sealed enum, grouped by stage. Verification surfaces the most
//! specific reason at the failing level and never wraps it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZcapError {
    // Input
    #[error("malformed DID: {0}")]
    MalformedDid(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("capability must grant at least one action")]
    EmptyActions,

    // Lookup
    #[error("no public key registered for DID: {0}")]
    UnknownDid(String),

    #[error("capability not found: {0}")]
    CapabilityNotFound(String),

    #[error("parent capability not found: {0}")]
    ParentNotFound(String),

    // Authorization
    #[error("delegation not permitted: {0}")]
    DelegationNotPermitted(String),

    #[error("invoker key does not match the capability invoker")]
    InvokerMismatch,

    #[error("action not allowed by capability: {0}")]
    ActionNotAllowed(String),

    #[error("action not permitted by parent capability: {0}")]
    ActionNotPermitted(String),

    // Attenuation
    #[error("child expiry exceeds parent expiry")]
    ExpiryExceedsParent,

    #[error("child target does not match parent target")]
    TargetMismatch,

    #[error("child controller is not the parent invoker")]
    ControllerNotParentInvoker,

    #[error("child created before parent capability")]
    CreatedBeforeParent,

    // Temporal
    #[error("capability expired")]
    Expired,

    #[error("capability not yet valid")]
    NotYetValid,

    #[error("invocation outside the freshness window")]
    StaleInvocation,

    // Caveat
    #[error("unknown caveat type: {0}")]
    UnknownCaveat(String),

    #[error("caveat {caveat_type} failed: {detail}")]
    CaveatFailed { caveat_type: String, detail: String },

    // Replay
    #[error("invocation nonce already used")]
    ReplayedNonce,

    // Crypto
    #[error("signature verification failed")]
    SignatureInvalid,

    #[error("canonicalization failed: {0}")]
    CanonicalizationFailed(String),

    #[error("document carries no proof")]
    ProofMissing,

    #[error("malformed proof: {0}")]
    MalformedProof(String),

    // Lifecycle
    #[error("capability revoked: {0}")]
    Revoked(String),

    #[error("delegation chain too deep: {depth} exceeds max {max}")]
    ChainTooDeep { depth: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, ZcapError>;
