//! # zcap-core
//!
//! Data model and leaf machinery for ZCAP-LD authorization capabilities.
//!
//! ## Layers
//!
//! - **Model** (`model`): capability, invocation, proof, and party
//!   entities with their JSON-LD field names.
//! - **Codec** (`codec`): JSON-LD document ↔ entity conversion and the
//!   fixed millisecond datetime form.
//! - **Canonicalizer** (`canonical`): deterministic proof-less signing
//!   bytes.
//! - **Caveats** (`caveat`): closed tagged union plus the pure evaluator.
//! - **Stores** (`store`): the four collaborator interfaces (DID keys,
//!   capabilities, revocations, nonces) with in-memory implementations.
//! - **Clock** (`clock`): injectable millisecond-truncated wall clock.
//! - **Errors** (`error`): the sealed engine taxonomy.

pub mod canonical;
pub mod caveat;
pub mod clock;
pub mod codec;
pub mod error;
pub mod model;
pub mod store;

pub use canonical::{capability_signing_bytes, invocation_signing_bytes};
pub use caveat::{evaluate, Caveat, CaveatContext};
pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{
    capability_from_json, capability_to_json, invocation_from_json, invocation_to_json,
};
pub use error::{Result, ZcapError};
pub use model::{
    default_context, Action, Capability, Did, Invocation, Parameters, Party, PartyRole, Proof,
    ProofPurpose, Target, CAPABILITY_TYPE, ED25519_SIGNATURE_2020, INVOCATION_TYPE,
    SECURITY_V2_CONTEXT, ZCAP_V1_CONTEXT,
};
pub use store::{
    CapabilityStore, DidKeyStore, MemoryCapabilityStore, MemoryDidKeyStore, MemoryNonceStore,
    MemoryRevocationSet, NonceStore, RevocationSet, Stores,
};
