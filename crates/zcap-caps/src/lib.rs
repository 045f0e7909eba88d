//! Capability engine for ZCAP-LD authorization.
//!
//! Issues, delegates, invokes, and verifies cryptographically signed,
//! attenuable authority tokens. Each delegation can only narrow what its
//! parent grants, never widen it:
//!
//! ```text
//! Root:        alice grants bob    [read, write]  expires +30d
//!   -> Child:  bob grants charlie  [read]         expires +7d   (valid)
//!     -> Bad:  charlie grants dave [read, write]                (rejected)
//! ```
//!
//! The engine is a library of pure operations over caller-supplied state
//! stores (DID keys, capabilities, revocations, nonces); it owns no state
//! and spawns no tasks.
//!
//! # Example
//!
//! ```no_run
//! use zcap_caps::Engine;
//! use zcap_core::model::{Action, Did, Target};
//! use zcap_core::store::{
//!     MemoryCapabilityStore, MemoryDidKeyStore, MemoryNonceStore,
//!     MemoryRevocationSet, Stores,
//! };
//!
//! let alice_key = zcap_crypto::generate_signing_key();
//! let did_keys = MemoryDidKeyStore::new();
//! did_keys.register(
//!     Did::parse("did:example:alice").unwrap(),
//!     alice_key.verifying_key(),
//! );
//!
//! let capabilities = MemoryCapabilityStore::new();
//! let revocations = MemoryRevocationSet::new();
//! let nonces = MemoryNonceStore::new();
//! let stores = Stores {
//!     did_keys: &did_keys,
//!     capabilities: &capabilities,
//!     revocations: &revocations,
//!     nonces: &nonces,
//! };
//!
//! let engine = Engine::new();
//! let cap = engine
//!     .create_capability(
//!         "did:example:alice",
//!         "did:example:bob",
//!         vec![Action::new("read")],
//!         Target::new("https://example.com/doc/1", "Document"),
//!         &alice_key,
//!         None,
//!         vec![],
//!     )
//!     .unwrap();
//! capabilities.insert(cap.clone());
//! engine.verify_capability(&cap, &stores).unwrap();
//! ```

pub mod engine;
mod invoke;
mod issue;
mod verify;

#[cfg(test)]
pub(crate) mod testkit;

pub use engine::{Engine, DEFAULT_MAX_CHAIN_DEPTH, DEFAULT_NONCE_TTL_SECS};

// The model, stores, and error taxonomy callers need alongside the engine.
pub use zcap_core::error::{Result, ZcapError};
pub use zcap_core::model::{Action, Capability, Did, Invocation, Parameters, Party, Target};
pub use zcap_core::store::Stores;
