//! State-store interfaces and in-memory implementations.
//!
//! The engine owns no state. Callers supply four collaborator stores;
//! the `Memory*` implementations here cover tests and single-process use.
//! Trait methods are atomic with respect to their own store; the engine's
//! replay-guard step relies on `NonceStore::insert_if_absent` being a
//! single check-and-insert.

use chrono::{DateTime, Utc};
use ed25519_dalek::VerifyingKey;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use crate::model::{Capability, Did};

/// Resolves a DID to the public key registered for it.
pub trait DidKeyStore: Send + Sync {
    fn get(&self, did: &Did) -> Option<VerifyingKey>;
}

/// Resolves a capability id to the stored capability document.
pub trait CapabilityStore: Send + Sync {
    fn get(&self, id: &str) -> Option<Capability>;
}

/// Capability ids (and condition ids) the caller has marked invalid.
/// Mutation happens out-of-band; the engine only reads.
pub trait RevocationSet: Send + Sync {
    fn contains(&self, id: &str) -> bool;
}

/// Recently seen invocation nonces with their invocation timestamps.
pub trait NonceStore: Send + Sync {
    /// Record a nonce. Returns `false` when it was already present.
    fn insert_if_absent(&self, nonce: &str, created: DateTime<Utc>) -> bool;

    /// Drop every nonce recorded with a timestamp before `cutoff`.
    fn evict_older_than(&self, cutoff: DateTime<Utc>);
}

/// The four collaborator stores every engine operation consumes.
#[derive(Clone, Copy)]
pub struct Stores<'a> {
    pub did_keys: &'a dyn DidKeyStore,
    pub capabilities: &'a dyn CapabilityStore,
    pub revocations: &'a dyn RevocationSet,
    pub nonces: &'a dyn NonceStore,
}

/// In-memory DID → public key map.
#[derive(Default)]
pub struct MemoryDidKeyStore {
    keys: RwLock<HashMap<Did, VerifyingKey>>,
}

impl MemoryDidKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, did: Did, key: VerifyingKey) {
        self.keys.write().insert(did, key);
    }
}

impl DidKeyStore for MemoryDidKeyStore {
    fn get(&self, did: &Did) -> Option<VerifyingKey> {
        self.keys.read().get(did).copied()
    }
}

/// In-memory capability map keyed by capability id.
#[derive(Default)]
pub struct MemoryCapabilityStore {
    capabilities: RwLock<HashMap<String, Capability>>,
}

impl MemoryCapabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, capability: Capability) {
        self.capabilities
            .write()
            .insert(capability.id.clone(), capability);
    }
}

impl CapabilityStore for MemoryCapabilityStore {
    fn get(&self, id: &str) -> Option<Capability> {
        self.capabilities.read().get(id).cloned()
    }
}

/// In-memory revocation set.
#[derive(Default)]
pub struct MemoryRevocationSet {
    revoked: RwLock<HashSet<String>>,
}

impl MemoryRevocationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoke(&self, id: impl Into<String>) {
        self.revoked.write().insert(id.into());
    }
}

impl RevocationSet for MemoryRevocationSet {
    fn contains(&self, id: &str) -> bool {
        self.revoked.read().contains(id)
    }
}

/// In-memory replay guard.
#[derive(Default)]
pub struct MemoryNonceStore {
    nonces: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl MemoryNonceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nonces.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nonces.read().is_empty()
    }
}

impl NonceStore for MemoryNonceStore {
    fn insert_if_absent(&self, nonce: &str, created: DateTime<Utc>) -> bool {
        let mut nonces = self.nonces.write();
        if nonces.contains_key(nonce) {
            return false;
        }
        nonces.insert(nonce.to_string(), created);
        true
    }

    fn evict_older_than(&self, cutoff: DateTime<Utc>) {
        self.nonces.write().retain(|_, created| *created >= cutoff);
    }
}
