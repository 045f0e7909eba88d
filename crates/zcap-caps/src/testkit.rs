//! Shared fixtures for the engine tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

use zcap_core::clock::FixedClock;
use zcap_core::model::{Action, Capability, Did, Target};
use zcap_core::store::{
    MemoryCapabilityStore, MemoryDidKeyStore, MemoryNonceStore, MemoryRevocationSet, Stores,
};
use zcap_crypto::SigningKey;

use crate::Engine;

pub(crate) fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// An engine wired to fresh in-memory stores and a settable clock.
pub(crate) struct TestWorld {
    pub engine: Engine,
    pub clock: Arc<FixedClock>,
    pub did_keys: MemoryDidKeyStore,
    pub capabilities: MemoryCapabilityStore,
    pub revocations: MemoryRevocationSet,
    pub nonces: MemoryNonceStore,
}

impl TestWorld {
    pub fn new() -> Self {
        let clock = Arc::new(FixedClock::new(start_time()));
        Self {
            engine: Engine::new().with_clock(clock.clone()),
            clock,
            did_keys: MemoryDidKeyStore::new(),
            capabilities: MemoryCapabilityStore::new(),
            revocations: MemoryRevocationSet::new(),
            nonces: MemoryNonceStore::new(),
        }
    }

    pub fn stores(&self) -> Stores<'_> {
        Stores {
            did_keys: &self.did_keys,
            capabilities: &self.capabilities,
            revocations: &self.revocations,
            nonces: &self.nonces,
        }
    }

    /// Register a deterministic keypair for a DID and hand back the
    /// private half.
    pub fn register(&self, did: &str, seed: u8) -> SigningKey {
        let key = SigningKey::from_bytes(&[seed; 32]);
        self.did_keys
            .register(Did::parse(did).unwrap(), key.verifying_key());
        key
    }

    /// Issue the standard root (alice → bob over a document target) and
    /// put it in the capability store.
    pub fn issue_root(&self, actions: &[&str], ttl: Option<Duration>) -> Capability {
        let cap = self.issue_root_unstored(actions, ttl);
        self.capabilities.insert(cap.clone());
        cap
    }

    /// Same, but leave the capability out of the store.
    pub fn issue_root_unstored(&self, actions: &[&str], ttl: Option<Duration>) -> Capability {
        let alice = self.register("did:example:alice", 1);
        self.engine
            .create_capability(
                "did:example:alice",
                "did:example:bob",
                actions.iter().map(|name| Action::new(*name)).collect(),
                Target::new("https://example.com/doc/1", "Document"),
                &alice,
                ttl.map(|ttl| start_time() + ttl),
                vec![],
            )
            .unwrap()
    }
}
