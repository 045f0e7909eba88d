//! End-to-end delegation chains: alice issues to bob, bob delegates to
//! charlie, charlie invokes; plus revocation, replay, and attenuation
//! failures across the same cast.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

use zcap_caps::{Action, Capability, Engine, Stores, Target, ZcapError};
use zcap_core::caveat::Caveat;
use zcap_core::clock::FixedClock;
use zcap_core::model::Did;
use zcap_core::store::{
    MemoryCapabilityStore, MemoryDidKeyStore, MemoryNonceStore, MemoryRevocationSet,
};
use zcap_core::{capability_from_json, capability_to_json};
use zcap_crypto::SigningKey;

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

struct World {
    engine: Engine,
    clock: Arc<FixedClock>,
    did_keys: MemoryDidKeyStore,
    capabilities: MemoryCapabilityStore,
    revocations: MemoryRevocationSet,
    nonces: MemoryNonceStore,
    alice: SigningKey,
    bob: SigningKey,
    charlie: SigningKey,
}

impl World {
    fn new() -> Self {
        let clock = Arc::new(FixedClock::new(start_time()));
        let did_keys = MemoryDidKeyStore::new();

        let alice = SigningKey::from_bytes(&[1u8; 32]);
        let bob = SigningKey::from_bytes(&[2u8; 32]);
        let charlie = SigningKey::from_bytes(&[3u8; 32]);
        for (did, key) in [
            ("did:example:alice", &alice),
            ("did:example:bob", &bob),
            ("did:example:charlie", &charlie),
        ] {
            did_keys.register(Did::parse(did).unwrap(), key.verifying_key());
        }

        Self {
            engine: Engine::new().with_clock(clock.clone()),
            clock,
            did_keys,
            capabilities: MemoryCapabilityStore::new(),
            revocations: MemoryRevocationSet::new(),
            nonces: MemoryNonceStore::new(),
            alice,
            bob,
            charlie,
        }
    }

    fn stores(&self) -> Stores<'_> {
        Stores {
            did_keys: &self.did_keys,
            capabilities: &self.capabilities,
            revocations: &self.revocations,
            nonces: &self.nonces,
        }
    }

    /// Alice issues [read, write] on urn:doc:1 to bob, expiring in 30 days.
    fn issue_cap1(&self) -> Capability {
        let cap = self
            .engine
            .create_capability(
                "did:example:alice",
                "did:example:bob",
                vec![Action::new("read"), Action::new("write")],
                Target::new("urn:doc:1", "Document"),
                &self.alice,
                Some(start_time() + Duration::days(30)),
                vec![],
            )
            .unwrap();
        self.capabilities.insert(cap.clone());
        cap
    }

    /// Bob delegates read-only to charlie, expiring in 7 days.
    fn delegate_cap2(&self, cap1: &Capability) -> Capability {
        let cap = self
            .engine
            .delegate_capability(
                cap1,
                &self.bob,
                "did:example:charlie",
                Some(vec![Action::new("read")]),
                Some(start_time() + Duration::days(7)),
                vec![Caveat::AllowedAction {
                    actions: vec!["read".to_string()],
                }],
                &self.stores(),
            )
            .unwrap();
        self.capabilities.insert(cap.clone());
        cap
    }
}

#[test]
fn root_happy_path() {
    let world = World::new();
    let cap1 = world.issue_cap1();

    world.engine.verify_capability(&cap1, &world.stores()).unwrap();

    let invocation = world
        .engine
        .invoke_capability(&cap1, "read", None, &world.bob, &world.stores())
        .unwrap();
    world
        .engine
        .verify_invocation(&invocation, &world.stores())
        .unwrap();
}

#[test]
fn delegation_narrows_to_read_only() {
    let world = World::new();
    let cap1 = world.issue_cap1();
    let cap2 = world.delegate_cap2(&cap1);

    world.engine.verify_capability(&cap2, &world.stores()).unwrap();

    let read = world
        .engine
        .invoke_capability(&cap2, "read", None, &world.charlie, &world.stores())
        .unwrap();
    world.engine.verify_invocation(&read, &world.stores()).unwrap();

    let err = world
        .engine
        .invoke_capability(&cap2, "write", None, &world.charlie, &world.stores())
        .unwrap_err();
    assert!(matches!(err, ZcapError::ActionNotAllowed(name) if name == "write"));
}

#[test]
fn revoking_the_root_invalidates_the_chain() {
    let world = World::new();
    let cap1 = world.issue_cap1();
    let cap2 = world.delegate_cap2(&cap1);

    world.revocations.revoke(cap1.id.clone());

    let err = world
        .engine
        .verify_capability(&cap2, &world.stores())
        .unwrap_err();
    assert!(matches!(err, ZcapError::Revoked(id) if id == cap1.id));

    // Finality: it stays revoked, and invocation is gone too.
    let err = world
        .engine
        .verify_capability(&cap2, &world.stores())
        .unwrap_err();
    assert!(matches!(err, ZcapError::Revoked(_)));
    let err = world
        .engine
        .invoke_capability(&cap2, "read", None, &world.charlie, &world.stores())
        .unwrap_err();
    assert!(matches!(err, ZcapError::Revoked(_)));
}

#[test]
fn replayed_invocation_is_rejected_exactly_once() {
    let world = World::new();
    let cap1 = world.issue_cap1();
    let cap2 = world.delegate_cap2(&cap1);

    let captured = world
        .engine
        .invoke_capability(&cap2, "read", None, &world.charlie, &world.stores())
        .unwrap();

    world
        .engine
        .verify_invocation(&captured, &world.stores())
        .unwrap();

    // Re-submitting the identical signed document must fail.
    let err = world
        .engine
        .verify_invocation(&captured, &world.stores())
        .unwrap_err();
    assert!(matches!(err, ZcapError::ReplayedNonce));
}

#[test]
fn expiry_attenuation_violation_produces_nothing() {
    let world = World::new();
    let cap1 = world.issue_cap1();

    let err = world
        .engine
        .delegate_capability(
            &cap1,
            &world.bob,
            "did:example:charlie",
            None,
            Some(start_time() + Duration::days(31)),
            vec![],
            &world.stores(),
        )
        .unwrap_err();
    assert!(matches!(err, ZcapError::ExpiryExceedsParent));
}

#[test]
fn unknown_caveat_fails_verification() {
    let world = World::new();
    let foobar: Caveat = serde_json::from_value(serde_json::json!({"type": "FooBar"})).unwrap();

    let cap4 = world
        .engine
        .create_capability(
            "did:example:alice",
            "did:example:bob",
            vec![Action::new("read")],
            Target::new("urn:doc:1", "Document"),
            &world.alice,
            None,
            vec![foobar],
        )
        .unwrap();
    world.capabilities.insert(cap4.clone());

    let err = world
        .engine
        .verify_capability(&cap4, &world.stores())
        .unwrap_err();
    assert!(matches!(err, ZcapError::UnknownCaveat(name) if name == "FooBar"));
}

#[test]
fn externally_enforced_caveats_pass_when_enrolled() {
    let world = World::new();
    let cap1 = world.issue_cap1();

    let metered = world
        .engine
        .delegate_capability(
            &cap1,
            &world.bob,
            "did:example:charlie",
            Some(vec![Action::new("read")]),
            None,
            vec![Caveat::MaxUses { limit: 3 }],
            &world.stores(),
        )
        .unwrap();
    world.capabilities.insert(metered.clone());

    let err = world
        .engine
        .verify_capability(&metered, &world.stores())
        .unwrap_err();
    assert!(matches!(err, ZcapError::UnknownCaveat(name) if name == "MaxUses"));

    let enrolled = Engine::new()
        .with_clock(world.clock.clone())
        .allow_external_caveat("MaxUses");
    enrolled
        .verify_capability(&metered, &world.stores())
        .unwrap();
    enrolled
        .invoke_capability(&metered, "read", None, &world.charlie, &world.stores())
        .unwrap();
}

#[test]
fn capability_round_trips_through_the_wire_format() {
    let world = World::new();
    let cap1 = world.issue_cap1();
    let cap2 = world.delegate_cap2(&cap1);

    let doc = capability_to_json(&cap2).unwrap();
    assert_eq!(doc["type"], "Capability");
    assert_eq!(doc["parentCapability"], serde_json::json!(cap1.id));
    assert_eq!(doc["proof"]["proofPurpose"], "capabilityDelegation");

    let reparsed = capability_from_json(doc).unwrap();
    assert_eq!(reparsed, cap2);
    world
        .engine
        .verify_capability(&reparsed, &world.stores())
        .unwrap();
}

#[test]
fn expired_delegation_window_closes() {
    let world = World::new();
    let cap1 = world.issue_cap1();
    let cap2 = world.delegate_cap2(&cap1);

    world.clock.advance(Duration::days(8));
    let err = world
        .engine
        .verify_capability(&cap2, &world.stores())
        .unwrap_err();
    assert!(matches!(err, ZcapError::Expired));

    // The wider parent grant is still live.
    world.engine.verify_capability(&cap1, &world.stores()).unwrap();
}

#[test]
fn three_level_chain_accumulates_caveats() {
    let world = World::new();
    let dave = SigningKey::from_bytes(&[4u8; 32]);
    world
        .did_keys
        .register(Did::parse("did:example:dave").unwrap(), dave.verifying_key());

    let cap1 = world.issue_cap1();
    let cap2 = world.delegate_cap2(&cap1);
    let cap3 = world
        .engine
        .delegate_capability(
            &cap2,
            &world.charlie,
            "did:example:dave",
            None,
            None,
            vec![Caveat::RequireParameter {
                parameter: "mode".to_string(),
                value: serde_json::json!("basic"),
            }],
            &world.stores(),
        )
        .unwrap();
    world.capabilities.insert(cap3.clone());

    world.engine.verify_capability(&cap3, &world.stores()).unwrap();

    // Missing parameter: blocked by cap3's caveat.
    let err = world
        .engine
        .invoke_capability(&cap3, "read", None, &dave, &world.stores())
        .unwrap_err();
    assert!(matches!(err, ZcapError::CaveatFailed { .. }));

    // Correct parameter and action allowed by every level.
    let mut params = zcap_caps::Parameters::new();
    params.insert("mode".to_string(), serde_json::json!("basic"));
    let inv = world
        .engine
        .invoke_capability(&cap3, "read", Some(params), &dave, &world.stores())
        .unwrap();
    world.engine.verify_invocation(&inv, &world.stores()).unwrap();
}
