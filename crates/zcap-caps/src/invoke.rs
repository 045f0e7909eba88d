//! Invocation: create, sign, verify, replay-guard.
//!
//! Effective caveats are the union of the capability's own caveats and
//! those of its ancestors, evaluated root first. The replay guard is a
//! single check-and-insert against the nonce store; after each successful
//! verification, nonces older than the freshness window are evicted so
//! the store stays bounded.

use tracing::{debug, trace};

use zcap_core::canonical;
use zcap_core::caveat::{self, CaveatContext};
use zcap_core::error::{Result, ZcapError};
use zcap_core::model::{
    default_context, Capability, Invocation, Parameters, Proof, ProofPurpose,
    ED25519_SIGNATURE_2020, INVOCATION_TYPE,
};
use zcap_core::store::Stores;
use zcap_crypto::SigningKey;

use crate::engine::{new_nonce, urn_uuid, Engine};

impl Engine {
    /// Exercise a capability: verify it, check the action and every
    /// effective caveat, then produce a signed single-use invocation.
    pub fn invoke_capability(
        &self,
        cap: &Capability,
        action_name: &str,
        parameters: Option<Parameters>,
        invoker_key: &SigningKey,
        stores: &Stores<'_>,
    ) -> Result<Invocation> {
        self.verify_capability(cap, stores)?;

        if cap.action(action_name).is_none() {
            return Err(ZcapError::ActionNotAllowed(action_name.to_string()));
        }

        let parameters = parameters.unwrap_or_default();
        let now = self.now();
        self.check_effective_caveats(cap, stores, action_name, &parameters)?;

        let registered = stores
            .did_keys
            .get(&cap.invoker.id)
            .ok_or_else(|| ZcapError::UnknownDid(cap.invoker.id.to_string()))?;
        if invoker_key.verifying_key() != registered {
            return Err(ZcapError::InvokerMismatch);
        }

        let mut inv = Invocation {
            context: default_context(),
            doc_type: INVOCATION_TYPE.to_string(),
            id: urn_uuid(),
            action: action_name.to_string(),
            capability: cap.id.clone(),
            parameters,
            created: now,
            nonce: new_nonce(),
            proof: None,
        };
        debug!(id = %inv.id, capability = %cap.id, action = action_name, "invoking capability");

        let bytes = canonical::invocation_signing_bytes(&inv)?;
        let signature = zcap_crypto::sign(invoker_key, &bytes);
        inv.proof = Some(Proof {
            id: urn_uuid(),
            proof_type: ED25519_SIGNATURE_2020.to_string(),
            created: now,
            verification_method: cap.invoker.id.clone(),
            proof_purpose: ProofPurpose::CapabilityInvocation,
            proof_value: zcap_crypto::encode_signature(&signature),
            domain: None,
            nonce: None,
        });
        Ok(inv)
    }

    /// Verify an invocation: capability chain, action, effective caveats,
    /// freshness, replay guard, signature.
    pub fn verify_invocation(&self, inv: &Invocation, stores: &Stores<'_>) -> Result<()> {
        let cap = stores
            .capabilities
            .get(&inv.capability)
            .ok_or_else(|| ZcapError::CapabilityNotFound(inv.capability.clone()))?;
        self.verify_capability(&cap, stores)?;

        if cap.action(&inv.action).is_none() {
            return Err(ZcapError::ActionNotAllowed(inv.action.clone()));
        }
        self.check_effective_caveats(&cap, stores, &inv.action, &inv.parameters)?;

        let now = self.now();
        let age = now.signed_duration_since(inv.created);
        if age > self.nonce_ttl || -age > self.nonce_ttl {
            return Err(ZcapError::StaleInvocation);
        }

        if !stores.nonces.insert_if_absent(&inv.nonce, inv.created) {
            return Err(ZcapError::ReplayedNonce);
        }

        let key = stores
            .did_keys
            .get(&cap.invoker.id)
            .ok_or_else(|| ZcapError::UnknownDid(cap.invoker.id.to_string()))?;
        check_invocation_proof(inv, &cap, &key)?;

        stores.nonces.evict_older_than(now - self.nonce_ttl);
        debug!(id = %inv.id, "invocation verified");
        Ok(())
    }

    /// Evaluate the union of caveats along the chain, root first.
    fn check_effective_caveats(
        &self,
        cap: &Capability,
        stores: &Stores<'_>,
        action: &str,
        parameters: &Parameters,
    ) -> Result<()> {
        let chain = self.collect_chain(cap, stores)?;
        let ctx = CaveatContext {
            now: self.now(),
            action: Some(action),
            parameters: Some(parameters),
            revocations: stores.revocations,
            external: &self.external_caveats,
        };
        for link in &chain {
            for cv in &link.caveats {
                trace!(capability = %link.id, caveat = cv.type_name(), "evaluating effective caveat");
                caveat::evaluate(cv, &ctx)?;
            }
        }
        Ok(())
    }

    /// Resolve the ancestry of a capability, root first, including itself.
    fn collect_chain(&self, cap: &Capability, stores: &Stores<'_>) -> Result<Vec<Capability>> {
        let mut chain = vec![cap.clone()];
        while let Some(parent_id) = chain.last().and_then(|c| c.parent_capability.clone()) {
            if chain.len() > self.max_chain_depth {
                return Err(ZcapError::ChainTooDeep {
                    depth: chain.len(),
                    max: self.max_chain_depth,
                });
            }
            let parent = stores
                .capabilities
                .get(&parent_id)
                .ok_or_else(|| ZcapError::ParentNotFound(parent_id.clone()))?;
            chain.push(parent);
        }
        chain.reverse();
        Ok(chain)
    }
}

fn check_invocation_proof(
    inv: &Invocation,
    cap: &Capability,
    key: &zcap_crypto::VerifyingKey,
) -> Result<()> {
    let proof = inv.proof.as_ref().ok_or(ZcapError::ProofMissing)?;
    if proof.proof_type != ED25519_SIGNATURE_2020 {
        return Err(ZcapError::MalformedProof(format!(
            "unsupported proof type {}",
            proof.proof_type
        )));
    }
    if proof.proof_purpose != ProofPurpose::CapabilityInvocation {
        return Err(ZcapError::MalformedProof(
            "proof purpose must be capabilityInvocation".to_string(),
        ));
    }
    if proof.verification_method != cap.invoker.id {
        return Err(ZcapError::MalformedProof(
            "verificationMethod does not match the capability invoker".to_string(),
        ));
    }
    let bytes = canonical::invocation_signing_bytes(inv)?;
    let signature =
        zcap_crypto::decode_signature(&proof.proof_value).map_err(|_| ZcapError::SignatureInvalid)?;
    if !zcap_crypto::verify(key, &bytes, &signature) {
        return Err(ZcapError::SignatureInvalid);
    }
    Ok(())
}
