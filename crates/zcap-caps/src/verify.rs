//! Recursive delegation-chain verification.
//!
//! Depth-first from the presented capability toward the root: each level
//! checks revocation and expiry, verifies its parent, then enforces the
//! attenuation invariants against it before its own caveats and proof.
//! The first failure propagates unmodified.

use tracing::{debug, trace};

use zcap_core::canonical;
use zcap_core::caveat::{self, CaveatContext};
use zcap_core::error::{Result, ZcapError};
use zcap_core::model::{Action, Capability, ProofPurpose, ED25519_SIGNATURE_2020};
use zcap_core::store::Stores;
use zcap_crypto::VerifyingKey;

use crate::engine::Engine;

impl Engine {
    /// Verify a capability and its whole parent chain.
    pub fn verify_capability(&self, cap: &Capability, stores: &Stores<'_>) -> Result<()> {
        self.verify_capability_at_depth(cap, stores, 0)
    }

    fn verify_capability_at_depth(
        &self,
        cap: &Capability,
        stores: &Stores<'_>,
        depth: usize,
    ) -> Result<()> {
        debug!(id = %cap.id, depth, "verifying capability");

        if stores.revocations.contains(&cap.id) {
            return Err(ZcapError::Revoked(cap.id.clone()));
        }

        let now = self.now();
        if let Some(expires) = cap.expires {
            if now > expires {
                return Err(ZcapError::Expired);
            }
        }
        if cap.created > now {
            return Err(ZcapError::NotYetValid);
        }

        if let Some(parent_id) = &cap.parent_capability {
            if depth + 1 > self.max_chain_depth {
                return Err(ZcapError::ChainTooDeep {
                    depth: depth + 1,
                    max: self.max_chain_depth,
                });
            }
            let parent = stores
                .capabilities
                .get(parent_id)
                .ok_or_else(|| ZcapError::ParentNotFound(parent_id.clone()))?;
            self.verify_capability_at_depth(&parent, stores, depth + 1)?;
            ensure_attenuation(cap, &parent)?;
        }

        let ctx = CaveatContext {
            now,
            action: None,
            parameters: None,
            revocations: stores.revocations,
            external: &self.external_caveats,
        };
        for cv in &cap.caveats {
            trace!(id = %cap.id, caveat = cv.type_name(), "evaluating caveat");
            caveat::evaluate(cv, &ctx)?;
        }

        let key = stores
            .did_keys
            .get(&cap.controller.id)
            .ok_or_else(|| ZcapError::UnknownDid(cap.controller.id.to_string()))?;
        check_capability_proof(cap, &key)
    }
}

/// Enforce the parent/child attenuation invariants.
fn ensure_attenuation(child: &Capability, parent: &Capability) -> Result<()> {
    if child.controller.id != parent.invoker.id {
        return Err(ZcapError::ControllerNotParentInvoker);
    }
    if child.target.id != parent.target.id {
        return Err(ZcapError::TargetMismatch);
    }
    ensure_actions_attenuate(&child.actions, &parent.actions)?;
    if let (Some(child_expires), Some(parent_expires)) = (child.expires, parent.expires) {
        if child_expires > parent_expires {
            return Err(ZcapError::ExpiryExceedsParent);
        }
    }
    if child.created < parent.created {
        return Err(ZcapError::CreatedBeforeParent);
    }
    Ok(())
}

/// Every child action must appear in the parent by name; where both sides
/// pin the same parameter key, the values must be equal.
pub(crate) fn ensure_actions_attenuate(child: &[Action], parent: &[Action]) -> Result<()> {
    for action in child {
        let parent_action = parent
            .iter()
            .find(|a| a.name == action.name)
            .ok_or_else(|| ZcapError::ActionNotPermitted(action.name.clone()))?;
        for (key, value) in &action.parameters {
            if let Some(parent_value) = parent_action.parameters.get(key) {
                if parent_value != value {
                    return Err(ZcapError::ActionNotPermitted(format!(
                        "{}: parameter {key} diverges from parent",
                        action.name
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Check the proof block and the Ed25519 signature over the canonical
/// proof-less bytes.
fn check_capability_proof(cap: &Capability, key: &VerifyingKey) -> Result<()> {
    let proof = cap.proof.as_ref().ok_or(ZcapError::ProofMissing)?;
    if proof.proof_type != ED25519_SIGNATURE_2020 {
        return Err(ZcapError::MalformedProof(format!(
            "unsupported proof type {}",
            proof.proof_type
        )));
    }
    if proof.proof_purpose != ProofPurpose::CapabilityDelegation {
        return Err(ZcapError::MalformedProof(
            "proof purpose must be capabilityDelegation".to_string(),
        ));
    }
    if proof.verification_method != cap.controller.id {
        return Err(ZcapError::MalformedProof(
            "verificationMethod does not match controller".to_string(),
        ));
    }
    let bytes = canonical::capability_signing_bytes(cap)?;
    let signature =
        zcap_crypto::decode_signature(&proof.proof_value).map_err(|_| ZcapError::SignatureInvalid)?;
    if !zcap_crypto::verify(key, &bytes, &signature) {
        return Err(ZcapError::SignatureInvalid);
    }
    Ok(())
}
