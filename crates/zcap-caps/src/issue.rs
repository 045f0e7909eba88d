//! Capability issuance and delegation.
//!
//! Both paths build the document, canonicalize it without `proof`, sign
//! the bytes, and embed the proof. Delegation additionally verifies the
//! parent and refuses anything broader than it.

use chrono::{DateTime, Utc};
use tracing::debug;

use zcap_core::canonical;
use zcap_core::caveat::Caveat;
use zcap_core::error::{Result, ZcapError};
use zcap_core::model::{
    default_context, Action, Capability, Did, Party, Proof, ProofPurpose, Target, CAPABILITY_TYPE,
    ED25519_SIGNATURE_2020,
};
use zcap_core::store::Stores;
use zcap_crypto::SigningKey;

use crate::engine::{urn_uuid, Engine};
use crate::verify::ensure_actions_attenuate;

impl Engine {
    /// Issue a self-rooted capability signed by its controller.
    pub fn create_capability(
        &self,
        controller_did: &str,
        invoker_did: &str,
        actions: Vec<Action>,
        target: Target,
        controller_key: &SigningKey,
        expires: Option<DateTime<Utc>>,
        caveats: Vec<Caveat>,
    ) -> Result<Capability> {
        if actions.is_empty() {
            return Err(ZcapError::EmptyActions);
        }
        let controller = Did::parse(controller_did)?;
        let invoker = Did::parse(invoker_did)?;

        let cap = Capability {
            context: default_context(),
            doc_type: CAPABILITY_TYPE.to_string(),
            id: urn_uuid(),
            controller: Party::controller(controller.clone()),
            invoker: Party::invoker(invoker),
            actions,
            target,
            parent_capability: None,
            caveats,
            created: self.now(),
            expires,
            proof: None,
        };
        debug!(id = %cap.id, controller = %controller, "issuing root capability");
        self.sign_capability(cap, controller_key, controller)
    }

    /// Delegate `parent` to a new invoker, strictly no broader than the
    /// parent. The delegator must hold the key registered for the
    /// parent's invoker.
    pub fn delegate_capability(
        &self,
        parent: &Capability,
        delegator_key: &SigningKey,
        new_invoker_did: &str,
        actions: Option<Vec<Action>>,
        expires: Option<DateTime<Utc>>,
        caveats: Vec<Caveat>,
        stores: &Stores<'_>,
    ) -> Result<Capability> {
        if stores.capabilities.get(&parent.id).is_none() {
            return Err(ZcapError::CapabilityNotFound(parent.id.clone()));
        }
        self.verify_capability(parent, stores)?;

        let registered = stores
            .did_keys
            .get(&parent.invoker.id)
            .ok_or_else(|| ZcapError::UnknownDid(parent.invoker.id.to_string()))?;
        if delegator_key.verifying_key() != registered {
            return Err(ZcapError::DelegationNotPermitted(
                "delegator key does not match the parent invoker".to_string(),
            ));
        }

        let actions = match actions {
            None => parent.actions.clone(),
            Some(actions) => {
                if actions.is_empty() {
                    return Err(ZcapError::EmptyActions);
                }
                ensure_actions_attenuate(&actions, &parent.actions)?;
                actions
            }
        };

        let expires = match expires {
            None => parent.expires,
            Some(expires) => {
                if let Some(parent_expires) = parent.expires {
                    if expires > parent_expires {
                        return Err(ZcapError::ExpiryExceedsParent);
                    }
                }
                Some(expires)
            }
        };

        let new_invoker = Did::parse(new_invoker_did)?;
        let controller = parent.invoker.id.clone();
        let cap = Capability {
            context: default_context(),
            doc_type: CAPABILITY_TYPE.to_string(),
            id: urn_uuid(),
            controller: Party::controller(controller.clone()),
            invoker: Party::invoker(new_invoker.clone()),
            actions,
            target: parent.target.clone(),
            parent_capability: Some(parent.id.clone()),
            caveats,
            created: self.now(),
            expires,
            proof: None,
        };
        debug!(
            id = %cap.id,
            parent = %parent.id,
            invoker = %new_invoker,
            "delegating capability"
        );
        self.sign_capability(cap, delegator_key, controller)
    }

    fn sign_capability(
        &self,
        mut cap: Capability,
        key: &SigningKey,
        verification_method: Did,
    ) -> Result<Capability> {
        let bytes = canonical::capability_signing_bytes(&cap)?;
        let signature = zcap_crypto::sign(key, &bytes);
        cap.proof = Some(Proof {
            id: urn_uuid(),
            proof_type: ED25519_SIGNATURE_2020.to_string(),
            created: cap.created,
            verification_method,
            proof_purpose: ProofPurpose::CapabilityDelegation,
            proof_value: zcap_crypto::encode_signature(&signature),
            domain: None,
            nonce: None,
        });
        Ok(cap)
    }
}
