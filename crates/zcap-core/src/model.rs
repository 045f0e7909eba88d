//! Capability and invocation entities.
//!
//! Field names follow the JSON-LD wire form (`parentCapability`,
//! `proofPurpose`, singular `action`/`caveat` keys); the codec and
//! canonicalizer lean on these serde attributes, so renames here are
//! signature-breaking changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::caveat::Caveat;
use crate::error::{Result, ZcapError};

/// Fixed `@context` of every capability and invocation document.
pub const SECURITY_V2_CONTEXT: &str = "https://www.w3.org/ns/security/v2";
pub const ZCAP_V1_CONTEXT: &str = "https://w3id.org/zcap/v1";

/// The only proof suite this engine produces or accepts.
pub const ED25519_SIGNATURE_2020: &str = "Ed25519Signature2020";

pub const CAPABILITY_TYPE: &str = "Capability";
pub const INVOCATION_TYPE: &str = "Invocation";

pub fn default_context() -> Vec<String> {
    vec![SECURITY_V2_CONTEXT.to_string(), ZCAP_V1_CONTEXT.to_string()]
}

fn capability_doc_type() -> String {
    CAPABILITY_TYPE.to_string()
}

fn invocation_doc_type() -> String {
    INVOCATION_TYPE.to_string()
}

/// Action and invocation parameters: a string-keyed JSON mapping.
pub type Parameters = BTreeMap<String, Value>;

/// Decentralized identifier: `did:<method>:<method-specific>`.
///
/// Opaque beyond its shape; used only as a lookup key into the DID key
/// store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Did(String);

impl Did {
    /// Parse and validate the `did:<method>:<suffix>` shape.
    pub fn parse(s: &str) -> Result<Self> {
        let malformed = || ZcapError::MalformedDid(s.to_string());
        let rest = s.strip_prefix("did:").ok_or_else(malformed)?;
        let (method, suffix) = rest.split_once(':').ok_or_else(malformed)?;
        if method.is_empty()
            || suffix.is_empty()
            || !method
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(malformed());
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role a party plays in a capability document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartyRole {
    Controller,
    Invoker,
}

/// A principal referenced by a capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub id: Did,
    #[serde(rename = "type")]
    pub role: PartyRole,
}

impl Party {
    pub fn controller(id: Did) -> Self {
        Self {
            id,
            role: PartyRole::Controller,
        }
    }

    pub fn invoker(id: Did) -> Self {
        Self {
            id,
            role: PartyRole::Invoker,
        }
    }
}

/// A named action with the parameter values authorized at issuance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub parameters: Parameters,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Parameters::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }
}

/// The resource a capability refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    #[serde(rename = "type")]
    pub target_type: String,
}

impl Target {
    pub fn new(id: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target_type: target_type.into(),
        }
    }
}

/// Purpose a proof was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofPurpose {
    #[serde(rename = "capabilityDelegation")]
    CapabilityDelegation,
    #[serde(rename = "capabilityInvocation")]
    CapabilityInvocation,
}

/// Signature block bound to a capability or invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    pub id: String,
    #[serde(rename = "type")]
    pub proof_type: String,
    #[serde(with = "crate::codec::datetime")]
    pub created: DateTime<Utc>,
    pub verification_method: Did,
    pub proof_purpose: ProofPurpose,
    pub proof_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// A signed, attenuable grant of authority over a target resource.
///
/// Immutable once signed. Holds only its parent's id, never the parent
/// object; chain resolution goes through the capability store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    #[serde(rename = "@context", default = "default_context")]
    pub context: Vec<String>,
    #[serde(rename = "type", default = "capability_doc_type")]
    pub doc_type: String,
    pub id: String,
    pub controller: Party,
    pub invoker: Party,
    #[serde(rename = "action")]
    pub actions: Vec<Action>,
    pub target: Target,
    #[serde(
        rename = "parentCapability",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_capability: Option<String>,
    #[serde(rename = "caveat", default)]
    pub caveats: Vec<Caveat>,
    #[serde(with = "crate::codec::datetime")]
    pub created: DateTime<Utc>,
    #[serde(
        default,
        with = "crate::codec::datetime_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

impl Capability {
    pub fn is_root(&self) -> bool {
        self.parent_capability.is_none()
    }

    /// Look up a granted action by name.
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }
}

/// A signed, time-bound, single-use intent to exercise a capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    #[serde(rename = "@context", default = "default_context")]
    pub context: Vec<String>,
    #[serde(rename = "type", default = "invocation_doc_type")]
    pub doc_type: String,
    pub id: String,
    pub action: String,
    pub capability: String,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(with = "crate::codec::datetime")]
    pub created: DateTime<Utc>,
    pub nonce: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}
