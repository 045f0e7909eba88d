//! Deterministic signing input.
//!
//! The canonical form of a document is its compact JSON-LD rendering with
//! the `proof` member removed: keys in lexicographic order at every level,
//! no whitespace, UTF-8, no trailing newline. Key ordering falls out of
//! `serde_json`'s default `BTreeMap` object representation; the workspace
//! must never enable the `preserve_order` feature.

use serde::Serialize;

use crate::error::{Result, ZcapError};
use crate::model::{Capability, Invocation};

/// Bytes a capability proof signs: the document with `proof` removed.
pub fn capability_signing_bytes(cap: &Capability) -> Result<Vec<u8>> {
    signing_bytes(cap)
}

/// Bytes an invocation proof signs: the document with `proof` removed.
pub fn invocation_signing_bytes(inv: &Invocation) -> Result<Vec<u8>> {
    signing_bytes(inv)
}

fn signing_bytes<T: Serialize>(doc: &T) -> Result<Vec<u8>> {
    let mut value =
        serde_json::to_value(doc).map_err(|e| ZcapError::CanonicalizationFailed(e.to_string()))?;
    match value.as_object_mut() {
        Some(object) => {
            object.remove("proof");
        }
        None => {
            return Err(ZcapError::CanonicalizationFailed(
                "document is not a JSON object".to_string(),
            ))
        }
    }
    let rendered = serde_json::to_string(&value)
        .map_err(|e| ZcapError::CanonicalizationFailed(e.to_string()))?;
    Ok(rendered.into_bytes())
}
