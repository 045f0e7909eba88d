//! JSON-LD codec.
//!
//! Converts capability and invocation entities to and from their JSON-LD
//! documents, validating the fixed `@context` and `type` envelope on
//! import. Also home to the single datetime wire form every document
//! field uses: ISO 8601 UTC with millisecond precision and a trailing `Z`.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::error::{Result, ZcapError};
use crate::model::{default_context, Capability, Did, Invocation, CAPABILITY_TYPE, INVOCATION_TYPE};

pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub(crate) fn format_datetime(instant: &DateTime<Utc>) -> String {
    instant.format(DATETIME_FORMAT).to_string()
}

/// Parse a document instant. Accepts RFC 3339 with any offset, plus the
/// offset-less ISO form some issuers emit; both normalize to UTC.
pub(crate) fn parse_datetime(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| format!("invalid datetime: {s}"))
}

/// Serde adapter for required datetime fields.
pub mod datetime {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        instant: &DateTime<Utc>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_datetime(instant))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_datetime(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional datetime fields.
pub mod datetime_opt {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        instant: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match instant {
            Some(instant) => serializer.serialize_str(&format_datetime(instant)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| parse_datetime(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Serialize a capability to its JSON-LD document.
pub fn capability_to_json(cap: &Capability) -> Result<Value> {
    serde_json::to_value(cap).map_err(|e| ZcapError::CanonicalizationFailed(e.to_string()))
}

/// Parse a capability from a JSON-LD document, validating the envelope.
pub fn capability_from_json(doc: Value) -> Result<Capability> {
    let cap: Capability = serde_json::from_value(doc)
        .map_err(|e| ZcapError::CanonicalizationFailed(e.to_string()))?;
    validate_envelope(&cap.context, &cap.doc_type, CAPABILITY_TYPE)?;
    Did::parse(cap.controller.id.as_str())?;
    Did::parse(cap.invoker.id.as_str())?;
    if let Some(proof) = &cap.proof {
        Did::parse(proof.verification_method.as_str())?;
    }
    Ok(cap)
}

/// Serialize an invocation to its JSON-LD document.
pub fn invocation_to_json(inv: &Invocation) -> Result<Value> {
    serde_json::to_value(inv).map_err(|e| ZcapError::CanonicalizationFailed(e.to_string()))
}

/// Parse an invocation from a JSON-LD document, validating the envelope.
pub fn invocation_from_json(doc: Value) -> Result<Invocation> {
    let inv: Invocation = serde_json::from_value(doc)
        .map_err(|e| ZcapError::CanonicalizationFailed(e.to_string()))?;
    validate_envelope(&inv.context, &inv.doc_type, INVOCATION_TYPE)?;
    if let Some(proof) = &inv.proof {
        Did::parse(proof.verification_method.as_str())?;
    }
    Ok(inv)
}

fn validate_envelope(context: &[String], doc_type: &str, expected_type: &str) -> Result<()> {
    if context != default_context().as_slice() {
        return Err(ZcapError::CanonicalizationFailed(format!(
            "unexpected @context: {context:?}"
        )));
    }
    if doc_type != expected_type {
        return Err(ZcapError::CanonicalizationFailed(format!(
            "expected type {expected_type}, got {doc_type}"
        )));
    }
    Ok(())
}
