//! Engine configuration.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as B64URL, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use zcap_core::clock::{Clock, SystemClock};

/// Default freshness window and replay-guard horizon for invocations.
pub const DEFAULT_NONCE_TTL_SECS: i64 = 5 * 60;

/// Default bound on delegation chain length.
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 16;

/// The capability engine.
///
/// Stateless apart from configuration: every operation reads and writes
/// through the caller-supplied [`zcap_core::Stores`]. Construct once and
/// share freely; all methods take `&self`.
pub struct Engine {
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) nonce_ttl: Duration,
    pub(crate) max_chain_depth: usize,
    pub(crate) external_caveats: HashSet<String>,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            nonce_ttl: Duration::seconds(DEFAULT_NONCE_TTL_SECS),
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            external_caveats: HashSet::new(),
        }
    }

    /// Replace the wall clock (test injection).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the invocation freshness window and replay-guard horizon.
    pub fn with_nonce_ttl(mut self, ttl: Duration) -> Self {
        self.nonce_ttl = ttl;
        self
    }

    /// Bound the delegation chain length accepted by verification.
    pub fn with_max_chain_depth(mut self, depth: usize) -> Self {
        self.max_chain_depth = depth;
        self
    }

    /// Declare a caveat type the caller enforces outside the engine
    /// (e.g. `"AllowedNetwork"`, `"MaxUses"`). Undeclared host-context
    /// caveats fail closed as unknown.
    pub fn allow_external_caveat(mut self, type_name: impl Into<String>) -> Self {
        self.external_caveats.insert(type_name.into());
        self
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Fresh `urn:uuid:` identifier.
pub(crate) fn urn_uuid() -> String {
    format!("urn:uuid:{}", Uuid::new_v4())
}

/// Fresh 128-bit invocation nonce, base64url without padding.
pub(crate) fn new_nonce() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    B64URL.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let engine = Engine::new();
        assert_eq!(engine.nonce_ttl, Duration::seconds(300));
        assert_eq!(engine.max_chain_depth, DEFAULT_MAX_CHAIN_DEPTH);
        assert!(engine.external_caveats.is_empty());
    }

    #[test]
    fn builder_overrides() {
        let engine = Engine::new()
            .with_nonce_ttl(Duration::seconds(60))
            .with_max_chain_depth(3)
            .allow_external_caveat("MaxUses");
        assert_eq!(engine.nonce_ttl, Duration::seconds(60));
        assert_eq!(engine.max_chain_depth, 3);
        assert!(engine.external_caveats.contains("MaxUses"));
    }

    #[test]
    fn urn_uuid_shape() {
        let id = urn_uuid();
        assert!(id.starts_with("urn:uuid:"));
        assert_eq!(id.len(), "urn:uuid:".len() + 36);
        assert_ne!(id, urn_uuid());
    }

    #[test]
    fn nonce_is_unpadded_base64url() {
        let nonce = new_nonce();
        assert_eq!(nonce.len(), 22); // 16 bytes, no padding
        assert!(!nonce.contains('='));
        assert_ne!(nonce, new_nonce());
    }
}
