//! Ed25519 primitives.
//!
//! Detached sign/verify over raw bytes, plus the base64url (no padding)
//! encoding used for public keys and signatures in proof documents.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as B64URL, Engine};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use crate::error::{CryptoError, Result};

/// Generate a fresh Ed25519 signing key from the OS RNG.
pub fn generate_signing_key() -> SigningKey {
    SigningKey::generate(&mut OsRng)
}

/// Sign a message with an Ed25519 private key.
pub fn sign(key: &SigningKey, message: &[u8]) -> Signature {
    key.sign(message)
}

/// Verify an Ed25519 signature. Returns `false` on any mismatch.
pub fn verify(key: &VerifyingKey, message: &[u8], signature: &Signature) -> bool {
    key.verify(message, signature).is_ok()
}

/// Encode a public key as base64url without padding (32 raw bytes).
pub fn encode_public_key(key: &VerifyingKey) -> String {
    B64URL.encode(key.to_bytes())
}

/// Decode a base64url public key back into a verifying key.
pub fn decode_public_key(encoded: &str) -> Result<VerifyingKey> {
    let bytes = B64URL
        .decode(encoded)
        .map_err(|e| CryptoError::InvalidKey(format!("invalid base64url: {e}")))?;
    let raw: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len())))?;
    VerifyingKey::from_bytes(&raw).map_err(|e| CryptoError::InvalidKey(e.to_string()))
}

/// Encode a signature as base64url without padding (64 raw bytes).
pub fn encode_signature(signature: &Signature) -> String {
    B64URL.encode(signature.to_bytes())
}

/// Decode a base64url signature.
pub fn decode_signature(encoded: &str) -> Result<Signature> {
    let bytes = B64URL
        .decode(encoded)
        .map_err(|e| CryptoError::InvalidSignature(format!("invalid base64url: {e}")))?;
    let raw: [u8; 64] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| {
            CryptoError::InvalidSignature(format!("expected 64 bytes, got {}", bytes.len()))
        })?;
    Ok(Signature::from_bytes(&raw))
}
