//! # zcap-crypto
//!
//! Ed25519 signing layer for ZCAP capability documents.
//!
//! Pure primitives with no model dependency: detached sign/verify over the
//! canonical bytes produced upstream, and the base64url (no padding)
//! encoding that proof documents use for public keys and signatures.

pub mod error;
pub mod primitives;

pub use error::{CryptoError, Result};
pub use primitives::{
    decode_public_key, decode_signature, encode_public_key, encode_signature,
    generate_signing_key, sign, verify,
};

// Re-exported so callers don't need a direct ed25519-dalek dependency.
pub use ed25519_dalek::{Signature, SigningKey, VerifyingKey};
