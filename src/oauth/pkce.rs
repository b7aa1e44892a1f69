//! PKCE verifier/challenge generation
//!
//! The verifier is the secret half of the pair: it stays with the user agent
//! (inside an HttpOnly cookie) and is only ever revealed to the token
//! endpoint. The challenge is its public derivation and is the only value
//! sent along the authorize redirect.

use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Bytes of entropy behind each verifier (256 bits before encoding)
pub const VERIFIER_ENTROPY_BYTES: usize = 32;

/// A freshly generated verifier and its derived challenge
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

/// Generate a new PKCE pair from the OS-seeded CSPRNG
///
/// Entropy exhaustion panics inside the RNG and takes the process down;
/// there is no per-request recovery from a broken entropy source.
#[must_use]
pub fn generate_pkce() -> PkcePair {
    let mut raw = [0u8; VERIFIER_ENTROPY_BYTES];
    rand::rng().fill_bytes(&mut raw);
    let verifier = general_purpose::URL_SAFE_NO_PAD.encode(raw);
    let challenge = derive_challenge(&verifier);
    PkcePair {
        verifier,
        challenge,
    }
}

/// Derive the public challenge for a verifier: base64url(SHA-256(verifier))
///
/// Deterministic, so the callback leg never needs to recompute or store the
/// challenge server-side.
#[must_use]
pub fn derive_challenge(verifier: &str) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}
