//! Sealed ciphertext format v1.
//!
//! ```text
//! EPHEMERAL_PUBLIC_KEY (32) | CIPHERTEXT | TAG (16)
//! ```

use crate::crypto::{TAG_LEN, X25519_LEN};

/// Sealed ciphertext format version.
pub const VERSION_V1: u32 = 1;

/// Shortest valid v1 ciphertext (empty message).
pub const MIN_LEN: usize = X25519_LEN + TAG_LEN;

/// Splits a v1 sealed ciphertext into the ephemeral public key and the AEAD body.
///
/// Returns `None` if the input is too short to hold both.
pub fn split(sealed: &[u8]) -> Option<([u8; X25519_LEN], &[u8])> {
    if sealed.len() < MIN_LEN {
        return None;
    }
    let (ephemeral, body) = sealed.split_at(X25519_LEN);
    Some((ephemeral.try_into().ok()?, body))
}

/// Serializes an ephemeral public key and AEAD body to v1 bytes.
pub fn join(ephemeral: &[u8; X25519_LEN], body: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(X25519_LEN + body.len());
    buf.extend_from_slice(ephemeral);
    buf.extend_from_slice(body);
    buf
}
