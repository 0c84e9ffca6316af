//! Cryptographic primitives.
//!
//! Passphrase key derivation, the symmetric codec used for stored drops, X25519
//! key pairs, and the sealed (anonymous public-key) codec.

pub mod aead;
pub mod kdf;
pub mod keys;
pub mod sealed;

pub use aead::{Ciphertext, SymmetricKey, decrypt, encrypt, generate_key};
pub use kdf::{KdfParams, LEGACY_SALT, derive_key, generate_salt};
pub use keys::{KeyPair, PublicKey, derive_from_passphrase, generate, parse_public_key};
pub use sealed::SealedArtifact;

use crate::error::{Error, Result};

/// Length of the passphrase salt (16 bytes).
pub const SALT_LEN: usize = 16;
/// Length of the nonce (12 bytes for ChaCha20-Poly1305).
pub const NONCE_LEN: usize = 12;
/// Length of a symmetric key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of the Poly1305 authentication tag.
pub const TAG_LEN: usize = 16;
/// Length of an X25519 scalar or point.
pub const X25519_LEN: usize = 32;

/// Fill buffer with cryptographically secure random bytes
pub(crate) fn secure_random(buf: &mut [u8]) -> Result<()> {
    getrandom::fill(buf).map_err(|_| Error::Random)
}
