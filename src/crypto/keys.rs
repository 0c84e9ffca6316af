//! X25519 key pairs: random generation, passphrase derivation, and the
//! key-pair file format.

use std::fmt;

use sha2::{Digest, Sha256};
use x25519_dalek::StaticSecret;
use zeroize::{Zeroize, Zeroizing};

use super::{X25519_LEN, secure_random};
use crate::error::{Error, Result};
use crate::format::{self, KeyPairFile};

pub use x25519_dalek::PublicKey;

/// Minimum passphrase length for deterministic key pairs, in characters.
pub const MIN_KEYPAIR_PASSPHRASE_CHARS: usize = 12;

/// An X25519 key pair. The private half is zeroed on drop.
#[derive(Clone)]
pub struct KeyPair {
    public: PublicKey,
    secret: StaticSecret,
}

impl KeyPair {
    fn from_private(mut bytes: [u8; X25519_LEN]) -> Self {
        let secret = StaticSecret::from(bytes);
        bytes.zeroize();
        Self {
            public: PublicKey::from(&secret),
            secret,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Public key as base64 text, the form shared with senders.
    pub fn public_key_base64(&self) -> String {
        format::encode(self.public.as_bytes())
    }

    pub fn private_key_bytes(&self) -> Zeroizing<[u8; X25519_LEN]> {
        Zeroizing::new(self.secret.to_bytes())
    }

    pub(crate) fn secret(&self) -> &StaticSecret {
        &self.secret
    }

    /// Serializes to the key-pair JSON file format.
    pub fn serialize(&self) -> Result<Zeroizing<String>> {
        let private = self.private_key_bytes();
        let file = KeyPairFile {
            public_key: self.public_key_base64(),
            private_key: format::encode(private.as_slice()),
        };
        serde_json::to_string_pretty(&file)
            .map(Zeroizing::new)
            .map_err(|e| Error::MalformedKey(format!("cannot encode key pair: {e}")))
    }

    /// Parses a key-pair JSON file and checks that both halves belong together.
    pub fn deserialize(text: &str) -> Result<Self> {
        let file: KeyPairFile = serde_json::from_str(text)
            .map_err(|_| Error::MalformedKey("expected public_key and private_key fields".into()))?;

        let private = format::decode_array::<X25519_LEN>(&file.private_key)
            .ok_or_else(|| Error::MalformedKey("private key is not 32 bytes of base64".into()))?;
        let public = format::decode_array::<X25519_LEN>(&file.public_key)
            .ok_or_else(|| Error::MalformedKey("public key is not 32 bytes of base64".into()))?;

        let pair = Self::from_private(private);
        if pair.public.as_bytes() != &public {
            return Err(Error::MalformedKey(
                "public key does not match private key".into(),
            ));
        }
        Ok(pair)
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.public == other.public && *self.private_key_bytes() == *other.private_key_bytes()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public_key_base64())
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Generate a random key pair
pub fn generate() -> Result<KeyPair> {
    let mut bytes = [0u8; X25519_LEN];
    secure_random(&mut bytes)?;
    Ok(KeyPair::from_private(bytes))
}

/// Derive a key pair from a passphrase.
///
/// The private key is `SHA-256(passphrase)`, so the same passphrase always
/// yields the same pair and two parties can regenerate a shared identity.
/// There is no salt and no work factor: the passphrase is the key.
pub fn derive_from_passphrase(passphrase: &str) -> Result<KeyPair> {
    let chars = passphrase.chars().count();
    if chars < MIN_KEYPAIR_PASSPHRASE_CHARS {
        return Err(Error::InvalidInput(format!(
            "passphrase must be at least {MIN_KEYPAIR_PASSPHRASE_CHARS} characters (got {chars})"
        )));
    }

    let digest = Sha256::digest(passphrase.as_bytes());
    let mut bytes = [0u8; X25519_LEN];
    bytes.copy_from_slice(&digest);
    Ok(KeyPair::from_private(bytes))
}

/// Parse a recipient public key from base64 text
pub fn parse_public_key(text: &str) -> Result<PublicKey> {
    format::decode_array::<X25519_LEN>(text)
        .map(PublicKey::from)
        .ok_or_else(|| Error::MalformedKey("public key is not 32 bytes of base64".into()))
}
