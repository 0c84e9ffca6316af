//! Anonymous public-key encryption ("sealed box").
//!
//! Each message gets a fresh ephemeral X25519 key. The shared secret between
//! the ephemeral key and the recipient is expanded with HKDF-SHA256, salted by
//! both public keys, into a ChaCha20-Poly1305 key and nonce. Since the key is
//! single-use the nonce is derived rather than random.
//!
//! Only the recipient can open an artifact, but anyone holding the recipient's
//! public key can produce one: the scheme gives confidentiality, not sender
//! authenticity.

use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit},
};
use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::StaticSecret;
use zeroize::Zeroizing;

use super::aead::into_utf8;
use super::keys::{KeyPair, PublicKey};
use super::{KEY_LEN, NONCE_LEN, X25519_LEN, secure_random};
use crate::error::{Error, Result};
use crate::format::{self, ArtifactFile, CURRENT_VERSION, v1};

const SEAL_INFO: &[u8] = b"hushdrop sealed v1";

/// A self-contained encrypted message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedArtifact {
    version: u32,
    ciphertext: Vec<u8>,
}

impl SealedArtifact {
    pub fn new(version: u32, ciphertext: Vec<u8>) -> Self {
        Self {
            version,
            ciphertext,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Serializes to the artifact JSON file format.
    pub fn to_json(&self) -> Result<String> {
        let file = ArtifactFile {
            version: self.version,
            encrypted_message: format::encode(&self.ciphertext),
        };
        serde_json::to_string_pretty(&file)
            .map_err(|e| Error::MalformedArtifact(format!("cannot encode artifact: {e}")))
    }

    /// Parses an artifact JSON file.
    ///
    /// The version is not checked here; an unknown version fails in [`decrypt`].
    pub fn from_json(text: &str) -> Result<Self> {
        let file: ArtifactFile = serde_json::from_str(text).map_err(|_| {
            Error::MalformedArtifact("expected version and encrypted_message fields".into())
        })?;
        let ciphertext = format::decode(&file.encrypted_message)
            .ok_or_else(|| Error::MalformedArtifact("encrypted_message is not base64".into()))?;
        Ok(Self::new(file.version, ciphertext))
    }
}

/// Encrypt a message to a recipient's public key
pub fn encrypt(recipient: &PublicKey, plaintext: &str) -> Result<SealedArtifact> {
    let mut bytes = [0u8; X25519_LEN];
    secure_random(&mut bytes)?;
    let ephemeral = StaticSecret::from(bytes);
    let ephemeral_public = PublicKey::from(&ephemeral);

    let shared = ephemeral.diffie_hellman(recipient);
    if !shared.was_contributory() {
        return Err(Error::MalformedKey("recipient public key is a low-order point".into()));
    }

    let (key, nonce) = derive_cipher(shared.as_bytes(), ephemeral_public.as_bytes(), recipient)?;
    let body = ChaCha20Poly1305::new(Key::from_slice(key.as_slice()))
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| Error::EncryptionFailed)?;

    Ok(SealedArtifact::new(
        CURRENT_VERSION,
        v1::join(ephemeral_public.as_bytes(), &body),
    ))
}

/// Decrypt an artifact with the recipient's key pair
pub fn decrypt(recipient: &KeyPair, artifact: &SealedArtifact) -> Result<Zeroizing<String>> {
    if artifact.version != v1::VERSION_V1 {
        return Err(Error::DecryptionFailed);
    }
    let (ephemeral, body) = v1::split(&artifact.ciphertext).ok_or(Error::DecryptionFailed)?;

    let shared = recipient
        .secret()
        .diffie_hellman(&PublicKey::from(ephemeral));
    if !shared.was_contributory() {
        return Err(Error::DecryptionFailed);
    }

    let (key, nonce) = derive_cipher(shared.as_bytes(), &ephemeral, recipient.public_key())?;
    let plaintext = ChaCha20Poly1305::new(Key::from_slice(key.as_slice()))
        .decrypt(Nonce::from_slice(&nonce), body)
        .map_err(|_| Error::DecryptionFailed)?;

    into_utf8(plaintext)
}

fn derive_cipher(
    shared: &[u8; X25519_LEN],
    ephemeral_public: &[u8; X25519_LEN],
    recipient: &PublicKey,
) -> Result<(Zeroizing<[u8; KEY_LEN]>, [u8; NONCE_LEN])> {
    let mut salt = [0u8; 2 * X25519_LEN];
    salt[..X25519_LEN].copy_from_slice(ephemeral_public);
    salt[X25519_LEN..].copy_from_slice(recipient.as_bytes());

    let mut okm = Zeroizing::new([0u8; KEY_LEN + NONCE_LEN]);
    Hkdf::<Sha256>::new(Some(salt.as_slice()), shared)
        .expand(SEAL_INFO, okm.as_mut_slice())
        .map_err(|e| Error::Kdf(e.to_string()))?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&okm[..KEY_LEN]);
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&okm[KEY_LEN..]);
    Ok((key, nonce))
}
