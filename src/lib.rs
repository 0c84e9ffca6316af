//! One-shot encrypted message exchange.
//!
//! Two schemes:
//!
//! - **Sealed**: encrypt to a recipient's X25519 public key and hand them the
//!   resulting [`SealedArtifact`] by any channel. See [`crypto::sealed`].
//! - **Drop**: encrypt under a random code or a passphrase and park the
//!   ciphertext in an [`EphemeralStore`] until it expires or is read once.
//!   See [`Hushdrop`].

pub mod config;
pub mod crypto;
mod error;
mod format;
pub mod share;
pub mod storage;
pub mod store;

pub use crate::config::{Config, SaltMode};
pub use crate::crypto::{KdfParams, KeyPair, PublicKey, SealedArtifact};
pub use crate::error::{Error, Result};
pub use crate::share::ShareSecret;
pub use crate::storage::Storage;
pub use crate::store::{Clock, EphemeralStore, MessageId, StoredMessage, SystemClock};

use tracing::debug;
use zeroize::Zeroizing;

/// Longest message accepted, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Rejects empty messages and messages over [`MAX_MESSAGE_CHARS`].
pub fn validate_message(message: &str) -> Result<()> {
    if message.trim().is_empty() {
        return Err(Error::InvalidInput("message is empty".into()));
    }
    let chars = message.chars().count();
    if chars > MAX_MESSAGE_CHARS {
        return Err(Error::InvalidInput(format!(
            "message is {chars} characters, the limit is {MAX_MESSAGE_CHARS}"
        )));
    }
    Ok(())
}

/// Self-destructing drops backed by an [`EphemeralStore`].
///
/// Holds no key material between calls; every operation takes the
/// [`ShareSecret`] it needs. Share it across threads behind an `Arc`.
pub struct Hushdrop<C: Clock = SystemClock> {
    store: EphemeralStore<C>,
    config: Config,
}

impl Hushdrop<SystemClock> {
    pub fn new(config: Config) -> Self {
        Self::with_store(EphemeralStore::new(), config)
    }
}

impl<C: Clock> Hushdrop<C> {
    pub fn with_store(store: EphemeralStore<C>, config: Config) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &EphemeralStore<C> {
        &self.store
    }

    /// Encrypts `message` and stores it until it is read or the ttl passes.
    pub fn send(&self, message: &str, secret: &ShareSecret) -> Result<MessageId> {
        self.store.purge_expired();
        validate_message(message)?;

        let salt = match (secret, self.config.salt_mode()) {
            (ShareSecret::Passphrase(_), SaltMode::PerMessage) => Some(crypto::generate_salt()?),
            _ => None,
        };
        let key = secret.derive_key(salt.as_ref().map(|s| s.as_slice()), self.config.kdf())?;
        let sealed = crypto::encrypt(message, &key)?;

        let expire_at = self
            .store
            .now()
            .checked_add_signed(self.config.ttl())
            .ok_or_else(|| Error::InvalidInput("ttl overflows the clock".into()))?;

        match salt {
            Some(salt) => self
                .store
                .put_with_salt(sealed.nonce, sealed.data, salt, expire_at),
            None => self.store.put(sealed.nonce, sealed.data, expire_at),
        }
    }

    /// Decrypts and destroys a drop.
    ///
    /// A wrong secret leaves the drop in place so the receiver can retry. Once
    /// decryption succeeds the drop is consumed; if another caller consumed it
    /// in the meantime the plaintext is discarded and `NotFound` returned.
    pub fn receive(&self, id: &MessageId, secret: &ShareSecret) -> Result<Zeroizing<String>> {
        self.store.purge_expired();

        let message = self.store.get_if_valid(id)?;
        let salt = message.salt().map(|s| s.as_slice());
        let key = secret.derive_key(salt, self.config.kdf())?;
        let plaintext = crypto::decrypt(message.nonce(), message.ciphertext(), &key)?;

        self.store.take_if_valid(id)?;
        debug!("drop opened");
        Ok(plaintext)
    }

    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired()
    }

    /// Number of drops waiting to be read.
    pub fn pending(&self) -> usize {
        self.store.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn fast_config(salt_mode: SaltMode) -> Config {
        Config::new(
            TimeDelta::seconds(900),
            KdfParams::new(1024, 1, 1).unwrap(),
            salt_mode,
        )
        .unwrap()
    }

    #[test]
    fn code_drop_roundtrip() {
        let hub = Hushdrop::new(fast_config(SaltMode::PerMessage));
        let secret = ShareSecret::generate_code().unwrap();

        let id = hub.send("hello", &secret).unwrap();
        let received = ShareSecret::parse(&secret.reveal()).unwrap();

        assert_eq!(hub.receive(&id, &received).unwrap().as_str(), "hello");
        assert_eq!(hub.pending(), 0);
    }

    #[test]
    fn passphrase_drop_stores_random_salt() {
        let hub = Hushdrop::new(fast_config(SaltMode::PerMessage));
        let secret = ShareSecret::passphrase("open sesame please").unwrap();

        let a = hub.send("one", &secret).unwrap();
        let b = hub.send("two", &secret).unwrap();

        let salt_a = *hub.store().get_if_valid(&a).unwrap().salt().unwrap();
        let salt_b = *hub.store().get_if_valid(&b).unwrap().salt().unwrap();
        assert_ne!(salt_a, salt_b);

        assert_eq!(hub.receive(&a, &secret).unwrap().as_str(), "one");
        assert_eq!(hub.receive(&b, &secret).unwrap().as_str(), "two");
    }

    #[test]
    fn legacy_salt_mode_stores_no_salt() {
        let hub = Hushdrop::new(fast_config(SaltMode::Legacy));
        let secret = ShareSecret::passphrase("open sesame please").unwrap();

        let id = hub.send("legacy", &secret).unwrap();
        assert!(hub.store().get_if_valid(&id).unwrap().salt().is_none());
        assert_eq!(hub.receive(&id, &secret).unwrap().as_str(), "legacy");
    }

    #[test]
    fn code_drop_stores_no_salt() {
        let hub = Hushdrop::new(fast_config(SaltMode::PerMessage));
        let secret = ShareSecret::generate_code().unwrap();

        let id = hub.send("coded", &secret).unwrap();
        assert!(hub.store().get_if_valid(&id).unwrap().salt().is_none());
    }

    #[test]
    fn wrong_secret_keeps_drop_for_retry() {
        let hub = Hushdrop::new(fast_config(SaltMode::PerMessage));
        let secret = ShareSecret::passphrase("open sesame please").unwrap();
        let wrong = ShareSecret::passphrase("close sesame please").unwrap();

        let id = hub.send("retry me", &secret).unwrap();

        assert!(matches!(
            hub.receive(&id, &wrong),
            Err(Error::DecryptionFailed)
        ));
        assert_eq!(hub.pending(), 1);
        assert_eq!(hub.receive(&id, &secret).unwrap().as_str(), "retry me");
    }

    #[test]
    fn second_receive_is_not_found() {
        let hub = Hushdrop::new(fast_config(SaltMode::PerMessage));
        let secret = ShareSecret::generate_code().unwrap();
        let id = hub.send("once", &secret).unwrap();

        hub.receive(&id, &secret).unwrap();
        assert!(matches!(
            hub.receive(&id, &secret),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn send_validates_message() {
        let hub = Hushdrop::new(fast_config(SaltMode::PerMessage));
        let secret = ShareSecret::generate_code().unwrap();

        assert!(matches!(
            hub.send("   ", &secret),
            Err(Error::InvalidInput(_))
        ));
        let long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(matches!(
            hub.send(&long, &secret),
            Err(Error::InvalidInput(_))
        ));
        assert!(hub.send(&"x".repeat(MAX_MESSAGE_CHARS), &secret).is_ok());
    }

    #[test]
    fn validate_message_counts_characters() {
        let wide = "é".repeat(MAX_MESSAGE_CHARS);
        assert!(validate_message(&wide).is_ok());
    }
}
