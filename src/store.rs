//! In-memory store for symmetric drops.
//!
//! Every record is `Active` until it is either consumed by a single successful
//! [`EphemeralStore::take_if_valid`] or expires. Both transitions remove the
//! record, so callers only ever see "present" or [`Error::NotFound`].
//!
//! All operations go through one mutex owned by the store, which makes
//! check-then-remove atomic: concurrent takers of the same id get exactly one
//! winner.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::crypto::{NONCE_LEN, SALT_LEN, secure_random};
use crate::error::{Error, Result};

/// Random bytes per message id (128 bits).
pub const ID_LEN: usize = 16;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Opaque, unguessable handle for a stored drop (lowercase hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    fn generate() -> Result<Self> {
        let mut bytes = [0u8; ID_LEN];
        secure_random(&mut bytes)?;
        Ok(Self(hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix safe to put in logs.
    fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MessageId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidInput("message id must be hex".into()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

/// An encrypted drop held by the store. Never mutated after `put`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    id: MessageId,
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
    salt: Option<[u8; SALT_LEN]>,
    expire_at: DateTime<Utc>,
}

impl StoredMessage {
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Ciphertext with the authentication tag appended.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Per-message passphrase salt, if one was stored.
    pub fn salt(&self) -> Option<&[u8; SALT_LEN]> {
        self.salt.as_ref()
    }

    pub fn expire_at(&self) -> DateTime<Utc> {
        self.expire_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expire_at
    }
}

pub struct EphemeralStore<C: Clock = SystemClock> {
    messages: Mutex<HashMap<MessageId, StoredMessage>>,
    clock: C,
}

impl EphemeralStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for EphemeralStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> EphemeralStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            messages: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // A panicking holder cannot leave the map half-updated: every critical
    // section is a single insert, remove, or retain.
    fn lock(&self) -> MutexGuard<'_, HashMap<MessageId, StoredMessage>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a drop and returns its fresh id.
    pub fn put(
        &self,
        nonce: [u8; NONCE_LEN],
        ciphertext: Vec<u8>,
        expire_at: DateTime<Utc>,
    ) -> Result<MessageId> {
        self.insert(nonce, ciphertext, None, expire_at)
    }

    /// Stores a passphrase-protected drop together with its salt.
    pub fn put_with_salt(
        &self,
        nonce: [u8; NONCE_LEN],
        ciphertext: Vec<u8>,
        salt: [u8; SALT_LEN],
        expire_at: DateTime<Utc>,
    ) -> Result<MessageId> {
        self.insert(nonce, ciphertext, Some(salt), expire_at)
    }

    fn insert(
        &self,
        nonce: [u8; NONCE_LEN],
        ciphertext: Vec<u8>,
        salt: Option<[u8; SALT_LEN]>,
        expire_at: DateTime<Utc>,
    ) -> Result<MessageId> {
        let mut messages = self.lock();
        let id = loop {
            let id = MessageId::generate()?;
            if !messages.contains_key(&id) {
                break id;
            }
        };

        debug!(id = id.short(), %expire_at, "stored message");
        messages.insert(
            id.clone(),
            StoredMessage {
                id: id.clone(),
                nonce,
                ciphertext,
                salt,
                expire_at,
            },
        );
        Ok(id)
    }

    /// Removes and returns the record if it is still valid.
    ///
    /// Exactly one caller can win for a given id. Expired records are removed
    /// and reported the same way as missing ones.
    pub fn take_if_valid(&self, id: &MessageId) -> Result<StoredMessage> {
        let now = self.clock.now();
        let taken = self.lock().remove(id);

        match taken {
            Some(message) if !message.is_expired_at(now) => {
                debug!(id = id.short(), "message consumed");
                Ok(message)
            }
            Some(_) => {
                debug!(id = id.short(), "message expired on read");
                Err(Error::NotFound)
            }
            None => Err(Error::NotFound),
        }
    }

    /// Returns a copy of the record without consuming it.
    ///
    /// Lets a receiver try a secret before committing to
    /// [`take_if_valid`](Self::take_if_valid). Expired records are evicted.
    pub fn get_if_valid(&self, id: &MessageId) -> Result<StoredMessage> {
        let now = self.clock.now();
        let mut messages = self.lock();

        let expired = match messages.get(id) {
            Some(message) => message.is_expired_at(now),
            None => return Err(Error::NotFound),
        };
        if expired {
            messages.remove(id);
            debug!(id = id.short(), "message expired on read");
            return Err(Error::NotFound);
        }
        messages.get(id).cloned().ok_or(Error::NotFound)
    }

    /// Evicts every expired record and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut messages = self.lock();

        let before = messages.len();
        messages.retain(|_, message| !message.is_expired_at(now));
        let purged = before - messages.len();

        if purged > 0 {
            debug!(purged, "purged expired messages");
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
