use chrono::TimeDelta;

use crate::crypto::KdfParams;
use crate::error::{Error, Result};

/// Default lifetime of a stored drop, in seconds.
pub const DEFAULT_TTL_SECS: i64 = 15 * 60;

/// How passphrase-protected drops are salted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaltMode {
    /// A random salt per drop, stored next to the ciphertext.
    #[default]
    PerMessage,
    /// The fixed [`crate::crypto::LEGACY_SALT`], for receivers that only know the passphrase.
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    ttl: TimeDelta,
    kdf: KdfParams,
    salt_mode: SaltMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ttl: TimeDelta::seconds(DEFAULT_TTL_SECS),
            kdf: KdfParams::default(),
            salt_mode: SaltMode::default(),
        }
    }
}

impl Config {
    pub fn new(ttl: TimeDelta, kdf: KdfParams, salt_mode: SaltMode) -> Result<Self> {
        if ttl <= TimeDelta::zero() {
            return Err(Error::InvalidInput("ttl must be positive".into()));
        }
        kdf.validate()?;
        Ok(Self {
            ttl,
            kdf,
            salt_mode,
        })
    }

    /// Builds a config with a ttl given in whole seconds.
    pub fn with_ttl_secs(secs: i64) -> Result<Self> {
        let ttl = TimeDelta::try_seconds(secs)
            .ok_or_else(|| Error::InvalidInput(format!("ttl out of range: {secs}s")))?;
        Self::new(ttl, KdfParams::default(), SaltMode::default())
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    pub fn kdf(&self) -> KdfParams {
        self.kdf
    }

    pub fn salt_mode(&self) -> SaltMode {
        self.salt_mode
    }
}
