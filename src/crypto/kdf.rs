use argon2::{Algorithm, Argon2, Params, Version};
use tracing::warn;
use zeroize::Zeroizing;

use super::{KEY_LEN, SALT_LEN, SymmetricKey, secure_random};
use crate::error::{Error, Result};

/// Fixed salt used when no per-message salt is available.
///
/// Every passphrase shared under this salt maps to the same key, so identical
/// passphrases across drops are linkable. Only [`crate::config::SaltMode::Legacy`]
/// routes through it.
pub const LEGACY_SALT: &[u8; SALT_LEN] = b"hushdrop.legacy!";

/// Argon2 requires at least 8 bytes of salt.
const MIN_SALT_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    mem_cost_kib: u32,
    time_cost: u32,
    parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            // 19 MiB, a few tens of milliseconds per derivation
            mem_cost_kib: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    pub fn new(mem_cost_kib: u32, time_cost: u32, parallelism: u32) -> Result<Self> {
        let params = Self {
            mem_cost_kib,
            time_cost,
            parallelism,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn mem_cost_kib(&self) -> u32 {
        self.mem_cost_kib
    }

    pub fn time_cost(&self) -> u32 {
        self.time_cost
    }

    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    pub fn validate(&self) -> Result<()> {
        if self.time_cost < 1 {
            return Err(Error::InvalidInput("argon2 time cost must be >= 1".into()));
        }
        if self.parallelism < 1 {
            return Err(Error::InvalidInput("argon2 parallelism must be >= 1".into()));
        }
        if self.mem_cost_kib < 8 * self.parallelism {
            return Err(Error::InvalidInput(
                "argon2 memory cost must be at least 8 * parallelism".into(),
            ));
        }
        Ok(())
    }
}

/// Generate a random per-message salt
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    secure_random(&mut salt)?;
    Ok(salt)
}

/// Derive a 32-byte key from a passphrase with Argon2id.
///
/// `salt = None` falls back to [`LEGACY_SALT`].
pub fn derive_key(passphrase: &str, salt: Option<&[u8]>, kdf: KdfParams) -> Result<SymmetricKey> {
    kdf.validate()?;

    let salt = match salt {
        Some(salt) => salt,
        None => {
            warn!("deriving passphrase key with the fixed legacy salt");
            LEGACY_SALT.as_slice()
        }
    };
    if salt.len() < MIN_SALT_LEN {
        return Err(Error::InvalidInput(format!(
            "salt must be at least {MIN_SALT_LEN} bytes"
        )));
    }

    let params = Params::new(
        kdf.mem_cost_kib,
        kdf.time_cost,
        kdf.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| Error::Kdf(format!("invalid argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, key.as_mut_slice())
        .map_err(|e| Error::Kdf(e.to_string()))?;

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams::new(1024, 1, 1).unwrap()
    }

    #[test]
    fn kdf_is_deterministic() {
        let salt = [42u8; 16];

        let k1 = derive_key("password", Some(salt.as_slice()), fast()).unwrap();
        let k2 = derive_key("password", Some(salt.as_slice()), fast()).unwrap();

        assert_eq!(*k1, *k2);
    }

    #[test]
    fn salt_changes_output() {
        let k1 = derive_key("password", Some([1u8; 16].as_slice()), fast()).unwrap();
        let k2 = derive_key("password", Some([2u8; 16].as_slice()), fast()).unwrap();

        assert_ne!(*k1, *k2);
    }

    #[test]
    fn missing_salt_uses_legacy_constant() {
        let implicit = derive_key("password", None, fast()).unwrap();
        let explicit = derive_key("password", Some(LEGACY_SALT.as_slice()), fast()).unwrap();

        assert_eq!(*implicit, *explicit);
    }

    #[test]
    fn kdf_params_affect_output() {
        let salt = [7u8; 16];

        let kdf1 = KdfParams::new(1024, 1, 1).unwrap();
        let kdf2 = KdfParams::new(2048, 1, 1).unwrap();

        let k1 = derive_key("pw", Some(salt.as_slice()), kdf1).unwrap();
        let k2 = derive_key("pw", Some(salt.as_slice()), kdf2).unwrap();

        assert_ne!(*k1, *k2);
    }

    #[test]
    fn short_salt_is_rejected() {
        assert!(matches!(
            derive_key("pw", Some([0u8; 4].as_slice()), fast()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn kdf_invalid_params_fail_gracefully() {
        assert!(KdfParams::new(0, 0, 0).is_err());
        assert!(KdfParams::new(8, 1, 2).is_err());
    }

    #[test]
    fn generated_salts_differ() {
        assert_ne!(generate_salt().unwrap(), generate_salt().unwrap());
    }
}
