use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit},
};
use zeroize::Zeroizing;

use super::{KEY_LEN, NONCE_LEN, secure_random};
use crate::error::{Error, Result};

/// 256-bit symmetric key, zeroed on drop.
pub type SymmetricKey = Zeroizing<[u8; KEY_LEN]>;

/// Output of [`encrypt`]: the nonce and the ciphertext with the tag appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext {
    pub nonce: [u8; NONCE_LEN],
    pub data: Vec<u8>,
}

/// Generate a uniformly random key
pub fn generate_key() -> Result<SymmetricKey> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    secure_random(key.as_mut_slice())?;
    Ok(key)
}

/// Encrypt plaintext under a fresh random nonce
pub fn encrypt(plaintext: &str, key: &[u8; KEY_LEN]) -> Result<Ciphertext> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));

    let mut nonce = [0u8; NONCE_LEN];
    secure_random(&mut nonce)?;

    let data = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| Error::EncryptionFailed)?;

    Ok(Ciphertext { nonce, data })
}

/// Decrypt ciphertext
pub fn decrypt(
    nonce: &[u8; NONCE_LEN],
    data: &[u8],
    key: &[u8; KEY_LEN],
) -> Result<Zeroizing<String>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), data)
        .map_err(|_| Error::DecryptionFailed)?;

    into_utf8(plaintext)
}

/// Converts decrypted bytes to a string without leaving a copy behind.
pub(crate) fn into_utf8(bytes: Vec<u8>) -> Result<Zeroizing<String>> {
    match String::from_utf8(bytes) {
        Ok(text) => Ok(Zeroizing::new(text)),
        Err(err) => {
            drop(Zeroizing::new(err.into_bytes()));
            Err(Error::DecryptionFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::TAG_LEN;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = generate_key().unwrap();
        let ct = encrypt("secret data", &key).unwrap();

        assert_eq!(ct.data.len(), "secret data".len() + TAG_LEN);

        let pt = decrypt(&ct.nonce, &ct.data, &key).unwrap();
        assert_eq!(pt.as_str(), "secret data");
    }

    #[test]
    fn same_plaintext_encrypts_differently() {
        let key = generate_key().unwrap();
        let a = encrypt("hello", &key).unwrap();
        let b = encrypt("hello", &key).unwrap();

        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn wrong_key_fails() {
        let key = generate_key().unwrap();
        let other = generate_key().unwrap();
        let ct = encrypt("hello", &key).unwrap();

        assert!(matches!(
            decrypt(&ct.nonce, &ct.data, &other),
            Err(Error::DecryptionFailed)
        ));
    }

    #[test]
    fn flipped_tag_bit_fails() {
        let key = generate_key().unwrap();
        let mut ct = encrypt("hello", &key).unwrap();
        let last = ct.data.len() - 1;
        ct.data[last] ^= 0x01;

        assert!(matches!(
            decrypt(&ct.nonce, &ct.data, &key),
            Err(Error::DecryptionFailed)
        ));
    }

    #[test]
    fn wrong_nonce_fails() {
        let key = generate_key().unwrap();
        let ct = encrypt("hello", &key).unwrap();
        let mut nonce = ct.nonce;
        nonce[0] ^= 0xff;

        assert!(decrypt(&nonce, &ct.data, &key).is_err());
    }

    #[test]
    fn non_utf8_plaintext_is_opaque_failure() {
        let key = generate_key().unwrap();
        let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_slice()));
        let nonce = [9u8; NONCE_LEN];
        let data = cipher
            .encrypt(Nonce::from_slice(&nonce), [0xffu8, 0xfe].as_slice())
            .unwrap();

        assert!(matches!(
            decrypt(&nonce, &data, &key),
            Err(Error::DecryptionFailed)
        ));
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let key = generate_key().unwrap();
        let ct = encrypt("", &key).unwrap();
        assert_eq!(decrypt(&ct.nonce, &ct.data, &key).unwrap().as_str(), "");
    }
}
