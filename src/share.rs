//! Secrets and links handed to the receiver of a stored drop.
//!
//! The identifier and the secret travel separately. The secret is either a
//! random "code" (the raw 256-bit key as hex) or a passphrase that is stretched
//! with Argon2 on both ends.

use std::fmt;

use zeroize::Zeroizing;

use crate::crypto::{self, KEY_LEN, KdfParams, SymmetricKey};
use crate::error::{Error, Result};
use crate::store::MessageId;

/// Minimum passphrase length for stored drops, in characters.
pub const MIN_SHARE_PASSPHRASE_CHARS: usize = 10;

/// Length of a share code in hex characters.
pub const CODE_HEX_LEN: usize = 2 * KEY_LEN;

/// Query parameter that carries the message id in share links.
pub const LINK_PARAM: &str = "msgid";

pub enum ShareSecret {
    Code(SymmetricKey),
    Passphrase(Zeroizing<String>),
}

impl ShareSecret {
    /// Draws a fresh random code.
    pub fn generate_code() -> Result<Self> {
        crypto::generate_key().map(Self::Code)
    }

    pub fn passphrase(text: &str) -> Result<Self> {
        let chars = text.chars().count();
        if chars < MIN_SHARE_PASSPHRASE_CHARS {
            return Err(Error::InvalidInput(format!(
                "passphrase must be at least {MIN_SHARE_PASSPHRASE_CHARS} characters (got {chars})"
            )));
        }
        Ok(Self::Passphrase(Zeroizing::new(text.to_owned())))
    }

    /// Interprets user input: 64 hex characters are a code, anything else a passphrase.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.len() == CODE_HEX_LEN && trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
            let mut key = Zeroizing::new([0u8; KEY_LEN]);
            hex::decode_to_slice(trimmed, key.as_mut_slice())
                .map_err(|_| Error::InvalidInput("share code is not valid hex".into()))?;
            return Ok(Self::Code(key));
        }
        Self::passphrase(text)
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Self::Code(_))
    }

    /// The text the receiver needs: hex for codes, the passphrase itself otherwise.
    pub fn reveal(&self) -> Zeroizing<String> {
        match self {
            Self::Code(key) => Zeroizing::new(hex::encode(key.as_slice())),
            Self::Passphrase(text) => text.clone(),
        }
    }

    /// Resolves the symmetric key. Codes ignore `salt` and `kdf`.
    pub fn derive_key(&self, salt: Option<&[u8]>, kdf: KdfParams) -> Result<SymmetricKey> {
        match self {
            Self::Code(key) => Ok(key.clone()),
            Self::Passphrase(text) => crypto::derive_key(text, salt, kdf),
        }
    }
}

impl fmt::Debug for ShareSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(_) => f.write_str("ShareSecret::Code(<redacted>)"),
            Self::Passphrase(_) => f.write_str("ShareSecret::Passphrase(<redacted>)"),
        }
    }
}

/// Appends `msgid=<id>` to a base URL.
pub fn share_link(base: &str, id: &MessageId) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{LINK_PARAM}={id}")
}

/// Extracts a message id from a share link or a bare id.
pub fn message_id_from_link(text: &str) -> Result<MessageId> {
    let text = text.trim();
    let Some((_, query)) = text.split_once('?') else {
        return text.parse();
    };

    let query = query.split('#').next().unwrap_or_default();
    query
        .split('&')
        .find_map(|pair| match pair.split_once('=') {
            Some((LINK_PARAM, value)) => Some(value),
            _ => None,
        })
        .ok_or_else(|| Error::InvalidInput(format!("link has no {LINK_PARAM} parameter")))?
        .parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams::new(1024, 1, 1).unwrap()
    }

    #[test]
    fn generated_code_reveals_as_hex() {
        let secret = ShareSecret::generate_code().unwrap();
        let text = secret.reveal();

        assert!(secret.is_code());
        assert_eq!(text.len(), CODE_HEX_LEN);
        assert!(text.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn code_parses_back_to_same_key() {
        let secret = ShareSecret::generate_code().unwrap();
        let parsed = ShareSecret::parse(&secret.reveal()).unwrap();

        assert!(parsed.is_code());
        assert_eq!(
            *secret.derive_key(None, fast()).unwrap(),
            *parsed.derive_key(None, fast()).unwrap()
        );
    }

    #[test]
    fn other_text_is_a_passphrase() {
        let parsed = ShareSecret::parse("open sesame please").unwrap();
        assert!(!parsed.is_code());
        assert_eq!(parsed.reveal().as_str(), "open sesame please");
    }

    #[test]
    fn short_passphrase_fails() {
        match ShareSecret::parse("too short") {
            Err(Error::InvalidInput(msg)) => assert!(msg.contains("at least 10")),
            other => panic!("expected InvalidInput, got: {other:?}"),
        }
        assert!(ShareSecret::passphrase("ten chars!").is_ok());
    }

    #[test]
    fn passphrase_key_depends_on_salt() {
        let secret = ShareSecret::passphrase("open sesame please").unwrap();
        let a = secret.derive_key(Some([1u8; 16].as_slice()), fast()).unwrap();
        let b = secret.derive_key(Some([2u8; 16].as_slice()), fast()).unwrap();

        assert_ne!(*a, *b);
    }

    #[test]
    fn debug_redacts() {
        let secret = ShareSecret::passphrase("open sesame please").unwrap();
        assert!(!format!("{secret:?}").contains("sesame"));
    }

    #[test]
    fn link_roundtrip() {
        let id: MessageId = "00112233445566778899aabbccddeeff".parse().unwrap();

        let link = share_link("https://drop.example/read", &id);
        assert_eq!(
            link,
            "https://drop.example/read?msgid=00112233445566778899aabbccddeeff"
        );
        assert_eq!(message_id_from_link(&link).unwrap(), id);
    }

    #[test]
    fn link_with_existing_query() {
        let id: MessageId = "abcd".parse().unwrap();
        let link = share_link("https://drop.example/?lang=en", &id);

        assert_eq!(link, "https://drop.example/?lang=en&msgid=abcd");
        assert_eq!(message_id_from_link(&link).unwrap(), id);
    }

    #[test]
    fn bare_id_is_accepted() {
        let id = message_id_from_link(" abcd1234 ").unwrap();
        assert_eq!(id.as_str(), "abcd1234");
    }

    #[test]
    fn link_without_param_fails() {
        assert!(message_id_from_link("https://drop.example/?lang=en").is_err());
    }

    #[test]
    fn link_fragment_is_ignored() {
        let id = message_id_from_link("https://drop.example/?msgid=beef#top").unwrap();
        assert_eq!(id.as_str(), "beef");
    }
}
