//! Exchange formats.
//!
//! Two JSON documents leave the process: the key-pair file and the sealed
//! artifact file. Binary values inside them are standard base64. The layout of
//! the sealed ciphertext itself is versioned; see [`v1`].

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

pub mod v1;

/// Latest sealed artifact version
pub const CURRENT_VERSION: u32 = v1::VERSION_V1;

/// On-disk shape of a key-pair file.
#[derive(Serialize, Deserialize)]
pub(crate) struct KeyPairFile {
    pub public_key: String,
    pub private_key: String,
}

impl Drop for KeyPairFile {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

/// On-disk shape of a sealed artifact file.
#[derive(Serialize, Deserialize)]
pub(crate) struct ArtifactFile {
    pub version: u32,
    pub encrypted_message: String,
}

pub(crate) fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub(crate) fn decode(text: &str) -> Option<Vec<u8>> {
    STANDARD.decode(text.trim()).ok()
}

/// Decodes base64 that must hold exactly `N` bytes.
pub(crate) fn decode_array<const N: usize>(text: &str) -> Option<[u8; N]> {
    let mut bytes = decode(text)?;
    let array = <[u8; N]>::try_from(bytes.as_slice()).ok();
    bytes.zeroize();
    array
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_array_checks_length() {
        let text = encode(&[7u8; 32]);
        assert_eq!(decode_array::<32>(&text), Some([7u8; 32]));
        assert_eq!(decode_array::<16>(&text), None);
    }

    #[test]
    fn decode_tolerates_surrounding_whitespace() {
        let text = format!("  {}\n", encode(b"abc"));
        assert_eq!(decode(&text).unwrap(), b"abc");
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode("not base64!!").is_none());
    }

    #[test]
    fn artifact_file_shape() {
        let file = ArtifactFile {
            version: CURRENT_VERSION,
            encrypted_message: encode(b"xyz"),
        };
        let value: serde_json::Value = serde_json::to_value(&file).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["encrypted_message"], "eHl6");
    }
}
