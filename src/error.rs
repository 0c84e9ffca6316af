use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the core operations.
///
/// `DecryptionFailed` and `NotFound` deliberately carry no detail: callers
/// cannot tell a wrong key from a corrupted ciphertext, nor an expired message
/// from one that was already read or never existed.
#[derive(Debug)]
pub enum Error {
    InvalidInput(String),
    MalformedKey(String),
    MalformedArtifact(String),
    EncryptionFailed,
    DecryptionFailed,
    NotFound,
    Random,
    Kdf(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::MalformedKey(msg) => write!(f, "malformed key: {msg}"),
            Error::MalformedArtifact(msg) => write!(f, "malformed encrypted message: {msg}"),
            Error::EncryptionFailed => write!(f, "encryption failed"),
            Error::DecryptionFailed => write!(f, "decryption failed: wrong key or corrupted data"),
            Error::NotFound => write!(f, "message not found or expired"),
            Error::Random => write!(f, "OS random generator unavailable"),
            Error::Kdf(msg) => write!(f, "key derivation failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
