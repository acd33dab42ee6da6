use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption key must decode to exactly 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("key material is not valid base64: {0}")]
    InvalidKeyEncoding(#[from] base64::DecodeError),

    #[error("malformed encryption rule {0:?}: expected \"path:MODE\"")]
    MalformedRule(String),

    #[error("unknown encryption mode {0:?}")]
    UnknownMode(String),

    #[error("rules {0:?} and {1:?} target overlapping paths")]
    OverlappingRules(String, String),

    #[error("AEAD operation failed")]
    Cipher,
}
