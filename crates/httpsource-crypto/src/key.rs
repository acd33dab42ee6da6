use crate::error::CryptoError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;

/// 256-bit AES-GCM key material.
#[derive(Clone)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD.decode(encoded)?;
        let len = bytes.len();
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength(len))?;
        Ok(Self(array))
    }

    /// Generates a fresh key from a cryptographically strong source. Callers
    /// are responsible for logging it once (spec §4.9: "a newly generated key
    /// logged once at start") since this type never prints its own bytes.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey").field("bytes", &"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_base64() {
        let key = EncryptionKey::generate();
        let encoded = key.to_base64();
        let decoded = EncryptionKey::from_base64(&encoded).unwrap();
        assert_eq!(key.as_bytes(), decoded.as_bytes());
    }

    #[test]
    fn rejects_wrong_length() {
        let short = STANDARD.encode([0u8; 16]);
        assert!(matches!(
            EncryptionKey::from_base64(&short),
            Err(CryptoError::InvalidKeyLength(16))
        ));
    }

    #[test]
    fn debug_does_not_leak_bytes() {
        let key = EncryptionKey::generate();
        assert!(!format!("{key:?}").contains(&key.to_base64()));
    }
}
