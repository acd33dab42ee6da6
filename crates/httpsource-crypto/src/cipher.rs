use crate::error::CryptoError;
use crate::key::EncryptionKey;
use crate::mode::EncryptionMode;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Encrypts `plaintext`, producing `base64(IV(12) ‖ ciphertext ‖ tag(16))`
/// (spec §4.9, §6).
pub fn encrypt_field(plaintext: &str, mode: EncryptionMode, key: &EncryptionKey) -> Result<String, CryptoError> {
    let iv = derive_iv(plaintext, mode);
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::Cipher)?;
    let nonce = Nonce::from_slice(&iv);
    let ciphertext_and_tag = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext.as_bytes(),
                aad: &[],
            },
        )
        .map_err(|_| CryptoError::Cipher)?;

    let mut wire = Vec::with_capacity(IV_LEN + ciphertext_and_tag.len());
    wire.extend_from_slice(&iv);
    wire.extend_from_slice(&ciphertext_and_tag);
    Ok(STANDARD.encode(wire))
}

/// Decrypts a `base64(IV ‖ ciphertext ‖ tag)` value produced by
/// [`encrypt_field`]. Provided mainly for tests and for a recipient that
/// shares the same key; the runner itself never decrypts its own output.
pub fn decrypt_field(wire: &str, key: &EncryptionKey) -> Result<String, CryptoError> {
    let bytes = STANDARD.decode(wire)?;
    if bytes.len() < IV_LEN + TAG_LEN {
        return Err(CryptoError::Cipher);
    }
    let (iv, ciphertext_and_tag) = bytes.split_at(IV_LEN);
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::Cipher)?;
    let nonce = Nonce::from_slice(iv);
    let plaintext = cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext_and_tag,
                aad: &[],
            },
        )
        .map_err(|_| CryptoError::Cipher)?;
    String::from_utf8(plaintext).map_err(|_| CryptoError::Cipher)
}

fn derive_iv(plaintext: &str, mode: EncryptionMode) -> [u8; IV_LEN] {
    match mode {
        EncryptionMode::RandomAuthenticated => {
            let mut iv = [0u8; IV_LEN];
            rand::thread_rng().fill_bytes(&mut iv);
            iv
        }
        EncryptionMode::DeterministicAuthenticated => {
            let digest = Sha256::digest(plaintext.as_bytes());
            let mut iv = [0u8; IV_LEN];
            iv.copy_from_slice(&digest[..IV_LEN]);
            iv
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> EncryptionKey {
        EncryptionKey::generate()
    }

    #[test]
    fn round_trips() {
        let k = key();
        let wire = encrypt_field("hello", EncryptionMode::RandomAuthenticated, &k).unwrap();
        assert_eq!(decrypt_field(&wire, &k).unwrap(), "hello");
    }

    #[test]
    fn random_mode_varies_output_for_same_input() {
        let k = key();
        let a = encrypt_field("same", EncryptionMode::RandomAuthenticated, &k).unwrap();
        let b = encrypt_field("same", EncryptionMode::RandomAuthenticated, &k).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn deterministic_mode_is_stable_for_same_input() {
        let k = key();
        let a = encrypt_field("same", EncryptionMode::DeterministicAuthenticated, &k).unwrap();
        let b = encrypt_field("same", EncryptionMode::DeterministicAuthenticated, &k).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn deterministic_mode_varies_with_input() {
        let k = key();
        let a = encrypt_field("one", EncryptionMode::DeterministicAuthenticated, &k).unwrap();
        let b = encrypt_field("two", EncryptionMode::DeterministicAuthenticated, &k).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn decrypt_rejects_truncated_input() {
        let k = key();
        assert!(decrypt_field("AAAA", &k).is_err());
    }
}
