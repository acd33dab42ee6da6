//! Property tests for field encryption (§8).
//!
//! `decrypt(encrypt(x, K, RANDOM_AUTHENTICATED)) = x`; for
//! DETERMINISTIC_AUTHENTICATED, `encrypt(x, K)` is stable across invocations;
//! ciphertext length is at least `12 + len(x) + 16` bytes before base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use httpsource_crypto::{decrypt_field, encrypt_field, EncryptionKey, EncryptionMode};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn random_authenticated_round_trips(plaintext in "[ -~]{0,64}") {
        let key = EncryptionKey::generate();
        let wire = encrypt_field(&plaintext, EncryptionMode::RandomAuthenticated, &key).unwrap();
        prop_assert_eq!(decrypt_field(&wire, &key).unwrap(), plaintext.clone());

        let raw = STANDARD.decode(&wire).unwrap();
        prop_assert!(raw.len() >= 12 + plaintext.len() + 16);
    }

    #[test]
    fn deterministic_authenticated_round_trips_and_is_stable(plaintext in "[ -~]{0,64}") {
        let key = EncryptionKey::generate();
        let a = encrypt_field(&plaintext, EncryptionMode::DeterministicAuthenticated, &key).unwrap();
        let b = encrypt_field(&plaintext, EncryptionMode::DeterministicAuthenticated, &key).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(decrypt_field(&a, &key).unwrap(), plaintext);
    }
}
