//! Field-level authenticated encryption for outgoing records (spec §4.9).

mod cipher;
mod error;
mod key;
mod mode;
mod rule;

pub use cipher::{decrypt_field, encrypt_field};
pub use error::CryptoError;
pub use key::EncryptionKey;
pub use mode::EncryptionMode;
pub use rule::{parse_rules, EncryptionRule};

use httpsource_core::{EndpointId, Value};
#[cfg(feature = "tracing")]
use tracing::warn;

/// Applies a parsed rule table to outgoing records.
pub struct FieldEncryptor {
    key: EncryptionKey,
    rules: Vec<EncryptionRule>,
}

impl FieldEncryptor {
    pub fn new(key: EncryptionKey, rules: Vec<EncryptionRule>) -> Self {
        Self { key, rules }
    }

    pub fn from_config(key_base64: &str, rules_spec: &str) -> Result<Self, CryptoError> {
        let key = EncryptionKey::from_base64(key_base64)?;
        let rules = parse_rules(rules_spec)?;
        Ok(Self::new(key, rules))
    }

    /// Deep-copies `record` and encrypts every field matched by a rule
    /// scoped to `endpoint` (or unscoped). A missing field is a no-op; a
    /// present non-scalar field is left untouched.
    pub fn encrypt_record(&self, endpoint: EndpointId, record: &Value) -> Result<Value, CryptoError> {
        let mut out = record.clone();
        for rule in self.rules.iter().filter(|r| r.applies_to(endpoint)) {
            if let Some(slot) = navigate_mut(&mut out, &rule.path) {
                if slot.is_string() || slot.is_number() || slot.is_boolean() {
                    let plaintext = scalar_to_string(slot);
                    let encrypted = encrypt_field(&plaintext, rule.mode, &self.key)?;
                    *slot = Value::String(encrypted);
                }
            }
        }
        Ok(out)
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Walks `path` (dot-notation segments) through nested JSON objects, returning
/// a mutable reference to the leaf if every intermediate segment resolves to
/// an object and the full path exists.
fn navigate_mut<'a>(root: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    let mut current = root;
    for (i, segment) in path.iter().enumerate() {
        let obj = current.as_object_mut()?;
        current = obj.get_mut(segment)?;
        if i == path.len() - 1 {
            return Some(current);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endpoint(n: u8) -> EndpointId {
        EndpointId::new(n).unwrap()
    }

    #[test]
    fn encrypts_matched_scalar_field() {
        let key = EncryptionKey::generate();
        let rules = parse_rules("user.email:RANDOM_AUTHENTICATED").unwrap();
        let enc = FieldEncryptor::new(key, rules);
        let record = json!({"user": {"email": "a@b.com", "id": 1}});
        let out = enc.encrypt_record(endpoint(1), &record).unwrap();
        assert_ne!(out["user"]["email"], record["user"]["email"]);
        assert_eq!(out["user"]["id"], 1);
    }

    #[test]
    fn missing_field_is_a_no_op() {
        let key = EncryptionKey::generate();
        let rules = parse_rules("user.ssn:RANDOM_AUTHENTICATED").unwrap();
        let enc = FieldEncryptor::new(key, rules);
        let record = json!({"user": {"email": "a@b.com"}});
        let out = enc.encrypt_record(endpoint(1), &record).unwrap();
        assert_eq!(out, record);
    }

    #[test]
    fn endpoint_scoping_restricts_rule_application() {
        let key = EncryptionKey::generate();
        let rules = parse_rules("api2.secret:RANDOM_AUTHENTICATED").unwrap();
        let enc = FieldEncryptor::new(key, rules);
        let record = json!({"secret": "x"});
        let unchanged = enc.encrypt_record(endpoint(1), &record).unwrap();
        assert_eq!(unchanged, record);
        let changed = enc.encrypt_record(endpoint(2), &record).unwrap();
        assert_ne!(changed["secret"], record["secret"]);
    }

    #[test]
    fn non_scalar_field_is_left_untouched() {
        let key = EncryptionKey::generate();
        let rules = parse_rules("user:RANDOM_AUTHENTICATED").unwrap();
        let enc = FieldEncryptor::new(key, rules);
        let record = json!({"user": {"email": "a@b.com"}});
        let out = enc.encrypt_record(endpoint(1), &record).unwrap();
        assert_eq!(out, record);
    }
}
