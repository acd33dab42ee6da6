use serde::{Deserialize, Serialize};

/// The scalar stored under `offset` or `last_key` in a checkpoint: an
/// integer for incrementing/snapshot modes, a string everywhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OffsetScalar {
    Integer(i64),
    Text(String),
}

impl OffsetScalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Integer(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Text(s) => s.parse().ok(),
        }
    }
}

/// Which OData link produced the currently stored token (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    NextLink,
    DeltaLink,
}

/// The wire/checkpoint layout of one partition's offset (spec §6: "Persisted
/// offset layout").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PersistedOffset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<OffsetScalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_key: Option<OffsetScalar>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "token_kind")]
    pub token_kind: Option<TokenKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let p = PersistedOffset {
            offset: Some(OffsetScalar::Integer(42)),
            last_key: None,
            token_kind: None,
        };
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"offset":42}"#);
        let back: PersistedOffset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn snapshot_layout_uses_last_key() {
        let p = PersistedOffset {
            offset: None,
            last_key: Some(OffsetScalar::Text("77".into())),
            token_kind: None,
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json, serde_json::json!({"last_key": "77"}));
    }

    #[test]
    fn odata_layout_includes_token_kind() {
        let p = PersistedOffset {
            offset: Some(OffsetScalar::Text("abc".into())),
            last_key: None,
            token_kind: Some(TokenKind::DeltaLink),
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["token_kind"], "deltalink");
    }
}
