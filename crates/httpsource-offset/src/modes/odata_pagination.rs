use crate::error::OffsetError;
use crate::persisted::{OffsetScalar, PersistedOffset, TokenKind};
use crate::traits::OffsetMode;
use httpsource_core::{PartitionKey, Value};

/// Whether the stored offset is the full `@odata.nextLink`/`@odata.deltaLink`
/// URL, or just the `skiptoken`/`deltatoken` query parameter extracted from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ODataTokenMode {
    FullUrl,
    TokenOnly,
}

/// OData `@odata.nextLink` / `@odata.deltaLink` pagination.
pub struct ODataPagination {
    url: String,
    nextlink_field: String,
    deltalink_field: String,
    token_mode: ODataTokenMode,
    token: Option<String>,
    token_kind: Option<TokenKind>,
}

impl ODataPagination {
    pub fn new(
        url: impl Into<String>,
        nextlink_field: impl Into<String>,
        deltalink_field: impl Into<String>,
        token_mode: ODataTokenMode,
    ) -> Self {
        Self {
            url: url.into(),
            nextlink_field: nextlink_field.into(),
            deltalink_field: deltalink_field.into(),
            token_mode,
            token: None,
            token_kind: None,
        }
    }

    /// A `deltaLink`-only response signals the source is caught up; subsequent
    /// polls fetch only changes.
    pub fn is_caught_up(&self) -> bool {
        self.token_kind == Some(TokenKind::DeltaLink)
    }

    fn param_name(kind: TokenKind) -> &'static str {
        match kind {
            TokenKind::NextLink => "skiptoken",
            TokenKind::DeltaLink => "deltatoken",
        }
    }
}

impl OffsetMode for ODataPagination {
    fn current(&self) -> PersistedOffset {
        PersistedOffset {
            offset: self.token.clone().map(OffsetScalar::Text),
            last_key: None,
            token_kind: self.token_kind,
        }
    }

    fn update(&mut self, response: &Value, _records: &[Value]) -> Result<(), OffsetError> {
        if let Some(link) = response.get(self.nextlink_field.as_str()).and_then(Value::as_str) {
            let link = link.to_string();
            self.store_link(&link, TokenKind::NextLink);
        } else if let Some(link) = response.get(self.deltalink_field.as_str()).and_then(Value::as_str) {
            let link = link.to_string();
            self.store_link(&link, TokenKind::DeltaLink);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.token = None;
        self.token_kind = None;
    }

    fn resume(&mut self, persisted: &PersistedOffset) {
        self.token = persisted.offset.as_ref().and_then(OffsetScalar::as_str).map(str::to_string);
        self.token_kind = persisted.token_kind;
    }

    fn partition_key(&self) -> PartitionKey {
        PartitionKey::linear(&self.url)
    }

    fn next_url(&self, base_path: &str) -> String {
        match (&self.token, self.token_kind, self.token_mode) {
            (Some(full_url), _, ODataTokenMode::FullUrl) => full_url.clone(),
            (Some(token), Some(kind), ODataTokenMode::TokenOnly) => {
                let separator = if base_path.contains('?') { '&' } else { '?' };
                format!("{base_path}{separator}{}={token}", Self::param_name(kind))
            }
            _ => base_path.to_string(),
        }
    }
}

impl ODataPagination {
    fn store_link(&mut self, link: &str, kind: TokenKind) {
        self.token_kind = Some(kind);
        self.token = match self.token_mode {
            ODataTokenMode::FullUrl => Some(link.to_string()),
            ODataTokenMode::TokenOnly => query_param(link, Self::param_name(kind)).or_else(|| Some(link.to_string())),
        };
    }
}

/// Extracts one query parameter's value without pulling in a full URL parser.
fn query_param(url: &str, name: &str) -> Option<String> {
    let query = url.split_once('?')?.1;
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=')?;
        if key == name {
            return Some(value.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_url_mode_stores_entire_link() {
        let mut mode = ODataPagination::new(
            "https://h/a",
            "@odata.nextLink",
            "@odata.deltaLink",
            ODataTokenMode::FullUrl,
        );
        mode.update(&json!({"@odata.nextLink": "https://h/a?skiptoken=XYZ"}), &[])
            .unwrap();
        assert_eq!(mode.next_url("https://h/a"), "https://h/a?skiptoken=XYZ");
        assert!(!mode.is_caught_up());
    }

    #[test]
    fn token_only_mode_extracts_skiptoken() {
        let mut mode = ODataPagination::new(
            "https://h/a",
            "@odata.nextLink",
            "@odata.deltaLink",
            ODataTokenMode::TokenOnly,
        );
        mode.update(&json!({"@odata.nextLink": "https://h/a?skiptoken=XYZ"}), &[])
            .unwrap();
        assert_eq!(mode.next_url("https://h/a"), "https://h/a?skiptoken=XYZ");
    }

    #[test]
    fn deltalink_signals_caught_up_and_uses_deltatoken() {
        let mut mode = ODataPagination::new(
            "https://h/a",
            "@odata.nextLink",
            "@odata.deltaLink",
            ODataTokenMode::TokenOnly,
        );
        mode.update(&json!({"@odata.deltaLink": "https://h/a?deltatoken=DDD"}), &[])
            .unwrap();
        assert!(mode.is_caught_up());
        assert_eq!(mode.next_url("https://h/a"), "https://h/a?deltatoken=DDD");
    }

    #[test]
    fn token_only_mode_appends_with_ampersand_when_path_already_has_a_query() {
        let mut mode = ODataPagination::new(
            "https://h/api?$select=x",
            "@odata.nextLink",
            "@odata.deltaLink",
            ODataTokenMode::TokenOnly,
        );
        mode.update(&json!({"@odata.deltaLink": "https://h/api?$select=x&deltatoken=XYZ"}), &[])
            .unwrap();
        assert_eq!(mode.next_url("/api?$select=x"), "/api?$select=x&deltatoken=XYZ");
    }

    #[test]
    fn no_link_present_leaves_state_unchanged() {
        let mut mode = ODataPagination::new(
            "https://h/a",
            "@odata.nextLink",
            "@odata.deltaLink",
            ODataTokenMode::FullUrl,
        );
        mode.update(&json!({"value": []}), &[]).unwrap();
        assert_eq!(mode.next_url("https://h/a"), "https://h/a");
    }
}
