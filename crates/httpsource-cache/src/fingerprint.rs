//! Request fingerprinting (spec §3 CacheEntry: "key (method+URL+sorted-params+selected-headers hash)").

/// A deterministic cache key built from the request method, base URL, sorted
/// query parameters, and a fixed set of cache-relevant headers.
///
/// Two requests that only differ in query-parameter order, or in headers
/// outside the configured cache-relevant set, fingerprint identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint for one request.
    ///
    /// `headers` must already be filtered down to the cache-relevant set by
    /// the caller; this function only sorts and canonicalizes what it is
    /// given.
    pub fn compute(
        method: &str,
        url: &str,
        query_params: &[(String, String)],
        headers: &[(String, String)],
    ) -> Self {
        let mut params = query_params.to_vec();
        params.sort();
        let mut hdrs = headers.to_vec();
        hdrs.sort();

        let params_part = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let headers_part = hdrs
            .iter()
            .map(|(k, v)| format!("{k}:{v}"))
            .collect::<Vec<_>>()
            .join(";");

        Self(format!(
            "{}|{}|{}|{}",
            method.to_ascii_uppercase(),
            url,
            params_part,
            headers_part
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
