use std::time::Duration;

/// A normalized HTTP response (spec §4.10: "Returns a normalized `FetchResult`").
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub latency: Duration,
}

impl FetchResult {
    pub fn cache_control(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("cache-control"))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_success(&self) -> bool {
        self.status < 400
    }

    /// `Retry-After` header, seconds form only (the HTTP-date form is not parsed).
    pub fn retry_after(&self) -> Option<Duration> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("retry-after"))
            .and_then(|(_, value)| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}
