//! Cacheability rules (spec §4.6).

use std::time::Duration;

/// Whether a response may be stored, and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Cacheable { ttl_override: Option<Duration> },
    NotCacheable,
}

/// Determines cacheability: `status < 400`; no `no-cache`/`no-store`/`private`
/// directive; body no larger than `max_body_bytes`.
///
/// `cache_control` is the raw `Cache-Control` header value, if present. A
/// `max-age=N` directive overrides the configured default TTL.
pub fn evaluate(status: u16, cache_control: Option<&str>, body_len: usize, max_body_bytes: usize) -> Eligibility {
    if status >= 400 {
        return Eligibility::NotCacheable;
    }
    if body_len > max_body_bytes {
        return Eligibility::NotCacheable;
    }

    let mut ttl_override = None;
    if let Some(directive) = cache_control {
        for part in directive.split(',').map(str::trim) {
            let lower = part.to_ascii_lowercase();
            if lower == "no-cache" || lower == "no-store" || lower == "private" {
                return Eligibility::NotCacheable;
            }
            if let Some(value) = lower.strip_prefix("max-age=") {
                if let Ok(seconds) = value.parse::<u64>() {
                    ttl_override = Some(Duration::from_secs(seconds));
                }
            }
        }
    }

    Eligibility::Cacheable { ttl_override }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_4xx_and_5xx() {
        assert_eq!(evaluate(404, None, 10, 1000), Eligibility::NotCacheable);
        assert_eq!(evaluate(500, None, 10, 1000), Eligibility::NotCacheable);
    }

    #[test]
    fn accepts_2xx_and_3xx_by_default() {
        assert!(matches!(
            evaluate(200, None, 10, 1000),
            Eligibility::Cacheable { .. }
        ));
        assert!(matches!(
            evaluate(301, None, 10, 1000),
            Eligibility::Cacheable { .. }
        ));
    }

    #[test]
    fn rejects_oversized_body() {
        assert_eq!(evaluate(200, None, 2000, 1000), Eligibility::NotCacheable);
    }

    #[test]
    fn rejects_no_store_and_no_cache_and_private() {
        assert_eq!(
            evaluate(200, Some("no-store"), 10, 1000),
            Eligibility::NotCacheable
        );
        assert_eq!(
            evaluate(200, Some("no-cache"), 10, 1000),
            Eligibility::NotCacheable
        );
        assert_eq!(
            evaluate(200, Some("private"), 10, 1000),
            Eligibility::NotCacheable
        );
    }

    #[test]
    fn max_age_overrides_default_ttl() {
        let result = evaluate(200, Some("max-age=120"), 10, 1000);
        assert_eq!(
            result,
            Eligibility::Cacheable {
                ttl_override: Some(Duration::from_secs(120))
            }
        );
    }
}
