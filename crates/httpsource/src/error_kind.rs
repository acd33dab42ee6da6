//! Error Classifier (spec §4.3).

/// A raw fetch failure, classified into one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SslTls,
    Dns,
    ConnectRefused,
    Timeout,
    Auth,
    RateLimited,
    Http4xxFatal,
    Http5xxTransient,
    Parse,
    Unknown,
}

/// The action each [`ErrorKind`] prescribes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorAction {
    pub retryable: bool,
    pub open_circuit: bool,
    pub honor_retry_after: bool,
    pub fatal_by_default: bool,
}

impl ErrorKind {
    pub fn action(self) -> ErrorAction {
        match self {
            Self::SslTls => ErrorAction { retryable: false, open_circuit: true, honor_retry_after: false, fatal_by_default: true },
            Self::Dns => ErrorAction { retryable: true, open_circuit: true, honor_retry_after: false, fatal_by_default: false },
            Self::ConnectRefused => ErrorAction { retryable: true, open_circuit: true, honor_retry_after: false, fatal_by_default: false },
            Self::Timeout => ErrorAction { retryable: true, open_circuit: true, honor_retry_after: false, fatal_by_default: false },
            Self::Auth => ErrorAction { retryable: false, open_circuit: true, honor_retry_after: false, fatal_by_default: true },
            Self::RateLimited => ErrorAction { retryable: true, open_circuit: false, honor_retry_after: true, fatal_by_default: false },
            Self::Http4xxFatal => ErrorAction { retryable: false, open_circuit: false, honor_retry_after: false, fatal_by_default: true },
            Self::Http5xxTransient => ErrorAction { retryable: true, open_circuit: true, honor_retry_after: false, fatal_by_default: false },
            Self::Parse => ErrorAction { retryable: false, open_circuit: false, honor_retry_after: false, fatal_by_default: true },
            Self::Unknown => ErrorAction { retryable: true, open_circuit: true, honor_retry_after: false, fatal_by_default: false },
        }
    }

    pub fn is_auth(self) -> bool {
        matches!(self, Self::Auth)
    }
}

/// Classifies a completed HTTP response (no transport error) by status code.
pub fn classify_response(status: u16) -> Option<ErrorKind> {
    match status {
        200..=399 => None,
        401 | 403 => Some(ErrorKind::Auth),
        429 => Some(ErrorKind::RateLimited),
        400..=499 => Some(ErrorKind::Http4xxFatal),
        500..=599 => Some(ErrorKind::Http5xxTransient),
        _ => Some(ErrorKind::Unknown),
    }
}

/// Classifies a transport-level failure (the request never produced a status).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    TlsHandshake,
    DnsResolution,
    ConnectionRefused,
    TimedOut,
    Other,
}

pub fn classify_transport(failure: TransportFailure) -> ErrorKind {
    match failure {
        TransportFailure::TlsHandshake => ErrorKind::SslTls,
        TransportFailure::DnsResolution => ErrorKind::Dns,
        TransportFailure::ConnectionRefused => ErrorKind::ConnectRefused,
        TransportFailure::TimedOut => ErrorKind::Timeout,
        TransportFailure::Other => ErrorKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_401_and_403_to_auth() {
        assert_eq!(classify_response(401), Some(ErrorKind::Auth));
        assert_eq!(classify_response(403), Some(ErrorKind::Auth));
    }

    #[test]
    fn maps_429_to_rate_limited() {
        assert_eq!(classify_response(429), Some(ErrorKind::RateLimited));
    }

    #[test]
    fn success_statuses_classify_to_none() {
        assert_eq!(classify_response(200), None);
        assert_eq!(classify_response(304), None);
    }

    #[test]
    fn auth_and_ssl_are_fatal_and_open_circuit_but_not_retryable() {
        let action = ErrorKind::Auth.action();
        assert!(action.fatal_by_default);
        assert!(action.open_circuit);
        assert!(!action.retryable);
    }

    #[test]
    fn rate_limited_honors_retry_after_without_opening_circuit() {
        let action = ErrorKind::RateLimited.action();
        assert!(action.honor_retry_after);
        assert!(!action.open_circuit);
        assert!(action.retryable);
    }

    #[test]
    fn transport_failures_map_to_expected_kinds() {
        assert_eq!(classify_transport(TransportFailure::DnsResolution), ErrorKind::Dns);
        assert_eq!(classify_transport(TransportFailure::TimedOut), ErrorKind::Timeout);
    }
}
