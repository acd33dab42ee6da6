//! Endpoint Runner (spec §4.1): one cooperative loop per assigned endpoint.

use crate::chaining::ChainingCoordinator;
use crate::config::EndpointSpec;
use crate::error_kind::{classify_response, classify_transport, ErrorKind, TransportFailure};
use crate::hostio::EmittedRecord;
use crate::scheduler::AdaptiveScheduler;
use httpsource_cache::{FetchCache, Fingerprint};
use httpsource_circuitbreaker::CircuitBreaker;
use httpsource_core::{extract, EndpointId, Value};
use httpsource_crypto::FieldEncryptor;
use httpsource_http::{AuthProvider, FetchResult, HttpClient, HttpError, PreparedRequest};
use httpsource_offset::{OffsetManager, OffsetMode};
use httpsource_ratelimiter::RateLimiter;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::mpsc::Sender;

/// Outcome of one [`EndpointRunner::poll_once`] call (spec §4.1).
#[derive(Debug)]
pub enum PollOutcome {
    Emitted(usize),
    Skipped(SkipReason),
    Failed(ErrorKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    CircuitOpen,
    RateLimited,
    NotDue,
}

pub struct EndpointRunner {
    spec: EndpointSpec,
    offset: OffsetManager,
    circuit: CircuitBreaker,
    scheduler: AdaptiveScheduler,
    rate_limiter: Arc<RateLimiter>,
    cache: Option<Arc<FetchCache>>,
    http: Arc<HttpClient>,
    auth: AuthProvider,
    encryptor: Option<Arc<FieldEncryptor>>,
    chaining: Option<Arc<ChainingCoordinator>>,
    sink: Sender<EmittedRecord>,
    next_due: Instant,
    consecutive_rate_limited: u32,
}

impl EndpointRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        spec: EndpointSpec,
        offset: OffsetManager,
        circuit: CircuitBreaker,
        rate_limiter: Arc<RateLimiter>,
        cache: Option<Arc<FetchCache>>,
        http: Arc<HttpClient>,
        auth: AuthProvider,
        encryptor: Option<Arc<FieldEncryptor>>,
        chaining: Option<Arc<ChainingCoordinator>>,
        sink: Sender<EmittedRecord>,
    ) -> Self {
        let interval = spec.request_interval;
        Self {
            spec,
            offset,
            circuit,
            scheduler: AdaptiveScheduler::new(interval),
            rate_limiter,
            cache,
            http,
            auth,
            encryptor,
            chaining,
            sink,
            next_due: Instant::now(),
            consecutive_rate_limited: 0,
        }
    }

    pub fn endpoint_id(&self) -> EndpointId {
        self.spec.id
    }

    pub fn next_due_instant(&self) -> Instant {
        self.next_due
    }

    /// Rebinds a chaining child's offset state to a newly delivered parent
    /// value before the next [`Self::poll_once`] call; a no-op for any other
    /// offset mode (spec §4.8).
    pub fn set_chain_value(&mut self, parent_value: String) {
        if let OffsetManager::Chaining(chaining) = &mut self.offset {
            chaining.set_parent_value(parent_value);
        }
    }

    /// Runs exactly one iteration of the poll-loop contract (spec §4.1, steps 1-12).
    pub async fn poll_once(&mut self) -> PollOutcome {
        let now = Instant::now();
        if now < self.next_due {
            return PollOutcome::Skipped(SkipReason::NotDue);
        }

        if let Err(_rejected) = self.circuit.can_proceed() {
            self.next_due = Instant::now() + self.spec.request_interval;
            return PollOutcome::Skipped(SkipReason::CircuitOpen);
        }

        match self.rate_limiter.acquire().await {
            Ok(()) => {}
            Err(denied) => {
                self.next_due = Instant::now() + denied.wait;
                return PollOutcome::Skipped(SkipReason::RateLimited);
            }
        }

        let url = self.offset.next_url(&format!("{}{}", self.spec.base_url, self.spec.path_template));
        let mut request = PreparedRequest::get(&url);
        for (name, value) in &self.spec.headers {
            request = request.header(name.clone(), value.clone());
        }
        let request = match self.auth.apply(request).await {
            Ok(r) => r,
            Err(e) => return self.handle_transport_error(e),
        };

        let fingerprint = Fingerprint::compute(&request.method, &request.url, &request.query, &request.headers);
        let cached = self.cache.as_ref().and_then(|cache| cache.get(&fingerprint));

        let fetch = match cached {
            Some(hit) => FetchResult {
                status: hit.status,
                headers: hit.headers,
                body: hit.body,
                latency: Duration::ZERO,
            },
            None => match self.http.fetch(request).await {
                Ok(result) => {
                    if let Some(cache) = &self.cache {
                        let cache_control = result.cache_control().map(str::to_string);
                        cache.put(fingerprint, result.status, result.headers.clone(), result.body.clone(), cache_control.as_deref());
                    }
                    result
                }
                Err(e) => return self.handle_transport_error(e),
            },
        };

        if let Some(kind) = classify_response(fetch.status) {
            return self.handle_response_error(kind, &fetch);
        }

        let body: Value = match serde_json::from_slice(&fetch.body) {
            Ok(v) => v,
            Err(_) => return self.handle_response_error(ErrorKind::Parse, &fetch),
        };

        let records: Vec<Value> = match extract(&body, &self.spec.data_pointer) {
            Ok(Some(Value::Array(items))) => items.to_vec(),
            Ok(Some(other)) => vec![other.clone()],
            Ok(None) => Vec::new(),
            Err(_) => return self.handle_response_error(ErrorKind::Parse, &fetch),
        };

        let emittable = self.offset.filter_emittable(&records).unwrap_or_default();
        let mut emitted = 0usize;
        for record in emittable {
            let encrypted = match &self.encryptor {
                Some(enc) => enc.encrypt_record(self.spec.id, record).unwrap_or_else(|_| record.clone()),
                None => record.clone(),
            };

            if let Some(chaining) = &self.chaining {
                if chaining.is_chaining_parent(self.spec.id) {
                    if let Some(pointer) = &self.spec.chaining_pointer {
                        let parent_value = extract(record, pointer)
                            .ok()
                            .flatten()
                            .and_then(|v| scalar_to_string(v.clone()));
                        chaining.deliver(self.spec.id, parent_value);
                    }
                }
            }

            let emitted_record = EmittedRecord {
                topic: self.spec.topic.clone(),
                key: None,
                value: encrypted,
                source_partition: self.offset.partition_key(),
                source_offset: self.offset.current().offset.as_ref().map(scalar_to_json).unwrap_or(Value::Null),
                timestamp: SystemTime::now(),
            };
            if self.sink.send(emitted_record).await.is_ok() {
                emitted += 1;
            }
        }

        let _ = self.offset.update(&body, &records);
        self.scheduler.observe(emitted > 0);
        self.circuit.record_success();
        self.rate_limiter.on_result(fetch.status);
        self.consecutive_rate_limited = 0;
        self.next_due = Instant::now() + self.scheduler.current_interval();

        PollOutcome::Emitted(emitted)
    }

    fn handle_transport_error(&mut self, error: HttpError) -> PollOutcome {
        let kind = classify_transport(transport_failure_of(&error));
        self.apply_failure(kind, None);
        PollOutcome::Failed(kind)
    }

    fn handle_response_error(&mut self, kind: ErrorKind, fetch: &FetchResult) -> PollOutcome {
        self.apply_failure(kind, fetch.retry_after());
        self.rate_limiter.on_result(fetch.status);
        PollOutcome::Failed(kind)
    }

    /// Applies one failed poll's consequences (spec §4.1 step 7, §7 error
    /// handling): the breaker only opens for kinds classified as
    /// `open_circuit`, and a `honor_retry_after` kind waits the response's
    /// `Retry-After` header if present, else backs off exponentially with
    /// jitter rather than resuming the normal poll cadence.
    fn apply_failure(&mut self, kind: ErrorKind, retry_after: Option<Duration>) {
        let action = kind.action();
        if action.open_circuit {
            self.circuit.record_failure(kind.is_auth());
        }
        self.scheduler.observe(false);

        let delay = if action.honor_retry_after {
            match retry_after {
                Some(wait) => {
                    self.consecutive_rate_limited = 0;
                    wait
                }
                None => {
                    let backoff = self.rate_limited_backoff();
                    self.consecutive_rate_limited = self.consecutive_rate_limited.saturating_add(1);
                    backoff
                }
            }
        } else if action.retryable {
            self.scheduler.current_interval()
        } else {
            self.spec.request_interval
        };

        self.next_due = Instant::now() + delay;
    }

    /// Exponential backoff capped at 16x the configured interval, with
    /// 50-100% jitter to avoid every endpoint retrying in lockstep.
    fn rate_limited_backoff(&self) -> Duration {
        let exponent = self.consecutive_rate_limited.min(4);
        let base = self.spec.request_interval.mul_f64(2f64.powi(exponent as i32));
        let capped = base.min(self.spec.request_interval * 16);
        let jitter = rand::thread_rng().gen_range(0.5..=1.0);
        capped.mul_f64(jitter)
    }
}

/// reqwest collapses DNS/TLS/connect failures into one opaque `Error`; its
/// `is_timeout`/`is_connect` probes plus a substring sniff of the source
/// chain is the closest this crate can get to spec §4.3's finer buckets
/// without a hard dependency on hyper's own error internals.
fn transport_failure_of(error: &HttpError) -> TransportFailure {
    match error {
        HttpError::Timeout(_) => TransportFailure::TimedOut,
        HttpError::Request(e) => {
            if e.is_timeout() {
                return TransportFailure::TimedOut;
            }
            if e.is_connect() {
                let text = e.to_string().to_ascii_lowercase();
                if text.contains("certificate") || text.contains("tls") || text.contains("ssl") {
                    return TransportFailure::TlsHandshake;
                }
                if text.contains("dns") || text.contains("resolve") {
                    return TransportFailure::DnsResolution;
                }
                return TransportFailure::ConnectionRefused;
            }
            TransportFailure::Other
        }
        _ => TransportFailure::Other,
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn scalar_to_json(scalar: &httpsource_offset::OffsetScalar) -> Value {
    match scalar {
        httpsource_offset::OffsetScalar::Integer(n) => Value::from(*n),
        httpsource_offset::OffsetScalar::Text(s) => Value::String(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EndpointSpec, OffsetModeConfig};
    use httpsource_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
    use httpsource_http::{AuthProvider, HttpClient, HttpClientConfig};
    use httpsource_offset::{OffsetManager, SimpleIncrementing};
    use httpsource_ratelimiter::{Algorithm, RateLimiter, RateLimiterConfig, Scope};
    use tokio::sync::mpsc;

    fn runner() -> EndpointRunner {
        let spec = EndpointSpec {
            id: EndpointId::new(1).unwrap(),
            base_url: "https://example.invalid".to_string(),
            path_template: "/items".to_string(),
            method: "GET".to_string(),
            headers: Vec::new(),
            topic: "items".to_string(),
            offset_mode: OffsetModeConfig::SimpleIncrementing { initial: 0 },
            chaining_pointer: None,
            data_pointer: "/items".to_string(),
            request_interval: Duration::from_millis(100),
            adaptive_polling_enabled: true,
        };
        let offset = OffsetManager::SimpleIncrementing(SimpleIncrementing::new("https://example.invalid/items", 0));
        let circuit = CircuitBreaker::new(CircuitBreakerConfig::builder("api1").failure_threshold(1).build());
        let rate_limiter = Arc::new(RateLimiter::new(
            RateLimiterConfig::builder(Algorithm::TokenBucket, Scope::Task)
                .capacity(100)
                .refill_per_second(100.0)
                .build(),
        ));
        let http = Arc::new(HttpClient::new(HttpClientConfig::default()).unwrap());
        let (tx, _rx) = mpsc::channel(8);
        EndpointRunner::new(spec, offset, circuit, rate_limiter, None, http, AuthProvider::None, None, None, tx)
    }

    #[test]
    fn rate_limited_does_not_open_the_circuit_even_after_many_failures() {
        let mut endpoint = runner();
        for _ in 0..5 {
            endpoint.apply_failure(ErrorKind::RateLimited, None);
        }
        assert_eq!(endpoint.circuit.state(), CircuitState::Closed);
    }

    #[test]
    fn non_circuit_opening_kind_still_waits_the_normal_retryable_interval() {
        let mut endpoint = runner();
        let before = Instant::now();
        endpoint.apply_failure(ErrorKind::RateLimited, Some(Duration::from_secs(7)));
        let delay = endpoint.next_due.saturating_duration_since(before);
        assert!(delay >= Duration::from_secs(6) && delay <= Duration::from_secs(7));
        assert_eq!(endpoint.consecutive_rate_limited, 0);
    }

    #[test]
    fn missing_retry_after_backs_off_further_on_repeated_rate_limits() {
        let mut endpoint = runner();
        let before = Instant::now();
        endpoint.apply_failure(ErrorKind::RateLimited, None);
        let first_delay = endpoint.next_due.saturating_duration_since(before);

        let before = Instant::now();
        endpoint.apply_failure(ErrorKind::RateLimited, None);
        let second_delay = endpoint.next_due.saturating_duration_since(before);

        assert!(second_delay >= first_delay);
    }

    #[test]
    fn open_circuit_kind_still_opens_the_breaker() {
        let mut endpoint = runner();
        endpoint.apply_failure(ErrorKind::Timeout, None);
        assert_eq!(endpoint.circuit.state(), CircuitState::Open);
    }
}
