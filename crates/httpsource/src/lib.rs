//! Durable, concurrent HTTP ingestion worker: per-task polling engine.
//!
//! This crate is the assembly point for the `httpsource-*` building blocks
//! (circuit breaker, rate limiter, cache, crypto, offset modes, HTTP client):
//! [`start_task`] takes a task's [`config::TaskConfig`] plus the host's
//! [`hostio::OffsetReader`]/[`hostio::RecordSink`] and wires up one
//! [`runner::EndpointRunner`] per endpoint behind a
//! [`coordinator::TaskCoordinator`], returning a [`Task`] the host drives
//! through [`hostio::HostHandle`].

pub mod chaining;
pub mod config;
pub mod coordinator;
mod error_kind;
pub mod hostio;
mod runner;
mod scheduler;

pub use chaining::{ChainWorkItem, ChainingCoordinator, ChainingError};
pub use coordinator::{make_emit_channel, TaskCoordinator, DEFAULT_EMIT_CHANNEL_CAPACITY};
pub use error_kind::{classify_response, classify_transport, ErrorAction, ErrorKind, TransportFailure};
pub use hostio::{EmittedRecord, HostHandle, OffsetReader, RecordSink};
pub use runner::{EndpointRunner, PollOutcome, SkipReason};
pub use scheduler::AdaptiveScheduler;

use async_trait::async_trait;
use config::{AuthConfig, EndpointSpec, OffsetModeConfig, RateLimiterAlgorithm, RateLimiterScope, TaskConfig};
use httpsource_cache::{CacheConfig, FetchCache, SweeperHandle};
use httpsource_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig};
use httpsource_core::PartitionKey;
use httpsource_crypto::{CryptoError, FieldEncryptor};
use httpsource_http::auth::{spawn_refresher, OAuth2Provider, RefresherHandle};
use httpsource_http::{AuthProvider, HttpClient, HttpClientConfig, HttpError};
use httpsource_offset::{
    Chaining, CursorPagination, ODataPagination, OffsetManager, OffsetMode, PersistedOffset, SimpleIncrementing,
    SnapshotPagination,
};
use httpsource_ratelimiter::{RateLimiter, RateLimiterConfig, RateLimiterRegistry};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Bucket used when a task has no `rate.limit.*` configuration at all:
/// generous enough that `acquire` never meaningfully throttles (spec §4.5).
const UNLIMITED_CAPACITY: u64 = 1_000_000;
const UNLIMITED_REFILL_PER_SECOND: f64 = 1_000_000.0;

/// How often the OAuth2 refresher retries after a failed refresh attempt.
const OAUTH2_RETRY_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] HttpError),
    #[error("failed to build field encryptor: {0}")]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Chaining(#[from] ChainingError),
}

/// A running task: the [`TaskCoordinator`] plus every background handle that
/// must be stopped alongside it (spec §5: "every acquired resource has a
/// release path on every exit").
pub struct Task {
    coordinator: TaskCoordinator,
    // `HostHandle::stop` takes `&self`, but stopping a handle consumes it;
    // the `Mutex` is only ever used to `take()` these once.
    oauth_refresher: Mutex<Option<RefresherHandle>>,
    cache_sweeper: Mutex<Option<SweeperHandle>>,
}

#[async_trait]
impl HostHandle for Task {
    async fn start(&self) -> Result<(), String> {
        self.coordinator.start().await
    }

    async fn stop(&self) {
        self.coordinator.stop().await;
        if let Some(refresher) = self.oauth_refresher.lock().unwrap().take() {
            refresher.stop().await;
        }
        if let Some(sweeper) = self.cache_sweeper.lock().unwrap().take() {
            sweeper.stop().await;
        }
    }

    async fn poll(&self, deadline: Duration) -> Vec<EmittedRecord> {
        self.coordinator.poll(deadline).await
    }

    fn has_failed_fatally(&self) -> bool {
        self.coordinator.has_failed_fatally()
    }
}

/// Builds every endpoint's runner and starts the task's background work
/// (HTTP client, OAuth2 refresher, cache sweeper, chaining coordinator).
pub async fn start_task(
    config: TaskConfig,
    offset_reader: Arc<dyn OffsetReader>,
    error_sink: Option<Arc<dyn RecordSink>>,
) -> Result<Task, TaskError> {
    let http = Arc::new(HttpClient::new(to_http_client_config(&config.tls))?);

    let (auth, oauth_refresher) = build_auth(&config.auth, &http);

    let cache = if config.caching_enabled {
        Some(FetchCache::new(
            CacheConfig::builder()
                .capacity(config.max_cache_size)
                .default_ttl(config.cache_ttl)
                .build(),
        ))
    } else {
        None
    };
    let cache_sweeper = cache.as_ref().map(|cache| cache.spawn_sweeper());

    let encryptor = match &config.encryption {
        Some(enc) if enc.enabled => Some(Arc::new(FieldEncryptor::from_config(&enc.key_base64, &enc.rules_spec)?)),
        _ => None,
    };

    let chaining = if config.chain_edges.is_empty() {
        None
    } else {
        Some(Arc::new(ChainingCoordinator::new(config.chain_edges.clone())?))
    };

    let rate_limiters = RateLimiterRegistry::new();
    let (sender, receiver) = make_emit_channel(DEFAULT_EMIT_CHANNEL_CAPACITY);

    let mut runners = Vec::with_capacity(config.endpoints.len());
    for spec in &config.endpoints {
        let offset = build_offset_manager(spec, offset_reader.as_ref()).await;
        let circuit = CircuitBreaker::new(
            CircuitBreakerConfig::builder(spec.id.config_prefix())
                .failure_threshold(config.circuit_breaker_failure_threshold as usize)
                .reset_window(config.circuit_breaker_reset)
                .build(),
        );
        let rate_limiter = build_rate_limiter(&rate_limiters, &config, spec);

        runners.push(EndpointRunner::new(
            spec.clone(),
            offset,
            circuit,
            rate_limiter,
            cache.clone(),
            http.clone(),
            auth.clone(),
            encryptor.clone(),
            chaining.clone(),
            sender.clone(),
        ));
    }
    drop(sender);

    let coordinator = TaskCoordinator::start(
        runners,
        receiver,
        chaining,
        config.behavior_on_error,
        config.reporter_error_topic,
        error_sink,
    );

    Ok(Task { coordinator, oauth_refresher: Mutex::new(oauth_refresher), cache_sweeper: Mutex::new(cache_sweeper) })
}

fn to_http_client_config(tls: &config::TlsConfig) -> HttpClientConfig {
    HttpClientConfig {
        trust_mode: tls.trust_mode.clone(),
        hostname_verification: tls.hostname_verification,
        min_tls_version: tls.min_tls_version,
        max_tls_version: tls.max_tls_version,
        proxy_url: tls.proxy_url.clone(),
        proxy_auth: tls.proxy_auth.clone(),
        ..HttpClientConfig::default()
    }
}

fn build_auth(config: &AuthConfig, http: &Arc<HttpClient>) -> (AuthProvider, Option<RefresherHandle>) {
    match config {
        AuthConfig::None => (AuthProvider::None, None),
        AuthConfig::Basic { username, password } => {
            (AuthProvider::Basic { username: username.clone(), password: password.clone() }, None)
        }
        AuthConfig::Bearer { token } => (AuthProvider::Bearer { token: token.clone() }, None),
        AuthConfig::ApiKey { name, value, location } => {
            (AuthProvider::ApiKey { name: name.clone(), value: value.clone(), location: *location }, None)
        }
        AuthConfig::OAuth2 { token_url, client_id, client_secret, safety_margin } => {
            let provider = OAuth2Provider::new(
                "task-oauth2",
                token_url.clone(),
                client_id.clone(),
                client_secret.clone(),
                *safety_margin,
                http.clone(),
            );
            let refresher = spawn_refresher(provider.clone(), OAUTH2_RETRY_INTERVAL);
            (AuthProvider::OAuth2(provider), Some(refresher))
        }
    }
}

/// Resolves the configured rate limiter scope to a concrete bucket, scoping
/// an `Endpoint` limiter to this specific endpoint regardless of any string
/// already baked into the config (spec §3 RateBucket: "scope key").
fn build_rate_limiter(registry: &RateLimiterRegistry, config: &TaskConfig, spec: &EndpointSpec) -> Arc<RateLimiter> {
    match &config.rate_limiter {
        Some(rl) => {
            let scope = match &rl.scope {
                RateLimiterScope::Endpoint(_) => RateLimiterScope::Endpoint(spec.id.config_prefix()),
                other => other.clone(),
            };
            registry.get_or_create(
                RateLimiterConfig::builder(rl.algorithm, scope)
                    .capacity(rl.capacity)
                    .refill_per_second(rl.refill_per_second)
                    .window(rl.window)
                    .rate_limited_penalty(rl.rate_limited_penalty)
                    .build(),
            )
        }
        None => registry.get_or_create(
            RateLimiterConfig::builder(RateLimiterAlgorithm::TokenBucket, RateLimiterScope::Task)
                .capacity(UNLIMITED_CAPACITY)
                .refill_per_second(UNLIMITED_REFILL_PER_SECOND)
                .build(),
        ),
    }
}

/// Builds an endpoint's [`OffsetManager`] and, for non-chaining modes,
/// rehydrates it from the host's last persisted checkpoint. A chaining
/// child's partition is scoped to a parent value that is only known once its
/// parent delivers one (spec §4.8), so it always starts fresh rather than
/// resuming at task start; see `DESIGN.md` for this trade-off.
async fn build_offset_manager(spec: &EndpointSpec, offset_reader: &(dyn OffsetReader)) -> OffsetManager {
    let url = format!("{}{}", spec.base_url, spec.path_template);
    let mut manager = construct_mode(spec, &spec.offset_mode, &url);

    if !matches!(manager, OffsetManager::Chaining(_)) {
        let key = manager.partition_key();
        if let Some(checkpoint) = offset_reader.read(&key).await {
            if let Ok(persisted) = serde_json::from_value::<PersistedOffset>(checkpoint) {
                manager.resume(&persisted);
            }
        }
    }

    manager
}

fn construct_mode(spec: &EndpointSpec, mode: &OffsetModeConfig, url: &str) -> OffsetManager {
    match mode {
        OffsetModeConfig::SimpleIncrementing { initial } => {
            OffsetManager::SimpleIncrementing(SimpleIncrementing::new(url, *initial))
        }
        OffsetModeConfig::CursorPagination { cursor_pointer } => {
            OffsetManager::CursorPagination(CursorPagination::new(url, cursor_pointer.clone()))
        }
        OffsetModeConfig::ODataPagination { nextlink_field, deltalink_field, token_mode } => {
            OffsetManager::ODataPagination(ODataPagination::new(
                url,
                nextlink_field.clone(),
                deltalink_field.clone(),
                *token_mode,
            ))
        }
        OffsetModeConfig::SnapshotPagination { record_key_pointer } => {
            OffsetManager::SnapshotPagination(SnapshotPagination::new(url, record_key_pointer.clone()))
        }
        OffsetModeConfig::Chaining { inner } => {
            let inner_manager = construct_mode(spec, inner, url);
            OffsetManager::Chaining(Chaining::new(spec.id.config_prefix(), String::new(), Box::new(inner_manager)))
        }
    }
}
