//! Typed configuration surface (spec §3 EndpointSpec/Auth, §6 "Configuration surface").
//!
//! The configuration *loader and validator* is an external collaborator
//! (spec §1 Out of scope); these types are the shape it is expected to hand
//! this crate once parsing and validation have already happened.

use httpsource_core::EndpointId;
use httpsource_http::{ApiKeyLocation, HostnameVerification, TlsVersion, TrustMode};
use httpsource_offset::ODataTokenMode;
pub use httpsource_ratelimiter::{Algorithm as RateLimiterAlgorithm, Scope as RateLimiterScope};
use std::time::Duration;

/// `rate.limit.*` (spec §4.5): one bucket shared by every endpoint whose
/// rate-limiter `scope` resolves to the same key.
#[derive(Debug, Clone)]
pub struct RateLimiterSpec {
    pub algorithm: RateLimiterAlgorithm,
    pub scope: RateLimiterScope,
    pub capacity: u64,
    pub refill_per_second: f64,
    pub window: Duration,
    pub rate_limited_penalty: u64,
}

/// `http.offset.mode` (spec §6), carrying each mode's own required fields.
#[derive(Debug, Clone)]
pub enum OffsetModeConfig {
    SimpleIncrementing { initial: u64 },
    CursorPagination { cursor_pointer: String },
    ODataPagination {
        nextlink_field: String,
        deltalink_field: String,
        token_mode: ODataTokenMode,
    },
    SnapshotPagination { record_key_pointer: String },
    Chaining { inner: Box<OffsetModeConfig> },
}

/// `auth.type` and its per-variant fields (spec §6).
#[derive(Debug, Clone)]
pub enum AuthConfig {
    None,
    Basic { username: String, password: String },
    Bearer { token: String },
    ApiKey { name: String, value: String, location: ApiKeyLocation },
    OAuth2 {
        token_url: String,
        client_id: String,
        client_secret: String,
        safety_margin: Duration,
    },
}

/// Field-encryption scoping and rule set (spec §4.9, §6).
#[derive(Debug, Clone)]
pub struct EncryptionConfig {
    pub enabled: bool,
    pub key_base64: String,
    pub rules_spec: String,
}

/// `apiN.*` — one endpoint's full configuration (spec §3 EndpointSpec).
#[derive(Debug, Clone)]
pub struct EndpointSpec {
    pub id: EndpointId,
    pub base_url: String,
    pub path_template: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub topic: String,
    pub offset_mode: OffsetModeConfig,
    pub chaining_pointer: Option<String>,
    pub data_pointer: String,
    pub request_interval: Duration,
    pub adaptive_polling_enabled: bool,
}

/// Parent-child edges from `api.chaining.parent.child.relationship`
/// (`"childN:parentM,childK:parentM"`, spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainEdge {
    pub parent: EndpointId,
    pub child: EndpointId,
}

/// TLS/proxy configuration shared by the task's one HTTP client (spec §4.10).
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub trust_mode: TrustMode,
    pub hostname_verification: HostnameVerification,
    pub min_tls_version: TlsVersion,
    pub max_tls_version: TlsVersion,
    pub proxy_url: Option<String>,
    pub proxy_auth: Option<(String, String)>,
}

/// `behavior.on.error` (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorBehavior {
    Fail,
    Ignore,
}

/// Whole-task configuration: everything a [`crate::TaskCoordinator`] needs at `start`.
#[derive(Debug, Clone)]
pub struct TaskConfig {
    pub endpoints: Vec<EndpointSpec>,
    pub chain_edges: Vec<ChainEdge>,
    pub auth: AuthConfig,
    pub tls: TlsConfig,
    pub encryption: Option<EncryptionConfig>,
    pub rate_limiter: Option<RateLimiterSpec>,
    pub circuit_breaker_failure_threshold: u32,
    pub circuit_breaker_reset: Duration,
    pub caching_enabled: bool,
    pub cache_ttl: Duration,
    pub max_cache_size: usize,
    pub behavior_on_error: ErrorBehavior,
    pub reporter_error_topic: Option<String>,
}
