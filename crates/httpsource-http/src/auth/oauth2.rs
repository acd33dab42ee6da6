use super::events::AuthEvent;
use crate::client::HttpClient;
use crate::error::HttpError;
use crate::request::PreparedRequest;
use httpsource_core::EventListeners;
use serde::Deserialize;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify};

#[derive(Debug, Clone)]
struct TokenState {
    access_token: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// OAuth2 client-credentials provider (spec §4.11). Owns the current token
/// and a background refresher firing at `expires_at − safety_margin`.
/// Refresh is serialized behind a single-owner mutex so concurrent pollers
/// never fire two refreshes at once.
pub struct OAuth2Provider {
    name: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    safety_margin: Duration,
    http: Arc<HttpClient>,
    state: RwLock<Option<TokenState>>,
    refresh_lock: Mutex<()>,
    events: EventListeners<AuthEvent>,
}

impl OAuth2Provider {
    pub fn new(
        name: impl Into<String>,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        safety_margin: Duration,
        http: Arc<HttpClient>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            safety_margin,
            http,
            state: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            events: EventListeners::new(),
        })
    }

    /// Returns a valid access token, refreshing first if none is cached or
    /// the cached one is within its safety margin of expiry.
    pub async fn current_token(&self) -> Result<String, HttpError> {
        if let Some(token) = self.fresh_cached_token() {
            return Ok(token);
        }
        self.refresh().await
    }

    fn fresh_cached_token(&self) -> Option<String> {
        let guard = self.state.read().unwrap();
        guard.as_ref().and_then(|state| {
            if Instant::now() + self.safety_margin < state.expires_at {
                Some(state.access_token.clone())
            } else {
                None
            }
        })
    }

    async fn refresh(&self) -> Result<String, HttpError> {
        let _permit = self.refresh_lock.lock().await;
        // Another waiter may have refreshed while we queued for the lock.
        if let Some(token) = self.fresh_cached_token() {
            return Ok(token);
        }

        let body = format!(
            "grant_type=client_credentials&client_id={}&client_secret={}",
            urlencode(&self.client_id),
            urlencode(&self.client_secret)
        );
        let mut request = PreparedRequest::get(&self.token_url)
            .header("Content-Type", "application/x-www-form-urlencoded");
        request.method = "POST".to_string();
        request.body = Some(body.into_bytes());

        let result = self.http.fetch(request).await;
        let outcome = self.apply_refresh_result(result);
        match &outcome {
            Ok(_) => self.events.emit(&AuthEvent::TokenRefreshed {
                provider: self.name.clone(),
                timestamp: Instant::now(),
            }),
            Err(e) => self.events.emit(&AuthEvent::RefreshFailed {
                provider: self.name.clone(),
                reason: e.to_string(),
                timestamp: Instant::now(),
            }),
        }
        outcome
    }

    fn apply_refresh_result(&self, result: Result<crate::response::FetchResult, HttpError>) -> Result<String, HttpError> {
        let response = result?;
        if response.status >= 400 {
            return Err(HttpError::TokenEndpoint { status: response.status });
        }
        let parsed: TokenResponse = serde_json::from_slice(&response.body)
            .map_err(|_| HttpError::MalformedTokenResponse("access_token/expires_in"))?;
        let state = TokenState {
            access_token: parsed.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(parsed.expires_in),
        };
        *self.state.write().unwrap() = Some(state);
        Ok(parsed.access_token)
    }

    pub fn event_listeners(&self) -> &EventListeners<AuthEvent> {
        &self.events
    }
}

fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Spawns the background refresher: wakes just before the cached token's
/// safety margin elapses, or on a fixed retry cadence if there is no token
/// yet or the last refresh failed.
pub fn spawn_refresher(provider: Arc<OAuth2Provider>, retry_interval: Duration) -> RefresherHandle {
    let shutdown = Arc::new(Notify::new());
    let shutdown_rx = shutdown.clone();
    let join = tokio::spawn(async move {
        loop {
            let sleep_for = match provider.state.read().unwrap().as_ref() {
                Some(state) => state
                    .expires_at
                    .checked_duration_since(Instant::now() + provider.safety_margin)
                    .unwrap_or(Duration::ZERO),
                None => Duration::ZERO,
            };
            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {
                    if provider.refresh().await.is_err() {
                        tokio::time::sleep(retry_interval).await;
                    }
                }
                _ = shutdown_rx.notified() => break,
            }
        }
    });
    RefresherHandle { shutdown, join }
}

pub struct RefresherHandle {
    shutdown: Arc<Notify>,
    join: tokio::task::JoinHandle<()>,
}

impl RefresherHandle {
    pub async fn stop(self) {
        self.shutdown.notify_one();
        let _ = self.join.await;
    }
}
