//! Task Coordinator (spec §4.2): owns every endpoint's runner task, drains
//! their emitted records for the host, and isolates one endpoint's failure
//! from the rest of the task.

use crate::chaining::ChainingCoordinator;
use crate::config::ErrorBehavior;
use crate::hostio::{EmittedRecord, HostHandle, RecordSink};
use crate::runner::{EndpointRunner, PollOutcome};
use async_trait::async_trait;
use httpsource_core::{EndpointId, PartitionKey};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

/// Default bound on the internal emit channel each runner pushes into
/// (spec §4.2: the host drains this via [`HostHandle::poll`]).
pub const DEFAULT_EMIT_CHANNEL_CAPACITY: usize = 1024;

/// Why a runner task stopped.
enum RunnerExit {
    Cancelled,
    Fatal { endpoint: EndpointId, reason: String },
}

/// Builds the emit channel a [`TaskCoordinator`] will later drain. Callers
/// construct every [`EndpointRunner`] with a clone of the returned sender
/// before handing the runners and receiver to [`TaskCoordinator::start`].
pub fn make_emit_channel(capacity: usize) -> (mpsc::Sender<EmittedRecord>, mpsc::Receiver<EmittedRecord>) {
    mpsc::channel(capacity)
}

pub struct TaskCoordinator {
    shutdown: Arc<Notify>,
    handles: Mutex<Vec<JoinHandle<RunnerExit>>>,
    receiver: Mutex<mpsc::Receiver<EmittedRecord>>,
    fatal: Arc<AtomicBool>,
    reporter_error_topic: Option<String>,
    error_sink: Option<Arc<dyn RecordSink>>,
}

impl TaskCoordinator {
    /// Spawns one task per runner. `error_sink`/`reporter_error_topic` are
    /// used only for the fatal-error dead-letter path; leave either `None`
    /// to drop that reporting entirely.
    pub fn start(
        runners: Vec<EndpointRunner>,
        receiver: mpsc::Receiver<EmittedRecord>,
        chaining: Option<Arc<ChainingCoordinator>>,
        behavior_on_error: ErrorBehavior,
        reporter_error_topic: Option<String>,
        error_sink: Option<Arc<dyn RecordSink>>,
    ) -> Self {
        let shutdown = Arc::new(Notify::new());
        let fatal = Arc::new(AtomicBool::new(false));

        let handles = runners
            .into_iter()
            .map(|runner| spawn_runner_task(runner, chaining.clone(), shutdown.clone(), behavior_on_error, fatal.clone()))
            .collect();

        Self {
            shutdown,
            handles: Mutex::new(handles),
            receiver: Mutex::new(receiver),
            fatal,
            reporter_error_topic,
            error_sink,
        }
    }
}

#[async_trait]
impl HostHandle for TaskCoordinator {
    async fn start(&self) -> Result<(), String> {
        Ok(())
    }

    /// Cancels every runner task and waits for each to return, forwarding
    /// any fatal-error reason to `reporter_error_topic` if configured
    /// (spec §4.2: "every acquired resource has a release path on every
    /// exit").
    async fn stop(&self) {
        self.shutdown.notify_waiters();
        let handles = {
            let mut guard = self.handles.lock().unwrap();
            std::mem::take(&mut *guard)
        };
        for handle in handles {
            if let Ok(RunnerExit::Fatal { endpoint, reason }) = handle.await {
                if let (Some(topic), Some(sink)) = (&self.reporter_error_topic, &self.error_sink) {
                    let _ = sink.emit(error_record(topic, endpoint, &reason)).await;
                }
            }
        }
    }

    /// Drains whatever the runners have emitted within `deadline`, returning
    /// early as soon as at least one record is available (spec §6).
    async fn poll(&self, deadline: Duration) -> Vec<EmittedRecord> {
        let mut records = Vec::new();
        let mut receiver = self.receiver.lock().unwrap();
        let sleep = tokio::time::sleep(deadline);
        tokio::pin!(sleep);

        tokio::select! {
            biased;
            maybe_record = receiver.recv() => {
                if let Some(record) = maybe_record {
                    records.push(record);
                }
            }
            _ = &mut sleep => return records,
        }
        while let Ok(record) = receiver.try_recv() {
            records.push(record);
        }
        records
    }

    /// True once any runner has stopped on a fatal-classified error under
    /// `behavior.on.error = FAIL` (spec §4.2, §6).
    fn has_failed_fatally(&self) -> bool {
        self.fatal.load(Ordering::SeqCst)
    }
}

fn error_record(topic: &str, endpoint: EndpointId, reason: &str) -> EmittedRecord {
    EmittedRecord {
        topic: topic.to_string(),
        key: Some(endpoint.config_prefix()),
        value: json!({ "endpoint": endpoint.get(), "reason": reason }),
        source_partition: PartitionKey::linear(endpoint.config_prefix()),
        source_offset: serde_json::Value::Null,
        timestamp: SystemTime::now(),
    }
}

fn spawn_runner_task(
    mut runner: EndpointRunner,
    chaining: Option<Arc<ChainingCoordinator>>,
    shutdown: Arc<Notify>,
    behavior_on_error: ErrorBehavior,
    fatal: Arc<AtomicBool>,
) -> JoinHandle<RunnerExit> {
    tokio::spawn(async move {
        let endpoint = runner.endpoint_id();
        let is_chain_child = chaining.as_ref().is_some_and(|c| c.is_chain_child(endpoint));
        let chain_notify = chaining.as_ref().and_then(|c| c.notifier(endpoint));

        'outer: loop {
            if is_chain_child {
                let Some(notify) = &chain_notify else { break 'outer RunnerExit::Cancelled };
                tokio::select! {
                    _ = shutdown.notified() => break 'outer RunnerExit::Cancelled,
                    _ = notify.notified() => {}
                }
                let items = chaining.as_ref().map(|c| c.drain(endpoint)).unwrap_or_default();
                for item in items {
                    runner.set_chain_value(item.parent_value);
                    let outcome = runner.poll_once().await;
                    if let Some(exit) = fatal_exit(&outcome, behavior_on_error, endpoint, &fatal) {
                        shutdown.notify_waiters();
                        break 'outer exit;
                    }
                }
            } else {
                let sleep_for = runner.next_due_instant().saturating_duration_since(Instant::now());
                tokio::select! {
                    _ = shutdown.notified() => break 'outer RunnerExit::Cancelled,
                    _ = tokio::time::sleep(sleep_for) => {}
                }
                let outcome = runner.poll_once().await;
                if let Some(exit) = fatal_exit(&outcome, behavior_on_error, endpoint, &fatal) {
                    shutdown.notify_waiters();
                    break 'outer exit;
                }
            }
        }
    })
}

fn fatal_exit(
    outcome: &PollOutcome,
    behavior_on_error: ErrorBehavior,
    endpoint: EndpointId,
    fatal: &AtomicBool,
) -> Option<RunnerExit> {
    if let PollOutcome::Failed(kind) = outcome {
        if kind.action().fatal_by_default && behavior_on_error == ErrorBehavior::Fail {
            fatal.store(true, Ordering::SeqCst);
            return Some(RunnerExit::Fatal {
                endpoint,
                reason: format!("{kind:?}"),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EndpointSpec, OffsetModeConfig};
    use httpsource_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig};
    use httpsource_http::{AuthProvider, HttpClient, HttpClientConfig};
    use httpsource_offset::{OffsetManager, SimpleIncrementing};
    use httpsource_ratelimiter::{Algorithm, RateLimiter, RateLimiterConfig, Scope};
    use std::time::Duration;

    fn endpoint(id: u8) -> EndpointSpec {
        EndpointSpec {
            id: EndpointId::new(id).unwrap(),
            base_url: "https://example.invalid".to_string(),
            path_template: "/items".to_string(),
            method: "GET".to_string(),
            headers: Vec::new(),
            topic: "items".to_string(),
            offset_mode: OffsetModeConfig::SimpleIncrementing { initial: 0 },
            chaining_pointer: None,
            data_pointer: "/items".to_string(),
            request_interval: Duration::from_millis(20),
            adaptive_polling_enabled: true,
        }
    }

    fn idle_runner(id: u8, sink: mpsc::Sender<EmittedRecord>) -> EndpointRunner {
        let spec = endpoint(id);
        let offset = OffsetManager::SimpleIncrementing(SimpleIncrementing::new("https://example.invalid/items", 0));
        let circuit = CircuitBreaker::new(CircuitBreakerConfig::builder(format!("api{id}")).failure_threshold(3).build());
        let rate_limiter_config = RateLimiterConfig::builder(Algorithm::TokenBucket, Scope::Task)
            .capacity(100)
            .refill_per_second(100.0)
            .build();
        let rate_limiter = Arc::new(RateLimiter::new(rate_limiter_config));
        let http = Arc::new(HttpClient::new(HttpClientConfig::default()).unwrap());
        EndpointRunner::new(
            spec,
            offset,
            circuit,
            rate_limiter,
            None::<Arc<httpsource_cache::FetchCache>>,
            http,
            AuthProvider::None,
            None,
            None,
            sink,
        )
    }

    #[tokio::test]
    async fn stop_cancels_every_runner_task_without_panicking() {
        let (tx, rx) = make_emit_channel(8);
        let runner = idle_runner(1, tx);
        let coordinator = TaskCoordinator::start(vec![runner], rx, None, ErrorBehavior::Ignore, None, None);
        tokio::time::sleep(Duration::from_millis(5)).await;
        coordinator.stop().await;
        assert!(!coordinator.has_failed_fatally());
    }

    #[tokio::test]
    async fn poll_returns_empty_after_deadline_with_no_data() {
        let (tx, rx) = make_emit_channel(8);
        let runner = idle_runner(2, tx);
        let coordinator = TaskCoordinator::start(vec![runner], rx, None, ErrorBehavior::Ignore, None, None);
        let records = coordinator.poll(Duration::from_millis(10)).await;
        assert!(records.is_empty());
        coordinator.stop().await;
    }
}
