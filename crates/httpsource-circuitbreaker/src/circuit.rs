use crate::config::CircuitBreakerConfig;
use crate::error::CircuitBreakerError;
use crate::events::CircuitBreakerEvent;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use httpsource_core::EventListeners;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// The three states of spec §3/§4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls are allowed.
    Closed,
    /// Calls are rejected until the reset window elapses.
    Open,
    /// Exactly one probe call is allowed through.
    HalfOpen,
}

impl CircuitState {
    fn label(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

/// One per-endpoint circuit breaker.
///
/// Owned exclusively by the endpoint runner it protects; never shared across
/// endpoints (spec §3: "Each Endpoint Runner exclusively owns its ... CircuitState").
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: CircuitState,
    last_transition: Instant,
    recent_failures: VecDeque<Instant>,
    half_open_probe_taken: bool,
    event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreaker {
    /// Creates a new breaker in the `Closed` state.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: CircuitState::Closed,
            last_transition: Instant::now(),
            recent_failures: VecDeque::new(),
            half_open_probe_taken: false,
            event_listeners: EventListeners::new(),
        }
    }

    /// Registers an event listener.
    pub fn add_listener<L>(&mut self, listener: L)
    where
        L: httpsource_core::EventListener<CircuitBreakerEvent> + 'static,
    {
        self.event_listeners.add(listener);
    }

    /// Current state.
    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// `can_proceed` of spec §4.1 step 2: `Open` becomes eligible for exactly
    /// one probe once the reset window has elapsed; `HalfOpen` admits at most
    /// one in-flight probe.
    pub fn can_proceed(&mut self) -> Result<(), CircuitBreakerError> {
        let now = Instant::now();
        match self.state {
            CircuitState::Closed => {
                self.emit(CircuitBreakerEvent::CallPermitted {
                    name: self.config.name().to_string(),
                    timestamp: now,
                });
                Ok(())
            }
            CircuitState::Open => {
                if now.duration_since(self.last_transition) >= self.config.reset_window() {
                    self.transition_to(CircuitState::HalfOpen);
                    self.half_open_probe_taken = true;
                    self.emit(CircuitBreakerEvent::CallPermitted {
                        name: self.config.name().to_string(),
                        timestamp: now,
                    });
                    Ok(())
                } else {
                    self.emit(CircuitBreakerEvent::CallRejected {
                        name: self.config.name().to_string(),
                        timestamp: now,
                    });
                    Err(CircuitBreakerError::Open {
                        name: self.config.name().to_string(),
                    })
                }
            }
            CircuitState::HalfOpen => {
                if self.half_open_probe_taken {
                    self.emit(CircuitBreakerEvent::CallRejected {
                        name: self.config.name().to_string(),
                        timestamp: now,
                    });
                    Err(CircuitBreakerError::Open {
                        name: self.config.name().to_string(),
                    })
                } else {
                    self.half_open_probe_taken = true;
                    self.emit(CircuitBreakerEvent::CallPermitted {
                        name: self.config.name().to_string(),
                        timestamp: now,
                    });
                    Ok(())
                }
            }
        }
    }

    /// Records a successful call. `HalfOpen` -> `Closed` on the very next success.
    pub fn record_success(&mut self) {
        match self.state {
            CircuitState::HalfOpen => self.transition_to(CircuitState::Closed),
            CircuitState::Closed => {
                self.prune_failures(Instant::now());
            }
            CircuitState::Open => {}
        }
    }

    /// Records a failed call.
    ///
    /// `is_auth_error` implements the AUTH fast-open path of spec §4.4: a
    /// single AUTH-kind failure opens the circuit immediately regardless of
    /// the failure threshold.
    pub fn record_failure(&mut self, is_auth_error: bool) {
        let now = Instant::now();
        match self.state {
            CircuitState::HalfOpen => {
                self.transition_to(CircuitState::Open);
                return;
            }
            CircuitState::Open => return,
            CircuitState::Closed => {}
        }

        if is_auth_error {
            self.emit(CircuitBreakerEvent::AuthFastOpen {
                name: self.config.name().to_string(),
                timestamp: now,
            });
            self.transition_to(CircuitState::Open);
            return;
        }

        self.recent_failures.push_back(now);
        self.prune_failures(now);
        if self.recent_failures.len() >= self.config.failure_threshold {
            self.transition_to(CircuitState::Open);
        }
    }

    /// Forces the breaker open, e.g. from an external health signal.
    pub fn force_open(&mut self) {
        self.transition_to(CircuitState::Open);
    }

    /// Forces the breaker closed, discarding any recorded failures.
    pub fn force_closed(&mut self) {
        self.transition_to(CircuitState::Closed);
    }

    fn prune_failures(&mut self, now: Instant) {
        let window = self.config.failure_window;
        while let Some(&front) = self.recent_failures.front() {
            if now.duration_since(front) > window {
                self.recent_failures.pop_front();
            } else {
                break;
            }
        }
    }

    fn transition_to(&mut self, state: CircuitState) {
        if self.state == state {
            return;
        }
        let from = self.state;
        let now = Instant::now();

        self.emit(CircuitBreakerEvent::StateTransition {
            name: self.config.name().to_string(),
            timestamp: now,
            from,
            to: state,
        });

        #[cfg(feature = "tracing")]
        tracing::info!(circuit = self.config.name(), from = from.label(), to = state.label(), "circuit state transition");

        #[cfg(feature = "metrics")]
        {
            counter!("circuitbreaker_transitions_total", "circuit" => self.config.name().to_string(), "from" => from.label(), "to" => state.label()).increment(1);
            gauge!("circuitbreaker_state", "circuit" => self.config.name().to_string()).set(match state {
                CircuitState::Closed => 0.0,
                CircuitState::Open => 1.0,
                CircuitState::HalfOpen => 2.0,
            });
        }

        self.state = state;
        self.last_transition = now;
        self.recent_failures.clear();
        self.half_open_probe_taken = false;
    }

    fn emit(&self, event: CircuitBreakerEvent) {
        self.event_listeners.emit(&event);
    }
}

/// How long until this breaker is next eligible for a probe, if `Open`.
pub fn next_probe_instant(breaker: &CircuitBreaker) -> Option<Instant> {
    match breaker.state {
        CircuitState::Open => Some(breaker.last_transition + breaker.config.reset_window()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn breaker(threshold: usize, reset: Duration) -> CircuitBreaker {
        CircuitBreaker::new(
            CircuitBreakerConfig::builder("api1")
                .failure_threshold(threshold)
                .reset_window(reset)
                .build(),
        )
    }

    #[test]
    fn closed_allows_calls() {
        let mut cb = breaker(3, Duration::from_millis(10));
        assert!(cb.can_proceed().is_ok());
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn opens_after_threshold_failures() {
        let mut cb = breaker(3, Duration::from_secs(60));
        cb.record_failure(false);
        cb.record_failure(false);
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure(false);
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn auth_error_fast_opens_on_first_failure() {
        let mut cb = breaker(10, Duration::from_secs(60));
        cb.record_failure(true);
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn open_rejects_until_reset_window_elapses() {
        let mut cb = breaker(1, Duration::from_millis(20));
        cb.record_failure(false);
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.can_proceed().is_err());

        sleep(Duration::from_millis(25));
        assert!(cb.can_proceed().is_ok());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn half_open_admits_exactly_one_probe() {
        let mut cb = breaker(1, Duration::from_millis(10));
        cb.record_failure(false);
        sleep(Duration::from_millis(15));
        assert!(cb.can_proceed().is_ok());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        // A second concurrent attempt while the probe is outstanding is rejected.
        assert!(cb.can_proceed().is_err());
    }

    #[test]
    fn half_open_success_closes() {
        let mut cb = breaker(1, Duration::from_millis(10));
        cb.record_failure(false);
        sleep(Duration::from_millis(15));
        cb.can_proceed().unwrap();
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_failure_reopens() {
        let mut cb = breaker(1, Duration::from_millis(10));
        cb.record_failure(false);
        sleep(Duration::from_millis(15));
        cb.can_proceed().unwrap();
        cb.record_failure(false);
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn failures_outside_window_do_not_count() {
        let mut cb = breaker(2, Duration::from_millis(20));
        cb.record_failure(false);
        sleep(Duration::from_millis(25));
        cb.record_failure(false);
        // The first failure aged out of the window, so we're still below threshold.
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn force_open_and_closed() {
        let mut cb = breaker(5, Duration::from_secs(60));
        cb.force_open();
        assert_eq!(cb.state(), CircuitState::Open);
        cb.force_closed();
        assert_eq!(cb.state(), CircuitState::Closed);
    }
}
