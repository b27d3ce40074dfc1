//! # Circuit Breaker
//!
//! Fail-fast guard around live provider calls. Closed lets calls through,
//! Open rejects them until the cool-down elapses, HalfOpen lets a limited
//! number of probes through to test recovery.

use crate::config::CircuitBreakerSettings;
use crate::error::{EngineError, EngineResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation - provider calls pass through
    Closed,
    /// Failing fast - calls are rejected until the timeout elapses
    Open,
    /// Recovery probe - a limited number of calls test the provider
    HalfOpen,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CircuitBreakerMetrics {
    pub total_calls: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub rejected_count: u64,
    pub consecutive_failures: u32,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    opened_at: Option<Instant>,
    half_open_successes: u32,
    half_open_in_flight: u32,
    metrics: CircuitBreakerMetrics,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    success_threshold: u32,
    cool_down: Duration,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, settings: &CircuitBreakerSettings) -> Self {
        let name = name.into();
        info!(
            component = %name,
            failure_threshold = settings.failure_threshold,
            success_threshold = settings.success_threshold,
            timeout_ms = settings.timeout_ms,
            "🛡️ Circuit breaker initialized"
        );

        Self {
            name,
            failure_threshold: settings.failure_threshold.max(1),
            success_threshold: settings.success_threshold.max(1),
            cool_down: Duration::from_millis(settings.timeout_ms),
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                opened_at: None,
                half_open_successes: 0,
                half_open_in_flight: 0,
                metrics: CircuitBreakerMetrics::default(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn metrics(&self) -> CircuitBreakerMetrics {
        self.inner.lock().metrics.clone()
    }

    /// Run `operation` unless the circuit is open
    pub async fn call<F, Fut, T>(&self, operation: F) -> EngineResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = EngineResult<T>>,
    {
        if !self.try_acquire() {
            return Err(EngineError::CircuitBreakerOpen(self.name.clone()));
        }

        let result = operation().await;
        match &result {
            Ok(_) => self.record_success(),
            Err(_) => self.record_failure(),
        }
        result
    }

    fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let cooled_down = inner
                    .opened_at
                    .map_or(true, |opened| opened.elapsed() >= self.cool_down);
                if cooled_down {
                    inner.state = CircuitState::HalfOpen;
                    inner.half_open_successes = 0;
                    inner.half_open_in_flight = 1;
                    info!(component = %self.name, "🟡 Circuit breaker half-open (testing recovery)");
                    true
                } else {
                    inner.metrics.rejected_count += 1;
                    debug!(component = %self.name, "Circuit open, rejecting call");
                    false
                }
            }
            CircuitState::HalfOpen => {
                if inner.half_open_in_flight < self.success_threshold {
                    inner.half_open_in_flight += 1;
                    true
                } else {
                    inner.metrics.rejected_count += 1;
                    false
                }
            }
        }
    }

    fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.metrics.total_calls += 1;
        inner.metrics.success_count += 1;
        inner.metrics.consecutive_failures = 0;

        if inner.state == CircuitState::HalfOpen {
            inner.half_open_successes += 1;
            if inner.half_open_successes >= self.success_threshold {
                inner.state = CircuitState::Closed;
                inner.opened_at = None;
                inner.half_open_in_flight = 0;
                info!(
                    component = %self.name,
                    total_calls = inner.metrics.total_calls,
                    "🟢 Circuit breaker closed (recovered)"
                );
            }
        }
    }

    fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.metrics.total_calls += 1;
        inner.metrics.failure_count += 1;
        inner.metrics.consecutive_failures += 1;

        let should_open = match inner.state {
            CircuitState::Closed => inner.metrics.consecutive_failures >= self.failure_threshold,
            CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        };

        if should_open {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
            inner.half_open_in_flight = 0;
            warn!(
                component = %self.name,
                consecutive_failures = inner.metrics.consecutive_failures,
                cool_down_ms = self.cool_down.as_millis() as u64,
                "🔴 Circuit breaker opened (failing fast)"
            );
        }
    }

    /// Force the circuit open, e.g. when credentials are known to be revoked
    pub fn force_open(&self) {
        let mut inner = self.inner.lock();
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        warn!(component = %self.name, "🚨 Circuit breaker forced open");
    }

    pub fn force_closed(&self) {
        let mut inner = self.inner.lock();
        inner.state = CircuitState::Closed;
        inner.opened_at = None;
        inner.metrics.consecutive_failures = 0;
        warn!(component = %self.name, "🚨 Circuit breaker forced closed");
    }
}
