//! # Resilience Module
//!
//! Fault isolation for live provider access. A tripped circuit breaker is
//! treated like any other live-fetch failure, so resolution degrades to the
//! snapshot or synthetic tier instead of waiting on a provider that keeps
//! failing.

pub mod circuit_breaker;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerMetrics, CircuitState};
