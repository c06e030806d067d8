//! Client for the clinic-medical appointment service.
//!
//! Calls to the upstream go through these resilience layers:
//!
//! 1. **Error decoding** - a 503 becomes a retryable error due one second later
//! 2. **Retry with exponential backoff** - transient failures are tried again
//! 3. **Circuit breaking** - repeated upstream failures stop live traffic
//! 4. **Fallback** - empty or placeholder data while the circuit is open

mod appointments;
mod circuit;
mod client;
mod decoder;
mod fallback;
mod retry;

pub use appointments::{AppointmentClient, is_dot_segment};
pub use circuit::{CircuitBreaker, CircuitConfig, CircuitState, TransportMode};
pub use client::{ApiError, HttpClient};
pub use decoder::{UNAVAILABLE_RETRY_DELAY, decode};
pub use fallback::FallbackResponder;
pub use retry::RetryPolicy;
