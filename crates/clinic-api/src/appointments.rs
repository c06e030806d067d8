use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use clinic_types::Appointment;
use tracing::debug;

use crate::circuit::{CircuitBreaker, CircuitConfig, CircuitState, TransportMode};
use crate::client::{ApiError, HttpClient};
use crate::fallback::FallbackResponder;
use crate::retry::RetryPolicy;

/// Client for the appointment endpoints of the clinic-medical service.
///
/// Every call is retried under the configured [`RetryPolicy`] and guarded by
/// a [`CircuitBreaker`]. While the circuit is open, calls are answered by
/// the [`FallbackResponder`] without touching the network.
#[derive(Debug, Clone)]
pub struct AppointmentClient {
    http: HttpClient,
    retry: RetryPolicy,
    circuit: Arc<CircuitBreaker>,
    fallback: FallbackResponder,
}

impl AppointmentClient {
    /// Create a client with the default retry policy and circuit breaker.
    ///
    /// `base_url` is the root URL of the upstream (e.g. `http://clinic-medical:8080`).
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self::from_http(HttpClient::new(base_url)?))
    }

    /// Create a client whose individual attempts time out after `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self::from_http(HttpClient::with_timeout(base_url, timeout)?))
    }

    pub fn from_http(http: HttpClient) -> Self {
        Self {
            http,
            retry: RetryPolicy::default(),
            circuit: Arc::new(CircuitBreaker::default()),
            fallback: FallbackResponder,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_circuit_breaker(mut self, config: CircuitConfig) -> Self {
        self.circuit = Arc::new(CircuitBreaker::new(config));
        self
    }

    pub fn base_url(&self) -> &url::Url {
        self.http.base_url()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit.state()
    }

    /// GET `/appointments/{patient_id}/appointments`
    pub async fn appointments_by_patient(
        &self,
        patient_id: i64,
    ) -> Result<Vec<Appointment>, ApiError> {
        match self.circuit.mode() {
            TransportMode::Fallback => Ok(self.fallback.appointments_by_patient(patient_id)),
            TransportMode::Live => {
                let path = format!("appointments/{patient_id}/appointments");
                self.execute("appointments_by_patient", || self.http.get(&path))
                    .await
            }
        }
    }

    /// POST `/appointments?patientId={patient_id}` with the appointment as body.
    pub async fn book_appointment(
        &self,
        appointment: &Appointment,
        patient_id: i64,
    ) -> Result<Appointment, ApiError> {
        match self.circuit.mode() {
            TransportMode::Fallback => Ok(self.fallback.book_appointment(appointment, patient_id)),
            TransportMode::Live => {
                let path = format!("appointments?patientId={patient_id}");
                self.execute("book_appointment", || self.http.post(&path, appointment))
                    .await
            }
        }
    }

    /// GET `/doctors/{doctor_id}/appointments`
    pub async fn appointments_by_doctor(
        &self,
        doctor_id: i64,
    ) -> Result<Vec<Appointment>, ApiError> {
        match self.circuit.mode() {
            TransportMode::Fallback => Ok(self.fallback.appointments_by_doctor(doctor_id)),
            TransportMode::Live => {
                let path = format!("doctors/{doctor_id}/appointments");
                self.execute("appointments_by_doctor", || self.http.get(&path))
                    .await
            }
        }
    }

    /// GET `/appointments/specialization/{specialization}/date/{date}`
    pub async fn appointments_by_specialization_and_date(
        &self,
        specialization: &str,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, ApiError> {
        match self.circuit.mode() {
            TransportMode::Fallback => Ok(self
                .fallback
                .appointments_by_specialization_and_date(specialization, date)),
            TransportMode::Live => {
                let path = format!(
                    "appointments/specialization/{}/date/{}",
                    encode_segment(specialization)?,
                    date.format("%Y-%m-%d")
                );
                self.execute("appointments_by_specialization_and_date", || {
                    self.http.get(&path)
                })
                .await
            }
        }
    }

    /// Run a live call under the retry policy and report its final outcome
    /// to the circuit breaker.
    async fn execute<T, F, Fut>(&self, operation: &str, call: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let result = self.retry.run(operation, call).await;
        match &result {
            Err(e) if e.is_upstream_failure() => {
                debug!(operation, error = %e, "recording upstream failure");
                self.circuit.record_failure();
            }
            _ => self.circuit.record_success(),
        }
        result
    }
}

/// Whether `segment` would be read as a `.` or `..` path step. URL
/// resolution drops those (percent-encoded dots included), so they can never
/// reach the upstream as a literal segment.
pub fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}

/// Percent-encode a single path segment.
fn encode_segment(segment: &str) -> Result<String, ApiError> {
    if is_dot_segment(segment) {
        return Err(ApiError::InvalidSegment {
            segment: segment.to_string(),
        });
    }
    Ok(url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20"))
}
