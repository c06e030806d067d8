use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use clinic_api::ApiError;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{error, warn};

/// Domain failure of a forwarded call.
#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("Patient not found with ID: {0}")]
    PatientNotFound(i64),
    #[error("Doctor not found with ID: {0}")]
    DoctorNotFound(i64),
    #[error("Error {action}: {source}")]
    Service {
        action: &'static str,
        source: ApiError,
    },
}

impl ClinicError {
    pub fn retrieving(source: ApiError) -> Self {
        ClinicError::Service {
            action: "retrieving appointments",
            source,
        }
    }

    pub fn booking(source: ApiError) -> Self {
        ClinicError::Service {
            action: "booking appointment",
            source,
        }
    }

    /// Metric label for the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ClinicError::PatientNotFound(_) => "patient_not_found",
            ClinicError::DoctorNotFound(_) => "doctor_not_found",
            ClinicError::Service { .. } => "service_error",
        }
    }
}

/// The four forwarded operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AppointmentsByPatient,
    BookAppointment,
    AppointmentsByDoctor,
    AppointmentsBySpecializationAndDate,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::AppointmentsByPatient => "appointments_by_patient",
            Operation::BookAppointment => "book_appointment",
            Operation::AppointmentsByDoctor => "appointments_by_doctor",
            Operation::AppointmentsBySpecializationAndDate => {
                "appointments_by_specialization_and_date"
            }
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A [`ClinicError`] raised while serving a specific operation.
///
/// Rendered as a plain-text body carrying the error message.
#[derive(Debug)]
pub struct ApiFailure {
    pub operation: Operation,
    pub error: ClinicError,
}

impl ApiFailure {
    pub fn new(operation: Operation, error: ClinicError) -> Self {
        Self { operation, error }
    }

    /// Status for this failure. Operation-specific rules come first; anything
    /// else falls through to [`global_status`].
    pub fn status(&self) -> StatusCode {
        match (self.operation, &self.error) {
            (Operation::AppointmentsByPatient, ClinicError::PatientNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            // A missing patient on write is the caller's fault.
            (Operation::BookAppointment, ClinicError::PatientNotFound(_)) => {
                StatusCode::BAD_REQUEST
            }
            (Operation::AppointmentsByDoctor, ClinicError::DoctorNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            (Operation::AppointmentsBySpecializationAndDate, ClinicError::Service { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            (_, error) => global_status(error),
        }
    }
}

/// Status for failures no operation handles itself.
pub fn global_status(error: &ClinicError) -> StatusCode {
    match error {
        ClinicError::PatientNotFound(_) | ClinicError::DoctorNotFound(_) => StatusCode::NOT_FOUND,
        ClinicError::Service { .. } => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.error.to_string();
        warn!(
            operation = %self.operation,
            status = status.as_u16(),
            error = %message,
            "request failed"
        );
        (status, message).into_response()
    }
}

/// Layer turning a panicking handler into a plain-text 500 instead of a
/// dropped connection.
pub fn catch_panic_layer() -> CatchPanicLayer<fn(Box<dyn Any + Send + 'static>) -> Response> {
    CatchPanicLayer::custom(panic_response as fn(Box<dyn Any + Send + 'static>) -> Response)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    let message = format!("An unexpected error occurred: {detail}");
    error!(error = %message, "handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
}
