use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use clinic_types::Appointment;
use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::error::{self, ApiFailure, Operation};
use crate::server::ServerState;
use crate::service::PatientService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecializationQuery {
    #[serde(deserialize_with = "path_segment")]
    pub specialization: String,
    pub local_date: NaiveDate,
}

/// The specialization becomes an upstream path segment, so `.` and `..`
/// are rejected here as a bad request.
fn path_segment<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    if clinic_api::is_dot_segment(&value) {
        return Err(serde::de::Error::custom(format!(
            "invalid specialization '{value}'"
        )));
    }
    Ok(value)
}

/// Build the patient-facing REST router.
///
/// - `GET  /patients/{patientId}/appointments`
/// - `POST /patients/{patientId}/appointments`
/// - `GET  /patients/doctors/{doctorId}/appointments`
/// - `GET  /patients/appointments?specialization=&localDate=`
///
/// A handler panic is answered with a plain-text 500.
pub fn router(service: PatientService) -> Router {
    Router::new()
        .route(
            "/patients/{patient_id}/appointments",
            get(appointments_by_patient).post(book_appointment),
        )
        .route(
            "/patients/doctors/{doctor_id}/appointments",
            get(appointments_by_doctor),
        )
        .route(
            "/patients/appointments",
            get(appointments_by_specialization_and_date),
        )
        .layer(error::catch_panic_layer())
        .with_state(Arc::new(service))
}

/// Serve the REST API on the given port. Marks `state` ready once the
/// listener is bound.
pub async fn run(port: u16, service: PatientService, state: ServerState) -> anyhow::Result<()> {
    let upstream = service.client().base_url().to_string();
    let max_attempts = service.client().retry_policy().max_attempts;
    let app = router(service);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, %upstream, max_attempts, "starting patient gateway");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    state.set_ready();
    axum::serve(listener, app).await?;
    Ok(())
}

async fn appointments_by_patient(
    State(service): State<Arc<PatientService>>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<Appointment>>, ApiFailure> {
    service
        .appointments_by_patient(patient_id)
        .await
        .map(Json)
        .map_err(|e| ApiFailure::new(Operation::AppointmentsByPatient, e))
}

async fn book_appointment(
    State(service): State<Arc<PatientService>>,
    Path(patient_id): Path<i64>,
    Json(appointment): Json<Appointment>,
) -> Result<(StatusCode, Json<Appointment>), ApiFailure> {
    service
        .book_appointment(&appointment, patient_id)
        .await
        .map(|booked| (StatusCode::CREATED, Json(booked)))
        .map_err(|e| ApiFailure::new(Operation::BookAppointment, e))
}

async fn appointments_by_doctor(
    State(service): State<Arc<PatientService>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Vec<Appointment>>, ApiFailure> {
    service
        .appointments_by_doctor(doctor_id)
        .await
        .map(Json)
        .map_err(|e| ApiFailure::new(Operation::AppointmentsByDoctor, e))
}

async fn appointments_by_specialization_and_date(
    State(service): State<Arc<PatientService>>,
    Query(query): Query<SpecializationQuery>,
) -> Result<Json<Vec<Appointment>>, ApiFailure> {
    service
        .appointments_by_specialization_and_date(&query.specialization, query.local_date)
        .await
        .map(Json)
        .map_err(|e| ApiFailure::new(Operation::AppointmentsBySpecializationAndDate, e))
}
