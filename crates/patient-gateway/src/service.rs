use std::future::Future;
use std::time::Instant;

use chrono::NaiveDate;
use clinic_api::{AppointmentClient, CircuitState};
use clinic_types::Appointment;
use tracing::debug;

use crate::error::{ClinicError, Operation};
use crate::metrics;

/// Forwards appointment operations to the clinic-medical service and
/// reclassifies upstream failures as [`ClinicError`]s.
///
/// Successful payloads are returned unchanged.
#[derive(Debug, Clone)]
pub struct PatientService {
    client: AppointmentClient,
}

impl PatientService {
    pub fn new(client: AppointmentClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &AppointmentClient {
        &self.client
    }

    pub async fn appointments_by_patient(
        &self,
        patient_id: i64,
    ) -> Result<Vec<Appointment>, ClinicError> {
        debug!(patient_id, "forwarding appointments by patient");
        self.observe(Operation::AppointmentsByPatient, async {
            self.client
                .appointments_by_patient(patient_id)
                .await
                .map_err(|e| {
                    if e.is_not_found() {
                        ClinicError::PatientNotFound(patient_id)
                    } else {
                        ClinicError::retrieving(e)
                    }
                })
        })
        .await
    }

    pub async fn book_appointment(
        &self,
        appointment: &Appointment,
        patient_id: i64,
    ) -> Result<Appointment, ClinicError> {
        debug!(patient_id, "forwarding appointment booking");
        self.observe(Operation::BookAppointment, async {
            self.client
                .book_appointment(appointment, patient_id)
                .await
                .map_err(|e| {
                    if e.is_not_found() {
                        ClinicError::PatientNotFound(patient_id)
                    } else {
                        ClinicError::booking(e)
                    }
                })
        })
        .await
    }

    pub async fn appointments_by_doctor(
        &self,
        doctor_id: i64,
    ) -> Result<Vec<Appointment>, ClinicError> {
        debug!(doctor_id, "forwarding appointments by doctor");
        self.observe(Operation::AppointmentsByDoctor, async {
            self.client
                .appointments_by_doctor(doctor_id)
                .await
                .map_err(|e| {
                    if e.is_not_found() {
                        ClinicError::DoctorNotFound(doctor_id)
                    } else {
                        ClinicError::retrieving(e)
                    }
                })
        })
        .await
    }

    /// Every failure of this query, including an upstream 404, is a
    /// service error.
    pub async fn appointments_by_specialization_and_date(
        &self,
        specialization: &str,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, ClinicError> {
        debug!(specialization, %date, "forwarding appointments by specialization and date");
        self.observe(Operation::AppointmentsBySpecializationAndDate, async {
            self.client
                .appointments_by_specialization_and_date(specialization, date)
                .await
                .map_err(ClinicError::retrieving)
        })
        .await
    }

    async fn observe<T>(
        &self,
        operation: Operation,
        call: impl Future<Output = Result<T, ClinicError>>,
    ) -> Result<T, ClinicError> {
        let start = Instant::now();
        let result = call.await;
        let label = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::increment_requests_total(operation.as_str(), label);
        metrics::observe_request_duration(operation.as_str(), start.elapsed().as_secs_f64());
        metrics::set_circuit_open(self.client.circuit_state() == CircuitState::Open);
        result
    }
}
