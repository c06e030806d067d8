use chrono::NaiveDate;
use clinic_types::Appointment;
use tracing::warn;

/// Degraded answers served while the circuit is open.
///
/// Lists come back empty and a booking comes back as an all-null
/// placeholder. Callers cannot tell these apart from a genuinely empty
/// upstream answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackResponder;

impl FallbackResponder {
    pub fn appointments_by_patient(&self, patient_id: i64) -> Vec<Appointment> {
        warn!(patient_id, "upstream unavailable, serving empty appointment list");
        Vec::new()
    }

    pub fn book_appointment(&self, _appointment: &Appointment, patient_id: i64) -> Appointment {
        warn!(patient_id, "upstream unavailable, serving placeholder booking");
        Appointment::default()
    }

    pub fn appointments_by_doctor(&self, doctor_id: i64) -> Vec<Appointment> {
        warn!(doctor_id, "upstream unavailable, serving empty appointment list");
        Vec::new()
    }

    pub fn appointments_by_specialization_and_date(
        &self,
        specialization: &str,
        date: NaiveDate,
    ) -> Vec<Appointment> {
        warn!(
            specialization,
            %date,
            "upstream unavailable, serving empty appointment list"
        );
        Vec::new()
    }
}
