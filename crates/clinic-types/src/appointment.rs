use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An appointment slot as exchanged with the clinic-medical service.
///
/// Every field is nullable: a booking request may omit `id`, and the
/// fallback placeholder carries no data at all.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, with = "crate::datetime::optional")]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default, with = "crate::datetime::optional")]
    pub end_time: Option<NaiveDateTime>,
}

impl Appointment {
    pub fn new(id: i64, start_time: NaiveDateTime, end_time: NaiveDateTime) -> Self {
        Self {
            id: Some(id),
            start_time: Some(start_time),
            end_time: Some(end_time),
        }
    }

    /// True for the all-null placeholder returned while the upstream is
    /// unavailable.
    pub fn is_placeholder(&self) -> bool {
        self.id.is_none() && self.start_time.is_none() && self.end_time.is_none()
    }
}
