use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Patient record as published by the clinic-medical service.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PatientDto {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub id_card_no: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Doctor record as published by the clinic-medical service.
///
/// The password field is accepted on input but never written back out.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDto {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub clinic_ids: BTreeSet<i64>,
}

/// Locally owned patient entity. Mirrors [`PatientDto`] minus the linked
/// user account.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Option<i64>,
    pub email: String,
    pub id_card_no: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub birthday: Option<NaiveDate>,
}

impl From<PatientDto> for Patient {
    fn from(dto: PatientDto) -> Self {
        Self {
            id: dto.id,
            email: dto.email.unwrap_or_default(),
            id_card_no: dto.id_card_no.unwrap_or_default(),
            first_name: dto.first_name.unwrap_or_default(),
            last_name: dto.last_name.unwrap_or_default(),
            phone_number: dto.phone_number.unwrap_or_default(),
            birthday: dto.birthday,
        }
    }
}

impl From<&Patient> for PatientDto {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id,
            email: Some(patient.email.clone()),
            id_card_no: Some(patient.id_card_no.clone()),
            first_name: Some(patient.first_name.clone()),
            last_name: Some(patient.last_name.clone()),
            phone_number: Some(patient.phone_number.clone()),
            birthday: patient.birthday,
            user_id: None,
        }
    }
}
