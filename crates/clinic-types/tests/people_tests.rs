use chrono::NaiveDate;
use clinic_types::*;
use serde_json::json;

#[test]
fn patient_dto_round_trips_camel_case_fields() {
    let dto: PatientDto = serde_json::from_value(json!({
        "id": 7,
        "email": "jan@example.com",
        "idCardNo": "ABC123456",
        "firstName": "Jan",
        "lastName": "Kowalski",
        "phoneNumber": "+48 600 100 200",
        "birthday": "1990-04-12",
        "userId": 42
    }))
    .unwrap();

    assert_eq!(dto.id_card_no.as_deref(), Some("ABC123456"));
    assert_eq!(dto.birthday, NaiveDate::from_ymd_opt(1990, 4, 12));
    assert_eq!(dto.user_id, Some(42));
}

#[test]
fn doctor_dto_never_serializes_password() {
    let dto: DoctorDto = serde_json::from_value(json!({
        "id": 3,
        "email": "doc@example.com",
        "password": "hunter2",
        "specialization": "cardiology",
        "clinicIds": [2, 1, 2]
    }))
    .unwrap();
    assert_eq!(dto.password.as_deref(), Some("hunter2"));
    assert_eq!(dto.clinic_ids.len(), 2);

    let out = serde_json::to_value(&dto).unwrap();
    assert!(out.get("password").is_none());
    assert_eq!(out["clinicIds"], json!([1, 2]));
}

#[test]
fn patient_from_dto_drops_user_link() {
    let dto = PatientDto {
        id: Some(5),
        first_name: Some("Anna".into()),
        user_id: Some(99),
        ..Default::default()
    };
    let patient = Patient::from(dto);
    assert_eq!(patient.id, Some(5));
    assert_eq!(patient.first_name, "Anna");
    assert_eq!(patient.last_name, "");

    let back = PatientDto::from(&patient);
    assert_eq!(back.user_id, None);
    assert_eq!(back.first_name.as_deref(), Some("Anna"));
}
