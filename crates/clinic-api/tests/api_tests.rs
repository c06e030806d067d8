use std::time::Duration;

use chrono::NaiveDate;
use clinic_api::{
    ApiError, AppointmentClient, CircuitConfig, CircuitState, HttpClient, RetryPolicy,
};
use clinic_types::Appointment;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        period: Duration::from_millis(1),
        max_period: Duration::from_millis(10),
        max_attempts,
    }
}

fn two_appointments() -> serde_json::Value {
    json!([
        {"id": 1, "startTime": "2023-07-28T10:00:00", "endTime": "2023-07-28T11:00:00"},
        {"id": 2, "startTime": "2023-07-29T14:00:00", "endTime": "2023-07-29T15:00:00"}
    ])
}

// ---------------------------------------------------------------------------
// HttpClient tests
// ---------------------------------------------------------------------------

mod http_client {
    use super::*;

    #[test]
    fn new_with_valid_url() {
        assert!(HttpClient::new("http://localhost:8080").is_ok());
    }

    #[test]
    fn new_with_invalid_url() {
        let result = HttpClient::new("not a url");
        assert!(matches!(result.unwrap_err(), ApiError::InvalidUrl(_)));
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let client = HttpClient::new("http://example.com:9090/clinic").unwrap();
        assert_eq!(client.base_url().as_str(), "http://example.com:9090/clinic/");
    }

    #[test]
    fn debug_impl_shows_base_url() {
        let client = HttpClient::new("http://example.com:9090/").unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("HttpClient"), "got: {debug}");
        assert!(debug.contains("http://example.com:9090/"), "got: {debug}");
    }

    #[tokio::test]
    async fn get_returns_json_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doctors/4/appointments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_appointments()))
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let list: Vec<Appointment> = client.get("doctors/4/appointments").await.unwrap();
        assert_eq!(list.len(), 2);
    }

    #[tokio::test]
    async fn get_decodes_404_as_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Patient not found"))
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let err = client
            .get::<Vec<Appointment>>("appointments/999/appointments")
            .await
            .unwrap_err();
        match err {
            ApiError::NotFound { body } => assert_eq!(body, "Patient not found"),
            other => panic!("expected NotFound, got: {other}"),
        }
    }

    #[tokio::test]
    async fn get_decodes_503_as_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(503)
                    .insert_header("Retry-After", "120")
                    .set_body_json(json!({"message": "down for maintenance"})),
            )
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let err = client.get::<serde_json::Value>("anything").await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "503 Service Unavailable: [Service is unavailable]");
    }

    #[tokio::test]
    async fn get_returns_api_error_on_500() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        match client.get::<serde_json::Value>("anything").await.unwrap_err() {
            ApiError::ApiResponse { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "internal error");
            }
            other => panic!("expected ApiResponse, got: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_not_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let err = client.get::<Vec<Appointment>>("anything").await.unwrap_err();
        assert!(matches!(err, ApiError::Request(_)), "got: {err}");
        assert!(!err.is_retryable());
    }
}

// ---------------------------------------------------------------------------
// AppointmentClient tests
// ---------------------------------------------------------------------------

mod appointment_client {
    use super::*;

    #[tokio::test]
    async fn appointments_by_patient_returns_list_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/appointments/1/appointments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_appointments()))
            .expect(1)
            .mount(&server)
            .await;

        let client = AppointmentClient::new(&server.uri()).unwrap();
        let list = client.appointments_by_patient(1).await.unwrap();
        let ids: Vec<_> = list.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);
        assert_eq!(
            list[0].start_time,
            NaiveDate::from_ymd_opt(2023, 7, 28).unwrap().and_hms_opt(10, 0, 0)
        );
    }

    #[tokio::test]
    async fn book_appointment_posts_body_with_patient_id() {
        let server = MockServer::start().await;
        let request = json!({"id": null, "startTime": "2023-08-01T09:00:00", "endTime": "2023-08-01T09:30:00"});
        Mock::given(method("POST"))
            .and(path("/appointments"))
            .and(query_param("patientId", "7"))
            .and(body_json(&request))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 55,
                "startTime": "2023-08-01T09:00:00",
                "endTime": "2023-08-01T09:30:00"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AppointmentClient::new(&server.uri()).unwrap();
        let appointment: Appointment = serde_json::from_value(request).unwrap();
        let booked = client.book_appointment(&appointment, 7).await.unwrap();
        assert_eq!(booked.id, Some(55));
    }

    #[tokio::test]
    async fn appointments_by_doctor_surfaces_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doctors/9/appointments"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = AppointmentClient::new(&server.uri()).unwrap();
        let err = client.appointments_by_doctor(9).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(client.circuit_state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn specialization_is_percent_encoded_in_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/appointments/specialization/general%20practice/date/2023-07-28",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = AppointmentClient::new(&server.uri()).unwrap();
        let date = NaiveDate::from_ymd_opt(2023, 7, 28).unwrap();
        let list = client
            .appointments_by_specialization_and_date("general practice", date)
            .await
            .unwrap();
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn dot_only_specialization_never_reaches_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let client = AppointmentClient::new(&server.uri()).unwrap();
        let date = NaiveDate::from_ymd_opt(2023, 7, 28).unwrap();
        for specialization in ["..", "."] {
            let err = client
                .appointments_by_specialization_and_date(specialization, date)
                .await
                .unwrap_err();
            assert!(
                matches!(err, ApiError::InvalidSegment { ref segment } if segment == specialization),
                "got: {err}"
            );
        }
        assert_eq!(client.circuit_state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn dots_inside_specialization_stay_in_the_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/appointments/specialization/.../date/2023-07-28"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = AppointmentClient::new(&server.uri()).unwrap();
        let date = NaiveDate::from_ymd_opt(2023, 7, 28).unwrap();
        client
            .appointments_by_specialization_and_date("...", date)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn single_503_is_retried_to_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/appointments/1/appointments"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/appointments/1/appointments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_appointments()))
            .expect(1)
            .mount(&server)
            .await;

        let client = AppointmentClient::new(&server.uri())
            .unwrap()
            .with_retry_policy(fast_retry(5));
        let list = client.appointments_by_patient(1).await.unwrap();
        assert_eq!(list.len(), 2);
    }

    #[tokio::test]
    async fn default_policy_waits_out_a_503() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = AppointmentClient::new(&server.uri()).unwrap();
        let started = std::time::Instant::now();
        client.appointments_by_doctor(1).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(900));
    }

    #[tokio::test]
    async fn persistent_503_exhausts_attempt_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let client = AppointmentClient::new(&server.uri())
            .unwrap()
            .with_retry_policy(fast_retry(3));
        let err = client.appointments_by_patient(1).await.unwrap_err();
        assert!(matches!(err, ApiError::Retryable { status: 503, .. }));
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let client = AppointmentClient::new(&server.uri())
            .unwrap()
            .with_retry_policy(fast_retry(5));
        let err = client.appointments_by_doctor(3).await.unwrap_err();
        assert!(matches!(err, ApiError::ApiResponse { status: 500, .. }));
    }

    #[tokio::test]
    async fn connection_refused_is_retried() {
        // Bind and drop a listener to get a port nobody listens on.
        let uri = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}", listener.local_addr().unwrap())
        };

        let client = AppointmentClient::new(&uri)
            .unwrap()
            .with_retry_policy(fast_retry(2));
        let err = client.appointments_by_patient(1).await.unwrap_err();
        assert!(err.is_retryable(), "got: {err}");
    }
}

// ---------------------------------------------------------------------------
// Circuit breaker / fallback tests
// ---------------------------------------------------------------------------

mod fallback {
    use super::*;

    fn tripping_client(uri: &str, open: Duration) -> AppointmentClient {
        AppointmentClient::new(uri)
            .unwrap()
            .with_retry_policy(RetryPolicy::never())
            .with_circuit_breaker(CircuitConfig {
                enabled: true,
                failure_threshold: 2,
                open_duration: open,
            })
    }

    #[tokio::test]
    async fn open_circuit_serves_empty_lists_without_calling_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(2)
            .mount(&server)
            .await;

        let client = tripping_client(&server.uri(), Duration::from_secs(60));
        assert!(client.appointments_by_patient(1).await.is_err());
        assert!(client.appointments_by_patient(1).await.is_err());
        assert_eq!(client.circuit_state(), CircuitState::Open);

        assert!(client.appointments_by_patient(1).await.unwrap().is_empty());
        assert!(client.appointments_by_doctor(2).await.unwrap().is_empty());
        let date = NaiveDate::from_ymd_opt(2023, 7, 28).unwrap();
        assert!(
            client
                .appointments_by_specialization_and_date("cardiology", date)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn open_circuit_books_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
            .expect(0)
            .mount(&server)
            .await;

        let client = tripping_client(&server.uri(), Duration::from_secs(60));
        let _ = client.appointments_by_doctor(1).await;
        let _ = client.appointments_by_doctor(1).await;

        let booked = client
            .book_appointment(&Appointment::default(), 1)
            .await
            .unwrap();
        assert!(booked.is_placeholder());
    }

    #[tokio::test]
    async fn not_found_does_not_open_circuit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(4)
            .mount(&server)
            .await;

        let client = tripping_client(&server.uri(), Duration::from_secs(60));
        for _ in 0..4 {
            assert!(client.appointments_by_patient(1).await.unwrap_err().is_not_found());
        }
        assert_eq!(client.circuit_state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn circuit_closes_after_successful_trial() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_appointments()))
            .mount(&server)
            .await;

        let client = tripping_client(&server.uri(), Duration::from_millis(50));
        let _ = client.appointments_by_doctor(1).await;
        let _ = client.appointments_by_doctor(1).await;
        assert_eq!(client.circuit_state(), CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(80)).await;
        let list = client.appointments_by_doctor(1).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(client.circuit_state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn disabled_breaker_always_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(5)
            .mount(&server)
            .await;

        let client = AppointmentClient::new(&server.uri())
            .unwrap()
            .with_retry_policy(RetryPolicy::never())
            .with_circuit_breaker(CircuitConfig::disabled());
        for _ in 0..5 {
            assert!(client.appointments_by_patient(1).await.is_err());
        }
    }
}
