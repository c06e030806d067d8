use std::time::Duration;

use axum::body::Body;
use clinic_api::AppointmentClient;
use http::{Request, StatusCode};
use patient_gateway::server::{self, ServerState};
use patient_gateway::service::PatientService;
use patient_gateway::{error::ClinicError, metrics, routes};
use tower::ServiceExt;

async fn get(state: ServerState, uri: &str) -> (StatusCode, String) {
    let response = server::router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn healthz_is_always_ok() {
    let (status, body) = get(ServerState::new(), "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn readyz_follows_state() {
    let state = ServerState::new();
    let (status, body) = get(state.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, "patient routes not bound");

    state.set_ready();
    let (status, body) = get(state, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ready");
}

#[tokio::test]
async fn ready_once_patient_routes_are_bound() {
    // Readiness does not wait on the upstream, which is unreachable here.
    let client = AppointmentClient::new("http://127.0.0.1:9").unwrap();
    let state = ServerState::new();
    let rest = tokio::spawn(routes::run(0, PatientService::new(client), state.clone()));

    tokio::time::timeout(Duration::from_secs(5), async {
        while !state.is_ready() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("REST listener never became ready");

    let (status, body) = get(state, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ready");
    rest.abort();
}

#[tokio::test]
async fn metrics_exposes_gateway_series() {
    metrics::increment_requests_total(
        "appointments_by_patient",
        ClinicError::PatientNotFound(1).kind(),
    );
    metrics::set_circuit_open(true);

    let (status, body) = get(ServerState::new(), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body.contains("patient_gateway_requests_total"),
        "metrics body: {body}"
    );
    assert!(body.contains("result=\"patient_not_found\""), "metrics body: {body}");
    assert!(body.contains("patient_gateway_circuit_open 1"), "metrics body: {body}");
}
