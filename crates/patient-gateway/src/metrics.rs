use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

lazy_static::lazy_static! {
    pub static ref REQUESTS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        Opts::new(
            "patient_gateway_requests_total",
            "Total number of forwarded requests"
        ),
        &["operation", "result"]
    )
    .unwrap();

    pub static ref REQUEST_DURATION: HistogramVec = prometheus::register_histogram_vec!(
        HistogramOpts::new(
            "patient_gateway_request_duration_seconds",
            "Duration of forwarded requests in seconds, retries included"
        ),
        &["operation"]
    )
    .unwrap();

    pub static ref CIRCUIT_OPEN: IntGauge = prometheus::register_int_gauge!(
        Opts::new(
            "patient_gateway_circuit_open",
            "1 while the upstream circuit breaker is open"
        )
    )
    .unwrap();
}

pub fn increment_requests_total(operation: &str, result: &str) {
    REQUESTS_TOTAL.with_label_values(&[operation, result]).inc();
}

pub fn observe_request_duration(operation: &str, duration_secs: f64) {
    REQUEST_DURATION
        .with_label_values(&[operation])
        .observe(duration_secs);
}

pub fn set_circuit_open(open: bool) {
    CIRCUIT_OPEN.set(i64::from(open));
}
