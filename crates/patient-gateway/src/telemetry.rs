use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub fn init() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("patient_gateway=info,clinic_api=info")),
        )
        .with(fmt::layer().json())
        .init();
}
