pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod server;
pub mod service;
pub mod telemetry;
