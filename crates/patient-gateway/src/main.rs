use anyhow::Result;
use clap::{Parser, Subcommand};
use patient_gateway::config::GatewayConfig;
use patient_gateway::service::PatientService;
use patient_gateway::{routes, server, telemetry};
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "patient-gateway",
    about = "Patient Gateway: REST front for clinic-medical appointments"
)]
struct Cli {
    /// Base URL of the clinic-medical service (overrides CLINIC_MEDICAL_URL).
    #[arg(long)]
    upstream_url: Option<String>,

    /// Port for the REST API (overrides GATEWAY_PORT).
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved configuration as JSON.
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();

    let cli = Cli::parse();

    let mut config = GatewayConfig::from_env();
    if let Some(url) = cli.upstream_url {
        config.upstream_url = url;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    if let Some(Commands::Config) = cli.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let client = config.build_client()?;
    info!(
        upstream = %config.upstream_url,
        circuit_breaker = config.circuit_breaker_enabled,
        "upstream client configured"
    );
    let service = PatientService::new(client);
    let state = server::ServerState::new();

    // Run the REST API and the metrics/health server side by side.
    // If either exits, shut down.
    tokio::select! {
        res = server::run(config.metrics_port, state.clone()) => {
            error!("metrics server exited: {res:?}");
            res
        }
        res = routes::run(config.port, service, state) => {
            error!("gateway server exited: {res:?}");
            res
        }
    }
}
