use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tonic::transport::Channel;
use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::health_client::HealthClient;
use tonic_health::pb::HealthCheckRequest;

#[derive(Parser)]
#[command(name = "service-probe")]
#[command(about = "Health probe for nginx-service listeners", long_about = None)]
struct Cli {
    /// Give up after this many seconds
    #[arg(short, long, default_value_t = 5)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the HTTP liveness endpoint
    Http {
        #[arg(short, long, default_value = "http://localhost:4001")]
        url: String,
    },
    /// Run the RPC health check
    Grpc {
        #[arg(short, long, default_value = "http://localhost:50051")]
        url: String,

        /// Service to check; empty means the server as a whole
        #[arg(short, long, default_value = "")]
        service: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let timeout = Duration::from_secs(cli.timeout);

    let healthy = match cli.command {
        Commands::Http { url } => probe_http(&url, timeout).await?,
        Commands::Grpc { url, service } => probe_grpc(url, service, timeout).await?,
    };

    Ok(if healthy {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn probe_http(url: &str, timeout: Duration) -> Result<bool, Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let res = client
        .get(format!("{}/health", url.trim_end_matches('/')))
        .send()
        .await?;

    let status = res.status();
    if status.is_success() {
        println!("HTTP {url}: healthy ({status})");
        return Ok(true);
    }

    eprintln!("Error: {url} returned status {status}");
    if let Ok(text) = res.text().await {
        if !text.is_empty() {
            eprintln!("Response: {text}");
        }
    }
    Ok(false)
}

async fn probe_grpc(
    url: String,
    service: String,
    timeout: Duration,
) -> Result<bool, Box<dyn std::error::Error>> {
    let check = async {
        let channel = Channel::from_shared(url.clone())?.connect().await?;
        let mut client = HealthClient::new(channel);
        let response = client
            .check(HealthCheckRequest {
                service: service.clone(),
            })
            .await?;
        Ok::<_, Box<dyn std::error::Error>>(response.into_inner().status)
    };
    let status = tokio::time::timeout(timeout, check).await??;

    let label = ServingStatus::try_from(status)
        .map(|s| s.as_str_name())
        .unwrap_or("UNKNOWN");
    let target = if service.is_empty() { "<server>" } else { service.as_str() };

    if status == ServingStatus::Serving as i32 {
        println!("gRPC {url} {target}: {label}");
        Ok(true)
    } else {
        eprintln!("Error: gRPC {url} {target}: {label}");
        Ok(false)
    }
}
