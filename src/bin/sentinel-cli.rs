use clap::{Parser, Subcommand};
use reqwest::StatusCode;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "sentinel-cli")]
#[command(about = "Query a running endpoint-sentinel", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full health report (exits 2 when degraded)
    Health,
    /// Per-endpoint booleans
    Summary,
    /// Detail for one endpoint, by name or 1-based position
    Endpoint {
        id: String,
    },
    /// Service info and monitored endpoints
    Info,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let path = match &cli.command {
        Commands::Health => "/health".to_string(),
        Commands::Summary => "/health/summary".to_string(),
        Commands::Endpoint { id } => format!("/health/{}", id),
        Commands::Info => "/".to_string(),
    };

    let res = client.get(format!("{}{}", base, path)).send().await?;
    let degraded = print_response(res).await?;
    if degraded {
        std::process::exit(2);
    }

    Ok(())
}

/// Pretty-print the body. Returns true when the monitor reported degraded.
async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() && status != StatusCode::SERVICE_UNAVAILABLE {
        eprintln!("Error: monitor returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(status == StatusCode::SERVICE_UNAVAILABLE)
}
