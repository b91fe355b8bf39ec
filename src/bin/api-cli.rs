use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "api-cli")]
#[command(about = "Inspect a running route host", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// API prefix the host mounts its routes under.
    #[arg(short, long, default_value = "/api")]
    prefix: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List loaded routes by category, with load errors
    Docs,
    /// Show host identity, uptime and memory
    Status,
    /// Check liveness
    Health,
    /// Show route, category and method counts
    Stats,
}

impl Commands {
    fn path(&self) -> &'static str {
        match self {
            Commands::Docs => "/docs",
            Commands::Status => "/status",
            Commands::Health => "/health",
            Commands::Stats => "/stats",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let url = format!(
        "{}{}{}",
        cli.url.trim_end_matches('/'),
        cli.prefix.trim_end_matches('/'),
        cli.command.path()
    );
    let res = client.get(url).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: host returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
