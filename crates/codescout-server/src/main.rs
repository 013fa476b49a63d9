use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codescout-server")]
#[command(author, version, about = "CodeScout HTTP API Server", long_about = None)]
struct Cli {
    /// Database path
    #[arg(short, long, default_value = ".codescout/cache.db")]
    database: PathBuf,

    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// GitLab instance URL
    #[arg(long, env = "CODESCOUT_BASE_URL")]
    base_url: Option<String>,

    /// Personal access token (overrides the saved one)
    #[arg(long, env = "CODESCOUT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Verbose output
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "codescout=debug,tower_http=debug"
    } else {
        "codescout=info,tower_http=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    codescout_server::start(cli.database, cli.port, cli.base_url, cli.token).await?;

    Ok(())
}
