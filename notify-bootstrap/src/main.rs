use anyhow::Result;
use clap::Parser;

use notify_bootstrap::RunOptions;

#[derive(Parser, Debug)]
#[command(name = "cache-empty-notifier")]
#[command(about = "Notifies the application backend when a channel cache becomes empty", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,

    /// Read channel ids from stdin, one per line
    #[arg(long)]
    stdin: bool,

    /// Channels whose cache became empty
    channels: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var("CACHEWAKE_CONFIG", config);
    }

    notify_bootstrap::run_standalone(RunOptions {
        channels: args.channels,
        read_stdin: args.stdin,
    })
    .await
}
