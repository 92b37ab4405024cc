//! HostPulse viewer entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hostpulse_core::AppResult;
use hostpulse_viewer::client::fetch_window_capacity;
use hostpulse_viewer::output::{FrameSummary, OutputFormat, render};
use hostpulse_viewer::{MetricStore, ViewerClient};

/// Used when neither `--window` nor the server provides a capacity.
const FALLBACK_WINDOW: usize = 60;

/// Live terminal view of a HostPulse stream.
#[derive(Debug, Parser)]
#[command(name = "hostpulse-viewer", version, about)]
struct Cli {
    /// WebSocket endpoint
    #[arg(long, env = "HOSTPULSE_VIEWER_URL", default_value = "ws://127.0.0.1:5062/ws")]
    url: String,

    /// Rolling window capacity per stream [default: the server's `window.capacity`]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    window: Option<u64>,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let window = match cli.window {
        Some(window) => window as usize,
        None => fetch_window_capacity(&cli.url).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, fallback = FALLBACK_WINDOW, "Could not read server window capacity");
            FALLBACK_WINDOW
        }),
    };

    let mut client = ViewerClient::connect(&cli.url).await?;
    let mut store = MetricStore::new(window);

    loop {
        let snapshot = tokio::select! {
            next = client.next_snapshot() => next?,
            _ = tokio::signal::ctrl_c() => break,
        };
        let Some(snapshot) = snapshot else {
            eprintln!("Server closed the stream");
            return Ok(());
        };

        store.ingest(&snapshot);
        println!("{}", render(&FrameSummary::new(&snapshot, &store), cli.format));

        if cli.frames.is_some_and(|limit| store.frames() >= limit) {
            break;
        }
    }

    client.close().await
}
