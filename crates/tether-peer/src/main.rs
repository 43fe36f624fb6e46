use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tether_peer::{Console, PeerConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

#[derive(Parser)]
#[command(name = "tether-peer")]
#[command(about = "Tether chat peer")]
struct Cli {
    /// Nickname; prompted for when absent
    #[arg(short, long)]
    name: Option<String>,

    /// Registry base URL
    #[arg(short, long)]
    registry: Option<String>,

    /// Host to bind and advertise
    #[arg(long)]
    host: Option<String>,

    /// Port for the peer service (0 picks a free one)
    #[arg(short, long)]
    port: Option<u16>,

    /// Data root
    #[arg(long)]
    root: Option<PathBuf>,
}

fn init_tracing(root: &Path, identity: &str) -> tracing_appender::non_blocking::WorkerGuard {
    let log_file = tether_common::peer_log_file(root, identity);
    let log_dir = log_file.parent().unwrap_or(root).to_path_buf();
    let file_name = log_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "peer.log".to_string());

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tether_peer=info,tower_http=warn,info".into());

    // The terminal belongs to the chat; only warnings go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::filter::LevelFilter::WARN),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = PeerConfig::default();
    if let Some(registry) = cli.registry {
        config.registry_url = registry;
    }
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(root) = cli.root {
        config.data_root = root;
    }

    let mut console = Console::new();
    let identity = match cli.name {
        Some(name) => name,
        None => console.read_identity().await?,
    };

    let identity_dir = tether_common::identity_dir(&config.data_root, &identity);
    tether_common::ensure_dir(&identity_dir)
        .with_context(|| format!("Failed to create {:?}", identity_dir))?;
    let _guard = init_tracing(&config.data_root, &identity);

    let (session, state) = tether_peer::start(&config, &identity).await?;
    session
        .login()
        .await
        .with_context(|| format!("Login to {} failed", config.registry_url))?;

    console.run(session, state.subscribe()).await
}
