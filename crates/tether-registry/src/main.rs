use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tether_registry::RegistryConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "tether-registry")]
#[command(about = "Tether presence registry")]
struct Cli {
    /// Address to listen on
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Directory for registry.log
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn init_tracing(log_dir: &std::path::Path) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(log_dir, "registry.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tether_registry=info,tower_http=warn,info".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
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

    let mut config = RegistryConfig::default();
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if let Some(log_dir) = cli.log_dir {
        config.log_dir = log_dir;
    }

    tether_common::ensure_dir(&config.log_dir)
        .with_context(|| format!("Failed to create log dir {:?}", config.log_dir))?;
    let _guard = init_tracing(&config.log_dir);

    tether_registry::run(config).await
}
