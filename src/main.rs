use clap::Parser;
use tracing_subscriber::EnvFilter;

use emon_gateway::{app::AppState, cli::Cli, config::GatewayCfg, http, writer::PointWriter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = GatewayCfg::load_with(cli.config.clone(), &cli.overrides())?;

    if cli.print_bind {
        println!("{}", cfg.http.bind);
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::info!(
        store = %cfg.store.url,
        database = %cfg.store.database,
        measurement = %cfg.store.measurement,
        auth = cfg.http.credential().is_some(),
        "starting gateway"
    );

    let writer = PointWriter::connect(&cfg.store).await?;
    let state = AppState::new(cfg, writer);
    let writer = state.writer.clone();

    let served = http::serve(state).await;
    writer.close();
    served
}
