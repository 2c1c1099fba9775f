use clap::Parser;
use spendwire_server::app::App;
use spendwire_server::config::ServerArgs;
use spendwire_server::network::shutdown_signal;
use spendwire_server::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();

    telemetry::init_tracing(args.log_level.as_deref(), args.log_format)?;
    if let Some(addr) = args.metrics_addr {
        telemetry::install_metrics_exporter(addr)?;
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "spendwire-server starting");

    let (app, port) = App::build(&args).await?;
    tracing::info!(port, "ready");

    app.run(shutdown_signal()).await?;
    tracing::info!("shutdown complete");
    Ok(())
}
