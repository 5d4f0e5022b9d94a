use anyhow::{Context, Result};
use call_recorder::{create_router, AppState, CallRecorderBridge, Config, DesktopPlatform, EventPublisher};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "call-recorder", version, about = "Call-triggered recording service")]
struct Cli {
    /// Config file path (extension optional)
    #[arg(short, long, global = true, default_value = "config/call-recorder")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the recorder and its HTTP bridge
    Serve,
    /// Print the resolved configuration
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    match cli.command {
        Commands::Serve => serve(cfg).await,
        Commands::CheckConfig => {
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            Ok(())
        }
    }
}

async fn serve(cfg: Config) -> Result<()> {
    info!("Call Recorder v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Recordings directory: {}", cfg.recording.output_dir.display());

    let desktop = DesktopPlatform::new(&cfg);
    let capture = desktop.capture.clone();
    let permissions = Arc::clone(&desktop.permissions);

    let (bridge, controller_task) = CallRecorderBridge::new(&cfg, desktop.platform);
    let bridge = Arc::new(bridge);

    if cfg.nats.enabled {
        match EventPublisher::connect(&cfg.nats.url, cfg.nats.subject_prefix.clone()).await {
            Ok(publisher) => {
                publisher.spawn_forwarder(bridge.subscribe());
            }
            Err(e) => error!("NATS event forwarding disabled: {:#}", e),
        }
    }

    let state = AppState {
        bridge: Arc::clone(&bridge),
        capture,
        permissions,
        sample_rate: cfg.recording.sample_rate,
        channels: cfg.recording.channels,
    };

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP bridge listening on {}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    bridge.shutdown().await;
    if let Err(e) = controller_task.await {
        error!("Recorder controller panicked: {}", e);
    }

    info!("Call recorder stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
