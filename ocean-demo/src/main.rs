//! OceanGPT demo server - Main entry point
//!
//! Serves the control API, or with `--play` runs one scenario headless and
//! logs what it did.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ocean_common::config::ConfigResolver;
use ocean_demo::api::{self, AppContext};
use ocean_demo::catalog::{EntityCatalog, MockCatalog};
use ocean_demo::config::{ConfigOverrides, DemoConfig};
use ocean_demo::conversation::ChatService;
use ocean_demo::playback::ScenarioPlayer;
use ocean_demo::responder::{CannedResponder, QueryResponder};
use ocean_demo::scenario::ScenarioLibrary;
use ocean_demo::state::SharedState;
use ocean_demo::viewer::{spawn_viewer_bridge, LoggingViewer};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for ocean-demo
#[derive(Parser, Debug)]
#[command(name = "ocean-demo")]
#[command(about = "OceanGPT demo server with scenario playback")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "OCEANGPT_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "OCEANGPT_HOST")]
    host: Option<String>,

    /// Config file (overrides OCEANGPT_CONFIG and the default locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Wall-clock milliseconds per scenario-step second
    #[arg(long, env = "OCEANGPT_STEP_UNIT_MS")]
    step_unit_ms: Option<u64>,

    /// Delay before the assistant answers a user message
    #[arg(long, env = "OCEANGPT_REPLY_DELAY_MS")]
    reply_delay_ms: Option<u64>,

    /// Log filter used when RUST_LOG is unset (e.g. "debug")
    #[arg(long, env = "OCEANGPT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Run one scenario without the HTTP server, then exit
    #[arg(long, value_name = "SCENARIO_ID")]
    play: Option<String>,

    /// List the built-in scenarios and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let file_config = ConfigResolver::new("ocean-demo")
        .with_path(args.config.clone())
        .resolve();
    let config = DemoConfig::resolve(
        &file_config,
        &ConfigOverrides {
            host: args.host.clone(),
            port: args.port,
            step_unit_ms: args.step_unit_ms,
            reply_delay_ms: args.reply_delay_ms,
            log_level: args.log_level.clone(),
        },
    )
    .context("Invalid configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(&config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let library = Arc::new(ScenarioLibrary::builtin().context("Invalid built-in scenario")?);

    if args.list {
        for scenario in library.list() {
            println!(
                "{:<24} {:>5.1}s  {}",
                scenario.id(),
                scenario.duration_secs(),
                scenario.title()
            );
        }
        return Ok(());
    }

    info!("Starting OceanGPT demo v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Step unit {:?}, reply delay {} ms",
        config.step_unit, config.reply_delay_ms
    );

    // Collaborators
    let catalog = Arc::new(MockCatalog::demo(config.catalog_latency));
    let responder: Arc<dyn QueryResponder> = Arc::new(CannedResponder::new(
        Arc::clone(&catalog),
        config.responder_latency_ms,
    ));

    // Shared state and services
    let state = Arc::new(SharedState::new());
    let chat = ChatService::new(
        Arc::clone(&state.conversation),
        Arc::clone(&responder),
        state.events.clone(),
        config.reply_delay_ms,
    );
    let player = Arc::new(ScenarioPlayer::new(
        Arc::clone(&state),
        Arc::clone(&library),
        config.step_unit,
    ));
    let viewer = spawn_viewer_bridge(state.subscribe_events(), Arc::new(LoggingViewer));

    if let Some(scenario_id) = args.play {
        play_headless(&state, &player, &scenario_id).await?;
        viewer.abort();
        return Ok(());
    }

    let ctx = AppContext {
        state,
        player,
        chat,
        catalog: catalog as Arc<dyn EntityCatalog>,
        responder,
    };

    let addr = config.bind_address()?;
    api::run(addr, ctx, shutdown_signal())
        .await
        .context("Server error")?;

    viewer.abort();
    info!("Server shutdown complete");
    Ok(())
}

/// Default tracing filter for a bare level such as "info"
fn default_filter(level: &str) -> String {
    if level.contains('=') {
        level.to_string()
    } else {
        format!(
            "ocean_demo={level},ocean_common={level},tower_http={level}",
            level = level
        )
    }
}

/// Run one scenario to completion (or Ctrl+C) and log the outcome
async fn play_headless(
    state: &Arc<SharedState>,
    player: &Arc<ScenarioPlayer>,
    scenario_id: &str,
) -> Result<()> {
    let mut rx = state.subscribe_events();
    let generation = player
        .start_by_id(scenario_id)
        .await
        .with_context(|| format!("Cannot play '{}'", scenario_id))?;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(ocean_common::OceanEvent::ScenarioCompleted { generation: g, .. }) if g == generation => break,
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Headless playback missed {} events", n);
                    if !player.is_running().await {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            _ = &mut shutdown => {
                player.stop().await;
                break;
            }
        }
    }

    for message in state.conversation.messages().await {
        info!("[{}] {}", message.role, message.content);
    }
    info!(
        "Selection: {:?}, highlighted: {:?}",
        state.selection.current().await,
        state.selection.highlighted().await
    );
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
