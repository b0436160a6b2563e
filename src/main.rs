//! pose2rig - Webcam tracking to Live2D rig parameters
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pose2rig::{
    avatar::ModelRegistry,
    config::Config,
    landmarks::MeshTopology,
    output::broadcast::{BroadcastRenderer, BroadcastStatus},
    session::run_session,
    tracking::udp::{UdpLandmarkSource, UdpPoseSource},
    web::WebServer,
    AppState,
};

/// pose2rig - Drive a Live2D avatar from face and pose tracking
#[derive(Parser, Debug)]
#[command(name = "pose2rig", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Avatar model to load at startup (overrides config)
    #[arg(short, long)]
    model: Option<String>,

    /// Pause tracking when the display loses focus
    #[arg(long)]
    auto_pause: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", pose2rig::NAME, pose2rig::VERSION);

    let config = load_config(&args)?;

    info!("Model: {} (from {})", config.animation.model, config.animation.models_dir.display());
    info!(
        "Inference ports: landmarks {}, pose {}",
        config.inference.landmark_port, config.inference.pose_port
    );
    info!("HTTP server: {}", config.http.enabled);

    // Capture must be reachable before anything else starts
    let mut landmarks = UdpLandmarkSource::new(&config.inference, MeshTopology::FACEMESH_468);
    landmarks.start().await?;
    let mut poses = UdpPoseSource::new(&config.inference);
    poses.start().await?;

    let (state, events_rx) = AppState::new(config.clone());

    if config.http.enabled {
        let server = WebServer::new(Arc::clone(&state), &config);
        tokio::spawn(async move {
            if let Err(e) = server.serve().await {
                error!("HTTP server error: {}", e);
            }
        });
    }

    let renderer = BroadcastRenderer::new(
        Arc::clone(&state),
        ModelRegistry::new(config.animation.models_dir.clone()),
    );
    let status = BroadcastStatus::new(Arc::clone(&state));
    let shutdown_rx = state.subscribe_shutdown();
    let mut session = tokio::spawn(async move {
        run_session(landmarks, poses, renderer, status, &config, events_rx, shutdown_rx).await
    });

    // Wait for Ctrl+C / SIGTERM, or for the session to end on its own
    let finished = tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
            None
        }
        result = &mut session => Some(result),
    };
    state.shutdown();
    let result = match finished {
        Some(result) => result,
        None => session.await,
    };

    // Give the HTTP server a moment to drain
    tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;

    result??;
    info!("pose2rig stopped");
    Ok(())
}

/// Load the config file and apply CLI overrides
fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    if let Some(port) = args.port {
        config.http.port = port;
    }
    if let Some(ref model) = args.model {
        config.animation.model = model.clone();
    }
    if args.auto_pause {
        config.animation.auto_pause = true;
    }

    config.validate()?;
    Ok(config)
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
