//! Signstream CLI
//!
//! Drives the sign recognizer against replayed classifier traces: loads the
//! model catalog, activates the default model, polls frames on a fixed
//! cadence and prints every stabilized emission.

use anyhow::Result;
use clap::Parser;
use signstream_recognizer::{
    EventBus, ManagerConfig, ModelManager, RecognitionEvent, RecognitionSession,
    StabilizationEngine,
};
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

mod config;
mod replay;

use config::{SignstreamConfig, SwitchAt};
use replay::{ReplayLoader, TickFrameSource};

#[derive(Parser, Debug)]
#[command(name = "signstream")]
#[command(about = "Stabilized sign language recognition over replayed classifier output", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "signstream.yaml")]
    config: String,

    /// Model key activated at startup
    #[arg(short, long)]
    model: Option<String>,

    /// Minimum top probability for an observation to count
    #[arg(short, long)]
    threshold: Option<f32>,

    /// Consecutive matching observations required before emitting
    #[arg(short = 'n', long)]
    consecutive: Option<u32>,

    /// Emit once per stable streak instead of on every qualifying frame
    #[arg(long)]
    edge: bool,

    /// Frame polling interval in milliseconds
    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// Stop after this many frames (0 = until Ctrl+C)
    #[arg(short, long)]
    frames: Option<u64>,

    /// Switch model after a number of frames, as FRAME:KEY (repeatable)
    #[arg(long = "switch", value_name = "FRAME:KEY")]
    switches: Vec<SwitchAt>,

    /// Print events as JSON lines instead of text
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("Starting Signstream");

    let config = SignstreamConfig::load(&cli.config, &cli)?;
    info!("Configuration loaded successfully");
    info!(
        "Threshold: {:.2}, consecutive: {}, mode: {:?}",
        config.recognition.confidence_threshold,
        config.recognition.required_consecutive,
        config.recognition.emission_mode
    );
    info!("Catalog: {} models", config.catalog.models.len());

    // Trace locators are relative to the configuration file
    let base_dir = Path::new(&cli.config)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let events = Arc::new(EventBus::default());
    let printer = tokio::spawn(print_events(events.subscribe(), cli.json));
    let session = build_session(&config, base_dir, Arc::clone(&events))?;
    drop(events);

    session.switch_model(&config.default_model).await?;

    let shutdown = {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            shutdown_signal().await;
            warn!("Shutdown signal received, stopping recognition...");
            session.stop();
        })
    };

    let ticks = drive(&session, &config).await;

    shutdown.abort();
    let _ = shutdown.await;

    let stats = session.stats().snapshot();
    info!(
        "Processed {} ticks: {} observations, {} emissions ({:.1}%), {} malformed, {} classifier failures, {} stale",
        ticks,
        stats.observations,
        stats.emissions,
        stats.emission_rate() * 100.0,
        stats.malformed,
        stats.classifier_failures,
        stats.stale_discarded
    );
    info!("Average inference latency: {}us", stats.avg_inference_latency_us());

    session.manager().shutdown();
    drop(session);
    let _ = printer.await;

    info!("Shutdown complete");
    Ok(())
}

/// Wire the replay provider, the catalog and the engine into a session
fn build_session(
    config: &SignstreamConfig,
    base_dir: &Path,
    events: Arc<EventBus>,
) -> Result<Arc<RecognitionSession>> {
    let loader = Arc::new(ReplayLoader::new(base_dir));
    let engine = StabilizationEngine::new(config.recognition.clone())?;
    let manager = Arc::new(ModelManager::with_config(
        loader,
        engine,
        ManagerConfig::with_load_timeout(config.load_timeout()),
    ));
    manager.register_catalog(&config.catalog)?;

    let session = RecognitionSession::new(manager, Arc::new(TickFrameSource::new()));
    Ok(Arc::new(session.with_events(events)))
}

/// Run the polling loop, applying scheduled switches between segments
async fn drive(session: &RecognitionSession, config: &SignstreamConfig) -> u64 {
    let period = config.poll_interval();
    let limit = config.frame_limit();

    let mut switches = config.switches.clone();
    switches.sort_by_key(|s| s.frame);

    let mut ticks = 0u64;
    for switch in switches {
        let target = limit.map_or(switch.frame, |limit| switch.frame.min(limit));
        ticks += session.run(period, Some(target.saturating_sub(ticks))).await;

        if session.is_stopped() || limit.is_some_and(|limit| ticks >= limit) {
            return ticks;
        }

        if let Err(e) = session.switch_model(&switch.key).await {
            error!("Scheduled switch to '{}' failed: {}", switch.key, e);
        }
    }

    ticks + session.run(period, limit.map(|limit| limit.saturating_sub(ticks))).await
}

/// Print recognized signs until the session goes away
async fn print_events(mut events: tokio::sync::broadcast::Receiver<RecognitionEvent>, json: bool) {
    loop {
        match events.recv().await {
            Ok(event) if json => match event.to_json() {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to encode event: {}", e),
            },
            Ok(RecognitionEvent::Emitted { model, emission }) => {
                println!(
                    "[{}] {} ({:.1}%)",
                    model,
                    emission.label,
                    emission.probability * 100.0
                );
            }
            Ok(RecognitionEvent::ModelSwitched { key, name }) => {
                println!("-- model: {} ({})", name, key);
            }
            Ok(RecognitionEvent::SwitchFailed { key, reason }) => {
                println!("-- could not load '{}': {}", key, reason);
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Event printer lagged, {} events skipped", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("signstream=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("signstream=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
