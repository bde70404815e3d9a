//! Simon binary entrypoint wiring configuration, storage, the score service,
//! the peer relay and the terminal front-end around the game engine.

use std::sync::Arc;

use anyhow::Context;
use futures::StreamExt;
use time::UtcOffset;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use simon_engine::{
    config::AppConfig,
    dao::{
        score_api::HttpScoreApi,
        storage::{JsonFileStore, KeyValueStore, MemoryStore},
    },
    services::{
        console::{Command, ConsoleDisplay, ConsoleSound, help_text, parse_command},
        game_service::{EnginePorts, GameEngine},
        peer_channel::{DisconnectedBroadcaster, PeerBroadcast, WsPeerChannel, pump_inbound},
        ports::{DisplayPort, TokioClock},
        sequence::RandomGenerator,
    },
};

fn main() -> anyhow::Result<()> {
    // The local offset can only be read while the process is single threaded.
    let local_offset = UtcOffset::current_local_offset();
    init_tracing();
    let offset = local_offset.unwrap_or_else(|err| {
        warn!(error = %err, "local UTC offset unavailable; dating scores in UTC");
        UtcOffset::UTC
    });

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?
        .block_on(run(offset))
}

async fn run(offset: UtcOffset) -> anyhow::Result<()> {
    let config = AppConfig::load();
    let store = open_store(&config)?;
    let score_api =
        HttpScoreApi::new(&config.server_url).context("building score API client")?;
    info!(endpoint = score_api.endpoint(), ?offset, "score service configured");

    let display: Arc<dyn DisplayPort> = Arc::new(ConsoleDisplay::default());
    let peers = connect_relay(&config, display.clone()).await;

    let engine = GameEngine::from_config(
        &config,
        EnginePorts {
            display: display.clone(),
            sound: Arc::new(ConsoleSound),
            clock: Arc::new(TokioClock::with_offset(offset)),
            store,
            score_api: Arc::new(score_api),
            peers,
            generator: Arc::new(RandomGenerator),
        },
    )
    .context("building game engine")?;

    run_console(Arc::new(engine), display).await
}

/// Open the configured durable store, or keep the slots in memory.
fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    match &config.store_path {
        Some(path) => {
            let store = JsonFileStore::open(path)
                .with_context(|| format!("opening local store `{}`", path.display()))?;
            info!(path = %store.path().display(), "using local store file");
            Ok(Arc::new(store))
        }
        None => {
            info!("no store path configured; local scores are kept in memory");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Connect the peer relay once. When it is unreachable the game keeps running
/// without live notices.
async fn connect_relay(config: &AppConfig, display: Arc<dyn DisplayPort>) -> Arc<dyn PeerBroadcast> {
    let url = config.relay_url();
    match WsPeerChannel::connect(&url).await {
        Ok((channel, signals)) => {
            tokio::spawn(pump_inbound(signals, display));
            Arc::new(channel)
        }
        Err(err) => {
            warn!(error = %err, "relay unavailable; running without peer notices");
            Arc::new(DisconnectedBroadcaster)
        }
    }
}

/// Read commands from stdin until `quit`, end of input or a shutdown signal.
async fn run_console(engine: Arc<GameEngine>, display: Arc<dyn DisplayPort>) -> anyhow::Result<()> {
    println!("{}", help_text(engine.registry()));

    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
            line = lines.next() => {
                let Some(line) = line else {
                    info!("input closed");
                    break;
                };
                let line = line.context("reading stdin")?;

                match parse_command(&line, engine.registry()) {
                    Ok(None) => {}
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => dispatch(&engine, display.as_ref(), command),
                    Err(err) => warn!(error = %err, "rejected command"),
                }
            }
        }
    }

    Ok(())
}

/// Run one command. Session work is spawned so input keeps flowing while the
/// engine plays back; the engine itself ignores input it cannot accept.
fn dispatch(engine: &Arc<GameEngine>, display: &dyn DisplayPort, command: Command) {
    match command {
        Command::Start => {
            let engine = engine.clone();
            tokio::spawn(async move {
                if let Err(err) = engine.start_session().await {
                    error!(error = %err, "failed to start session");
                }
            });
        }
        Command::Press(id) => {
            let engine = engine.clone();
            tokio::spawn(async move {
                match engine.submit_input(&id).await {
                    Ok(outcome) => info!(element = %id, ?outcome, "input handled"),
                    Err(err) => warn!(element = %id, error = %err, "input rejected"),
                }
            });
        }
        Command::Name(name) => {
            if let Err(err) = engine.set_player_name(&name) {
                warn!(error = %err, "player name rejected");
            }
        }
        Command::Scores => display.show_high_scores(&engine.high_scores()),
        Command::Help => println!("{}", help_text(engine.registry())),
        Command::Quit => {}
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
