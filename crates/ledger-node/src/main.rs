mod api;
mod constants;
mod peer_client;

use api::AppState;
use clap::Parser;
use constants::{DEFAULT_LISTEN, DEFAULT_PEER_TIMEOUT_SECS};
use ledger_core::{pow::ProofSearch, Ledger, PeerRegistry};
use parking_lot::RwLock;
use peer_client::HttpChainSource;
use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tracing::{info, Level};
use uuid::Uuid;

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Recipient of mining rewards (random UUID when omitted)
    #[arg(long)]
    node_id: Option<String>,

    /// Peer URL to register at startup, e.g. http://127.0.0.1:8081 (repeatable)
    #[arg(long = "peer")]
    peers: Vec<String>,

    /// Per-peer timeout when fetching chains during resolution
    #[arg(long, default_value_t = DEFAULT_PEER_TIMEOUT_SECS)]
    peer_timeout_secs: u64,

    /// Resolve conflicts against all peers every N seconds
    #[arg(long)]
    resolve_interval_secs: Option<u64>,

    /// Give up a proof search after this many candidates
    #[arg(long)]
    max_proof_attempts: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let ledger = Ledger::new();
    anyhow::ensure!(ledger.len() == 1, "error occurred initializing the chain");

    let node_id = args
        .node_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    info!(%node_id, "node identifier");

    let mut registry = PeerRegistry::new();
    for peer in &args.peers {
        registry.register(peer, "configured at startup")?;
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let mut search = ProofSearch::new().with_cancel(Arc::clone(&cancel));
    if let Some(max) = args.max_proof_attempts {
        search = search.with_max_attempts(max);
    }

    let source = HttpChainSource::new(Duration::from_secs(args.peer_timeout_secs))?;
    let state = AppState {
        ledger: ledger.into_shared(),
        peers: Arc::new(RwLock::new(registry)),
        source: Arc::new(source),
        node_id: Arc::from(node_id),
        search,
    };

    if let Some(secs) = args.resolve_interval_secs.filter(|s| *s > 0) {
        spawn_auto_resolve(state.clone(), Duration::from_secs(secs));
    }

    let app = api::router(state);

    let addr: SocketAddr = args.listen.parse()?;
    info!("ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;
    Ok(())
}

/// Background resolution loop; the first pass runs one period after startup.
fn spawn_auto_resolve(state: AppState, period: Duration) {
    info!(?period, "auto-resolve enabled");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            ticker.tick().await;
            if api::resolve_with(&state).await {
                info!("auto-resolve adopted a longer chain");
            }
        }
    });
}

async fn shutdown_signal(cancel: Arc<AtomicBool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutting down");
    cancel.store(true, Ordering::Relaxed);
}
