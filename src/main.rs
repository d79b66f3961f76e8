//! Route discovery control plane.
//!
//! # Architecture Overview
//!
//! ```text
//!     graph snapshot (TOML)
//!            │
//!            ▼
//!     ┌──────────────┐     ┌──────────────┐     ┌──────────────────┐
//!     │ GraphWatcher │────▶│ update task  │────▶│    RouteCache    │
//!     │  (notify)    │ Dag │ (on_change)  │     │ sort → translate │
//!     └──────────────┘     └──────────────┘     │ → atomic swap    │
//!                                               └────────┬─────────┘
//!                                                        │ read_all /
//!                                                        │ read_by_names
//!                                                        ▼
//!                                               ┌──────────────────┐
//!                                               │   admin server   │
//!                                               │ status / routes  │
//!                                               │ / watch          │
//!                                               └──────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use route_discovery::admin::{self, AdminState};
use route_discovery::config::{load_config, load_graph, ControlPlaneConfig, GraphWatcher};
use route_discovery::dag::Dag;
use route_discovery::lifecycle::{signals, startup, Shutdown};
use route_discovery::observability::{logging, metrics};
use route_discovery::xdscache::{Observer, ResourceCache, RouteCache};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "route-discovery")]
#[command(about = "Serve route configurations built from a routing graph", long_about = None)]
struct Cli {
    /// Control plane configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Routing graph snapshot; overrides `graph.path` from the config.
    #[arg(short, long)]
    graph: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the control plane (default)
    Serve,
    /// Print the route configurations built from the graph and exit
    Dump {
        /// Only print these route configurations, in this order
        #[arg(long, value_delimiter = ',')]
        names: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ControlPlaneConfig::default(),
    };
    if let Some(graph) = cli.graph {
        config.graph.path = Some(graph);
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Dump { names } => dump(&config, &names),
        Commands::Serve => serve(config).await,
    }
}

fn initial_graph(config: &ControlPlaneConfig) -> Result<Dag, Box<dyn std::error::Error>> {
    match &config.graph.path {
        Some(path) => Ok(load_graph(path)?),
        None => Ok(Dag::default()),
    }
}

fn dump(config: &ControlPlaneConfig, names: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let cache = RouteCache::new();
    cache.on_change(&initial_graph(config)?);

    let resources = if names.is_empty() {
        cache.read_all()
    } else {
        cache.read_by_names(names)
    };
    println!("{}", serde_json::to_string_pretty(&resources)?);
    Ok(())
}

async fn serve(config: ControlPlaneConfig) -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging(&config.observability)?;

    tracing::info!("route-discovery v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        graph = ?config.graph.path,
        watch = config.graph.watch,
        admin_enabled = config.admin.enabled,
        admin_address = %config.admin.bind_address,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let cache = Arc::new(RouteCache::new());
    cache.on_change(&initial_graph(&config)?);

    let mut shutdown = Shutdown::new();

    // Kept alive for as long as the process serves.
    let _watcher = match (&config.graph.path, config.graph.watch) {
        (Some(path), true) => {
            let (watcher, updates) =
                GraphWatcher::new(path, Duration::from_secs(config.graph.poll_interval_secs));
            let handle = watcher.run()?;
            let task = startup::spawn_graph_updates(cache.clone(), updates, shutdown.subscribe());
            shutdown.track(task);
            Some(handle)
        }
        _ => None,
    };

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let router = admin::setup_admin_router(AdminState::new(cache.clone(), &config.admin.api_key));
        let admin_shutdown = shutdown.subscribe();
        shutdown.track(tokio::spawn(async move {
            if let Err(e) = admin::serve(listener, router, admin_shutdown).await {
                tracing::error!(error = %e, "Admin server failed");
            }
        }));
    }

    signals::wait_for_signal().await;

    let aborted = shutdown.drain(SHUTDOWN_GRACE).await;
    if aborted > 0 {
        tracing::warn!(aborted, "Tasks did not stop within the grace period");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
