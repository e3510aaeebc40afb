use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use event_console::api::state::AppState;
use event_console::config::AppConfig;
use event_console::models::EventId;
use event_console::reconcile::{build_ranking, compute_payouts, validate_disjoint};
use event_console::store::{EventStore, JsonlStore};

#[derive(Parser)]
#[command(name = "event-console")]
#[command(about = "Admin console engine for community gaming events")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides config)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Compute payouts for an event without applying them
    Preview {
        /// Event id
        event_id: String,

        /// Fail when prize ranges overlap
        #[arg(long)]
        strict: bool,
    },

    /// Compute and apply payouts for an event
    Close {
        /// Event id
        event_id: String,

        /// Fail when prize ranges overlap
        #[arg(long)]
        strict: bool,

        /// Compute but don't credit anything
        #[arg(long)]
        dry_run: bool,
    },
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let path = PathBuf::from(&cli.config);
    let mut config = if path.exists() {
        AppConfig::from_file(&path)?
    } else {
        AppConfig::default()
    };
    if let Some(ref dir) = cli.data_dir {
        config.data_dir = PathBuf::from(dir);
    }
    Ok(config)
}

async fn resolve_payouts(
    store: &JsonlStore,
    event_id: &EventId,
    strict: bool,
) -> Result<std::collections::BTreeMap<event_console::models::ParticipantId, u32>> {
    let event = store
        .get_event(event_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Event not found: {}", event_id))?;

    if strict {
        validate_disjoint(&event.prices)?;
    }

    let snapshot = store.fetch_ranking(event_id).await?;
    let ranking = build_ranking(&snapshot);
    Ok(compute_payouts(&ranking, &event.prices))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting event-console v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    let store = JsonlStore::new(config.data_dir.clone());

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let state = AppState::new(Arc::new(store), config.default_locale());
            let app = event_console::api::build_router(state);

            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Console API: http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Preview { event_id, strict } => {
            let event_id = EventId::from(event_id.as_str());
            let payouts = resolve_payouts(&store, &event_id, strict).await?;

            println!("\n=== Payout Preview ===");
            let mut total: u64 = 0;
            for (user, amount) in &payouts {
                println!("{:<20} {:>8}", user, amount);
                total += *amount as u64;
            }
            println!("{:<20} {:>8}", "total", total);
        }
        Commands::Close {
            event_id,
            strict,
            dry_run,
        } => {
            let event_id = EventId::from(event_id.as_str());
            let payouts = resolve_payouts(&store, &event_id, strict).await?;

            if dry_run {
                println!("\n=== Close (dry run) ===");
                for (user, amount) in &payouts {
                    println!("{:<20} {:>8}", user, amount);
                }
                println!("\n(dry run - no credits applied)");
                return Ok(());
            }

            let report = store.apply_payouts(&event_id, &payouts).await?;
            println!("\n=== Close Results ===");
            println!("Credited:       {}", report.credited.len());
            println!("Skipped:        {}", report.skipped.len());
            println!("Total credited: {}", report.total_credited);
        }
    }

    Ok(())
}
