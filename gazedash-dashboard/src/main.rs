use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use gazedash_core::{Event, GazeDashConfig, HttpSessionGateway, SessionGateway};
use gazedash_dashboard::{
    aggregate_attention, derive_view, join_cycle, render, CycleOutcome, FetchScope,
    SessionController, SessionState, SortDirection, TypeFilter, ViewStatus,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "GazeDash: driver-monitoring session dashboard", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "gazedash.toml")]
    config: String,

    /// Session API base URL (overrides the config file)
    #[arg(long, env = "GAZEDASH_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List recorded sessions
    Sessions,

    /// Show one session: metadata, metrics and its event table
    Show {
        id: String,

        /// Event type to show, or "all"
        #[arg(long = "type", default_value = "all")]
        kind: TypeFilter,

        /// Sort by timestamp: asc or desc
        #[arg(long, default_value = "asc")]
        sort: SortDirection,
    },

    /// Chart a session's attention level in fixed-width time bins
    Timeline {
        id: String,

        /// Bin width in seconds (defaults to [timeline] bin_seconds)
        #[arg(long)]
        bin: Option<u32>,

        /// Print buckets as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Append events from a JSON file (an array of events) to a session
    Append { id: String, file: PathBuf },

    /// Read session ids from stdin; each line switches the view to that session
    Browse {
        #[arg(long = "type", default_value = "all")]
        kind: TypeFilter,

        #[arg(long, default_value = "asc")]
        sort: SortDirection,
    },

    /// Check that the session API is reachable
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = match GazeDashConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };
    if let Some(url) = args.api_url {
        config.api.base_url = url;
    }

    // Logs go to stderr so stdout stays clean for tables and JSON.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let gateway: Arc<dyn SessionGateway> = Arc::new(HttpSessionGateway::from_config(&config.api)?);
    tracing::debug!(base_url = %config.api.base_url, "Session API configured");

    match args.command {
        Commands::Sessions => {
            let sessions = gateway
                .list_sessions(None)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            print!("{}", render::render_sessions(&sessions));
        }
        Commands::Show { id, kind, sort } => {
            let mut controller = SessionController::new(gateway);
            let outcome = controller.load(&id).await;
            exit_on_failure(&outcome);
            print!("{}", render_detail(&controller.state(), &kind, sort));
        }
        Commands::Timeline { id, bin, json } => {
            let bin = bin.unwrap_or(config.timeline.bin_seconds);
            let mut controller = SessionController::new(gateway).with_scope(FetchScope::EventsOnly);
            let outcome = controller.load(&id).await;
            exit_on_failure(&outcome);

            let buckets = aggregate_attention(&controller.state().events, bin);
            if json {
                println!("{}", serde_json::to_string_pretty(&buckets)?);
            } else {
                println!("Timeline - Session {}", id);
                print!("{}", render::render_timeline(&buckets, bin));
            }
        }
        Commands::Append { id, file } => {
            let raw = tokio::fs::read_to_string(&file).await?;
            let events: Vec<Event> = serde_json::from_str(&raw)?;
            tracing::info!(session_id = %id, count = events.len(), "Appending events");
            let response = gateway
                .post_session_events(&id, &events, None)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Browse { kind, sort } => browse(gateway, kind, sort).await?,
        Commands::Status => match gateway.health(None).await {
            Ok(health) if health.ok => println!("GazeDash API: ok ({})", config.api.base_url),
            Ok(_) => {
                eprintln!("GazeDash API: unhealthy ({})", config.api.base_url);
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("gazedash: cannot reach {}: {}", config.api.base_url, e.user_message());
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

fn exit_on_failure(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Committed => {}
        CycleOutcome::Failed(message) => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        CycleOutcome::MissingId => {
            eprintln!("No session id");
            std::process::exit(2);
        }
        CycleOutcome::Superseded => {
            eprintln!("Fetch cancelled");
            std::process::exit(130);
        }
    }
}

fn render_detail(state: &SessionState, filter: &TypeFilter, sort: SortDirection) -> String {
    match state.status() {
        ViewStatus::MissingId => "No session id\n".to_string(),
        ViewStatus::Loading => format!(
            "Loading session {}...\n",
            state.session_id.as_deref().unwrap_or_default()
        ),
        ViewStatus::Failed(message) => format!("Error: {}\n", message),
        ViewStatus::Ready => {
            let view = derive_view(&state.events, filter, sort);
            let mut out = render::render_session_header(
                state.session_id.as_deref().unwrap_or_default(),
                state.session.as_ref(),
                view.events.len(),
            );
            out.push_str(&format!(
                "Type: {} (available: {}) | Sort: {}\n",
                filter,
                view.types.join(", "),
                sort
            ));
            if let Some(stats) = &state.stats {
                out.push_str(&render::render_metrics(stats));
            }
            out.push_str(&render::render_event_table(&view.events));
            out
        }
    }
}

/// Interactive view: every stdin line is a new session id and supersedes the
/// cycle in flight. An empty line clears the id. EOF waits for the last cycle;
/// Ctrl-C tears the view down immediately.
async fn browse(
    gateway: Arc<dyn SessionGateway>,
    filter: TypeFilter,
    sort: SortDirection,
) -> anyhow::Result<()> {
    let mut controller = SessionController::new(gateway);
    let mut state_rx = controller.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_cycle = None;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(id) => last_cycle = controller.set_session_id(Some(id.as_str())),
                None => {
                    if let Some(handle) = last_cycle.take() {
                        join_cycle(handle).await;
                    }
                    break;
                }
            },
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                print!("{}", render_detail(&state, &filter, sort));
            }
            _ = &mut ctrl_c => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    controller.shutdown();

    // Render whatever the final committed state is if it has not been shown yet.
    if state_rx.has_changed().unwrap_or(false) {
        let state = state_rx.borrow_and_update().clone();
        print!("{}", render_detail(&state, &filter, sort));
    }

    Ok(())
}
