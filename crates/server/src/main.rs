//! Leaderboard server: live points leaderboard
//!
//! Usage:
//!   leaderboard serve --port 5000    : Launch the API + push server
//!   leaderboard seed                 : Insert the default roster into an empty board
//!   leaderboard standings --limit 10 : Print the current ranking
//!   leaderboard history --limit 20   : Print the latest claims

use clap::{Parser, Subcommand};
use engine::{HistoryEntry, LeaderboardEntry, LeaderboardService};
use leaderboard_server::config::ServerConfig;
use leaderboard_server::uploads::UploadStore;
use leaderboard_server::{build_router, AppState, APP_VERSION};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "leaderboard")]
#[command(about = "Real-time points leaderboard server", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the HTTP API and WebSocket push channel
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value_t = 5000)]
        port: u16,
    },
    /// Insert the default roster if the board has no users
    Seed,
    /// Print the ranked board
    Standings {
        /// Number of rows to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print the most recent claims
    History {
        /// Number of claims to show
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,engine=debug,persistence=debug,leaderboard_server=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,engine=info,persistence=info,leaderboard_server=info")
        })
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = ServerConfig::from_env()?;

    match cli.command {
        Commands::Serve { host, port } => {
            cmd_serve(&config, &host, port).await?;
        }
        Commands::Seed => {
            cmd_seed(&config).await?;
        }
        Commands::Standings { limit } => {
            cmd_standings(&config, limit).await?;
        }
        Commands::History { limit } => {
            cmd_history(&config, limit).await?;
        }
    }

    Ok(())
}

async fn open_database(config: &ServerConfig) -> anyhow::Result<persistence::Database> {
    let db = persistence::Database::new(&config.db_path)
        .await
        .map_err(|e| {
            error!("Failed to initialize database: {}", e);
            anyhow::anyhow!("Database initialization failed: {}", e)
        })?;
    info!("Database initialized: {}", config.db_path.display());
    Ok(db)
}

// ============================================================================
// Serve command: Axum web server
// ============================================================================

async fn cmd_serve(config: &ServerConfig, host: &str, port: u16) -> anyhow::Result<()> {
    info!("Leaderboard v{} starting...", APP_VERSION);

    let db = open_database(config).await?;
    let service = LeaderboardService::new(db.pool_clone());
    if config.seed_on_start {
        let seeded = service.seed_if_empty().await?;
        if seeded > 0 {
            info!("Seeded {} default users", seeded);
        }
    }

    let state = AppState::new(service, UploadStore::new(&config.upload_dir));
    let app = build_router(state, config);

    let addr: std::net::SocketAddr = format!("{}:{}", host, port).parse()?;
    println!("\n=== Leaderboard v{} ===", APP_VERSION);
    println!("Listening on http://{}", addr);
    println!("\nEndpoints:");
    println!("  GET   /api/health        - Health check");
    println!("  GET   /api/users         - List users");
    println!("  POST  /api/users         - Add a user (name, profileImage)");
    println!("  PATCH /api/users/:id     - Change a user's avatar");
    println!("  POST  /api/claim         - Claim random points for a user");
    println!("  GET   /api/leaderboard   - Ranked board");
    println!("  GET   /api/history       - Claim history (newest first)");
    println!("  GET   /ws                - Live refresh notifications");
    println!("\n  Database: {}", config.db_path.display());
    println!("  Uploads:  {}", config.upload_dir.display());
    println!("\nPress Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Ctrl+C received, shutting down");
        })
        .await?;

    db.pool().close().await;
    Ok(())
}

// ============================================================================
// Offline commands
// ============================================================================

async fn cmd_seed(config: &ServerConfig) -> anyhow::Result<()> {
    let db = open_database(config).await?;
    let inserted = engine::seed_default_users(db.pool()).await?;
    if inserted == 0 {
        println!("Board already has users, nothing seeded");
    } else {
        println!("Seeded {} users", inserted);
    }
    Ok(())
}

async fn cmd_standings(config: &ServerConfig, limit: usize) -> anyhow::Result<()> {
    let db = open_database(config).await?;
    let board = LeaderboardService::new(db.pool_clone()).leaderboard().await?;
    print_standings(&board, limit);
    Ok(())
}

async fn cmd_history(config: &ServerConfig, limit: u32) -> anyhow::Result<()> {
    let db = open_database(config).await?;
    let history = LeaderboardService::new(db.pool_clone())
        .history(Some(i64::from(limit)))
        .await?;
    print_history(&history);
    Ok(())
}

fn print_standings(board: &[LeaderboardEntry], limit: usize) {
    println!("\nTop {} of {}:", board.len().min(limit), board.len());
    println!("  {:>4}  {:<24} {:>8}", "#", "Name", "Points");
    println!("  {}", "-".repeat(40));
    for entry in board.iter().take(limit) {
        println!(
            "  {:>4}  {:<24} {:>8}",
            entry.rank, entry.user.name, entry.user.total_points
        );
    }
}

fn print_history(history: &[HistoryEntry]) {
    println!("\nLatest {} claims:", history.len());
    println!("  {:<25} {:<24} {:>6}", "When (UTC)", "Name", "Points");
    println!("  {}", "-".repeat(58));
    for claim in history {
        let name = claim
            .user_id
            .as_ref()
            .map(|u| u.name.as_str())
            .unwrap_or("(removed)");
        println!(
            "  {:<25} {:<24} {:>+6}",
            claim.claimed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            name,
            claim.points
        );
    }
}
