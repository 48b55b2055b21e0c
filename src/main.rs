use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kip::advice::{create_backend, SleepAdvisor};
use kip::api::state::AppState;
use kip::api::{build_router, cors_layer};
use kip::config::AppConfig;
use kip::service::{SleepStatsService, UserService};
use kip::storage::Database;

#[derive(Parser)]
#[command(name = "kip")]
#[command(about = "Local sleep diary with derived statistics and AI-generated advice")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Path to the SQLite database (overrides config)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Create the database file and apply schema migrations
    InitDb,

    /// Register a user
    AddUser {
        /// Nickname for the new user
        #[arg(long)]
        nickname: String,
    },

    /// Generate sleep advice for a user
    Advise {
        /// User id to advise
        #[arg(long)]
        user_id: i64,

        /// Trailing window for the daily series, in days
        #[arg(long, default_value = "30")]
        window_days: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    if let Some(db) = cli.db {
        config.database.path = db;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.validate()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting kip v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve { host, port } => {
            let db = Database::open(&config.database.path)?;
            let backend = create_backend(&config.ai)?;
            let advisor = SleepAdvisor::new(backend);

            match advisor.health_check().await {
                Ok(true) => {
                    tracing::info!("AI backend '{}' is reachable", advisor.backend_name());
                }
                Ok(false) | Err(_) => {
                    tracing::warn!(
                        "AI backend '{}' is unreachable; advice requests will fail until it is up",
                        advisor.backend_name()
                    );
                }
            }

            let state = AppState::new(db, advisor);
            let app = build_router(state)
                .layer(cors_layer(&config.server.cors_origin))
                .layer(tower_http::trace::TraceLayer::new_for_http());

            let addr = format!(
                "{}:{}",
                host.unwrap_or(config.server.host),
                port.unwrap_or(config.server.port)
            );
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::InitDb => {
            let db = Database::open(&config.database.path)?;
            // Drop waits for the worker, so migrations are on disk here.
            drop(db);
            println!("Database ready at {}", config.database.path.display());
        }
        Commands::AddUser { nickname } => {
            let db = Database::open(&config.database.path)?;
            let users = UserService::new(db);
            let user = users.register(&nickname).await?;
            println!("Registered '{}' (id {})", user.nickname, user.id);
        }
        Commands::Advise {
            user_id,
            window_days,
        } => {
            let db = Database::open(&config.database.path)?;
            let stats = SleepStatsService::new(db);
            let recent = stats.recent_daily(user_id, window_days).await?;
            let weekday = stats.weekday_averages(user_id).await?;

            let backend = create_backend(&config.ai)?;
            let advisor = SleepAdvisor::new(backend);
            let advice = advisor.advise(&recent, &weekday).await?;

            println!("{}", advice);
        }
    }

    Ok(())
}
