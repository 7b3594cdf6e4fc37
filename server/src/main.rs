use axum::{ServiceExt, extract::Request};
use clap::{Parser, Subcommand};
use dealership::api::{AppState, app_router, with_trimmed_paths};
use dealership::auth::{Auth, NewUser};
use dealership::config::{Config, redact_db_url};
use dealership::inventory::{self, SeedOutcome};
use dealership::upstream::{RestClient, sentiment::SentimentClient};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "dealership", about = "Dealership web backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Load the car catalogue into an empty inventory
    Seed,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, default_value = "")]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Init structured logging (respects RUST_LOG; defaults to info)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Load .env if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env();

    tracing::info!(database = %redact_db_url(&config.database_url), "connecting to database");

    let db = Database::connect(&config.database_url).await?;
    Migrator::up(&db, None).await?;

    tracing::info!("database initialized");

    match cli.command {
        None | Some(Commands::Serve) => serve(config, db).await?,
        Some(Commands::Seed) => match inventory::seed(&db).await? {
            SeedOutcome::Seeded { makes, models } => {
                tracing::info!(makes, models, "inventory seeded");
            }
            SeedOutcome::AlreadySeeded => tracing::info!("inventory already present, nothing to do"),
        },
        Some(Commands::User { action }) => handle_user_action(Auth::new(db), action).await?,
    }

    Ok(())
}

async fn serve(config: Config, db: DatabaseConnection) -> Result<(), Box<dyn std::error::Error>> {
    // One connection pool for every outbound call
    let http = reqwest::Client::new();

    let state = AppState {
        auth: Arc::new(Auth::new(db.clone())),
        db,
        session_secret: config.session_secret.clone(),
        session_expiry_hours: config.session_expiry_hours,
        backend: RestClient::with_client(&config.backend_url, http.clone()),
        sentiment: SentimentClient::with_client(&config.sentiment_analyzer_url, http),
    };

    tracing::info!(
        backend = %config.backend_url,
        sentiment = %config.sentiment_analyzer_url,
        "upstream services"
    );

    let app = with_trimmed_paths(app_router(state, &config));

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Dealership API online");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn handle_user_action(auth: Auth, action: UserAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        UserAction::Create {
            username,
            password,
            first_name,
            last_name,
            email,
        } => {
            auth.register(NewUser {
                username: &username,
                password: &password,
                first_name: &first_name,
                last_name: &last_name,
                email: &email,
            })
            .await?;
            tracing::info!(username = %username, "Created user");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install signal handler");
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
