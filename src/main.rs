use library_catalog::{
    adapters::memory::{MemoryAccountStore, MemoryCatalogStore},
    adapters::postgres::{
        self, PostgresBookRepository, PostgresLoanRepository, PostgresSessionStore,
        PostgresUserRepository,
    },
    api::{handlers::AppState, router::create_router},
    application::{ServiceDependencies, auth, bootstrap},
    config::{AppConfig, StorageBackend},
};
use std::error::Error;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "library_catalog=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    // Initialize adapters
    let service_deps = match config.storage {
        StorageBackend::Postgres => {
            tracing::info!(max_connections = config.max_connections, "connecting to database");
            let pool = postgres::connect(&config.database_url, config.max_connections).await?;
            postgres::migrate(&pool).await?;

            ServiceDependencies {
                books: Arc::new(PostgresBookRepository::new(pool.clone())),
                loans: Arc::new(PostgresLoanRepository::new(pool.clone())),
                users: Arc::new(PostgresUserRepository::new(pool.clone())),
                sessions: Arc::new(PostgresSessionStore::new(pool)),
            }
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data is lost on restart");
            let catalog = Arc::new(MemoryCatalogStore::new());
            let accounts = Arc::new(MemoryAccountStore::new());

            ServiceDependencies {
                books: catalog.clone(),
                loans: catalog,
                users: accounts.clone(),
                sessions: accounts,
            }
        }
    };

    // First-run setup
    let created =
        auth::ensure_admin_account(&service_deps, &config.admin_username, &config.admin_password)
            .await?;
    if created && config.uses_default_admin_password() {
        tracing::warn!(
            username = %config.admin_username,
            "admin account created with the default password; set ADMIN_PASSWORD"
        );
    }
    bootstrap::seed_catalog(&service_deps, chrono::Utc::now()).await?;

    // Create application state
    let app_state = Arc::new(AppState {
        service_deps,
        session_ttl: config.session_ttl,
        secure_cookies: config.secure_cookies,
        static_dir: config.static_dir.clone(),
    });

    // Create router
    let app = create_router(app_state);

    // Server configuration
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
