use dotenvy::dotenv;
use storefront::{
    api::{self, AppState},
    config::{database, seed, server::ServerConfig},
    errors::Result,
};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("storefront=info,tower_http=info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Server settings
    let config = ServerConfig::from_env()
        .inspect_err(|e| error!("Invalid configuration: {}", e))?;

    // 4. Database
    let db = database::init_db(&config.database_url)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Optional seeding
    if config.seed_db {
        let seed_config = seed::load_seed(&config.seed_file)?;
        seed::seed_database(&db, &seed_config)
            .await
            .inspect_err(|e| error!("Failed to seed database: {}", e))?;
    }

    // 6. Serve
    let address = config.bind_address();
    let router = api::create_router(AppState::new(db, config))?;
    let listener = TcpListener::bind(&address).await?;
    info!("Storefront API listening on http://{address}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
