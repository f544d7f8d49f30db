use std::sync::Arc;

use fitcoach::api::routes::create_routes;
use fitcoach::auth::JwtService;
use fitcoach::config::{init_tracing, run_migrations, AppConfig, DatabaseConfig, StoreBackend};
use fitcoach::store::{MemoryStore, PgStore, SharedStore};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(&config.log_level);

    let store: SharedStore = match config.store_backend {
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = db_config.create_pool().await?;
            if db_config.run_migrations {
                run_migrations(&pool).await?;
                info!("Database migrations applied");
            }
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    if config.is_production() && config.jwt_secret.starts_with("your-secret-key") {
        warn!("JWT_SECRET is unset; using the development default");
    }

    let jwt_service = JwtService::new(&config.jwt_secret, config.jwt_expiration_minutes);
    let app = create_routes(store, jwt_service);

    let address = config.server_address();
    let listener = TcpListener::bind(&address).await?;
    info!(environment = %config.environment, "FitCoach server starting on http://{}", address);
    info!("Health check available at http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}
