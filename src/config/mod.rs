pub mod app;
pub mod database;

use tracing_subscriber::EnvFilter;

pub use app::{AppConfig, StoreBackend};
pub use database::{run_migrations, DatabaseConfig};

/// Install the global `fmt` subscriber. `RUST_LOG` wins over `log_level`.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fitcoach={log_level},tower_http={log_level}")));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
