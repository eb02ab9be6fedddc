pub mod api;
pub mod appointment;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod error;
pub mod ids;
pub mod models;
pub mod notifications;
pub mod records;
pub mod registration;
pub mod reporting;
pub mod scheduling;
pub mod validation;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Core(#[from] core_state::CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
}

/// Load settings, open the database and serve the API until Ctrl-C.
pub async fn run() -> Result<(), RunError> {
    let settings = config::Settings::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&settings.log_filter)
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    tracing::info!(db_path = %settings.db_path.display(), "Opening database");

    let core = Arc::new(core_state::CoreState::open(&settings.db_path)?);
    api::server::serve_until_ctrl_c(core, settings.bind_addr).await?;
    Ok(())
}
