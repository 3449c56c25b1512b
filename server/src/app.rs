//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};
use puppetdb::PuppetDb;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli::{self, CliConfig};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, DEFAULT_LOG_LEVEL, ENV_LOG};
use crate::core::shutdown::ShutdownService;

type FilterHandle = reload::Handle<EnvFilter, Registry>;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub puppetdb: Arc<PuppetDb>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        let filter = Self::init_logging();

        tracing::debug!("Application starting");

        let cli_config = cli::parse();
        let app = Self::init(&cli_config)?;

        if let Some(handle) = filter {
            Self::apply_log_level(&handle, &app.config.log_level);
        }

        Self::start_server(app).await
    }

    fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let puppetdb = PuppetDb::new(&config.puppetdb.client_config())
            .context("Failed to create PuppetDB client")?;
        tracing::debug!(url = %config.puppetdb.client_config().base_url(), "PuppetDB client ready");

        Ok(Self {
            shutdown: ShutdownService::new(),
            config,
            puppetdb: Arc::new(puppetdb),
        })
    }

    /// Install the subscriber; the returned handle is `None` when the filter came from the environment
    fn init_logging() -> Option<FilterHandle> {
        let from_env = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .ok();
        let directives = from_env
            .clone()
            .unwrap_or_else(|| default_filter(DEFAULT_LOG_LEVEL));

        let (filter, handle) = reload::Layer::new(EnvFilter::new(directives));
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_level(true)
                    .with_ansi(true)
                    .compact(),
            )
            .init();

        from_env.is_none().then_some(handle)
    }

    fn apply_log_level(handle: &FilterHandle, level: &str) {
        if let Err(e) = handle.reload(EnvFilter::new(default_filter(level))) {
            tracing::warn!(error = %e, "Failed to apply configured log level");
        }
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        banner::print_banner(&app.config);

        let server = ApiServer::new(app);
        server.start().await?;
        tracing::debug!("Shutdown complete");

        Ok(())
    }
}

/// Quiet dependencies, `level` for the dashboard and its PuppetDB client
fn default_filter(level: &str) -> String {
    format!("warn,{}={},puppetdb={}", APP_NAME_LOWER, level, level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        let filter = default_filter("debug");
        assert_eq!(filter, "warn,puppetboard=debug,puppetdb=debug");
        assert!(EnvFilter::try_new(filter).is_ok());
    }
}
