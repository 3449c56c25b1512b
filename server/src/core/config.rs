use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use puppetdb::ClientConfig;
use serde::Deserialize;

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_ENVIRONMENT, DEFAULT_HOST, DEFAULT_LOG_LEVEL,
    DEFAULT_PORT, DEFAULT_PUPPETDB_HOST, DEFAULT_PUPPETDB_PAGE_SIZE, DEFAULT_PUPPETDB_PORT,
    DEFAULT_PUPPETDB_TIMEOUT_SECS, DEFAULT_REPORTS_COUNT, DEFAULT_UNRESPONSIVE_HOURS,
    MAX_UNRESPONSIVE_HOURS,
};

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// PuppetDB connection section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PuppetDbFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub ssl: Option<bool>,
    pub ssl_verify: Option<bool>,
    pub timeout_secs: Option<u64>,
    /// Records per request while streaming listings
    pub page_size: Option<usize>,
}

/// Dashboard behaviour section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DashboardFileConfig {
    pub default_environment: Option<String>,
    pub unresponsive_hours: Option<u32>,
    pub reports_count: Option<usize>,
    pub with_event_numbers: Option<bool>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub puppetdb: Option<PuppetDbFileConfig>,
    pub dashboard: Option<DashboardFileConfig>,
    pub log_level: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                tracing::trace!(host = ?server.host, "Merging server.host");
                current.host = server.host;
            }
            if server.port.is_some() {
                tracing::trace!(port = ?server.port, "Merging server.port");
                current.port = server.port;
            }
        }

        if let Some(puppetdb) = other.puppetdb {
            let current = self
                .puppetdb
                .get_or_insert_with(PuppetDbFileConfig::default);
            if puppetdb.host.is_some() {
                tracing::trace!(host = ?puppetdb.host, "Merging puppetdb.host");
                current.host = puppetdb.host;
            }
            if puppetdb.port.is_some() {
                tracing::trace!(port = ?puppetdb.port, "Merging puppetdb.port");
                current.port = puppetdb.port;
            }
            if puppetdb.ssl.is_some() {
                current.ssl = puppetdb.ssl;
            }
            if puppetdb.ssl_verify.is_some() {
                current.ssl_verify = puppetdb.ssl_verify;
            }
            if puppetdb.timeout_secs.is_some() {
                tracing::trace!(timeout_secs = ?puppetdb.timeout_secs, "Merging puppetdb.timeout_secs");
                current.timeout_secs = puppetdb.timeout_secs;
            }
            if puppetdb.page_size.is_some() {
                tracing::trace!(page_size = ?puppetdb.page_size, "Merging puppetdb.page_size");
                current.page_size = puppetdb.page_size;
            }
        }

        if let Some(dashboard) = other.dashboard {
            let current = self
                .dashboard
                .get_or_insert_with(DashboardFileConfig::default);
            if dashboard.default_environment.is_some() {
                tracing::trace!(default_environment = ?dashboard.default_environment, "Merging dashboard.default_environment");
                current.default_environment = dashboard.default_environment;
            }
            if dashboard.unresponsive_hours.is_some() {
                tracing::trace!(unresponsive_hours = ?dashboard.unresponsive_hours, "Merging dashboard.unresponsive_hours");
                current.unresponsive_hours = dashboard.unresponsive_hours;
            }
            if dashboard.reports_count.is_some() {
                current.reports_count = dashboard.reports_count;
            }
            if dashboard.with_event_numbers.is_some() {
                current.with_event_numbers = dashboard.with_event_numbers;
            }
        }

        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// PuppetDB connection (final/runtime)
#[derive(Debug, Clone)]
pub struct PuppetDbConfig {
    pub host: String,
    pub port: u16,
    pub ssl: bool,
    pub ssl_verify: bool,
    pub timeout_secs: u64,
    pub page_size: usize,
}

impl PuppetDbConfig {
    /// Build the settings for the PuppetDB client
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            host: self.host.clone(),
            port: self.port,
            ssl: self.ssl,
            ssl_verify: self.ssl_verify,
            timeout: Duration::from_secs(self.timeout_secs),
            page_size: self.page_size,
        }
    }
}

/// Dashboard behaviour (final/runtime)
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Environment used when the request does not name one
    pub default_environment: String,
    pub unresponsive_hours: u32,
    pub reports_count: usize,
    pub with_event_numbers: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_environment: DEFAULT_ENVIRONMENT.to_string(),
            unresponsive_hours: DEFAULT_UNRESPONSIVE_HOURS,
            reports_count: DEFAULT_REPORTS_COUNT,
            with_event_numbers: true,
        }
    }
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub puppetdb: PuppetDbConfig,
    pub dashboard: DashboardConfig,
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.puppetboard/puppetboard.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        Self::load_with_profile(cli, get_profile_config_path())
    }

    fn load_with_profile(cli: &CliConfig, profile_path: Option<PathBuf>) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Profile dir - skip if not exists
        if let Some(profile_path) = profile_path
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        // 3. Layer: defaults -> file config -> CLI/env overrides
        let file_server = file_config.server.unwrap_or_default();
        let file_puppetdb = file_config.puppetdb.unwrap_or_default();
        let file_dashboard = file_config.dashboard.unwrap_or_default();
        let defaults = DashboardConfig::default();

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
        };

        let puppetdb = PuppetDbConfig {
            host: cli
                .puppetdb_host
                .clone()
                .or(file_puppetdb.host)
                .unwrap_or_else(|| DEFAULT_PUPPETDB_HOST.to_string()),
            port: cli
                .puppetdb_port
                .or(file_puppetdb.port)
                .unwrap_or(DEFAULT_PUPPETDB_PORT),
            ssl: cli.puppetdb_ssl.or(file_puppetdb.ssl).unwrap_or(false),
            ssl_verify: cli
                .puppetdb_ssl_verify
                .or(file_puppetdb.ssl_verify)
                .unwrap_or(true),
            timeout_secs: cli
                .puppetdb_timeout
                .or(file_puppetdb.timeout_secs)
                .unwrap_or(DEFAULT_PUPPETDB_TIMEOUT_SECS),
            page_size: file_puppetdb
                .page_size
                .unwrap_or(DEFAULT_PUPPETDB_PAGE_SIZE),
        };

        let dashboard = DashboardConfig {
            default_environment: cli
                .default_environment
                .clone()
                .or(file_dashboard.default_environment)
                .unwrap_or(defaults.default_environment),
            unresponsive_hours: cli
                .unresponsive_hours
                .or(file_dashboard.unresponsive_hours)
                .unwrap_or(defaults.unresponsive_hours),
            reports_count: cli
                .reports_count
                .or(file_dashboard.reports_count)
                .unwrap_or(defaults.reports_count),
            with_event_numbers: cli
                .with_event_numbers
                .or(file_dashboard.with_event_numbers)
                .unwrap_or(defaults.with_event_numbers),
        };

        let config = Self {
            server,
            puppetdb,
            dashboard,
            log_level: file_config
                .log_level
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        };

        config.validate()?;
        tracing::debug!(config = ?config, "Configuration loaded");

        Ok(config)
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }
        if self.puppetdb.host.is_empty() {
            anyhow::bail!("Configuration error: puppetdb.host must not be empty");
        }
        if self.puppetdb.port == 0 {
            anyhow::bail!("Configuration error: puppetdb.port must be greater than 0");
        }
        if self.puppetdb.page_size == 0 {
            anyhow::bail!("Configuration error: puppetdb.page_size must be greater than 0");
        }
        if self.dashboard.default_environment.is_empty() {
            anyhow::bail!(
                "Configuration error: dashboard.default_environment must not be empty (use \"*\" for all environments)"
            );
        }

        if self.dashboard.unresponsive_hours > MAX_UNRESPONSIVE_HOURS {
            anyhow::bail!(
                "Configuration error: dashboard.unresponsive_hours must be at most {}",
                MAX_UNRESPONSIVE_HOURS
            );
        }
        if self.dashboard.unresponsive_hours == 0 {
            tracing::warn!(
                "dashboard.unresponsive_hours is 0, every node will be shown as unreported"
            );
        }
        if self.puppetdb.ssl && !self.puppetdb.ssl_verify {
            tracing::warn!(
                host = %self.puppetdb.host,
                "PuppetDB certificate verification is disabled"
            );
        }

        Ok(())
    }
}

/// Get the profile config path (~/.puppetboard/puppetboard.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Check if host binds to all network interfaces
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}
