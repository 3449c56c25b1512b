use clap::Parser;

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_DEFAULT_ENVIRONMENT, ENV_HOST, ENV_PORT, ENV_PUPPETDB_HOST,
    ENV_PUPPETDB_PORT, ENV_PUPPETDB_SSL, ENV_PUPPETDB_SSL_VERIFY, ENV_PUPPETDB_TIMEOUT,
    ENV_REPORTS_COUNT, ENV_UNRESPONSIVE_HOURS, ENV_WITH_EVENT_NUMBERS,
};

#[derive(Parser)]
#[command(name = "puppetboard")]
#[command(version, about = "Read-only PuppetDB dashboard", long_about = None)]
pub struct Cli {
    /// Server host address
    #[arg(long, short = 'H', env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// PuppetDB host
    #[arg(long, env = ENV_PUPPETDB_HOST)]
    pub puppetdb_host: Option<String>,

    /// PuppetDB port
    #[arg(long, env = ENV_PUPPETDB_PORT)]
    pub puppetdb_port: Option<u16>,

    /// Connect to PuppetDB over https
    #[arg(long, env = ENV_PUPPETDB_SSL)]
    pub puppetdb_ssl: Option<bool>,

    /// Verify the PuppetDB server certificate
    #[arg(long, env = ENV_PUPPETDB_SSL_VERIFY)]
    pub puppetdb_ssl_verify: Option<bool>,

    /// PuppetDB request timeout in seconds
    #[arg(long, env = ENV_PUPPETDB_TIMEOUT)]
    pub puppetdb_timeout: Option<u64>,

    /// Environment shown when none is selected ("*" for all)
    #[arg(long, env = ENV_DEFAULT_ENVIRONMENT)]
    pub default_environment: Option<String>,

    /// Hours without a report before a node counts as unreported
    #[arg(long, env = ENV_UNRESPONSIVE_HOURS)]
    pub unresponsive_hours: Option<u32>,

    /// Number of reports shown per node
    #[arg(long, env = ENV_REPORTS_COUNT)]
    pub reports_count: Option<usize>,

    /// Fetch event counts to refine node status
    #[arg(long, env = ENV_WITH_EVENT_NUMBERS)]
    pub with_event_numbers: Option<bool>,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub puppetdb_host: Option<String>,
    pub puppetdb_port: Option<u16>,
    pub puppetdb_ssl: Option<bool>,
    pub puppetdb_ssl_verify: Option<bool>,
    pub puppetdb_timeout: Option<u64>,
    pub default_environment: Option<String>,
    pub unresponsive_hours: Option<u32>,
    pub reports_count: Option<usize>,
    pub with_event_numbers: Option<bool>,
}

/// Parse CLI arguments
pub fn parse() -> CliConfig {
    let cli = Cli::parse();
    CliConfig {
        host: cli.host,
        port: cli.port,
        config: cli.config,
        puppetdb_host: cli.puppetdb_host,
        puppetdb_port: cli.puppetdb_port,
        puppetdb_ssl: cli.puppetdb_ssl,
        puppetdb_ssl_verify: cli.puppetdb_ssl_verify,
        puppetdb_timeout: cli.puppetdb_timeout,
        default_environment: cli.default_environment,
        unresponsive_hours: cli.unresponsive_hours,
        reports_count: cli.reports_count,
        with_event_numbers: cli.with_event_numbers,
    }
}
