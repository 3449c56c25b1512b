// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "Puppetboard";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "puppetboard";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".puppetboard";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "puppetboard.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "PUPPETBOARD_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "PUPPETBOARD_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "PUPPETBOARD_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "PUPPETBOARD_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5000;

/// Default log filter when neither env var is set
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Environment Variables - PuppetDB
// =============================================================================

pub const ENV_PUPPETDB_HOST: &str = "PUPPETDB_HOST";
pub const ENV_PUPPETDB_PORT: &str = "PUPPETDB_PORT";
pub const ENV_PUPPETDB_SSL: &str = "PUPPETDB_SSL";
pub const ENV_PUPPETDB_SSL_VERIFY: &str = "PUPPETDB_SSL_VERIFY";

/// Environment variable for the PuppetDB request timeout in seconds
pub const ENV_PUPPETDB_TIMEOUT: &str = "PUPPETDB_TIMEOUT";

// =============================================================================
// PuppetDB Defaults
// =============================================================================

pub const DEFAULT_PUPPETDB_HOST: &str = "localhost";
pub const DEFAULT_PUPPETDB_PORT: u16 = 8080;
pub const DEFAULT_PUPPETDB_TIMEOUT_SECS: u64 = 20;

/// Records fetched per PuppetDB request while streaming a listing
pub const DEFAULT_PUPPETDB_PAGE_SIZE: usize = 1000;

// =============================================================================
// Environment Variables - Dashboard
// =============================================================================

pub const ENV_DEFAULT_ENVIRONMENT: &str = "PUPPETBOARD_DEFAULT_ENVIRONMENT";
pub const ENV_UNRESPONSIVE_HOURS: &str = "PUPPETBOARD_UNRESPONSIVE_HOURS";
pub const ENV_REPORTS_COUNT: &str = "PUPPETBOARD_REPORTS_COUNT";
pub const ENV_WITH_EVENT_NUMBERS: &str = "PUPPETBOARD_WITH_EVENT_NUMBERS";

// =============================================================================
// Dashboard Defaults
// =============================================================================

/// Environment selector matching every environment
pub const ALL_ENVIRONMENTS: &str = "*";

pub const DEFAULT_ENVIRONMENT: &str = ALL_ENVIRONMENTS;

/// Hours without a report before a node is unreported
pub const DEFAULT_UNRESPONSIVE_HOURS: u32 = 2;

/// Upper bound for the unreported window (about 114 years)
pub const MAX_UNRESPONSIVE_HOURS: u32 = 1_000_000;

/// Reports shown per node
pub const DEFAULT_REPORTS_COUNT: usize = 10;

// =============================================================================
// Streaming
// =============================================================================

/// Rendered fragments buffered before a chunk is written to the client
pub const STREAM_FLUSH_EVERY: usize = 5;

// =============================================================================
// Metrics
// =============================================================================

pub const METRIC_NUM_NODES: &str = "puppetlabs.puppetdb.population:name=num-nodes";
pub const METRIC_NUM_RESOURCES: &str = "puppetlabs.puppetdb.population:name=num-resources";
pub const METRIC_AVG_RESOURCES_PER_NODE: &str =
    "puppetlabs.puppetdb.population:name=avg-resources-per-node";
pub const METRIC_COMMAND_PROCESSING_TIME: &str =
    "puppetlabs.puppetdb.mq:name=global.processing-time";
pub const METRIC_COMMANDS_FATAL: &str = "puppetlabs.puppetdb.mq:name=global.fatal";
