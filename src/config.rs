use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Name prefix shared by every catalog item
pub const DEFAULT_PREFIX: &str = "/prefix";

/// Initial value of both simulated clock cursors
pub const DEFAULT_START_OFFSET: f64 = 0.2;

/// Hop limit carried by every flood request
pub const DEFAULT_HOP_LIMIT: u8 = 2;

/// Forwarding strategy installed on every node before routes are computed
pub const DEFAULT_STRATEGY: &str = "/localhost/nfd/strategy/best-route";

/// Parameters of a single churn simulation run.
///
/// The first eight fields are the required command-line parameters; the
/// rest carry defaults and are optional in YAML parameter files.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SimulationParams {
    /// Number of contents in the catalog
    pub num_contents: u32,
    /// Rate at which connections arrive (events per second)
    pub connection_rate: f64,
    /// Base rate at which users disconnect (events per second)
    pub disconnection_rate: f64,
    /// Length of the initialization period in seconds
    pub initialization_period_length: f64,
    /// Length of the observation period in seconds
    pub observation_period_length: f64,
    /// Content popularity Zipf exponent
    pub zipf_exponent: f64,
    /// Size of the cache on routers
    pub cache_size: u32,
    /// Annotated topology file describing the infrastructure
    pub topology_file: String,
    /// Seed of the run; drawn from the OS when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Run the disconnection sub-loop during the observation period
    #[serde(default)]
    pub enable_disconnections: bool,
    /// Use the built-in grid topology instead of `topology_file`
    #[serde(default)]
    pub builtin_topology: bool,
    /// Content name prefix
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Initial value of the connect and disconnect cursors
    #[serde(default = "default_start_offset")]
    pub start_offset: f64,
    /// Hop limit of flood requests
    #[serde(default = "default_hop_limit")]
    pub hop_limit: u8,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_start_offset() -> f64 {
    DEFAULT_START_OFFSET
}

fn default_hop_limit() -> u8 {
    DEFAULT_HOP_LIMIT
}

impl SimulationParams {
    /// Validate the parameters.
    ///
    /// Runs before any topology, scheduler or random state is created.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_contents == 0 {
            return Err(ConfigError::InvalidCatalog(
                "num_contents must be at least 1".to_string(),
            ));
        }
        if !(self.zipf_exponent.is_finite() && self.zipf_exponent >= 0.0) {
            return Err(ConfigError::InvalidCatalog(format!(
                "zipf_exponent must be a non-negative number, got {}",
                self.zipf_exponent
            )));
        }
        check_rate("connection_rate", self.connection_rate)?;
        check_rate("disconnection_rate", self.disconnection_rate)?;
        check_period("initialization_period_length", self.initialization_period_length)?;
        check_period("observation_period_length", self.observation_period_length)?;
        if self.cache_size == 0 {
            return Err(ConfigError::InvalidNetwork(
                "cache_size must be at least 1".to_string(),
            ));
        }
        if !self.builtin_topology && self.topology_file.trim().is_empty() {
            return Err(ConfigError::InvalidNetwork(
                "topology_file cannot be empty unless the built-in topology is selected".to_string(),
            ));
        }
        if !self.prefix.starts_with('/') {
            return Err(ConfigError::InvalidNetwork(format!(
                "prefix must start with '/', got '{}'",
                self.prefix
            )));
        }
        if !(self.start_offset.is_finite() && self.start_offset > 0.0) {
            return Err(ConfigError::InvalidPeriod(format!(
                "start_offset must be positive, got {}",
                self.start_offset
            )));
        }
        if self.hop_limit == 0 {
            return Err(ConfigError::InvalidNetwork(
                "hop_limit must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Instant at which the run stops dispatching events
    pub fn stop_time(&self) -> f64 {
        self.initialization_period_length + self.observation_period_length
    }

    /// Log the parameter block consumed by offline analysis scripts
    pub fn log_params(&self) {
        info!("Params");
        info!("num_contents {}", self.num_contents);
        info!("connection_rate {}", self.connection_rate);
        info!("disconnection_rate {}", self.disconnection_rate);
        info!("initialization_period_length {}", self.initialization_period_length);
        info!("observation_period_length {}", self.observation_period_length);
        info!("zipf_exponent {}", self.zipf_exponent);
        info!("cache_size {}", self.cache_size);
        info!("topology_file {}", self.topology_file);
        info!("End_of_Params");
    }
}

fn check_rate(name: &str, rate: f64) -> Result<(), ConfigError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate(format!("{} must be positive, got {}", name, rate)))
    }
}

fn check_period(name: &str, length: f64) -> Result<(), ConfigError> {
    if length.is_finite() && length > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidPeriod(format!("{} must be positive, got {}", name, length)))
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid catalog configuration: {0}")]
    InvalidCatalog(String),
    #[error("Invalid rate: {0}")]
    InvalidRate(String),
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error("Invalid network configuration: {0}")]
    InvalidNetwork(String),
}

/// Load and validate simulation parameters from a YAML file
pub fn load_params(path: &Path) -> color_eyre::Result<SimulationParams> {
    info!("Loading parameters from: {:?}", path);

    let file = File::open(path)?;
    let params: SimulationParams = serde_yaml::from_reader(file)?;
    params.validate()?;

    Ok(params)
}
