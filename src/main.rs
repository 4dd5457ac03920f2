use clap::error::ErrorKind;
use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use floodchurn::config::{self, SimulationParams, DEFAULT_HOP_LIMIT, DEFAULT_PREFIX, DEFAULT_START_OFFSET};
use floodchurn::{orchestrator, report};

/// Churn timeline generator for flooding network simulations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of contents in the catalog
    #[arg(long = "num_contents", visible_alias = "num-contents", required_unless_present = "config")]
    num_contents: Option<u32>,

    /// Rate at which connections arrive (events per second)
    #[arg(long = "connection_rate", visible_alias = "connection-rate", required_unless_present = "config")]
    connection_rate: Option<f64>,

    /// Base rate at which users disconnect (events per second)
    #[arg(long = "disconnection_rate", visible_alias = "disconnection-rate", required_unless_present = "config")]
    disconnection_rate: Option<f64>,

    /// Length of the initialization period in seconds
    #[arg(
        long = "initialization_period_length",
        visible_alias = "initialization-period-length",
        required_unless_present = "config"
    )]
    initialization_period_length: Option<f64>,

    /// Length of the observation period in seconds
    #[arg(
        long = "observation_period_length",
        visible_alias = "observation-period-length",
        required_unless_present = "config"
    )]
    observation_period_length: Option<f64>,

    /// Content popularity Zipf exponent
    #[arg(long = "zipf_exponent", visible_alias = "zipf-exponent", required_unless_present = "config")]
    zipf_exponent: Option<f64>,

    /// Size of the cache on routers
    #[arg(long = "cache_size", visible_alias = "cache-size", required_unless_present = "config")]
    cache_size: Option<u32>,

    /// Annotated topology file describing the infrastructure
    #[arg(long = "topology_file", visible_alias = "topology-file", required_unless_present_any = ["config", "builtin_topology"])]
    topology_file: Option<String>,

    /// YAML parameter file replacing the parameters above
    #[arg(short, long, conflicts_with_all = [
        "num_contents", "connection_rate", "disconnection_rate",
        "initialization_period_length", "observation_period_length",
        "zipf_exponent", "cache_size",
    ])]
    config: Option<PathBuf>,

    /// Seed of the run; drawn from the OS when absent
    #[arg(long)]
    seed: Option<u64>,

    /// Run the disconnection sub-loop during the observation period
    #[arg(long)]
    enable_disconnections: bool,

    /// Use the built-in 3x3 grid instead of the topology file
    #[arg(long)]
    builtin_topology: bool,

    /// Content name prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Write the run report to this file (.json, .yaml or .yml)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    /// Merge the command line into simulation parameters.
    ///
    /// Flags given on the command line override values from a parameter file.
    fn into_params(self) -> Result<SimulationParams> {
        let mut params = match &self.config {
            Some(path) => config::load_params(path)
                .wrap_err_with(|| format!("Failed to load parameters from {}", path.display()))?,
            None => SimulationParams {
                num_contents: self.num_contents.unwrap_or_default(),
                connection_rate: self.connection_rate.unwrap_or_default(),
                disconnection_rate: self.disconnection_rate.unwrap_or_default(),
                initialization_period_length: self.initialization_period_length.unwrap_or_default(),
                observation_period_length: self.observation_period_length.unwrap_or_default(),
                zipf_exponent: self.zipf_exponent.unwrap_or_default(),
                cache_size: self.cache_size.unwrap_or_default(),
                topology_file: String::new(),
                seed: None,
                enable_disconnections: false,
                builtin_topology: false,
                prefix: DEFAULT_PREFIX.to_string(),
                start_offset: DEFAULT_START_OFFSET,
                hop_limit: DEFAULT_HOP_LIMIT,
            },
        };

        if let Some(file) = self.topology_file {
            params.topology_file = file;
        }
        if self.seed.is_some() {
            params.seed = self.seed;
        }
        if let Some(prefix) = self.prefix {
            params.prefix = prefix;
        }
        params.enable_disconnections |= self.enable_disconnections;
        params.builtin_topology |= self.builtin_topology;

        params.validate()?;
        Ok(params)
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.kind() == ErrorKind::MissingRequiredArgument => {
            println!("Invalid number of parameters: {}", e.render());
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting floodchurn");
    let output = args.output.clone();
    let params = args.into_params()?;

    let run = orchestrator::run_simulation(&params)?;
    info!(
        "Generated {} events ({} dispatched), seed {}",
        run.events.len(),
        run.run.dispatched,
        run.seed
    );

    if let Some(path) = output {
        report::write_report(&run, &path)?;
    }

    info!("Simulation completed successfully");
    Ok(())
}
