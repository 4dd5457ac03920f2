//! # Floodchurn - churn and workload timelines for flooding network simulations
//!
//! This library generates the client workload of a content-centric network
//! experiment in which requests are flooded with a small hop limit, and the
//! producer is withdrawn once caches have warmed up. The question studied
//! is how much content stays retrievable from in-network caches alone.
//!
//! ## Overview
//!
//! A run has two phases:
//!
//! - **Initialization**: clients connect to content drawn from a
//!   Zipf-Mandelbrot popularity model at Poisson arrival times, while the
//!   producer is reachable and caches fill.
//! - **Observation**: at the first connect instant past the initialization
//!   length, every infrastructure router drops its route toward the
//!   producer and the producer's access link fails. Clients keep
//!   connecting, and optionally disconnecting.
//!
//! Every event is enumerated up front from a seeded generator and handed to
//! a discrete-event scheduler, so a seed fully determines the run.
//!
//! ## Architecture
//!
//! - `config`: run parameters, validation and YAML parameter files
//! - `types`: identifiers and simulated time
//! - `workload`: popularity model and arrival process
//! - `churn`: per-client active content bookkeeping
//! - `scheduler`: the scheduling contract and the event queue
//! - `timeline`: the phase state machine that produces the events
//! - `topology`: topology providers and access node attachment
//! - `network`: collaborator traits and the simulated network
//! - `orchestrator`: setup sequence, generation and dispatch
//! - `report`: JSON/YAML record of a run
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use floodchurn::{config, orchestrator, report};
//! use std::path::Path;
//!
//! let params = config::load_params(Path::new("params.yaml"))?;
//! let run = orchestrator::run_simulation(&params)?;
//! report::write_report(&run, Path::new("run.json"))?;
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Log Output
//!
//! Churn records are logged on the `floodchurn::churn` target, one per
//! line, for offline analysis:
//!
//! ```text
//! CON <access node> <content> <time>
//! PICK <access node>
//! DISCONN <access node> <content> <time> <active count>
//! RMV_SIT <access node> <content> <time> 0
//! ```

pub mod churn;
pub mod config;
pub mod network;
pub mod orchestrator;
pub mod report;
pub mod scheduler;
pub mod timeline;
pub mod topology;
pub mod types;
pub mod workload;
