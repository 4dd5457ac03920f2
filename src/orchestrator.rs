//! Simulation orchestrator.
//!
//! This module runs one simulation end to end: topology, access
//! attachment, stack installation, forwarding strategy, consumer
//! applications, origin and route computation, then timeline generation
//! and dispatch.

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;

use crate::config::{SimulationParams, DEFAULT_STRATEGY};
use crate::network::{ConsumerApp, RoutingCollaborator, SimulatedNetwork, StackInstaller};
use crate::report::TimelineReport;
use crate::scheduler::EventQueue;
use crate::timeline::{TimelineConfig, TimelineDriver};
use crate::topology::{AccessMap, AnnotatedTopologyReader, BuiltinTopology, TopologyError, TopologyProvider};
use crate::types::{ClientIndex, NodeId};

/// Topology source selected by the parameters
pub fn topology_provider(params: &SimulationParams) -> Box<dyn TopologyProvider> {
    if params.builtin_topology {
        if params.topology_file.trim().is_empty() {
            Box::new(BuiltinTopology::new())
        } else {
            Box::new(BuiltinTopology::ignoring(params.topology_file.clone()))
        }
    } else {
        Box::new(AnnotatedTopologyReader::new(&params.topology_file))
    }
}

/// Seed of the run, drawn from the OS when none is configured
pub fn resolve_seed(configured: Option<u64>) -> u64 {
    match configured {
        Some(seed) => seed,
        None => {
            let seed = rand::random();
            info!("No seed configured, drew {}", seed);
            seed
        }
    }
}

/// Run a simulation with the topology source named by the parameters
pub fn run_simulation(params: &SimulationParams) -> Result<TimelineReport> {
    let provider = topology_provider(params);
    run_with_provider(params, provider.as_ref())
}

/// Run a simulation over the graph returned by `provider`
pub fn run_with_provider(params: &SimulationParams, provider: &dyn TopologyProvider) -> Result<TimelineReport> {
    params.validate().wrap_err("Invalid simulation parameters")?;
    params.log_params();
    let seed = resolve_seed(params.seed);
    info!("Seed: {}", seed);

    let topology = provider.read().wrap_err("Failed to read topology")?;
    info!("Number_of_infrastructure_nodes: {}", topology.len());
    // Providers other than the file reader hand over unchecked graphs.
    topology
        .validate()
        .map_err(TopologyError::Invalid)
        .wrap_err("Topology rejected")?;

    let access = AccessMap::attach(topology.len()).wrap_err("Failed to attach access nodes")?;
    let mut network = SimulatedNetwork::build(&topology, access.clone(), params.prefix.clone())
        .wrap_err("Failed to build network")?;
    prepare_network(&mut network, &access, params)?;

    let mut queue = EventQueue::new();
    let mut driver =
        TimelineDriver::new(TimelineConfig::from(params), access, seed).wrap_err("Failed to create timeline driver")?;
    let timeline = driver.generate(&mut queue).wrap_err("Failed to generate timeline")?;
    info!("Scheduled {} events", queue.submitted().len());

    let run = queue.run(&mut network).wrap_err("Simulation run aborted")?;
    info!(
        "Run finished: {} events dispatched, {} dropped at stop time {}",
        run.dispatched, run.dropped, run.stop_time
    );

    Ok(TimelineReport {
        params: params.clone(),
        seed,
        num_infrastructure_nodes: topology.len(),
        timeline,
        run,
        dispatch: network.stats().clone(),
        events: queue.submitted().to_vec(),
    })
}

/// Setup sequence before any event is generated
fn prepare_network(network: &mut SimulatedNetwork, access: &AccessMap, params: &SimulationParams) -> Result<()> {
    let routers: Vec<NodeId> = access.infrastructure_nodes().collect();
    network
        .install(&routers, params.cache_size)
        .wrap_err("Failed to install stack on infrastructure nodes")?;

    // Access nodes cache the whole catalog.
    let mut edge: Vec<NodeId> = access.client_nodes().collect();
    edge.push(access.producer_node());
    network
        .install(&edge, params.num_contents)
        .wrap_err("Failed to install stack on access nodes")?;

    network.install_default_strategy(DEFAULT_STRATEGY);

    for i in 0..access.num_clients() {
        let client = ClientIndex(i);
        let node = access.client_node(client);
        network
            .install_app(client, Box::new(ConsumerApp::new(node, params.prefix.clone())))
            .wrap_err_with(|| format!("Failed to install consumer on node {}", node))?;
    }

    network
        .add_origin(&params.prefix, access.producer_node())
        .wrap_err("Failed to register producer origin")?;
    let routes = network.compute_routes().wrap_err("Failed to compute routes")?;
    info!(
        "Producer on node {} behind router {}, {} routes installed",
        access.producer_node(),
        access.producer_router(),
        routes
    );
    Ok(())
}
