//! Timeline driver.
//!
//! Enumerates every event of a run up front and submits it to an
//! [`EventScheduler`]. The driver walks through three states:
//!
//! - `Initializing`: clients connect to content, warming caches while the
//!   producer is still reachable
//! - `Observing`: the producer has been withdrawn; clients keep connecting
//!   and, when enabled, disconnecting
//! - `Draining`: the stop time has been issued, nothing more is drawn
//!
//! The crossing from `Initializing` to `Observing` happens at the first
//! connect cursor value at or past `initialization_period_length`. At that
//! exact instant the driver schedules the producer withdrawal: one route
//! removal per infrastructure router, then the failure of the producer's
//! access link. The first observation connect shares that instant and is
//! submitted after them, so it fires once the producer is gone.
//!
//! Every draw comes from generators seeded by the run seed, so the event
//! list is a pure function of the seed and the parameters.

use log::{debug, info, warn};
use rand::Rng;
use serde::Serialize;

use crate::churn::{ChurnBookkeeper, Withdrawal};
use crate::config::{ConfigError, SimulationParams};
use crate::network::content_name;
use crate::scheduler::{Action, EventScheduler, SchedulerError};
use crate::topology::AccessMap;
use crate::types::{ClientIndex, ContentId, SimTime};
use crate::workload::arrival::adapted_rate;
use crate::workload::{seeded_rng, ArrivalProcess, SimRng, ZipfMandelbrot};

/// Log target of the churn records consumed by offline analysis
pub const CHURN_TARGET: &str = "floodchurn::churn";

/// Phase of the run a connect belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Initialization,
    Observation,
}

/// Driver state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Initializing,
    Observing,
    Draining,
}

/// Parameters the driver needs from [`SimulationParams`]
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineConfig {
    pub num_contents: u32,
    pub zipf_exponent: f64,
    pub connection_rate: f64,
    pub disconnection_rate: f64,
    pub initialization_period_length: f64,
    pub observation_period_length: f64,
    pub start_offset: f64,
    pub hop_limit: u8,
    pub prefix: String,
    pub enable_disconnections: bool,
}

impl From<&SimulationParams> for TimelineConfig {
    fn from(params: &SimulationParams) -> Self {
        Self {
            num_contents: params.num_contents,
            zipf_exponent: params.zipf_exponent,
            connection_rate: params.connection_rate,
            disconnection_rate: params.disconnection_rate,
            initialization_period_length: params.initialization_period_length,
            observation_period_length: params.observation_period_length,
            start_offset: params.start_offset,
            hop_limit: params.hop_limit,
            prefix: params.prefix.clone(),
            enable_disconnections: params.enable_disconnections,
        }
    }
}

impl TimelineConfig {
    pub fn stop_time(&self) -> f64 {
        self.initialization_period_length + self.observation_period_length
    }
}

/// What a generated timeline contains
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimelineSummary {
    pub seed: u64,
    pub initialization_connects: u64,
    pub observation_connects: u64,
    pub disconnects: u64,
    pub scoped_withdrawals: u64,
    /// Instant of the producer withdrawal
    pub boundary_time: f64,
    pub stop_time: f64,
    /// Connections still active once generation ended
    pub active_at_end: u64,
}

/// Generates the event timeline of one run
pub struct TimelineDriver {
    config: TimelineConfig,
    access: AccessMap,
    popularity: ZipfMandelbrot,
    connect_process: ArrivalProcess,
    disconnect_process: ArrivalProcess,
    rng: SimRng,
    book: ChurnBookkeeper,
    connect_time: f64,
    disconnect_time: f64,
    state: DriverState,
    summary: TimelineSummary,
}

impl TimelineDriver {
    pub fn new(config: TimelineConfig, access: AccessMap, seed: u64) -> Result<Self, ConfigError> {
        let mut rng = seeded_rng(seed);
        let popularity = ZipfMandelbrot::new(config.num_contents, 0.0, config.zipf_exponent, rng.gen())?;
        let connect_process = ArrivalProcess::new(config.connection_rate)?;
        let disconnect_process = ArrivalProcess::new(config.disconnection_rate)?;
        debug!(
            "Popularity: {} contents, exponent {}, plateau {}",
            popularity.num_contents(),
            popularity.exponent(),
            popularity.plateau()
        );
        let book = ChurnBookkeeper::new(access.num_clients());

        Ok(Self {
            connect_time: config.start_offset,
            disconnect_time: config.start_offset,
            summary: TimelineSummary {
                seed,
                stop_time: config.stop_time(),
                ..Default::default()
            },
            config,
            access,
            popularity,
            connect_process,
            disconnect_process,
            rng,
            book,
            state: DriverState::Initializing,
        })
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Enumerate the whole run into `scheduler` and issue its stop time.
    ///
    /// Panics if called twice; the driver is single-use.
    pub fn generate(&mut self, scheduler: &mut dyn EventScheduler) -> Result<TimelineSummary, SchedulerError> {
        assert_eq!(self.state, DriverState::Initializing, "timeline already generated");
        let init_end = self.config.initialization_period_length;
        let stop = self.config.stop_time();

        info!("Beginning of Initialization Period");
        loop {
            self.connect(Phase::Initialization, scheduler)?;
            self.connect_time += self.connect_gap();
            if self.connect_time >= init_end {
                break;
            }
        }

        self.schedule_producer_withdrawal(scheduler)?;
        self.state = DriverState::Observing;
        self.disconnect_time = self.connect_time;

        info!("Beginning of Observation Period");
        while self.connect_time < stop {
            self.connect(Phase::Observation, scheduler)?;
            let next = self.connect_time + self.connect_gap();
            if self.config.enable_disconnections {
                // Disconnects past the stop time would never be dispatched.
                self.disconnect_until(next.min(stop), scheduler)?;
            }
            self.connect_time = next;
        }

        scheduler.stop_at(to_time(stop)?)?;
        self.state = DriverState::Draining;
        self.summary.active_at_end = self.book.total_active();
        info!(
            "Timeline generated: {} initialization and {} observation connects, {} disconnects",
            self.summary.initialization_connects, self.summary.observation_connects, self.summary.disconnects
        );

        Ok(self.summary.clone())
    }

    fn connect(&mut self, phase: Phase, scheduler: &mut dyn EventScheduler) -> Result<(), SchedulerError> {
        let client = ClientIndex(self.rng.gen_range(0..self.access.num_clients()));
        let node = self.access.client_node(client);
        let content = self.popularity.next_content();

        info!(target: CHURN_TARGET, "CON {} {} {}", node, content, self.connect_time);
        scheduler.schedule(
            to_time(self.connect_time)?,
            Action::FloodRequest {
                client,
                node,
                content,
                hop_limit: self.config.hop_limit,
            },
        )?;
        self.book
            .connect(client, content)
            .expect("clients are drawn from the bookkeeper's range");

        match phase {
            Phase::Initialization => self.summary.initialization_connects += 1,
            Phase::Observation => self.summary.observation_connects += 1,
        }
        Ok(())
    }

    fn schedule_producer_withdrawal(&mut self, scheduler: &mut dyn EventScheduler) -> Result<(), SchedulerError> {
        let at = to_time(self.connect_time)?;
        self.summary.boundary_time = self.connect_time;
        if self.connect_time >= self.config.stop_time() {
            warn!(
                "Producer withdrawal at t={} falls at or after the stop time {} and will not fire",
                self.connect_time,
                self.config.stop_time()
            );
        }

        // Route withdrawal first: failing the link alone does not keep
        // flooded requests out of the producer's neighbourhood.
        for router in self.access.infrastructure_nodes() {
            scheduler.schedule(
                at,
                Action::RemoveRoute {
                    node: router,
                    prefix: self.config.prefix.clone(),
                    face: None,
                },
            )?;
        }
        scheduler.schedule(
            at,
            Action::FailLink {
                a: self.access.producer_router(),
                b: self.access.producer_node(),
            },
        )?;
        debug!("Producer withdrawal scheduled at t={}", at);
        Ok(())
    }

    fn disconnect_until(&mut self, until: f64, scheduler: &mut dyn EventScheduler) -> Result<(), SchedulerError> {
        while self.disconnect_time < until {
            if self.book.total_active() == 0 {
                warn!(target: CHURN_TARGET, "ERROR: Out of connected content");
                // Idle until the next connect so no withdrawal predates it.
                self.disconnect_time = until;
                break;
            }

            let client = self.pick_client_with_content();
            let node = self.access.client_node(client);
            info!(target: CHURN_TARGET, "PICK {}", node);

            let content = self
                .book
                .pick_random_active(client, &mut self.rng)
                .expect("picked client has active content");
            info!(
                target: CHURN_TARGET,
                "DISCONN {} {} {} {}",
                node,
                content,
                self.disconnect_time,
                self.book.active_count(client, content)
            );

            let outcome = self
                .book
                .disconnect_one(client, content)
                .expect("picked content is active");
            match outcome {
                Withdrawal::FullyWithdrawn => self.schedule_scoped_withdrawal(client, content, scheduler)?,
                Withdrawal::StillActive { remaining } => {
                    debug!("node {} still holds {} connections to {}", node, remaining, content)
                }
            }
            self.summary.disconnects += 1;

            let rate = adapted_rate(self.config.disconnection_rate, self.book.total_active());
            self.disconnect_process
                .set_rate(rate)
                .expect("adapted rate of a positive base rate is positive");
            self.disconnect_time += self.disconnect_gap();
        }
        Ok(())
    }

    fn schedule_scoped_withdrawal(
        &mut self,
        client: ClientIndex,
        content: ContentId,
        scheduler: &mut dyn EventScheduler,
    ) -> Result<(), SchedulerError> {
        let node = self.access.client_node(client);
        let router = self.access.client_router(client);
        info!(target: CHURN_TARGET, "RMV_SIT {} {} {} {}", node, content, self.disconnect_time, 0);

        scheduler.schedule(
            to_time(self.disconnect_time)?,
            Action::RemoveRoute {
                node: router,
                prefix: content_name(&self.config.prefix, content),
                face: Some(node),
            },
        )?;
        self.summary.scoped_withdrawals += 1;
        Ok(())
    }

    /// Retry uniformly until a client with active content comes up.
    ///
    /// Callers guarantee at least one such client exists.
    fn pick_client_with_content(&mut self) -> ClientIndex {
        debug_assert!(self.book.total_active() > 0);
        loop {
            let client = ClientIndex(self.rng.gen_range(0..self.access.num_clients()));
            if !self.book.is_empty(client) {
                return client;
            }
        }
    }

    fn connect_gap(&mut self) -> f64 {
        checked_gap(self.connect_process.sample(&mut self.rng))
    }

    fn disconnect_gap(&mut self) -> f64 {
        checked_gap(self.disconnect_process.sample(&mut self.rng))
    }
}

fn checked_gap(gap: f64) -> f64 {
    assert!(
        gap.is_finite() && gap >= 0.0,
        "inter-arrival sample must be finite and non-negative, got {}",
        gap
    );
    gap
}

fn to_time(secs: f64) -> Result<SimTime, SchedulerError> {
    SimTime::from_secs(secs).ok_or(SchedulerError::InvalidTime(secs))
}
