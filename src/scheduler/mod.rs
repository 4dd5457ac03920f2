//! Event scheduling.
//!
//! The timeline submits every action up front through [`EventScheduler`];
//! dispatch happens afterwards, when the queue hands each action to an
//! [`ActionDispatcher`] in time order.

pub mod queue;
pub mod types;

pub use queue::{EventQueue, QueueState, RunSummary};
pub use types::{Action, EventId, ScheduledEvent};

use crate::types::SimTime;

/// Time-ordered callback facility consumed by the timeline driver
pub trait EventScheduler {
    /// Submit `action` to fire at `at`
    fn schedule(&mut self, at: SimTime, action: Action) -> Result<EventId, SchedulerError>;

    /// Stop dispatching at `at`; no submissions are accepted afterwards
    fn stop_at(&mut self, at: SimTime) -> Result<(), SchedulerError>;
}

/// Receiver of dispatched actions
pub trait ActionDispatcher {
    fn dispatch(
        &mut self,
        at: SimTime,
        action: &Action,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Scheduler errors
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Scheduler already stopped, submissions are closed")]
    Stopped,
    #[error("Scheduler already ran to completion")]
    Finished,
    #[error("No stop time issued before run")]
    NoStopTime,
    #[error("Invalid event time: {0}")]
    InvalidTime(f64),
    #[error("Dispatch of {kind} at t={time} failed: {source}")]
    Dispatch {
        time: SimTime,
        kind: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
