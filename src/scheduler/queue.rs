//! Deterministic discrete-event queue.
//!
//! Events are dispatched in non-decreasing time order; events sharing a
//! timestamp are dispatched in submission order. The queue has an explicit
//! lifecycle:
//!
//! 1. `Accepting`: submissions allowed
//! 2. `Stopped`: a stop time has been issued, submissions are rejected
//! 3. `Finished`: `run` has drained the queue
//!
//! Only events strictly before the stop time are dispatched.

use log::{debug, info, warn};
use std::collections::BinaryHeap;

use super::types::{Action, EventId, ScheduledEvent};
use super::{ActionDispatcher, EventScheduler, SchedulerError};
use crate::types::SimTime;

/// Lifecycle state of an [`EventQueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Accepting,
    Stopped,
    Finished,
}

/// Counters reported once the queue has been drained
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunSummary {
    /// Events dispatched before the stop time
    pub dispatched: usize,
    /// Events at or after the stop time, never dispatched
    pub dropped: usize,
    /// Time of the last dispatched event
    pub last_dispatch: Option<SimTime>,
    pub stop_time: SimTime,
}

/// Priority-queue implementation of [`EventScheduler`]
#[derive(Debug)]
pub struct EventQueue {
    pending: BinaryHeap<ScheduledEvent>,
    submitted: Vec<ScheduledEvent>,
    next_id: u64,
    stop_time: Option<SimTime>,
    now: SimTime,
    state: QueueState,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            pending: BinaryHeap::new(),
            submitted: Vec::new(),
            next_id: 0,
            stop_time: None,
            now: SimTime::ZERO,
            state: QueueState::Accepting,
        }
    }

    pub fn state(&self) -> QueueState {
        self.state
    }

    pub fn stop_time(&self) -> Option<SimTime> {
        self.stop_time
    }

    /// Current simulated time; advances only while running
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Every submitted event, in submission order
    pub fn submitted(&self) -> &[ScheduledEvent] {
        &self.submitted
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Dispatch every event before the stop time, then discard the rest.
    ///
    /// A dispatch failure aborts the run; the queue is left `Finished`.
    pub fn run(&mut self, dispatcher: &mut dyn ActionDispatcher) -> Result<RunSummary, SchedulerError> {
        let stop_time = match (self.state, self.stop_time) {
            (QueueState::Stopped, Some(stop)) => stop,
            (QueueState::Finished, _) => return Err(SchedulerError::Finished),
            _ => return Err(SchedulerError::NoStopTime),
        };
        info!("Dispatching {} events until t={}", self.pending.len(), stop_time);

        let mut dispatched = 0;
        let mut last_dispatch = None;
        let result = loop {
            let due = matches!(self.pending.peek(), Some(next) if next.time < stop_time);
            if !due {
                break Ok(());
            }
            let Some(event) = self.pending.pop() else { break Ok(()) };

            self.now = event.time;
            debug!("t={} dispatch {} (event {})", event.time, event.action.kind(), event.id.0);
            if let Err(source) = dispatcher.dispatch(event.time, &event.action) {
                break Err(SchedulerError::Dispatch {
                    time: event.time,
                    kind: event.action.kind(),
                    source,
                });
            }
            dispatched += 1;
            last_dispatch = Some(event.time);
        };

        let dropped = self.pending.len();
        if result.is_ok() {
            for event in self.pending.iter().filter(|e| matches!(e.action, Action::FailLink { .. })) {
                warn!("Link failure at t={} falls at or after the stop time and is dropped", event.time);
            }
        }
        self.pending.clear();
        self.state = QueueState::Finished;
        result?;

        if dropped > 0 {
            info!("{} events at or after the stop time were not dispatched", dropped);
        }
        Ok(RunSummary {
            dispatched,
            dropped,
            last_dispatch,
            stop_time,
        })
    }
}

impl EventScheduler for EventQueue {
    fn schedule(&mut self, at: SimTime, action: Action) -> Result<EventId, SchedulerError> {
        match self.state {
            QueueState::Accepting => {}
            QueueState::Stopped => return Err(SchedulerError::Stopped),
            QueueState::Finished => return Err(SchedulerError::Finished),
        }
        if at < SimTime::ZERO {
            return Err(SchedulerError::InvalidTime(at.as_secs()));
        }

        let id = EventId(self.next_id);
        self.next_id += 1;
        let event = ScheduledEvent { time: at, id, action };
        self.submitted.push(event.clone());
        self.pending.push(event);
        Ok(id)
    }

    fn stop_at(&mut self, at: SimTime) -> Result<(), SchedulerError> {
        match self.state {
            QueueState::Accepting => {}
            QueueState::Stopped => return Err(SchedulerError::Stopped),
            QueueState::Finished => return Err(SchedulerError::Finished),
        }
        if at < SimTime::ZERO {
            return Err(SchedulerError::InvalidTime(at.as_secs()));
        }
        self.stop_time = Some(at);
        self.state = QueueState::Stopped;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<(f64, Action)>,
        fail_on: Option<usize>,
    }

    impl ActionDispatcher for Recorder {
        fn dispatch(
            &mut self,
            at: SimTime,
            action: &Action,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            if self.fail_on == Some(self.seen.len()) {
                return Err("collaborator failure".into());
            }
            self.seen.push((at.as_secs(), action.clone()));
            Ok(())
        }
    }

    fn t(secs: f64) -> SimTime {
        SimTime::from_secs(secs).unwrap()
    }

    fn link(a: usize) -> Action {
        Action::FailLink { a: NodeId(a), b: NodeId(a + 1) }
    }

    #[test]
    fn test_dispatch_in_time_then_submission_order() {
        let mut queue = EventQueue::new();
        queue.schedule(t(3.0), link(0)).unwrap();
        queue.schedule(t(1.0), link(1)).unwrap();
        queue.schedule(t(3.0), link(2)).unwrap();
        queue.schedule(t(2.0), link(3)).unwrap();
        queue.stop_at(t(10.0)).unwrap();

        let mut recorder = Recorder::default();
        let summary = queue.run(&mut recorder).unwrap();

        let order: Vec<_> = recorder.seen.iter().map(|(time, a)| (*time, a.clone())).collect();
        assert_eq!(
            order,
            vec![(1.0, link(1)), (2.0, link(3)), (3.0, link(0)), (3.0, link(2))]
        );
        assert_eq!(summary.dispatched, 4);
        assert_eq!(summary.dropped, 0);
        assert_eq!(summary.last_dispatch, Some(t(3.0)));
        assert_eq!(queue.state(), QueueState::Finished);
    }

    #[test]
    fn test_events_at_stop_time_are_dropped() {
        let mut queue = EventQueue::new();
        queue.schedule(t(4.999), link(0)).unwrap();
        queue.schedule(t(5.0), link(1)).unwrap();
        queue.schedule(t(6.0), link(2)).unwrap();
        queue.stop_at(t(5.0)).unwrap();

        let mut recorder = Recorder::default();
        let summary = queue.run(&mut recorder).unwrap();
        assert_eq!(recorder.seen.len(), 1);
        assert_eq!(summary.dispatched, 1);
        assert_eq!(summary.dropped, 2);
    }

    #[test]
    fn test_lifecycle_rejects_late_submissions() {
        let mut queue = EventQueue::new();
        queue.stop_at(t(1.0)).unwrap();
        assert!(matches!(queue.schedule(t(0.5), link(0)), Err(SchedulerError::Stopped)));

        queue.run(&mut Recorder::default()).unwrap();
        assert!(matches!(queue.schedule(t(0.5), link(0)), Err(SchedulerError::Finished)));
        assert!(matches!(queue.run(&mut Recorder::default()), Err(SchedulerError::Finished)));
    }

    #[test]
    fn test_run_requires_stop_time() {
        let mut queue = EventQueue::new();
        queue.schedule(t(0.5), link(0)).unwrap();
        assert!(matches!(queue.run(&mut Recorder::default()), Err(SchedulerError::NoStopTime)));
    }

    #[test]
    fn test_negative_time_rejected() {
        let mut queue = EventQueue::new();
        assert!(matches!(
            queue.schedule(t(-1.0), link(0)),
            Err(SchedulerError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_dispatch_failure_is_fatal() {
        let mut queue = EventQueue::new();
        queue.schedule(t(1.0), link(0)).unwrap();
        queue.schedule(t(2.0), link(1)).unwrap();
        queue.stop_at(t(5.0)).unwrap();

        let mut recorder = Recorder { fail_on: Some(1), ..Default::default() };
        let err = queue.run(&mut recorder).unwrap_err();
        assert!(matches!(err, SchedulerError::Dispatch { kind: "fail_link", .. }));
        assert_eq!(recorder.seen.len(), 1);
        assert_eq!(queue.state(), QueueState::Finished);
    }

    #[test]
    fn test_submitted_keeps_submission_order() {
        let mut queue = EventQueue::new();
        queue.schedule(t(2.0), link(0)).unwrap();
        queue.schedule(t(1.0), link(1)).unwrap();
        let ids: Vec<_> = queue.submitted().iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(queue.pending_len(), 2);
    }
}
