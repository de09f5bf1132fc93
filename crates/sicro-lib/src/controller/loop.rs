//! Tick-driven replica state machine

use super::ControllerState;
use crate::config::ControllerConfig;
use crate::decision::{Decision, DecisionEngine};
use crate::error::ControllerError;
use crate::models::{ScalingEvent, StabilityFlags};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Result of advancing the loop by one sample
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub tick: usize,
    /// Present only on decision ticks
    pub decision: Option<Decision>,
    /// Present only when the decision changed capacity
    pub event: Option<ScalingEvent>,
    /// Replica count recorded for this sample
    pub replicas: u32,
}

/// Controller loop over an ordered stream of flagged samples
pub struct ControllerLoop {
    engine: DecisionEngine,
    decision_interval: usize,
    state: ControllerState,
    next_tick: usize,
    events: Vec<ScalingEvent>,
    replica_history: Vec<u32>,
}

impl ControllerLoop {
    /// Create a loop from a validated configuration
    pub fn new(config: &ControllerConfig) -> Result<Self, ControllerError> {
        config.validate()?;

        Ok(Self {
            engine: DecisionEngine::from_config(config)?,
            decision_interval: config.decision_interval,
            state: ControllerState::new(config.starting_replicas()),
            next_tick: 0,
            events: Vec::new(),
            replica_history: Vec::new(),
        })
    }

    /// Advance one sample
    ///
    /// Decisions run only when `tick % decision_interval == 0`; every tick
    /// records the replica count in effect after any decision.
    pub fn tick(&mut self, timestamp: DateTime<Utc>, flags: StabilityFlags) -> TickOutcome {
        let tick = self.next_tick;
        self.next_tick += 1;

        let mut outcome = TickOutcome {
            tick,
            decision: None,
            event: None,
            replicas: self.state.current_replicas(),
        };

        if tick % self.decision_interval == 0 {
            let decision = self.engine.decide(
                flags.is_alert,
                flags.is_stable,
                self.state.current_replicas(),
            );
            self.state.apply(&decision);

            debug!(
                tick,
                is_alert = flags.is_alert,
                is_stable = flags.is_stable,
                action = %decision.action,
                replicas = decision.new_replicas,
                "Decision evaluated"
            );

            if decision.action.is_change() {
                let event = ScalingEvent {
                    timestamp,
                    action: decision.action,
                    resulting_replicas: decision.new_replicas,
                    tick,
                };
                info!(
                    tick,
                    action = %event.action,
                    replicas = event.resulting_replicas,
                    "Replica count changed"
                );
                self.events.push(event.clone());
                outcome.event = Some(event);
            }

            outcome.decision = Some(decision);
            outcome.replicas = decision.new_replicas;
        }

        self.replica_history.push(outcome.replicas);
        outcome
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Number of ticks processed so far
    pub fn ticks(&self) -> usize {
        self.next_tick
    }

    pub fn events(&self) -> &[ScalingEvent] {
        &self.events
    }

    pub fn replica_history(&self) -> &[u32] {
        &self.replica_history
    }

    /// Consume the loop, returning the audit trail and replica series
    pub fn into_parts(self) -> (Vec<ScalingEvent>, Vec<u32>) {
        (self.events, self.replica_history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScalingAction;
    use chrono::{Duration, TimeZone};

    const ALERT: StabilityFlags = StabilityFlags {
        is_alert: true,
        is_stable: false,
    };
    const STABLE: StabilityFlags = StabilityFlags {
        is_alert: false,
        is_stable: true,
    };
    const QUIET: StabilityFlags = StabilityFlags {
        is_alert: false,
        is_stable: false,
    };

    fn at(minute: usize) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap() + Duration::minutes(minute as i64)
    }

    fn run(controller: &mut ControllerLoop, flags: &[StabilityFlags]) -> Vec<TickOutcome> {
        flags
            .iter()
            .enumerate()
            .map(|(i, f)| controller.tick(at(i), *f))
            .collect()
    }

    #[test]
    fn test_decisions_only_on_interval() {
        let mut controller = ControllerLoop::new(&ControllerConfig::default()).unwrap();
        let outcomes = run(&mut controller, &[ALERT; 25]);

        let decision_ticks: Vec<usize> = outcomes
            .iter()
            .filter(|o| o.decision.is_some())
            .map(|o| o.tick)
            .collect();
        assert_eq!(decision_ticks, vec![0, 10, 20]);

        let events = controller.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].tick, 0);
        assert_eq!(events[0].timestamp, at(0));
        assert_eq!(events[2].resulting_replicas, 4);
    }

    #[test]
    fn test_replicas_held_between_decisions() {
        let mut controller = ControllerLoop::new(&ControllerConfig::default()).unwrap();
        let mut flags = vec![QUIET; 30];
        flags[10] = ALERT;
        flags[11] = ALERT;
        flags[15] = ALERT;
        run(&mut controller, &flags);

        let history = controller.replica_history();
        assert_eq!(history.len(), 30);
        assert!(history[..10].iter().all(|&r| r == 1));
        assert!(history[10..].iter().all(|&r| r == 2));
        assert_eq!(controller.ticks(), 30);
    }

    #[test]
    fn test_scale_down_to_floor() {
        let config = ControllerConfig {
            initial_replicas: Some(3),
            ..Default::default()
        };
        let mut controller = ControllerLoop::new(&config).unwrap();
        run(&mut controller, &[STABLE; 50]);

        let actions: Vec<(ScalingAction, u32)> = controller
            .events()
            .iter()
            .map(|e| (e.action, e.resulting_replicas))
            .collect();
        assert_eq!(
            actions,
            vec![(ScalingAction::ScaleDown, 2), (ScalingAction::ScaleDown, 1)]
        );
        assert_eq!(controller.state().current_replicas(), 1);
    }

    #[test]
    fn test_capped_at_max() {
        let mut controller = ControllerLoop::new(&ControllerConfig::default()).unwrap();
        run(&mut controller, &[ALERT; 100]);

        assert_eq!(controller.events().len(), 4);
        assert_eq!(controller.state().current_replicas(), 5);
        assert!(controller.replica_history().iter().all(|&r| (1..=5).contains(&r)));
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = ControllerConfig {
            decision_interval: 0,
            ..Default::default()
        };
        assert!(matches!(
            ControllerLoop::new(&config),
            Err(ControllerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_no_ticks_no_output() {
        let controller = ControllerLoop::new(&ControllerConfig::default()).unwrap();
        let (events, replicas) = controller.into_parts();
        assert!(events.is_empty());
        assert!(replicas.is_empty());
    }
}
