// control/mod.rs

// Drives the configured decision engine against the live proximity state on a
// cadence, enforcing minimum dwell via the engine and translating directives
// into actuator calls. Owns the controller lifecycle (Initializing -> Armed ->
// Active -> Landing -> Terminated) and the cancellable tick sleep, so a manual
// interrupt always lands the vehicle within one tick.

// Dependencies
use crate::decision::{DecisionEngine, Directive};
use crate::link::{Deck, DeckMonitor, MotionActuator};
use crate::proximity::ProximityState;
use crate::FlightConfig;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Controller lifecycle states
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Waiting for deck confirmation and telemetry
    Initializing,
    /// Ready to take off
    Armed,
    /// Flying under the decision engine
    Active,
    /// Land command issued
    Landing,
    /// Motors stopped, loop exited
    Terminated,
}

/// Handle used to interrupt the control loop from another thread.
///
/// Dropping every handle counts as an interrupt: a controller nobody can
/// reach must land, not keep flying.
#[derive(Clone)]
pub struct CancelHandle {
    tx: Sender<()>,
}

impl CancelHandle {
    /// Request an orderly landing. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.try_send(());
    }
}

/// Control error types
#[derive(Debug)]
pub enum ControlError {
    /// Repeated actuator failures forced the flight to end
    ActuatorFailure(String),
    /// The land command itself failed twice
    LandingFailure(String),
}

impl std::fmt::Display for ControlError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ControlError::ActuatorFailure(msg) => write!(f, "Actuator failure: {}", msg),
            ControlError::LandingFailure(msg) => write!(f, "Landing failure: {}", msg),
        }
    }
}

impl std::error::Error for ControlError {}

/// The actor that flies the vehicle: reads snapshots, asks the decision
/// engine, and sequences actuator calls on a cadence.
pub struct ControlLoop<A: MotionActuator> {
    proximity: Arc<ProximityState>,
    actuator: A,
    config: FlightConfig,
    lifecycle: Lifecycle,
    cancel_rx: Receiver<()>,
    consecutive_failures: u32,
}

impl<A: MotionActuator> ControlLoop<A> {
    /// Create a control loop and the handle that can interrupt it.
    pub fn new(
        proximity: Arc<ProximityState>,
        actuator: A,
        config: FlightConfig,
    ) -> (Self, CancelHandle) {
        let (tx, rx) = bounded(1);
        (
            ControlLoop {
                proximity,
                actuator,
                config,
                lifecycle: Lifecycle::Initializing,
                cancel_rx: rx,
                consecutive_failures: 0,
            },
            CancelHandle { tx },
        )
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Run the controller to completion: readiness wait, takeoff, cadence
    /// ticks until interrupted or escalated, then landing.
    pub fn run(
        &mut self,
        engine: &mut dyn DecisionEngine,
        decks: &dyn DeckMonitor,
    ) -> Result<(), ControlError> {
        if self.await_readiness(decks) {
            info!("Interrupted before takeoff. Landing...");
            return self.land();
        }

        if let Err(e) = self.actuator.take_off(self.config.default_height_m) {
            error!("Takeoff failed: {}", e);
            self.land()?;
            return Err(ControlError::ActuatorFailure(e.to_string()));
        }
        self.transition(Lifecycle::Active);
        info!("Taking off to {:.1} m", self.config.default_height_m);

        let mut escalation = None;
        loop {
            let snapshot = self.proximity.snapshot();
            let directive = engine.decide(&snapshot, Instant::now());
            match self.dispatch(&directive, engine) {
                Ok(pause) => {
                    if self.pause(pause) {
                        info!("Manual interrupt. Landing...");
                        break;
                    }
                }
                Err(e) => {
                    escalation = Some(e);
                    break;
                }
            }
        }

        self.land()?;
        match escalation {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // Deck confirmation and telemetry settle, within bounded wait windows.
    // Timeouts are non-fatal: the loop proceeds degraded with a warning.
    // Returns whether a cancel arrived during the wait.
    fn await_readiness(&mut self, decks: &dyn DeckMonitor) -> bool {
        info!("Waiting for deck detection...");
        if self.pause(Duration::from_secs_f32(self.config.deck_pause_secs)) {
            return true;
        }

        let window = Duration::from_secs_f32(self.config.deck_wait_secs);
        for deck in [Deck::Flow, Deck::MultiRanger] {
            if decks.wait_attached(deck, window) {
                info!("{} deck is attached.", deck);
            } else {
                warn!(
                    "{} deck not confirmed within {:.0?}; proceeding unconfirmed",
                    deck, window
                );
            }
        }

        info!("Giving time for telemetry to populate...");
        if self.pause(Duration::from_secs_f32(self.config.settle_secs)) {
            return true;
        }
        self.transition(Lifecycle::Armed);
        false
    }

    // Translate one directive into actuator calls. A failed call abandons the
    // directive for this tick only; hitting the consecutive-failure limit
    // escalates, which the caller answers with an immediate landing.
    fn dispatch(
        &mut self,
        directive: &Directive,
        engine: &dyn DecisionEngine,
    ) -> Result<Duration, ControlError> {
        let outcome = match directive {
            Directive::Move(direction) => self
                .actuator
                .move_toward(*direction, self.config.move_step_m)
                .map(|_| engine.cadence()),
            Directive::Hover => self.actuator.hover().map(|_| engine.backoff()),
            Directive::Correct(corrections) => {
                let mut result = Ok(engine.cadence());
                for correction in corrections {
                    if let Err(e) = self
                        .actuator
                        .move_toward(correction.response, correction.distance_m)
                    {
                        result = Err(e);
                        break;
                    }
                }
                result
            }
        };

        match outcome {
            Ok(pause) => {
                self.consecutive_failures = 0;
                Ok(pause)
            }
            Err(e) => {
                self.consecutive_failures += 1;
                error!(
                    "Actuator command failed ({}), failure {} of {}",
                    e, self.consecutive_failures, self.config.max_command_failures
                );
                if self.consecutive_failures >= self.config.max_command_failures {
                    error!("Repeated actuator failures. Forcing landing...");
                    Err(ControlError::ActuatorFailure(e.to_string()))
                } else {
                    Ok(engine.cadence())
                }
            }
        }
    }

    // Landing is attempted exactly once per run, with one retry; a second
    // failure during Landing terminates immediately.
    fn land(&mut self) -> Result<(), ControlError> {
        self.transition(Lifecycle::Landing);
        info!("Landing...");
        if let Err(first) = self.actuator.land() {
            error!("Land command failed ({}), retrying", first);
            if let Err(second) = self.actuator.land() {
                error!("Land retry failed ({}). Terminating.", second);
                self.transition(Lifecycle::Terminated);
                return Err(ControlError::LandingFailure(second.to_string()));
            }
        }
        self.transition(Lifecycle::Terminated);
        info!("Landed.");
        Ok(())
    }

    // Cancellable sleep: the only intentional suspension point in the loop.
    // Returns true when a cancel arrived (or every handle was dropped).
    fn pause(&self, duration: Duration) -> bool {
        match self.cancel_rx.recv_timeout(duration) {
            Ok(()) => true,
            Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        }
    }

    fn transition(&mut self, next: Lifecycle) {
        info!("Controller {:?} -> {:?}", self.lifecycle, next);
        self.lifecycle = next;
    }
}

// Weaknesses:
// - Deck waits block uninterruptibly for up to their window; a cancel during
//   wait_attached is only observed at the next pause.
// Future improvement: Pass the cancel receiver into DeckMonitor implementations.
// - Consecutive-failure counting treats a whole Correct batch as one outcome;
//   a batch that half-applied still resets the counter on the next success.
// - No telemetry-staleness check; a silent sensor feed leaves the loop flying
//   on the last readings until something else trips.

// Current Functionality:
// - Lifecycle FSM with logged transitions and bounded readiness waits.
// - Cadence ticks: snapshot, decide, dispatch, cancellable sleep.
// - Per-tick actuator fault tolerance with repeated-failure escalation.
// - Unconditional landing attempt on every exit path, one retry allowed.
