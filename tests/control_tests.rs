// Integration tests for the control loop: lifecycle, cancellation latency,
// actuator failure escalation, and an end-to-end simulated flight.

use aeolus::control::{ControlError, ControlLoop, Lifecycle};
use aeolus::link::sim::SimulatedLink;
use aeolus::link::{install_ranger_feed, Deck, DeckMonitor, LinkError, MotionActuator};
use aeolus::{Direction, FlightConfig, ProximityState, RoamConfig, RoamPolicy};
use mockall::mock;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

struct InstantDecks;

impl DeckMonitor for InstantDecks {
    fn wait_attached(&self, _deck: Deck, _timeout: Duration) -> bool {
        true
    }
}

// Flight configuration with the readiness waits collapsed for tests.
fn fast_flight() -> FlightConfig {
    FlightConfig {
        deck_pause_secs: 0.0,
        deck_wait_secs: 0.0,
        settle_secs: 0.0,
        ..FlightConfig::default()
    }
}

fn roam_engine(min_move_secs: f32, delay_ms: u64) -> RoamPolicy<StdRng> {
    RoamPolicy::new(
        RoamConfig {
            min_move_duration_secs: min_move_secs,
            move_delay_ms: delay_ms,
            ..RoamConfig::default()
        },
        StdRng::seed_from_u64(7),
    )
}

#[derive(Clone, Default)]
struct RecordingActuator {
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingActuator {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl MotionActuator for RecordingActuator {
    fn take_off(&mut self, height_m: f32) -> Result<(), LinkError> {
        self.push(format!("takeoff {:.1}", height_m));
        Ok(())
    }

    fn move_toward(&mut self, direction: Direction, distance_m: f32) -> Result<(), LinkError> {
        self.push(format!("move {} {:.1}", direction, distance_m));
        Ok(())
    }

    fn hover(&mut self) -> Result<(), LinkError> {
        self.push("hover".to_string());
        Ok(())
    }

    fn land(&mut self) -> Result<(), LinkError> {
        self.push("land".to_string());
        Ok(())
    }
}

mock! {
    Flier {}

    impl MotionActuator for Flier {
        fn take_off(&mut self, height_m: f32) -> Result<(), LinkError>;
        fn move_toward(&mut self, direction: Direction, distance_m: f32) -> Result<(), LinkError>;
        fn hover(&mut self) -> Result<(), LinkError>;
        fn land(&mut self) -> Result<(), LinkError>;
    }
}

#[test]
fn starts_in_initializing() {
    let (control, _cancel) = ControlLoop::new(
        Arc::new(ProximityState::default()),
        RecordingActuator::default(),
        fast_flight(),
    );
    assert_eq!(control.lifecycle(), Lifecycle::Initializing);
}

#[test]
fn cancellation_mid_dwell_lands_within_one_tick() {
    // A 10 s dwell with a 50 ms tick: the interrupt must win by ticks, not dwell.
    let proximity = Arc::new(ProximityState::default());
    let actuator = RecordingActuator::default();
    let observer = actuator.clone();
    let (mut control, cancel) = ControlLoop::new(proximity, actuator, fast_flight());

    let worker = thread::spawn(move || {
        let mut engine = roam_engine(10.0, 50);
        let result = control.run(&mut engine, &InstantDecks);
        (result, control.lifecycle())
    });

    thread::sleep(Duration::from_millis(150));
    let cancelled_at = Instant::now();
    cancel.cancel();
    let (result, lifecycle) = worker.join().unwrap();

    assert!(cancelled_at.elapsed() < Duration::from_secs(1));
    assert!(result.is_ok());
    assert_eq!(lifecycle, Lifecycle::Terminated);

    let calls = observer.calls();
    assert!(calls.iter().any(|call| call.starts_with("move")));
    assert_eq!(calls.last().map(String::as_str), Some("land"));
}

#[test]
fn repeated_actuator_failures_escalate_to_landing() {
    let mut flier = MockFlier::new();
    flier.expect_take_off().times(1).returning(|_| Ok(()));
    flier
        .expect_move_toward()
        .times(2)
        .returning(|_, _| Err(LinkError::Command("radio timeout".to_string())));
    flier.expect_land().times(1).returning(|| Ok(()));

    let (mut control, _cancel) = ControlLoop::new(
        Arc::new(ProximityState::default()),
        flier,
        fast_flight(),
    );
    let mut engine = roam_engine(4.0, 10);
    let result = control.run(&mut engine, &InstantDecks);

    assert!(matches!(result, Err(ControlError::ActuatorFailure(_))));
    assert_eq!(control.lifecycle(), Lifecycle::Terminated);
}

#[test]
fn second_landing_failure_terminates_immediately() {
    let mut flier = MockFlier::new();
    flier
        .expect_land()
        .times(2)
        .returning(|| Err(LinkError::Disconnected));

    let flight = FlightConfig {
        deck_pause_secs: 0.2,
        deck_wait_secs: 0.0,
        settle_secs: 0.0,
        ..FlightConfig::default()
    };
    let (mut control, cancel) = ControlLoop::new(Arc::new(ProximityState::default()), flier, flight);

    // Interrupt during the readiness pause: no takeoff, straight to landing.
    cancel.cancel();
    let mut engine = roam_engine(4.0, 10);
    let result = control.run(&mut engine, &InstantDecks);

    assert!(matches!(result, Err(ControlError::LandingFailure(_))));
    assert_eq!(control.lifecycle(), Lifecycle::Terminated);
}

#[test]
fn simulated_flight_runs_end_to_end() {
    let link = SimulatedLink::new([400.0, 400.0, 400.0, 400.0]);
    let proximity = Arc::new(ProximityState::new(150.0));

    let mut telemetry = link.clone();
    install_ranger_feed(&mut telemetry, proximity.clone(), Duration::from_millis(20)).unwrap();

    let (mut control, cancel) = ControlLoop::new(proximity, link.clone(), fast_flight());
    let decks = link.clone();
    let worker = thread::spawn(move || {
        let mut engine = roam_engine(0.2, 20);
        let result = control.run(&mut engine, &decks);
        (result, control.lifecycle())
    });

    // Let it roam, then close the room so the stuck path runs too.
    thread::sleep(Duration::from_millis(250));
    for direction in Direction::ALL {
        link.set_wall_cm(direction, 50.0);
    }
    thread::sleep(Duration::from_millis(150));
    cancel.cancel();
    let (result, lifecycle) = worker.join().unwrap();

    assert!(result.is_ok());
    assert_eq!(lifecycle, Lifecycle::Terminated);
    assert!(!link.is_airborne());
    link.shutdown();
}
