// src/main.rs
// Entry point for Aeolus, wiring the vehicle link, proximity state, decision
// engine and control loop into one flight.

// Imports dependencies and Aeolus modules.
// - env_logger: Logging for flight traces and anomalies.
// - SimulatedLink: Bench implementation of the link ports; a radio transport
//   implementing the same traits slots in for real flights.
use aeolus::link::sim::SimulatedLink;
use aeolus::link::{install_estimate_feed, install_ranger_feed};
use aeolus::{
    AeolusConfig, AeolusError, ControlLoop, DecisionEngine, HoldPolicy, PolicyKind, ProximityState,
    RoamPolicy,
};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Main function to initialize and fly Aeolus.
/// Wires telemetry ingest, the configured policy and the control loop.
fn main() -> Result<(), AeolusError> {
    // Initialize logging for flight traces
    env_logger::init();
    info!("Starting Aeolus flight controller...");

    // Configuration: AEOLUS_CONFIG YAML file, or defaults
    let config = AeolusConfig::load()?;

    // Connection target: CLI argument, then AEOLUS_URI, then the default
    let uri = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("AEOLUS_URI").ok())
        .unwrap_or_else(|| config.link.default_uri.clone());
    info!("Connecting to {}", uri);

    // Bench link: a small room around the vehicle
    let mut link = SimulatedLink::new([400.0, 320.0, 260.0, 500.0]);

    // Shared proximity state, written by the telemetry callback
    let proximity = Arc::new(ProximityState::new(config.active_threshold_cm()));
    install_ranger_feed(
        &mut link,
        proximity.clone(),
        Duration::from_millis(config.link.ranger_period_ms),
    )?;
    if config.policy == PolicyKind::Hold {
        install_estimate_feed(&mut link, Duration::from_millis(config.link.state_period_ms))?;
    }

    // Decision engine for the configured policy
    let mut engine: Box<dyn DecisionEngine> = match config.policy {
        PolicyKind::Roam => Box::new(RoamPolicy::new(config.roam.clone(), StdRng::from_entropy())),
        PolicyKind::Hold => Box::new(HoldPolicy::new(config.hold.clone())),
    };

    // Control loop and its interrupt handle
    let (mut control, cancel) = ControlLoop::new(proximity, link.clone(), config.flight.clone());

    // Flight-time guard: feeds the same handle a manual interrupt would.
    // The thread also keeps the handle alive for the whole window.
    let flight_window = Duration::from_secs_f32(config.flight.max_flight_secs);
    let _guard = thread::spawn(move || {
        thread::sleep(flight_window);
        info!("Flight window elapsed. Interrupting...");
        cancel.cancel();
    });

    let result = control.run(engine.as_mut(), &link);

    link.shutdown();
    result?;

    info!("Flight complete");
    Ok(())
}
