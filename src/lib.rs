//! Aeolus Flight Controller - Proximity-Reactive Autonomy for Small Multirotors
//!
//! This library provides the core functionality for the Aeolus flight controller,
//! including the shared proximity state, the policy decision engines, and the
//! cadence-driven control loop that flies the vehicle through the link ports.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod control;
pub mod decision;
pub mod link;
pub mod proximity;

// Re-export commonly used items for easier access
pub use control::{CancelHandle, ControlLoop, Lifecycle};
pub use decision::{Correction, DecisionEngine, Directive, HoldPolicy, RoamPolicy, RoamState};
pub use link::{Deck, DeckMonitor, MotionActuator, RangerSample, StateEstimate, TelemetrySource};
pub use proximity::{Direction, ProximityState, Snapshot, UNKNOWN_RANGE_CM};

use std::path::Path;

/// Main configuration structure for Aeolus
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AeolusConfig {
    /// Which control policy flies the vehicle
    pub policy: PolicyKind,
    /// Flight and lifecycle parameters
    pub flight: FlightConfig,
    /// Roam policy parameters
    pub roam: RoamConfig,
    /// Hold policy parameters
    pub hold: HoldConfig,
    /// Link and telemetry parameters
    pub link: LinkConfig,
}

/// Control policy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Persistent exploration through open directions
    Roam,
    /// Stationary hold that recenters away from intrusions
    Hold,
}

/// Flight and control-loop configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FlightConfig {
    /// Takeoff and cruise height (meters)
    pub default_height_m: f32,
    /// Displacement per roam step (meters)
    pub move_step_m: f32,
    /// Pause before deck detection starts (seconds)
    pub deck_pause_secs: f32,
    /// Wait window per required deck (seconds)
    pub deck_wait_secs: f32,
    /// Settle delay for telemetry to populate (seconds)
    pub settle_secs: f32,
    /// Consecutive actuator failures tolerated before forcing a landing
    pub max_command_failures: u32,
    /// Flight-time guard before the controller is interrupted (seconds)
    pub max_flight_secs: f32,
}

/// Roam policy configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RoamConfig {
    /// Minimum clearance for a direction to be considered open (centimeters)
    pub obstacle_threshold_cm: f32,
    /// Delay between movement steps (milliseconds)
    pub move_delay_ms: u64,
    /// Minimum duration a chosen direction is held (seconds)
    pub min_move_duration_secs: f32,
    /// Pause before re-attempting when all directions are blocked (seconds)
    pub stuck_backoff_secs: f32,
}

/// Hold policy configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HoldConfig {
    /// Clearance below which a reading counts as an intrusion (centimeters)
    pub obstacle_threshold_cm: f32,
    /// Displacement of one compensating move (meters)
    pub nudge_m: f32,
    /// Control loop tick period (milliseconds)
    pub tick_ms: u64,
}

/// Link and telemetry configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LinkConfig {
    /// Fallback connection target when none is given
    pub default_uri: String,
    /// Multiranger sample period (milliseconds)
    pub ranger_period_ms: u64,
    /// Position/velocity estimate period (milliseconds)
    pub state_period_ms: u64,
}

impl Default for AeolusConfig {
    fn default() -> Self {
        AeolusConfig {
            policy: PolicyKind::Roam,
            flight: FlightConfig::default(),
            roam: RoamConfig::default(),
            hold: HoldConfig::default(),
            link: LinkConfig::default(),
        }
    }
}

impl Default for FlightConfig {
    fn default() -> Self {
        FlightConfig {
            default_height_m: 0.5,
            move_step_m: 0.2,
            deck_pause_secs: 2.0,
            deck_wait_secs: 5.0,
            settle_secs: 2.0,
            max_command_failures: 2,
            max_flight_secs: 30.0,
        }
    }
}

impl Default for RoamConfig {
    fn default() -> Self {
        RoamConfig {
            obstacle_threshold_cm: 150.0,
            move_delay_ms: 500,
            min_move_duration_secs: 4.0,
            stuck_backoff_secs: 1.0,
        }
    }
}

impl Default for HoldConfig {
    fn default() -> Self {
        HoldConfig {
            obstacle_threshold_cm: 150.0,
            nudge_m: 0.1,
            tick_ms: 10,
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            default_uri: "radio://0/80/2M/E7E7E7E7E7".to_string(),
            ranger_period_ms: 100,
            state_period_ms: 200,
        }
    }
}

impl AeolusConfig {
    /// Load configuration from the `AEOLUS_CONFIG` YAML file, or defaults when unset.
    pub fn load() -> Result<Self, AeolusError> {
        match std::env::var("AEOLUS_CONFIG") {
            Ok(path) => Self::from_yaml_file(Path::new(&path)),
            Err(_) => Ok(AeolusConfig::default()),
        }
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, AeolusError> {
        let file = std::fs::File::open(path)
            .map_err(|e| AeolusError::Config(format!("cannot open {}: {}", path.display(), e)))?;
        serde_yaml::from_reader(file).map_err(|e| AeolusError::Config(e.to_string()))
    }

    /// Obstacle threshold of the active policy (centimeters).
    pub fn active_threshold_cm(&self) -> f32 {
        match self.policy {
            PolicyKind::Roam => self.roam.obstacle_threshold_cm,
            PolicyKind::Hold => self.hold.obstacle_threshold_cm,
        }
    }
}

/// Aeolus error types
#[derive(Debug)]
pub enum AeolusError {
    /// Link port error
    Link(link::LinkError),
    /// Control loop error
    Control(control::ControlError),
    /// Configuration error
    Config(String),
}

impl std::fmt::Display for AeolusError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AeolusError::Link(e) => write!(f, "Link error: {}", e),
            AeolusError::Control(e) => write!(f, "Control error: {}", e),
            AeolusError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AeolusError {}

impl From<link::LinkError> for AeolusError {
    fn from(e: link::LinkError) -> Self {
        AeolusError::Link(e)
    }
}

impl From<control::ControlError> for AeolusError {
    fn from(e: control::ControlError) -> Self {
        AeolusError::Control(e)
    }
}
