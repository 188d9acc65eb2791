//! Link-facing ports for Aeolus
//!
//! This module defines everything the core needs from the vehicle link:
//! - Subscribing to periodic telemetry records (ranges, state estimate)
//! - Confirming attached decks before flight
//! - Emitting motion primitives to the actuator
//!
//! The radio transport, device handshake and subscription protocol live
//! behind these traits; the core depends only on the callback contracts.

pub mod sim;

use crate::proximity::{Direction, ProximityState};
use log::debug;
use nalgebra::Vector3;
use std::sync::Arc;
use std::time::Duration;

/// One periodic multiranger record. Distances in centimeters.
#[derive(Clone, Copy, Debug)]
pub struct RangerSample {
    /// Range ahead
    pub front_cm: f32,
    /// Range behind
    pub back_cm: f32,
    /// Range to the left
    pub left_cm: f32,
    /// Range to the right
    pub right_cm: f32,
    /// Vertical clearance, when the deck reports it
    pub up_cm: Option<f32>,
}

impl RangerSample {
    /// Range in the given horizontal direction (centimeters).
    pub fn range_cm(&self, direction: Direction) -> f32 {
        match direction {
            Direction::Front => self.front_cm,
            Direction::Back => self.back_cm,
            Direction::Left => self.left_cm,
            Direction::Right => self.right_cm,
        }
    }
}

/// Position/velocity estimate from the flow deck. SI units.
#[derive(Clone, Copy, Debug)]
pub struct StateEstimate {
    /// Estimated position (meters)
    pub position_m: Vector3<f32>,
    /// Estimated velocity (meters per second)
    pub velocity_mps: Vector3<f32>,
}

/// Attachable hardware capabilities that must be confirmed before their
/// readings are trustworthy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deck {
    /// Optical flow deck for position estimation
    Flow,
    /// Four-way ranger deck for horizontal clearance
    MultiRanger,
}

impl std::fmt::Display for Deck {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Deck::Flow => f.write_str("flow"),
            Deck::MultiRanger => f.write_str("multiranger"),
        }
    }
}

/// Delivery callback for ranger records.
pub type RangerHandler = Box<dyn FnMut(RangerSample) + Send>;
/// Delivery callback for state estimates.
pub type EstimateHandler = Box<dyn FnMut(StateEstimate) + Send>;

/// Periodic telemetry delivery, at least at the requested period,
/// latest-value-wins.
pub trait TelemetrySource {
    /// Arm a periodic ranger subscription invoking `handler` on delivery.
    fn subscribe_ranger(
        &mut self,
        period: Duration,
        handler: RangerHandler,
    ) -> Result<(), LinkError>;

    /// Arm a periodic state-estimate subscription invoking `handler` on delivery.
    fn subscribe_estimate(
        &mut self,
        period: Duration,
        handler: EstimateHandler,
    ) -> Result<(), LinkError>;
}

/// Motion primitives exposed by the vehicle. Calls are fire-and-forget but
/// assumed to complete before the next control tick under normal operation.
pub trait MotionActuator {
    /// Take off and climb to the given height (meters).
    fn take_off(&mut self, height_m: f32) -> Result<(), LinkError>;

    /// Displace the vehicle in a horizontal direction (meters).
    fn move_toward(&mut self, direction: Direction, distance_m: f32) -> Result<(), LinkError>;

    /// Hold altitude in place.
    fn hover(&mut self) -> Result<(), LinkError>;

    /// Descend and stop the motors.
    fn land(&mut self) -> Result<(), LinkError>;
}

/// Deck presence confirmation, gating the transition out of Initializing.
pub trait DeckMonitor {
    /// Block up to `timeout` for the deck to report attached.
    /// Returns whether the deck was confirmed.
    fn wait_attached(&self, deck: Deck, timeout: Duration) -> bool;
}

/// Bind a ranger subscription to the shared proximity state.
///
/// Every delivered sample overwrites all four readings (malformed values are
/// discarded inside `update`) and is traced the way the deck reports it.
pub fn install_ranger_feed(
    source: &mut dyn TelemetrySource,
    state: Arc<ProximityState>,
    period: Duration,
) -> Result<(), LinkError> {
    source.subscribe_ranger(
        period,
        Box::new(move |sample| {
            for direction in Direction::ALL {
                state.update(direction, sample.range_cm(direction));
            }
            match sample.up_cm {
                Some(up_cm) => debug!(
                    "F: {:.1} cm | B: {:.1} cm | L: {:.1} cm | R: {:.1} cm | U: {:.1} cm",
                    sample.front_cm, sample.back_cm, sample.left_cm, sample.right_cm, up_cm
                ),
                None => debug!(
                    "F: {:.1} cm | B: {:.1} cm | L: {:.1} cm | R: {:.1} cm",
                    sample.front_cm, sample.back_cm, sample.left_cm, sample.right_cm
                ),
            }
        }),
    )
}

/// Bind a state-estimate subscription for drift tracing.
///
/// The estimate never drives a control action; hover-centering corrects
/// relative drift only, through the intrusion flags.
pub fn install_estimate_feed(
    source: &mut dyn TelemetrySource,
    period: Duration,
) -> Result<(), LinkError> {
    source.subscribe_estimate(
        period,
        Box::new(move |estimate| {
            debug!(
                "Pos: ({:.2}, {:.2}, {:.2}) m | Vel: ({:.2}, {:.2}, {:.2}) m/s | drift {:.2} m/s",
                estimate.position_m.x,
                estimate.position_m.y,
                estimate.position_m.z,
                estimate.velocity_mps.x,
                estimate.velocity_mps.y,
                estimate.velocity_mps.z,
                estimate.velocity_mps.norm()
            );
        }),
    )
}

/// Link error types
#[derive(Debug)]
pub enum LinkError {
    /// Telemetry subscription could not be armed
    Subscription(String),
    /// A motion command was not accepted
    Command(String),
    /// The link to the vehicle is gone
    Disconnected,
}

impl std::fmt::Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LinkError::Subscription(msg) => write!(f, "Subscription error: {}", msg),
            LinkError::Command(msg) => write!(f, "Command error: {}", msg),
            LinkError::Disconnected => write!(f, "Link disconnected"),
        }
    }
}

impl std::error::Error for LinkError {}
