//! Decision engines for Aeolus
//!
//! This module maps a proximity snapshot to a motion directive. Both control
//! policies consume the same snapshot shape and differ only in decision
//! function and output granularity, so they sit behind one `DecisionEngine`
//! seam that the control loop drives on a cadence.

mod hold;
mod roam;

pub use hold::HoldPolicy;
pub use roam::{RoamPolicy, RoamState};

use crate::proximity::{Direction, Snapshot};
use std::time::{Duration, Instant};

/// A single compensating micro-move away from an intruding direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correction {
    /// Direction the intrusion was sensed in
    pub intruder: Direction,
    /// Direction the vehicle moves to compensate
    pub response: Direction,
    /// Bounded displacement of the move (meters)
    pub distance_m: f32,
}

/// Output of a decision engine for one tick.
#[derive(Clone, Debug, PartialEq)]
pub enum Directive {
    /// Step in the given direction
    Move(Direction),
    /// No direction is safe; hold altitude in place
    Hover,
    /// Compensating moves for pending intrusions; empty means hold position
    Correct(Vec<Correction>),
}

/// Policy seam between the control loop and the decision logic.
///
/// `decide` is pure with respect to the snapshot: it reads the passed copy,
/// never the live shared state, so a decision cannot observe a torn update.
pub trait DecisionEngine: Send {
    /// Map the current snapshot to a motion directive.
    fn decide(&mut self, snapshot: &Snapshot, now: Instant) -> Directive;

    /// Sleep between ticks while the vehicle is moving normally.
    fn cadence(&self) -> Duration;

    /// Sleep after a `Hover` directive before re-attempting.
    fn backoff(&self) -> Duration {
        self.cadence()
    }
}
