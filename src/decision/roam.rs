// src/decision/roam.rs
// Persistent exploration policy: pick an open direction at random, commit to
// it for a minimum dwell, and hover with a backoff when everything is blocked.

// Imports dependencies and shared types.
// - rand: Substitutable random source for the direction shuffle.
// - Snapshot, Directive: Shared decision types.
use crate::decision::{DecisionEngine, Directive};
use crate::proximity::{Direction, Snapshot};
use crate::RoamConfig;
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::{Duration, Instant};

/// Mutable roaming state: the chosen direction, when its dwell started, and
/// whether the vehicle is currently stuck with no safe direction.
#[derive(Clone, Copy, Debug, Default)]
pub struct RoamState {
    current: Option<(Direction, Instant)>,
    stuck: bool,
}

impl RoamState {
    /// Direction currently being flown, if any.
    pub fn direction(&self) -> Option<Direction> {
        self.current.map(|(direction, _)| direction)
    }

    /// Whether the last decision found no safe direction.
    pub fn is_stuck(&self) -> bool {
        self.stuck
    }
}

/// Roam policy decision engine.
///
/// The random source is supplied by the caller so tests can seed it; ties
/// between equally open directions are broken by the shuffle order, not by a
/// canonical array order.
pub struct RoamPolicy<R: Rng> {
    config: RoamConfig,
    rng: R,
    state: RoamState,
}

impl<R: Rng> RoamPolicy<R> {
    /// Create a roam policy with the given configuration and random source.
    pub fn new(config: RoamConfig, rng: R) -> Self {
        RoamPolicy {
            config,
            rng,
            state: RoamState::default(),
        }
    }

    /// Current roaming state, for observability and tests.
    pub fn state(&self) -> RoamState {
        self.state
    }

    fn min_move_duration(&self) -> Duration {
        Duration::from_secs_f32(self.config.min_move_duration_secs)
    }

    // Strict comparison: a range exactly at the threshold is blocked.
    fn open(&self, snapshot: &Snapshot, direction: Direction) -> bool {
        snapshot.range_cm(direction) > self.config.obstacle_threshold_cm
    }
}

impl<R: Rng + Send> DecisionEngine for RoamPolicy<R> {
    fn decide(&mut self, snapshot: &Snapshot, now: Instant) -> Directive {
        // Mid-dwell with the path still open: keep going, no re-decision.
        if let Some((direction, started)) = self.state.current {
            if now.duration_since(started) < self.min_move_duration() {
                if self.open(snapshot, direction) {
                    return Directive::Move(direction);
                }
                info!(
                    "Obstacle detected {} at {:.1} cm",
                    direction,
                    snapshot.range_cm(direction)
                );
            }
        }

        // Dwell expired or path blocked: re-evaluate in random order.
        let mut order = Direction::ALL;
        order.shuffle(&mut self.rng);
        for direction in order {
            if self.open(snapshot, direction) {
                info!("Moving {}...", direction);
                self.state.current = Some((direction, now));
                self.state.stuck = false;
                return Directive::Move(direction);
            }
        }

        if !self.state.stuck {
            info!("All directions blocked. Hovering in place.");
        }
        self.state.current = None;
        self.state.stuck = true;
        Directive::Hover
    }

    fn cadence(&self) -> Duration {
        Duration::from_millis(self.config.move_delay_ms)
    }

    fn backoff(&self) -> Duration {
        Duration::from_secs_f32(self.config.stuck_backoff_secs)
    }
}
