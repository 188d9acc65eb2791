//! Shared proximity state for the flight controller
//!
//! This module owns the only shared mutable object in the system: the latest
//! range reading per direction, written by the telemetry ingest callback and
//! read by the control loop. Access is guarded by a single mutex with short
//! critical sections so neither side blocks the other for long.

use log::{debug, warn};
use std::sync::Mutex;

/// Horizontal directions around the airframe. Fixed, exhaustive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Positive body-frame X
    Front,
    /// Negative body-frame X
    Back,
    /// Positive body-frame Y
    Left,
    /// Negative body-frame Y
    Right,
}

impl Direction {
    /// All directions, in the fixed evaluation order used by the hold policy.
    pub const ALL: [Direction; 4] = [
        Direction::Front,
        Direction::Back,
        Direction::Left,
        Direction::Right,
    ];

    /// The direction a compensating move should take, away from this one.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Front => Direction::Back,
            Direction::Back => Direction::Front,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Stable index into per-direction arrays.
    pub fn index(self) -> usize {
        match self {
            Direction::Front => 0,
            Direction::Back => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    /// Lowercase name for log messages.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Front => "front",
            Direction::Back => "back",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Permissive initial range (centimeters). The controller starts with every
/// direction reported wide open rather than falsely blocked.
pub const UNKNOWN_RANGE_CM: f32 = 1000.0;

/// Consistent copy of the shared state, taken under one lock acquisition.
///
/// Intrusion flags in the snapshot were cleared from the shared state as part
/// of the same read, so each triggering event is consumed at most once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Snapshot {
    ranges_cm: [f32; 4],
    intrusions: [bool; 4],
}

impl Snapshot {
    /// Build a snapshot directly, with arrays in `Direction::ALL` order.
    pub fn new(ranges_cm: [f32; 4], intrusions: [bool; 4]) -> Self {
        Snapshot {
            ranges_cm,
            intrusions,
        }
    }

    /// Last known range in the given direction (centimeters).
    pub fn range_cm(&self, direction: Direction) -> f32 {
        self.ranges_cm[direction.index()]
    }

    /// Whether an intrusion was pending in the given direction.
    pub fn intruded(&self, direction: Direction) -> bool {
        self.intrusions[direction.index()]
    }
}

struct Readings {
    ranges_cm: [f32; 4],
    intrusions: [bool; 4],
}

/// Concurrently-updated mapping of direction to last known range, plus the
/// edge-triggered intrusion flags consumed by the hold policy.
///
/// `update` is called from the telemetry callback thread; `snapshot` from the
/// control loop. Latest value wins: a missed sample is simply superseded.
pub struct ProximityState {
    threshold_cm: f32,
    readings: Mutex<Readings>,
}

impl ProximityState {
    /// Create a state with all ranges at the permissive sentinel.
    pub fn new(threshold_cm: f32) -> Self {
        ProximityState {
            threshold_cm,
            readings: Mutex::new(Readings {
                ranges_cm: [UNKNOWN_RANGE_CM; 4],
                intrusions: [false; 4],
            }),
        }
    }

    /// Overwrite the stored range for one direction.
    ///
    /// A non-finite or negative sample is an anomaly: it is logged and
    /// discarded, and the previous value is retained. A sample strictly below
    /// the threshold also sets the direction's intrusion flag; re-observing a
    /// low range keeps re-setting the flag, which is idempotent until the
    /// consumer clears it.
    pub fn update(&self, direction: Direction, range_cm: f32) {
        if !range_cm.is_finite() || range_cm < 0.0 {
            warn!(
                "Discarding malformed {} range sample: {}",
                direction, range_cm
            );
            return;
        }

        let mut readings = self.lock();
        readings.ranges_cm[direction.index()] = range_cm;
        if range_cm < self.threshold_cm {
            if !readings.intrusions[direction.index()] {
                debug!(
                    "Intrusion {}: {:.1} cm < {:.1} cm",
                    direction, range_cm, self.threshold_cm
                );
            }
            readings.intrusions[direction.index()] = true;
        }
    }

    /// Atomically copy all four ranges and take the pending intrusion flags.
    ///
    /// The flag clear happens under the same lock as the range copy, so an
    /// `update` can never interleave between the read and the clear.
    pub fn snapshot(&self) -> Snapshot {
        let mut readings = self.lock();
        let snapshot = Snapshot {
            ranges_cm: readings.ranges_cm,
            intrusions: readings.intrusions,
        };
        readings.intrusions = [false; 4];
        snapshot
    }

    // A poisoned lock still holds the last fully written values; recover it
    // rather than wedging the consumer.
    fn lock(&self) -> std::sync::MutexGuard<'_, Readings> {
        match self.readings.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for ProximityState {
    fn default() -> Self {
        ProximityState::new(crate::RoamConfig::default().obstacle_threshold_cm)
    }
}
