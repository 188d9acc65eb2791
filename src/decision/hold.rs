// src/decision/hold.rs
// Stationary hold policy: hold position, and answer each pending intrusion
// with one bounded move in the opposite direction.

// Imports shared decision types.
use crate::decision::{Correction, DecisionEngine, Directive};
use crate::proximity::{Direction, Snapshot};
use crate::HoldConfig;
use log::info;
use std::time::{Duration, Instant};

/// Hold policy decision engine.
///
/// Intrusion detection itself happens at ingest (a range strictly below the
/// threshold edge-sets a flag); this engine only consumes the flags carried
/// by the snapshot, in fixed Front, Back, Left, Right order for determinism.
pub struct HoldPolicy {
    config: HoldConfig,
}

impl HoldPolicy {
    /// Create a hold policy with the given configuration.
    pub fn new(config: HoldConfig) -> Self {
        HoldPolicy { config }
    }
}

impl DecisionEngine for HoldPolicy {
    fn decide(&mut self, snapshot: &Snapshot, _now: Instant) -> Directive {
        let mut corrections = Vec::new();
        for direction in Direction::ALL {
            if snapshot.intruded(direction) {
                let response = direction.opposite();
                info!(
                    "Obstacle {} (<{:.0} cm). Moving {} {:.1} m",
                    direction, self.config.obstacle_threshold_cm, response, self.config.nudge_m
                );
                corrections.push(Correction {
                    intruder: direction,
                    response,
                    distance_m: self.config.nudge_m,
                });
            }
        }
        Directive::Correct(corrections)
    }

    fn cadence(&self) -> Duration {
        Duration::from_millis(self.config.tick_ms)
    }
}

// SWOT Analysis
// Strengths:
// - Determinism: Fixed evaluation order makes corrections reproducible for a given flag set.
// - Simplicity: Consumes pre-computed flags; no threshold logic duplicated from ingest.
// - Safety: Each flag yields exactly one bounded move, so a single intrusion cannot runaway.
//
// Weaknesses:
// - Re-trigger: An obstacle that stays inside the threshold re-sets its flag on the next
//   sample, so corrections repeat until clearance is regained (literal source behavior).
// - No hysteresis: A reading oscillating around the threshold alternates trigger/no-trigger.
// - Drift-blind: Position estimate is traced but never used; only intrusions recenter.
//
// Opportunities:
// - Hysteresis band: A release threshold above 150 cm would damp boundary oscillation.
// - Proportional nudge: Scale the move by how far inside the threshold the reading is.
//
// Threats:
// - Opposing intrusions: Front and back both set commands two opposite nudges in one tick,
//   which cancel only approximately on a real airframe.
