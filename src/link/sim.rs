// src/link/sim.rs
// Simulated vehicle link for bench runs: implements the telemetry, deck and
// actuator ports over a tiny room model so the controller flies end-to-end
// without hardware.

// Imports the port contracts and the room math types.
use super::{
    Deck, DeckMonitor, EstimateHandler, LinkError, MotionActuator, RangerHandler, RangerSample,
    StateEstimate, TelemetrySource,
};
use crate::proximity::Direction;
use log::{debug, info};
use nalgebra::Vector3;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

// Walls closer than this stop yielding: the vehicle is against the obstacle.
const MIN_WALL_CM: f32 = 10.0;
// Simulated vertical clearance reported with every ranger sample.
const CEILING_CM: f32 = 300.0;

struct Room {
    walls_cm: [f32; 4],
    position_m: Vector3<f32>,
    velocity_mps: Vector3<f32>,
    airborne: bool,
}

/// Simulated link: one shared room, one delivery thread per subscription.
///
/// Clones share the same room, so the same instance can serve as telemetry
/// source, deck monitor and actuator. Call `shutdown` to stop and join the
/// delivery threads.
#[derive(Clone)]
pub struct SimulatedLink {
    room: Arc<Mutex<Room>>,
    running: Arc<AtomicBool>,
    threads: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl SimulatedLink {
    /// Create a link with the given initial wall distances, in
    /// `Direction::ALL` order (centimeters).
    pub fn new(walls_cm: [f32; 4]) -> Self {
        SimulatedLink {
            room: Arc::new(Mutex::new(Room {
                walls_cm,
                position_m: Vector3::zeros(),
                velocity_mps: Vector3::zeros(),
                airborne: false,
            })),
            running: Arc::new(AtomicBool::new(true)),
            threads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Stop the delivery threads and wait for them to exit.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
        let handles: Vec<JoinHandle<()>> = self.threads.lock().unwrap().drain(..).collect();
        for handle in handles {
            let _ = handle.join();
        }
    }

    /// Whether the simulated vehicle is currently flying.
    pub fn is_airborne(&self) -> bool {
        self.room.lock().unwrap().airborne
    }

    /// Place a wall at the given distance, as if an obstacle appeared.
    pub fn set_wall_cm(&self, direction: Direction, range_cm: f32) {
        self.room.lock().unwrap().walls_cm[direction.index()] = range_cm;
    }
}

impl TelemetrySource for SimulatedLink {
    fn subscribe_ranger(
        &mut self,
        period: Duration,
        mut handler: RangerHandler,
    ) -> Result<(), LinkError> {
        let room = self.room.clone();
        let running = self.running.clone();
        let handle = thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                thread::sleep(period);
                let sample = {
                    let room = room.lock().unwrap();
                    RangerSample {
                        front_cm: room.walls_cm[Direction::Front.index()],
                        back_cm: room.walls_cm[Direction::Back.index()],
                        left_cm: room.walls_cm[Direction::Left.index()],
                        right_cm: room.walls_cm[Direction::Right.index()],
                        up_cm: Some(CEILING_CM),
                    }
                };
                handler(sample);
            }
        });
        self.threads.lock().unwrap().push(handle);
        Ok(())
    }

    fn subscribe_estimate(
        &mut self,
        period: Duration,
        mut handler: EstimateHandler,
    ) -> Result<(), LinkError> {
        let room = self.room.clone();
        let running = self.running.clone();
        let handle = thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                thread::sleep(period);
                let estimate = {
                    let room = room.lock().unwrap();
                    StateEstimate {
                        position_m: room.position_m,
                        velocity_mps: room.velocity_mps,
                    }
                };
                handler(estimate);
            }
        });
        self.threads.lock().unwrap().push(handle);
        Ok(())
    }
}

impl MotionActuator for SimulatedLink {
    fn take_off(&mut self, height_m: f32) -> Result<(), LinkError> {
        let mut room = self.room.lock().unwrap();
        room.airborne = true;
        room.position_m.z = height_m;
        info!("Sim: takeoff to {:.1} m", height_m);
        Ok(())
    }

    fn move_toward(&mut self, direction: Direction, distance_m: f32) -> Result<(), LinkError> {
        let mut room = self.room.lock().unwrap();
        if !room.airborne {
            return Err(LinkError::Command("vehicle is not airborne".to_string()));
        }

        let step_cm = distance_m * 100.0;
        let ahead = direction.index();
        let behind = direction.opposite().index();
        room.walls_cm[ahead] = (room.walls_cm[ahead] - step_cm).max(MIN_WALL_CM);
        room.walls_cm[behind] += step_cm;

        match direction {
            Direction::Front => room.position_m.x += distance_m,
            Direction::Back => room.position_m.x -= distance_m,
            Direction::Left => room.position_m.y += distance_m,
            Direction::Right => room.position_m.y -= distance_m,
        }
        debug!("Sim: moved {} {:.2} m", direction, distance_m);
        Ok(())
    }

    fn hover(&mut self) -> Result<(), LinkError> {
        let mut room = self.room.lock().unwrap();
        room.velocity_mps = Vector3::zeros();
        debug!("Sim: hovering");
        Ok(())
    }

    fn land(&mut self) -> Result<(), LinkError> {
        let mut room = self.room.lock().unwrap();
        room.airborne = false;
        room.position_m.z = 0.0;
        room.velocity_mps = Vector3::zeros();
        info!("Sim: landed");
        Ok(())
    }
}

impl DeckMonitor for SimulatedLink {
    fn wait_attached(&self, deck: Deck, _timeout: Duration) -> bool {
        debug!("Sim: {} deck attached", deck);
        true
    }
}

// SWOT Analysis
// Strengths:
// - Full-stack exercise: Real threads deliver samples into the shared state, so the
//   producer/consumer concurrency model runs exactly as it would against hardware.
// - Shared clones: One instance serves all three ports, matching how a single radio
//   link backs telemetry, parameters and commands on the vehicle.
//
// Weaknesses:
// - Flat room: Walls move rigidly with the vehicle; no rotation, no noise, no dropouts.
// - Velocity is never integrated; the estimate feed reports zeros between moves.
//
// Opportunities:
// - Noise injection: Gaussian range jitter would exercise the malformed-sample path.
// - Scripted scenarios: Walls appearing on a timeline would cover the re-trigger case.
//
// Threats:
// - Timing fidelity: Thread sleep jitter differs from the deterministic radio cadence,
//   so sim-only tuning of tick periods may not transfer to the vehicle.
