//! Closed-loop simulation of one controller on one track.
//!
//! A [`Simulation`] drives a single vehicle from the track start until it reaches a terminal
//! [`SimulationState`]. Each tick runs:
//!
//! 1. **Sense** - measure left/front/right clearance at the current pose
//! 2. **Decode** - turn the readings into a [`MotionDelta`]
//! 3. **Move** - integrate the delta into the vehicle pose
//! 4. **Check** - collision anywhere along the path moved this tick (the vehicle stops at
//!    the first blocked point), then goal, then progress (every `progress_window` ticks),
//!    then the tick cap
//!
//! # Fitness
//!
//! ```text
//! fitness = remaining_distance + penalty + balance_weight × mean_imbalance
//!
//! where:
//!   remaining_distance = |final_position - goal|
//!   penalty            = collision_penalty (COLLIDED) or idle_penalty (IDLE), else 0
//!   mean_imbalance     = mean over ticks of |left - right| clearance
//! ```
//!
//! Lower is better. A controller with non-finite parameters is never simulated: it ends in
//! [`SimulationState::Rejected`] with [`WORST_FITNESS`], as does any run whose fitness would
//! not be finite. The population therefore always has a total order.

use fuzzdrive_engine::{Point, Pose, SensorMemo, SensorModel, Track, VehicleState};
use serde::{Deserialize, Serialize};

use crate::{
    decoder::{Decoder, MotionDelta},
    rules::{ControllerLimits, FuzzyController},
};

/// Fitness assigned to rejected controllers and non-finite results.
pub const WORST_FITNESS: f32 = f32::MAX;

/// Guards `distance / fitness` against a zero fitness.
const EFFICIENCY_EPSILON: f32 = 1e-4;

/// Constants of the simulation loop and the fitness formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Duration of one tick, in seconds.
    pub dt: f32,
    /// Tick cap; reaching it ends the run in [`SimulationState::MaxIter`].
    pub max_ticks: usize,
    /// Ticks between progress checkpoints.
    pub progress_window: usize,
    /// Minimum displacement between two checkpoints.
    pub min_progress: f32,
    pub idle_penalty: f32,
    pub collision_penalty: f32,
    /// Distance to the goal that counts as arrival.
    pub goal_radius: f32,
    /// Weight of the mean side-clearance imbalance in the fitness.
    pub balance_weight: f32,
    pub max_speed: f32,
    pub max_rotation: f32,
    pub sensor: SensorModel,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            dt: 0.1,
            max_ticks: 2000,
            progress_window: 100,
            min_progress: 5.0,
            idle_penalty: 50.0,
            collision_penalty: 150.0,
            goal_radius: 3.0,
            balance_weight: 0.1,
            max_speed: 10.0,
            max_rotation: 0.15,
            sensor: SensorModel::default(),
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SimulationParamsError {
    #[display("{name} must be positive and finite, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[display("{name} must be non-negative and finite, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[display("{name} must be at least 1")]
    ZeroCount { name: &'static str },
}

impl SimulationParams {
    /// Output and sensing limits the decoder works within.
    #[must_use]
    pub fn limits(&self) -> ControllerLimits {
        ControllerLimits {
            max_range: self.sensor.max_range,
            max_speed: self.max_speed,
            max_rotation: self.max_rotation,
        }
    }

    pub fn validate(&self) -> Result<(), SimulationParamsError> {
        let positive = [
            ("dt", self.dt),
            ("max_speed", self.max_speed),
            ("max_rotation", self.max_rotation),
            ("sensor.max_range", self.sensor.max_range),
            ("sensor.step", self.sensor.step),
            ("sensor.position_resolution", self.sensor.position_resolution),
            ("sensor.heading_resolution", self.sensor.heading_resolution),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimulationParamsError::NotPositive { name, value });
            }
        }
        let non_negative = [
            ("min_progress", self.min_progress),
            ("idle_penalty", self.idle_penalty),
            ("collision_penalty", self.collision_penalty),
            ("goal_radius", self.goal_radius),
            ("balance_weight", self.balance_weight),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SimulationParamsError::Negative { name, value });
            }
        }
        for (name, count) in [
            ("max_ticks", self.max_ticks),
            ("progress_window", self.progress_window),
        ] {
            if count == 0 {
                return Err(SimulationParamsError::ZeroCount { name });
            }
        }
        Ok(())
    }
}

/// State of a simulation run. Every state except `Running` is terminal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "kebab-case")]
pub enum SimulationState {
    #[display("running")]
    Running,
    #[display("goal reached")]
    GoalReached,
    #[display("collided")]
    Collided,
    #[display("idle")]
    Idle,
    #[display("tick cap reached")]
    MaxIter,
    /// The controller had non-finite parameters and was not simulated.
    #[display("rejected")]
    Rejected,
}

/// Snapshot taken after each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub tick: usize,
    /// Pose after the move, together with the readings the decision was based on.
    pub vehicle: VehicleState,
    pub delta: MotionDelta,
    /// Total distance travelled so far.
    pub distance: f32,
    /// State after the tick's checks; terminal on the last record.
    pub state: SimulationState,
}

/// Terminal record of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub ticks: usize,
    pub distance: f32,
    pub final_pose: Pose,
    pub state: SimulationState,
    pub penalty: f32,
    pub mean_imbalance: f32,
    pub remaining_distance: f32,
    pub fitness: f32,
}

impl SimulationOutcome {
    /// Whether the run ended without collision, stall or rejection.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !(self.state.is_collided() || self.state.is_idle() || self.state.is_rejected())
    }

    /// Distance travelled per unit of fitness.
    #[must_use]
    pub fn efficiency(&self) -> f32 {
        self.distance / (self.fitness + EFFICIENCY_EPSILON)
    }
}

/// Receives the per-tick trace of a simulation.
pub trait SimulationObserver {
    fn on_tick(&mut self, _record: &TickRecord) {}
    fn on_finish(&mut self, _outcome: &SimulationOutcome) {}
}

impl SimulationObserver for () {}

impl SimulationObserver for Vec<TickRecord> {
    fn on_tick(&mut self, record: &TickRecord) {
        self.push(*record);
    }
}

/// One run of a controller on a track.
#[derive(Debug)]
pub struct Simulation<'a> {
    track: &'a Track,
    params: &'a SimulationParams,
    decoder: Decoder<'a>,
    sensor: SensorMemo<'a>,
    vehicle: VehicleState,
    state: SimulationState,
    tick: usize,
    distance: f32,
    imbalance_sum: f32,
    penalty: f32,
    checkpoint: Point,
}

impl<'a> Simulation<'a> {
    /// Places the vehicle at the track start.
    ///
    /// The run is already terminal when the controller is not finite (`Rejected`), when the
    /// start position is not drivable (`Collided` at tick 0) or when `max_ticks` is 0.
    ///
    /// `params` must pass [`SimulationParams::validate`]; [`TrackEvaluator::new`] checks this.
    ///
    /// [`TrackEvaluator::new`]: crate::TrackEvaluator::new
    #[must_use]
    pub fn new(
        track: &'a Track,
        params: &'a SimulationParams,
        controller: &'a FuzzyController,
    ) -> Self {
        debug_assert!(params.validate().is_ok(), "unvalidated simulation parameters");
        let mut sim = Self {
            track,
            params,
            decoder: Decoder::new(controller, params.limits()),
            sensor: SensorMemo::new(params.sensor, &track.road_map),
            vehicle: VehicleState::new(track.start),
            state: SimulationState::Running,
            tick: 0,
            distance: 0.0,
            imbalance_sum: 0.0,
            penalty: 0.0,
            checkpoint: track.start.position,
        };
        if !controller.is_finite() {
            log::warn!("controller has non-finite parameters; rejected without simulation");
            sim.state = SimulationState::Rejected;
        } else if !track.road_map.is_drivable(track.start.position) {
            sim.collide();
        } else if params.max_ticks == 0 {
            sim.state = SimulationState::MaxIter;
        }
        sim
    }

    #[must_use]
    pub fn state(&self) -> SimulationState {
        self.state
    }

    #[must_use]
    pub fn tick(&self) -> usize {
        self.tick
    }

    #[must_use]
    pub fn vehicle(&self) -> &VehicleState {
        &self.vehicle
    }

    /// Advances one tick. Returns `None` once the run is terminal.
    pub fn step(&mut self) -> Option<TickRecord> {
        if !self.state.is_running() {
            return None;
        }
        let params = self.params;

        let readings = self.sensor.sense(self.vehicle.pose);
        self.vehicle.readings = readings;
        let delta = self.decoder.decode(readings);
        let from = self.vehicle.position();
        let step = self.vehicle.update(params.dt, delta.speed, delta.rotation);
        self.imbalance_sum += readings.clamped(params.sensor.max_range).imbalance();
        self.tick += 1;

        let position = self.vehicle.position();
        if let Some(hit) = self.track.road_map.first_blocked_on_segment(from, position) {
            // stop where the path first leaves the road
            self.vehicle.pose.position = hit;
            self.distance += from.distance(hit);
            self.collide();
        } else {
            self.distance += step;
            if position.distance(self.track.goal) <= params.goal_radius {
                self.state = SimulationState::GoalReached;
            } else if params.progress_window > 0 && self.tick % params.progress_window == 0 {
                if position.distance(self.checkpoint) < params.min_progress {
                    self.state = SimulationState::Idle;
                    self.penalty += params.idle_penalty;
                } else {
                    self.checkpoint = position;
                }
            }
        }
        if self.state.is_running() && self.tick >= params.max_ticks {
            self.state = SimulationState::MaxIter;
        }

        Some(TickRecord {
            tick: self.tick,
            vehicle: self.vehicle,
            delta,
            distance: self.distance,
            state: self.state,
        })
    }

    /// Runs to completion, reporting every tick to `observer`.
    pub fn run<O>(mut self, observer: &mut O) -> SimulationOutcome
    where
        O: SimulationObserver + ?Sized,
    {
        while let Some(record) = self.step() {
            observer.on_tick(&record);
        }
        let outcome = self.outcome();
        log::trace!(
            "simulation finished: {} after {} ticks (cache {} poses, {} hits)",
            outcome.state,
            outcome.ticks,
            self.sensor.len(),
            self.sensor.hits(),
        );
        observer.on_finish(&outcome);
        outcome
    }

    /// Outcome as of the current tick.
    #[must_use]
    pub fn outcome(&self) -> SimulationOutcome {
        let final_pose = self.vehicle.pose;
        let remaining_distance = final_pose.position.distance(self.track.goal);
        #[expect(clippy::cast_precision_loss)]
        let mean_imbalance = if self.tick == 0 {
            0.0
        } else {
            self.imbalance_sum / self.tick as f32
        };
        let fitness = if self.state.is_rejected() {
            WORST_FITNESS
        } else {
            let fitness =
                remaining_distance + self.penalty + self.params.balance_weight * mean_imbalance;
            if fitness.is_finite() {
                fitness
            } else {
                WORST_FITNESS
            }
        };
        SimulationOutcome {
            ticks: self.tick,
            distance: self.distance,
            final_pose,
            state: self.state,
            penalty: self.penalty,
            mean_imbalance,
            remaining_distance,
            fitness,
        }
    }

    fn collide(&mut self) {
        self.state = SimulationState::Collided;
        self.penalty += self.params.collision_penalty;
    }
}
