//! Fuzzy steering and velocity controller, and the simulation that scores it.
//!
//! # Architecture
//!
//! ```text
//! FitnessEvaluator (fitness for training)
//!     ↓ runs
//! Simulation (sense → decode → move → check, per tick)
//!     ↓ uses
//! Decoder (fuzzify → rules → defuzzify)
//!     ↓ reads
//! FuzzyController (two rule matrices: the chromosome parameters)
//! ```
//!
//! # Modules
//!
//! - [`rules`] - [`FuzzyController`] and the flat rule-matrix layout tuned by training
//! - [`membership`] - Near/Medium/Far membership functions
//! - [`rule_base`] - the fixed 27-rule base and its consequents
//! - [`decoder`] - fuzzy inference from sensor readings to [`MotionDelta`]
//! - [`simulation`] - the per-evaluation state machine and fitness formula
//! - [`evaluator`] - [`FitnessEvaluator`], the interface used by the genetic algorithm

pub use self::{
    decoder::{Decoder, MotionDelta},
    evaluator::{FitnessEvaluator, TrackEvaluator},
    rules::{ControllerLimits, FuzzyController, SteeringRules, VelocityRules},
    simulation::{
        SimulationObserver, SimulationOutcome, SimulationParams, SimulationParamsError,
        SimulationState, TickRecord, WORST_FITNESS,
    },
};

pub mod decoder;
pub mod evaluator;
pub mod membership;
pub mod rule_base;
pub mod rules;
pub mod simulation;
