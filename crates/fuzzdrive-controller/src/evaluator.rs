//! Fitness evaluation: the seam between the genetic algorithm and the simulation.
//!
//! The training crate only sees [`FitnessEvaluator`]. Implementations must be
//! [`Send`] + [`Sync`] because a population is scored from several threads at once;
//! each evaluation owns its vehicle state and sensor cache and only reads the shared track.

use std::fmt;

use fuzzdrive_engine::Track;

use crate::{
    rules::{ControllerLimits, FuzzyController},
    simulation::{
        Simulation, SimulationObserver, SimulationOutcome, SimulationParams,
        SimulationParamsError,
    },
};

/// Scores candidate controllers. Lower fitness is better.
pub trait FitnessEvaluator: fmt::Debug + Send + Sync {
    /// Limits every candidate's entries must respect.
    fn limits(&self) -> ControllerLimits;

    /// Runs one evaluation.
    fn evaluate(&self, controller: &FuzzyController) -> SimulationOutcome;

    fn fitness(&self, controller: &FuzzyController) -> f32 {
        self.evaluate(controller).fitness
    }
}

/// Evaluates controllers by simulating them on a fixed track.
#[derive(Debug, Clone)]
pub struct TrackEvaluator {
    track: Track,
    params: SimulationParams,
}

impl TrackEvaluator {
    /// Fails if `params` does not pass [`SimulationParams::validate`].
    pub fn new(track: Track, params: SimulationParams) -> Result<Self, SimulationParamsError> {
        params.validate()?;
        Ok(Self { track, params })
    }

    #[must_use]
    pub fn track(&self) -> &Track {
        &self.track
    }

    #[must_use]
    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Same as [`FitnessEvaluator::evaluate`], reporting every tick to `observer`.
    pub fn evaluate_with_observer<O>(
        &self,
        controller: &FuzzyController,
        observer: &mut O,
    ) -> SimulationOutcome
    where
        O: SimulationObserver + ?Sized,
    {
        Simulation::new(&self.track, &self.params, controller).run(observer)
    }
}

impl FitnessEvaluator for TrackEvaluator {
    fn limits(&self) -> ControllerLimits {
        self.params.limits()
    }

    fn evaluate(&self, controller: &FuzzyController) -> SimulationOutcome {
        self.evaluate_with_observer(controller, &mut ())
    }
}
