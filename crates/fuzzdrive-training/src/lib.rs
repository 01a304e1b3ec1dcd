//! Training system evolving fuzzy controllers with a genetic algorithm.
//!
//! # How Training Works
//!
//! 1. **Population** - create random controllers (chromosomes)
//! 2. **Evaluation** - each controller drives the track once; the simulation returns its fitness
//! 3. **Selection** - tournaments pick parents, elites carry over unchanged
//! 4. **Reproduction** - crossover and mutation produce the rest of the next generation
//! 5. **Repeat** - for a fixed number of generations
//!
//! # Architecture
//!
//! ```text
//! GeneticAlgorithm (config + evaluator)
//!     ↓ evolves
//! Population of Chromosomes (FuzzyController + cached fitness)
//!     ↓ scored by
//! FitnessEvaluator (fuzzdrive-controller)
//!     ↓ produces
//! Fitness (lower is better)
//!     ↓ guides
//! Selection & Reproduction
//! ```
//!
//! # Modules
//!
//! - [`config`] - [`GaConfig`], validation and named [`Strategy`] presets
//! - [`genetic`] - chromosomes, populations and the generational loop
//! - [`operators`] - crossover and mutation over the controller's entry layout
//! - [`statistics`] - per-generation fitness and diversity summaries
//!
//! # Example
//!
//! ```no_run
//! use fuzzdrive_controller::{SimulationParams, TrackEvaluator};
//! use fuzzdrive_engine::Track;
//! use fuzzdrive_training::{GeneticAlgorithm, Strategy};
//! use rand::SeedableRng as _;
//!
//! let evaluator = TrackEvaluator::new(Track::sine(), SimulationParams::default()).unwrap();
//! let ga = GeneticAlgorithm::new(Strategy::Aggressive.config(), evaluator).unwrap();
//! let best = ga.run(&mut rand_pcg::Pcg64Mcg::seed_from_u64(42));
//! println!("best fitness: {:?}", best.fitness());
//! ```
//!
//! # Current Limitations
//!
//! - **Fixed generation count**: no early stopping or convergence criterion
//! - **Single track**: each run optimises for one road map and start pose

pub use self::{
    config::{CrossoverKind, GaConfig, GaConfigError, Strategy},
    genetic::{Chromosome, GenerationReport, GeneticAlgorithm, Population},
    statistics::FitnessStats,
};

pub mod config;
pub mod genetic;
pub mod operators;
pub mod statistics;
