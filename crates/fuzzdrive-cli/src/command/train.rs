use std::{path::PathBuf, time::Instant};

use anyhow::Context as _;
use chrono::Utc;
use fuzzdrive_controller::{
    FitnessEvaluator as _, SimulationParams, TrackEvaluator, WORST_FITNESS,
};
use fuzzdrive_engine::{Track, TrackKind};
use fuzzdrive_training::{GaConfig, GeneticAlgorithm, Strategy};
use rand::SeedableRng as _;
use rand_pcg::Pcg64Mcg;

use crate::{
    model::controller_model::ControllerModel,
    util::{self, Destination},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Track to train on (sine or ring)
    #[arg(long, default_value = "sine")]
    track: TrackKind,
    /// GA preset (aggressive, balanced or conservative)
    #[arg(long, default_value = "balanced")]
    strategy: Strategy,
    /// GA configuration JSON file; replaces the preset
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulation parameters JSON file
    #[arg(long)]
    params: Option<PathBuf>,
    /// Override the number of generations
    #[arg(long)]
    generations: Option<usize>,
    /// Override the population size
    #[arg(long)]
    population: Option<usize>,
    /// RNG seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

impl TrainArg {
    fn ga_config(&self) -> anyhow::Result<GaConfig> {
        let mut config = match &self.config {
            Some(path) => util::read_json_file("GA configuration", path)?,
            None => self.strategy.config(),
        };
        if let Some(generations) = self.generations {
            config.max_iterations = generations;
        }
        if let Some(population) = self.population {
            config.population_size = population;
            config.tournament_size = config.tournament_size.min(population.max(1));
        }
        Ok(config)
    }

    fn simulation_params(&self) -> anyhow::Result<SimulationParams> {
        match &self.params {
            Some(path) => util::read_json_file("simulation parameters", path),
            None => Ok(SimulationParams::default()),
        }
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let config = arg.ga_config()?;
    let params = arg.simulation_params()?;
    let evaluator = TrackEvaluator::new(Track::builtin(arg.track), params)
        .context("Invalid simulation parameters")?;
    let ga = GeneticAlgorithm::new(config, evaluator).context("Invalid GA configuration")?;

    let seed = arg.seed.unwrap_or_else(rand::random);
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    log::info!(
        "training on the {} track: population {}, {} generations, seed {seed}",
        arg.track,
        config.population_size,
        config.max_iterations,
    );

    let started = Instant::now();
    let best = ga.run_with(&mut rng, |report| {
        eprintln!(
            "Generation #{:3}: best {:10.3}  mean {:12.3}  diversity {:.4}",
            report.generation, report.stats.best, report.stats.mean, report.diversity,
        );
    });
    let elapsed = started.elapsed();

    let outcome = ga.evaluator().evaluate(best.controller());
    eprintln!();
    eprintln!("Training completed in {:.1}s", elapsed.as_secs_f64());
    eprintln!("  Final state: {}", outcome.state);
    eprintln!("  Ticks: {}", outcome.ticks);
    eprintln!("  Distance: {:.2}", outcome.distance);
    eprintln!("  Remaining distance: {:.2}", outcome.remaining_distance);

    let model = ControllerModel {
        name: format!("{}-{}", arg.strategy, arg.track),
        trained_at: Utc::now(),
        track: arg.track,
        strategy: arg.strategy,
        seed,
        ga_config: config,
        params,
        final_fitness: best.fitness().unwrap_or(WORST_FITNESS),
        controller: *best.controller(),
    };
    let destination = Destination::new(arg.output.clone());
    destination.write_json(&model)?;

    eprintln!();
    eprintln!("Model saved to {destination}");
    eprintln!("  Name: {}", model.name);
    eprintln!("  Trained at: {}", model.trained_at);
    eprintln!("  Final fitness: {:.3}", model.final_fitness);
    Ok(())
}
