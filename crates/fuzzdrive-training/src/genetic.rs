//! Genetic algorithm evolving populations of fuzzy controllers.
//!
//! # Algorithm Overview
//!
//! Each generation ([`advance`]) runs:
//!
//! 1. **Sort** - order the current population by ascending fitness (best first)
//! 2. **Elitism** - copy the first `floor(N × elitism_ratio)` chromosomes unchanged
//! 3. **Tournament Selection** - sample `tournament_size` chromosomes, keep the fittest
//! 4. **Crossover** - recombine two parents into two children
//! 5. **Mutation** - with probability `mutation_rate`, perturb a child's entries
//! 6. **Evaluate** - score every new child; elites keep their fitness
//!
//! Fitness is minimised: the simulation reports remaining distance plus penalties.
//!
//! # Fill Policy
//!
//! Offspring are produced in pairs until the generation holds `N` chromosomes. When only
//! one slot is left, the second child of the final pair is dropped before it is mutated or
//! evaluated, so every generation has exactly `N` members whatever the parity of
//! `N - elites`.
//!
//! # Parallelization
//!
//! Evaluation runs on scoped threads, one contiguous chunk of the population per worker.
//! Each fitness is written into its own chromosome, so results never depend on which
//! worker finishes first.

use std::{num::NonZero, thread};

use fuzzdrive_controller::{ControllerLimits, FitnessEvaluator, FuzzyController, WORST_FITNESS};
use rand::{Rng, seq::IndexedRandom};

use crate::{
    config::{GaConfig, GaConfigError},
    operators,
    statistics::{self, FitnessStats},
};

/// A candidate controller and its cached fitness.
///
/// The fitness is `None` until evaluated, and is cleared by any mutable access to the
/// controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chromosome {
    controller: FuzzyController,
    fitness: Option<f32>,
}

impl Chromosome {
    #[must_use]
    pub fn new(controller: FuzzyController) -> Self {
        Self {
            controller,
            fitness: None,
        }
    }

    pub fn random<R>(rng: &mut R, limits: &ControllerLimits) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::new(FuzzyController::random(rng, limits))
    }

    #[must_use]
    pub fn controller(&self) -> &FuzzyController {
        &self.controller
    }

    /// Mutable access to the controller. Invalidates the cached fitness.
    pub fn controller_mut(&mut self) -> &mut FuzzyController {
        self.fitness = None;
        &mut self.controller
    }

    #[must_use]
    pub fn fitness(&self) -> Option<f32> {
        self.fitness
    }

    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Fitness used for ordering; unevaluated chromosomes rank last.
    #[must_use]
    pub fn rank_fitness(&self) -> f32 {
        self.fitness.unwrap_or(WORST_FITNESS)
    }

    /// Evaluates the controller and caches the fitness.
    pub fn evaluate<E>(&mut self, evaluator: &E) -> f32
    where
        E: FitnessEvaluator + ?Sized,
    {
        let fitness = evaluator.fitness(&self.controller);
        let fitness = if fitness.is_finite() {
            fitness
        } else {
            WORST_FITNESS
        };
        self.fitness = Some(fitness);
        fitness
    }
}

/// An ordered collection of chromosomes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    chromosomes: Vec<Chromosome>,
}

impl Population {
    #[must_use]
    pub fn new(chromosomes: Vec<Chromosome>) -> Self {
        Self { chromosomes }
    }

    /// `size` unevaluated random chromosomes.
    pub fn random<R>(size: usize, limits: &ControllerLimits, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let chromosomes = (0..size).map(|_| Chromosome::random(rng, limits)).collect();
        Self { chromosomes }
    }

    #[must_use]
    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    /// Evaluates every chromosome without a cached fitness, in parallel.
    pub fn evaluate_pending<E>(&mut self, evaluator: &E)
    where
        E: FitnessEvaluator + ?Sized,
    {
        let mut pending = self
            .chromosomes
            .iter_mut()
            .filter(|c| !c.is_evaluated())
            .collect::<Vec<_>>();
        if pending.is_empty() {
            return;
        }
        let workers = thread::available_parallelism().map_or(1, NonZero::get);
        let chunk_size = pending.len().div_ceil(workers);
        thread::scope(|s| {
            for chunk in pending.chunks_mut(chunk_size) {
                s.spawn(move || {
                    for chromosome in chunk {
                        chromosome.evaluate(evaluator);
                    }
                });
            }
        });
    }

    /// Stable sort by ascending fitness; unevaluated chromosomes go last.
    pub fn sort(&mut self) {
        self.chromosomes
            .sort_by(|a, b| a.rank_fitness().total_cmp(&b.rank_fitness()));
    }

    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.chromosomes
            .is_sorted_by(|a, b| a.rank_fitness().total_cmp(&b.rank_fitness()).is_le())
    }

    /// Fittest chromosome. Requires a sorted population.
    #[must_use]
    pub fn best(&self) -> Option<&Chromosome> {
        debug_assert!(self.is_sorted());
        self.chromosomes.first()
    }

    /// Fitness statistics over the evaluated chromosomes.
    #[must_use]
    pub fn fitness_stats(&self) -> Option<FitnessStats> {
        FitnessStats::new(self.chromosomes.iter().filter_map(Chromosome::fitness))
    }

    /// Mean per-entry standard deviation of the controllers.
    #[must_use]
    pub fn diversity(&self) -> f32 {
        statistics::parameter_diversity(self.chromosomes.iter().map(Chromosome::controller))
    }
}

/// Produces the next generation from `population`.
///
/// The input is sorted (and any unevaluated member scored) first. The result has exactly
/// `config.population_size` members, is fully evaluated and sorted best first.
///
/// Fails without touching `population` if `config` is invalid. Panics if `population` is
/// empty while `config` asks for offspring.
pub fn advance<E, R>(
    population: Population,
    config: &GaConfig,
    evaluator: &E,
    rng: &mut R,
) -> Result<Population, GaConfigError>
where
    E: FitnessEvaluator + ?Sized,
    R: Rng + ?Sized,
{
    config.validate()?;
    Ok(advance_validated(population, config, evaluator, rng))
}

fn advance_validated<E, R>(
    mut population: Population,
    config: &GaConfig,
    evaluator: &E,
    rng: &mut R,
) -> Population
where
    E: FitnessEvaluator + ?Sized,
    R: Rng + ?Sized,
{
    population.evaluate_pending(evaluator);
    population.sort();
    let limits = evaluator.limits();
    let size = config.population_size;
    let parents = population.chromosomes();

    let elite_count = config.elite_count().min(parents.len());
    let mut next = Vec::with_capacity(size);
    next.extend_from_slice(&parents[..elite_count]);

    while next.len() < size {
        let p1 = tournament_select(parents, config.tournament_size, rng);
        let p2 = tournament_select(parents, config.tournament_size, rng);
        let (c1, c2) = operators::crossover(
            config.crossover,
            p1.controller(),
            p2.controller(),
            &limits,
            rng,
        );
        for child in [c1, c2] {
            if next.len() == size {
                break;
            }
            let mut child = Chromosome::new(child);
            if rng.random_bool(config.mutation_rate) {
                operators::mutate(
                    child.controller_mut(),
                    &limits,
                    config.mutation_span,
                    config.mutation_gene_rate,
                    rng,
                );
            }
            next.push(child);
        }
    }

    let mut next = Population::new(next);
    next.evaluate_pending(evaluator);
    next.sort();
    next
}

/// Selects a parent by tournament.
///
/// Samples `tournament_size` distinct chromosomes (fewer if the population is smaller) and
/// returns the one with the lowest fitness. Panics if `population` is empty or
/// `tournament_size` is 0.
pub fn tournament_select<'a, R>(
    population: &'a [Chromosome],
    tournament_size: usize,
    rng: &mut R,
) -> &'a Chromosome
where
    R: Rng + ?Sized,
{
    assert!(tournament_size > 0);
    population
        .choose_multiple(rng, tournament_size)
        .min_by(|a, b| a.rank_fitness().total_cmp(&b.rank_fitness()))
        .expect("tournament over an empty population")
}

/// Summary of one generation, passed to the progress callback.
#[derive(Debug, Clone, Copy)]
pub struct GenerationReport {
    /// 0 for the initial population.
    pub generation: usize,
    pub stats: FitnessStats,
    pub diversity: f32,
    pub best: Chromosome,
}

/// Generational driver: a validated configuration plus the evaluator it scores with.
#[derive(Debug)]
pub struct GeneticAlgorithm<E> {
    config: GaConfig,
    evaluator: E,
}

impl<E> GeneticAlgorithm<E>
where
    E: FitnessEvaluator,
{
    /// Fails if `config` is invalid; nothing is evaluated before that.
    pub fn new(config: GaConfig, evaluator: E) -> Result<Self, GaConfigError> {
        config.validate()?;
        Ok(Self { config, evaluator })
    }

    #[must_use]
    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    #[must_use]
    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Random population of the configured size, evaluated and sorted.
    pub fn initial_population<R>(&self, rng: &mut R) -> Population
    where
        R: Rng + ?Sized,
    {
        let mut population =
            Population::random(self.config.population_size, &self.evaluator.limits(), rng);
        population.evaluate_pending(&self.evaluator);
        population.sort();
        population
    }

    /// Runs `max_iterations` generations and returns the best chromosome of the last one.
    pub fn run<R>(&self, rng: &mut R) -> Chromosome
    where
        R: Rng + ?Sized,
    {
        self.run_with(rng, |_| {})
    }

    /// Same as [`run`](Self::run), reporting every generation (including the initial
    /// population as generation 0) to `on_generation`.
    pub fn run_with<R, F>(&self, rng: &mut R, mut on_generation: F) -> Chromosome
    where
        R: Rng + ?Sized,
        F: FnMut(&GenerationReport),
    {
        let mut population = self.initial_population(rng);
        self.report(0, &population, &mut on_generation);
        for generation in 1..=self.config.max_iterations {
            population = advance_validated(population, &self.config, &self.evaluator, rng);
            self.report(generation, &population, &mut on_generation);
        }
        *population
            .best()
            .expect("validated population size is at least 1")
    }

    fn report<F>(&self, generation: usize, population: &Population, on_generation: &mut F)
    where
        F: FnMut(&GenerationReport),
    {
        let (Some(stats), Some(best)) = (population.fitness_stats(), population.best()) else {
            return;
        };
        let report = GenerationReport {
            generation,
            stats,
            diversity: population.diversity(),
            best: *best,
        };
        log::info!(
            "generation {}/{}: best {:.3}, mean {:.3}, worst {:.3}",
            generation,
            self.config.max_iterations,
            stats.best,
            stats.mean,
            stats.worst,
        );
        log::debug!(
            "generation {generation}: fitness std dev {:.3}, parameter diversity {:.4}",
            stats.std_dev,
            report.diversity,
        );
        on_generation(&report);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use fuzzdrive_controller::{SimulationOutcome, SimulationState};
    use fuzzdrive_engine::Pose;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64Mcg;

    use super::*;
    use crate::config::{CrossoverKind, Strategy};

    /// Fitness is the sum of all velocity centres; counts evaluations.
    #[derive(Debug, Default)]
    struct CenterSum {
        calls: AtomicUsize,
    }

    impl CenterSum {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl FitnessEvaluator for CenterSum {
        fn limits(&self) -> ControllerLimits {
            ControllerLimits::default()
        }

        fn evaluate(&self, controller: &FuzzyController) -> SimulationOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fitness = controller.velocity.centers().iter().sum::<f32>();
            SimulationOutcome {
                ticks: 0,
                distance: 0.0,
                final_pose: Pose::default(),
                state: SimulationState::MaxIter,
                penalty: 0.0,
                mean_imbalance: 0.0,
                remaining_distance: fitness,
                fitness,
            }
        }
    }

    fn test_config(population_size: usize, elitism_ratio: f64) -> GaConfig {
        GaConfig {
            population_size,
            max_iterations: 3,
            elitism_ratio,
            tournament_size: population_size.min(3),
            mutation_rate: 0.5,
            mutation_span: 2.0,
            mutation_gene_rate: 0.2,
            crossover: CrossoverKind::Arithmetic,
        }
    }

    fn evaluated(size: usize, seed: u64, evaluator: &CenterSum) -> Population {
        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        let mut population = Population::random(size, &evaluator.limits(), &mut rng);
        population.evaluate_pending(evaluator);
        population.sort();
        population
    }

    #[test]
    fn test_controller_mut_clears_fitness() {
        let evaluator = CenterSum::default();
        let mut chromosome =
            Chromosome::random(&mut Pcg64Mcg::seed_from_u64(1), &evaluator.limits());
        assert_eq!(chromosome.fitness(), None);
        chromosome.evaluate(&evaluator);
        assert!(chromosome.is_evaluated());
        let _ = chromosome.controller_mut();
        assert_eq!(chromosome.fitness(), None);
    }

    #[test]
    fn test_evaluate_pending_scores_each_once() {
        let evaluator = CenterSum::default();
        let population = evaluated(37, 2, &evaluator);
        assert_eq!(evaluator.calls(), 37);
        assert!(population.chromosomes().iter().all(Chromosome::is_evaluated));
        for chromosome in population.chromosomes() {
            let expected = chromosome.controller().velocity.centers().iter().sum::<f32>();
            assert_eq!(chromosome.fitness(), Some(expected));
        }
        assert!(population.is_sorted());
    }

    #[test]
    fn test_tournament_returns_member_no_worse_than_sample() {
        let evaluator = CenterSum::default();
        let population = evaluated(20, 3, &evaluator);
        let members = population.chromosomes();
        let mut rng = Pcg64Mcg::seed_from_u64(4);
        for _ in 0..100 {
            let selected = tournament_select(members, 1, &mut rng);
            assert!(members.iter().any(|c| std::ptr::eq(c, selected)));
        }
        // a tournament over everyone always finds the best
        let selected = tournament_select(members, members.len(), &mut rng);
        assert!(std::ptr::eq(selected, &members[0]));
    }

    #[test]
    fn test_tournament_picks_best_of_its_sample() {
        let evaluator = CenterSum::default();
        let population = evaluated(20, 13, &evaluator);
        let members = population.chromosomes();
        let mut rng = Pcg64Mcg::seed_from_u64(14);
        for _ in 0..100 {
            // same generator state, so the tournament draws exactly this sample
            let sample = members
                .choose_multiple(&mut rng.clone(), 5)
                .collect::<Vec<_>>();
            let selected = tournament_select(members, 5, &mut rng);
            assert_eq!(sample.len(), 5);
            assert!(sample.iter().any(|c| std::ptr::eq(*c, selected)));
            let sample_best = sample
                .iter()
                .map(|c| c.rank_fitness())
                .min_by(f32::total_cmp)
                .unwrap();
            assert_eq!(selected.rank_fitness().to_bits(), sample_best.to_bits());
        }
    }

    #[test]
    fn test_advance_rejects_invalid_config() {
        let evaluator = CenterSum::default();
        let population = evaluated(10, 15, &evaluator);
        let mut rng = Pcg64Mcg::seed_from_u64(16);
        let bad_rate = GaConfig {
            mutation_rate: 1.5,
            ..test_config(10, 0.2)
        };
        assert!(matches!(
            advance(population.clone(), &bad_rate, &evaluator, &mut rng),
            Err(GaConfigError::Probability { .. })
        ));
        let no_tournament = GaConfig {
            tournament_size: 0,
            ..test_config(10, 0.2)
        };
        assert!(matches!(
            advance(population, &no_tournament, &evaluator, &mut rng),
            Err(GaConfigError::TournamentSize { .. })
        ));
        assert_eq!(evaluator.calls(), 10);
    }

    #[test]
    fn test_advance_keeps_population_size() {
        for (size, ratio) in [
            (1, 0.0),
            (2, 0.0),
            (2, 0.5),
            (7, 0.0),
            (7, 0.2),
            (10, 0.1),
            (11, 0.3),
            (12, 0.99),
        ] {
            let evaluator = CenterSum::default();
            let config = test_config(size, ratio);
            let mut rng = Pcg64Mcg::seed_from_u64(5);
            let mut population = evaluated(size, 6, &evaluator);
            for _ in 0..3 {
                population = advance(population, &config, &evaluator, &mut rng).unwrap();
                assert_eq!(population.len(), size, "size {size}, ratio {ratio}");
                assert!(population.is_sorted());
            }
        }
    }

    #[test]
    fn test_only_offspring_are_evaluated() {
        // 9 - 0 elites leaves an odd slot count: the dropped child is never evaluated
        for (size, ratio, expected) in [(9, 0.0, 9), (10, 0.2, 8), (9, 0.2, 8)] {
            let evaluator = CenterSum::default();
            let population = evaluated(size, 7, &evaluator);
            let before = evaluator.calls();
            let mut rng = Pcg64Mcg::seed_from_u64(8);
            advance(population, &test_config(size, ratio), &evaluator, &mut rng).unwrap();
            assert_eq!(evaluator.calls() - before, expected);
        }
    }

    #[test]
    fn test_elites_survive_scenario_a() {
        let evaluator = CenterSum::default();
        let config = GaConfig {
            mutation_rate: 1.0,
            ..Strategy::Aggressive.config()
        };
        assert_eq!(config.elite_count(), 10);
        let population = evaluated(500, 9, &evaluator);
        let elites = population.chromosomes()[..10].to_vec();
        let next = advance(
            population,
            &config,
            &evaluator,
            &mut Pcg64Mcg::seed_from_u64(10),
        )
        .unwrap();
        assert_eq!(next.len(), 500);
        for elite in &elites {
            assert!(next.chromosomes().contains(elite));
        }
    }

    #[test]
    fn test_zero_mutation_rates_leave_entries_unchanged() {
        let evaluator = CenterSum::default();
        let limits = evaluator.limits();
        let template = FuzzyController::random(&mut Pcg64Mcg::seed_from_u64(11), &limits);
        for (mutation_rate, mutation_gene_rate) in [(0.0, 1.0), (1.0, 0.0)] {
            let config = GaConfig {
                mutation_rate,
                mutation_gene_rate,
                crossover: CrossoverKind::Uniform,
                ..test_config(8, 0.0)
            };
            let mut population = Population::new(vec![Chromosome::new(template); 8]);
            population.evaluate_pending(&evaluator);
            let next = advance(
                population,
                &config,
                &evaluator,
                &mut Pcg64Mcg::seed_from_u64(12),
            )
            .unwrap();
            for chromosome in next.chromosomes() {
                assert!(
                    chromosome
                        .controller()
                        .genes()
                        .zip(template.genes())
                        .all(|(a, b)| a.to_bits() == b.to_bits())
                );
            }
        }
    }

    #[test]
    fn test_zero_generations_return_initial_best_scenario_c() {
        let config = GaConfig {
            max_iterations: 0,
            ..test_config(30, 0.1)
        };
        let ga = GeneticAlgorithm::new(config, CenterSum::default()).unwrap();
        let initial = ga.initial_population(&mut Pcg64Mcg::seed_from_u64(13));
        let best = ga.run(&mut Pcg64Mcg::seed_from_u64(13));
        assert_eq!(Some(&best), initial.best());
    }

    #[test]
    fn test_best_fitness_never_regresses_with_elitism() {
        let config = GaConfig {
            max_iterations: 10,
            ..test_config(40, 0.1)
        };
        let ga = GeneticAlgorithm::new(config, CenterSum::default()).unwrap();
        let mut reports = Vec::new();
        let best = ga.run_with(&mut Pcg64Mcg::seed_from_u64(14), |r| reports.push(*r));
        assert_eq!(reports.len(), 11);
        assert_eq!(reports[0].generation, 0);
        for pair in reports.windows(2) {
            assert!(pair[1].stats.best <= pair[0].stats.best);
        }
        assert_eq!(best.fitness(), Some(reports[10].stats.best));
        assert!(reports[10].stats.best < reports[0].stats.best);
    }

    #[test]
    fn test_invalid_config_fails_before_running() {
        let config = GaConfig {
            tournament_size: 50,
            ..test_config(10, 0.1)
        };
        let evaluator = CenterSum::default();
        assert!(GeneticAlgorithm::new(config, evaluator).is_err());
    }

    #[test]
    fn test_rejected_controllers_rank_last() {
        let evaluator = CenterSum::default();
        let mut population = evaluated(5, 15, &evaluator);
        let mut broken = population.chromosomes()[0];
        for gene in broken.controller_mut().genes_mut() {
            *gene = f32::NAN;
        }
        population = Population::new(
            population
                .chromosomes()
                .iter()
                .copied()
                .chain([broken])
                .collect(),
        );
        population.evaluate_pending(&evaluator);
        population.sort();
        let last = population.chromosomes().last().unwrap();
        assert_eq!(last.fitness(), Some(WORST_FITNESS));
    }
}
