//! Genetic algorithm configuration.
//!
//! [`GaConfig`] is an immutable value passed into the
//! [`GeneticAlgorithm`](crate::genetic::GeneticAlgorithm) and threaded through every
//! operator; nothing is read from global state. It is checked once, at construction, by
//! [`GaConfig::validate`].
//!
//! # Presets
//!
//! | Strategy       | population | generations | elitism | tournament | mutation rate | span | gene rate |
//! |----------------|-----------:|------------:|--------:|-----------:|--------------:|-----:|----------:|
//! | `aggressive`   |        500 |          15 |    0.02 |          3 |          0.25 |    3 |      0.15 |
//! | `balanced`     |       1000 |          20 |    0.05 |          5 |          0.10 |    2 |      0.10 |
//! | `conservative` |       1500 |          30 |    0.15 |          7 |          0.05 |    1 |      0.05 |

use serde::{Deserialize, Serialize};

/// How two parents are recombined.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum CrossoverKind {
    /// Per-entry blend `λa + (1-λ)b` and `(1-λ)a + λb` with one λ shared by both children.
    #[default]
    #[display("arithmetic")]
    Arithmetic,
    /// Per-entry swap with probability 1/2.
    #[display("uniform")]
    Uniform,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaConfig {
    /// Chromosomes per generation.
    pub population_size: usize,
    /// Generations to run after the initial population. 0 returns the initial best.
    pub max_iterations: usize,
    /// Share of the population copied unchanged into the next generation, in `[0, 1)`.
    pub elitism_ratio: f64,
    /// Chromosomes sampled per tournament, in `1..=population_size`.
    pub tournament_size: usize,
    /// Probability that a child is selected for mutation.
    pub mutation_rate: f64,
    /// Scale of each perturbation, relative to the entry's unit step.
    pub mutation_span: f32,
    /// Probability that an entry of a selected child is perturbed.
    #[serde(alias = "mutation_genom_rate")]
    pub mutation_gene_rate: f64,
    #[serde(default)]
    pub crossover: CrossoverKind,
}

impl Default for GaConfig {
    fn default() -> Self {
        Strategy::default().config()
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum GaConfigError {
    #[display("population size must be at least 1")]
    EmptyPopulation,
    #[display("elitism ratio must be in [0, 1), got {ratio}")]
    ElitismRatio { ratio: f64 },
    #[display("tournament size must be in 1..={population_size}, got {tournament_size}")]
    TournamentSize {
        tournament_size: usize,
        population_size: usize,
    },
    #[display("{name} must be in [0, 1], got {value}")]
    Probability { name: &'static str, value: f64 },
    #[display("mutation span must be positive and finite, got {span}")]
    MutationSpan { span: f32 },
}

impl GaConfig {
    /// Checks every field against its documented range.
    pub fn validate(&self) -> Result<(), GaConfigError> {
        if self.population_size == 0 {
            return Err(GaConfigError::EmptyPopulation);
        }
        if !(0.0..1.0).contains(&self.elitism_ratio) {
            return Err(GaConfigError::ElitismRatio {
                ratio: self.elitism_ratio,
            });
        }
        if !(1..=self.population_size).contains(&self.tournament_size) {
            return Err(GaConfigError::TournamentSize {
                tournament_size: self.tournament_size,
                population_size: self.population_size,
            });
        }
        for (name, value) in [
            ("mutation rate", self.mutation_rate),
            ("mutation gene rate", self.mutation_gene_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GaConfigError::Probability { name, value });
            }
        }
        if !(self.mutation_span.is_finite() && self.mutation_span > 0.0) {
            return Err(GaConfigError::MutationSpan {
                span: self.mutation_span,
            });
        }
        Ok(())
    }

    /// Number of elites, `floor(population_size × elitism_ratio + 1e-9)`, capped at
    /// `population_size`.
    ///
    /// The `1e-9` guard absorbs binary rounding of decimal ratios (`100 × 0.29` is
    /// `28.999999999999996` in `f64`). It departs from a plain floor only when the product
    /// lies within `1e-9` below an integer: such a product counts as that integer.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn elite_count(&self) -> usize {
        // 100 * 0.29 must give 29, not 28
        let count = (self.population_size as f64 * self.elitism_ratio + 1e-9).floor();
        if count > 0.0 {
            (count as usize).min(self.population_size)
        } else {
            0
        }
    }
}

/// Named configurations.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Small population, strong mutation.
    #[display("aggressive")]
    Aggressive,
    #[default]
    #[display("balanced")]
    Balanced,
    /// Large population, strong elitism, gentle mutation.
    #[display("conservative")]
    Conservative,
}

impl Strategy {
    pub const ALL: [Self; 3] = [Self::Aggressive, Self::Balanced, Self::Conservative];

    #[must_use]
    pub fn config(self) -> GaConfig {
        let (
            population_size,
            max_iterations,
            elitism_ratio,
            tournament_size,
            mutation_rate,
            mutation_span,
            mutation_gene_rate,
        ) = match self {
            Self::Aggressive => (500, 15, 0.02, 3, 0.25, 3.0, 0.15),
            Self::Balanced => (1000, 20, 0.05, 5, 0.1, 2.0, 0.1),
            Self::Conservative => (1500, 30, 0.15, 7, 0.05, 1.0, 0.05),
        };
        GaConfig {
            population_size,
            max_iterations,
            elitism_ratio,
            tournament_size,
            mutation_rate,
            mutation_span,
            mutation_gene_rate,
            crossover: CrossoverKind::default(),
        }
    }
}
