//! Chromosome encoding: the two rule matrices of a fuzzy controller.
//!
//! A [`FuzzyController`] owns one [`RuleMatrix`] per output: [`SteeringRules`] (five
//! output terms) and [`VelocityRules`] (three output terms). Both share the same layout,
//! and the genetic algorithm tunes every entry of it.
//!
//! # Layout
//!
//! Entries are addressed as one flat slice, in this order:
//!
//! | Section   | Entries        | Meaning                                               |
//! |-----------|----------------|-------------------------------------------------------|
//! | vertices  | 3 × 4          | membership breakpoints `a, b, c, d` for left, front, right |
//! | centers   | `TERMS`        | crisp value of each output term                       |
//! | weights   | 27             | confidence of each rule of the fixed rule base        |
//!
//! Vertices live in `[0, max_range]`, centres in the output range and weights in `[0, 1]`.
//! See [`membership`](crate::membership) for how vertices shape the sensor terms and
//! [`rule_base`](crate::rule_base) for which rule a weight belongs to.
//!
//! The shape is fixed by the type, so every genetic operator is shape-preserving by
//! construction: children are built entry by entry from parents of the same type.

use std::array;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{membership::SENSOR_TERM_COUNT, rule_base::RULE_COUNT};

/// Number of sensor inputs (left, front, right).
pub const SENSOR_COUNT: usize = 3;
/// Breakpoints per sensor input.
pub const VERTICES_PER_SENSOR: usize = SENSOR_TERM_COUNT + 1;

const VERTEX_COUNT: usize = SENSOR_COUNT * VERTICES_PER_SENSOR;

/// Physical limits that define the domain of every entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerLimits {
    /// Maximum sensing range; vertices live in `[0, max_range]`.
    pub max_range: f32,
    /// Maximum forward speed; velocity centres live in `[0, max_speed]`.
    pub max_speed: f32,
    /// Maximum turn per tick; steering centres live in `[-max_rotation, max_rotation]`.
    pub max_rotation: f32,
}

impl Default for ControllerLimits {
    fn default() -> Self {
        Self {
            max_range: 20.0,
            max_speed: 10.0,
            max_rotation: 0.15,
        }
    }
}

/// Which part of a rule matrix an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Section {
    /// Breakpoint `vertex` (0..4) of sensor `sensor` (0 = left, 1 = front, 2 = right).
    Vertex { sensor: usize, vertex: usize },
    /// Centre of output term `term`.
    Center { term: usize },
    /// Weight of rule `rule`.
    Weight { rule: usize },
}

/// Inclusive value range of an entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    pub min: f32,
    pub max: f32,
}

impl Domain {
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn width(self) -> f32 {
        self.max - self.min
    }

    #[must_use]
    pub fn clamp(self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

/// Membership vertices, output centres and rule weights for one output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "RuleMatrixRepr", try_from = "RuleMatrixRepr")]
pub struct RuleMatrix<const TERMS: usize> {
    vertices: [[f32; VERTICES_PER_SENSOR]; SENSOR_COUNT],
    centers: [f32; TERMS],
    weights: [f32; RULE_COUNT],
}

/// Steering output: `HardRight, Right, Straight, Left, HardLeft`.
pub type SteeringRules = RuleMatrix<5>;
/// Velocity output: `Slow, Cruise, Fast`.
pub type VelocityRules = RuleMatrix<3>;

impl<const TERMS: usize> RuleMatrix<TERMS> {
    /// Total number of entries.
    pub const LEN: usize = VERTEX_COUNT + TERMS + RULE_COUNT;

    /// Builds a matrix from its sections.
    #[must_use]
    pub const fn new(
        vertices: [[f32; VERTICES_PER_SENSOR]; SENSOR_COUNT],
        centers: [f32; TERMS],
        weights: [f32; RULE_COUNT],
    ) -> Self {
        Self {
            vertices,
            centers,
            weights,
        }
    }

    /// Random matrix with every entry inside its domain.
    ///
    /// Vertices and centres are sorted ascending, so the initial population starts with
    /// well-formed membership functions and term order matching term names.
    pub fn random<R>(rng: &mut R, max_range: f32, centers: Domain) -> Self
    where
        R: Rng + ?Sized,
    {
        let vertices = array::from_fn(|_| {
            let mut v: [f32; VERTICES_PER_SENSOR] =
                array::from_fn(|_| rng.random_range(0.0..=max_range));
            v.sort_by(f32::total_cmp);
            v
        });
        let mut center_values: [f32; TERMS] =
            array::from_fn(|_| rng.random_range(centers.min..=centers.max));
        center_values.sort_by(f32::total_cmp);
        let weights = array::from_fn(|_| rng.random_range(0.0..=1.0));
        Self::new(vertices, center_values, weights)
    }

    #[must_use]
    pub fn vertices(&self) -> &[[f32; VERTICES_PER_SENSOR]; SENSOR_COUNT] {
        &self.vertices
    }

    #[must_use]
    pub fn centers(&self) -> &[f32; TERMS] {
        &self.centers
    }

    #[must_use]
    pub fn weights(&self) -> &[f32; RULE_COUNT] {
        &self.weights
    }

    /// Classifies a flat index. Returns `None` past the end.
    #[must_use]
    pub fn section(index: usize) -> Option<Section> {
        if index < VERTEX_COUNT {
            Some(Section::Vertex {
                sensor: index / VERTICES_PER_SENSOR,
                vertex: index % VERTICES_PER_SENSOR,
            })
        } else if index < VERTEX_COUNT + TERMS {
            Some(Section::Center {
                term: index - VERTEX_COUNT,
            })
        } else if index < Self::LEN {
            Some(Section::Weight {
                rule: index - VERTEX_COUNT - TERMS,
            })
        } else {
            None
        }
    }

    /// Value range of a section given the sensing range and the centre domain.
    #[must_use]
    pub fn domain(section: Section, max_range: f32, centers: Domain) -> Domain {
        match section {
            Section::Vertex { .. } => Domain::new(0.0, max_range),
            Section::Center { .. } => centers,
            Section::Weight { .. } => Domain::new(0.0, 1.0),
        }
    }

    /// All entries in layout order.
    pub fn entries(&self) -> impl Iterator<Item = &f32> {
        self.vertices
            .iter()
            .flatten()
            .chain(&self.centers)
            .chain(&self.weights)
    }

    /// All entries in layout order, mutably.
    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut f32> {
        self.vertices
            .iter_mut()
            .flatten()
            .chain(&mut self.centers)
            .chain(&mut self.weights)
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.entries().all(|v| v.is_finite())
    }
}

/// Flat serialized form, checked against the layout on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RuleMatrixRepr {
    vertices: Vec<[f32; VERTICES_PER_SENSOR]>,
    centers: Vec<f32>,
    weights: Vec<f32>,
}

impl<const TERMS: usize> From<RuleMatrix<TERMS>> for RuleMatrixRepr {
    fn from(m: RuleMatrix<TERMS>) -> Self {
        Self {
            vertices: m.vertices.to_vec(),
            centers: m.centers.to_vec(),
            weights: m.weights.to_vec(),
        }
    }
}

impl<const TERMS: usize> TryFrom<RuleMatrixRepr> for RuleMatrix<TERMS> {
    type Error = String;

    fn try_from(repr: RuleMatrixRepr) -> Result<Self, Self::Error> {
        let len_error = |section: &str, expected: usize, actual: usize| {
            format!("rule matrix {section}: expected {expected} entries, got {actual}")
        };
        let vertices_len = repr.vertices.len();
        let centers_len = repr.centers.len();
        let weights_len = repr.weights.len();
        Ok(Self {
            vertices: repr
                .vertices
                .try_into()
                .map_err(|_| len_error("vertices", SENSOR_COUNT, vertices_len))?,
            centers: repr
                .centers
                .try_into()
                .map_err(|_| len_error("centers", TERMS, centers_len))?,
            weights: repr
                .weights
                .try_into()
                .map_err(|_| len_error("weights", RULE_COUNT, weights_len))?,
        })
    }
}

/// A complete candidate controller: one rule matrix per output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuzzyController {
    pub steering: SteeringRules,
    pub velocity: VelocityRules,
}

impl FuzzyController {
    /// Total number of tunable entries across both matrices.
    pub const LEN: usize = SteeringRules::LEN + VelocityRules::LEN;

    /// Random controller with every entry inside its domain.
    pub fn random<R>(rng: &mut R, limits: &ControllerLimits) -> Self
    where
        R: Rng + ?Sized,
    {
        Self {
            steering: SteeringRules::random(rng, limits.max_range, Self::steering_centers(limits)),
            velocity: VelocityRules::random(rng, limits.max_range, Self::velocity_centers(limits)),
        }
    }

    #[must_use]
    pub fn steering_centers(limits: &ControllerLimits) -> Domain {
        Domain::new(-limits.max_rotation, limits.max_rotation)
    }

    #[must_use]
    pub fn velocity_centers(limits: &ControllerLimits) -> Domain {
        Domain::new(0.0, limits.max_speed)
    }

    /// Section and domain of a flat index spanning steering then velocity entries.
    #[must_use]
    pub fn gene_info(index: usize, limits: &ControllerLimits) -> Option<(Section, Domain)> {
        if index < SteeringRules::LEN {
            let section = SteeringRules::section(index)?;
            let domain =
                SteeringRules::domain(section, limits.max_range, Self::steering_centers(limits));
            Some((section, domain))
        } else {
            let section = VelocityRules::section(index - SteeringRules::LEN)?;
            let domain =
                VelocityRules::domain(section, limits.max_range, Self::velocity_centers(limits));
            Some((section, domain))
        }
    }

    /// All entries of both matrices, steering first.
    pub fn genes(&self) -> impl Iterator<Item = &f32> {
        self.steering.entries().chain(self.velocity.entries())
    }

    /// All entries of both matrices, steering first, mutably.
    pub fn genes_mut(&mut self) -> impl Iterator<Item = &mut f32> {
        self.steering.entries_mut().chain(self.velocity.entries_mut())
    }

    /// Whether every entry is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.steering.is_finite() && self.velocity.is_finite()
    }
}
