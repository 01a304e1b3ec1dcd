//! Crossover and mutation on [`FuzzyController`] entries.
//!
//! Both operators walk the flat entry layout documented in
//! [`fuzzdrive_controller::rules`], so every child has exactly the shape of its parents and
//! every entry stays inside its own domain.
//!
//! # Crossover
//!
//! For parents `a` and `b`, entry by entry:
//!
//! - **Arithmetic**: draw `λ ∈ [0, 1]`, children get `λa + (1-λ)b` and `(1-λ)a + λb`
//! - **Uniform**: with probability 1/2 the two entries are swapped
//!
//! Swapping the parents only relabels the two children, so the set of possible children
//! does not depend on parent order.
//!
//! # Mutation
//!
//! Each entry is perturbed with probability `gene_rate` by
//!
//! ```text
//! δ = t × span × unit,   t ~ Triangular(-1, 1, mode 0)
//! ```
//!
//! then clamped to its domain. The unit depends on the section: `max_range / 20` for
//! membership vertices, a tenth of the output limit for term centres, `0.1` for weights.

use fuzzdrive_controller::{
    ControllerLimits, FuzzyController,
    rules::{Domain, Section},
};
use rand::Rng;
use rand_distr::Triangular;

use crate::config::CrossoverKind;

/// Recombines two parents into two children.
pub fn crossover<R>(
    kind: CrossoverKind,
    p1: &FuzzyController,
    p2: &FuzzyController,
    limits: &ControllerLimits,
    rng: &mut R,
) -> (FuzzyController, FuzzyController)
where
    R: Rng + ?Sized,
{
    let mut c1 = *p1;
    let mut c2 = *p2;
    for (i, (x, y)) in c1.genes_mut().zip(c2.genes_mut()).enumerate() {
        match kind {
            CrossoverKind::Arithmetic => {
                let lambda = rng.random_range(0.0..=1.0);
                let (a, b) = (*x, *y);
                *x = lambda * a + (1.0 - lambda) * b;
                *y = (1.0 - lambda) * a + lambda * b;
                // rounding may step just outside the parents' interval
                if let Some((_, domain)) = FuzzyController::gene_info(i, limits) {
                    *x = domain.clamp(*x);
                    *y = domain.clamp(*y);
                }
            }
            CrossoverKind::Uniform => {
                if rng.random_bool(0.5) {
                    std::mem::swap(x, y);
                }
            }
        }
    }
    (c1, c2)
}

/// Perturbs each entry with probability `gene_rate`, in place.
///
/// A `gene_rate` of 0 leaves every entry untouched.
pub fn mutate<R>(
    controller: &mut FuzzyController,
    limits: &ControllerLimits,
    span: f32,
    gene_rate: f64,
    rng: &mut R,
) where
    R: Rng + ?Sized,
{
    if gene_rate <= 0.0 {
        return;
    }
    let triangular = Triangular::new(-1.0_f32, 1.0, 0.0).expect("mode lies within the bounds");
    for (i, gene) in controller.genes_mut().enumerate() {
        if !rng.random_bool(gene_rate) {
            continue;
        }
        let Some((section, domain)) = FuzzyController::gene_info(i, limits) else {
            continue;
        };
        let delta = rng.sample(triangular) * span * unit(section, domain, limits);
        *gene = domain.clamp(*gene + delta);
    }
}

fn unit(section: Section, domain: Domain, limits: &ControllerLimits) -> f32 {
    match section {
        Section::Vertex { .. } => limits.max_range / 20.0,
        Section::Center { .. } => domain.min.abs().max(domain.max.abs()) / 10.0,
        Section::Weight { .. } => 0.1,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64Mcg;

    use super::*;

    fn parents(seed: u64) -> (FuzzyController, FuzzyController, ControllerLimits) {
        let limits = ControllerLimits::default();
        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        let a = FuzzyController::random(&mut rng, &limits);
        let b = FuzzyController::random(&mut rng, &limits);
        (a, b, limits)
    }

    fn assert_in_domain(controller: &FuzzyController, limits: &ControllerLimits) {
        assert_eq!(controller.genes().count(), FuzzyController::LEN);
        for (i, gene) in controller.genes().enumerate() {
            let (_, domain) = FuzzyController::gene_info(i, limits).unwrap();
            assert!(*gene >= domain.min && *gene <= domain.max, "entry {i} = {gene}");
        }
    }

    #[test]
    fn test_arithmetic_crossover_blends_between_parents() {
        let (a, b, limits) = parents(1);
        let mut rng = Pcg64Mcg::seed_from_u64(2);
        let (c1, c2) = crossover(CrossoverKind::Arithmetic, &a, &b, &limits, &mut rng);
        assert_in_domain(&c1, &limits);
        assert_in_domain(&c2, &limits);
        for (((x, y), pa), pb) in c1.genes().zip(c2.genes()).zip(a.genes()).zip(b.genes()) {
            let (lo, hi) = (pa.min(*pb), pa.max(*pb));
            assert!(*x >= lo - 1e-5 && *x <= hi + 1e-5);
            assert!(((x + y) - (pa + pb)).abs() < 1e-4);
        }
    }

    #[test]
    fn test_uniform_crossover_swaps_entries() {
        let (a, b, limits) = parents(3);
        let mut rng = Pcg64Mcg::seed_from_u64(4);
        let (c1, c2) = crossover(CrossoverKind::Uniform, &a, &b, &limits, &mut rng);
        let mut swapped = 0;
        for (((x, y), pa), pb) in c1.genes().zip(c2.genes()).zip(a.genes()).zip(b.genes()) {
            if x == pa {
                assert_eq!(y, pb);
            } else {
                assert_eq!((x, y), (pb, pa));
                swapped += 1;
            }
        }
        assert!(swapped > 0 && swapped < FuzzyController::LEN);
    }

    #[test]
    fn test_crossover_parent_order_only_swaps_children() {
        let (a, b, limits) = parents(5);
        let (c1, c2) = crossover(
            CrossoverKind::Uniform,
            &a,
            &b,
            &limits,
            &mut Pcg64Mcg::seed_from_u64(6),
        );
        let (d1, d2) = crossover(
            CrossoverKind::Uniform,
            &b,
            &a,
            &limits,
            &mut Pcg64Mcg::seed_from_u64(6),
        );
        assert_eq!((c1, c2), (d2, d1));
    }

    #[test]
    fn test_zero_gene_rate_is_identity() {
        let (a, _, limits) = parents(7);
        let mut mutated = a;
        let mut rng = Pcg64Mcg::seed_from_u64(8);
        mutate(&mut mutated, &limits, 3.0, 0.0, &mut rng);
        assert!(a.genes().zip(mutated.genes()).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn test_mutation_stays_in_domain_and_is_bounded() {
        let (a, _, limits) = parents(9);
        let span = 2.0;
        let mut rng = Pcg64Mcg::seed_from_u64(10);
        for _ in 0..20 {
            let mut mutated = a;
            mutate(&mut mutated, &limits, span, 1.0, &mut rng);
            assert_in_domain(&mutated, &limits);
            assert_ne!(mutated, a);
            for (i, (x, y)) in a.genes().zip(mutated.genes()).enumerate() {
                let (section, domain) = FuzzyController::gene_info(i, &limits).unwrap();
                let bound = span * unit(section, domain, &limits);
                assert!((x - y).abs() <= bound + 1e-5, "entry {i}: {x} -> {y}");
            }
        }
    }
}
