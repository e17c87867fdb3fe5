//! Variation operators: random genotypes, point mutation and crossover.

use biomorph_data::{Genotype, Mode, DEPTH_GENE, DIRECTION_GENES};
use rand::Rng;

/// Depth range used for seeding so founders are visibly branched.
const INTERESTING_DEPTH: std::ops::RangeInclusive<i32> = 5..=8;
/// Minimum number of non-zero direction genes in a seeding genotype.
const INTERESTING_DIRECTIONS: usize = 3;
/// Largest magnitude given to a direction gene filled in for seeding.
const FILLER_MAGNITUDE: i32 = 2;

/// Result of recombination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossover {
    pub genotype: Genotype,
    /// 1-based index of the parent each gene was taken from.
    pub sources: Vec<u8>,
}

/// Genetic interface for biomorph genotypes.
pub trait GenotypeLogic: Sized {
    fn random(mode: Mode) -> Self;
    fn random_with_rng<R: Rng + ?Sized>(mode: Mode, rng: &mut R) -> Self;
    fn random_interesting_with_rng<R: Rng + ?Sized>(mode: Mode, rng: &mut R) -> Self;
    fn mutated(&self) -> Self;
    fn mutated_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Self;
    fn crossover_with_rng<R: Rng + ?Sized>(&self, other: &Self, rng: &mut R) -> Crossover;
    /// Sum of absolute gene differences over the shared prefix.
    fn gene_distance(&self, other: &Self) -> u32;
}

impl GenotypeLogic for Genotype {
    fn random(mode: Mode) -> Self {
        let mut rng = rand::thread_rng();
        Self::random_with_rng(mode, &mut rng)
    }

    fn random_with_rng<R: Rng + ?Sized>(mode: Mode, rng: &mut R) -> Self {
        random_genotype_with_rng(mode, rng)
    }

    fn random_interesting_with_rng<R: Rng + ?Sized>(mode: Mode, rng: &mut R) -> Self {
        random_interesting_with_rng(mode, rng)
    }

    fn mutated(&self) -> Self {
        let mut rng = rand::thread_rng();
        mutate_with_rng(self, &mut rng)
    }

    fn mutated_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        mutate_with_rng(self, rng)
    }

    fn crossover_with_rng<R: Rng + ?Sized>(&self, other: &Self, rng: &mut R) -> Crossover {
        crossover_pair_with_rng(self, other, rng)
    }

    fn gene_distance(&self, other: &Self) -> u32 {
        self.genes()
            .iter()
            .zip(other.genes())
            .map(|(a, b)| a.abs_diff(*b))
            .sum()
    }
}

/// Every gene drawn uniformly from its bound.
pub fn random_genotype_with_rng<R: Rng + ?Sized>(mode: Mode, rng: &mut R) -> Genotype {
    let genes = mode
        .bounds()
        .iter()
        .map(|b| rng.gen_range(b.min..=b.max))
        .collect();
    Genotype::from_parts(mode, genes)
}

/// A random genotype that develops into something worth looking at:
/// depth 5..=8 and at least three non-zero direction genes.
pub fn random_interesting_with_rng<R: Rng + ?Sized>(mode: Mode, rng: &mut R) -> Genotype {
    let mut genes = random_genotype_with_rng(mode, rng).into_genes();
    genes[DEPTH_GENE] = rng.gen_range(INTERESTING_DEPTH);

    loop {
        let zeros: Vec<usize> = (0..DIRECTION_GENES).filter(|&i| genes[i] == 0).collect();
        if DIRECTION_GENES - zeros.len() >= INTERESTING_DIRECTIONS {
            break;
        }
        let pick = zeros[rng.gen_range(0..zeros.len())];
        genes[pick] = filler_direction(rng);
    }

    Genotype::from_parts(mode, genes)
}

/// Value for a zero direction gene in a seeding genotype: ±1 or ±2.
fn filler_direction<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    let magnitude = rng.gen_range(1..=FILLER_MAGNITUDE);
    if rng.gen_bool(0.5) {
        magnitude
    } else {
        -magnitude
    }
}

/// Point mutation: one uniformly chosen gene moves by ±1, clamped to its
/// bound. At a bound the step may be absorbed and the genotype unchanged.
pub fn mutate_with_rng<R: Rng + ?Sized>(genotype: &Genotype, rng: &mut R) -> Genotype {
    let mut genes = genotype.genes().to_vec();
    if genes.is_empty() {
        return genotype.clone();
    }
    let bounds = genotype.mode().bounds();
    let index = rng.gen_range(0..genes.len());
    let delta = if rng.gen_bool(0.5) { 1 } else { -1 };
    genes[index] = match bounds.get(index) {
        Some(bound) => bound.clamp(genes[index] + delta),
        None => genes[index] + delta,
    };
    Genotype::from_parts(genotype.mode(), genes)
}

/// Gene-wise recombination of two parents.
pub fn crossover_pair_with_rng<R: Rng + ?Sized>(
    a: &Genotype,
    b: &Genotype,
    rng: &mut R,
) -> Crossover {
    // Infallible: the parent slice is non-empty.
    match crossover_with_rng(&[a, b], rng) {
        Some(result) => result,
        None => Crossover {
            genotype: a.clone(),
            sources: vec![1; a.len()],
        },
    }
}

/// Gene-wise recombination of any number of parents.
///
/// The child takes the first parent's mode and length. Each gene is copied
/// from a parent chosen uniformly among those that carry that index, so a
/// value never moves between indices and no clamping is needed. Returns
/// `None` when `parents` is empty.
pub fn crossover_with_rng<R: Rng + ?Sized>(
    parents: &[&Genotype],
    rng: &mut R,
) -> Option<Crossover> {
    let first = parents.first()?;
    let mut genes = Vec::with_capacity(first.len());
    let mut sources = Vec::with_capacity(first.len());

    for index in 0..first.len() {
        let donors: Vec<usize> = parents
            .iter()
            .enumerate()
            .filter(|(_, p)| index < p.len())
            .map(|(i, _)| i)
            .collect();
        let donor = donors[rng.gen_range(0..donors.len())];
        genes.push(parents[donor].gene(index));
        sources.push((donor + 1) as u8);
    }

    Some(Crossover {
        genotype: Genotype::from_parts(first.mode(), genes),
        sources,
    })
}
