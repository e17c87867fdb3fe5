//! Developmental engine: genotype → line-segment phenotype.
//!
//! The basic embryology is a depth-bounded binary recursion over eight
//! direction vectors derived from genes g1..g8. Higher modes build on it:
//! mirror symmetry, repeated segments with per-segment gradients, alternating
//! asymmetry and radial arms. Every mode keeps the depth tag of each segment.
//!
//! Development is a pure function. It performs no bounds checking; callers
//! keep genotypes in bound through the variation operators.

use biomorph_data::{Genotype, Mode, Phenotype, Point, Segment, DEPTH_GENE, DIRECTION_GENES};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Direction index the recursion starts from (the vertical stem `v4`).
const START_DIRECTION: usize = 4;
/// Radial arm count used when the genotype has a single segment.
const DEFAULT_RADIAL_ARMS: usize = 5;

/// Mirror symmetry applied to a developed tree (modes 2+).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Symmetry {
    /// The built-in bilateral symmetry of the direction vectors.
    #[default]
    LeftRight,
    /// Adds a copy mirrored across the horizontal axis.
    UpDown,
    /// Up-down mirror, then everything mirrored across the vertical axis.
    FourWay,
    /// No extra mirroring.
    Asymmetric,
}

/// Non-genetic development switches for modes 2 and up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DevelopmentOptions {
    pub symmetry: Symmetry,
    /// Mode 5: negate g1..g3 on every odd segment.
    pub alternating_asymmetry: bool,
    /// Mode 5: repeat the whole form around the origin.
    pub radial: bool,
}

/// The eight direction vectors v1..v8 for a genotype.
///
/// ```text
/// v1=(-g3, g7)  v2=(-g2, g6)  v3=(-g1, g5)  v4=(0, g4)
/// v5=(g1, g5)   v6=(g2, g6)   v7=(g3, g7)   v8=(0, g8)
/// ```
#[must_use]
pub fn direction_vectors(genes: &[i32]) -> [(i32, i32); DIRECTION_GENES] {
    let g = |n: usize| genes[n - 1];
    [
        (-g(3), g(7)),
        (-g(2), g(6)),
        (-g(1), g(5)),
        (0, g(4)),
        (g(1), g(5)),
        (g(2), g(6)),
        (g(3), g(7)),
        (0, g(8)),
    ]
}

/// Number of segments the basic tree has for a depth gene: `2^depth - 1`.
/// Saturates at `usize::MAX` for depths too large to represent.
#[must_use]
pub fn tree_segment_count(depth: u32) -> usize {
    1usize
        .checked_shl(depth)
        .map_or(usize::MAX, |n| n - 1)
}

/// Develops a genotype with default options.
#[must_use]
pub fn develop(genotype: &Genotype) -> Phenotype {
    develop_with(genotype, &DevelopmentOptions::default())
}

/// Develops a genotype into its phenotype.
#[must_use]
pub fn develop_with(genotype: &Genotype, options: &DevelopmentOptions) -> Phenotype {
    let mode = genotype.mode();
    let mut segments = if mode.is_segmented() {
        develop_segmented(genotype, options)
    } else {
        let tree = draw_tree(genotype.genes());
        if mode >= Mode::Symmetry {
            apply_symmetry(tree, options.symmetry)
        } else {
            tree
        }
    };

    if mode == Mode::Full && options.radial {
        let segs = genotype.segment_count();
        let arms = if segs > 1 {
            segs as usize
        } else {
            DEFAULT_RADIAL_ARMS
        };
        segments = apply_radial(&segments, arms);
    }

    Phenotype::from_segments(segments)
}

/// Re-lays a genotype for another mode: extra genes get layout defaults,
/// surplus genes are dropped, everything is clamped.
#[must_use]
pub fn adapt(genotype: &Genotype, mode: Mode) -> Genotype {
    if genotype.mode() == mode {
        return genotype.clone();
    }
    Genotype::clamped(mode, genotype.genes())
}

fn draw_tree(genes: &[i32]) -> Vec<Segment> {
    let depth = genes[DEPTH_GENE].max(0) as u32;
    let mut segments = Vec::with_capacity(tree_segment_count(depth.min(16)));
    grow_tree(genes, &mut |segment, _| segments.push(segment));
    segments
}

/// Runs the recursion, handing each emitted segment and the (normalised)
/// direction index that produced it to `emit`.
fn grow_tree(genes: &[i32], emit: &mut impl FnMut(Segment, usize)) {
    let vectors = direction_vectors(genes);
    let depth = genes[DEPTH_GENE];
    if depth < 1 {
        return;
    }
    grow(&vectors, START_DIRECTION, depth, Point::ORIGIN, emit);
}

fn grow(
    vectors: &[(i32, i32); DIRECTION_GENES],
    direction: usize,
    remaining: i32,
    origin: Point,
    emit: &mut impl FnMut(Segment, usize),
) {
    let direction = match direction {
        0 => 8,
        9 => 1,
        d => d,
    };
    let (vx, vy) = vectors[direction - 1];
    let c = f64::from(remaining);
    let end = Point::new(origin.x + c * f64::from(vx), origin.y + c * f64::from(vy));
    emit(
        Segment {
            start: origin,
            end,
            depth: remaining as u8,
        },
        direction,
    );
    if remaining > 1 {
        grow(vectors, direction - 1, remaining - 1, end, emit);
        grow(vectors, direction + 1, remaining - 1, end, emit);
    }
}

fn apply_symmetry(lines: Vec<Segment>, symmetry: Symmetry) -> Vec<Segment> {
    match symmetry {
        Symmetry::LeftRight | Symmetry::Asymmetric => lines,
        Symmetry::UpDown | Symmetry::FourWay => {
            let mut result = lines.clone();
            result.extend(lines.iter().map(|s| s.map(|p| Point::new(p.x, -p.y))));
            if symmetry == Symmetry::FourWay {
                let mirrored: Vec<Segment> = result
                    .iter()
                    .map(|s| s.map(|p| Point::new(-p.x, p.y)))
                    .collect();
                result.extend(mirrored);
            }
            result
        }
    }
}

/// Rounds halves towards positive infinity.
fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

fn develop_segmented(genotype: &Genotype, options: &DevelopmentOptions) -> Vec<Segment> {
    let mode = genotype.mode();
    let bounds = mode.bounds();
    let genes = genotype.genes();
    let segs = genotype.segment_count().max(1);
    let spacing = f64::from(genotype.segment_spacing());
    let has_gradients = mode >= Mode::Gradient && genes.len() >= 13;
    let alternate = mode == Mode::Full && options.alternating_asymmetry;

    let mut all = Vec::new();
    for s in 0..segs {
        let mut seg_genes = genes.to_vec();

        if has_gradients && segs > 1 {
            let t = f64::from(s) / f64::from(segs - 1);
            let grad1 = f64::from(genes[biomorph_data::GRADIENT_1_GENE]);
            let grad2 = f64::from(genes[biomorph_data::GRADIENT_2_GENE]);
            seg_genes[0] = bounds[0].clamp(round_half_up(f64::from(genes[0]) + grad1 * t));
            seg_genes[2] = bounds[2].clamp(round_half_up(f64::from(genes[2]) + grad2 * t));
        }

        if alternate && s % 2 == 1 {
            for g in seg_genes.iter_mut().take(3) {
                *g = -*g;
            }
        }

        let y_offset = (f64::from(s) - f64::from(segs - 1) / 2.0) * spacing;
        let tree = apply_symmetry(draw_tree(&seg_genes), options.symmetry);
        all.extend(
            tree.into_iter()
                .map(|seg| seg.map(|p| Point::new(p.x, p.y + y_offset))),
        );
    }
    all
}

fn apply_radial(lines: &[Segment], arms: usize) -> Vec<Segment> {
    if arms <= 1 {
        return lines.to_vec();
    }
    let step = 2.0 * PI / arms as f64;
    let mut result = Vec::with_capacity(lines.len() * arms);
    for a in 0..arms {
        let (sin, cos) = (step * a as f64).sin_cos();
        result.extend(lines.iter().map(|s| {
            s.map(|p| Point::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos))
        }));
    }
    result
}
