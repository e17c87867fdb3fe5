use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of direction-control genes shared by every mode (g1..g8).
pub const DIRECTION_GENES: usize = 8;
/// Index of the recursion-depth gene.
pub const DEPTH_GENE: usize = 8;
/// Index of the segment-count gene (modes 3+).
pub const SEGMENT_COUNT_GENE: usize = 9;
/// Index of the segment-spacing gene (modes 3+).
pub const SEGMENT_SPACING_GENE: usize = 10;
/// Index of the g1 gradient gene (modes 4+).
pub const GRADIENT_1_GENE: usize = 11;
/// Index of the g3 gradient gene (modes 4+).
pub const GRADIENT_2_GENE: usize = 12;

/// Closed integer range a single gene may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneBound {
    pub min: i32,
    pub max: i32,
    pub label: &'static str,
}

impl GeneBound {
    const fn new(min: i32, max: i32, label: &'static str) -> Self {
        Self { min, max, label }
    }

    #[must_use]
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }

    #[must_use]
    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

const EXTENDED_BOUNDS: [GeneBound; 13] = [
    GeneBound::new(-3, 3, "g1"),
    GeneBound::new(-3, 3, "g2"),
    GeneBound::new(-3, 3, "g3"),
    GeneBound::new(-3, 3, "g4"),
    GeneBound::new(-3, 3, "g5"),
    GeneBound::new(-3, 3, "g6"),
    GeneBound::new(-3, 3, "g7"),
    GeneBound::new(-3, 3, "g8"),
    GeneBound::new(1, 8, "depth"),
    GeneBound::new(1, 8, "segs"),
    GeneBound::new(2, 12, "seg_spacing"),
    GeneBound::new(-3, 3, "grad1"),
    GeneBound::new(-3, 3, "grad2"),
];

/// Genotype layout variant. Determines gene count and how the
/// developmental engine reads the extra genes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
#[archive_attr(derive(Debug, PartialEq, Eq, Hash))]
#[serde(try_from = "u8", into = "u8")]
pub enum Mode {
    /// Nine genes, built-in bilateral symmetry.
    #[default]
    Basic,
    /// Nine genes, symmetry option applied after development.
    Symmetry,
    /// Eleven genes: adds segment count and spacing.
    Segmented,
    /// Thirteen genes: adds per-segment gradients for g1 and g3.
    Gradient,
    /// Thirteen genes plus alternating asymmetry and radial options.
    Full,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Basic,
        Mode::Symmetry,
        Mode::Segmented,
        Mode::Gradient,
        Mode::Full,
    ];

    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Mode::Basic => 1,
            Mode::Symmetry => 2,
            Mode::Segmented => 3,
            Mode::Gradient => 4,
            Mode::Full => 5,
        }
    }

    #[must_use]
    pub fn gene_count(self) -> usize {
        match self {
            Mode::Basic | Mode::Symmetry => 9,
            Mode::Segmented => 11,
            Mode::Gradient | Mode::Full => 13,
        }
    }

    /// Per-index bounds for this layout.
    #[must_use]
    pub fn bounds(self) -> &'static [GeneBound] {
        &EXTENDED_BOUNDS[..self.gene_count()]
    }

    #[must_use]
    pub fn is_segmented(self) -> bool {
        self >= Mode::Segmented
    }
}

impl TryFrom<u8> for Mode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Mode::Basic),
            2 => Ok(Mode::Symmetry),
            3 => Ok(Mode::Segmented),
            4 => Ok(Mode::Gradient),
            5 => Ok(Mode::Full),
            other => Err(format!("unknown genotype mode {other} (expected 1-5)")),
        }
    }
}

impl From<Mode> for u8 {
    fn from(mode: Mode) -> Self {
        mode.number()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Heritable unit of a biomorph: a fixed-length bounded integer vector.
///
/// Genotypes are immutable values. Variation produces new genotypes, it never
/// edits one in place, so the fields are only reachable through accessors.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
#[serde(try_from = "RawGenotype")]
pub struct Genotype {
    mode: Mode,
    genes: Vec<i32>,
}

/// Unchecked wire form; deserialization goes through [`Genotype::new`].
#[derive(Deserialize)]
struct RawGenotype {
    mode: Mode,
    genes: Vec<i32>,
}

impl TryFrom<RawGenotype> for Genotype {
    type Error = String;

    fn try_from(raw: RawGenotype) -> Result<Self, Self::Error> {
        Genotype::new(raw.mode, raw.genes).map_err(|e| e.to_string())
    }
}

impl Genotype {
    /// Builds a genotype, rejecting wrong lengths and out-of-bound genes.
    pub fn new(mode: Mode, genes: Vec<i32>) -> anyhow::Result<Self> {
        anyhow::ensure!(
            genes.len() == mode.gene_count(),
            "mode {} expects {} genes, got {}",
            mode,
            mode.gene_count(),
            genes.len()
        );
        for (i, (value, bound)) in genes.iter().zip(mode.bounds()).enumerate() {
            anyhow::ensure!(
                bound.contains(*value),
                "gene {} ({}) = {} is outside [{}, {}]",
                i,
                bound.label,
                value,
                bound.min,
                bound.max
            );
        }
        Ok(Self { mode, genes })
    }

    /// Builds a genotype without any checks.
    ///
    /// The caller guarantees the length matches `mode` and every gene is in
    /// bound. Used by variation operators that already enforce both.
    #[must_use]
    pub fn from_parts(mode: Mode, genes: Vec<i32>) -> Self {
        Self { mode, genes }
    }

    /// Builds a genotype from arbitrary values, padding missing genes with
    /// layout defaults and clamping everything into bound.
    #[must_use]
    pub fn clamped(mode: Mode, genes: &[i32]) -> Self {
        let origin = Self::origin(mode);
        let genes = mode
            .bounds()
            .iter()
            .enumerate()
            .map(|(i, bound)| bound.clamp(genes.get(i).copied().unwrap_or(origin.genes[i])))
            .collect();
        Self { mode, genes }
    }

    /// The minimal organism: all direction genes zero, depth one, a single
    /// segment with default spacing.
    #[must_use]
    pub fn origin(mode: Mode) -> Self {
        let mut genes = vec![0; mode.gene_count()];
        genes[DEPTH_GENE] = 1;
        if mode.is_segmented() {
            genes[SEGMENT_COUNT_GENE] = 1;
            genes[SEGMENT_SPACING_GENE] = 4;
        }
        Self { mode, genes }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn genes(&self) -> &[i32] {
        &self.genes
    }

    #[must_use]
    pub fn gene(&self, index: usize) -> i32 {
        self.genes[index]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Recursion depth (gene 9, 1-indexed).
    #[must_use]
    pub fn depth(&self) -> i32 {
        self.genes[DEPTH_GENE]
    }

    /// The eight direction-control genes g1..g8.
    #[must_use]
    pub fn direction_genes(&self) -> &[i32] {
        &self.genes[..DIRECTION_GENES]
    }

    #[must_use]
    pub fn segment_count(&self) -> i32 {
        self.genes.get(SEGMENT_COUNT_GENE).copied().unwrap_or(1)
    }

    #[must_use]
    pub fn segment_spacing(&self) -> i32 {
        self.genes.get(SEGMENT_SPACING_GENE).copied().unwrap_or(4)
    }

    #[must_use]
    pub fn is_within_bounds(&self) -> bool {
        self.genes.len() == self.mode.gene_count()
            && self
                .genes
                .iter()
                .zip(self.mode.bounds())
                .all(|(v, b)| b.contains(*v))
    }

    /// Consumes the genotype, returning its raw genes.
    #[must_use]
    pub fn into_genes(self) -> Vec<i32> {
        self.genes
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}[", self.mode)?;
        for (i, g) in self.genes.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{g}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_gene_counts() {
        assert_eq!(Mode::Basic.gene_count(), 9);
        assert_eq!(Mode::Symmetry.gene_count(), 9);
        assert_eq!(Mode::Segmented.gene_count(), 11);
        assert_eq!(Mode::Gradient.gene_count(), 13);
        assert_eq!(Mode::Full.bounds().len(), 13);
    }

    #[test]
    fn test_basic_bounds() {
        let bounds = Mode::Basic.bounds();
        assert!(bounds[..8].iter().all(|b| b.min == -3 && b.max == 3));
        assert_eq!((bounds[8].min, bounds[8].max), (1, 8));
    }

    #[test]
    fn test_new_rejects_out_of_bound_gene() {
        assert!(Genotype::new(Mode::Basic, vec![4, 0, 0, 0, 0, 0, 0, 0, 1]).is_err());
        assert!(Genotype::new(Mode::Basic, vec![0, 0, 0, 0, 0, 0, 0, 0, 0]).is_err());
        assert!(Genotype::new(Mode::Basic, vec![0; 8]).is_err());
        assert!(Genotype::new(Mode::Basic, vec![-1, 3, -1, -1, 2, 2, 2, 3, 5]).is_ok());
    }

    #[test]
    fn test_clamped_pads_and_clamps() {
        let g = Genotype::clamped(Mode::Segmented, &[9, -9, 0, 0, 0, 0, 0, 0, 20]);
        assert_eq!(g.genes(), &[3, -3, 0, 0, 0, 0, 0, 0, 8, 1, 4]);
        assert!(g.is_within_bounds());
    }

    #[test]
    fn test_mode_serde_as_number() {
        let json = serde_json::to_string(&Mode::Gradient).unwrap();
        assert_eq!(json, "4");
        let mode: Mode = serde_json::from_str("2").unwrap();
        assert_eq!(mode, Mode::Symmetry);
        assert!(serde_json::from_str::<Mode>("9").is_err());
    }

    #[test]
    fn test_deserialize_rejects_malformed_genotype() {
        let short = serde_json::from_str::<Genotype>(r#"{"mode":1,"genes":[0,0,0,0,0,0,0,0]}"#);
        assert!(short.is_err());
        let deep = serde_json::from_str::<Genotype>(r#"{"mode":1,"genes":[0,0,0,0,0,0,0,0,40]}"#);
        assert!(deep.is_err());
        let ok: Genotype =
            serde_json::from_str(r#"{"mode":1,"genes":[-1,3,-1,-1,2,2,2,3,5]}"#).unwrap();
        assert_eq!(ok.depth(), 5);
    }

    #[test]
    fn test_display() {
        let g = Genotype::new(Mode::Basic, vec![-1, 3, -1, -1, 2, 2, 2, 3, 5]).unwrap();
        assert_eq!(g.to_string(), "m1[-1,3,-1,-1,2,2,2,3,5]");
    }
}
