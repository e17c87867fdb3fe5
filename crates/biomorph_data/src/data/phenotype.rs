use serde::{Deserialize, Serialize};

/// A point in developmental space (unscaled gene units).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One directed line segment of a phenotype.
///
/// `depth` is the remaining-length counter at the moment the segment was
/// emitted: the trunk carries the full depth gene, the outermost twigs carry 1.
/// Renderers colour and filter by it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub depth: u8,
}

impl Segment {
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end.x - self.start.x).hypot(self.end.y - self.start.y)
    }

    #[must_use]
    pub fn map(self, f: impl Fn(Point) -> Point) -> Self {
        Self {
            start: f(self.start),
            end: f(self.end),
            depth: self.depth,
        }
    }
}

/// Axis-aligned bounding box of a phenotype.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// The developed form of a genotype: an ordered list of segments.
///
/// Always derived from a genotype, never stored as independent state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Phenotype {
    segments: Vec<Segment>,
}

impl Phenotype {
    #[must_use]
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    #[must_use]
    pub fn max_depth(&self) -> Option<u8> {
        self.segments.iter().map(|s| s.depth).max()
    }

    #[must_use]
    pub fn min_depth(&self) -> Option<u8> {
        self.segments.iter().map(|s| s.depth).min()
    }

    pub fn segments_at_depth(&self, depth: u8) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(move |s| s.depth == depth)
    }

    #[must_use]
    pub fn total_length(&self) -> f64 {
        self.segments.iter().map(Segment::length).sum()
    }

    /// Bounding box over every segment endpoint, `None` when empty.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.segments.first()?;
        let init = Bounds {
            min_x: first.start.x,
            min_y: first.start.y,
            max_x: first.start.x,
            max_y: first.start.y,
        };
        Some(self.segments.iter().fold(init, |b, s| Bounds {
            min_x: b.min_x.min(s.start.x).min(s.end.x),
            min_y: b.min_y.min(s.start.y).min(s.end.y),
            max_x: b.max_x.max(s.start.x).max(s.end.x),
            max_y: b.max_y.max(s.start.y).max(s.end.y),
        }))
    }
}

impl<'a> IntoIterator for &'a Phenotype {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}
