use crate::core::Point;

/// A detected interest point.
///
/// `x` and `y` are caller-visible coordinates in the input image's pixel
/// grid (octave positions scaled by `2^octave`, halved again when the
/// pipeline ran with sub-pixel pre-doubling). `scale` is the Gaussian
/// standard deviation inherited from the producing DoG level,
/// `orientation` the dominant gradient direction in degrees `[0, 360)`,
/// and `descriptor` the 128-value local gradient histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct InterestPoint {
    pub x: f32,
    pub y: f32,
    pub octave: u32,
    pub index: u32,
    pub scale: f32,
    pub orientation: f32,
    pub descriptor: Vec<f32>,
}

/// Working record carried between pipeline stages.
///
/// Holds the integer octave-grid location and the construction-only
/// `filtered` flag; rejected candidates are marked, then dropped at the
/// next partition. The flag never reaches the caller.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub loc: Point,
    pub octave: u32,
    pub index: u32,
    pub scale: f32,
    pub orientation: f32,
    pub descriptor: Vec<f32>,
    pub filtered: bool,
}

impl Candidate {
    pub fn new(loc: Point, octave: u32, index: u32, scale: f32) -> Self {
        Self {
            loc,
            octave,
            index,
            scale,
            orientation: 0.0,
            descriptor: Vec::new(),
            filtered: false,
        }
    }
}

/// Drop every candidate marked `filtered`, keeping the survivors in their
/// original order.
pub(crate) fn partition_filtered(candidates: &mut Vec<Candidate>) {
    candidates.retain(|c| !c.filtered);
}

/// Deterministic output ordering: `(octave, index, y, x, orientation)`.
pub(crate) fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        (a.octave, a.index, a.loc.y, a.loc.x)
            .cmp(&(b.octave, b.index, b.loc.y, b.loc.x))
            .then(a.orientation.total_cmp(&b.orientation))
    });
}
