use crate::core::{MatF32, Point};
use crate::features2d::interest_point::Candidate;
use crate::features2d::pyramid::OctaveLevel;

/// Scan the DoG pyramid for scale-space extrema.
///
/// A pixel qualifies when its value is strictly greater or strictly less
/// than all 26 neighbors in the 3x3x3 block spanning the DoG below, its
/// own DoG and the DoG above. Only indices with both neighbors present
/// are scanned, and a one-pixel image border is excluded.
pub(crate) fn detect(dogs: &[Vec<OctaveLevel>]) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for (octave, octave_dogs) in dogs.iter().enumerate() {
        for index in 1..octave_dogs.len().saturating_sub(1) {
            let below = &octave_dogs[index - 1].img;
            let current = &octave_dogs[index].img;
            let above = &octave_dogs[index + 1].img;
            let scale = octave_dogs[index].scale;

            for y in 1..current.rows() - 1 {
                for x in 1..current.cols() - 1 {
                    if is_extremum(below, current, above, x, y) {
                        candidates.push(Candidate::new(
                            Point::new(x as u32, y as u32),
                            octave as u32,
                            index as u32,
                            scale,
                        ));
                    }
                }
            }
        }
    }

    candidates
}

fn is_extremum(below: &MatF32, current: &MatF32, above: &MatF32, x: usize, y: usize) -> bool {
    let value = current.at(y, x);
    let mut is_max = true;
    let mut is_min = true;

    for (layer, img) in [below, current, above].iter().enumerate() {
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if layer == 1 && dy == 0 && dx == 0 {
                    continue;
                }
                let neighbor = img.at((y as i64 + dy) as usize, (x as i64 + dx) as usize);
                if neighbor >= value {
                    is_max = false;
                }
                if neighbor <= value {
                    is_min = false;
                }
                if !is_max && !is_min {
                    return false;
                }
            }
        }
    }

    is_max || is_min
}
