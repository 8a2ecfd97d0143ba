use crate::core::{solve_3x3, MatF32, Point};
use crate::features2d::interest_point::Candidate;
use crate::features2d::pyramid::{stack3, OctaveLevel, DOG_BIAS};

/// Offset components beyond this mean the true extremum lies closer to a
/// neighboring sample (0.5 in unit space, scaled to [0, 255]).
const OFFSET_LIMIT: f32 = 127.5;

/// Minimum interpolated contrast (0.03 scaled to [0, 255]).
const CONTRAST_THRESHOLD: f32 = 7.65;

/// Curvature-ratio threshold of the edge response test.
const EDGE_RATIO: f32 = 10.0;

/// Sub-pixel refinement with low-contrast and edge rejection.
///
/// Each candidate is fit against the quadratic Taylor expansion of its
/// DoG neighborhood. Candidates whose refinement system is singular,
/// whose offset leaves the sample cell, whose interpolated contrast is
/// too small, or whose local curvature indicates an edge are marked
/// filtered.
pub(crate) fn refine(candidates: &mut [Candidate], dogs: &[Vec<OctaveLevel>]) {
    for candidate in candidates.iter_mut() {
        let stack = stack3(dogs, candidate.octave as usize, candidate.index as usize);
        candidate.filtered = !passes_refinement(&stack, candidate.loc);
    }
}

fn passes_refinement(stack: &[&MatF32; 3], loc: Point) -> bool {
    let gradient = fo_derivative(stack, loc);
    let hessian = so_derivative(stack, loc);

    let neg_hessian = [
        [-hessian[0][0], -hessian[0][1], -hessian[0][2]],
        [-hessian[1][0], -hessian[1][1], -hessian[1][2]],
        [-hessian[2][0], -hessian[2][1], -hessian[2][2]],
    ];

    // Numerical rejection: a singular system never fails the whole run
    let offset = match solve_3x3(neg_hessian, gradient) {
        Some(offset) => offset,
        None => return false,
    };

    if offset.iter().any(|component| component.abs() > OFFSET_LIMIT) {
        return false;
    }

    let x = loc.x as usize;
    let y = loc.y as usize;
    let contrast = stack[1].at(y, x) - DOG_BIAS;
    let interpolated = contrast
        + 0.5 * (gradient[0] * offset[0] + gradient[1] * offset[1] + gradient[2] * offset[2]);
    if interpolated.abs() < CONTRAST_THRESHOLD {
        return false;
    }

    let trace = hessian[0][0] + hessian[1][1];
    let det = hessian[0][0] * hessian[1][1] - hessian[0][1] * hessian[0][1];
    if det <= 0.0 {
        return false;
    }
    trace * trace / det <= (EDGE_RATIO + 1.0) * (EDGE_RATIO + 1.0) / EDGE_RATIO
}

/// First-order scale-space derivative `(dx, dy, ds)` by central
/// differences over a DoG triple.
pub(crate) fn fo_derivative(img: &[&MatF32; 3], p: Point) -> [f32; 3] {
    let x = p.x as usize;
    let y = p.y as usize;

    let dx = (img[1].at(y, x + 1) - img[1].at(y, x - 1)) / 2.0;
    let dy = (img[1].at(y + 1, x) - img[1].at(y - 1, x)) / 2.0;
    let ds = (img[2].at(y, x) - img[0].at(y, x)) / 2.0;
    [dx, dy, ds]
}

/// Second-order scale-space derivative as a symmetric 3x3 Hessian over a
/// DoG triple.
pub(crate) fn so_derivative(img: &[&MatF32; 3], p: Point) -> [[f32; 3]; 3] {
    let x = p.x as usize;
    let y = p.y as usize;
    let center = img[1].at(y, x);

    let dxx = img[1].at(y, x + 1) + img[1].at(y, x - 1) - 2.0 * center;
    let dyy = img[1].at(y + 1, x) + img[1].at(y - 1, x) - 2.0 * center;
    let dss = img[2].at(y, x) + img[0].at(y, x) - 2.0 * center;

    let dxy = (img[1].at(y + 1, x + 1) - img[1].at(y + 1, x - 1) - img[1].at(y - 1, x + 1)
        + img[1].at(y - 1, x - 1))
        / 2.0;
    let dxs = (img[2].at(y, x + 1) - img[2].at(y, x - 1) - img[0].at(y, x + 1)
        + img[0].at(y, x - 1))
        / 2.0;
    let dys = (img[2].at(y + 1, x) - img[2].at(y - 1, x) - img[0].at(y + 1, x)
        + img[0].at(y - 1, x))
        / 2.0;

    [
        [dxx, dxy, dxs],
        [dxy, dyy, dys],
        [dxs, dys, dss],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features2d::pyramid::OctaveLevel;

    fn quadratic_stack(peak: f32, curvature_x: f32, curvature_y: f32) -> Vec<MatF32> {
        // A smooth blob: peak + bias at (4, 4), falling off quadratically,
        // weaker in the neighboring scales
        let blob = |strength: f32| {
            MatF32::from_fn(9, 9, |row, col| {
                let dy = row as f32 - 4.0;
                let dx = col as f32 - 4.0;
                DOG_BIAS + strength * peak
                    - strength * (curvature_x * dx * dx + curvature_y * dy * dy)
            })
            .unwrap()
        };
        vec![blob(0.5), blob(1.0), blob(0.5)]
    }

    fn refine_one(stack_imgs: &[MatF32], x: u32, y: u32) -> bool {
        let dogs = vec![vec![
            OctaveLevel { scale: 0.6, img: stack_imgs[0].clone() },
            OctaveLevel { scale: 0.9, img: stack_imgs[1].clone() },
            OctaveLevel { scale: 1.3, img: stack_imgs[2].clone() },
        ]];
        let mut candidates = vec![Candidate::new(Point::new(x, y), 0, 1, 0.9)];
        refine(&mut candidates, &dogs);
        !candidates[0].filtered
    }

    #[test]
    fn test_isotropic_blob_survives() {
        let stack = quadratic_stack(60.0, 4.0, 4.0);
        assert!(refine_one(&stack, 4, 4));
    }

    #[test]
    fn test_low_contrast_rejected() {
        // Peak far below the 7.65 contrast threshold
        let stack = quadratic_stack(2.0, 0.5, 0.5);
        assert!(!refine_one(&stack, 4, 4));
    }

    #[test]
    fn test_edge_response_rejected() {
        // Strong curvature across, almost none along: a ridge
        let stack = quadratic_stack(60.0, 8.0, 0.05);
        assert!(!refine_one(&stack, 4, 4));
    }

    #[test]
    fn test_flat_neighborhood_rejected() {
        // Zero Hessian: the refinement system is singular
        let flat = MatF32::full(9, 9, DOG_BIAS + 40.0).unwrap();
        let stack = vec![flat.clone(), flat.clone(), flat];
        assert!(!refine_one(&stack, 4, 4));
    }

    #[test]
    fn test_fo_derivative_central_differences() {
        let ramp = MatF32::from_fn(9, 9, |row, col| 2.0 * col as f32 + 5.0 * row as f32).unwrap();
        let lower = MatF32::full(9, 9, 10.0).unwrap();
        let upper = MatF32::full(9, 9, 30.0).unwrap();
        let stack: [&MatF32; 3] = [&lower, &ramp, &upper];

        let g = fo_derivative(&stack, Point::new(4, 4));
        assert!((g[0] - 2.0).abs() < 1e-5);
        assert!((g[1] - 5.0).abs() < 1e-5);
        assert!((g[2] - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_so_derivative_is_symmetric() {
        let img0 = MatF32::from_fn(9, 9, |row, col| ((row * 3 + col * 7) % 13) as f32).unwrap();
        let img1 = MatF32::from_fn(9, 9, |row, col| ((row * 5 + col * 2) % 11) as f32).unwrap();
        let img2 = MatF32::from_fn(9, 9, |row, col| ((row * 2 + col * 9) % 17) as f32).unwrap();
        let stack: [&MatF32; 3] = [&img0, &img1, &img2];

        let h = so_derivative(&stack, Point::new(4, 4));
        for row in 0..3 {
            for col in 0..3 {
                assert_eq!(h[row][col], h[col][row]);
            }
        }
    }

    #[test]
    fn test_so_derivative_pure_quadratic() {
        // f(x, y) = 3x^2 + 2y^2 has dxx = 6, dyy = 4, dxy = 0
        let quad = MatF32::from_fn(9, 9, |row, col| {
            let x = col as f32 - 4.0;
            let y = row as f32 - 4.0;
            3.0 * x * x + 2.0 * y * y
        })
        .unwrap();
        let flat = MatF32::full(9, 9, 0.0).unwrap();
        let stack: [&MatF32; 3] = [&flat, &quad, &flat];

        let h = so_derivative(&stack, Point::new(4, 4));
        assert!((h[0][0] - 6.0).abs() < 1e-4);
        assert!((h[1][1] - 4.0).abs() < 1e-4);
        assert!(h[0][1].abs() < 1e-5);
    }

    #[test]
    fn test_dys_cross_scale_formula() {
        // dys couples the y slope of the scale above and below:
        // above has slope 3 in y, below slope 1, so dys = (6 - 2) / 4...
        // with the /2 convention dys = ((above_y+1 - above_y-1) - (below_y+1 - below_y-1)) / 2
        let below = MatF32::from_fn(9, 9, |row, _| row as f32).unwrap();
        let mid = MatF32::full(9, 9, 0.0).unwrap();
        let above = MatF32::from_fn(9, 9, |row, _| 3.0 * row as f32).unwrap();
        let stack: [&MatF32; 3] = [&below, &mid, &above];

        let h = so_derivative(&stack, Point::new(4, 4));
        // ((3*5 - 3*3) - (5 - 3)) / 2 = (6 - 2) / 2 = 2
        assert!((h[1][2] - 2.0).abs() < 1e-5);
    }
}
