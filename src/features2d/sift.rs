use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::{MatF32, Point};
use crate::error::{Error, Result};
use crate::features2d::interest_point::{
    partition_filtered, sort_candidates, Candidate, InterestPoint,
};
use crate::features2d::orientation::build_gradient_pyramid;
use crate::features2d::pyramid::{build_pyramids, OctaveLevel};
use crate::features2d::{descriptor, extrema, orientation, refine};
use crate::imgcodecs::imwrite_gray_f32;
use crate::imgproc::draw_marker;

/// Smallest accepted image side length.
const MIN_IMAGE_SIDE: usize = 32;

/// Every octave must keep at least one interior pixel for the 3x3x3
/// extremum scan.
const MIN_OCTAVE_SIDE: usize = 3;

/// SIFT pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SiftConfig {
    /// Initial Gaussian blur applied to the input image
    pub sigma: f32,
    /// Scale multiplier between successive Gaussian levels
    pub k: f32,
    /// DoG levels per octave, at least 3
    pub dogs_per_octave: usize,
    /// Number of octaves, at least 1
    pub octaves: usize,
    /// Pre-double the input so keypoints resolve sub-pixel positions
    pub subpixel: bool,
}

impl Default for SiftConfig {
    fn default() -> Self {
        Self {
            sigma: 1.6,
            k: std::f32::consts::SQRT_2,
            dogs_per_octave: 3,
            octaves: 4,
            subpixel: false,
        }
    }
}

/// SIFT (Scale-Invariant Feature Transform) detector and descriptor
///
/// Owns nothing between invocations: every [`Sift::calculate`] call
/// builds its pyramids, consumes them and drops them before returning.
pub struct Sift {
    config: SiftConfig,
    debug_dir: Option<PathBuf>,
}

impl Sift {
    /// Create a detector, validating the configuration
    pub fn new(config: SiftConfig) -> Result<Self> {
        if config.dogs_per_octave < 3 {
            return Err(Error::InvalidConfig(format!(
                "dogs_per_octave must be at least 3, got {}",
                config.dogs_per_octave
            )));
        }
        if config.octaves < 1 {
            return Err(Error::InvalidConfig(format!(
                "octaves must be at least 1, got {}",
                config.octaves
            )));
        }

        Ok(Self {
            config,
            debug_dir: None,
        })
    }

    /// Detector with the default configuration
    pub fn with_defaults() -> Self {
        Self {
            config: SiftConfig::default(),
            debug_dir: None,
        }
    }

    /// Write debug PNGs (DoG levels, candidate and survivor overlays)
    /// into `dir` on every `calculate` call
    #[must_use]
    pub fn with_debug_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.debug_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn config(&self) -> &SiftConfig {
        &self.config
    }

    /// Run the full pipeline on a greyscale image and return the detected
    /// interest points, ordered by `(octave, index, y, x, orientation)`.
    pub fn calculate(&self, img: &MatF32) -> Result<Vec<InterestPoint>> {
        self.validate_image(img)?;

        let (gaussians, dogs) = build_pyramids(img, &self.config)?;
        debug!(
            octaves = gaussians.len(),
            dogs_per_octave = dogs[0].len(),
            "built scale-space pyramids"
        );

        if let Some(dir) = &self.debug_dir {
            dump_dogs(dir, &dogs)?;
        }

        let mut candidates = extrema::detect(&dogs);
        debug!(candidates = candidates.len(), "detected scale-space extrema");

        if let Some(dir) = &self.debug_dir {
            dump_overlay(dir, "candidates.png", img, &candidates, self.divisor())?;
        }

        refine::refine(&mut candidates, &dogs);
        partition_filtered(&mut candidates);
        debug!(candidates = candidates.len(), "refined keypoints");

        let gradients = build_gradient_pyramid(&gaussians)?;

        let mut candidates = orientation::assign(candidates, &gaussians, &gradients)?;
        partition_filtered(&mut candidates);
        debug!(candidates = candidates.len(), "assigned orientations");

        descriptor::compute(&mut candidates, &gaussians, &gradients)?;
        partition_filtered(&mut candidates);
        debug!(keypoints = candidates.len(), "computed descriptors");

        if let Some(dir) = &self.debug_dir {
            dump_overlay(dir, "keypoints.png", img, &candidates, self.divisor())?;
        }

        sort_candidates(&mut candidates);
        Ok(candidates
            .into_iter()
            .map(|c| self.to_interest_point(c))
            .collect())
    }

    /// Divisor applied when reporting coordinates: sub-pixel runs detect
    /// on the doubled grid, so positions halve on the way out
    fn divisor(&self) -> f32 {
        if self.config.subpixel {
            2.0
        } else {
            1.0
        }
    }

    fn to_interest_point(&self, c: Candidate) -> InterestPoint {
        let factor = (1u32 << c.octave) as f32 / self.divisor();
        InterestPoint {
            x: c.loc.x as f32 * factor,
            y: c.loc.y as f32 * factor,
            octave: c.octave,
            index: c.index,
            scale: c.scale,
            orientation: c.orientation,
            descriptor: c.descriptor,
        }
    }

    fn validate_image(&self, img: &MatF32) -> Result<()> {
        if img.rows() < MIN_IMAGE_SIDE || img.cols() < MIN_IMAGE_SIDE {
            return Err(Error::InvalidDimensions(format!(
                "image {}x{} is smaller than the {}x{} minimum",
                img.cols(),
                img.rows(),
                MIN_IMAGE_SIDE,
                MIN_IMAGE_SIDE
            )));
        }

        let mut rows = img.rows();
        let mut cols = img.cols();
        for _ in 1..self.config.octaves {
            rows = (rows + 1) / 2;
            cols = (cols + 1) / 2;
        }
        if rows < MIN_OCTAVE_SIDE || cols < MIN_OCTAVE_SIDE {
            return Err(Error::InvalidDimensions(format!(
                "image {}x{} is too small for {} octaves",
                img.cols(),
                img.rows(),
                self.config.octaves
            )));
        }

        Ok(())
    }
}

fn dump_dogs(dir: &Path, dogs: &[Vec<OctaveLevel>]) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    for (octave, levels) in dogs.iter().enumerate() {
        for (index, level) in levels.iter().enumerate() {
            imwrite_gray_f32(dir.join(format!("dog_o{octave}_i{index}.png")), &level.img)?;
        }
    }
    Ok(())
}

fn dump_overlay(
    dir: &Path,
    name: &str,
    img: &MatF32,
    candidates: &[Candidate],
    divisor: f32,
) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut canvas = img.clone();
    for c in candidates {
        let x = (c.loc.x * (1u32 << c.octave)) as f32 / divisor;
        let y = (c.loc.y * (1u32 << c.octave)) as f32 / divisor;
        draw_marker(&mut canvas, Point::new(x as u32, y as u32), 1, 255.0);
    }
    imwrite_gray_f32(dir.join(name), &canvas)
}
