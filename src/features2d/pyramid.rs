use crate::core::MatF32;
use crate::error::Result;
use crate::features2d::sift::SiftConfig;
use crate::imgproc::{convolve_gauss, downsample_half, upsample_double};

/// Additive bias applied to stored DoG samples so debug dumps stay
/// non-negative. Refinement subtracts it before reading contrast values.
pub const DOG_BIAS: f32 = 128.0;

/// One pyramid level: an image together with the effective Gaussian
/// standard deviation relative to the level's own pixel grid.
#[derive(Debug, Clone)]
pub struct OctaveLevel {
    pub scale: f32,
    pub img: MatF32,
}

/// Pixel-wise difference of two Gaussian levels, biased by [`DOG_BIAS`].
pub fn dog(lower: &MatF32, higher: &MatF32) -> Result<MatF32> {
    MatF32::from_fn(lower.rows(), lower.cols(), |row, col| {
        DOG_BIAS + (higher.at(row, col) - lower.at(row, col))
    })
}

/// Build the Gaussian and DoG pyramids for an image.
///
/// Per octave there are `S + 1` Gaussian levels and `S` DoG levels, where
/// `S` is [`SiftConfig::dogs_per_octave`]. Each Gaussian is an incremental
/// blur of its predecessor with `k^e * sigma`; the exponent counter runs
/// on across the octave and steps back by two at each downsample so the
/// scale series continues consistently on the halved grid. When
/// `config.subpixel` is set the input is pre-doubled first.
pub fn build_pyramids(
    img: &MatF32,
    config: &SiftConfig,
) -> Result<(Vec<Vec<OctaveLevel>>, Vec<Vec<OctaveLevel>>)> {
    let s = config.dogs_per_octave;

    let base = if config.subpixel {
        upsample_double(img, 1.0)?
    } else {
        img.clone()
    };

    let mut gaussians: Vec<Vec<OctaveLevel>> = Vec::with_capacity(config.octaves);
    let mut dogs: Vec<Vec<OctaveLevel>> = Vec::with_capacity(config.octaves);

    gaussians.push(vec![OctaveLevel {
        scale: config.sigma,
        img: convolve_gauss(&base, config.sigma)?,
    }]);

    let mut exponent: i32 = 0;

    for octave in 0..config.octaves {
        for j in 1..=s {
            exponent += 1;
            let scale = config.k.powi(exponent) * config.sigma;
            let img = convolve_gauss(&gaussians[octave][j - 1].img, scale)?;
            gaussians[octave].push(OctaveLevel { scale, img });
        }

        let mut octave_dogs = Vec::with_capacity(s);
        for j in 1..=s {
            let lower = &gaussians[octave][j - 1];
            let higher = &gaussians[octave][j];
            octave_dogs.push(OctaveLevel {
                scale: higher.scale - lower.scale,
                img: dog(&lower.img, &higher.img)?,
            });
        }
        dogs.push(octave_dogs);

        if octave < config.octaves - 1 {
            let source = &gaussians[octave][s - 1];
            gaussians.push(vec![OctaveLevel {
                scale: source.scale,
                img: downsample_half(&source.img, source.scale)?,
            }]);
            exponent -= 2;
        }
    }

    Ok((gaussians, dogs))
}

/// The triple of DoG images around index `i` of an octave, for the
/// scale-space derivative stencils.
pub(crate) fn stack3(dogs: &[Vec<OctaveLevel>], octave: usize, index: usize) -> [&MatF32; 3] {
    [
        &dogs[octave][index - 1].img,
        &dogs[octave][index].img,
        &dogs[octave][index + 1].img,
    ]
}
