//! # SIFT-Rust
//!
//! A pure Rust implementation of the SIFT (Scale-Invariant Feature
//! Transform) detector and descriptor.
//!
//! Given a single-channel float image, the pipeline builds Gaussian and
//! Difference-of-Gaussian pyramids, detects scale-space extrema, refines
//! them to sub-pixel precision with contrast and edge rejection, assigns
//! dominant gradient orientations and produces a 128-value descriptor per
//! keypoint: a summary that is stable under translation, rotation,
//! uniform scaling and moderate illumination change.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sift_rust::prelude::*;
//! use sift_rust::imgcodecs::imread_gray_f32;
//!
//! # fn main() -> sift_rust::error::Result<()> {
//! let img = imread_gray_f32("input.png")?;
//!
//! let sift = Sift::new(SiftConfig::default())?;
//! let points = sift.calculate(&img)?;
//!
//! for p in &points {
//!     println!("({}, {}) scale {} orientation {}", p.x, p.y, p.scale, p.orientation);
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;
pub mod features2d;
pub mod imgcodecs;
pub mod imgproc;

pub mod prelude {
    //! Convenience module that re-exports commonly used items
    pub use crate::core::{MatF32, Point, Size};
    pub use crate::error::{Error, Result};
    pub use crate::features2d::{InterestPoint, Sift, SiftConfig};
}
