pub mod interest_point;
pub mod pyramid;
pub mod sift;

mod descriptor;
mod extrema;
mod orientation;
mod refine;

pub use descriptor::DESCRIPTOR_SIZE;
pub use interest_point::InterestPoint;
pub use pyramid::{build_pyramids, dog, OctaveLevel, DOG_BIAS};
pub use sift::{Sift, SiftConfig};
