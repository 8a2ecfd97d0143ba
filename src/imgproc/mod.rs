pub mod drawing;
pub mod filter;
pub mod gradient;

pub use drawing::*;
pub use filter::*;
pub use gradient::*;
