pub mod hash;
pub mod names;

pub use hash::*;
pub use names::*;
