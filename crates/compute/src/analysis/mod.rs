pub mod reduction;
pub mod statistics;

pub use reduction::*;
pub use statistics::*;
