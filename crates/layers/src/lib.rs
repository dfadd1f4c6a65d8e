pub mod active;
pub mod layer;
pub mod symbology;

pub use active::*;
pub use layer::*;
pub use symbology::*;
