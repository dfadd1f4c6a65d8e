pub mod archive;
pub mod dataset;
pub mod feature_collection;

pub use archive::*;
pub use dataset::*;
pub use feature_collection::*;
