pub mod cache;
pub mod protocol;
pub mod request;
pub mod tolerance;

pub use cache::*;
pub use protocol::*;
pub use request::*;
pub use tolerance::*;
