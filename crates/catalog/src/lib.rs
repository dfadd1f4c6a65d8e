pub mod algorithms;
pub mod samples;

pub use algorithms::*;
pub use samples::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    NotFound(String),
    Corrupt(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::NotFound(id) => write!(f, "catalog entry '{id}' not found"),
            CatalogError::Corrupt(msg) => write!(f, "catalog corrupt: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}
