use catalog::{CatalogError, SelectionError};
use formats::ArchiveError;
use layers::LayerSelector;
use runtime::Operation;
use streaming::ToleranceError;
use thiserror::Error;

/// Rejected input. Never reaches the network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid tolerance series: {0}")]
    Tolerance(#[from] ToleranceError),
    #[error("invalid algorithm selection: {0}")]
    Selection(#[from] SelectionError),
    #[error("tolerance index {index} is out of range for {len} levels")]
    ToleranceIndexOutOfRange { index: usize, len: usize },
    #[error("tolerance {value} is not one of the compared levels")]
    UnknownTolerance { value: f64 },
    #[error("unsupported archive: {0}")]
    UnsupportedArchive(#[from] ArchiveError),
    #[error("unknown sample dataset: {0}")]
    UnknownSample(#[from] CatalogError),
}

/// A request to an external service failed or returned something unusable.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{operation} request failed: {message}")]
pub struct TransportError {
    pub operation: Operation,
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkbenchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("a {0} request is already in flight")]
    Busy(Operation),
    #[error("no dataset is loaded")]
    NoDataset,
    #[error("layer {0} is not active")]
    NoSuchLayer(LayerSelector),
    #[error("no comparison is active")]
    NoComparison,
}

impl WorkbenchError {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkbenchError::Validation(_) => "validation",
            WorkbenchError::Transport(_) => "transport",
            WorkbenchError::Busy(_) => "busy",
            WorkbenchError::NoDataset => "no_dataset",
            WorkbenchError::NoSuchLayer(_) => "no_such_layer",
            WorkbenchError::NoComparison => "no_comparison",
        }
    }
}

impl From<ToleranceError> for WorkbenchError {
    fn from(value: ToleranceError) -> Self {
        WorkbenchError::Validation(value.into())
    }
}

impl From<SelectionError> for WorkbenchError {
    fn from(value: SelectionError) -> Self {
        WorkbenchError::Validation(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::{TransportError, ValidationError, WorkbenchError};
    use catalog::SelectionError;
    use runtime::Operation;

    #[test]
    fn messages_name_the_operation() {
        let e = WorkbenchError::from(
            TransportError::new(Operation::Simplify, "connection refused").with_status(502),
        );
        assert_eq!(e.to_string(), "simplify request failed: connection refused");
        assert_eq!(e.kind(), "transport");
    }

    #[test]
    fn selection_errors_are_validation_errors() {
        let e: WorkbenchError = SelectionError::Empty.into();
        assert!(matches!(
            e,
            WorkbenchError::Validation(ValidationError::Selection(SelectionError::Empty))
        ));
    }
}
