use std::path::{Path, PathBuf};
use std::sync::Arc;

use formats::FeatureCollection;
use foundation::Generation;
use layers::LayerSelector;
use streaming::EXPORT_FILE_NAME;

/// Handle for an in-flight export of the layer currently on screen.
#[derive(Debug, Clone)]
pub struct ExportTicket {
    pub generation: Generation,
    pub selector: LayerSelector,
    /// `None` when exporting the original geometry.
    pub tolerance: Option<f64>,
    pub collection: Arc<FeatureCollection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub selector: LayerSelector,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn new(selector: LayerSelector, bytes: Vec<u8>) -> Self {
        Self {
            selector,
            file_name: EXPORT_FILE_NAME.to_string(),
            bytes,
        }
    }

    /// Writes the archive into `dir` under its file name.
    pub fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Ready(ExportArtifact),
    Discarded { generation: Generation },
}
