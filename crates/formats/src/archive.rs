use std::path::Path;

/// A shapefile archive selected for upload.
///
/// Only `.zip` archives are accepted; the check happens before any request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadArchive {
    file_name: String,
    bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    NotZip { file_name: String },
    Empty { file_name: String },
    Io(String),
}

impl std::fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveError::NotZip { file_name } => {
                write!(f, "'{file_name}' is not a .zip archive")
            }
            ArchiveError::Empty { file_name } => write!(f, "'{file_name}' is empty"),
            ArchiveError::Io(msg) => write!(f, "failed to read archive: {msg}"),
        }
    }
}

impl std::error::Error for ArchiveError {}

impl UploadArchive {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ArchiveError> {
        let file_name = file_name.into();
        if !file_name.to_ascii_lowercase().ends_with(".zip") {
            return Err(ArchiveError::NotZip { file_name });
        }
        if bytes.is_empty() {
            return Err(ArchiveError::Empty { file_name });
        }
        Ok(Self { file_name, bytes })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        // Reject by name first so a wrong file is never read.
        if !file_name.to_ascii_lowercase().ends_with(".zip") {
            return Err(ArchiveError::NotZip { file_name });
        }
        let bytes = std::fs::read(path).map_err(|e| ArchiveError::Io(e.to_string()))?;
        Self::new(file_name, bytes)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
