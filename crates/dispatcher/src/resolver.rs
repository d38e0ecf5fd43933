//! LocalFileResolver - opens produced files from the local filesystem

use contracts::{ContractError, FileResolver, ProducedFile};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves `ProducedFile` locations against the local filesystem
///
/// Accepts plain paths and `file://` URIs. Relative paths are joined onto
/// the base directory when one is configured.
#[derive(Debug, Clone, Default)]
pub struct LocalFileResolver {
    base_dir: Option<PathBuf>,
}

impl LocalFileResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    /// Filesystem path a location resolves to
    pub fn resolve_path(&self, location: &str) -> PathBuf {
        let raw = location.strip_prefix("file://").unwrap_or(location);
        let path = Path::new(raw);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl FileResolver for LocalFileResolver {
    fn open(&self, file: &ProducedFile) -> Result<Box<dyn Read + '_>, ContractError> {
        let path = self.resolve_path(&file.location);
        debug!(location = %file.location, path = %path.display(), "Opening produced file");
        let handle =
            File::open(&path).map_err(|e| ContractError::file_open(&file.location, e.to_string()))?;
        Ok(Box::new(BufReader::new(handle)))
    }
}
