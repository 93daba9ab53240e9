//! File-backed target directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::directory::{Directory, DirectoryError, Target};

#[derive(Debug, Deserialize)]
struct TargetsFile {
    #[serde(default)]
    targets: Vec<Target>,
}

/// Reads `[[targets]]` from a TOML file on every call.
///
/// Edits to the file are picked up on the next tick without a restart.
#[derive(Debug, Clone)]
pub struct FileDirectory {
    path: PathBuf,
}

impl FileDirectory {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Directory for FileDirectory {
    fn list_targets(&self) -> Result<Vec<Target>, DirectoryError> {
        let content = fs::read_to_string(&self.path)?;
        let file: TargetsFile = toml::from_str(&content)?;
        Ok(file.targets)
    }
}
