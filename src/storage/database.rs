use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{QueryError, Result};

/// File extension of table files inside a database directory.
pub const TABLE_EXTENSION: &str = "csv";

/// A validated database directory. Every table lives in `<root>/<table>.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    name: String,
    root: PathBuf,
}

impl Database {
    /// Opens an existing database directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(QueryError::NotFound(root.display().to_string()));
        }
        let name = root
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self { name, root })
    }

    /// Opens `<parent>/<name>`, creating the directory first if needed.
    pub fn create(parent: impl AsRef<Path>, name: &str) -> Result<Self> {
        validate_name(name, "database")?;
        let root = parent.as_ref().join(name);
        if !root.is_dir() {
            fs::create_dir_all(&root)?;
            tracing::debug!(path = %root.display(), "created database directory");
        }
        Ok(Self {
            name: name.to_string(),
            root,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.root.join(format!("{}.{}", table, TABLE_EXTENSION))
    }

    /// Scratch file used while a table is rewritten.
    pub(crate) fn scratch_path(&self, table: &str) -> PathBuf {
        self.root.join(format!("{}.{}.tmp", table, TABLE_EXTENSION))
    }
}

/// Identifier rule shared by table, database and column names: an alphabetic first
/// character followed by alphanumerics or underscores.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

pub fn validate_name(name: &str, kind: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(QueryError::Name(format!("Invalid {} name: {}", kind, name)))
    }
}
